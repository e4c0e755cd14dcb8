use std::path::{Path, PathBuf};

use crate::{
    assets::decode,
    foundation::{
        core::RasterImage,
        error::{MemeError, MemeResult},
    },
};

/// Where a template image comes from, as written in the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:` URI.
    DataUri(String),
    /// Absolute path from a `file://` URI.
    File(PathBuf),
    /// Path relative to the catalog root, normalized with `/` separators.
    Relative(String),
}

impl ImageSource {
    /// Classify a catalog `src` value. Remote schemes are rejected as decode failures.
    pub fn parse(source: &str) -> MemeResult<Self> {
        let source = source.trim();
        if source.starts_with("data:") {
            return Ok(Self::DataUri(source.to_string()));
        }
        if let Some(path) = source.strip_prefix("file://") {
            if path.is_empty() {
                return Err(MemeError::validation("file URI must name a path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = source.split_once("://") {
            return Err(MemeError::decode(format!(
                "unsupported image source scheme '{scheme}'"
            )));
        }
        Self::relative(source)
    }

    /// A catalog-relative reference behaves like a relative URL: `?query` and `#fragment`
    /// suffixes are dropped, `\` counts as `/`, and it must stay inside the catalog root.
    fn relative(source: &str) -> MemeResult<Self> {
        let path = source
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .replace('\\', "/");
        if path.starts_with('/') || path.as_bytes().get(1) == Some(&b':') {
            return Err(MemeError::validation(format!(
                "template image '{source}' is absolute; use a file:// URI"
            )));
        }

        let segments = path
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .map(|seg| match seg {
                ".." => Err(MemeError::validation(format!(
                    "template image '{source}' escapes the catalog directory"
                ))),
                _ => Ok(seg),
            })
            .collect::<MemeResult<Vec<_>>>()?;
        if segments.is_empty() {
            return Err(MemeError::validation(format!(
                "template image '{source}' does not name a file"
            )));
        }
        Ok(Self::Relative(segments.join("/")))
    }
}

/// Resolves catalog image sources against a root directory.
#[derive(Clone, Debug)]
pub struct SourceResolver {
    root: PathBuf,
}

impl SourceResolver {
    /// Resolver rooted at `root` (normally the catalog file's directory).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory relative sources resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw encoded bytes of a parsed source.
    pub fn read_bytes(&self, source: &ImageSource) -> MemeResult<Vec<u8>> {
        match source {
            ImageSource::DataUri(uri) => decode::data_uri_bytes(uri),
            ImageSource::File(path) => read_file(path),
            ImageSource::Relative(norm_path) => read_file(&self.root.join(Path::new(norm_path))),
        }
    }

    /// Parse, read and decode a catalog `src` value.
    pub fn load(&self, source: &str) -> MemeResult<RasterImage> {
        let parsed = ImageSource::parse(source)?;
        let bytes = self.read_bytes(&parsed)?;
        decode::decode_image(&bytes)
    }
}

fn read_file(path: &Path) -> MemeResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| MemeError::decode(format!("read image '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
