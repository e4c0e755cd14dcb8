use std::path::{Path, PathBuf};

use crate::{
    catalog::model::TemplateCatalog,
    editor::controller::Editor,
    foundation::error::MemeResult,
    render::{
        compositor::{CaptionStyle, Compositor},
        text::FontSource,
    },
    store::{artifact::ArtifactStore, backend::FileStorage},
};

/// Overrides [`EditorConfig::store_dir`].
pub const ENV_STORE_DIR: &str = "MASS_MEME_STORE_DIR";
/// Sets [`EditorConfig::catalog_path`].
pub const ENV_CATALOG: &str = "MASS_MEME_CATALOG";
/// Sets [`EditorConfig::font_path`].
pub const ENV_FONT: &str = "MASS_MEME_FONT";

/// Where the editor keeps its state and finds its inputs.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Directory holding `savedMemes.json`.
    pub store_dir: PathBuf,
    /// Template catalog JSON; `None` means an empty catalog.
    pub catalog_path: Option<PathBuf>,
    /// Caption font file; `None` means a system font lookup.
    pub font_path: Option<PathBuf>,
    /// Caption look.
    pub style: CaptionStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            catalog_path: None,
            font_path: None,
            style: CaptionStyle::default(),
        }
    }
}

impl EditorConfig {
    /// Defaults overridden by `MASS_MEME_*` environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(dir) = env_path(ENV_STORE_DIR) {
            cfg.store_dir = dir;
        }
        cfg.catalog_path = env_path(ENV_CATALOG);
        cfg.font_path = env_path(ENV_FONT);
        cfg
    }

    /// Explicit font file if configured, else a system lookup.
    pub fn font_source(&self) -> FontSource {
        match &self.font_path {
            Some(path) => FontSource::File(path.clone()),
            None => FontSource::System,
        }
    }

    /// Load the configured catalog, or an empty one.
    pub fn load_catalog(&self) -> MemeResult<TemplateCatalog> {
        match &self.catalog_path {
            Some(path) => TemplateCatalog::from_path(path),
            None => Ok(TemplateCatalog::empty()),
        }
    }

    /// Wire up an editor backed by the on-disk store.
    pub fn build_editor(&self) -> MemeResult<Editor<FileStorage>> {
        let catalog = self.load_catalog()?;
        let compositor = Compositor::new(self.style.clone(), self.font_source())?;
        let store = ArtifactStore::new(FileStorage::new(&self.store_dir));
        tracing::debug!(
            store_dir = %self.store_dir.display(),
            templates = catalog.list().len(),
            "editor configured"
        );
        Ok(Editor::new(catalog, compositor, store))
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("mass-meme"))
        .unwrap_or_else(|| Path::new(".mass-meme").to_path_buf())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
