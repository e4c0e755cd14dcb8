use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{
    assets::source::{ImageSource, SourceResolver},
    foundation::{
        core::RasterImage,
        error::{MemeError, MemeResult},
    },
    session::editing::CaptionPair,
};

/// Picker placeholder shown when the catalog has no templates.
pub const EMPTY_CATALOG_MESSAGE: &str = "No templates defined.";

/// A predefined starting image with default captions.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    /// Unique catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image reference: catalog-relative path, `file://` or `data:` URI.
    #[serde(rename = "src")]
    pub image_source: String,
    /// Caption prefilled in the top field.
    #[serde(rename = "top", default)]
    pub default_top_text: String,
    /// Caption prefilled in the bottom field.
    #[serde(rename = "bottom", default)]
    pub default_bottom_text: String,
}

impl Template {
    /// The template's default captions as a pair.
    pub fn default_captions(&self) -> CaptionPair {
        CaptionPair::new(&self.default_top_text, &self.default_bottom_text)
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
struct CatalogFile {
    #[serde(default)]
    templates: Vec<Template>,
}

/// Decoded template ready to be committed into a session.
#[derive(Clone, Debug)]
pub struct TemplateSelection {
    /// Id of the selected template.
    pub template_id: String,
    /// Decoded background.
    pub image: RasterImage,
    /// Default captions.
    pub captions: CaptionPair,
}

/// Template picker projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogView {
    /// No templates; show `message` instead of a list.
    Empty {
        /// Placeholder text shown instead of a list.
        message: &'static str,
    },
    /// Templates in catalog order.
    Entries(Vec<CatalogEntry>),
}

/// One row of the template picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Template id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image reference as written in the catalog.
    pub image_source: String,
    /// Whether this is the session's current template.
    pub selected: bool,
}

/// Static, ordered list of templates fixed at startup.
#[derive(Clone, Debug)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
    resolver: SourceResolver,
}

impl TemplateCatalog {
    /// Catalog with no templates.
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
            resolver: SourceResolver::new("."),
        }
    }

    /// Build a catalog whose relative image sources resolve against `root`.
    pub fn new(templates: Vec<Template>, root: impl Into<PathBuf>) -> MemeResult<Self> {
        let catalog = Self {
            templates,
            resolver: SourceResolver::new(root),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse `{"templates": [...]}` JSON; relative sources resolve against `root`.
    pub fn from_json_str(json: &str, root: impl Into<PathBuf>) -> MemeResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| MemeError::serde(format!("parse template catalog: {e}")))?;
        Self::new(file.templates, root)
    }

    /// Load a catalog JSON file; relative sources resolve against the file's directory.
    pub fn from_path(path: &Path) -> MemeResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            MemeError::validation(format!("read template catalog '{}': {e}", path.display()))
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json_str(&json, root)
    }

    /// Check ids are non-empty and unique and every source parses.
    pub fn validate(&self) -> MemeResult<()> {
        let mut seen = HashSet::new();
        for t in &self.templates {
            if t.id.trim().is_empty() {
                return Err(MemeError::validation("template id must be non-empty"));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(MemeError::validation(format!(
                    "duplicate template id '{}'",
                    t.id
                )));
            }
            if t.image_source.trim().is_empty() {
                return Err(MemeError::validation(format!(
                    "template '{}' has an empty image source",
                    t.id
                )));
            }
            if let Err(e) = ImageSource::parse(&t.image_source)
                && matches!(e, MemeError::Validation(_))
            {
                return Err(MemeError::validation(format!("template '{}': {e}", t.id)));
            }
        }
        Ok(())
    }

    /// Templates in catalog order.
    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    /// True when there are no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Picker projection with `selected` marking the current template.
    pub fn view(&self, selected: Option<&str>) -> CatalogView {
        if self.templates.is_empty() {
            return CatalogView::Empty {
                message: EMPTY_CATALOG_MESSAGE,
            };
        }
        CatalogView::Entries(
            self.templates
                .iter()
                .map(|t| CatalogEntry {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    image_source: t.image_source.clone(),
                    selected: selected == Some(t.id.as_str()),
                })
                .collect(),
        )
    }

    /// Fetch and decode a template's image. Failures are recoverable and leave callers'
    /// state untouched.
    #[tracing::instrument(skip(self))]
    pub fn select(&self, id: &str) -> MemeResult<TemplateSelection> {
        let template = self
            .get(id)
            .ok_or_else(|| MemeError::validation(format!("unknown template '{id}'")))?;
        let image = self.resolver.load(&template.image_source).inspect_err(|e| {
            tracing::warn!(template = id, error = %e, "template image failed to load");
        })?;
        Ok(TemplateSelection {
            template_id: template.id.clone(),
            image,
            captions: template.default_captions(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/model.rs"]
mod tests;
