use crate::foundation::core::RasterImage;

/// Top and bottom caption text as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptionPair {
    /// Top caption.
    pub top_text: String,
    /// Bottom caption.
    pub bottom_text: String,
}

impl CaptionPair {
    /// Pair from two captions.
    pub fn new(top_text: impl Into<String>, bottom_text: impl Into<String>) -> Self {
        Self {
            top_text: top_text.into(),
            bottom_text: bottom_text.into(),
        }
    }
}

/// Which entry point produced the current background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceOrigin {
    /// A user-supplied file.
    Upload {
        /// Name of the uploaded file.
        file_name: String,
    },
    /// A catalog template.
    Template {
        /// Catalog template id.
        id: String,
    },
    /// A saved meme being re-edited.
    Saved {
        /// Id of the saved artifact.
        artifact_id: u64,
    },
}

/// Last composited raster together with the captions it was drawn with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedOutput {
    /// Composited raster.
    pub image: RasterImage,
    /// Captions drawn into it.
    pub captions: CaptionPair,
}

/// The single in-memory editing state. It has no background until the first selection is
/// committed; every later commit replaces it wholesale.
#[derive(Clone, Debug, Default)]
pub struct EditingSession {
    image: Option<RasterImage>,
    captions: CaptionPair,
    template_id: Option<String>,
    origin: Option<SourceOrigin>,
    output: Option<RenderedOutput>,
}

impl EditingSession {
    /// Session with no background.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current background.
    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// Current captions.
    pub fn captions(&self) -> &CaptionPair {
        &self.captions
    }

    /// Template id when the background came from the catalog.
    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    /// Origin of the current background.
    pub fn origin(&self) -> Option<&SourceOrigin> {
        self.origin.as_ref()
    }

    /// True when the background is an upload.
    pub fn is_uploaded(&self) -> bool {
        matches!(self.origin, Some(SourceOrigin::Upload { .. }))
    }

    /// Last composited output.
    pub fn output(&self) -> Option<&RenderedOutput> {
        self.output.as_ref()
    }

    /// Whether export/save actions have something to work with.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Whether the last render reflects the current captions.
    pub fn output_is_current(&self) -> bool {
        self.output
            .as_ref()
            .is_some_and(|out| out.captions == self.captions)
    }

    /// Replace the top caption.
    pub fn set_top_text(&mut self, text: impl Into<String>) {
        self.captions.top_text = text.into();
    }

    /// Replace the bottom caption.
    pub fn set_bottom_text(&mut self, text: impl Into<String>) {
        self.captions.bottom_text = text.into();
    }

    /// Replace both captions.
    pub fn set_captions(&mut self, captions: CaptionPair) {
        self.captions = captions;
    }

    pub(crate) fn replace_source(
        &mut self,
        image: RasterImage,
        captions: CaptionPair,
        template_id: Option<String>,
        origin: SourceOrigin,
    ) {
        *self = Self {
            image: Some(image),
            captions,
            template_id,
            origin: Some(origin),
            output: None,
        };
    }

    pub(crate) fn set_output(&mut self, output: RenderedOutput) {
        self.output = Some(output);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editing.rs"]
mod tests;
