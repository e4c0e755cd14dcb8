use crate::{
    assets::decode,
    catalog::model::TemplateCatalog,
    foundation::{core::RasterImage, error::MemeResult},
    session::editing::{CaptionPair, EditingSession, SourceOrigin},
    store::artifact::Artifact,
};

/// A single image file chosen by the user.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Name of the picked file.
    pub file_name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// The three ways a background can enter the session.
#[derive(Clone, Debug)]
pub enum SourceRequest {
    /// Decode an uploaded file.
    Upload(UploadedFile),
    /// Fetch a catalog template.
    Template {
        /// Catalog template id.
        id: String,
    },
    /// Re-edit a saved meme.
    Saved(Artifact),
}

/// A request stamped with its selection sequence number.
#[derive(Clone, Debug)]
pub struct SelectionTicket {
    seq: u64,
    request: SourceRequest,
}

impl SelectionTicket {
    /// Selection sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The stamped request.
    pub fn request(&self) -> &SourceRequest {
        &self.request
    }
}

/// Decode result waiting to be committed. Uploads start with blank captions.
#[derive(Clone, Debug)]
pub struct DecodedSelection {
    seq: u64,
    image: RasterImage,
    captions: CaptionPair,
    template_id: Option<String>,
    origin: SourceOrigin,
}

impl DecodedSelection {
    /// Sequence number of the originating ticket.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Decoded background.
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// Captions the session will start with.
    pub fn captions(&self) -> &CaptionPair {
        &self.captions
    }

    /// Where the background came from.
    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }
}

/// Mediates between upload, template and saved-artifact origins.
///
/// Selection is split into `begin` (stamp), `decode` (the slow part) and `commit` (apply).
/// Only the most recently begun selection may commit, so a slow decode that finishes after a
/// newer selection can never overwrite it.
#[derive(Debug, Default)]
pub struct SourceSelector {
    latest: u64,
}

impl SourceSelector {
    /// Selector with no selections issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently issued sequence number.
    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    /// Stamp `request` as the newest selection.
    pub fn begin(&mut self, request: SourceRequest) -> SelectionTicket {
        self.latest += 1;
        SelectionTicket {
            seq: self.latest,
            request,
        }
    }

    /// Decode a ticket's image. Session state is not touched.
    pub fn decode(
        &self,
        ticket: SelectionTicket,
        catalog: &TemplateCatalog,
    ) -> MemeResult<DecodedSelection> {
        let SelectionTicket { seq, request } = ticket;
        match request {
            SourceRequest::Upload(file) => {
                let image = decode::decode_image(&file.bytes).inspect_err(|e| {
                    tracing::warn!(file = %file.file_name, error = %e, "upload failed to decode");
                })?;
                Ok(DecodedSelection {
                    seq,
                    image,
                    captions: CaptionPair::default(),
                    template_id: None,
                    origin: SourceOrigin::Upload {
                        file_name: file.file_name,
                    },
                })
            }
            SourceRequest::Template { id } => {
                let sel = catalog.select(&id)?;
                Ok(DecodedSelection {
                    seq,
                    image: sel.image,
                    captions: sel.captions,
                    template_id: Some(sel.template_id),
                    origin: SourceOrigin::Template { id },
                })
            }
            SourceRequest::Saved(artifact) => {
                let image = decode::decode_data_uri(&artifact.encoded_image).inspect_err(|e| {
                    tracing::warn!(artifact = artifact.id, error = %e, "saved meme failed to decode");
                })?;
                // Re-editing a saved meme is an untemplated edit from here on.
                Ok(DecodedSelection {
                    seq,
                    image,
                    captions: CaptionPair::new(artifact.top_text, artifact.bottom_text),
                    template_id: None,
                    origin: SourceOrigin::Saved {
                        artifact_id: artifact.id,
                    },
                })
            }
        }
    }

    /// Apply a decoded selection. Returns `false` and leaves the session untouched when a
    /// newer selection has been begun since this one.
    pub fn commit(&self, session: &mut EditingSession, decoded: DecodedSelection) -> bool {
        if decoded.seq != self.latest {
            tracing::warn!(
                seq = decoded.seq,
                latest = self.latest,
                "discarding stale selection"
            );
            return false;
        }

        tracing::debug!(seq = decoded.seq, origin = ?decoded.origin, "selection committed");
        session.replace_source(
            decoded.image,
            decoded.captions,
            decoded.template_id,
            decoded.origin,
        );
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/selector.rs"]
mod tests;
