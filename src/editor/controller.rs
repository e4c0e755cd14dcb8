use crate::{
    assets::decode,
    catalog::model::{CatalogView, TemplateCatalog},
    foundation::{
        core::RasterImage,
        error::{MemeError, MemeResult},
    },
    gallery::view::{Confirm, DELETE_PROMPT, Gallery, GalleryView, RemoveOutcome},
    render::compositor::Compositor,
    session::{
        editing::EditingSession,
        selector::{DecodedSelection, SelectionTicket, SourceRequest, SourceSelector, UploadedFile},
    },
    store::{
        artifact::{Artifact, ArtifactStore},
        backend::StorageBackend,
    },
};

/// Default file name for downloads.
pub const DOWNLOAD_FILE_NAME: &str = "mass-meme.png";

/// PNG export of the current meme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name.
    pub file_name: String,
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
}

/// Commands a UI adapter sends to the editor.
#[derive(Clone, Debug)]
pub enum EditorCommand {
    /// Decode and select an uploaded file.
    Upload(UploadedFile),
    /// Select a catalog template by id.
    PickTemplate(String),
    /// Re-edit a saved meme by id.
    PickSaved(u64),
    /// Replace the top caption.
    SetTopText(String),
    /// Replace the bottom caption.
    SetBottomText(String),
    /// Redraw the current meme.
    Generate,
    /// Save the current meme to the gallery.
    Save,
    /// Export the current meme as PNG.
    Download,
    /// Delete a saved meme after confirmation.
    RemoveSaved(u64),
}

/// Result of a dispatched command.
#[derive(Clone, Debug)]
pub enum EditorEvent {
    /// A selection was committed and redrawn.
    SelectionCommitted,
    /// A newer selection superseded this one; nothing changed.
    SelectionDiscarded,
    /// The canvas was redrawn (`None` when no background is selected yet).
    Rendered(Option<RasterImage>),
    /// A new artifact was stored.
    Saved(Artifact),
    /// Save was requested with no background selected.
    NothingToSave,
    /// PNG ready to be written.
    Download(Download),
    /// Download was requested with no background selected.
    NothingToDownload,
    /// Result of a gallery removal.
    Removed(RemoveOutcome),
}

/// Owns the single editing session and routes every user action to the components.
pub struct Editor<S> {
    session: EditingSession,
    selector: SourceSelector,
    compositor: Compositor,
    catalog: TemplateCatalog,
    store: ArtifactStore<S>,
}

impl<S: StorageBackend> Editor<S> {
    /// Editor over a catalog, compositor and store, with an empty session.
    pub fn new(catalog: TemplateCatalog, compositor: Compositor, store: ArtifactStore<S>) -> Self {
        Self {
            session: EditingSession::new(),
            selector: SourceSelector::new(),
            compositor,
            catalog,
            store,
        }
    }

    /// The current editing state.
    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    /// The template catalog.
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// The artifact store.
    pub fn store(&self) -> &ArtifactStore<S> {
        &self.store
    }

    /// Mutable access to the artifact store.
    pub fn store_mut(&mut self) -> &mut ArtifactStore<S> {
        &mut self.store
    }

    /// Template picker state, highlighting the session's template.
    pub fn templates(&self) -> CatalogView {
        self.catalog.view(self.session.template_id())
    }

    /// Gallery projection of the store.
    pub fn gallery(&self) -> Gallery {
        GalleryView::project(&self.store)
    }

    /// Stamp a selection request (first step of a split selection).
    pub fn begin_selection(&mut self, request: SourceRequest) -> SelectionTicket {
        self.selector.begin(request)
    }

    /// Decode a stamped request without touching the session.
    pub fn decode_selection(&self, ticket: SelectionTicket) -> MemeResult<DecodedSelection> {
        self.selector.decode(ticket, &self.catalog)
    }

    /// Commit a decoded selection and redraw. Returns `false` when the selection was stale.
    pub fn commit_selection(&mut self, decoded: DecodedSelection) -> MemeResult<bool> {
        if !self.selector.commit(&mut self.session, decoded) {
            return Ok(false);
        }
        self.compositor.render(&mut self.session)?;
        Ok(true)
    }

    fn select(&mut self, request: SourceRequest) -> MemeResult<bool> {
        let ticket = self.begin_selection(request);
        let decoded = self.decode_selection(ticket)?;
        self.commit_selection(decoded)
    }

    /// Select an uploaded image; captions start blank.
    pub fn upload(&mut self, file: UploadedFile) -> MemeResult<bool> {
        self.select(SourceRequest::Upload(file))
    }

    /// Select a catalog template with its default captions.
    pub fn pick_template(&mut self, id: &str) -> MemeResult<bool> {
        self.select(SourceRequest::Template { id: id.to_string() })
    }

    /// Load a saved meme back into the editor (the gallery's activate interaction).
    pub fn pick_saved(&mut self, id: u64) -> MemeResult<bool> {
        let artifact = self
            .store
            .get(id)
            .ok_or_else(|| MemeError::validation(format!("no saved meme with id {id}")))?;
        self.select(SourceRequest::Saved(artifact))
    }

    /// Set the top caption and redraw.
    pub fn set_top_text(&mut self, text: impl Into<String>) -> MemeResult<Option<RasterImage>> {
        self.session.set_top_text(text);
        self.generate()
    }

    /// Set the bottom caption and redraw.
    pub fn set_bottom_text(&mut self, text: impl Into<String>) -> MemeResult<Option<RasterImage>> {
        self.session.set_bottom_text(text);
        self.generate()
    }

    /// Redraw the session. `Ok(None)` when no background is selected.
    pub fn generate(&mut self) -> MemeResult<Option<RasterImage>> {
        self.compositor.render(&mut self.session)
    }

    fn ensure_current_output(&mut self) -> MemeResult<()> {
        if self.session.image().is_some() && !self.session.output_is_current() {
            self.generate()?;
        }
        Ok(())
    }

    /// Persist the current meme. `Ok(None)` when no background is selected.
    pub fn save(&mut self) -> MemeResult<Option<Artifact>> {
        self.ensure_current_output()?;
        self.store.create(&self.session)
    }

    /// PNG of the current meme, redrawn first if stale. `Ok(None)` without a background.
    pub fn download(&mut self) -> MemeResult<Option<Download>> {
        self.ensure_current_output()?;
        let Some(output) = self.session.output() else {
            return Ok(None);
        };
        Ok(Some(Download {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            png: decode::encode_png(&output.image)?,
        }))
    }

    /// The gallery's remove interaction. Never touches the editing session.
    pub fn remove_saved(&mut self, id: u64, confirm: &mut dyn Confirm) -> MemeResult<RemoveOutcome> {
        if self.store.get(id).is_none() {
            return Ok(RemoveOutcome::NotFound);
        }
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(RemoveOutcome::Declined);
        }
        if self.store.delete(id)? {
            Ok(RemoveOutcome::Deleted)
        } else {
            Ok(RemoveOutcome::NotFound)
        }
    }

    /// Run one UI command and report what happened.
    pub fn dispatch(
        &mut self,
        command: EditorCommand,
        confirm: &mut dyn Confirm,
    ) -> MemeResult<EditorEvent> {
        let selection = |committed: bool| {
            if committed {
                EditorEvent::SelectionCommitted
            } else {
                EditorEvent::SelectionDiscarded
            }
        };

        match command {
            EditorCommand::Upload(file) => self.upload(file).map(selection),
            EditorCommand::PickTemplate(id) => self.pick_template(&id).map(selection),
            EditorCommand::PickSaved(id) => self.pick_saved(id).map(selection),
            EditorCommand::SetTopText(text) => self.set_top_text(text).map(EditorEvent::Rendered),
            EditorCommand::SetBottomText(text) => {
                self.set_bottom_text(text).map(EditorEvent::Rendered)
            }
            EditorCommand::Generate => self.generate().map(EditorEvent::Rendered),
            EditorCommand::Save => Ok(match self.save()? {
                Some(artifact) => EditorEvent::Saved(artifact),
                None => EditorEvent::NothingToSave,
            }),
            EditorCommand::Download => Ok(match self.download()? {
                Some(download) => EditorEvent::Download(download),
                None => EditorEvent::NothingToDownload,
            }),
            EditorCommand::RemoveSaved(id) => self.remove_saved(id, confirm).map(EditorEvent::Removed),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/controller.rs"]
mod tests;
