use crate::store::{artifact::ArtifactStore, backend::StorageBackend};

/// Shown instead of the list when nothing is saved.
pub const EMPTY_GALLERY_MESSAGE: &str = "No memes saved yet!";
/// Question asked before deleting a saved meme.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this meme?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Ask `prompt`; `true` means go ahead.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Confirms every prompt (non-interactive use).
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// One saved meme as shown in the gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryEntry {
    /// Artifact id.
    pub id: u64,
    /// Saved top caption.
    pub top_text: String,
    /// Saved bottom caption.
    pub bottom_text: String,
    /// The artifact's own data URI, used as its thumbnail.
    pub thumbnail: String,
    /// Template the meme was made from, if any.
    pub template_id: Option<String>,
}

/// Gallery projection of the artifact store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gallery {
    /// Nothing saved; show `message`.
    Empty {
        /// Placeholder text shown instead of a list.
        message: &'static str,
    },
    /// Saved memes in insertion order.
    Entries(Vec<GalleryEntry>),
}

impl Gallery {
    /// The listed entries (empty for [`Gallery::Empty`]).
    pub fn entries(&self) -> &[GalleryEntry] {
        match self {
            Self::Empty { .. } => &[],
            Self::Entries(entries) => entries,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when nothing is saved.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// What a gallery interaction led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The artifact was removed.
    Deleted,
    /// The user said no.
    Declined,
    /// No artifact with that id.
    NotFound,
}

/// Builds [`Gallery`] projections.
pub struct GalleryView;

impl GalleryView {
    /// Re-derive the displayed list from the store.
    pub fn project<S: StorageBackend>(store: &ArtifactStore<S>) -> Gallery {
        let artifacts = store.list();
        if artifacts.is_empty() {
            return Gallery::Empty {
                message: EMPTY_GALLERY_MESSAGE,
            };
        }
        Gallery::Entries(
            artifacts
                .into_iter()
                .map(|a| GalleryEntry {
                    id: a.id,
                    top_text: a.top_text,
                    bottom_text: a.bottom_text,
                    thumbnail: a.encoded_image,
                    template_id: a.template_id,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gallery/view.rs"]
mod tests;
