use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    assets::decode,
    foundation::error::{MemeError, MemeResult},
    session::editing::EditingSession,
    store::backend::StorageBackend,
};

/// Storage key holding the whole artifact collection.
pub const SAVED_MEMES_KEY: &str = "savedMemes";

/// A saved meme: the fully composited PNG plus the captions it was drawn with.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Creation time in milliseconds since the Unix epoch, unique within the store.
    pub id: u64,
    /// Top caption as typed (drawn upper-cased).
    #[serde(default)]
    pub top_text: String,
    /// Bottom caption as typed (drawn upper-cased).
    #[serde(default)]
    pub bottom_text: String,
    /// `data:image/png;base64,...` snapshot of the composited raster.
    #[serde(rename = "imageUrl")]
    pub encoded_image: String,
    /// Catalog template the meme was made from, for bookkeeping only.
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Time source for artifact ids.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall-clock [`Clock`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl<F: Fn() -> u64> Clock for F {
    fn now_millis(&self) -> u64 {
        self()
    }
}

/// Durable, insertion-ordered collection of artifacts.
///
/// Nothing is cached: every call reads the persisted record, and `create`/`delete` rewrite
/// it wholesale, so the durable record is the only source of truth.
pub struct ArtifactStore<S> {
    storage: S,
    clock: Box<dyn Clock>,
    last_issued: u64,
}

impl<S: StorageBackend> ArtifactStore<S> {
    /// Store over `storage`, stamped by the system clock.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }

    /// Store over `storage` with an injected time source.
    pub fn with_clock(storage: S, clock: impl Clock + 'static) -> Self {
        Self {
            storage,
            clock: Box::new(clock),
            last_issued: 0,
        }
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the underlying storage backend.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// All saved artifacts in insertion order. Missing, unreadable or malformed data reads
    /// as an empty collection.
    pub fn list(&self) -> Vec<Artifact> {
        match self.load() {
            Ok(artifacts) => artifacts,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved memes, treating as empty");
                Vec::new()
            }
        }
    }

    /// Look up one artifact by id.
    pub fn get(&self, id: u64) -> Option<Artifact> {
        self.list().into_iter().find(|a| a.id == id)
    }

    /// Save the session's current output. Returns `Ok(None)` when nothing has been rendered.
    ///
    /// A storage read failure aborts before anything is written; a malformed record is
    /// replaced by a collection holding only the new artifact.
    #[tracing::instrument(skip_all)]
    pub fn create(&mut self, session: &EditingSession) -> MemeResult<Option<Artifact>> {
        let Some(output) = session.output() else {
            tracing::debug!("no rendered output, nothing to save");
            return Ok(None);
        };

        let mut artifacts = self.load_for_write()?;
        let max_persisted = artifacts.iter().map(|a| a.id).max().unwrap_or(0);
        let floor = self
            .last_issued
            .max(max_persisted)
            .checked_add(1)
            .ok_or_else(|| MemeError::persistence("artifact id space exhausted"))?;
        let id = self.clock.now_millis().max(floor);

        let artifact = Artifact {
            id,
            top_text: output.captions.top_text.clone(),
            bottom_text: output.captions.bottom_text.clone(),
            encoded_image: decode::encode_png_data_uri(&output.image)?,
            template_id: session.template_id().map(str::to_string),
        };
        artifacts.push(artifact.clone());
        self.persist(&artifacts)?;

        self.last_issued = id;
        tracing::info!(id, count = artifacts.len(), "meme saved");
        Ok(Some(artifact))
    }

    /// Remove the artifact with `id`. Deleting an absent id is a no-op returning `false`.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: u64) -> MemeResult<bool> {
        let mut artifacts = self.load_for_write()?;
        let before = artifacts.len();
        artifacts.retain(|a| a.id != id);
        if artifacts.len() == before {
            return Ok(false);
        }

        self.persist(&artifacts)?;
        tracing::info!(id, remaining = artifacts.len(), "meme deleted");
        Ok(true)
    }

    fn load(&self) -> MemeResult<Vec<Artifact>> {
        let Some(raw) = self.storage.get_item(SAVED_MEMES_KEY)? else {
            return Ok(Vec::new());
        };
        // A stored JSON `null` reads the same as an absent record.
        let parsed: Option<Vec<Artifact>> = serde_json::from_str(&raw)
            .map_err(|e| MemeError::serde(format!("parse saved memes: {e}")))?;
        Ok(parsed.unwrap_or_default())
    }

    /// Like `list`, but only a malformed record degrades to empty. Read failures propagate so
    /// that a rewrite can never drop artifacts the backend merely failed to return.
    fn load_for_write(&self) -> MemeResult<Vec<Artifact>> {
        match self.load() {
            Err(MemeError::Serde(msg)) => {
                tracing::warn!(error = %msg, "saved memes are malformed, starting over");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn persist(&mut self, artifacts: &[Artifact]) -> MemeResult<()> {
        let json = serde_json::to_string(artifacts)
            .map_err(|e| MemeError::serde(format!("serialize saved memes: {e}")))?;
        self.storage
            .set_item(SAVED_MEMES_KEY, &json)
            .inspect_err(|e| tracing::warn!(error = %e, "saving memes did not take effect"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/artifact.rs"]
mod tests;
