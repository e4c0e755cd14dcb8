use std::{
    collections::BTreeMap,
    io::Write as _,
    path::{Path, PathBuf},
};

use crate::foundation::error::{MemeError, MemeResult};

/// Durable named-blob capability the artifact store persists through.
///
/// `set_item` must be all-or-nothing: after an error the previous value is still readable.
pub trait StorageBackend {
    /// Read the value under `key`; `None` when absent.
    fn get_item(&self, key: &str) -> MemeResult<Option<String>>;
    /// Replace the value under `key`.
    fn set_item(&mut self, key: &str, value: &str) -> MemeResult<()>;
}

/// In-memory backend with an optional byte quota, for tests and ephemeral sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Unlimited in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total stored size (keys + values) past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently stored across keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> MemeResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> MemeResult<()> {
        if let Some(quota) = self.quota_bytes {
            let current = self.items.get(key).map_or(0, |v| key.len() + v.len());
            let after = self.used_bytes() - current + key.len() + value.len();
            if after > quota {
                return Err(MemeError::persistence(format!(
                    "storage quota exceeded ({after} > {quota} bytes)"
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory. Writes go to a temporary sibling first and are
/// renamed into place.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> MemeResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MemeError::persistence(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> MemeResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemeError::persistence(format!("create store dir '{}': {e}", self.dir.display()))
        })?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", sanitize_key(key)));
        let write = || -> std::io::Result<()> {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.sync_all()?;
            std::fs::rename(&tmp, &path)
        };
        write().map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            MemeError::persistence(format!("write '{}': {e}", path.display()))
        })
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/store/backend.rs"]
mod tests;
