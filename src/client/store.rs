//! Local persistence for the current session.
//!
//! One record under one well-known key, overwritten wholesale on login and
//! removed wholesale on logout or rejection.

use crate::auth::IssuedSession;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known key the session record lives under.
pub const STORAGE_KEY: &str = "app_secure_session";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the client keeps its session between calls.
pub trait SessionStore {
    fn load(&self) -> Result<Option<IssuedSession>, StoreError>;
    fn save(&self, session: &IssuedSession) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    session: Mutex<Option<IssuedSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<IssuedSession>, StoreError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save(&self, session: &IssuedSession) -> Result<(), StoreError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// JSON file named after [`STORAGE_KEY`].
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store the record as `<dir>/app_secure_session.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    /// A missing file is no session. An unreadable record is discarded.
    fn load(&self) -> Result<Option<IssuedSession>, StoreError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Discarding corrupt session record");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &IssuedSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(session)?;
        // Write then rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> IssuedSession {
        IssuedSession {
            token: "payload.tag".to_string(),
            fp: "fp1".to_string(),
            exp: 1_700_086_400_000,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "keygate-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = temp_dir("lifecycle");
        let store = FileStore::in_dir(&dir);
        assert!(store.path().ends_with("app_secure_session.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        let mut newer = session();
        newer.token = "other.tag".to_string();
        store.save(&newer).unwrap();
        assert_eq!(store.load().unwrap(), Some(newer));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine.
        store.clear().unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_discards_corrupt_record() {
        let dir = temp_dir("corrupt");
        let store = FileStore::in_dir(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(store.path(), b"{not json").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
