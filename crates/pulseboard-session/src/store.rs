//! Durable session persistence.
//!
//! Two layers:
//!
//! - [`KeyValueStore`] — a dumb, synchronous, string-keyed store (think
//!   browser local storage). [`MemoryStore`] and [`FileStore`] implement it.
//! - [`SessionStore`] — the session's projection onto that store: exactly
//!   two keys, always written and removed together.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{SessionConfig, StoreError, User};

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// Synchronous string-keyed storage.
///
/// Methods take `&self`: implementations use interior mutability, the
/// same way a browser's storage object is shared by everything on a page.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads a value. `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-written.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// A store backed by a single JSON object file.
///
/// The whole map is held in memory and the file is rewritten (via a
/// temporary file and a rename) on every mutation, so a crash mid-write
/// leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens (or lazily creates) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and also treated as empty; the next write replaces it.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] only if the parent directory cannot be
    /// created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "corrupt store file, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable store file, starting empty");
                BTreeMap::new()
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// What survives a restart: the credential and the canonical user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub credential: String,
    pub user: User,
}

/// The session's two keys in a [`KeyValueStore`].
///
/// Invariant: both keys are present, or neither is. A half-written
/// session is never returned by [`load`](Self::load).
#[derive(Debug)]
pub struct SessionStore<S: KeyValueStore> {
    backend: S,
    config: SessionConfig,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S, config: SessionConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Persists the credential and user together.
    ///
    /// # Errors
    /// If either write fails, both keys are removed and the error is
    /// returned.
    pub fn save(&self, credential: &str, user: &User) -> Result<(), StoreError> {
        let result = serde_json::to_string(user)
            .map_err(StoreError::from)
            .and_then(|blob| {
                self.backend.set(&self.config.token_key, credential)?;
                self.backend.set(&self.config.user_key, &blob)
            });

        if let Err(e) = &result {
            tracing::error!(error = %e, "failed to persist session, rolling back");
            self.clear();
        }
        result
    }

    /// Reads the persisted session.
    ///
    /// Returns `None` when nothing is stored, when only one of the two
    /// keys is present, or when the user record does not parse. The last
    /// two cases are logged.
    pub fn load(&self) -> Option<PersistedSession> {
        let credential = self.read(&self.config.token_key);
        let blob = self.read(&self.config.user_key);

        match (credential, blob) {
            (Some(credential), Some(blob)) => match serde_json::from_str(&blob) {
                Ok(user) => Some(PersistedSession { credential, user }),
                Err(e) => {
                    tracing::warn!(error = %e, "stored user record is malformed");
                    None
                }
            },
            (None, None) => None,
            (credential, _) => {
                tracing::warn!(
                    has_credential = credential.is_some(),
                    "partially persisted session, ignoring"
                );
                None
            }
        }
    }

    /// Reads only the credential.
    pub fn credential(&self) -> Option<String> {
        self.read(&self.config.token_key)
    }

    /// Removes both keys. Idempotent; failures are logged, never returned.
    pub fn clear(&self) {
        for key in [&self.config.token_key, &self.config.user_key] {
            if let Err(e) = self.backend.remove(key) {
                tracing::error!(%key, error = %e, "failed to remove session key");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.backend.get(key).unwrap_or_else(|e| {
            tracing::warn!(%key, error = %e, "failed to read session key");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "ops@example.com".into(),
            name: "Ops".into(),
            role: "admin".into(),
            nationality: None,
            email_verified: Some(true),
        }
    }

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), SessionConfig::default())
    }

    /// A backend whose writes to one key always fail.
    struct FailingKey(MemoryStore, &'static str);

    impl KeyValueStore for FailingKey {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == self.1 {
                return Err(std::io::Error::other("disk full").into());
            }
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.0.remove(key)
        }
    }

    // =====================================================================
    // SessionStore
    // =====================================================================

    #[test]
    fn test_save_then_load_returns_both_parts() {
        let s = store();
        s.save("tok", &user()).unwrap();

        let loaded = s.load().expect("should load");

        assert_eq!(loaded.credential, "tok");
        assert_eq!(loaded.user, user());
        assert_eq!(s.credential().as_deref(), Some("tok"));
    }

    #[test]
    fn test_load_empty_returns_none() {
        assert!(store().load().is_none());
    }

    #[test]
    fn test_load_credential_without_user_returns_none() {
        let s = store();
        s.backend().set("pulseboard.token", "tok").unwrap();

        assert!(s.load().is_none());
    }

    #[test]
    fn test_load_user_without_credential_returns_none() {
        let s = store();
        s.backend()
            .set("pulseboard.user", &serde_json::to_string(&user()).unwrap())
            .unwrap();

        assert!(s.load().is_none());
    }

    #[test]
    fn test_load_malformed_user_returns_none() {
        let s = store();
        s.backend().set("pulseboard.token", "tok").unwrap();
        s.backend().set("pulseboard.user", "{not json").unwrap();

        assert!(s.load().is_none());
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let s = store();
        s.save("tok", &user()).unwrap();

        s.clear();

        assert!(s.backend().is_empty());
    }

    #[test]
    fn test_clear_never_set_is_noop() {
        let s = store();
        s.clear();
        s.clear();
        assert!(s.backend().is_empty());
    }

    #[test]
    fn test_save_second_write_fails_rolls_back_first() {
        let backend = FailingKey(MemoryStore::new(), "pulseboard.user");
        let s = SessionStore::new(backend, SessionConfig::default());

        let result = s.save("tok", &user());

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(s.backend().0.is_empty(), "credential should be rolled back");
    }

    #[test]
    fn test_custom_keys_are_used() {
        let s = SessionStore::new(
            MemoryStore::new(),
            SessionConfig {
                token_key: "t".into(),
                user_key: "u".into(),
            },
        );
        s.save("tok", &user()).unwrap();

        assert_eq!(s.backend().get("t").unwrap().as_deref(), Some("tok"));
        assert!(s.backend().get("u").unwrap().is_some());
    }

    // =====================================================================
    // MemoryStore / FileStore
    // =====================================================================

    #[test]
    fn test_memory_store_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("k", "v").unwrap();
            store.set("gone", "x").unwrap();
            store.remove("gone").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(reopened.get("gone").unwrap(), None);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "][").unwrap();

        let store = FileStore::open(&path).unwrap();

        assert_eq!(store.get("anything").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("s.json")).unwrap();
        assert!(store.remove("nope").is_ok());
    }
}
