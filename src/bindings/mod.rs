//! # Binding Persistence Module
//!
//! Persists paddle-to-key bindings across runs.
//!
//! The [`BindingStore`] speaks to any [`KeyValueStore`]; keys are paddle
//! names and values are key names, so the stored form stays human
//! readable. A missing or unparseable stored value means "no binding" -
//! persistence problems never fail the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::gamepad::button::{PaddleButton, ALL_PADDLES};
use crate::keys::KeyCode;

/// Trait for the key-value persistence boundary.
pub trait KeyValueStore: Send {
    /// The stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);

    /// Removes the value under `key`, if present.
    fn remove(&mut self, key: &str);
}

/// Key-value store backed by a TOML file of string pairs.
///
/// The file is read once at open and written through on every mutation.
/// An absent or corrupt file loads as empty; a failed write is logged and
/// dropped, leaving the in-memory view authoritative for this run.
pub struct TomlSettingsStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl TomlSettingsStore {
    /// Opens the store at `path`, tolerating a missing or corrupt file.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<HashMap<String, String>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        "Settings file {} is corrupt ({}), starting empty",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) => {
                debug!(
                    "Settings file {} not readable ({}), starting empty",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };

        Self { path, values }
    }

    fn persist(&self) {
        let serialized = match toml::to_string(&self.values) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize settings: {}", e);
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!("Failed to write settings to {}: {}", self.path.display(), e);
        }
    }
}

impl KeyValueStore for TomlSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.persist();
        }
    }
}

/// Persists and loads paddle-to-key bindings.
pub struct BindingStore {
    store: Box<dyn KeyValueStore>,
}

impl BindingStore {
    /// Creates a binding store over any key-value backend.
    #[must_use]
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persists one binding.
    pub fn save(&mut self, paddle: PaddleButton, key: KeyCode) {
        self.store.set(&paddle.to_string(), &key.to_string());
    }

    /// Removes one binding.
    pub fn remove(&mut self, paddle: PaddleButton) {
        self.store.remove(&paddle.to_string());
    }

    /// Loads the stored binding for `paddle`.
    ///
    /// A missing entry or an unparseable key name both load as `None`.
    #[must_use]
    pub fn try_load(&self, paddle: PaddleButton) -> Option<KeyCode> {
        let value = self.store.get(&paddle.to_string())?;
        match value.parse::<KeyCode>() {
            Ok(key) => Some(key),
            Err(_) => {
                warn!(
                    "Stored binding for {} is not a known key ({:?}), ignoring",
                    paddle, value
                );
                None
            }
        }
    }

    /// Restores the bindings of all paddles, skipping unbound ones.
    #[must_use]
    pub fn load_all(&self) -> HashMap<PaddleButton, KeyCode> {
        ALL_PADDLES
            .into_iter()
            .filter_map(|paddle| self.try_load(paddle).map(|key| (paddle, key)))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::MemoryStore;
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> BindingStore {
        let path = dir.path().join("bindings.toml");
        BindingStore::new(Box::new(TomlSettingsStore::open(path)))
    }

    // ==================== BindingStore Tests ====================

    #[test]
    fn test_try_load_absent_binding() {
        let store = BindingStore::new(Box::new(MemoryStore::new()));
        assert_eq!(store.try_load(PaddleButton::Paddle1), None);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = BindingStore::new(Box::new(MemoryStore::new()));
        store.save(PaddleButton::Paddle1, KeyCode::A);
        assert_eq!(store.try_load(PaddleButton::Paddle1), Some(KeyCode::A));
        assert_eq!(store.try_load(PaddleButton::Paddle2), None);
    }

    #[test]
    fn test_save_then_remove_round_trip() {
        // Binding then unbinding restores the "no binding" state
        let mut store = BindingStore::new(Box::new(MemoryStore::new()));
        store.save(PaddleButton::Paddle3, KeyCode::F5);
        store.remove(PaddleButton::Paddle3);
        assert_eq!(store.try_load(PaddleButton::Paddle3), None);
    }

    #[test]
    fn test_rebind_replaces_previous_key() {
        let mut store = BindingStore::new(Box::new(MemoryStore::new()));
        store.save(PaddleButton::Paddle1, KeyCode::A);
        store.save(PaddleButton::Paddle1, KeyCode::B);
        assert_eq!(store.try_load(PaddleButton::Paddle1), Some(KeyCode::B));
    }

    #[test]
    fn test_corrupt_stored_value_loads_as_unbound() {
        let mut backing = MemoryStore::new();
        backing.set("Paddle1", "NotAKey");
        let store = BindingStore::new(Box::new(backing));
        assert_eq!(store.try_load(PaddleButton::Paddle1), None);
    }

    #[test]
    fn test_load_all() {
        let mut store = BindingStore::new(Box::new(MemoryStore::new()));
        store.save(PaddleButton::Paddle1, KeyCode::A);
        store.save(PaddleButton::Paddle4, KeyCode::Space);

        let all = store.load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&PaddleButton::Paddle1], KeyCode::A);
        assert_eq!(all[&PaddleButton::Paddle4], KeyCode::Space);
    }

    // ==================== TomlSettingsStore Tests ====================

    #[test]
    fn test_toml_store_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.try_load(PaddleButton::Paddle1), None);
    }

    #[test]
    fn test_toml_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.toml");

        {
            let mut store = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
            store.save(PaddleButton::Paddle2, KeyCode::Enter);
        }

        let reopened = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
        assert_eq!(
            reopened.try_load(PaddleButton::Paddle2),
            Some(KeyCode::Enter)
        );
    }

    #[test]
    fn test_toml_store_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.toml");

        {
            let mut store = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
            store.save(PaddleButton::Paddle2, KeyCode::Enter);
            store.remove(PaddleButton::Paddle2);
        }

        let reopened = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
        assert_eq!(reopened.try_load(PaddleButton::Paddle2), None);
    }

    #[test]
    fn test_toml_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let store = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
        assert_eq!(store.try_load(PaddleButton::Paddle1), None);
    }

    #[test]
    fn test_toml_store_file_is_readable_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.toml");

        let mut store = BindingStore::new(Box::new(TomlSettingsStore::open(&path)));
        store.save(PaddleButton::Paddle1, KeyCode::A);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Paddle1"));
        assert!(contents.contains("\"A\""));
    }
}
