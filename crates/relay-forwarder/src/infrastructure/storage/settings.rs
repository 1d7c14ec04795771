//! [`SettingsStore`] backed by the TOML config file.
//!
//! Reads come from an in-memory copy.  Writes update the copy and persist the
//! whole file; a failed persist is logged at `warn` and never reaches the
//! pipeline.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use super::config::{save_config_to, ForwarderConfig};
use crate::application::forward_input::SettingsStore;

pub struct TomlSettingsStore {
    path: PathBuf,
    config: Mutex<ForwarderConfig>,
}

impl TomlSettingsStore {
    pub fn new(path: PathBuf, config: ForwarderConfig) -> Self {
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> ForwarderConfig {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ForwarderConfig> {
        // A poisoned lock still holds a usable config.
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, change: impl FnOnce(&mut ForwarderConfig)) {
        let snapshot = {
            let mut config = self.lock();
            change(&mut config);
            config.clone()
        };
        match save_config_to(&self.path, &snapshot) {
            Ok(()) => debug!(path = %self.path.display(), "settings saved"),
            Err(err) => warn!("failed to persist settings: {err}"),
        }
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get_cursor_preference(&self) -> String {
        self.lock().pointer.cursor.clone()
    }

    fn set_cursor_preference(&self, cursor: &str) {
        let cursor = cursor.to_string();
        self.update(|config| config.pointer.cursor = cursor);
    }

    fn is_keystroke_history_enabled(&self) -> bool {
        self.lock().keyboard.history_enabled
    }

    fn enable_keystroke_history(&self) {
        self.update(|config| config.keyboard.history_enabled = true);
    }

    fn disable_keystroke_history(&self) {
        self.update(|config| config.keyboard.history_enabled = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::config::load_config_from;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("relay-settings-{}", uuid::Uuid::new_v4()))
            .join("config.toml")
    }

    #[test]
    fn test_reads_come_from_loaded_config() {
        let mut config = ForwarderConfig::default();
        config.pointer.cursor = "none".to_string();
        let store = TomlSettingsStore::new(scratch_path(), config);

        assert_eq!(store.get_cursor_preference(), "none");
        assert!(store.is_keystroke_history_enabled());
    }

    #[test]
    fn test_writes_are_persisted() {
        // Arrange
        let path = scratch_path();
        let store = TomlSettingsStore::new(path.clone(), ForwarderConfig::default());

        // Act
        store.set_cursor_preference("crosshair");
        store.disable_keystroke_history();

        // Assert
        let on_disk = load_config_from(&path).unwrap();
        assert_eq!(on_disk.pointer.cursor, "crosshair");
        assert!(!on_disk.keyboard.history_enabled);
        assert!(!store.is_keystroke_history_enabled());
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_unwritable_path_keeps_in_memory_value() {
        // A path under a regular file cannot be created.
        let blocker = std::env::temp_dir().join(format!("relay-blocker-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"x").unwrap();
        let store = TomlSettingsStore::new(blocker.join("config.toml"), ForwarderConfig::default());

        store.enable_keystroke_history();
        store.set_cursor_preference("pointer");

        assert_eq!(store.get_cursor_preference(), "pointer");
        std::fs::remove_file(&blocker).ok();
    }
}
