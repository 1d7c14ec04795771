//! Storage infrastructure: configuration file persistence.
//!
//! - `config` reads and writes the TOML file and supplies defaults on first run.
//! - `settings` exposes the operator-editable part of it as a
//!   [`SettingsStore`](crate::application::forward_input::SettingsStore).

pub mod config;
pub mod settings;

pub use config::{ConfigError, ForwarderConfig};
pub use settings::TomlSettingsStore;
