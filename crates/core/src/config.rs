//! Configuration module for the Proton Wallet shell.
//!
//! This module provides functionality for managing application configuration,
//! including:
//! - Merging compiled-in defaults with the user's persisted overrides
//! - Recovering from a corrupt `config.json` without bothering the user
//! - Persisting the whole record to disk as JSON on every change
//! - Determining the profile directory the wallet stores its files in
//!
//! The record is a flat JSON object. Keys the user never touched are filled in
//! from [`DEFAULT_CONFIG`], so a file written by an older release still gains
//! every setting added since.
//!
//! # Example
//!
//! ```no_run
//! use proton_wallet_core::config::{ConfigStore, DEFAULT_CONFIG};
//!
//! let mut store = ConfigStore::load("/tmp/config.json", &DEFAULT_CONFIG).unwrap();
//! store.set("darkMode", true.into()).unwrap();
//! assert!(store.get_bool("darkMode"));
//! ```

use directories::BaseDirs;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the persisted config inside the profile directory
pub const CONFIG_FILE: &str = "config.json";

/// Name of the hidden profile directory under the user's home
pub const PROFILE_DIR_NAME: &str = ".protonwallet";

/// Log subdirectory inside the profile directory
pub const LOG_DIR_NAME: &str = "logs";

/// Settings record: setting name -> JSON value
pub type ConfigRecord = Map<String, Value>;

/// Compiled-in defaults. Every key here is guaranteed to exist after [`ConfigStore::load`].
pub static DEFAULT_CONFIG: Lazy<ConfigRecord> = Lazy::new(|| {
    let defaults = json!({
        "darkMode": false,
        "selectedFiat": "usd",
        "closeToTray": false,
        "notifications": true,
        "walletFile": "",
        "daemonHost": "blockapi.turtlepay.io",
        "daemonPort": 443,
        "useLocalDaemon": false,
        "daemonLogPath": "",
        "autoLockEnabled": true,
        "autoLockInterval": 30,
        "logLevel": "DISABLED",
        "scanCoinbaseTransactions": false,
    });

    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine user home directory")]
    NoHomeDirectory,
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to back up corrupt file {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Get the wallet's profile directory (`~/.protonwallet`)
/// Creates the directory and its `logs` subdirectory if they don't exist
pub fn get_data_directory() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
    let data_dir = base_dirs.home_dir().join(PROFILE_DIR_NAME);
    ensure_directories(&data_dir)?;
    Ok(data_dir)
}

/// Create the profile directory layout under `data_dir`
pub fn ensure_directories(data_dir: &Path) -> Result<(), ConfigError> {
    for dir in [data_dir.to_path_buf(), data_dir.join(LOG_DIR_NAME)] {
        if !dir.exists() {
            tracing::debug!("{} not detected, creating...", dir.display());
        }
        fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Path the corrupt copy of `path` is kept under, e.g. `config.notvalid.json`
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.notvalid.json"))
}

/// Copy a file that failed to parse next to itself so it can be inspected later
pub(crate) fn back_up_corrupt_file(path: &Path) -> Result<PathBuf, ConfigError> {
    let backup = backup_path_for(path);
    fs::copy(path, &backup).map_err(|source| ConfigError::Backup {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::warn!(
        "{} is not valid JSON, original kept at {}",
        path.display(),
        backup.display()
    );
    Ok(backup)
}

/// Process-wide settings with their persisted copy
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: ConfigRecord,
}

impl ConfigStore {
    /// Load `path`, merge it over `defaults` and write the merged record back.
    ///
    /// A missing file yields the defaults. A file that is not a JSON object is
    /// copied aside and replaced by the defaults. Only I/O failures are errors.
    pub fn load(path: impl Into<PathBuf>, defaults: &ConfigRecord) -> Result<Self, ConfigError> {
        let path = path.into();
        let mut values = defaults.clone();

        if path.exists() {
            tracing::debug!("Config file found at {}, using it...", path.display());
            let raw = fs::read(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;

            match serde_json::from_slice::<Value>(&raw) {
                Ok(Value::Object(user)) => {
                    // persisted keys win, defaults fill the gaps
                    values.extend(user);
                }
                Ok(_) | Err(_) => {
                    back_up_corrupt_file(&path)?;
                }
            }
        } else {
            tracing::info!("Creating new config at {}", path.display());
        }

        let store = Self { path, values };
        store.save()?;
        Ok(store)
    }

    /// Load `config.json` from the given profile directory with the compiled-in defaults
    pub fn load_from_dir(data_dir: &Path) -> Result<Self, ConfigError> {
        Self::load(data_dir.join(CONFIG_FILE), &DEFAULT_CONFIG)
    }

    /// Set one key and rewrite the whole record
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        tracing::debug!("Config update: {} set to {}", key, value);
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Overlay a full record sent by the UI and rewrite the file
    pub fn replace(&mut self, record: ConfigRecord) -> Result<(), ConfigError> {
        for (key, value) in record {
            self.values.insert(key, value);
        }
        self.save()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Boolean setting, `false` when absent or not a boolean
    pub fn get_bool(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn close_to_tray(&self) -> bool {
        self.get_bool("closeToTray")
    }

    pub fn selected_fiat(&self) -> &str {
        self.get_str("selectedFiat").unwrap_or("usd")
    }

    /// Copy of the current record, suitable for sending over the relay
    pub fn snapshot(&self) -> ConfigRecord {
        self.values.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the config file lives in
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Save the full record as pretty-printed JSON
    fn save(&self) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!("Wrote config file to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> ConfigRecord {
        match json!({ "darkMode": false, "selectedFiat": "usd" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_missing_file_yields_defaults_and_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let store = ConfigStore::load(&path, &defaults()).unwrap();
        assert_eq!(store.snapshot(), defaults());

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, Value::Object(defaults()));
    }

    #[test]
    fn test_persisted_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"darkMode": true}"#).unwrap();

        let store = ConfigStore::load(&path, &defaults()).unwrap();

        assert_eq!(
            Value::Object(store.snapshot()),
            json!({ "darkMode": true, "selectedFiat": "usd" })
        );
        // merged result is rewritten
        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({ "darkMode": true, "selectedFiat": "usd" }));
    }

    #[test]
    fn test_unknown_persisted_keys_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"walletFile": "/home/me/a.wallet"}"#).unwrap();

        let store = ConfigStore::load(&path, &defaults()).unwrap();
        assert_eq!(store.get_str("walletFile"), Some("/home/me/a.wallet"));
        assert!(!store.get_bool("darkMode"));
    }

    #[test]
    fn test_corrupt_file_is_backed_up_and_replaced_by_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let corrupt = b"{\"darkMode\": tru";
        fs::write(&path, corrupt).unwrap();

        let store = ConfigStore::load(&path, &defaults()).unwrap();
        assert_eq!(store.snapshot(), defaults());

        let backup = dir.path().join("config.notvalid.json");
        assert_eq!(fs::read(&backup).unwrap(), corrupt);
    }

    #[test]
    fn test_non_object_json_counts_as_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = ConfigStore::load(&path, &defaults()).unwrap();
        assert_eq!(store.snapshot(), defaults());
        assert!(dir.path().join("config.notvalid.json").exists());
    }

    #[test]
    fn test_set_rewrites_whole_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut store = ConfigStore::load(&path, &defaults()).unwrap();

        store.set("closeToTray", Value::Bool(true)).unwrap();
        assert!(store.close_to_tray());

        let reloaded = ConfigStore::load(&path, &defaults()).unwrap();
        assert!(reloaded.close_to_tray());
        assert_eq!(reloaded.selected_fiat(), "usd");
    }

    #[test]
    fn test_default_config_has_core_keys() {
        for key in ["darkMode", "selectedFiat", "closeToTray", "walletFile"] {
            assert!(DEFAULT_CONFIG.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_backup_path_naming() {
        assert_eq!(
            backup_path_for(Path::new("/x/addressBook.json")),
            PathBuf::from("/x/addressBook.notvalid.json")
        );
    }
}
