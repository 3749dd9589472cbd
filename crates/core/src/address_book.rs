//! Address book persistence
//!
//! `addressBook.json` is a plain JSON array kept beside `config.json`. The shell
//! only guarantees the file exists and parses; entries are opaque to it.

use crate::config::{back_up_corrupt_file, ConfigError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the address book inside the profile directory
pub const ADDRESS_BOOK_FILE: &str = "addressBook.json";

/// Ordered address-book entries as stored on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressBook {
    path: PathBuf,
    entries: Vec<Value>,
}

impl AddressBook {
    /// Read the address book, initialising it to `[]` when absent or corrupt.
    /// Corrupt content is copied to `addressBook.notvalid.json` before being overwritten.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        if !path.exists() {
            write_empty(&path)?;
            return Ok(Self {
                path,
                entries: Vec::new(),
            });
        }

        let raw = fs::read(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let entries = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                back_up_corrupt_file(&path)?;
                write_empty(&path)?;
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} address book entries", entries.len());
        Ok(Self { path, entries })
    }

    pub fn load_from_dir(data_dir: &Path) -> Result<Self, ConfigError> {
        Self::load(data_dir.join(ADDRESS_BOOK_FILE))
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_empty(path: &Path) -> Result<(), ConfigError> {
    fs::write(path, "[]").map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
