//! Flat key/value settings handed to the container during bootstrap.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

/// Conventional settings location, relative to the working directory.
pub const SETTINGS_FILE: &str = "socle.json";

/// Flat string-keyed, string-valued configuration mapping.
///
/// The bootstrap core consumes exactly one key, `namespace`, as the prefix
/// for domain name resolution; everything else is carried for aspects and
/// drivers to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from `path`. An absent file is the empty
    /// configuration, not an error; an unreadable or malformed file is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using empty configuration");
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| BootstrapError::SettingsIo {
                path: path.to_path_buf(),
                source,
            })?;
        let values = serde_json::from_str(&content).map_err(|source| {
            BootstrapError::SettingsParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
