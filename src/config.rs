use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::persistence::settings_file;

/// Web-app endpoint of the Surat OTOP Biz backend sheet.
pub const DEFAULT_API_URL: &str = "https://script.google.com/macros/s/AKfycbzhwlN31US9ZjyJ_ZNKJiAwykTTc2p9aWQxsGJxdC0uxj-ABNtZ86s5U3MxeE02nFC1/exec";

pub const ENV_API_URL: &str = "OTOP_API_URL";
pub const ENV_DATA_DIR: &str = "OTOP_DATA_DIR";
pub const ENV_OWNER_ID: &str = "OTOP_OWNER_ID";

/// Application settings read from `settings.toml`; every field is optional in
/// the file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    /// Overrides the platform data directory for drafts and session data.
    pub data_dir: Option<PathBuf>,
    /// Owner stamped on saved records when no session is stored.
    pub owner_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            owner_id: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Settings {
    /// Loads the user settings file (if any) and applies environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        let settings = match settings_file() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(settings.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(owner) = lookup(ENV_OWNER_ID) {
            self.owner_id = Some(owner);
        }
        self
    }
}
