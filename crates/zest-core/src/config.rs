//! Creator options and persistent user configuration.
//!
//! [`CreatorOptions`] seeds the metadata of a new script. Its defaults can be
//! overridden per user in `~/.zest/config.json`; every field of that file is
//! optional and missing fields keep the built-in default.
//!
//! # Example
//!
//! ```no_run
//! use zest_core::config::{CreatorOptions, ZestConfig};
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = ZestConfig::load();
//! let options = CreatorOptions::from_config(&config);
//! println!("Scripts will be authored by {}", options.author);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::{ScriptType, ZEST_VERSION};

const CONFIG_DIRNAME: &str = ".zest";
const CONFIG_FILENAME: &str = "config.json";

/// Returns `~/.zest`, or `None` if the home directory is unknown.
pub fn zest_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIRNAME))
}

/// Persistent user overrides for [`CreatorOptions`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ZestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Written to the script's `generatedBy` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl ZestConfig {
    /// Load config from `~/.zest/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        zest_dir()
            .map(|dir| Self::load_from(&dir.join(CONFIG_FILENAME)))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.zest/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        let dir = zest_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        std::fs::create_dir_all(&dir)?;
        self.save_to(&dir.join(CONFIG_FILENAME))
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

/// Metadata used when a creator starts a new script.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatorOptions {
    pub about: String,
    pub title: String,
    pub description: String,
    pub client: String,
    pub author: String,
    pub zest_version: String,
    pub script_type: ScriptType,
}

impl Default for CreatorOptions {
    fn default() -> Self {
        Self {
            about: "About text".to_string(),
            title: "Unnamed Zest script".to_string(),
            description: "No description".to_string(),
            client: "Zest-Creator".to_string(),
            author: "anon".to_string(),
            zest_version: ZEST_VERSION.to_string(),
            script_type: ScriptType::default(),
        }
    }
}

impl CreatorOptions {
    /// Built-in defaults with every field set in `config` taking precedence.
    pub fn from_config(config: &ZestConfig) -> Self {
        let defaults = Self::default();
        Self {
            about: config.about.clone().unwrap_or(defaults.about),
            title: config.title.clone().unwrap_or(defaults.title),
            description: config.description.clone().unwrap_or(defaults.description),
            client: config.client.clone().unwrap_or(defaults.client),
            author: config.author.clone().unwrap_or(defaults.author),
            ..defaults
        }
    }
}
