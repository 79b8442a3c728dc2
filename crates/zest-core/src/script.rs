//! The root script document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CreatorOptions;
use crate::error::ScriptError;
use crate::statement::Statement;

/// Version of the Zest format written by this crate.
pub const ZEST_VERSION: &str = "1.0";

/// The script's own structural index, outside the statement index space.
pub const SCRIPT_INDEX: usize = 1;

/// Script category, stored in the document's `type` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptType {
    #[default]
    #[serde(alias = "StandAlone")]
    Standalone,
    Active,
    Passive,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Standalone => "Standalone",
            ScriptType::Active => "Active",
            ScriptType::Passive => "Passive",
        }
    }

    /// Tokens a script of this type starts with when its file declares none.
    ///
    /// Passive scripts see both sides of an exchange; active scripts only
    /// the request they are about to send.
    pub fn default_tokens(&self) -> BTreeMap<String, String> {
        let names: &[&str] = match self {
            ScriptType::Standalone => &[],
            ScriptType::Active => &[
                "request.header",
                "request.body",
                "request.url",
                "request.method",
            ],
            ScriptType::Passive => &[
                "response.body",
                "response.header",
                "request.body",
                "request.header",
                "request.url",
                "request.method",
            ],
        };
        names
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect()
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptType {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standalone" | "StandAlone" => Ok(ScriptType::Standalone),
            "Active" => Ok(ScriptType::Active),
            "Passive" => Ok(ScriptType::Passive),
            other => Err(ScriptError::UnrecognizedScriptType(other.to_string())),
        }
    }
}

/// Token delimiters and values available to statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", tag = "elementType", rename = "ZestVariables")]
pub struct Parameters {
    pub token_start: String,
    pub token_end: String,
    pub tokens: BTreeMap<String, String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            token_start: "{{".to_string(),
            token_end: "}}".to_string(),
            tokens: BTreeMap::new(),
        }
    }
}

/// A complete Zest script as persisted to a `.zst` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", tag = "elementType", rename = "ZestScript")]
pub struct ZestScript {
    pub about: String,
    pub zest_version: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub generated_by: String,
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub parameters: Parameters,
    pub statements: Vec<Statement>,
    /// Passed through untouched.
    pub authentication: Vec<Value>,
    pub index: usize,
    pub enabled: bool,
}

impl ZestScript {
    /// An empty script carrying the metadata from `options`.
    pub fn new(options: &CreatorOptions) -> Self {
        Self {
            about: options.about.clone(),
            zest_version: options.zest_version.clone(),
            title: options.title.clone(),
            description: options.description.clone(),
            author: options.author.clone(),
            generated_by: options.client.clone(),
            script_type: options.script_type,
            parameters: Parameters::default(),
            statements: Vec::new(),
            authentication: Vec::new(),
            index: SCRIPT_INDEX,
            enabled: true,
        }
    }
}

impl Default for ZestScript {
    fn default() -> Self {
        Self::new(&CreatorOptions::default())
    }
}
