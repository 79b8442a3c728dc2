//! Loading and saving `.zst` files.
//!
//! Loading validates the document before handing it out: the script type
//! must be supported, passive scripts may not send requests, and the
//! statement indices must already form the sequence `1..=N`. Any failure
//! aborts the load.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::ScriptError;
use crate::navigator::{check_indices, preorder};
use crate::script::{ScriptType, ZestScript};

/// File extension of Zest scripts, without the dot.
pub const SCRIPT_EXTENSION: &str = "zst";

/// File name used when saving without an explicit path.
pub const DEFAULT_FILENAME: &str = "newzest.zst";

pub fn load_file(path: &Path) -> Result<ZestScript, ScriptError> {
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "loading script");
    load_str(&content)
}

pub fn load_str(json: &str) -> Result<ZestScript, ScriptError> {
    let value: Value = serde_json::from_str(json)?;
    load_value(value)
}

/// Validates and converts a parsed JSON document.
pub fn load_value(mut value: Value) -> Result<ZestScript, ScriptError> {
    let script_type = match value.get("type") {
        None | Some(Value::Null) => ScriptType::Standalone,
        Some(Value::String(name)) => name.parse()?,
        Some(other) => return Err(ScriptError::UnrecognizedScriptType(other.to_string())),
    };

    // A null token map counts as missing.
    if let Some(params) = value.get_mut("parameters").and_then(Value::as_object_mut) {
        if params.get("tokens").is_some_and(Value::is_null) {
            params.remove("tokens");
        }
    }
    let has_tokens = value.pointer("/parameters/tokens").is_some();

    let mut script: ZestScript = serde_json::from_value(value)?;
    script.script_type = script_type;

    if script_type == ScriptType::Passive {
        if let Some(stmt) = preorder(&script.statements).find(|s| s.kind.issues_requests()) {
            return Err(ScriptError::NotAllowedInPassiveScript(
                stmt.element_type().to_string(),
            ));
        }
    }

    if !has_tokens {
        script.parameters.tokens = script_type.default_tokens();
    }

    let count = check_indices(&script.statements)?;
    debug!(%script_type, count, "script loaded");
    Ok(script)
}

/// Resolves the path a script is written to.
///
/// No path means [`DEFAULT_FILENAME`]; a path not ending in `.zst` gets the
/// suffix appended.
pub fn script_path(path: Option<&Path>) -> PathBuf {
    let Some(path) = path else {
        return PathBuf::from(DEFAULT_FILENAME);
    };
    if path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(SCRIPT_EXTENSION);
    PathBuf::from(name)
}

/// Serializes `script` as pretty-printed JSON.
pub fn to_json(script: &ZestScript) -> Result<String, ScriptError> {
    Ok(serde_json::to_string_pretty(script)?)
}

/// Writes `script` and returns the path actually written.
pub fn save_file(script: &ZestScript, path: Option<&Path>) -> Result<PathBuf, ScriptError> {
    let path = script_path(path);
    std::fs::write(&path, to_json(script)?)?;
    debug!(path = %path.display(), "script saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(extra: Value) -> Value {
        let mut base = json!({
            "title": "my zest",
            "author": "mocha",
            "statements": [
                {"elementType": "ZestComment", "comment": "A comment", "index": 1, "enabled": true}
            ],
            "elementType": "ZestScript"
        });
        if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
            base.extend(extra);
        }
        base
    }

    #[test]
    fn missing_type_is_standalone() {
        let script = load_value(doc(json!({}))).unwrap();
        assert_eq!(script.script_type, ScriptType::Standalone);
        assert_eq!(script.title, "my zest");
        assert!(script.parameters.tokens.is_empty());
    }

    #[test]
    fn unknown_type_fails() {
        let err = load_value(doc(json!({"type": "ive"}))).unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized script type ive");
    }

    #[test]
    fn passive_script_rejects_nested_request() {
        let err = load_value(doc(json!({
            "type": "Passive",
            "statements": [
                {
                    "elementType": "ZestConditional",
                    "index": 1,
                    "ifStatements": [{"elementType": "ZestRequest", "index": 2}]
                }
            ]
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "ZestRequest not allowed in passive scripts");
    }

    #[test]
    fn passive_script_gets_default_tokens() {
        let script = load_value(doc(json!({"type": "Passive"}))).unwrap();
        for token in ["response.body", "response.header", "request.body", "request.url"] {
            assert!(script.parameters.tokens.contains_key(token), "missing {}", token);
        }
    }

    #[test]
    fn given_tokens_are_kept() {
        let script = load_value(doc(json!({
            "type": "Active",
            "parameters": {"tokens": {"foo": "bar"}, "elementType": "ZestVariables"}
        })))
        .unwrap();
        assert_eq!(script.parameters.tokens.len(), 1);
        assert_eq!(script.parameters.tokens["foo"], "bar");
        assert_eq!(script.parameters.token_start, "{{");
    }

    #[test]
    fn null_tokens_get_type_defaults() {
        let script = load_value(doc(json!({
            "type": "Passive",
            "parameters": {"tokens": null, "elementType": "ZestVariables"}
        })))
        .unwrap();
        assert_eq!(script.parameters.tokens, ScriptType::Passive.default_tokens());
        assert_eq!(script.parameters.tokens.len(), 6);
    }

    #[test]
    fn broken_indices_abort_load() {
        let err = load_value(doc(json!({
            "statements": [
                {"elementType": "ZestComment", "index": 1},
                {"elementType": "ZestComment", "index": 3}
            ]
        })))
        .unwrap_err();
        assert!(matches!(err, ScriptError::StructuralInconsistency { expected: 2, found: 3 }));
    }

    #[test]
    fn malformed_json_is_json_error() {
        assert!(matches!(load_str("{not json"), Err(ScriptError::Json(_))));
    }

    #[test]
    fn path_resolution() {
        assert_eq!(script_path(None), PathBuf::from("newzest.zst"));
        assert_eq!(script_path(Some(Path::new("a/b.zst"))), PathBuf::from("a/b.zst"));
        assert_eq!(script_path(Some(Path::new("a/b"))), PathBuf::from("a/b.zst"));
        assert_eq!(script_path(Some(Path::new("b.json"))), PathBuf::from("b.json.zst"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let script = load_value(doc(json!({}))).unwrap();
        let written = save_file(&script, Some(dir.path().join("roundtrip").as_path())).unwrap();
        assert_eq!(written.extension().unwrap(), "zst");
        let reloaded = load_file(&written).unwrap();
        assert_eq!(reloaded, script);
    }
}
