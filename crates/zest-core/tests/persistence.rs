//! Save/load tests: files on disk, script types and token defaults.

mod common;

use serde_json::json;

use common::{add, comment, request, sample_creator, sub};

use zest_core::config::CreatorOptions;
use zest_core::creator::ZestCreator;
use zest_core::error::ScriptError;
use zest_core::script::ScriptType;

fn passive_doc(statements: serde_json::Value) -> String {
    json!({
        "about": "About text",
        "zestVersion": "1.0",
        "title": "passive",
        "type": "Passive",
        "statements": statements,
        "elementType": "ZestScript"
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn test_save_and_open_preserves_tree() {
    let dir = tempfile::tempdir().unwrap();
    let mut zc = sample_creator();
    add(&mut zc, request("http://foo.com"));
    let response = json!({"elementType": "ZestResponse", "url": "http://bar.com"});
    zc.add_statement(&sub(response, 11, "response")).unwrap();
    let assertion = json!({"elementType": "ZestExpressionStatusCode", "code": 200});
    zc.add_statement(&sub(assertion, 11, "assertions")).unwrap();

    let path = zc.save_to_file(Some(dir.path().join("sample").as_path())).unwrap();
    assert_eq!(path, dir.path().join("sample.zst"));

    let reopened = ZestCreator::open(&path).unwrap();
    assert_eq!(reopened.script(), zc.script());
    assert_eq!(reopened.statement_count(), 11);
}

#[test]
fn test_reopened_script_keeps_editing_consistently() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_creator().save_to_file(Some(dir.path().join("s.zst").as_path())).unwrap();

    let mut zc = ZestCreator::open(&path).unwrap();
    assert_eq!(add(&mut zc, comment("c11")), 11);
    assert_eq!(add(&mut zc, sub(comment("body"), 8, "statements")), 10);
    common::assert_contiguous(&zc);
}

#[test]
fn test_saved_json_shape() {
    let mut zc = ZestCreator::new(&CreatorOptions {
        title: "my zest".to_string(),
        author: "mocha".to_string(),
        ..CreatorOptions::default()
    });
    add(&mut zc, request("http://foo.com"));

    let value: serde_json::Value = serde_json::from_str(&zc.to_json().unwrap()).unwrap();
    assert_eq!(value["title"], "my zest");
    assert_eq!(value["author"], "mocha");
    assert_eq!(value["index"], 1);
    let stmt = &value["statements"][0];
    assert_eq!(stmt["elementType"], "ZestRequest");
    assert_eq!(stmt["index"], 1);
    assert_eq!(stmt["enabled"], true);
    assert_eq!(stmt["data"], "unknown");
    assert_eq!(stmt["assertions"], json!([]));
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_script_type_aborts_load() {
    let doc = json!({"type": "ive", "statements": [], "elementType": "ZestScript"}).to_string();
    let err = ZestCreator::load(&doc).unwrap_err();
    assert_eq!(err.to_string(), "Unrecognized script type ive");
    assert!(!err.is_recoverable());
}

#[test]
fn test_passive_script_without_requests_loads() {
    let zc = ZestCreator::load(&passive_doc(json!([
        {"elementType": "ZestComment", "comment": "ok", "index": 1, "enabled": true}
    ])))
    .unwrap();
    assert_eq!(zc.script().script_type, ScriptType::Passive);
    assert_eq!(zc.script().parameters.tokens.len(), 6);
    assert_eq!(zc.statement_count(), 1);
}

#[test]
fn test_passive_script_with_request_is_rejected() {
    let err = ZestCreator::load(&passive_doc(json!([
        {"elementType": "ZestComment", "index": 1},
        {
            "elementType": "ZestLoopInteger",
            "index": 2,
            "statements": [{"elementType": "ZestRequest", "url": "http://foo.com", "index": 3}]
        }
    ])))
    .unwrap_err();
    assert!(matches!(err, ScriptError::NotAllowedInPassiveScript(ref kind) if kind == "ZestRequest"));
}

#[test]
fn test_active_script_gets_request_tokens() {
    let doc = json!({"type": "Active", "statements": [], "elementType": "ZestScript"}).to_string();
    let zc = ZestCreator::load(&doc).unwrap();
    let tokens = &zc.script().parameters.tokens;
    assert_eq!(tokens.len(), 4);
    assert!(tokens.keys().all(|k| k.starts_with("request.")));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ZestCreator::open(&dir.path().join("absent.zst")).unwrap_err();
    assert!(matches!(err, ScriptError::Io(_)));
}

#[test]
fn test_duplicate_indices_abort_load() {
    let doc = json!({
        "statements": [
            {"elementType": "ZestComment", "index": 1},
            {"elementType": "ZestComment", "index": 1}
        ],
        "elementType": "ZestScript"
    })
    .to_string();
    assert!(matches!(
        ZestCreator::load(&doc),
        Err(ScriptError::StructuralInconsistency { expected: 2, found: 1 })
    ));
}
