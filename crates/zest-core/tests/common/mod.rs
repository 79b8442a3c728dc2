//! Shared test helpers for zest-core integration tests.
//!
//! Descriptor builders keep the scenario tests readable, and
//! [`assert_contiguous`] checks the index invariant after every mutation.

#![allow(dead_code)]

use serde_json::{json, Value};

use zest_core::config::CreatorOptions;
use zest_core::creator::{Added, ZestCreator};
use zest_core::navigator::preorder;
use zest_core::statement::{Statement, StatementKind};

// ---------------------------------------------------------------------------
// Creators
// ---------------------------------------------------------------------------

pub fn empty_creator() -> ZestCreator {
    ZestCreator::new(&CreatorOptions::default())
}

/// Adds `descriptor` and returns the index it landed on.
///
/// Panics if the statement was attached rather than indexed.
pub fn add(zc: &mut ZestCreator, descriptor: Value) -> usize {
    match zc.add_statement(&descriptor).unwrap() {
        Added::Indexed(index) => index,
        other => panic!("expected an indexed statement, got {:?}", other),
    }
}

/// Builds the tree used by the move and invariant tests:
///
/// ```text
/// 1 comment "c1"
/// 2 comment "c2"
/// 3 conditional
///   if:   4 print "p1", 5 print "p2"
///   else: 6 fail "f1"
/// 7 comment "c7"
/// 8 loop (integer)
///   body: 9 sleep
/// 10 comment "c10"
/// ```
pub fn sample_creator() -> ZestCreator {
    let mut zc = empty_creator();
    add(&mut zc, comment("c1"));
    add(&mut zc, comment("c2"));
    add(&mut zc, conditional());
    add(&mut zc, sub(print("p1"), 3, "ifStatements"));
    add(&mut zc, sub(print("p2"), 3, "ifStatements"));
    add(&mut zc, sub(fail("f1"), 3, "elseStatements"));
    add(&mut zc, comment("c7"));
    add(&mut zc, json!({"elementType": "ZestLoopInteger", "variableName": "i", "end": 3}));
    add(&mut zc, sub(json!({"elementType": "ZestActionSleep", "milliseconds": 5}), 8, "statements"));
    add(&mut zc, comment("c10"));
    assert_contiguous(&zc);
    zc
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

pub fn comment(text: &str) -> Value {
    json!({"elementType": "ZestComment", "comment": text})
}

pub fn print(message: &str) -> Value {
    json!({"elementType": "ZestActionPrint", "message": message})
}

pub fn fail(message: &str) -> Value {
    json!({"elementType": "ZestActionFail", "message": message})
}

pub fn conditional() -> Value {
    json!({
        "elementType": "ZestConditional",
        "rootExpression": {"elementType": "ZestExpressionStatusCode", "code": 200}
    })
}

pub fn request(url: &str) -> Value {
    json!({"elementType": "ZestRequest", "url": url, "method": "GET"})
}

/// Adds `parentIndex` and `subStatementOf` to a descriptor.
pub fn sub(mut descriptor: Value, parent_index: usize, role: &str) -> Value {
    descriptor["parentIndex"] = json!(parent_index);
    descriptor["subStatementOf"] = json!(role);
    descriptor
}

pub fn after(mut descriptor: Value, after: usize) -> Value {
    descriptor["after"] = json!(after);
    descriptor
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Asserts pre-order indices are exactly `1..=statement_count()`.
pub fn assert_contiguous(zc: &ZestCreator) {
    let indices: Vec<usize> = preorder(zc.statements()).map(|s| s.index).collect();
    let expected: Vec<usize> = (1..=zc.statement_count()).collect();
    assert_eq!(indices, expected, "index sequence broken");
    zc.verify().unwrap();
}

/// A short label for each statement in pre-order, e.g. `"comment:c1"`.
pub fn labels(zc: &ZestCreator) -> Vec<String> {
    preorder(zc.statements()).map(label).collect()
}

pub fn label(stmt: &Statement) -> String {
    match &stmt.kind {
        StatementKind::Comment(c) => format!("comment:{}", c.comment),
        StatementKind::ActionPrint(p) => format!("print:{}", p.message),
        StatementKind::ActionFail(f) => format!("fail:{}", f.message),
        other => other.element_type().to_string(),
    }
}
