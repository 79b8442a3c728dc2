//! # zest-core
//!
//! Core library for building and editing Zest scripts.
//!
//! A Zest script is a JSON document describing a small security-test
//! program: HTTP requests, assertions on their responses, conditionals,
//! loops, variable assignments and actions. This crate keeps such a
//! document in memory as a tree of typed statements and maintains the
//! structural index every statement carries.
//!
//! ## Modules
//!
//! - [`creator`] - The [`ZestCreator`](creator::ZestCreator) facade: add, delete, move, query
//! - [`factory`] - Builds typed statements from JSON descriptors
//! - [`navigator`] - Tree queries: lookup by index, parents, pre-order walks
//! - [`allocator`] - Index allocation and renumbering
//! - [`statement`] / [`expression`] - The statement and expression data model
//! - [`script`] - The root document and its metadata
//! - [`loader`] - Reading and writing `.zst` files
//! - [`config`] - Creator options and `~/.zest/config.json`
//! - [`error`] - The shared [`ScriptError`](error::ScriptError) type
//!
//! ## Indices
//!
//! Every statement reachable through `ifStatements`, `elseStatements` or a
//! loop's `statements` carries an `index`. Walking the tree in pre-order
//! always yields exactly `1, 2, ..., N`. Responses and assertions hang off
//! requests and are not indexed.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use zest_core::config::CreatorOptions;
//! use zest_core::creator::ZestCreator;
//!
//! let mut zc = ZestCreator::new(&CreatorOptions::default());
//! zc.add_statement(&json!({"elementType": "ZestRequest", "url": "http://foo.com"})).unwrap();
//! zc.add_statement(&json!({
//!     "elementType": "ZestExpressionStatusCode",
//!     "code": 200,
//!     "parentIndex": 1,
//!     "subStatementOf": "assertions"
//! })).unwrap();
//!
//! assert_eq!(zc.statement_count(), 1);
//! let json = zc.to_json().unwrap();
//! assert!(json.contains("ZestAssertion"));
//! ```

pub mod allocator;
pub mod config;
pub mod creator;
pub mod error;
pub mod expression;
pub mod factory;
pub mod loader;
pub mod navigator;
pub mod script;
pub mod statement;
