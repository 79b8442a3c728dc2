//! Error type shared by every part of the script engine.
//!
//! Query and mutation failures are returned to the immediate caller as
//! [`ScriptError`] values. Load-time failures abort construction of a
//! [`ZestCreator`](crate::creator::ZestCreator) entirely, so a caller never
//! observes a partially loaded document.

use thiserror::Error;

use crate::statement::Role;

/// Errors produced while building, editing, loading or saving a script.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The descriptor's `elementType` does not name a statement kind.
    ///
    /// Non-fatal: the caller is warned and the tree is left untouched.
    #[error("Unrecognized statement type: {0}")]
    UnrecognizedStatementType(String),

    /// The descriptor has no `elementType` field at all.
    #[error("Descriptor has no elementType")]
    MissingElementType,

    /// The descriptor names a known kind but one of its fields is malformed.
    #[error("Invalid {element_type} descriptor: {reason}")]
    InvalidDescriptor {
        element_type: String,
        reason: String,
    },

    /// No statement carries the requested index.
    #[error("No statement with index {0}")]
    NotFound(usize),

    /// The parent statement does not own a role-list of the requested kind,
    /// or the element cannot live in that role-list.
    #[error("Statement {parent} does not accept children in role '{role}'")]
    RoleNotSupported { parent: usize, role: Role },

    /// A role-list has no member at the requested position.
    #[error("Statement {parent} has no member {position} in role '{role}'")]
    NoSuchMember {
        parent: usize,
        role: Role,
        position: usize,
    },

    /// A role name that is not one of the known role-lists.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A move whose destination lies inside the subtree being moved.
    #[error("Cannot move statement {from} to {to}: destination is inside the moved subtree")]
    InvalidMove { from: usize, to: usize },

    /// The document declares a script `type` that is not supported.
    #[error("Unrecognized script type {0}")]
    UnrecognizedScriptType(String),

    /// A passive script contains a statement that issues outbound requests.
    #[error("{0} not allowed in passive scripts")]
    NotAllowedInPassiveScript(String),

    /// The pre-order index sequence is not exactly `1..=N`.
    #[error("Index sequence broken: expected {expected}, found {found}")]
    StructuralInconsistency { expected: usize, found: usize },

    /// An I/O error occurred while reading or writing a script file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document or descriptor is not valid JSON for its shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScriptError {
    /// Returns true for failures that leave a usable document behind.
    ///
    /// Load and I/O failures are fatal; everything raised by a single
    /// add/delete/move call is recoverable because validation precedes mutation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ScriptError::UnrecognizedScriptType(_)
                | ScriptError::NotAllowedInPassiveScript(_)
                | ScriptError::StructuralInconsistency { .. }
                | ScriptError::Io(_)
                | ScriptError::Json(_)
        )
    }
}
