//! Statement construction from loosely shaped descriptors.
//!
//! A descriptor is a JSON object carrying an `elementType` tag plus whatever
//! fields the caller has. [`create_statement`] keeps only the fields that the
//! tagged kind knows about and fills every missing one with the kind's
//! default. Placement hints (`parentIndex`, `subStatementOf`, `after`) are
//! ignored here; the [`ZestCreator`](crate::creator::ZestCreator) reads them.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use zest_core::factory::{create_statement, Element};
//!
//! let element = create_statement(&json!({
//!     "elementType": "ZestAssignRandomInteger",
//!     "variableName": "n"
//! })).unwrap();
//!
//! let Element::Statement(stmt) = element else { panic!("not a statement") };
//! assert_eq!(stmt.element_type(), "ZestAssignRandomInteger");
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::ScriptError;
use crate::expression::Expression;
use crate::statement::{Assertion, Conditional, Response, Role, Statement, StatementKind};

/// Descriptor key naming the role-list a sub-statement goes into.
pub const ROLE_KEY: &str = "subStatementOf";

/// Anything the factory can build.
///
/// Only [`Element::Statement`] takes part in the index space; responses and
/// assertions are attached to a request as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Statement(Statement),
    Response(Response),
    Assertion(Assertion),
}

impl Element {
    pub fn element_type(&self) -> &'static str {
        match self {
            Element::Statement(stmt) => stmt.element_type(),
            Element::Response(_) => "ZestResponse",
            Element::Assertion(_) => "ZestAssertion",
        }
    }
}

/// Builds a typed element from `descriptor`.
///
/// Expression descriptors are wrapped: into an assertion when the descriptor
/// targets the `assertions` role, otherwise into a conditional whose root
/// expression they become. Conditionals and loops are always built with empty
/// role-lists.
pub fn create_statement(descriptor: &Value) -> Result<Element, ScriptError> {
    let tag = descriptor
        .get("elementType")
        .and_then(Value::as_str)
        .ok_or(ScriptError::MissingElementType)?;

    if Expression::is_expression_type(tag) {
        let expression: Expression = parse(tag, descriptor)?;
        return Ok(if target_role(descriptor) == Some(Role::Assertions) {
            Element::Assertion(Assertion {
                root_expression: Some(expression),
            })
        } else {
            Element::Statement(Statement::new(StatementKind::Conditional(Conditional {
                root_expression: Some(expression),
                ..Conditional::default()
            })))
        });
    }

    match tag {
        "ZestResponse" => Ok(Element::Response(parse(tag, descriptor)?)),
        "ZestAssertion" => Ok(Element::Assertion(parse(tag, descriptor)?)),
        t if StatementKind::ELEMENT_TYPES.contains(&t) => {
            let stmt = Statement::new(parse(tag, descriptor)?);
            if stmt.role_lists().iter().any(|(_, list)| !list.is_empty()) {
                return Err(ScriptError::InvalidDescriptor {
                    element_type: tag.to_string(),
                    reason: "nested statements must be added one at a time".to_string(),
                });
            }
            Ok(Element::Statement(stmt))
        }
        other => Err(ScriptError::UnrecognizedStatementType(other.to_string())),
    }
}

/// The role named by the descriptor's `subStatementOf` field, if valid.
pub fn target_role(descriptor: &Value) -> Option<Role> {
    descriptor
        .get(ROLE_KEY)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn parse<'a, T: Deserialize<'a>>(tag: &str, descriptor: &'a Value) -> Result<T, ScriptError> {
    T::deserialize(descriptor).map_err(|e| ScriptError::InvalidDescriptor {
        element_type: tag.to_string(),
        reason: e.to_string(),
    })
}
