//! Statement types for Zest scripts.
//!
//! A [`Statement`] is one node of the script tree: a set of common fields
//! (`index`, `enabled`) plus a [`StatementKind`] carrying the kind-specific
//! fields. Kinds are serialized with an `elementType` tag so that the JSON
//! layout matches the Zest file format.
//!
//! # Role-lists
//!
//! Some kinds own nested collections, each identified by a [`Role`]:
//!
//! | Kind | Role | Indexed |
//! |---|---|---|
//! | Request | `response` (single slot) | no |
//! | Request | `assertions` | no |
//! | Conditional | `ifStatements`, `elseStatements` | yes |
//! | Loop | `statements` | yes |
//!
//! Indexed role-lists hold full [`Statement`]s that take part in the global
//! index space. A request's response and assertions are plain records that
//! carry no index.
//!
//! Every field with a documented default comes from the kind's [`Default`]
//! impl; the same impl is used by serde for fields missing from the JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::expression::Expression;

/// Sentinel stored in string fields whose value was never supplied.
pub const UNKNOWN: &str = "unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn enabled_by_default() -> bool {
    true
}

/// A named nested collection owned by a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single response slot of a request.
    #[serde(rename = "response")]
    Response,
    /// The assertion list of a request.
    #[serde(rename = "assertions")]
    Assertions,
    #[serde(rename = "ifStatements")]
    IfStatements,
    #[serde(rename = "elseStatements")]
    ElseStatements,
    /// The body of a loop.
    #[serde(rename = "statements")]
    LoopBody,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Response => "response",
            Role::Assertions => "assertions",
            Role::IfStatements => "ifStatements",
            Role::ElseStatements => "elseStatements",
            Role::LoopBody => "statements",
        }
    }

    /// Whether members of this role-list take part in the global index space.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Role::IfStatements | Role::ElseStatements | Role::LoopBody)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "response" => Ok(Role::Response),
            "assertions" => Ok(Role::Assertions),
            "ifStatements" => Ok(Role::IfStatements),
            "elseStatements" => Ok(Role::ElseStatements),
            "statements" => Ok(Role::LoopBody),
            other => Err(ScriptError::UnknownRole(other.to_string())),
        }
    }
}

/// A node of the script tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Kind-specific fields, including the `elementType` tag.
    #[serde(flatten)]
    pub kind: StatementKind,

    /// Global pre-order position, starting at 1.
    #[serde(default)]
    pub index: usize,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Statement {
    /// Wraps a kind into an enabled statement that has not been placed yet.
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            index: 0,
            enabled: true,
        }
    }

    pub fn element_type(&self) -> &'static str {
        self.kind.element_type()
    }

    /// True for kinds that own indexed role-lists (conditionals and loops).
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Conditional(_)
                | StatementKind::LoopString(_)
                | StatementKind::LoopInteger(_)
        )
    }

    /// Whether this statement owns a role-list of the given kind.
    pub fn accepts(&self, role: Role) -> bool {
        match role {
            Role::Response | Role::Assertions => matches!(self.kind, StatementKind::Request(_)),
            Role::IfStatements | Role::ElseStatements => {
                matches!(self.kind, StatementKind::Conditional(_))
            }
            Role::LoopBody => matches!(
                self.kind,
                StatementKind::LoopString(_) | StatementKind::LoopInteger(_)
            ),
        }
    }

    /// The indexed role-lists of this statement, in traversal order.
    pub fn role_lists(&self) -> Vec<(Role, &Vec<Statement>)> {
        match &self.kind {
            StatementKind::Conditional(c) => vec![
                (Role::IfStatements, &c.if_statements),
                (Role::ElseStatements, &c.else_statements),
            ],
            StatementKind::LoopString(l) => vec![(Role::LoopBody, &l.statements)],
            StatementKind::LoopInteger(l) => vec![(Role::LoopBody, &l.statements)],
            _ => Vec::new(),
        }
    }

    /// Mutable twin of [`Statement::role_lists`].
    pub fn role_lists_mut(&mut self) -> Vec<(Role, &mut Vec<Statement>)> {
        match &mut self.kind {
            StatementKind::Conditional(c) => vec![
                (Role::IfStatements, &mut c.if_statements),
                (Role::ElseStatements, &mut c.else_statements),
            ],
            StatementKind::LoopString(l) => vec![(Role::LoopBody, &mut l.statements)],
            StatementKind::LoopInteger(l) => vec![(Role::LoopBody, &mut l.statements)],
            _ => Vec::new(),
        }
    }

    /// The indexed role-list for `role`, if this statement owns one.
    pub fn role_list(&self, role: Role) -> Option<&Vec<Statement>> {
        self.role_lists()
            .into_iter()
            .find(|(r, _)| *r == role)
            .map(|(_, list)| list)
    }

    pub fn role_list_mut(&mut self, role: Role) -> Option<&mut Vec<Statement>> {
        self.role_lists_mut()
            .into_iter()
            .find(|(r, _)| *r == role)
            .map(|(_, list)| list)
    }

    pub fn as_request(&self) -> Option<&Request> {
        match &self.kind {
            StatementKind::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_request_mut(&mut self) -> Option<&mut Request> {
        match &mut self.kind {
            StatementKind::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_conditional(&self) -> Option<&Conditional> {
        match &self.kind {
            StatementKind::Conditional(c) => Some(c),
            _ => None,
        }
    }
}

/// Kind-specific statement payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "elementType")]
pub enum StatementKind {
    #[serde(rename = "ZestComment")]
    Comment(Comment),
    #[serde(rename = "ZestRequest")]
    Request(Request),
    #[serde(rename = "ZestConditional")]
    Conditional(Conditional),
    #[serde(rename = "ZestActionPrint")]
    ActionPrint(ActionPrint),
    #[serde(rename = "ZestActionFail")]
    ActionFail(ActionFail),
    #[serde(rename = "ZestActionSleep")]
    ActionSleep(ActionSleep),
    #[serde(rename = "ZestAssignString")]
    AssignString(AssignString),
    #[serde(rename = "ZestAssignRandomInteger")]
    AssignRandomInteger(AssignRandomInteger),
    #[serde(rename = "ZestAssignReplace")]
    AssignReplace(AssignReplace),
    #[serde(rename = "ZestAssignStringDelimiters")]
    AssignStringDelimiters(AssignDelimiters),
    #[serde(rename = "ZestAssignRegexDelimiters")]
    AssignRegexDelimiters(AssignDelimiters),
    #[serde(rename = "ZestLoopString")]
    LoopString(LoopString),
    #[serde(rename = "ZestLoopInteger")]
    LoopInteger(LoopInteger),
}

impl StatementKind {
    /// Every `elementType` tag that maps to an indexed statement.
    pub const ELEMENT_TYPES: &'static [&'static str] = &[
        "ZestComment",
        "ZestRequest",
        "ZestConditional",
        "ZestActionPrint",
        "ZestActionFail",
        "ZestActionSleep",
        "ZestAssignString",
        "ZestAssignRandomInteger",
        "ZestAssignReplace",
        "ZestAssignStringDelimiters",
        "ZestAssignRegexDelimiters",
        "ZestLoopString",
        "ZestLoopInteger",
    ];

    pub fn element_type(&self) -> &'static str {
        match self {
            StatementKind::Comment(_) => "ZestComment",
            StatementKind::Request(_) => "ZestRequest",
            StatementKind::Conditional(_) => "ZestConditional",
            StatementKind::ActionPrint(_) => "ZestActionPrint",
            StatementKind::ActionFail(_) => "ZestActionFail",
            StatementKind::ActionSleep(_) => "ZestActionSleep",
            StatementKind::AssignString(_) => "ZestAssignString",
            StatementKind::AssignRandomInteger(_) => "ZestAssignRandomInteger",
            StatementKind::AssignReplace(_) => "ZestAssignReplace",
            StatementKind::AssignStringDelimiters(_) => "ZestAssignStringDelimiters",
            StatementKind::AssignRegexDelimiters(_) => "ZestAssignRegexDelimiters",
            StatementKind::LoopString(_) => "ZestLoopString",
            StatementKind::LoopInteger(_) => "ZestLoopInteger",
        }
    }

    /// Whether executing this kind sends an outbound request.
    pub fn issues_requests(&self) -> bool {
        matches!(self, StatementKind::Request(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    pub comment: String,
}

impl Default for Comment {
    fn default() -> Self {
        Self {
            comment: "None".to_string(),
        }
    }
}

/// An HTTP request, with its optional recorded response and assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    pub url: String,
    pub data: String,
    pub method: String,
    pub headers: String,
    #[serde(with = "response_slot")]
    pub response: Option<Response>,
    pub assertions: Vec<Assertion>,
    pub follow_redirect: bool,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            url: unknown(),
            data: unknown(),
            method: unknown(),
            headers: unknown(),
            response: None,
            assertions: Vec::new(),
            follow_redirect: false,
        }
    }
}

/// The recorded response of a request. Not indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", tag = "elementType", rename = "ZestResponse")]
pub struct Response {
    pub url: String,
    pub headers: String,
    pub body: String,
    #[serde(with = "sentinel")]
    pub status_code: Option<u16>,
    #[serde(with = "sentinel")]
    pub response_time_in_ms: Option<u64>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            url: unknown(),
            headers: unknown(),
            body: unknown(),
            status_code: None,
            response_time_in_ms: None,
        }
    }
}

/// An assertion attached to a request. Not indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "elementType", rename = "ZestAssertion")]
pub struct Assertion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_expression: Option<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conditional {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_expression: Option<Expression>,
    pub if_statements: Vec<Statement>,
    pub else_statements: Vec<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionPrint {
    pub message: String,
}

/// Severity reported by a failing script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Info,
    Low,
    Medium,
    #[default]
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionFail {
    pub message: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionSleep {
    pub milliseconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignString {
    pub string: String,
    pub variable_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignRandomInteger {
    pub min_int: i64,
    pub max_int: i64,
    pub variable_name: String,
}

impl Default for AssignRandomInteger {
    fn default() -> Self {
        Self {
            min_int: 0,
            max_int: 10000,
            variable_name: String::new(),
        }
    }
}

/// Replaces `replace` with `replacement` in a variable's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignReplace {
    pub variable_name: String,
    pub replace: String,
    pub replacement: String,
    pub regex: bool,
    pub case_exact: bool,
}

/// Assigns the text between `prefix` and `postfix`, taken from the
/// response head or body. Shared by the string and regex delimiter kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignDelimiters {
    pub variable_name: String,
    pub prefix: String,
    pub postfix: String,
    pub location: String,
}

impl Default for AssignDelimiters {
    fn default() -> Self {
        Self {
            variable_name: String::new(),
            prefix: String::new(),
            postfix: String::new(),
            location: "BODY".to_string(),
        }
    }
}

/// Runs its body once per value, binding it to `variable_name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopString {
    pub variable_name: String,
    pub values: Vec<String>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopInteger {
    pub variable_name: String,
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub statements: Vec<Statement>,
}

impl Default for LoopInteger {
    fn default() -> Self {
        Self {
            variable_name: String::new(),
            start: 0,
            end: 10,
            step: 1,
            statements: Vec::new(),
        }
    }
}

/// Numeric fields that are written as `"unknown"` until a value is known.
mod sentinel {
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::Serializer;
    use serde::Serialize;

    use super::UNKNOWN;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Value(T),
        Text(String),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(UNKNOWN),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Repr::<T>::deserialize(deserializer)? {
            Repr::Value(v) => Ok(Some(v)),
            Repr::Text(s) if s == UNKNOWN => Ok(None),
            Repr::Text(s) => Err(de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a number or \"unknown\"",
            )),
        }
    }
}

/// The response slot is written as `{}` while empty.
mod response_slot {
    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::{SerializeMap, Serializer};
    use serde::Serialize;
    use serde_json::Value;

    use super::Response;

    pub fn serialize<S>(value: &Option<Response>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(response) => response.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Response>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            other => Response::deserialize(other).map(Some).map_err(de::Error::custom),
        }
    }
}
