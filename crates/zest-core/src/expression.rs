//! Expressions evaluated by conditionals and assertions.
//!
//! An expression is never indexed on its own: it lives in the
//! `rootExpression` field of a [`Conditional`](crate::statement::Conditional)
//! or an [`Assertion`](crate::statement::Assertion).

use serde::{Deserialize, Serialize};

/// A root expression, tagged by `elementType` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "elementType")]
pub enum Expression {
    #[serde(rename = "ZestExpressionStatusCode")]
    StatusCode(StatusCode),
    #[serde(rename = "ZestExpressionLength")]
    Length(Length),
    #[serde(rename = "ZestExpressionRegex")]
    Regex(RegexMatch),
    #[serde(rename = "ZestExpressionURL")]
    Url(UrlMatch),
    #[serde(rename = "ZestExpressionEquals")]
    Equals(Equals),
    #[serde(rename = "ZestExpressionResponseTime")]
    ResponseTime(ResponseTime),
}

impl Expression {
    /// Every `elementType` tag that maps to an expression.
    pub const ELEMENT_TYPES: &'static [&'static str] = &[
        "ZestExpressionStatusCode",
        "ZestExpressionLength",
        "ZestExpressionRegex",
        "ZestExpressionURL",
        "ZestExpressionEquals",
        "ZestExpressionResponseTime",
    ];

    /// Returns true if `tag` names an expression kind.
    pub fn is_expression_type(tag: &str) -> bool {
        Self::ELEMENT_TYPES.contains(&tag)
    }

    pub fn element_type(&self) -> &'static str {
        match self {
            Expression::StatusCode(_) => "ZestExpressionStatusCode",
            Expression::Length(_) => "ZestExpressionLength",
            Expression::Regex(_) => "ZestExpressionRegex",
            Expression::Url(_) => "ZestExpressionURL",
            Expression::Equals(_) => "ZestExpressionEquals",
            Expression::ResponseTime(_) => "ZestExpressionResponseTime",
        }
    }

    /// Whether the expression's result is inverted.
    pub fn is_negated(&self) -> bool {
        match self {
            Expression::StatusCode(e) => e.not,
            Expression::Length(e) => e.not,
            Expression::Regex(e) => e.not,
            Expression::Url(e) => e.not,
            Expression::Equals(e) => e.not,
            Expression::ResponseTime(e) => e.not,
        }
    }
}

/// Matches the response status code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusCode {
    pub code: u16,
    pub not: bool,
}

/// Compares the length of a variable against `length`, within `approx` percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Length {
    pub length: u64,
    pub approx: u32,
    pub variable_name: String,
    pub not: bool,
}

impl Default for Length {
    fn default() -> Self {
        Self {
            length: 0,
            approx: 1,
            variable_name: String::new(),
            not: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegexMatch {
    pub regex: String,
    pub variable_name: String,
    pub case_exact: bool,
    pub not: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UrlMatch {
    pub include_regexes: Vec<String>,
    pub exclude_regexes: Vec<String>,
    pub not: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Equals {
    pub value: String,
    pub variable_name: String,
    pub case_exact: bool,
    pub not: bool,
}

/// True when the response time is greater (or not greater) than `time_in_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseTime {
    pub greater_than: bool,
    pub time_in_ms: u64,
    pub not: bool,
}

impl Default for ResponseTime {
    fn default() -> Self {
        Self {
            greater_than: true,
            time_in_ms: 0,
            not: false,
        }
    }
}
