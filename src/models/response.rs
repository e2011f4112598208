//! Response shapes returned by the `execute` tool.

use crate::error::QueryError;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Message reported for statements that do not produce rows.
pub const SUCCESS_MESSAGE: &str = "Query executed successfully";

/// One result row: column name to value, in the statement's column order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Summary for statements that modify data or schema without returning rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct MutationSummary {
    /// Number of rows affected, as reported by the database
    pub rowcount: u64,
    /// Always "Query executed successfully"
    pub message: String,
}

impl MutationSummary {
    pub fn new(rowcount: u64) -> Self {
        Self {
            rowcount,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Normalized outcome of a successfully executed statement.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// Rows produced by the statement (possibly empty)
    Rows(Vec<Row>),
    /// Affected-row count for statements without output columns
    Mutation(MutationSummary),
}

impl QueryOutcome {
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Mutation(_) => None,
        }
    }

    pub fn mutation(&self) -> Option<&MutationSummary> {
        match self {
            Self::Rows(_) => None,
            Self::Mutation(summary) => Some(summary),
        }
    }
}

/// Structured response for every `execute` call.
///
/// Exactly one of `results` or `error` is set. The fields are private so the
/// only way to build an envelope is through [`ResponseEnvelope::success`] or
/// [`ResponseEnvelope::failure`].
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ResponseEnvelope {
    /// Query results: a list of row objects, or {rowcount, message} for statements without rows
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<QueryOutcome>,
    /// Error message reported by the database driver
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(outcome: QueryOutcome) -> Self {
        Self {
            results: Some(outcome),
            error: None,
        }
    }

    pub fn failure(err: &QueryError) -> Self {
        Self {
            results: None,
            error: Some(err.to_string()),
        }
    }

    pub fn results(&self) -> Option<&QueryOutcome> {
        self.results.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.results.is_some()
    }
}
