//! Statement execution tool.
//!
//! This module implements the `execute` MCP tool. The statement is passed to the
//! database verbatim; whether it reads or writes is decided by the engine.

use crate::db::QueryExecutor;
use crate::models::ResponseEnvelope;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Input for the execute tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteInput {
    /// Database to run the statement against. Omit or pass null to run at server scope (e.g. SHOW DATABASES).
    #[serde(default)]
    pub database: Option<String>,
    /// SQL statement to execute. Any statement the server accepts: SELECT, INSERT, UPDATE, DELETE, DDL, SHOW, ...
    pub query: String,
}

pub struct ExecuteToolHandler {
    executor: Arc<QueryExecutor>,
}

impl ExecuteToolHandler {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Run the statement; failures are reported inside the envelope.
    pub async fn execute(&self, input: ExecuteInput) -> ResponseEnvelope {
        self.executor
            .execute(input.database.as_deref(), &input.query)
            .await
    }
}
