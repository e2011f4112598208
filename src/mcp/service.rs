//! MCP service implementation using rmcp.
//!
//! This module defines the SqlService struct exposing the single `execute`
//! tool via the MCP protocol using the rmcp framework's macros.

use crate::db::QueryExecutor;
use crate::models::ResponseEnvelope;
use crate::tools::execute::{ExecuteInput, ExecuteToolHandler};
use rmcp::Json;
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct SqlService {
    /// Shared executor; it holds no per-call state
    executor: Arc<QueryExecutor>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl SqlService {
    /// Create a new SqlService instance.
    ///
    /// # Arguments
    ///
    /// * `executor` - Shared query executor used by every tool call
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self {
            executor,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl SqlService {
    #[tool(
        description = "Execute a SQL statement against a MySQL database.\nReturns {\"results\": [rows]} for statements that produce rows, {\"results\": {\"rowcount\", \"message\"}} for statements that do not, or {\"error\": message} on failure.\nOmit `database` to run at server scope, e.g. `SHOW DATABASES`.\nEach call runs in its own transaction and is committed on success."
    )]
    async fn execute(&self, Parameters(input): Parameters<ExecuteInput>) -> Json<ResponseEnvelope> {
        let handler = ExecuteToolHandler::new(self.executor.clone());
        Json(handler.execute(input).await)
    }
}

#[tool_handler]
impl ServerHandler for SqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "sql-mcp-server".to_owned(),
                title: Some("SQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Run SQL statements against a MySQL server with the `execute` tool.\n\
                \n\
                - Pass `database` to run against a specific database; omit it for server-level\n\
                  statements such as `SHOW DATABASES`.\n\
                - The statement is sent as-is. Errors from the server are returned in the\n\
                  `error` field and nothing is committed.\n\
                - Each call is independent: there are no sessions, so `USE` or temporary\n\
                  tables do not carry over to the next call."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteProvisioner;
    use serde_json::json;

    fn create_test_service(dir: &tempfile::TempDir) -> SqlService {
        let executor = QueryExecutor::new(Arc::new(SqliteProvisioner::new(dir.path())));
        SqlService::new(Arc::new(executor))
    }

    #[test]
    fn test_server_info() {
        let dir = tempfile::tempdir().unwrap();
        let service = create_test_service(&dir);
        let info = service.get_info();
        assert_eq!(info.server_info.name, "sql-mcp-server");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_single_tool_registered() {
        let dir = tempfile::tempdir().unwrap();
        let service = create_test_service(&dir);
        let tools = service.tool_router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "execute");
        assert!(tools[0].output_schema.is_some());
    }

    #[tokio::test]
    async fn test_execute_tool_success_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = create_test_service(&dir);

        let Json(envelope) = service
            .execute(Parameters(ExecuteInput {
                database: Some("shop".to_string()),
                query: "CREATE TABLE items (id INTEGER PRIMARY KEY)".to_string(),
            }))
            .await;
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "results": { "rowcount": 0, "message": "Query executed successfully" } })
        );

        let Json(envelope) = service
            .execute(Parameters(ExecuteInput {
                database: Some("shop".to_string()),
                query: "SELECT * FROM nosuchtable".to_string(),
            }))
            .await;
        assert!(envelope.results().is_none());
        assert!(envelope.error().unwrap().contains("nosuchtable"));
    }
}
