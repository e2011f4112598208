//! Query execution engine.
//!
//! One call runs the full lifecycle: provision a pool for the target database,
//! acquire a connection, begin a transaction, run the statement verbatim, decide
//! the result shape, commit, and close the pool. Nothing escapes as an error;
//! every failure becomes the `error` side of a [`ResponseEnvelope`].
//!
//! # Result shape
//!
//! Whether a statement produces rows is decided from what the engine reports, never
//! from the SQL text. Returned rows make it a row-set. When no rows come back, the
//! statement is prepared again to read its output columns: a statement with output
//! columns is an empty row-set, one without is a mutation summary.
//!
//! The query text must hold one statement. Both drivers accept several statements
//! separated by `;`, so a second result in the stream fails the call and rolls back
//! whatever ran before it.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL execution
//! - `sqlite`: SQLite execution
//!
//! Both provide identical functionality adapted to the driver's types.

use crate::db::pool::{DbPool, PoolGuard, PoolProvisioner};
use crate::db::types::RowToJson;
use crate::error::{QueryError, QueryResult};
use crate::models::{MutationSummary, QueryOutcome, ResponseEnvelope};
use futures_util::TryStreamExt;
use sqlx::{Connection, Either, Executor, Statement};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executes single statements against per-call pools.
#[derive(Clone)]
pub struct QueryExecutor {
    provisioner: Arc<dyn PoolProvisioner>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor").finish_non_exhaustive()
    }
}

impl QueryExecutor {
    /// Create a new query executor backed by the given provisioner.
    pub fn new(provisioner: Arc<dyn PoolProvisioner>) -> Self {
        Self { provisioner }
    }

    /// Execute `sql` against `database` and return the response envelope.
    ///
    /// An empty database name is treated as `None` (server scope).
    pub async fn execute(&self, database: Option<&str>, sql: &str) -> ResponseEnvelope {
        let database = database.filter(|db| !db.is_empty());
        let start = Instant::now();

        debug!(database = ?database, sql = %sql, "Executing statement");

        match self.try_execute(database, sql).await {
            Ok(outcome) => {
                let execution_time_ms = start.elapsed().as_millis() as u64;
                match &outcome {
                    QueryOutcome::Rows(rows) => info!(
                        database = ?database,
                        rows = rows.len(),
                        execution_time_ms = execution_time_ms,
                        "Query returned rows"
                    ),
                    QueryOutcome::Mutation(summary) => info!(
                        database = ?database,
                        rows_affected = summary.rowcount,
                        execution_time_ms = execution_time_ms,
                        "Statement executed"
                    ),
                }
                ResponseEnvelope::success(outcome)
            }
            Err(err) => {
                warn!(
                    database = ?database,
                    stage = err.stage(),
                    error = %err,
                    "Statement failed"
                );
                ResponseEnvelope::failure(&err)
            }
        }
    }

    /// Same as [`QueryExecutor::execute`], keeping the typed error.
    ///
    /// The pool is closed before this returns, whatever the outcome.
    pub async fn try_execute(&self, database: Option<&str>, sql: &str) -> QueryResult<QueryOutcome> {
        // A failed provision leaves nothing to dispose
        let pool = self.provisioner.provision(database)?;
        let guard = PoolGuard::new(pool, database);

        let result = run_statement(guard.pool(), sql).await;

        guard.dispose().await;
        result
    }
}

async fn run_statement(pool: &DbPool, sql: &str) -> QueryResult<QueryOutcome> {
    match pool {
        DbPool::MySql(p) => mysql::run(p, sql).await,
        DbPool::SQLite(p) => sqlite::run(p, sql).await,
    }
}

// =============================================================================
// Common Helper Functions
// =============================================================================

/// Output of a single statement, collected from the driver's result stream.
///
/// The driver reports rows followed by one completion per statement. Anything
/// after the first completion belongs to a further statement and is rejected.
#[derive(Debug)]
struct StatementOutput<R> {
    rows: Vec<R>,
    rows_affected: u64,
    completed: bool,
}

impl<R> StatementOutput<R> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            rows_affected: 0,
            completed: false,
        }
    }

    /// Record one stream item: `Left` is a completion with its affected-row count.
    fn record(&mut self, step: Either<u64, R>) -> QueryResult<()> {
        if self.completed {
            return Err(QueryError::multiple_statements());
        }
        match step {
            Either::Left(rows_affected) => {
                self.rows_affected = rows_affected;
                self.completed = true;
            }
            Either::Right(row) => self.rows.push(row),
        }
        Ok(())
    }
}

impl<R: RowToJson> StatementOutput<R> {
    /// Build the outcome; `has_columns` is only consulted when no rows came back.
    fn into_outcome(self, has_columns: bool) -> QueryOutcome {
        if !self.rows.is_empty() || has_columns {
            QueryOutcome::Rows(self.rows.iter().map(RowToJson::to_json_map).collect())
        } else {
            QueryOutcome::Mutation(MutationSummary::new(self.rows_affected))
        }
    }
}

fn log_rollback_failure(err: sqlx::Error) {
    warn!(error = %err, "Rollback after failed statement did not complete");
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.
// The code structure is intentionally parallel to make differences obvious.

mod mysql {
    use super::*;
    use sqlx::{MySql, MySqlPool, Transaction};

    pub async fn run(pool: &MySqlPool, sql: &str) -> QueryResult<QueryOutcome> {
        let mut conn = pool.acquire().await.map_err(QueryError::acquisition)?;
        let mut tx = conn.begin().await.map_err(QueryError::acquisition)?;

        match execute_statement(&mut tx, sql).await {
            Ok(outcome) => {
                tx.commit().await.map_err(QueryError::commit)?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    log_rollback_failure(e);
                }
                Err(err)
            }
        }
    }

    async fn execute_statement(
        tx: &mut Transaction<'_, MySql>,
        sql: &str,
    ) -> QueryResult<QueryOutcome> {
        let mut output = StatementOutput::new();

        // No arguments, so the driver sends the text verbatim over the text protocol
        {
            let mut results = (&mut **tx).fetch_many(sql);
            while let Some(step) = results.try_next().await.map_err(QueryError::execution)? {
                output.record(step.map_left(|done| done.rows_affected()))?;
            }
        }

        let has_columns = output.rows.is_empty() && reports_columns(tx, sql).await;
        Ok(output.into_outcome(has_columns))
    }

    /// Statements the server refuses to prepare have no result schema to report.
    async fn reports_columns(tx: &mut Transaction<'_, MySql>, sql: &str) -> bool {
        match (&mut **tx).prepare(sql).await {
            Ok(statement) => !statement.columns().is_empty(),
            Err(e) => {
                debug!(error = %e, "Statement could not be prepared for column inspection");
                false
            }
        }
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Sqlite, SqlitePool, Transaction};

    pub async fn run(pool: &SqlitePool, sql: &str) -> QueryResult<QueryOutcome> {
        let mut conn = pool.acquire().await.map_err(QueryError::acquisition)?;
        let mut tx = conn.begin().await.map_err(QueryError::acquisition)?;

        match execute_statement(&mut tx, sql).await {
            Ok(outcome) => {
                tx.commit().await.map_err(QueryError::commit)?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    log_rollback_failure(e);
                }
                Err(err)
            }
        }
    }

    async fn execute_statement(
        tx: &mut Transaction<'_, Sqlite>,
        sql: &str,
    ) -> QueryResult<QueryOutcome> {
        let mut output = StatementOutput::new();

        {
            let mut results = (&mut **tx).fetch_many(sql);
            while let Some(step) = results.try_next().await.map_err(QueryError::execution)? {
                output.record(step.map_left(|done| done.rows_affected()))?;
            }
        }

        let has_columns = output.rows.is_empty() && reports_columns(tx, sql).await;
        Ok(output.into_outcome(has_columns))
    }

    async fn reports_columns(tx: &mut Transaction<'_, Sqlite>, sql: &str) -> bool {
        match (&mut **tx).prepare(sql).await {
            Ok(statement) => !statement.columns().is_empty(),
            Err(e) => {
                debug!(error = %e, "Statement could not be prepared for column inspection");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::SqliteProvisioner;
    use crate::models::SUCCESS_MESSAGE;
    use serde_json::json;

    fn sqlite_executor() -> (QueryExecutor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let executor = QueryExecutor::new(Arc::new(SqliteProvisioner::new(dir.path())));
        (executor, dir)
    }

    #[tokio::test]
    async fn test_select_returns_rows() {
        let (executor, _dir) = sqlite_executor();
        let envelope = executor.execute(None, "SELECT 1 AS one, 'a' AS letter").await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({ "results": [{ "one": 1, "letter": "a" }] }));
    }

    #[tokio::test]
    async fn test_ddl_returns_mutation_summary() {
        let (executor, _dir) = sqlite_executor();
        let envelope = executor
            .execute(Some("scratch"), "CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await;
        let summary = envelope.results().unwrap().mutation().unwrap();
        assert_eq!(summary.rowcount, 0);
        assert_eq!(summary.message, SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_select_is_empty_row_set() {
        let (executor, _dir) = sqlite_executor();
        executor
            .execute(Some("scratch"), "CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await;
        let envelope = executor.execute(Some("scratch"), "SELECT id FROM t").await;
        assert_eq!(envelope.results().unwrap().rows().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_syntax_error_is_execution_error() {
        let (executor, _dir) = sqlite_executor();
        let err = executor
            .try_execute(None, "SELEC nothing")
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Execution { .. }));
        assert!(!err.message().is_empty());
    }

    #[tokio::test]
    async fn test_empty_database_name_is_server_scope() {
        let (executor, dir) = sqlite_executor();
        let envelope = executor.execute(Some(""), "SELECT 2 AS two").await;
        assert!(envelope.is_success());
        // Server scope is in-memory; no file was created
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_provisioning_failure_becomes_error() {
        let (executor, _dir) = sqlite_executor();
        let envelope = executor.execute(Some("../outside"), "SELECT 1").await;
        assert!(envelope.results().is_none());
        assert!(envelope.error().unwrap().contains("Invalid SQLite database name"));
    }

    type SqliteOutput = StatementOutput<sqlx::sqlite::SqliteRow>;

    #[test]
    fn test_completion_without_columns_is_mutation() {
        let mut output = SqliteOutput::new();
        output.record(Either::Left(4)).unwrap();
        let outcome = output.into_outcome(false);
        assert_eq!(outcome, QueryOutcome::Mutation(MutationSummary::new(4)));
    }

    #[test]
    fn test_completion_with_columns_is_rows() {
        let mut output = SqliteOutput::new();
        output.record(Either::Left(0)).unwrap();
        assert_eq!(output.into_outcome(true), QueryOutcome::Rows(Vec::new()));
    }

    #[test]
    fn test_second_completion_is_rejected() {
        let mut output = SqliteOutput::new();
        output.record(Either::Left(1)).unwrap();
        let err = output.record(Either::Left(2)).unwrap_err();
        assert_eq!(err, QueryError::multiple_statements());
        assert_eq!(err.stage(), "execution");
    }

    #[tokio::test]
    async fn test_multiple_statements_are_rejected() {
        let (executor, _dir) = sqlite_executor();
        let err = executor
            .try_execute(None, "SELECT 1 AS a; SELECT 2 AS b")
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::multiple_statements());
    }
}
