//! Black-box fuzzing of the execute path.
//!
//! Random and edge-case statements must never panic and must always produce an
//! envelope with exactly one of `results` or `error`.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;
use sql_mcp_server::db::{QueryExecutor, SqliteProvisioner};
use std::sync::Arc;

/// Generate random string of given length
fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random printable ASCII, including quotes and punctuation.
fn random_printable(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(0x20u8..0x7f) as char).collect()
}

fn edge_case_statements() -> Vec<String> {
    vec![
        String::new(),
        " ".to_string(),
        "\n\r\t".to_string(),
        ";".to_string(),
        "--".to_string(),
        "/* unterminated".to_string(),
        "SELECT".to_string(),
        "SELECT 'unterminated".to_string(),
        "'OR 1=1--".to_string(),
        "'; DROP TABLE items--".to_string(),
        "🚀".repeat(100),
        "a".repeat(10000),
        "SELECT 1 UNION SELECT NULL, NULL".to_string(),
        "{{7*7}}".to_string(),
        "\u{0000}".to_string(),
        random_string(100),
    ]
}

fn assert_exactly_one_key(value: &Value, sql: &str) {
    let object = value.as_object().expect("envelope is an object");
    assert_eq!(object.len(), 1, "statement: {sql:?} produced {value}");
    assert!(
        object.contains_key("results") || object.contains_key("error"),
        "statement: {sql:?} produced {value}"
    );
}

#[tokio::test]
async fn test_edge_case_statements_yield_one_shape() {
    let dir = tempfile::tempdir().unwrap();
    let executor = QueryExecutor::new(Arc::new(SqliteProvisioner::new(dir.path())));

    for sql in edge_case_statements() {
        let envelope = executor.execute(Some("fuzz"), &sql).await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_exactly_one_key(&value, &sql);
    }
}

#[tokio::test]
async fn test_random_statements_yield_one_shape() {
    let dir = tempfile::tempdir().unwrap();
    let executor = QueryExecutor::new(Arc::new(SqliteProvisioner::new(dir.path())));
    let mut rng = rand::thread_rng();

    for _ in 0..100 {
        let len = rng.gen_range(0..200);
        let sql = random_printable(len);
        let envelope = executor.execute(None, &sql).await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_exactly_one_key(&value, &sql);
    }
}

#[tokio::test]
async fn test_random_database_names_never_panic() {
    let dir = tempfile::tempdir().unwrap();
    let executor = QueryExecutor::new(Arc::new(SqliteProvisioner::new(dir.path())));

    for len in [1, 8, 64] {
        let database = random_string(len);
        let envelope = executor.execute(Some(&database), "SELECT 1 AS one").await;
        assert!(envelope.is_success(), "{database}: {:?}", envelope.error());
    }

    for database in ["..", "../../etc", "a/b", "a\\b"] {
        let envelope = executor.execute(Some(database), "SELECT 1 AS one").await;
        assert!(envelope.error().is_some(), "{database}");
    }
}
