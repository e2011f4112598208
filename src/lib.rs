//! SQL MCP Server Library
//!
//! This library provides an MCP (Model Context Protocol) `execute` tool that runs
//! one SQL statement per call against a MySQL server, inside its own transaction
//! and on its own short-lived connection pool.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::QueryExecutor;
pub use error::{QueryError, ServerError};
pub use mcp::SqlService;
pub use models::ResponseEnvelope;
