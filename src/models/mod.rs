//! Data models for the SQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod response;

// Re-export commonly used types
pub use connection::{Credentials, DatabaseType};
pub use response::{MutationSummary, QueryOutcome, ResponseEnvelope, Row, SUCCESS_MESSAGE};
