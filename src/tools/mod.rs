//! MCP tool implementations.
//!
//! - `execute`: run one SQL statement against a database or the server

pub mod execute;

pub use execute::{ExecuteInput, ExecuteToolHandler};
