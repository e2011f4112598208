//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Per-call pool provisioning and disposal
//! - Transactional statement execution
//! - Type mappings from driver rows to JSON
//! - Database dispatch macros for reducing code duplication

pub mod executor;
#[macro_use]
pub mod macros;
pub mod pool;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{DbPool, MySqlProvisioner, PoolGuard, PoolProvisioner, SqliteProvisioner};
pub use types::RowToJson;
