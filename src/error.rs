//! Error types for the SQL MCP Server.
//!
//! Query failures are classified by the stage that produced them. Every variant
//! carries the underlying error text unchanged, and `Display` renders only that
//! text, so the message that reaches the caller is exactly what the engine said.

use thiserror::Error;

/// Failure of a single `execute` call, tagged by origin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The connection string or pool could not be constructed.
    #[error("{message}")]
    Provisioning { message: String },

    /// No usable connection: pool timeout, unreachable host, rejected credentials,
    /// or the transaction could not be started.
    #[error("{message}")]
    Acquisition { message: String },

    #[error("{message}")]
    Execution {
        message: String,
        /// e.g., "42S02" for an unknown table on MySQL
        code: Option<String>,
    },

    /// The statement ran but the transaction failed to finalize.
    #[error("{message}")]
    Commit { message: String },
}

impl QueryError {
    /// Create a provisioning error.
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning {
            message: message.into(),
        }
    }

    /// Create an acquisition error from a driver error.
    pub fn acquisition(err: sqlx::Error) -> Self {
        Self::Acquisition {
            message: err.to_string(),
        }
    }

    /// Create an execution error, keeping the engine error code when there is one.
    pub fn execution(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned());
        Self::Execution {
            message: err.to_string(),
            code,
        }
    }

    /// The statement text produced more than one result.
    pub fn multiple_statements() -> Self {
        Self::Execution {
            message: "Query text contains more than one statement; send one statement per call"
                .to_string(),
            code: None,
        }
    }

    /// Create a commit error from a driver error.
    pub fn commit(err: sqlx::Error) -> Self {
        Self::Commit {
            message: err.to_string(),
        }
    }

    /// Short name of the stage that failed, for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Provisioning { .. } => "provisioning",
            Self::Acquisition { .. } => "acquisition",
            Self::Execution { .. } => "execution",
            Self::Commit { .. } => "commit",
        }
    }

    /// The underlying error text.
    pub fn message(&self) -> &str {
        match self {
            Self::Provisioning { message }
            | Self::Acquisition { message }
            | Self::Execution { message, .. }
            | Self::Commit { message } => message,
        }
    }
}

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while starting or running the server itself.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl ServerError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Result type alias for server lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;
