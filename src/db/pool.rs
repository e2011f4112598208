//! Pool provisioning.
//!
//! Every `execute` call gets a freshly built pool scoped to the requested database
//! and closes it before returning. Pools are created lazily: building one performs
//! no network or file I/O, connections are opened on first acquisition.

use crate::config::PoolSettings;
use crate::error::{QueryError, QueryResult};
use crate::models::{Credentials, DatabaseType};
use sqlx::{
    MySqlPool, SqlitePool, mysql::MySqlConnectOptions, mysql::MySqlPoolOptions,
    sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Close the pool, waiting for every connection to be closed.
    ///
    /// Closing a pool that never opened a connection is a no-op.
    pub async fn close(&self) {
        impl_db_dispatch!(self, {
            MySql(pool) => pool.close().await,
            SQLite(pool) => pool.close().await,
        })
    }

    /// Number of open connections, idle or in use.
    pub fn size(&self) -> u32 {
        impl_db_dispatch!(self, {
            MySql(pool) => pool.size(),
            SQLite(pool) => pool.size(),
        })
    }

    pub fn is_closed(&self) -> bool {
        impl_db_dispatch!(self, {
            MySql(pool) => pool.is_closed(),
            SQLite(pool) => pool.is_closed(),
        })
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySQL,
            DbPool::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// Builds a pool for a target database.
///
/// `None` targets the server itself with no default schema.
pub trait PoolProvisioner: Send + Sync {
    fn provision(&self, database: Option<&str>) -> QueryResult<DbPool>;
}

/// Provisions MySQL pools from process-scoped credentials.
#[derive(Debug, Clone)]
pub struct MySqlProvisioner {
    credentials: Credentials,
    settings: PoolSettings,
}

impl MySqlProvisioner {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_settings(credentials, PoolSettings::default())
    }

    pub fn with_settings(credentials: Credentials, settings: PoolSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Connect options for the target; validates the connection string only.
    pub fn connect_options(&self, database: Option<&str>) -> QueryResult<MySqlConnectOptions> {
        let url = self
            .credentials
            .connection_url(database)
            .map_err(QueryError::provisioning)?;

        let options = MySqlConnectOptions::from_str(url.as_str()).map_err(|e| {
            QueryError::provisioning(format!("Invalid MySQL connection string: {}", e))
        })?;

        Ok(options.charset("utf8mb4"))
    }
}

impl PoolProvisioner for MySqlProvisioner {
    fn provision(&self, database: Option<&str>) -> QueryResult<DbPool> {
        let options = self.connect_options(database)?;

        debug!(
            target_url = %self.credentials.masked_connection_url(database),
            max_connections = self.settings.max_connections(),
            "Provisioning MySQL pool"
        );

        let pool = MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(self.settings.max_connections())
            .acquire_timeout(self.settings.acquire_timeout)
            .max_lifetime(self.settings.recycle)
            .connect_lazy_with(options);

        Ok(DbPool::MySql(pool))
    }
}

/// Provisions SQLite pools, one database file per name under a directory.
///
/// The server scope (`None`) maps to a private in-memory database.
#[derive(Debug, Clone)]
pub struct SqliteProvisioner {
    directory: PathBuf,
    settings: PoolSettings,
}

impl SqliteProvisioner {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            settings: PoolSettings::default(),
        }
    }

    /// Path of the database file backing `name`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.db", name))
    }

    fn connect_options(&self, database: Option<&str>) -> QueryResult<SqliteConnectOptions> {
        match database.filter(|db| !db.is_empty()) {
            None => SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                QueryError::provisioning(format!("Invalid SQLite connection string: {}", e))
            }),
            Some(name) if name.contains(['/', '\\']) || name == "." || name == ".." => Err(
                QueryError::provisioning(format!("Invalid SQLite database name: '{}'", name)),
            ),
            Some(name) => Ok(SqliteConnectOptions::new()
                .filename(self.database_path(name))
                .create_if_missing(true)),
        }
    }
}

impl PoolProvisioner for SqliteProvisioner {
    fn provision(&self, database: Option<&str>) -> QueryResult<DbPool> {
        let options = self.connect_options(database)?;

        debug!(
            directory = %self.directory.display(),
            database = ?database,
            "Provisioning SQLite pool"
        );

        let pool = SqlitePoolOptions::new()
            .min_connections(0)
            .max_connections(self.settings.max_connections())
            .acquire_timeout(self.settings.acquire_timeout)
            .max_lifetime(self.settings.recycle)
            .connect_lazy_with(options);

        Ok(DbPool::SQLite(pool))
    }
}

/// RAII guard owning a call's pool.
///
/// Call [`PoolGuard::dispose`] on every normal exit path. If the guard is dropped
/// without being disposed (the caller abandoned the call, or a panic unwound
/// through it), `Drop` spawns a task that closes the pool.
pub struct PoolGuard {
    pool: DbPool,
    database: Option<String>,
    disposed: bool,
}

impl std::fmt::Debug for PoolGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard")
            .field("pool", &self.pool)
            .field("database", &self.database)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl PoolGuard {
    pub fn new(pool: DbPool, database: Option<&str>) -> Self {
        Self {
            pool,
            database: database.map(String::from),
            disposed: false,
        }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close every connection in the pool.
    pub async fn dispose(mut self) {
        self.disposed = true;
        self.pool.close().await;
        debug!(database = ?self.database, "Pool disposed");
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        let pool = self.pool.clone();
        let database = self.database.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    pool.close().await;
                    warn!(database = ?database, "Pool closed via Drop - call was abandoned");
                });
            }
            // Without a runtime the pool is dropped along with its connections
            Err(_) => warn!(database = ?database, "Pool dropped outside of a runtime"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new(
            Some("app".to_string()),
            Some("secret".to_string()),
            "localhost",
        )
    }

    #[tokio::test]
    async fn test_mysql_provision_is_lazy() {
        let provisioner = MySqlProvisioner::new(credentials());
        let pool = provisioner.provision(Some("inventory")).unwrap();
        assert_eq!(pool.db_type(), DatabaseType::MySQL);
        assert_eq!(pool.size(), 0);
        assert!(!pool.is_closed());
        pool.close().await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_mysql_server_scope_provision() {
        let provisioner = MySqlProvisioner::new(credentials());
        let pool = provisioner.provision(None).unwrap();
        assert_eq!(pool.size(), 0);
        pool.close().await;
    }

    #[test]
    fn test_mysql_connect_options_database() {
        let provisioner = MySqlProvisioner::new(credentials());
        let options = provisioner.connect_options(Some("inventory")).unwrap();
        assert_eq!(options.get_database(), Some("inventory"));
        assert_eq!(options.get_username(), "app");

        let server = provisioner.connect_options(None).unwrap();
        assert_eq!(server.get_database(), None);
    }

    #[test]
    fn test_mysql_invalid_host_is_provisioning_error() {
        let provisioner = MySqlProvisioner::new(Credentials::new(None, None, "bad host"));
        let err = provisioner.provision(Some("inventory")).unwrap_err();
        assert!(matches!(err, QueryError::Provisioning { .. }));
    }

    #[test]
    fn test_default_settings() {
        let provisioner = MySqlProvisioner::new(credentials());
        assert_eq!(provisioner.settings().max_connections(), 15);
    }

    #[tokio::test]
    async fn test_sqlite_provision_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = SqliteProvisioner::new(dir.path());
        let pool = provisioner.provision(Some("inventory")).unwrap();
        assert_eq!(pool.db_type(), DatabaseType::SQLite);
        assert!(!provisioner.database_path("inventory").exists());
        pool.close().await;
    }

    #[test]
    fn test_sqlite_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = SqliteProvisioner::new(dir.path());
        for name in ["../escape", "a/b", ".."] {
            let err = provisioner.provision(Some(name)).unwrap_err();
            assert!(matches!(err, QueryError::Provisioning { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_guard_dispose_closes_pool() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = SqliteProvisioner::new(dir.path());
        let pool = provisioner.provision(None).unwrap();
        let handle = pool.clone();

        let guard = PoolGuard::new(pool, None);
        guard.dispose().await;
        assert!(handle.is_closed());
        assert_eq!(handle.size(), 0);
    }

    #[tokio::test]
    async fn test_guard_drop_closes_pool() {
        let dir = tempfile::tempdir().unwrap();
        let provisioner = SqliteProvisioner::new(dir.path());
        let pool = provisioner.provision(Some("dropped")).unwrap();
        let handle = pool.clone();

        drop(PoolGuard::new(pool, Some("dropped")));

        for _ in 0..50 {
            if handle.is_closed() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(handle.is_closed());
    }
}
