//! Connection-related data models.
//!
//! This module defines the database backends and the process-scoped credentials
//! used to build connection strings.

use schemars::JsonSchema;
use serde::Serialize;
use url::Url;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// MySQL credentials, read once at start-up and shared read-only afterwards.
///
/// Missing user or password is accepted here; the server rejects the login when a
/// connection is first acquired.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: Option<String>,
    /// Contains sensitive data - never log
    password: Option<String>,
    host: String,
}

impl Credentials {
    pub fn new(user: Option<String>, password: Option<String>, host: impl Into<String>) -> Self {
        Self {
            user,
            password,
            host: host.into(),
        }
    }

    /// Build the connection URL, appending `database` as the path when present.
    ///
    /// User and password are percent-encoded, so any characters are allowed in them.
    pub fn connection_url(&self, database: Option<&str>) -> Result<Url, String> {
        self.build_url(database, self.password.as_deref())
    }

    /// Connection URL with the password replaced by `***`, safe for logs.
    pub fn masked_connection_url(&self, database: Option<&str>) -> String {
        let masked = self.password.as_ref().map(|_| "***");
        match self.build_url(database, masked) {
            Ok(url) => url.to_string(),
            Err(_) => format!("mysql://{}", self.host),
        }
    }

    fn build_url(&self, database: Option<&str>, password: Option<&str>) -> Result<Url, String> {
        let mut url = Url::parse(&format!("mysql://{}", self.host))
            .map_err(|e| format!("Invalid MySQL host '{}': {}", self.host, e))?;

        if let Some(user) = &self.user {
            url.set_username(user)
                .map_err(|_| format!("Cannot set user on MySQL host '{}'", self.host))?;
        }
        if let Some(password) = password {
            url.set_password(Some(password))
                .map_err(|_| format!("Cannot set password on MySQL host '{}'", self.host))?;
        }
        if let Some(database) = database.filter(|db| !db.is_empty()) {
            url.set_path(&format!("/{}", database));
        }

        Ok(url)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new(
            Some("app".to_string()),
            Some("p@ss:word".to_string()),
            "localhost",
        )
    }

    #[test]
    fn test_server_scope_url_has_no_path() {
        let url = creds().connection_url(None).unwrap();
        assert_eq!(url.scheme(), "mysql");
        assert_eq!(url.host_str(), Some("localhost"));
        assert!(url.path().is_empty() || url.path() == "/");
    }

    #[test]
    fn test_database_appended_as_path() {
        let url = creds().connection_url(Some("inventory")).unwrap();
        assert_eq!(url.path(), "/inventory");
    }

    #[test]
    fn test_empty_database_is_server_scope() {
        let url = creds().connection_url(Some("")).unwrap();
        assert!(url.path().is_empty() || url.path() == "/");
    }

    #[test]
    fn test_password_is_percent_encoded() {
        let url = creds().connection_url(None).unwrap();
        assert_eq!(url.username(), "app");
        assert_eq!(url.password(), Some("p%40ss%3Aword"));
    }

    #[test]
    fn test_host_with_port() {
        let credentials = Credentials::new(None, None, "db.internal:3307");
        let url = credentials.connection_url(Some("sales")).unwrap();
        assert_eq!(url.host_str(), Some("db.internal"));
        assert_eq!(url.port(), Some(3307));
        assert_eq!(url.username(), "");
        assert!(url.password().is_none());
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let credentials = Credentials::new(None, None, "bad host");
        assert!(credentials.connection_url(None).is_err());
    }

    #[test]
    fn test_masked_url_hides_password() {
        let masked = creds().masked_connection_url(Some("inventory"));
        assert!(!masked.contains("p%40ss"));
        assert!(masked.contains("***"));
        assert!(masked.ends_with("/inventory"));
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("p@ss"));
    }

    #[test]
    fn test_database_type_display() {
        assert_eq!(DatabaseType::MySQL.to_string(), "MySQL");
        assert_eq!(DatabaseType::SQLite.to_string(), "SQLite");
    }
}
