//! Environment-driven configuration shared by the API server and the
//! `setup_db` tool.

use rocket_db_pools::sqlx::postgres::PgConnectOptions;
use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8080",
];

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    env::var(key)
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|entries| !entries.is_empty())
        .unwrap_or_else(|| default.iter().map(|entry| entry.to_string()).collect())
}

/// PostgreSQL connection parameters.
///
/// Read from `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`.
/// When `DATABASE_URL` is set it takes precedence over the individual values.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub url: Option<String>,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_string("DB_HOST", "localhost"),
            port: env_u16("DB_PORT", 5432),
            database: env_string("DB_NAME", "think41_interview"),
            user: env_string("DB_USER", "postgres"),
            password: env_string("DB_PASSWORD", "password"),
            url: env::var("DATABASE_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        }
    }

    /// Connection URL in the form Rocket's database pools expect.
    ///
    /// Credentials are inserted verbatim; use `DATABASE_URL` when the password
    /// contains URL-reserved characters.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.database
            ),
        }
    }

    /// Typed connect options used by the setup tool.
    pub fn connect_options(&self) -> Result<PgConnectOptions, rocket_db_pools::sqlx::Error> {
        match &self.url {
            Some(url) => PgConnectOptions::from_str(url),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .database(&self.database)
                .username(&self.user)
                .password(&self.password)),
        }
    }
}


// Never print the password.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Display for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(_) => write!(f, "DATABASE_URL"),
            None => write!(
                f,
                "{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

/// HTTP-facing settings for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Origins allowed by CORS (`CORS_ALLOWED_ORIGINS`, comma separated).
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            allowed_origins: env_list("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS),
        }
    }
}
