//! Command line and environment configuration for the server.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// The settings the account service is started with.
///
/// Every option can also be set with the environment variable named in its help text.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "The account service for group household bookkeeping.", long_about = None)]
pub struct ServerConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    pub db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The name of the cookie that carries the session ID.
    #[arg(long, env = "SESSION_COOKIE_NAME", default_value = "session_id")]
    pub session_cookie_name: String,

    /// The base URL of the user service, e.g. `http://users:8080`.
    #[arg(long, env = "USER_SERVICE_URL")]
    pub user_service_url: String,

    /// How long a database write waits for a lock, in seconds.
    #[arg(long, env = "SQL_TIMEOUT_SECS", default_value_t = 3)]
    pub sql_timeout_secs: u64,

    /// How long a call to the user service may take, in seconds.
    #[arg(long, env = "ORACLE_TIMEOUT_SECS", default_value_t = 10)]
    pub oracle_timeout_secs: u64,

    /// How long a request may take before the server gives up on it, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// The most idle connections to keep open to the user service.
    #[arg(long, env = "ORACLE_MAX_IDLE_CONNECTIONS", default_value_t = 8)]
    pub oracle_max_idle_connections: usize,

    /// Also write debug logs to this file.
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl ServerConfig {
    /// The SQLite busy timeout.
    pub fn sql_timeout(&self) -> Duration {
        Duration::from_secs(self.sql_timeout_secs)
    }

    /// The deadline for each call to the user service.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// The deadline for each request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
