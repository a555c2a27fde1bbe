use std::path::PathBuf;
use std::time::Duration;

use columbia_portal::PortalConfig;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight submissions (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `5001`    |
    /// | `CORS_ORIGINS`         | `*`       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`      |
    /// | `LOG_FORMAT`           | `text`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(v) => v
                .parse()
                .unwrap_or_else(|e| panic!("LOG_FORMAT is invalid: {e}")),
            Err(_) => LogFormat::Text,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            log_format,
        }
    }

    /// Whether CORS should accept any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Settings for the periodic artifact cleanup.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Holds `browser_data_*` profile directories.
    pub session_dir: PathBuf,
    /// Holds `*.zip` trace archives.
    pub trace_dir: PathBuf,
    /// Holds `*.log` files and the `screenshots/` directory.
    pub log_dir: PathBuf,
    /// Time between sweeps (default: 6 h).
    pub interval: Duration,
    /// Age after which profiles, logs and screenshots are removed (default: 2 days).
    pub max_age: Duration,
    /// Trace archives kept, newest first (default: `5`).
    pub max_trace_files: usize,
}

impl RetentionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Session and trace directories come from the portal configuration.
    ///
    /// | Env Var                  | Default  |
    /// |--------------------------|----------|
    /// | `LOG_DIR`                | `./logs` |
    /// | `CLEANUP_INTERVAL_HOURS` | `6`      |
    /// | `CLEANUP_MAX_AGE_DAYS`   | `2`      |
    /// | `MAX_TRACE_FILES`        | `5`      |
    pub fn from_env(portal: &PortalConfig) -> Self {
        let log_dir = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./logs"));

        let interval_hours: u64 = std::env::var("CLEANUP_INTERVAL_HOURS")
            .unwrap_or_else(|_| "6".into())
            .parse()
            .expect("CLEANUP_INTERVAL_HOURS must be a valid u64");

        let max_age_days: u64 = std::env::var("CLEANUP_MAX_AGE_DAYS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("CLEANUP_MAX_AGE_DAYS must be a valid u64");

        let max_trace_files: usize = std::env::var("MAX_TRACE_FILES")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("MAX_TRACE_FILES must be a valid usize");

        Self {
            session_dir: portal.session_dir.clone(),
            trace_dir: portal.trace_dir.clone(),
            log_dir,
            interval: Duration::from_secs(interval_hours.max(1) * 3600),
            max_age: Duration::from_secs(max_age_days * 24 * 3600),
            max_trace_files,
        }
    }
}
