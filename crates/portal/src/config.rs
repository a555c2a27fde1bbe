use std::path::PathBuf;
use std::time::Duration;

/// Name of the persistent browser profile directory under `session_dir`.
pub const DEFAULT_PROFILE_DIR: &str = "browser_data_default";

/// Portal driver configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub username: String,
    pub password: String,
    pub login_url: String,
    pub quote_url: String,
    /// Base URL of the WebDriver server (default: `http://localhost:9515`).
    pub webdriver_url: String,
    /// Run the browser without a window (default: `true`).
    pub headless: bool,
    /// Per-step wait budget (default: 30 s).
    pub browser_timeout: Duration,
    /// Root for browser profile directories (default: `./sessions`).
    pub session_dir: PathBuf,
    /// Where trace archives are written (default: `./traces`).
    pub trace_dir: PathBuf,
    /// Write a trace archive for each run (default: `true`).
    pub enable_tracing: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            login_url: String::new(),
            quote_url: String::new(),
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            browser_timeout: Duration::from_millis(30_000),
            session_dir: PathBuf::from("./sessions"),
            trace_dir: PathBuf::from("./traces"),
            enable_tracing: true,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `COLUMBIA_USERNAME`  | (empty)                  |
    /// | `COLUMBIA_PASSWORD`  | (empty)                  |
    /// | `COLUMBIA_LOGIN_URL` | (empty)                  |
    /// | `COLUMBIA_QUOTE_URL` | (empty)                  |
    /// | `WEBDRIVER_URL`      | `http://localhost:9515`  |
    /// | `BROWSER_HEADLESS`   | `true`                   |
    /// | `BROWSER_TIMEOUT_MS` | `30000`                  |
    /// | `SESSION_DIR`        | `./sessions`             |
    /// | `TRACE_DIR`          | `./traces`               |
    /// | `ENABLE_TRACING`     | `true`                   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let username = std::env::var("COLUMBIA_USERNAME").unwrap_or_default();
        let password = std::env::var("COLUMBIA_PASSWORD").unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            tracing::warn!("COLUMBIA_USERNAME or COLUMBIA_PASSWORD not set; portal login will fail");
        }
        let login_url = std::env::var("COLUMBIA_LOGIN_URL").unwrap_or(defaults.login_url);
        let quote_url = std::env::var("COLUMBIA_QUOTE_URL").unwrap_or(defaults.quote_url);
        if login_url.is_empty() || quote_url.is_empty() {
            tracing::warn!("COLUMBIA_LOGIN_URL or COLUMBIA_QUOTE_URL not set; submissions will fail");
        }

        let timeout_ms: u64 = std::env::var("BROWSER_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .expect("BROWSER_TIMEOUT_MS must be a valid u64");

        Self {
            username,
            password,
            login_url,
            quote_url,
            webdriver_url: std::env::var("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            headless: env_flag("BROWSER_HEADLESS", defaults.headless),
            browser_timeout: Duration::from_millis(timeout_ms),
            session_dir: std::env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_dir),
            trace_dir: std::env::var("TRACE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.trace_dir),
            enable_tracing: env_flag("ENABLE_TRACING", defaults.enable_tracing),
        }
    }

    /// Directory of the persistent browser profile.
    pub fn profile_dir(&self) -> PathBuf {
        self.session_dir.join(DEFAULT_PROFILE_DIR)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => parse_flag(&v).unwrap_or_else(|| panic!("{name} must be true or false")),
        Err(_) => default,
    }
}

/// Parse a boolean environment value. Accepts `true/false`, `1/0`, `yes/no`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
