use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_PB_URL: &str = "http://localhost:8090";
const DEFAULT_STATE_DIR: &str = ".studioai";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STALE_TIME_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// REST API base URL.
    pub api_url: String,
    /// PocketBase base URL for realtime and file URLs.
    pub pb_url: String,
    /// Directory holding the persisted client state file.
    pub state_dir: PathBuf,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Default freshness window for cached reads.
    pub stale_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            pb_url: DEFAULT_PB_URL.into(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stale_time: Duration::from_secs(DEFAULT_STALE_TIME_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `STUDIOAI_API_URL`              | `http://localhost:3001` |
    /// | `STUDIOAI_PB_URL` / `VITE_PB_URL` | `http://localhost:8090` |
    /// | `STUDIOAI_STATE_DIR`            | `.studioai`             |
    /// | `STUDIOAI_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `STUDIOAI_STALE_TIME_SECS`      | `30`                    |
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("STUDIOAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let pb_url = non_empty("STUDIOAI_PB_URL")
            .or_else(|| non_empty("VITE_PB_URL"))
            .unwrap_or_else(|| DEFAULT_PB_URL.into());
        let state_dir = non_empty("STUDIOAI_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        let request_timeout_secs = parse_secs(
            "STUDIOAI_REQUEST_TIMEOUT_SECS",
            non_empty("STUDIOAI_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );
        let stale_time_secs = parse_secs(
            "STUDIOAI_STALE_TIME_SECS",
            non_empty("STUDIOAI_STALE_TIME_SECS"),
            DEFAULT_STALE_TIME_SECS,
        );

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            pb_url: pb_url.trim_end_matches('/').to_string(),
            state_dir,
            request_timeout: Duration::from_secs(request_timeout_secs),
            stale_time: Duration::from_secs(stale_time_secs),
        }
    }

    /// Path of the persisted state document.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }
}

fn parse_secs(name: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, default, "Invalid number, using default");
            default
        }),
    }
}
