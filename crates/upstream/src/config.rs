use std::path::PathBuf;
use std::time::Duration;

/// Default actor identifier sent with uploads and chat requests.
pub const DEFAULT_ACTOR: &str = "report-generator";

/// Default TCP connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle timeout between stream chunks in seconds.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Upstream generation service configuration.
///
/// The endpoint and key are optional so the server can start without them;
/// generation requests then fail with
/// [`UpstreamError::Configuration`](crate::UpstreamError::Configuration)
/// before any network call is made.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `https://api.example.com/v1`.
    pub base_url: Option<String>,
    /// Bearer token for the upstream API.
    pub api_key: Option<String>,
    /// Logical actor identifier sent as `user`.
    pub actor: String,
    /// PEM bundle trusted for the upstream host. When set, only these
    /// certificates are trusted by the upstream client.
    pub ca_cert_path: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Maximum silence between stream chunks; `0` disables the check.
    pub idle_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            actor: DEFAULT_ACTOR.to_string(),
            ca_cert_path: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    /// Load upstream configuration from environment variables.
    ///
    /// | Env Var                           | Required | Default            |
    /// |-----------------------------------|----------|--------------------|
    /// | `GENERATION_API_BASE_URL`         | no*      | --                 |
    /// | `GENERATION_API_KEY`              | no*      | --                 |
    /// | `GENERATION_API_USER`             | no       | `report-generator` |
    /// | `GENERATION_API_CA_CERT`          | no       | --                 |
    /// | `GENERATION_CONNECT_TIMEOUT_SECS` | no       | `10`               |
    /// | `GENERATION_IDLE_TIMEOUT_SECS`    | no       | `300`              |
    ///
    /// \* required for generation requests to succeed.
    ///
    /// # Panics
    ///
    /// Panics if a timeout is set but is not a valid `u64`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let connect_timeout_secs: u64 = non_empty("GENERATION_CONNECT_TIMEOUT_SECS")
            .map(|v| {
                v.parse()
                    .expect("GENERATION_CONNECT_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        let idle_timeout_secs: u64 = non_empty("GENERATION_IDLE_TIMEOUT_SECS")
            .map(|v| {
                v.parse()
                    .expect("GENERATION_IDLE_TIMEOUT_SECS must be a valid u64")
            })
            .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);

        Self {
            base_url: non_empty("GENERATION_API_BASE_URL"),
            api_key: non_empty("GENERATION_API_KEY"),
            actor: non_empty("GENERATION_API_USER").unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            ca_cert_path: non_empty("GENERATION_API_CA_CERT").map(PathBuf::from),
            connect_timeout_secs,
            idle_timeout_secs,
        }
    }

    /// Whether both the endpoint and the credential are present.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }

    /// Idle timeout between stream chunks, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
