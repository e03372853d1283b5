use crate::policy::Verbosity;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level Wiretap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WiretapConfig {
    #[serde(default)]
    pub http_logging: HttpLoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// What to capture and what to redact. Lists add to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpLoggingConfig {
    #[serde(default)]
    pub verbosity: Verbosity,
    /// Routes never logged, evaluated in order.
    #[serde(default)]
    pub exclude: Vec<ExcludeRule>,
    #[serde(default)]
    pub sensitive_headers: Vec<String>,
    /// Dotted JSON paths, e.g. `user.password`.
    #[serde(default)]
    pub sensitive_body_fields: Vec<String>,
    #[serde(default)]
    pub sensitive_query_params: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcludeRule {
    /// HTTP method token; absent or `*` matches every method.
    #[serde(default)]
    pub method: Option<String>,
    pub path: String,
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

/// Process-wide tracing subscriber settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_connect_timeout() -> u64 { 5_000 }
fn default_read_timeout() -> u64 { 10_000 }
fn default_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl WiretapConfig {
    /// Load configuration from YAML file + env overrides (`WIRETAP_` prefix,
    /// `__` separates nested keys: `WIRETAP_HTTP_LOGGING__VERBOSITY=basic`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: WiretapConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("WIRETAP_").split("__"))
            .extract()?;
        Ok(config)
    }
}
