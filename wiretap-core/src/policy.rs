use crate::config::HttpLoggingConfig;
use crate::error::WiretapError;
use crate::matcher::{self, ExclusionRule};
use http::Method;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// How much of each exchange is captured. Ordered: `None < Basic < Headers < Full`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// No capture at all.
    None,
    /// Method, URI, status and duration.
    Basic,
    /// Basic plus headers.
    Headers,
    /// Headers plus bodies.
    #[default]
    Full,
}

impl Verbosity {
    pub fn is_enabled(&self) -> bool {
        *self != Verbosity::None
    }

    pub fn captures_headers(&self) -> bool {
        *self >= Verbosity::Headers
    }

    pub fn captures_body(&self) -> bool {
        *self == Verbosity::Full
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::None => "none",
            Verbosity::Basic => "basic",
            Verbosity::Headers => "headers",
            Verbosity::Full => "full",
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = WiretapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Verbosity::None),
            "basic" => Ok(Verbosity::Basic),
            "headers" => Ok(Verbosity::Headers),
            "full" => Ok(Verbosity::Full),
            other => Err(WiretapError::Config(format!("unknown verbosity {other:?}"))),
        }
    }
}

/// Headers masked unless [`LoggingPolicyBuilder::clear_sensitive_defaults`] is called.
pub const DEFAULT_SENSITIVE_HEADERS: &[&str] = &["Authorization", "Cookie", "Set-Cookie"];

/// JSON body fields masked by default.
pub const DEFAULT_SENSITIVE_BODY_FIELDS: &[&str] = &["access_token", "refresh_token"];

/// Query parameters masked by default.
pub const DEFAULT_SENSITIVE_QUERY_PARAMS: &[&str] = &["access_token"];

/// Immutable logging configuration, built once at startup and shared read-only
/// (behind an `Arc`) by every in-flight exchange.
#[derive(Debug, Clone)]
pub struct LoggingPolicy {
    verbosity: Verbosity,
    excluded_routes: Vec<ExclusionRule>,
    sensitive_headers: Vec<String>,
    sensitive_body_fields: Vec<String>,
    sensitive_query_params: Vec<String>,
}

impl LoggingPolicy {
    pub fn builder() -> LoggingPolicyBuilder {
        LoggingPolicyBuilder::default()
    }

    /// Build a policy from file/env configuration. Configured lists are added
    /// on top of the defaults.
    pub fn from_config(config: &HttpLoggingConfig) -> Result<Self, WiretapError> {
        let mut builder = Self::builder()
            .verbosity(config.verbosity)
            .sensitive_headers(config.sensitive_headers.iter().cloned())
            .sensitive_body_fields(config.sensitive_body_fields.iter().cloned())
            .sensitive_query_params(config.sensitive_query_params.iter().cloned());

        for rule in &config.exclude {
            let method = match rule.method.as_deref() {
                None | Some("") | Some("*") => None,
                Some(token) => Some(
                    Method::from_bytes(token.to_ascii_uppercase().as_bytes())
                        .map_err(|_| WiretapError::InvalidMethod(token.to_string()))?,
                ),
            };
            builder = match method {
                Some(m) => builder.exclude(m, &rule.path),
                None => builder.exclude_any(&rule.path),
            };
        }

        builder.build()
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn excluded_routes(&self) -> &[ExclusionRule] {
        &self.excluded_routes
    }

    pub fn sensitive_headers(&self) -> &[String] {
        &self.sensitive_headers
    }

    pub fn sensitive_body_fields(&self) -> &[String] {
        &self.sensitive_body_fields
    }

    pub fn sensitive_query_params(&self) -> &[String] {
        &self.sensitive_query_params
    }

    /// True when the first matching exclusion rule covers this exchange.
    pub fn is_excluded(&self, method: &Method, path: &str) -> bool {
        matcher::first_match(&self.excluded_routes, method, path).is_some()
    }
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            excluded_routes: Vec::new(),
            sensitive_headers: to_owned(DEFAULT_SENSITIVE_HEADERS),
            sensitive_body_fields: to_owned(DEFAULT_SENSITIVE_BODY_FIELDS),
            sensitive_query_params: to_owned(DEFAULT_SENSITIVE_QUERY_PARAMS),
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builder for [`LoggingPolicy`]. Patterns are compiled in [`build`](Self::build).
#[derive(Debug)]
pub struct LoggingPolicyBuilder {
    verbosity: Verbosity,
    exclusions: Vec<(Option<Method>, String)>,
    sensitive_headers: Vec<String>,
    sensitive_body_fields: Vec<String>,
    sensitive_query_params: Vec<String>,
}

impl Default for LoggingPolicyBuilder {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            exclusions: Vec::new(),
            sensitive_headers: to_owned(DEFAULT_SENSITIVE_HEADERS),
            sensitive_body_fields: to_owned(DEFAULT_SENSITIVE_BODY_FIELDS),
            sensitive_query_params: to_owned(DEFAULT_SENSITIVE_QUERY_PARAMS),
        }
    }
}

impl LoggingPolicyBuilder {
    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Drop the built-in sensitive header/field/parameter names.
    pub fn clear_sensitive_defaults(mut self) -> Self {
        self.sensitive_headers.clear();
        self.sensitive_body_fields.clear();
        self.sensitive_query_params.clear();
        self
    }

    pub fn sensitive_header(self, name: impl Into<String>) -> Self {
        self.sensitive_headers(std::iter::once(name.into()))
    }

    pub fn sensitive_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            push_unique_ci(&mut self.sensitive_headers, name.into());
        }
        self
    }

    /// Dotted JSON path such as `user.password`.
    pub fn sensitive_body_field(self, path: impl Into<String>) -> Self {
        self.sensitive_body_fields(std::iter::once(path.into()))
    }

    pub fn sensitive_body_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            let path = path.into();
            if !self.sensitive_body_fields.contains(&path) {
                self.sensitive_body_fields.push(path);
            }
        }
        self
    }

    pub fn sensitive_query_param(self, name: impl Into<String>) -> Self {
        self.sensitive_query_params(std::iter::once(name.into()))
    }

    pub fn sensitive_query_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            push_unique_ci(&mut self.sensitive_query_params, name.into());
        }
        self
    }

    /// Never log `method` requests whose path matches `pattern`.
    pub fn exclude(mut self, method: Method, pattern: impl Into<String>) -> Self {
        self.exclusions.push((Some(method), pattern.into()));
        self
    }

    /// Never log requests of any method whose path matches `pattern`.
    pub fn exclude_any(mut self, pattern: impl Into<String>) -> Self {
        self.exclusions.push((None, pattern.into()));
        self
    }

    pub fn build(self) -> Result<LoggingPolicy, WiretapError> {
        let excluded_routes = self
            .exclusions
            .into_iter()
            .map(|(method, pattern)| ExclusionRule::new(method, &pattern))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            verbosity = %self.verbosity,
            excluded_routes = excluded_routes.len(),
            sensitive_headers = self.sensitive_headers.len(),
            sensitive_body_fields = self.sensitive_body_fields.len(),
            "Logging policy built"
        );

        Ok(LoggingPolicy {
            verbosity: self.verbosity,
            excluded_routes,
            sensitive_headers: self.sensitive_headers,
            sensitive_body_fields: self.sensitive_body_fields,
            sensitive_query_params: self.sensitive_query_params,
        })
    }
}

fn push_unique_ci(list: &mut Vec<String>, item: String) {
    if !list.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
        list.push(item);
    }
}
