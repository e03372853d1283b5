use crate::formatter::{JsonLogFormatter, LogFormatter};
use crate::obfuscator;
use crate::sink::{LogSink, TracingSink};
use http::{HeaderMap, Method, Uri};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;
use wiretap_core::config::HttpLoggingConfig;
use wiretap_core::error::WiretapError;
use wiretap_core::policy::{LoggingPolicy, Verbosity};
use wiretap_core::record::{self, HeaderList, HttpLogRecord};

/// Shared, read-only logging front end used by both middlewares.
///
/// Cloning is cheap (one `Arc`). When verbosity is `None` every exchange is
/// passed through before any capture work happens.
#[derive(Clone)]
pub struct HttpLogger {
    inner: Arc<Inner>,
}

struct Inner {
    policy: LoggingPolicy,
    formatter: Arc<dyn LogFormatter>,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for HttpLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLogger")
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl HttpLogger {
    /// JSON formatting, written to `tracing`.
    pub fn new(policy: LoggingPolicy) -> Self {
        Self::with_parts(policy, Arc::new(JsonLogFormatter), Arc::new(TracingSink))
    }

    /// Policy from configuration, default formatter and sink.
    pub fn from_config(config: &HttpLoggingConfig) -> Result<Self, WiretapError> {
        Ok(Self::new(LoggingPolicy::from_config(config)?))
    }

    pub fn with_parts(
        policy: LoggingPolicy,
        formatter: Arc<dyn LogFormatter>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                policy,
                formatter,
                sink,
            }),
        }
    }

    /// Same policy and formatter, different destination.
    pub fn with_sink(&self, sink: Arc<dyn LogSink>) -> Self {
        Self::with_parts(
            self.inner.policy.clone(),
            Arc::clone(&self.inner.formatter),
            sink,
        )
    }

    pub fn with_formatter(&self, formatter: Arc<dyn LogFormatter>) -> Self {
        Self::with_parts(
            self.inner.policy.clone(),
            formatter,
            Arc::clone(&self.inner.sink),
        )
    }

    pub fn policy(&self) -> &LoggingPolicy {
        &self.inner.policy
    }

    pub fn verbosity(&self) -> Verbosity {
        self.inner.policy.verbosity()
    }

    /// False when logging is off or an exclusion rule covers the exchange.
    pub fn should_log(&self, method: &Method, path: &str) -> bool {
        self.verbosity().is_enabled() && !self.inner.policy.is_excluded(method, path)
    }

    /// URI with sensitive query parameters masked.
    pub fn mask_uri(&self, uri: &Uri) -> String {
        obfuscator::mask_query_parameters(uri, self.inner.policy.sensitive_query_params())
            .to_string()
    }

    /// Masked header snapshot, or `None` below `Headers` verbosity.
    pub fn capture_headers(&self, headers: &HeaderMap) -> Option<HeaderList> {
        if !self.verbosity().captures_headers() {
            return None;
        }
        Some(obfuscator::mask_headers(
            record::capture_headers(headers),
            self.inner.policy.sensitive_headers(),
        ))
    }

    /// Masked body text, or empty below `Full` verbosity.
    pub fn render_body(&self, bytes: &[u8]) -> String {
        if !self.verbosity().captures_body() || bytes.is_empty() {
            return String::new();
        }
        let text = String::from_utf8_lossy(bytes);
        let fields = self.inner.policy.sensitive_body_fields();
        if fields.is_empty() {
            text.into_owned()
        } else {
            obfuscator::mask_json_body(&text, fields)
        }
    }

    /// Format and write a record. Best-effort: failures and panics inside the
    /// formatter or sink are reported and swallowed.
    pub fn emit(&self, record: HttpLogRecord) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            match self.inner.formatter.format(&record) {
                Ok(rendered) => self.inner.sink.write(&record, &rendered),
                Err(e) => warn!(
                    error = %e,
                    direction = %record.direction(),
                    "Failed to format HTTP log record, dropping it"
                ),
            }
        }));
        if outcome.is_err() {
            warn!(direction = %record.direction(), "HTTP log emission panicked, record dropped");
        }
    }
}
