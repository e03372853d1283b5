use http::Uri;
use serde_json::{Map, Value, json};
use wiretap_core::error::WiretapError;
use wiretap_core::record::{HeaderList, HttpLogRecord};

/// Renders a captured record into a text document.
pub trait LogFormatter: Send + Sync {
    fn format(&self, record: &HttpLogRecord) -> Result<String, WiretapError>;
}

/// Pretty-printed JSON rendering.
///
/// Keys appear in a fixed order: `origin`, `direction`, `method`, `uri`,
/// `host`, `path`, `duration`, `statusCode`, `headers`, `body`. Absent values
/// are omitted rather than rendered as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLogFormatter;

impl JsonLogFormatter {
    /// Build the JSON value without serialising it.
    pub fn to_value(&self, record: &HttpLogRecord) -> Value {
        let mut doc = Map::new();
        doc.insert("origin".into(), json!(record.origin().as_str()));
        doc.insert("direction".into(), json!(record.direction().as_str()));
        doc.insert("method".into(), json!(record.method().as_str()));
        doc.insert("uri".into(), json!(record.uri()));

        match record.uri().parse::<Uri>() {
            Ok(uri) => {
                if let Some(host) = uri.host() {
                    doc.insert("host".into(), json!(host));
                }
                doc.insert("path".into(), json!(uri.path()));
            }
            Err(_) => {
                let path = record.uri().split('?').next().unwrap_or_default();
                doc.insert("path".into(), json!(path));
            }
        }

        if let Some(ms) = record.duration_ms() {
            doc.insert("duration".into(), json!(format!("{ms}ms")));
        }
        if let Some(status) = record.status_code() {
            doc.insert("statusCode".into(), json!(status));
        }
        if let Some(headers) = record.headers() {
            doc.insert("headers".into(), headers_value(headers));
        }
        if !record.body().is_empty() {
            doc.insert("body".into(), body_value(record.body()));
        }

        Value::Object(doc)
    }
}

impl LogFormatter for JsonLogFormatter {
    fn format(&self, record: &HttpLogRecord) -> Result<String, WiretapError> {
        Ok(serde_json::to_string_pretty(&self.to_value(record))?)
    }
}

fn headers_value(headers: &HeaderList) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, values)| (name.clone(), json!(values)))
        .collect();
    Value::Object(map)
}

/// JSON bodies are embedded structurally, anything else as a plain string.
fn body_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
