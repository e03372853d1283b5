use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};

/// Which side of an exchange a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the exchange was received (server) or initiated (client).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Server,
    Client,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Server => "server",
            Origin::Client => "client",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered header snapshot: name → all values, in first-seen order.
pub type HeaderList = Vec<(String, Vec<String>)>;

/// Snapshot an `http::HeaderMap` into an ordered [`HeaderList`].
///
/// Repeated header names are grouped under their first occurrence. Values that
/// are not valid UTF-8 are rendered lossily.
pub fn capture_headers(headers: &HeaderMap) -> HeaderList {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), values)
        })
        .collect()
}

/// Immutable snapshot of one side of an HTTP exchange.
///
/// Built only through [`HttpLogRecord::request`] and [`HttpLogRecord::response`]:
/// request records never carry a status or duration, response records always do.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpLogRecord {
    direction: Direction,
    origin: Origin,
    method: Method,
    uri: String,
    status_code: Option<u16>,
    headers: Option<HeaderList>,
    body: String,
    duration_ms: Option<u64>,
}

impl HttpLogRecord {
    pub fn request(
        origin: Origin,
        method: Method,
        uri: String,
        headers: Option<HeaderList>,
        body: String,
    ) -> Self {
        Self {
            direction: Direction::Request,
            origin,
            method,
            uri,
            status_code: None,
            headers,
            body,
            duration_ms: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn response(
        origin: Origin,
        method: Method,
        uri: String,
        status_code: u16,
        headers: Option<HeaderList>,
        body: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            direction: Direction::Response,
            origin,
            method,
            uri,
            status_code: Some(status_code),
            headers,
            body,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URI after query-parameter redaction.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn headers(&self) -> Option<&HeaderList> {
        self.headers.as_ref()
    }

    /// Body after redaction; empty when body capture is off or the body was empty.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn request_record_has_no_status_or_duration() {
        let rec = HttpLogRecord::request(
            Origin::Server,
            Method::POST,
            "/login".into(),
            None,
            "{}".into(),
        );
        assert_eq!(rec.direction(), Direction::Request);
        assert!(rec.status_code().is_none());
        assert!(rec.duration_ms().is_none());
    }

    #[test]
    fn response_record_always_has_status_and_duration() {
        let rec = HttpLogRecord::response(
            Origin::Client,
            Method::GET,
            "http://h/p".into(),
            204,
            None,
            String::new(),
            0,
        );
        assert_eq!(rec.direction(), Direction::Response);
        assert_eq!(rec.status_code(), Some(204));
        assert_eq!(rec.duration_ms(), Some(0));
    }

    #[test]
    fn capture_headers_groups_repeated_names_in_order() {
        let mut map = HeaderMap::new();
        map.append("content-type", HeaderValue::from_static("application/json"));
        map.append("x-trace", HeaderValue::from_static("a"));
        map.append("x-trace", HeaderValue::from_static("b"));

        let list = capture_headers(&map);
        assert_eq!(
            list,
            vec![
                ("content-type".to_string(), vec!["application/json".to_string()]),
                ("x-trace".to_string(), vec!["a".to_string(), "b".to_string()]),
            ]
        );
    }

    #[test]
    fn capture_headers_renders_non_utf8_lossily() {
        let mut map = HeaderMap::new();
        map.insert("x-bin", HeaderValue::from_bytes(&[0x66, 0xff, 0x6f]).unwrap());
        let list = capture_headers(&map);
        assert_eq!(list[0].1[0], "f\u{fffd}o");
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Origin::Server).unwrap(), "\"server\"");
        assert_eq!(serde_json::to_string(&Direction::Response).unwrap(), "\"response\"");
    }
}
