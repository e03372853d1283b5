use crate::tee::TeeBody;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, StatusCode, request, response};
use http_body::Body;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use wiretap_core::record::{HeaderList, HttpLogRecord, Origin};
use wiretap_observability::HttpLogger;

/// Per-exchange capture state shared by the request and response tees.
///
/// Guarantees one request record followed by one response record.
pub(crate) struct Exchange {
    logger: HttpLogger,
    origin: Origin,
    method: Method,
    uri: String,
    request_headers: Option<HeaderList>,
    started: Instant,
    request_logged: AtomicBool,
}

impl Exchange {
    /// Starts the clock.
    pub(crate) fn begin(logger: HttpLogger, origin: Origin, parts: &request::Parts) -> Arc<Self> {
        Arc::new(Self {
            origin,
            method: parts.method.clone(),
            uri: logger.mask_uri(&parts.uri),
            request_headers: logger.capture_headers(&parts.headers),
            started: Instant::now(),
            request_logged: AtomicBool::new(false),
            logger,
        })
    }

    pub(crate) fn tee_request<B>(self: &Arc<Self>, body: B) -> TeeBody<B>
    where
        B: Body<Data = Bytes>,
    {
        if !self.logger.verbosity().captures_body() {
            self.log_request(&[]);
            return TeeBody::passthrough(body);
        }
        let exchange = Arc::clone(self);
        TeeBody::new(body, move |bytes| exchange.log_request(&bytes))
    }

    pub(crate) fn tee_response<B>(self: &Arc<Self>, parts: &response::Parts, body: B) -> TeeBody<B>
    where
        B: Body<Data = Bytes>,
    {
        // A request body nobody finished reading is logged empty.
        self.log_request(&[]);

        let status = parts.status;
        let headers = self.logger.capture_headers(&parts.headers);
        if !self.logger.verbosity().captures_body()
            || !carries_body(&self.method, status)
            || !declares_body(&parts.headers, &body)
        {
            self.log_response(status, headers, &[]);
            return TeeBody::passthrough(body);
        }
        let exchange = Arc::clone(self);
        TeeBody::new(body, move |bytes| exchange.log_response(status, headers, &bytes))
    }

    fn log_request(&self, body: &[u8]) {
        if self.request_logged.swap(true, Ordering::AcqRel) {
            return;
        }
        self.logger.emit(HttpLogRecord::request(
            self.origin,
            self.method.clone(),
            self.uri.clone(),
            self.request_headers.clone(),
            self.logger.render_body(body),
        ));
    }

    fn log_response(&self, status: StatusCode, headers: Option<HeaderList>, body: &[u8]) {
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.logger.emit(HttpLogRecord::response(
            self.origin,
            self.method.clone(),
            self.uri.clone(),
            status.as_u16(),
            headers,
            self.logger.render_body(body),
            duration_ms,
        ));
    }
}

/// HEAD responses and 1xx/204/304 statuses never put a body on the wire,
/// whatever the handler produced.
pub(crate) fn carries_body(method: &Method, status: StatusCode) -> bool {
    !(*method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Positive `content-length`, chunked transfer, or (without a length) a
/// body not already known to be empty.
pub(crate) fn declares_body<B: Body>(headers: &HeaderMap, body: &B) -> bool {
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(len) = content_length {
        return len > 0;
    }
    let chunked = headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("chunked"));
    chunked || !(body.is_end_stream() || body.size_hint().exact() == Some(0))
}
