use std::sync::Mutex;
use tracing::info;
use wiretap_core::record::{Direction, HttpLogRecord};

/// Destination for rendered records.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &HttpLogRecord, rendered: &str);
}

/// Writes each record as an `info` event on the `wiretap::http` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, record: &HttpLogRecord, rendered: &str) {
        match record.direction() {
            Direction::Request => info!(
                target: "wiretap::http",
                origin = %record.origin(),
                direction = %record.direction(),
                "HTTP Request: {}",
                rendered
            ),
            Direction::Response => info!(
                target: "wiretap::http",
                origin = %record.origin(),
                direction = %record.direction(),
                status = record.status_code(),
                duration_ms = record.duration_ms(),
                "HTTP Response: {}",
                rendered
            ),
        }
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(HttpLogRecord, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<HttpLogRecord> {
        self.lock().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.lock().iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(HttpLogRecord, String)>> {
        // A panicking writer must not poison later inspection.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn write(&self, record: &HttpLogRecord, rendered: &str) {
        self.lock().push((record.clone(), rendered.to_string()));
    }
}
