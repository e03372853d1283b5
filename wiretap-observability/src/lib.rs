//! Masking, formatting and emission of captured HTTP exchanges.

pub mod formatter;
pub mod logger;
pub mod obfuscator;
pub mod sink;
pub mod telemetry;

pub use formatter::{JsonLogFormatter, LogFormatter};
pub use logger::HttpLogger;
pub use sink::{LogSink, MemorySink, TracingSink};
