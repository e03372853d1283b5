//! HTTP traffic logging for axum servers and outbound clients.
//!
//! Inbound: [`inbound::with_http_logging`] wraps a `Router`. Outbound:
//! [`OutboundLoggingLayer`] wraps any client `Service`, and [`LoggingClient`]
//! is that layer over `reqwest`. Both stream bodies through a [`TeeBody`]
//! and log a request record followed by a response record per exchange.

mod exchange;
pub mod inbound;
pub mod outbound;
pub mod tee;
pub mod transport;

pub use inbound::{log_http_exchange, with_http_logging};
pub use outbound::{OutboundLogging, OutboundLoggingLayer};
pub use tee::TeeBody;
pub use transport::{LoggingClient, ReqwestTransport, TransportError};
