use crate::outbound::{OutboundLogging, OutboundLoggingLayer};
use crate::tee::TeeBody;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use std::task::{Context, Poll};
use thiserror::Error;
use tower::{BoxError, Layer, Service, ServiceExt};
use tracing::debug;
use wiretap_core::config::ClientConfig;
use wiretap_observability::HttpLogger;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] BoxError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// `http::Request` → `reqwest` adapter.
///
/// The request body is collected before sending; the response body streams.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl<B> Service<Request<B>> for ReqwestTransport
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response<reqwest::Body>;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|e| TransportError::RequestBody(e.into()))?
                .to_bytes();
            let request = reqwest::Request::try_from(Request::from_parts(parts, bytes))?;
            debug!(method = %request.method(), url = %request.url(), "Sending outbound request");
            let response = client.execute(request).await?;
            Ok(Response::from(response))
        })
    }
}

/// HTTP client that logs every call it makes.
#[derive(Debug, Clone)]
pub struct LoggingClient {
    service: OutboundLogging<ReqwestTransport>,
}

impl LoggingClient {
    pub fn new(config: &ClientConfig, logger: HttpLogger) -> Result<Self, TransportError> {
        Ok(Self::with_transport(ReqwestTransport::new(config)?, logger))
    }

    pub fn with_transport(transport: ReqwestTransport, logger: HttpLogger) -> Self {
        Self {
            service: OutboundLoggingLayer::new(logger).layer(transport),
        }
    }

    /// Send `request`. Read the returned body to completion to get the
    /// response record logged.
    pub async fn send<B>(
        &self,
        request: Request<B>,
    ) -> Result<Response<TeeBody<reqwest::Body>>, TransportError>
    where
        B: Body<Data = Bytes> + Unpin + Send + 'static,
        B::Error: Into<BoxError>,
    {
        self.service.clone().oneshot(request).await
    }
}
