use crate::exchange::Exchange;
use crate::tee::TeeBody;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use http_body::Body;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use wiretap_core::record::Origin;
use wiretap_observability::HttpLogger;

/// Adds client-side HTTP logging to an outbound service.
#[derive(Debug, Clone)]
pub struct OutboundLoggingLayer {
    logger: HttpLogger,
}

impl OutboundLoggingLayer {
    pub fn new(logger: HttpLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for OutboundLoggingLayer {
    type Service = OutboundLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        OutboundLogging::new(inner, self.logger.clone())
    }
}

/// Logging wrapper around a client service.
///
/// The request body reaches `S` through a [`TeeBody`]; the request record is
/// emitted once `S` has read it all. The response body is handed back to the
/// caller through another tee, so the response record is emitted when the
/// caller finishes reading it. Errors from `S` are returned untouched.
#[derive(Debug, Clone)]
pub struct OutboundLogging<S> {
    inner: S,
    logger: HttpLogger,
}

impl<S> OutboundLogging<S> {
    pub fn new(inner: S, logger: HttpLogger) -> Self {
        Self { inner, logger }
    }
}

impl<S, B, R> Service<Request<B>> for OutboundLogging<S>
where
    S: Service<Request<TeeBody<B>>, Response = Response<R>>,
    S::Future: Send + 'static,
    B: Body<Data = Bytes>,
    R: Body<Data = Bytes> + Send + 'static,
{
    type Response = Response<TeeBody<R>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        if !self.logger.should_log(request.method(), request.uri().path()) {
            let fut = self.inner.call(request.map(TeeBody::passthrough));
            return Box::pin(async move { Ok(fut.await?.map(TeeBody::passthrough)) });
        }

        let (parts, body) = request.into_parts();
        let exchange = Exchange::begin(self.logger.clone(), Origin::Client, &parts);
        let body = exchange.tee_request(body);
        let fut = self.inner.call(Request::from_parts(parts, body));

        Box::pin(async move {
            let (parts, body) = fut.await?.into_parts();
            let body = exchange.tee_response(&parts, body);
            Ok(Response::from_parts(parts, body))
        })
    }
}
