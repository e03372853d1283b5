use crate::exchange::Exchange;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::trace;
use wiretap_core::record::Origin;
use wiretap_observability::HttpLogger;

/// Server-side HTTP logging middleware.
///
/// Use with [`axum::middleware::from_fn_with_state`], or attach it to a whole
/// router with [`with_http_logging`]. Excluded routes and `none` verbosity
/// skip all capture work.
pub async fn log_http_exchange(
    State(logger): State<HttpLogger>,
    request: Request,
    next: Next,
) -> Response {
    if !logger.should_log(request.method(), request.uri().path()) {
        trace!(method = %request.method(), path = request.uri().path(), "HTTP logging skipped");
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let exchange = Exchange::begin(logger, Origin::Server, &parts);
    let body = Body::new(exchange.tee_request(body));

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let body = Body::new(exchange.tee_response(&parts, body));
    Response::from_parts(parts, body)
}

/// Wrap every route of `router` with [`log_http_exchange`].
pub fn with_http_logging<S>(router: Router<S>, logger: HttpLogger) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(logger, log_http_exchange))
}
