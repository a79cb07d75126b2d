//! Request metrics keyed by the matched route template

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use pedidos_common::metrics::RequestMetrics;

/// Record count and latency of every routed request.
/// Installed with `route_layer`; requests without a matched route pass through unrecorded.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    // templates keep the label set bounded (`/item/{id}/`, not `/item/17/`)
    let Some(route) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
    else {
        return next.run(request).await;
    };

    let metrics = RequestMetrics::start(request.method().as_str(), &route);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
