use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, info};

pub const REQUEST_ID_HEADER: &str = "x-zimage-request-id";

/// Gives every request a v7 trace id: log lines emitted while handling it
/// carry the id through the span, and the response echoes it back.
pub(crate) async fn trace_requests(req: Request<Body>, next: Next) -> Response {
    let trace_id = uuid::Uuid::now_v7().to_string();
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let has_authorization = req.headers().contains_key(header::AUTHORIZATION);
    let span = tracing::info_span!("request", trace_id = %trace_id);

    let mut response = async move {
        info!(
            event = "downstream_received",
            method = %method,
            path = %path,
            has_authorization
        );
        let started_at = Instant::now();
        let response = next.run(req).await;
        info!(
            event = "downstream_responded",
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = started_at.elapsed().as_millis() as u64
        );
        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
