use std::time::Instant;

use tracing::{info, warn};

use zimage_provider_core::{
    ApiError, ApiResult, UpstreamClient, UpstreamHttpRequest, UpstreamHttpResponse,
    upstream_error_text,
};

/// Sends one upstream request with request/response log lines. Transport
/// failures come back as `TIMEOUT` or `PROVIDER_ERROR`; any HTTP status is `Ok`.
pub async fn send_logged(
    client: &dyn UpstreamClient,
    provider: &str,
    op: &str,
    req: UpstreamHttpRequest,
) -> ApiResult<UpstreamHttpResponse> {
    let method = req.method.as_str();
    let path = url_path(&req.url).to_string();
    info!(
        event = "upstream_request",
        provider = %provider,
        op = %op,
        method = %method,
        path = %path
    );
    let started_at = Instant::now();
    match client.send(req).await {
        Ok(response) => {
            let elapsed_ms = started_at.elapsed().as_millis();
            if response.is_success() {
                info!(
                    event = "upstream_response",
                    provider = %provider,
                    op = %op,
                    status = response.status,
                    elapsed_ms = elapsed_ms
                );
            } else {
                warn!(
                    event = "upstream_response",
                    provider = %provider,
                    op = %op,
                    status = response.status,
                    elapsed_ms = elapsed_ms
                );
            }
            Ok(response)
        }
        Err(failure) => {
            warn!(
                event = "upstream_failed",
                provider = %provider,
                op = %op,
                elapsed_ms = started_at.elapsed().as_millis(),
                error = %failure
            );
            Err(ApiError::from_transport(provider, &failure))
        }
    }
}

/// Non-2xx → `GENERATION_FAILED` carrying the upstream message and status.
pub fn ensure_success(provider: &str, response: &UpstreamHttpResponse) -> ApiResult<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(
        ApiError::generation_failed(provider, upstream_error_text(&response.body))
            .with_upstream_status(response.status),
    )
}

pub fn decode<T: serde::de::DeserializeOwned>(
    provider: &str,
    response: &UpstreamHttpResponse,
) -> ApiResult<T> {
    response.json::<T>().map_err(|err| {
        ApiError::provider_error(provider, format!("invalid response body: {err}"))
            .with_upstream_status(response.status)
    })
}

pub fn encode_error(provider: &str, err: serde_json::Error) -> ApiError {
    ApiError::provider_error(provider, format!("failed to encode request: {err}"))
}

/// Path portion of a URL, for logs (query strings may carry secrets).
fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/");
    path.split('?').next().unwrap_or(path)
}
