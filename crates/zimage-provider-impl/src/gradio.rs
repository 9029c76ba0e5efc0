use std::sync::Arc;

use serde_json::Value;

use zimage_protocol::gradio::{self, GradioCallRequest, GradioCallResponse};
use zimage_protocol::sse::{TerminalEvent, scan_terminal};
use zimage_provider_core::{ApiError, ApiResult, UpstreamClient, UpstreamHttpRequest};

use crate::upstream::{decode, encode_error, ensure_success, send_logged};

/// Two-phase Gradio call: queue the positional `data`, then read the SSE result
/// body until the first terminal event. No retries; any failure is terminal.
#[derive(Clone)]
pub struct GradioClient {
    client: Arc<dyn UpstreamClient>,
}

impl GradioClient {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }

    /// Returns the JSON payload of the `complete` event.
    pub async fn call(
        &self,
        provider: &str,
        space: &str,
        function: &str,
        data: Vec<Value>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        let queue_req =
            UpstreamHttpRequest::post_json(gradio::call_url(space, function), &GradioCallRequest { data })
                .map_err(|err| encode_error(provider, err))?
                .bearer(token);
        let response = send_logged(self.client.as_ref(), provider, "gradio.queue", queue_req).await?;
        ensure_success(provider, &response)?;
        let queued: GradioCallResponse = decode(provider, &response)?;
        let event_id = queued
            .event_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::generation_failed(provider, "No event id returned"))?;

        let result_req =
            UpstreamHttpRequest::get(gradio::result_url(space, function, &event_id)).bearer(token);
        let response = send_logged(self.client.as_ref(), provider, "gradio.result", result_req).await?;
        ensure_success(provider, &response)?;

        match scan_terminal(&response.text()) {
            Some(TerminalEvent::Complete(payload)) => Ok(payload),
            Some(TerminalEvent::Error(message)) => Err(ApiError::generation_failed(
                provider,
                message.unwrap_or_else(|| "Gradio job failed".to_string()),
            )),
            None => Err(ApiError::generation_failed(
                provider,
                "Result stream ended without a complete event",
            )),
        }
    }
}
