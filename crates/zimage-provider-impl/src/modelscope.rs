use std::sync::Arc;

use tracing::debug;

use zimage_protocol::modelscope::{
    ASYNC_MODE_HEADER, ModelScopeSubmitRequest, ModelScopeSubmitResponse, ModelScopeTask,
    TASK_TYPE_HEADER, TASK_TYPE_IMAGE, TaskPhase,
};
use zimage_provider_core::{
    ApiError, ApiResult, GenerationRequest, GenerationResult, ImageProviderId, UpstreamClient,
    UpstreamHttpRequest,
};

use crate::adapter::{ImageAdapter, SeedSource, seed_for};
use crate::settings::PollingConfig;
use crate::upstream::{decode, encode_error, ensure_success, send_logged};

/// ModelScope async inference: submit with the async-mode header, then poll
/// `tasks/{id}` until `SUCCEED`/`FAILED` or the attempt budget runs out.
///
/// Dropping the returned future stops polling; the remote task is left alone.
#[derive(Clone)]
pub struct ModelScopeAdapter {
    client: Arc<dyn UpstreamClient>,
    base_url: String,
    polling: PollingConfig,
    seeds: Arc<dyn SeedSource>,
}

impl ModelScopeAdapter {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        base_url: impl Into<String>,
        polling: PollingConfig,
        seeds: Arc<dyn SeedSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            polling,
            seeds,
        }
    }

    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        token: &str,
        seed: u64,
    ) -> ApiResult<String> {
        let descriptor = ImageProviderId::ModelScope.descriptor();
        let name = descriptor.name;
        let body = ModelScopeSubmitRequest {
            model: descriptor.upstream_model(&request.model),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt().map(str::to_string),
            size: format!("{}x{}", request.width, request.height),
            steps: Some(request.steps_or_default()),
            seed,
            guidance: request.guidance_scale,
            loras: request.loras.clone(),
        };
        let upstream_req =
            UpstreamHttpRequest::post_json(format!("{}/images/generations", self.base_url), &body)
                .map_err(|err| encode_error(name, err))?
                .bearer(Some(token))
                .header(ASYNC_MODE_HEADER, "true");

        let response = send_logged(self.client.as_ref(), name, "images.submit", upstream_req).await?;
        ensure_success(name, &response)?;
        let submitted: ModelScopeSubmitResponse = decode(name, &response)?;
        submitted
            .task_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::generation_failed(name, "No task id returned"))
    }

    async fn poll_once(&self, task_id: &str, token: &str) -> ApiResult<ModelScopeTask> {
        let name = ImageProviderId::ModelScope.descriptor().name;
        let upstream_req = UpstreamHttpRequest::get(format!("{}/tasks/{task_id}", self.base_url))
            .bearer(Some(token))
            .header(TASK_TYPE_HEADER, TASK_TYPE_IMAGE);
        let response = send_logged(self.client.as_ref(), name, "images.poll", upstream_req).await?;
        ensure_success(name, &response)?;
        decode(name, &response)
    }
}

#[async_trait::async_trait]
impl ImageAdapter for ModelScopeAdapter {
    fn provider(&self) -> ImageProviderId {
        ImageProviderId::ModelScope
    }

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<GenerationResult> {
        let descriptor = ImageProviderId::ModelScope.descriptor();
        let name = descriptor.name;
        let token = descriptor
            .auth
            .check(name, request.auth_token.as_deref())?
            .ok_or_else(|| ApiError::auth_required(name))?;
        let seed = seed_for(request, self.seeds.as_ref());

        let task_id = self.submit(request, token, seed).await?;

        for attempt in 1..=self.polling.max_attempts {
            tokio::time::sleep(self.polling.interval).await;
            let task = self.poll_once(&task_id, token).await?;
            match task.phase() {
                TaskPhase::Succeeded => {
                    let url = task
                        .first_image()
                        .ok_or_else(|| ApiError::generation_failed(name, "No image returned"))?;
                    return Ok(GenerationResult {
                        url: url.to_string(),
                        seed,
                    });
                }
                TaskPhase::Failed => {
                    let message = task
                        .error_message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| "Task failed".to_string());
                    return Err(ApiError::generation_failed(name, message));
                }
                TaskPhase::Running => {
                    debug!(
                        event = "upstream_poll",
                        provider = %name,
                        task_id = %task_id,
                        attempt = attempt,
                        status = %task.task_status.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Err(ApiError::timeout(name))
    }
}
