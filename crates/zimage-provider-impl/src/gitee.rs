use std::sync::Arc;

use zimage_protocol::gitee::{GiteeImageRequest, GiteeImageResponse};
use zimage_provider_core::{
    ApiError, ApiResult, GenerationRequest, GenerationResult, ImageProviderId, UpstreamClient,
    UpstreamHttpRequest,
};

use crate::adapter::{ImageAdapter, SeedSource, seed_for};
use crate::upstream::{decode, encode_error, ensure_success, send_logged};

/// Gitee AI image generation: one POST, URL in `data[0].url`.
#[derive(Clone)]
pub struct GiteeAdapter {
    client: Arc<dyn UpstreamClient>,
    base_url: String,
    seeds: Arc<dyn SeedSource>,
}

impl GiteeAdapter {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        base_url: impl Into<String>,
        seeds: Arc<dyn SeedSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            seeds,
        }
    }

    pub fn build_request(
        &self,
        request: &GenerationRequest,
        token: &str,
        seed: u64,
    ) -> ApiResult<UpstreamHttpRequest> {
        let descriptor = ImageProviderId::Gitee.descriptor();
        let body = GiteeImageRequest {
            prompt: request.prompt.clone(),
            model: descriptor.upstream_model(&request.model),
            width: request.width,
            height: request.height,
            num_inference_steps: request.steps_or_default(),
            negative_prompt: request.negative_prompt().map(str::to_string),
            seed,
            guidance_scale: request.guidance_scale,
            response_format: "url".to_string(),
        };
        let url = format!("{}/images/generations", self.base_url);
        Ok(UpstreamHttpRequest::post_json(url, &body)
            .map_err(|err| encode_error(descriptor.name, err))?
            .bearer(Some(token)))
    }
}

#[async_trait::async_trait]
impl ImageAdapter for GiteeAdapter {
    fn provider(&self) -> ImageProviderId {
        ImageProviderId::Gitee
    }

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<GenerationResult> {
        let descriptor = ImageProviderId::Gitee.descriptor();
        let name = descriptor.name;
        let token = descriptor
            .auth
            .check(name, request.auth_token.as_deref())?
            .ok_or_else(|| ApiError::auth_required(name))?;
        let seed = seed_for(request, self.seeds.as_ref());

        let upstream_req = self.build_request(request, token, seed)?;
        let response = send_logged(self.client.as_ref(), name, "images.generate", upstream_req).await?;
        ensure_success(name, &response)?;

        let body: GiteeImageResponse = decode(name, &response)?;
        let url = body
            .first_url()
            .ok_or_else(|| ApiError::generation_failed(name, "No image returned"))?;
        Ok(GenerationResult {
            url: url.to_string(),
            seed,
        })
    }
}
