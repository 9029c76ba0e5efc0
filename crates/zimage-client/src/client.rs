use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use zimage_protocol::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ImageGenerationRequest, ImagesResponse,
    ListModelsResponse,
};
use zimage_provider_core::{ImageProviderId, UpstreamClient, UpstreamHttpRequest};

use crate::error::ClientError;
use crate::prefix::{full_image_model_id, image_token_with_prefix};
use crate::rotation::{
    CredentialPool, DefaultQuotaClassifier, ExhaustedSet, RotationError, select_and_invoke,
};

/// Calls the OpenAI-compatible surface of a zimage server.
///
/// Tokens passed in are sent verbatim as the bearer, so they should already
/// carry their provider prefix (see [`crate::prefix`]).
#[derive(Clone)]
pub struct OpenAIClient {
    base_url: String,
    http: Arc<dyn UpstreamClient>,
}

impl OpenAIClient {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn UpstreamClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate_image(
        &self,
        token: Option<&str>,
        request: &ImageGenerationRequest,
    ) -> Result<ImagesResponse, ClientError> {
        self.post("/v1/images/generations", token, request).await
    }

    pub async fn chat_completions(
        &self,
        token: Option<&str>,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ClientError> {
        self.post("/v1/chat/completions", token, request).await
    }

    pub async fn list_models(&self) -> Result<ListModelsResponse, ClientError> {
        self.send(UpstreamHttpRequest::get(self.url("/v1/models"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, T>(&self, path: &str, token: Option<&str>, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = UpstreamHttpRequest::post_json(self.url(path), body)
            .map_err(|err| ClientError::decode(&err))?
            .bearer(token);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: UpstreamHttpRequest) -> Result<T, ClientError> {
        let response = self
            .http
            .send(request)
            .await
            .map_err(|failure| ClientError::transport(&failure))?;
        if !response.is_success() {
            return Err(ClientError::from_response(response.status, &response.body));
        }
        response.json().map_err(|err| ClientError::decode(&err))
    }
}

/// Generates one image for `provider`, rotating through `pool`.
///
/// `request.model` is the provider-local model id (or `None` for the
/// provider default); the prefixed id and bearer are derived from `provider`.
pub async fn generate_image_with_rotation(
    client: &OpenAIClient,
    provider: ImageProviderId,
    pool: &CredentialPool,
    exhausted: &mut ExhaustedSet,
    max_attempts: u32,
    request: &ImageGenerationRequest,
) -> Result<ImagesResponse, RotationError> {
    let descriptor = provider.descriptor();
    let mut request = request.clone();
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(descriptor.default_model)
        .to_string();
    request.model = Some(full_image_model_id(provider, &model));
    let request = &request;

    select_and_invoke(
        descriptor.auth.required,
        pool,
        exhausted,
        max_attempts,
        &DefaultQuotaClassifier,
        |token| async move {
            let bearer = token.map(|token| image_token_with_prefix(provider, &token));
            client.generate_image(bearer.as_deref(), request).await
        },
    )
    .await
}
