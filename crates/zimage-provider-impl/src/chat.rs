use std::sync::Arc;

use zimage_protocol::openai::{ChatCompletionRequest, ChatMessage, ChatRole, UpstreamChatCompletion};
use zimage_provider_core::{ApiError, ApiResult, LlmProviderId, UpstreamClient, UpstreamHttpRequest};

use crate::settings::ProviderSettings;
use crate::upstream::{decode, encode_error, ensure_success, send_logged};

/// Already-flattened chat turn: one optional system prompt, one user prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatInput {
    /// Bare model id; empty selects the provider default.
    pub model: String,
    pub system: Option<String>,
    pub user: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Every chat backend speaks OpenAI chat completions, so one adapter serves them
/// all; only the endpoint, auth policy and default model differ.
#[derive(Clone)]
pub struct ChatAdapter {
    client: Arc<dyn UpstreamClient>,
    settings: Arc<ProviderSettings>,
}

impl ChatAdapter {
    pub fn new(client: Arc<dyn UpstreamClient>, settings: Arc<ProviderSettings>) -> Self {
        Self { client, settings }
    }

    /// Model that will actually be sent for `input` on `provider`.
    pub fn effective_model(provider: LlmProviderId, input: &ChatInput) -> String {
        let model = input.model.trim();
        if model.is_empty() {
            provider.descriptor().default_model.to_string()
        } else {
            model.to_string()
        }
    }

    pub async fn complete(
        &self,
        provider: LlmProviderId,
        token: Option<&str>,
        input: &ChatInput,
    ) -> ApiResult<String> {
        let descriptor = provider.descriptor();
        let name = descriptor.name;
        let token = descriptor.auth.check(name, token)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = input.system.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage::new(ChatRole::System, system));
        }
        messages.push(ChatMessage::new(ChatRole::User, input.user.as_str()));
        let body = ChatCompletionRequest {
            model: Some(Self::effective_model(provider, input)),
            messages,
            temperature: input.temperature,
            max_tokens: input.max_tokens,
        };

        let upstream_req =
            UpstreamHttpRequest::post_json(self.settings.chat_endpoint(provider), &body)
                .map_err(|err| encode_error(name, err))?
                .bearer(token);
        let response = send_logged(self.client.as_ref(), name, "chat.complete", upstream_req).await?;
        ensure_success(name, &response)?;

        let completion: UpstreamChatCompletion = decode(name, &response)?;
        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| ApiError::generation_failed(name, "Empty response from model"))
    }
}
