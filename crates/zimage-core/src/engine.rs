use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use time::OffsetDateTime;

use zimage_common::GlobalConfig;
use zimage_protocol::openai::{
    ChatCompletionChoice, ChatCompletionObjectType, ChatCompletionRequest,
    ChatCompletionResponse, ChatFinishReason, ChatMessage, ChatRole, ImageData,
    ImageGenerationRequest, ImagesResponse, ListModelsResponse, ListObjectType, Model,
    ModelObjectType,
};
use zimage_provider_core::request::{DEFAULT_DIMENSION, parse_size};
use zimage_provider_core::{
    ApiError, ApiResult, GenerationRequest, GenerationResult, ImageProviderId, LlmProviderId,
    ProviderPrefix, UpstreamClient,
};
use zimage_provider_impl::{
    ChatAdapter, ChatInput, ProviderRegistry, ProviderSettings, RandomSeed, SeedSource,
};

use crate::credential::{BearerCredential, parse_bearer};
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::model_id::{CHAT_MODEL_DEFAULT, IMAGE_MODEL_DEFAULT, resolve_model_id};

/// Deadlines applied around whole operations, on top of the transport ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub generation_timeout: Duration,
    pub chat_timeout: Duration,
    pub translate_timeout: Duration,
}

impl EngineConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        let chat_timeout = Duration::from_secs(global.chat_timeout_secs);
        Self {
            generation_timeout: Duration::from_secs(global.generation_timeout_secs),
            chat_timeout,
            translate_timeout: chat_timeout.min(Duration::from_secs(30)),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_global(&GlobalConfig::default())
    }
}

/// Image bytes fetched by `/api/proxy-image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedImage {
    pub content_type: String,
    pub body: Bytes,
}

/// Entry point for both HTTP surfaces. Stateless apart from the shared
/// adapters, so one instance serves all requests concurrently.
#[derive(Clone)]
pub struct ZImageEngine {
    pub(crate) registry: ProviderRegistry,
    pub(crate) client: Arc<dyn UpstreamClient>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) config: EngineConfig,
}

impl ZImageEngine {
    pub fn new(client: Arc<dyn UpstreamClient>, settings: ProviderSettings, config: EngineConfig) -> Self {
        Self::with_sources(
            client,
            settings,
            config,
            Arc::new(RandomSeed),
            Arc::new(RandomIdGenerator),
        )
    }

    /// Same as [`ZImageEngine::new`] with explicit seed and id sources.
    pub fn with_sources(
        client: Arc<dyn UpstreamClient>,
        settings: ProviderSettings,
        config: EngineConfig,
        seeds: Arc<dyn SeedSource>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            registry: ProviderRegistry::with_seed_source(client.clone(), settings, seeds),
            client,
            ids,
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// `POST /v1/images/generations`
    pub async fn images_generations(
        &self,
        authorization: Option<&str>,
        request: ImageGenerationRequest,
    ) -> ApiResult<ImagesResponse> {
        if let Some(n) = request.n
            && n != 1
        {
            return Err(ApiError::invalid_params("n", "Only n=1 is supported"));
        }
        let (width, height) = match request.size.as_deref() {
            Some(size) => parse_size(size)?,
            None => (DEFAULT_DIMENSION, DEFAULT_DIMENSION),
        };

        let resolved = resolve_model_id(request.model.as_deref().unwrap_or(""), IMAGE_MODEL_DEFAULT);
        let provider = ImageProviderId::from_prefix(resolved.prefix).ok_or_else(|| {
            ApiError::invalid_params(
                "model",
                format!(
                    "Model {} has no image provider",
                    request.model.as_deref().unwrap_or_default()
                ),
            )
        })?;
        let credential = parse_bearer(authorization);
        ensure_hint_matches(&credential, provider.prefix())?;

        let model = if resolved.model.is_empty() {
            provider.descriptor().default_model.to_string()
        } else {
            resolved.model
        };
        let steps = request.effective_steps();
        let guidance_scale = request.effective_guidance();
        let mut generation = GenerationRequest::new(provider, model, request.prompt);
        generation.negative_prompt = request.negative_prompt;
        generation.width = width;
        generation.height = height;
        generation.steps = steps;
        generation.seed = request.seed;
        generation.guidance_scale = guidance_scale;
        generation.auth_token = credential.token;
        generation.validate()?;

        tracing::debug!(
            event = "model_resolved",
            surface = "images",
            provider = provider.as_str(),
            model = %generation.model
        );
        let result = self.generate_image(&generation).await?;
        Ok(ImagesResponse {
            created: now_unix(),
            data: vec![ImageData {
                url: result.url,
                revised_prompt: None,
            }],
        })
    }

    pub(crate) async fn generate_image(&self, request: &GenerationRequest) -> ApiResult<GenerationResult> {
        let provider = self.registry.image(request.provider);
        within(
            self.config.generation_timeout,
            provider.id().descriptor().name,
            provider.generate(request),
        )
        .await
    }

    /// `POST /v1/chat/completions`
    pub async fn chat_completions(
        &self,
        authorization: Option<&str>,
        request: ChatCompletionRequest,
    ) -> ApiResult<ChatCompletionResponse> {
        let requested_model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .ok_or_else(|| ApiError::invalid_params("model", "model is required"))?
            .to_string();
        if request.messages.is_empty() {
            return Err(ApiError::invalid_params("messages", "messages is required"));
        }

        let system = join_contents(&request.messages, ChatRole::System);
        let user = join_contents(&request.messages, ChatRole::User);
        if user.is_empty() {
            return Err(ApiError::invalid_params(
                "messages",
                "At least one user message is required",
            ));
        }

        let resolved = resolve_model_id(&requested_model, CHAT_MODEL_DEFAULT);
        let provider = LlmProviderId::from_prefix(resolved.prefix);
        let credential = parse_bearer(authorization);
        ensure_hint_matches(&credential, provider.prefix())?;

        let input = ChatInput {
            model: resolved.model,
            system: (!system.is_empty()).then_some(system),
            user,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let model = ChatAdapter::effective_model(provider, &input);
        tracing::debug!(
            event = "model_resolved",
            surface = "chat",
            provider = provider.as_str(),
            model = %model
        );
        let content = self
            .complete_chat(provider, credential.token.as_deref(), &input, self.config.chat_timeout)
            .await?;

        Ok(ChatCompletionResponse {
            id: self.ids.completion_id(),
            object: ChatCompletionObjectType::ChatCompletion,
            created: now_unix(),
            model,
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage::new(ChatRole::Assistant, content),
                finish_reason: Some(ChatFinishReason::Stop),
            }],
        })
    }

    pub(crate) async fn complete_chat(
        &self,
        provider: LlmProviderId,
        token: Option<&str>,
        input: &ChatInput,
        limit: Duration,
    ) -> ApiResult<String> {
        within(
            limit,
            provider.descriptor().name,
            self.registry.chat().complete(provider, token, input),
        )
        .await
    }

    /// `GET /v1/models`
    pub fn list_models(&self) -> ListModelsResponse {
        let created = now_unix();
        let model = |id: String, owned_by: &str| Model {
            id,
            object: ModelObjectType::Model,
            created,
            owned_by: owned_by.to_string(),
        };

        let mut data = Vec::new();
        for provider in ImageProviderId::ALL {
            let descriptor = provider.descriptor();
            let prefix = match provider {
                ImageProviderId::HuggingFace => "",
                _ => provider.prefix().model_prefix(),
            };
            for spec in descriptor.models {
                data.push(model(format!("{prefix}{}", spec.id), descriptor.id));
            }
        }
        for provider in LlmProviderId::ALL {
            let descriptor = provider.descriptor();
            let prefix = provider.prefix().model_prefix();
            for id in descriptor.models {
                data.push(model(format!("{prefix}{id}"), descriptor.id));
            }
        }

        ListModelsResponse {
            object: ListObjectType::List,
            data,
        }
    }

    /// Fetches an image from an allowed host for same-origin download.
    pub async fn proxy_image(&self, url: &str) -> ApiResult<ProxiedImage> {
        crate::native::proxy_image(self.client.as_ref(), url).await
    }
}

/// A `gitee:` token must not be spent on a `ms/` model and so on.
fn ensure_hint_matches(credential: &BearerCredential, expected: ProviderPrefix) -> ApiResult<()> {
    match credential.provider_hint {
        Some(hint) if hint != expected => Err(ApiError::invalid_params(
            "Authorization",
            "Token prefix does not match requested model provider",
        )),
        _ => Ok(()),
    }
}

/// Non-blank contents of one role, newline-joined and trimmed.
fn join_contents(messages: &[ChatMessage], role: ChatRole) -> String {
    messages
        .iter()
        .filter(|message| message.role == role)
        .map(|message| message.content.trim())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) async fn within<T>(
    limit: Duration,
    provider: &str,
    fut: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    let started = Instant::now();
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                event = "deadline_exceeded",
                provider = provider,
                elapsed_ms = started.elapsed().as_millis() as u64
            );
            Err(ApiError::timeout(provider))
        }
    }
}

pub(crate) fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
