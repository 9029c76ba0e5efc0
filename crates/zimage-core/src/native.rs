//! Operations behind the native `/api` routes. Provider tokens arrive in each
//! provider's own header (`X-API-Key`, `X-HF-Token`, ...) rather than as a
//! prefixed bearer.

use std::time::Instant;

use time::format_description::well_known::Rfc3339;

use zimage_protocol::native::{
    GenerateRequest, GenerateResponse, HealthResponse, ImageDetails, LlmProviderInfo,
    LlmProvidersResponse, ModelInfo, ModelsResponse, OptimizeRequest, OptimizeResponse,
    ProviderInfo, ProviderModelsResponse, ProvidersResponse, TranslateRequest, TranslateResponse,
    UpscaleRequest, UpscaleResponse, VideoGenerateRequest, VideoGenerateResponse,
    VideoStatusResponse,
};
use zimage_protocol::video::VideoTaskStatus;
use zimage_provider_core::request::{
    DEFAULT_DIMENSION, DEFAULT_STEPS, DEFAULT_UPSCALE, MAX_PROMPT_CHARS, validate_dimensions,
    validate_prompt, validate_scale,
};
use zimage_provider_core::{
    ApiError, ApiErrorCode, ApiResult, GenerationRequest, Headers, ImageProviderDescriptor,
    ImageProviderId, LlmProviderId, UpstreamClient, UpstreamHttpRequest, content_type_or,
    header_token,
};
use zimage_provider_impl::upstream::send_logged;
use zimage_provider_impl::{ChatAdapter, ChatInput, VideoTaskInput};

use crate::engine::{ProxiedImage, ZImageEngine, within};
use crate::image_url::is_allowed_image_url;

pub const OPTIMIZE_SYSTEM_PROMPT: &str = "You are an expert prompt engineer for text-to-image models. \
Rewrite the user's idea into one detailed image prompt: subject, composition, lighting, style, \
color palette and camera details. Keep the original intent, add no commentary, and output only \
the improved prompt.";

pub const TRANSLATE_SYSTEM_PROMPT: &str = "You translate image generation prompts into English. \
Preserve every visual detail and keep the wording concise. Output only the translated prompt; \
if the input is already English, return it unchanged.";

pub const MAX_TRANSLATE_CHARS: usize = 2000;
const LLM_MAX_TOKENS: u32 = 1000;
const TRANSLATE_TEMPERATURE: f64 = 0.3;
const TRANSLATE_MODEL: &str = "openai-fast";
const IMAGE_PROXY: &str = "Image Proxy";
const TRANSLATION: &str = "Translation";
const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

fn lang_instruction(lang: Option<&str>) -> &'static str {
    match lang.map(str::trim) {
        Some(lang) if lang.eq_ignore_ascii_case("zh") => "请用中文输出。",
        _ => "Ensure the output is in English.",
    }
}

fn image_provider(raw: Option<&str>, default: ImageProviderId) -> ApiResult<ImageProviderId> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(default),
        Some(raw) => ImageProviderId::parse(raw).ok_or_else(|| ApiError::invalid_provider(raw)),
    }
}

fn model_info(descriptor: &ImageProviderDescriptor) -> impl Iterator<Item = ModelInfo> + '_ {
    descriptor.models.iter().map(|model| ModelInfo {
        id: model.id.to_string(),
        name: model.name.to_string(),
        provider: descriptor.id.to_string(),
        features: model.features.iter().map(|f| f.to_string()).collect(),
    })
}

/// Translation failures are reported as the translation service's own
/// `PROVIDER_ERROR`; timeouts keep their code.
fn translation_error(err: ApiError) -> ApiError {
    if err.code == ApiErrorCode::Timeout {
        return err;
    }
    ApiError::provider_error(TRANSLATION, err.message)
}

fn format_duration(elapsed: std::time::Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

impl ZImageEngine {
    pub fn health(&self) -> HealthResponse {
        let timestamp = time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        HealthResponse {
            status: "ok".to_string(),
            message: "Z-Image API is running".to_string(),
            timestamp,
        }
    }

    pub fn providers(&self) -> ProvidersResponse {
        let providers = ImageProviderId::ALL
            .into_iter()
            .map(|id| {
                let descriptor = id.descriptor();
                ProviderInfo {
                    id: descriptor.id.to_string(),
                    name: descriptor.name.to_string(),
                    requires_auth: descriptor.auth.required,
                    auth_header: descriptor.auth_header.to_string(),
                }
            })
            .collect();
        ProvidersResponse { providers }
    }

    pub fn provider_models(&self, provider: &str) -> ApiResult<ProviderModelsResponse> {
        let id = ImageProviderId::parse(provider).ok_or_else(|| ApiError::invalid_provider(provider))?;
        let descriptor = id.descriptor();
        Ok(ProviderModelsResponse {
            provider: descriptor.id.to_string(),
            models: model_info(descriptor).collect(),
        })
    }

    pub fn models(&self) -> ModelsResponse {
        let models = ImageProviderId::ALL
            .into_iter()
            .flat_map(|id| model_info(id.descriptor()))
            .collect();
        ModelsResponse { models }
    }

    pub fn llm_providers(&self) -> LlmProvidersResponse {
        let providers = LlmProviderId::ALL
            .into_iter()
            .map(|id| {
                let descriptor = id.descriptor();
                LlmProviderInfo {
                    id: descriptor.id.to_string(),
                    name: descriptor.name.to_string(),
                    needs_auth: descriptor.auth.required,
                    auth_header: descriptor.auth_header.map(str::to_string),
                    default_model: descriptor.default_model.to_string(),
                    models: descriptor.models.iter().map(|m| m.to_string()).collect(),
                }
            })
            .collect();
        LlmProvidersResponse { providers }
    }

    /// `POST /api/generate`; the provider defaults to Gitee.
    pub async fn generate(&self, headers: &Headers, request: GenerateRequest) -> ApiResult<GenerateResponse> {
        let provider = image_provider(request.provider.as_deref(), ImageProviderId::Gitee)?;
        let descriptor = provider.descriptor();
        let token = header_token(headers, descriptor.auth_header);
        descriptor.auth.check(descriptor.name, token)?;

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(descriptor.default_model)
            .to_string();
        let steps = request.steps.unwrap_or(DEFAULT_STEPS);
        let negative_prompt = request.negative_prompt.clone().unwrap_or_default();

        let mut generation = GenerationRequest::new(provider, model, request.prompt);
        generation.negative_prompt = request.negative_prompt;
        generation.width = request.width.unwrap_or(DEFAULT_DIMENSION);
        generation.height = request.height.unwrap_or(DEFAULT_DIMENSION);
        generation.steps = Some(steps);
        generation.seed = request.seed;
        generation.guidance_scale = request.guidance_scale;
        generation.loras = request.loras;
        generation.auth_token = token.map(str::to_string);
        generation.validate()?;

        let started = Instant::now();
        let result = self.generate_image(&generation).await?;
        let duration = format_duration(started.elapsed());

        let model_name = descriptor
            .model(&generation.model)
            .map(|spec| spec.name.to_string())
            .unwrap_or_else(|| generation.model.clone());
        Ok(GenerateResponse {
            image_details: ImageDetails {
                url: result.url,
                provider: descriptor.name.to_string(),
                model: model_name,
                dimensions: format!("{} x {}", generation.width, generation.height),
                duration,
                seed: result.seed,
                steps,
                prompt: generation.prompt,
                negative_prompt,
            },
        })
    }

    /// `POST /api/generate-hf`: the older HuggingFace-only form. Negative
    /// prompt, guidance and LoRAs are not forwarded.
    pub async fn generate_hf(&self, headers: &Headers, request: GenerateRequest) -> ApiResult<GenerateResponse> {
        let request = GenerateRequest {
            provider: Some(ImageProviderId::HuggingFace.as_str().to_string()),
            negative_prompt: None,
            guidance_scale: None,
            loras: None,
            ..request
        };
        self.generate(headers, request).await
    }

    /// `POST /api/optimize`; rewrites a prompt with a chat model.
    pub async fn optimize(&self, headers: &Headers, request: OptimizeRequest) -> ApiResult<OptimizeResponse> {
        validate_prompt(&request.prompt, MAX_PROMPT_CHARS)?;
        let raw_provider = request.provider.as_deref().unwrap_or("pollinations");
        let provider =
            LlmProviderId::parse(raw_provider).ok_or_else(|| ApiError::invalid_provider(raw_provider))?;
        let descriptor = provider.descriptor();
        let token = descriptor
            .auth_header
            .and_then(|header| header_token(headers, header));

        let base = request
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(OPTIMIZE_SYSTEM_PROMPT);
        let input = ChatInput {
            model: request.model.unwrap_or_default(),
            system: Some(format!("{base}\n\n{}", lang_instruction(request.lang.as_deref()))),
            user: request.prompt,
            temperature: None,
            max_tokens: Some(LLM_MAX_TOKENS),
        };
        let optimized = self
            .complete_chat(provider, token, &input, self.config.chat_timeout)
            .await?;
        Ok(OptimizeResponse {
            optimized,
            provider: descriptor.id.to_string(),
            model: ChatAdapter::effective_model(provider, &input),
        })
    }

    /// `POST /api/translate`; always Pollinations `openai-fast`.
    pub async fn translate(&self, request: TranslateRequest) -> ApiResult<TranslateResponse> {
        validate_prompt(&request.prompt, MAX_TRANSLATE_CHARS)?;
        let input = ChatInput {
            model: TRANSLATE_MODEL.to_string(),
            system: Some(TRANSLATE_SYSTEM_PROMPT.to_string()),
            user: request.prompt,
            temperature: Some(TRANSLATE_TEMPERATURE),
            max_tokens: Some(LLM_MAX_TOKENS),
        };
        let translated = self
            .complete_chat(
                LlmProviderId::Pollinations,
                None,
                &input,
                self.config.translate_timeout,
            )
            .await
            .map_err(translation_error)?;
        Ok(TranslateResponse {
            translated,
            model: TRANSLATE_MODEL.to_string(),
        })
    }

    /// `POST /api/upscale` through the Real-ESRGAN Space.
    pub async fn upscale(&self, headers: &Headers, request: UpscaleRequest) -> ApiResult<UpscaleResponse> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(ApiError::invalid_params("url", "url is required"));
        }
        if !is_allowed_image_url(url) {
            return Err(ApiError::invalid_params("url", "URL not allowed"));
        }
        let scale = request.scale.unwrap_or(DEFAULT_UPSCALE);
        validate_scale(scale)?;

        let token = header_token(headers, ImageProviderId::HuggingFace.descriptor().auth_header);
        let url = within(
            self.config.generation_timeout,
            "HuggingFace Upscaler",
            self.registry.huggingface().upscale(url, scale, token),
        )
        .await?;
        Ok(UpscaleResponse { url })
    }

    /// `POST /api/video/generate`. Gitee returns a task to poll; HuggingFace
    /// blocks until the clip is ready.
    pub async fn create_video(
        &self,
        headers: &Headers,
        request: VideoGenerateRequest,
    ) -> ApiResult<VideoGenerateResponse> {
        let provider = image_provider(request.provider.as_deref(), ImageProviderId::Gitee)?;
        if request.image_url.trim().is_empty() || request.prompt.trim().is_empty() {
            return Err(ApiError::invalid_params(
                "body",
                "imageUrl and prompt are required",
            ));
        }
        let width = request.width.unwrap_or(DEFAULT_DIMENSION);
        let height = request.height.unwrap_or(DEFAULT_DIMENSION);
        validate_dimensions(width, height)?;
        let token = header_token(headers, provider.descriptor().auth_header);

        match provider {
            ImageProviderId::Gitee => {
                let input = VideoTaskInput {
                    image_url: request.image_url,
                    prompt: request.prompt,
                    width,
                    height,
                    seed: request.seed,
                };
                let task_id = self.registry.video().create_task(&input, token).await?;
                Ok(VideoGenerateResponse {
                    task_id: Some(task_id),
                    status: VideoTaskStatus::Pending,
                    video_url: None,
                })
            }
            ImageProviderId::HuggingFace => {
                let video_url = within(
                    self.config.generation_timeout,
                    "HuggingFace Video",
                    self.registry.huggingface().generate_video(
                        &request.image_url,
                        &request.prompt,
                        request.seed,
                        token,
                    ),
                )
                .await?;
                Ok(VideoGenerateResponse {
                    task_id: None,
                    status: VideoTaskStatus::Success,
                    video_url: Some(video_url),
                })
            }
            ImageProviderId::ModelScope => Err(ApiError::invalid_provider(provider.as_str())),
        }
    }

    /// `GET /api/video/status/{taskId}` for Gitee tasks.
    pub async fn video_status(&self, headers: &Headers, task_id: &str) -> ApiResult<VideoStatusResponse> {
        let token = header_token(headers, ImageProviderId::Gitee.descriptor().auth_header);
        let state = self.registry.video().get_task_status(task_id, token).await?;
        Ok(VideoStatusResponse {
            task_id: task_id.to_string(),
            status: state.status,
            video_url: state.video_url,
            error: state.error,
        })
    }
}

pub(crate) async fn proxy_image(client: &dyn UpstreamClient, url: &str) -> ApiResult<ProxiedImage> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::invalid_params("url", "url query parameter is required"));
    }
    if !is_allowed_image_url(url) {
        return Err(ApiError::invalid_params("url", "URL not allowed"));
    }

    let response = send_logged(client, IMAGE_PROXY, "image.proxy", UpstreamHttpRequest::get(url)).await?;
    if !response.is_success() {
        return Err(ApiError::generation_failed(
            IMAGE_PROXY,
            format!("Failed to fetch image: {}", response.status),
        )
        .with_upstream_status(response.status));
    }
    let content_type = content_type_or(&response.headers, DEFAULT_IMAGE_CONTENT_TYPE).to_string();
    Ok(ProxiedImage {
        content_type,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_instruction_defaults_to_english() {
        assert_eq!(lang_instruction(None), "Ensure the output is in English.");
        assert_eq!(lang_instruction(Some("en")), "Ensure the output is in English.");
        assert_eq!(lang_instruction(Some("ZH")), "请用中文输出。");
    }

    #[test]
    fn durations_render_with_one_decimal() {
        assert_eq!(format_duration(std::time::Duration::from_millis(1234)), "1.2s");
        assert_eq!(format_duration(std::time::Duration::ZERO), "0.0s");
    }

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!(
            image_provider(Some("ModelScope"), ImageProviderId::Gitee).unwrap(),
            ImageProviderId::ModelScope
        );
        assert_eq!(
            image_provider(Some(" "), ImageProviderId::Gitee).unwrap(),
            ImageProviderId::Gitee
        );
        assert!(image_provider(Some("openai"), ImageProviderId::Gitee).is_err());
    }
}
