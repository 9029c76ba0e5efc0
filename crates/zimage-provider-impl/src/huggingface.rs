use std::sync::Arc;

use serde_json::{Value, json};

use zimage_protocol::gradio::{GradioOutput, file_data};
use zimage_provider_core::{
    ApiError, ApiResult, GenerationRequest, GenerationResult, ImageProviderId, UpstreamClient,
};

use crate::adapter::{ImageAdapter, SeedSource, seed_for};
use crate::gradio::GradioClient;

const UPSCALER_FUNCTION: &str = "realesrgan";
const UPSCALER_MODEL: &str = "RealESRGAN_x4plus";
const UPSCALER_DENOISE: f64 = 0.5;
const VIDEO_FUNCTION: &str = "generate_video";
const VIDEO_STEPS: u32 = 6;
const VIDEO_DURATION_SECS: u32 = 3;

pub const VIDEO_NEGATIVE_PROMPT: &str = "Vivid colors, overexposed, static, blurry details, subtitles, style, artwork, painting, image, still, overall grayish tone, worst quality, low quality, JPEG compression artifacts, ugly, incomplete, extra fingers, poorly drawn hands, poorly drawn face, deformed, disfigured, malformed limbs, fused fingers, still image, cluttered background, three legs, many people in the background, walking backward";

/// Where a model's Gradio function lives and how its positional arguments are laid out.
struct SpaceModel {
    id: &'static str,
    space: &'static str,
    function: &'static str,
    args: fn(&GenerationRequest, u64) -> Vec<Value>,
}

fn z_image_args(request: &GenerationRequest, seed: u64) -> Vec<Value> {
    vec![
        json!(request.prompt),
        json!(request.height),
        json!(request.width),
        json!(request.steps_or_default()),
        json!(seed),
        json!(false),
    ]
}

fn flux_schnell_args(request: &GenerationRequest, seed: u64) -> Vec<Value> {
    vec![
        json!(request.prompt),
        json!(seed),
        json!(false),
        json!(request.width),
        json!(request.height),
        json!(request.steps_or_default()),
    ]
}

const SPACE_MODELS: &[SpaceModel] = &[
    SpaceModel {
        id: "z-image-turbo",
        space: "https://mrfakename-z-image-turbo.hf.space",
        function: "generate_image",
        args: z_image_args,
    },
    SpaceModel {
        id: "flux-schnell",
        space: "https://black-forest-labs-flux-1-schnell.hf.space",
        function: "infer",
        args: flux_schnell_args,
    },
];

/// HuggingFace Spaces over the Gradio queue API. The token is optional;
/// anonymous calls share the Space's public quota.
#[derive(Clone)]
pub struct HuggingFaceAdapter {
    gradio: GradioClient,
    upscaler_space: String,
    video_space: String,
    seeds: Arc<dyn SeedSource>,
}

impl HuggingFaceAdapter {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        upscaler_space: impl Into<String>,
        video_space: impl Into<String>,
        seeds: Arc<dyn SeedSource>,
    ) -> Self {
        Self {
            gradio: GradioClient::new(client),
            upscaler_space: upscaler_space.into(),
            video_space: video_space.into(),
            seeds,
        }
    }

    fn checked_token<'a>(&self, token: Option<&'a str>) -> ApiResult<Option<&'a str>> {
        let descriptor = ImageProviderId::HuggingFace.descriptor();
        descriptor.auth.check(descriptor.name, token)
    }

    /// Real-ESRGAN upscale of a remote image; returns the upscaled image URL.
    pub async fn upscale(&self, image_url: &str, scale: u32, token: Option<&str>) -> ApiResult<String> {
        let provider = "HuggingFace Upscaler";
        let token = self.checked_token(token)?;
        let data = vec![
            file_data(image_url),
            json!(UPSCALER_MODEL),
            json!(UPSCALER_DENOISE),
            json!(false),
            json!(scale),
        ];
        let payload = self
            .gradio
            .call(provider, &self.upscaler_space, UPSCALER_FUNCTION, data, token)
            .await?;
        GradioOutput::from_payload(&payload)
            .map(|output| output.url)
            .ok_or_else(|| ApiError::generation_failed(provider, "No image returned"))
    }

    /// Image-to-video on a ZeroGPU Space; blocks until the clip is rendered.
    pub async fn generate_video(
        &self,
        image_url: &str,
        prompt: &str,
        seed: Option<u64>,
        token: Option<&str>,
    ) -> ApiResult<String> {
        let provider = "HuggingFace Video";
        let token = self.checked_token(token)?;
        let seed = seed.unwrap_or_else(|| self.seeds.next_seed());
        let data = vec![
            file_data(image_url),
            json!(prompt),
            json!(VIDEO_STEPS),
            json!(VIDEO_NEGATIVE_PROMPT),
            json!(VIDEO_DURATION_SECS),
            json!(1),
            json!(1),
            json!(seed),
            json!(false),
        ];
        let payload = self
            .gradio
            .call(provider, &self.video_space, VIDEO_FUNCTION, data, token)
            .await?;
        GradioOutput::from_payload(&payload)
            .map(|output| output.url)
            .ok_or_else(|| ApiError::generation_failed(provider, "No video returned"))
    }
}

#[async_trait::async_trait]
impl ImageAdapter for HuggingFaceAdapter {
    fn provider(&self) -> ImageProviderId {
        ImageProviderId::HuggingFace
    }

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<GenerationResult> {
        let name = ImageProviderId::HuggingFace.descriptor().name;
        let token = self.checked_token(request.auth_token.as_deref())?;
        let model = SPACE_MODELS
            .iter()
            .find(|model| model.id == request.model)
            .ok_or_else(|| {
                ApiError::invalid_params(
                    "model",
                    format!("Unsupported HuggingFace model: {}", request.model),
                )
            })?;
        let seed = seed_for(request, self.seeds.as_ref());

        let payload = self
            .gradio
            .call(name, model.space, model.function, (model.args)(request, seed), token)
            .await?;
        let output = GradioOutput::from_payload(&payload)
            .ok_or_else(|| ApiError::generation_failed(name, "No image returned"))?;
        Ok(GenerationResult {
            url: output.url,
            seed: output.seed.unwrap_or(seed),
        })
    }
}
