use zimage_protocol::modelscope::Loras;

use crate::errors::{ApiError, ApiResult};
use crate::provider::ImageProviderId;

pub const MAX_PROMPT_CHARS: usize = 4000;
pub const MIN_DIMENSION: u32 = 256;
pub const MAX_DIMENSION: u32 = 2048;
pub const DEFAULT_DIMENSION: u32 = 1024;
pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
pub const DEFAULT_STEPS: u32 = 9;
pub const MIN_UPSCALE: u32 = 2;
pub const MAX_UPSCALE: u32 = 4;
pub const DEFAULT_UPSCALE: u32 = 4;

/// One image generation job, already routed to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub provider: ImageProviderId,
    /// Bare model id (no provider prefix).
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub steps: Option<u32>,
    pub seed: Option<u64>,
    pub guidance_scale: Option<f64>,
    pub loras: Option<Loras>,
    pub auth_token: Option<String>,
}

impl GenerationRequest {
    pub fn new(provider: ImageProviderId, model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt: prompt.into(),
            negative_prompt: None,
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            steps: None,
            seed: None,
            guidance_scale: None,
            loras: None,
            auth_token: None,
        }
    }

    /// Runs every synchronous check; adapters may assume a validated request.
    pub fn validate(&self) -> ApiResult<()> {
        validate_prompt(&self.prompt, MAX_PROMPT_CHARS)?;
        validate_dimensions(self.width, self.height)?;
        if let Some(steps) = self.steps {
            validate_steps(steps)?;
        }
        Ok(())
    }

    pub fn steps_or_default(&self) -> u32 {
        self.steps.unwrap_or(DEFAULT_STEPS)
    }

    /// Negative prompt with blank values treated as absent.
    pub fn negative_prompt(&self) -> Option<&str> {
        self.negative_prompt
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub url: String,
    /// Seed actually used, provider-assigned when the caller left it out.
    pub seed: u64,
}

pub fn validate_prompt(prompt: &str, max_chars: usize) -> ApiResult<()> {
    if prompt.trim().is_empty() {
        return Err(ApiError::invalid_prompt("Prompt is required"));
    }
    if prompt.chars().count() > max_chars {
        return Err(ApiError::invalid_prompt(format!(
            "Prompt must be less than {max_chars} characters"
        )));
    }
    Ok(())
}

pub fn validate_dimensions(width: u32, height: u32) -> ApiResult<()> {
    let range = MIN_DIMENSION..=MAX_DIMENSION;
    if !range.contains(&width) || !range.contains(&height) {
        return Err(ApiError::invalid_dimensions(format!(
            "Width and height must be between {MIN_DIMENSION} and {MAX_DIMENSION}"
        )));
    }
    Ok(())
}

pub fn validate_steps(steps: u32) -> ApiResult<()> {
    if !(MIN_STEPS..=MAX_STEPS).contains(&steps) {
        return Err(ApiError::invalid_params(
            "steps",
            format!("Steps must be between {MIN_STEPS} and {MAX_STEPS}"),
        ));
    }
    Ok(())
}

pub fn validate_scale(scale: u32) -> ApiResult<()> {
    if !(MIN_UPSCALE..=MAX_UPSCALE).contains(&scale) {
        return Err(ApiError::invalid_params(
            "scale",
            format!("Scale must be between {MIN_UPSCALE} and {MAX_UPSCALE}"),
        ));
    }
    Ok(())
}

/// Parses an OpenAI `size` value (`"1024x768"`).
pub fn parse_size(size: &str) -> ApiResult<(u32, u32)> {
    let invalid = || ApiError::invalid_params("size", "size must be in the form WIDTHxHEIGHT");
    let (width, height) = size
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
