use std::time::Duration;

use zimage_common::GlobalConfig;
use zimage_provider_core::LlmProviderId;

pub const GITEE_BASE_URL: &str = "https://ai.gitee.com/v1";
pub const MODELSCOPE_BASE_URL: &str = "https://api-inference.modelscope.cn/v1";
pub const UPSCALER_SPACE: &str = "https://tuan2308-upscaler.hf.space";
pub const VIDEO_SPACE: &str = "https://zerogpu-aoti-wan2-2-fp8da-aoti-faster.hf.space";

/// ModelScope polling cadence. A constructor parameter of the adapter, so tests
/// can poll with zero delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_attempts: 60,
        }
    }
}

impl PollingConfig {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts,
        }
    }
}

/// Upstream endpoints and adapter tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub gitee_base_url: String,
    pub modelscope_base_url: String,
    pub upscaler_space: String,
    pub video_space: String,
    /// Chat-completions URL overrides keyed by provider.
    pub chat_endpoints: Vec<(LlmProviderId, String)>,
    pub polling: PollingConfig,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            gitee_base_url: GITEE_BASE_URL.to_string(),
            modelscope_base_url: MODELSCOPE_BASE_URL.to_string(),
            upscaler_space: UPSCALER_SPACE.to_string(),
            video_space: VIDEO_SPACE.to_string(),
            chat_endpoints: Vec::new(),
            polling: PollingConfig::default(),
        }
    }
}

impl ProviderSettings {
    pub fn from_global(global: &GlobalConfig) -> Self {
        let urls = &global.base_urls;
        let defaults = Self::default();
        let trim = |url: &Option<String>| {
            url.as_deref()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
        };

        let mut chat_endpoints = Vec::new();
        if let Some(base) = trim(&urls.gitee) {
            chat_endpoints.push((LlmProviderId::GiteeLlm, format!("{base}/chat/completions")));
        }
        if let Some(base) = trim(&urls.modelscope) {
            chat_endpoints.push((
                LlmProviderId::ModelScopeLlm,
                format!("{base}/chat/completions"),
            ));
        }
        if let Some(url) = trim(&urls.pollinations) {
            chat_endpoints.push((LlmProviderId::Pollinations, url));
        }
        if let Some(base) = trim(&urls.huggingface_router) {
            chat_endpoints.push((
                LlmProviderId::HuggingFaceLlm,
                format!("{base}/chat/completions"),
            ));
        }
        if let Some(base) = trim(&urls.deepseek) {
            chat_endpoints.push((LlmProviderId::DeepSeek, format!("{base}/chat/completions")));
        }

        Self {
            gitee_base_url: trim(&urls.gitee).unwrap_or(defaults.gitee_base_url),
            modelscope_base_url: trim(&urls.modelscope).unwrap_or(defaults.modelscope_base_url),
            upscaler_space: trim(&urls.upscaler_space).unwrap_or(defaults.upscaler_space),
            video_space: trim(&urls.video_space).unwrap_or(defaults.video_space),
            chat_endpoints,
            polling: PollingConfig {
                interval: Duration::from_millis(global.poll_interval_ms),
                max_attempts: global.max_poll_attempts,
            },
        }
    }

    pub fn chat_endpoint(&self, provider: LlmProviderId) -> &str {
        self.chat_endpoints
            .iter()
            .find(|(id, _)| *id == provider)
            .map(|(_, url)| url.as_str())
            .unwrap_or(provider.descriptor().endpoint)
    }
}
