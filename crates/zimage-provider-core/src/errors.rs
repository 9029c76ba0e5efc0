use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upstream::UpstreamFailure;

pub type ApiResult<T> = Result<T, ApiError>;

/// Stable, provider-agnostic failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    InvalidParams,
    InvalidPrompt,
    InvalidDimensions,
    InvalidProvider,
    AuthRequired,
    AuthInvalid,
    ProviderError,
    GenerationFailed,
    Timeout,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidParams => "INVALID_PARAMS",
            ApiErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ApiErrorCode::InvalidDimensions => "INVALID_DIMENSIONS",
            ApiErrorCode::InvalidProvider => "INVALID_PROVIDER",
            ApiErrorCode::AuthRequired => "AUTH_REQUIRED",
            ApiErrorCode::AuthInvalid => "AUTH_INVALID",
            ApiErrorCode::ProviderError => "PROVIDER_ERROR",
            ApiErrorCode::GenerationFailed => "GENERATION_FAILED",
            ApiErrorCode::Timeout => "TIMEOUT",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ApiErrorCode::InvalidParams
            | ApiErrorCode::InvalidPrompt
            | ApiErrorCode::InvalidDimensions
            | ApiErrorCode::InvalidProvider => 400,
            ApiErrorCode::AuthRequired | ApiErrorCode::AuthInvalid => 401,
            ApiErrorCode::GenerationFailed => 500,
            ApiErrorCode::ProviderError => 502,
            ApiErrorCode::Timeout => 504,
        }
    }

    /// The OpenAI `error.type` this code is reported under.
    pub fn openai_type(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidParams
            | ApiErrorCode::InvalidPrompt
            | ApiErrorCode::InvalidDimensions
            | ApiErrorCode::InvalidProvider => "invalid_request_error",
            ApiErrorCode::AuthRequired | ApiErrorCode::AuthInvalid => "authentication_error",
            ApiErrorCode::GenerationFailed => "api_error",
            ApiErrorCode::ProviderError => "upstream_error",
            ApiErrorCode::Timeout => "timeout_error",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.http_status() == 400
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    /// Offending request field, for parameter errors.
    pub param: Option<String>,
    pub provider: Option<String>,
    /// HTTP status the upstream answered with, when the failure came from one.
    pub upstream_status: Option<u16>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            param: None,
            provider: None,
            upstream_status: None,
        }
    }

    pub fn invalid_params(param: &str, message: impl Into<String>) -> Self {
        Self {
            param: Some(param.to_string()),
            ..Self::new(ApiErrorCode::InvalidParams, message)
        }
    }

    pub fn invalid_prompt(message: impl Into<String>) -> Self {
        Self {
            param: Some("prompt".to_string()),
            ..Self::new(ApiErrorCode::InvalidPrompt, message)
        }
    }

    pub fn invalid_dimensions(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidDimensions, message)
    }

    pub fn invalid_provider(provider: &str) -> Self {
        Self {
            param: Some("provider".to_string()),
            ..Self::new(
                ApiErrorCode::InvalidProvider,
                format!("Invalid provider: {provider}"),
            )
        }
    }

    pub fn auth_required(provider: &str) -> Self {
        Self::new(
            ApiErrorCode::AuthRequired,
            format!("API token is required for {provider}"),
        )
        .with_provider(provider)
    }

    pub fn auth_invalid(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::AuthInvalid, message).with_provider(provider)
    }

    pub fn provider_error(provider: &str, message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::ProviderError,
            format!("{provider} error: {}", message.into()),
        )
        .with_provider(provider)
    }

    pub fn generation_failed(provider: &str, message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::GenerationFailed,
            format!("{provider} generation failed: {}", message.into()),
        )
        .with_provider(provider)
    }

    pub fn timeout(provider: &str) -> Self {
        Self::new(
            ApiErrorCode::Timeout,
            format!("{provider} request timed out"),
        )
        .with_provider(provider)
    }

    /// Maps a transport failure: timeouts become `TIMEOUT`, the rest `PROVIDER_ERROR`.
    pub fn from_transport(provider: &str, failure: &UpstreamFailure) -> Self {
        if failure.kind.is_timeout() {
            Self::timeout(provider)
        } else {
            Self::provider_error(provider, &failure.message)
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn with_upstream_status(mut self, status: u16) -> Self {
        self.upstream_status = Some(status);
        self
    }

    /// Status to answer downstream with. An upstream 429 is surfaced as 429 so
    /// callers can tell quota exhaustion apart from other provider failures.
    pub fn http_status(&self) -> u16 {
        match self.upstream_status {
            Some(429) => 429,
            _ => self.code.http_status(),
        }
    }
}

const MAX_UPSTREAM_TEXT: usize = 500;

/// Best-effort human message from an upstream error body.
///
/// Looks for `error.message`, `error` (string), `message`, `detail` and
/// `error_message` in JSON bodies, falling back to the raw (truncated) text.
pub fn upstream_error_text(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body)
        && let Some(message) = json_error_message(&value)
    {
        return message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(MAX_UPSTREAM_TEXT).collect()
}

fn json_error_message(value: &Value) -> Option<String> {
    let candidates = [
        value.get("error").and_then(|error| error.get("message")),
        value.get("error"),
        value.get("message"),
        value.get("detail"),
        value.get("error_message"),
        value.get("errors").and_then(|errors| errors.get(0)),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| candidate.as_str().filter(|s| !s.trim().is_empty()))
        .map(|s| s.trim().to_string())
}
