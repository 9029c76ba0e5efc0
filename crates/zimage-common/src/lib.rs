use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:3000",
];

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("invalid global config field {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Upstream base URL overrides. `None` keeps the built-in endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseUrls {
    pub gitee: Option<String>,
    pub modelscope: Option<String>,
    pub pollinations: Option<String>,
    pub huggingface_router: Option<String>,
    pub deepseek: Option<String>,
    pub upscaler_space: Option<String>,
    pub video_space: Option<String>,
}

impl BaseUrls {
    pub fn overlay(&mut self, other: BaseUrls) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            gitee,
            modelscope,
            pollinations,
            huggingface_router,
            deepseek,
            upscaler_space,
            video_space
        );
    }
}

/// Final, merged global configuration used by the running process.
///
/// Merge order: CLI > ENV > config file > built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Optional outbound proxy for upstream egress.
    pub proxy: Option<String>,
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub generation_timeout_secs: u64,
    pub chat_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub base_urls: BaseUrls,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            proxy: None,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            chat_timeout_secs: DEFAULT_CHAT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            base_urls: BaseUrls::default(),
        }
    }
}

/// Optional layer used for merging global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub proxy: Option<String>,
    pub cors_origins: Option<Vec<String>>,
    pub body_limit_bytes: Option<usize>,
    pub generation_timeout_secs: Option<u64>,
    pub chat_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub base_urls: BaseUrls,
}

impl GlobalConfigPatch {
    /// Parses a JSON config file body. Unknown keys are rejected.
    pub fn from_json_str(raw: &str) -> Result<Self, GlobalConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Fields set in `other` win.
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.cors_origins.is_some() {
            self.cors_origins = other.cors_origins;
        }
        if other.body_limit_bytes.is_some() {
            self.body_limit_bytes = other.body_limit_bytes;
        }
        if other.generation_timeout_secs.is_some() {
            self.generation_timeout_secs = other.generation_timeout_secs;
        }
        if other.chat_timeout_secs.is_some() {
            self.chat_timeout_secs = other.chat_timeout_secs;
        }
        if other.poll_interval_ms.is_some() {
            self.poll_interval_ms = other.poll_interval_ms;
        }
        if other.max_poll_attempts.is_some() {
            self.max_poll_attempts = other.max_poll_attempts;
        }
        self.base_urls.overlay(other.base_urls);
    }

    pub fn into_config(self) -> Result<GlobalConfig, GlobalConfigError> {
        let defaults = GlobalConfig::default();
        let config = GlobalConfig {
            host: self
                .host
                .filter(|host| !host.trim().is_empty())
                .unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            proxy: self
                .proxy
                .map(|proxy| proxy.trim().to_string())
                .filter(|proxy| !proxy.is_empty()),
            cors_origins: self.cors_origins.unwrap_or(defaults.cors_origins),
            body_limit_bytes: self.body_limit_bytes.unwrap_or(defaults.body_limit_bytes),
            generation_timeout_secs: self
                .generation_timeout_secs
                .unwrap_or(defaults.generation_timeout_secs),
            chat_timeout_secs: self.chat_timeout_secs.unwrap_or(defaults.chat_timeout_secs),
            poll_interval_ms: self.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts.unwrap_or(defaults.max_poll_attempts),
            base_urls: self.base_urls,
        };
        if config.max_poll_attempts == 0 {
            return Err(GlobalConfigError::InvalidField {
                field: "max_poll_attempts",
                reason: "must be at least 1",
            });
        }
        // Polling must give up on its own before the request deadline fires.
        let poll_budget_ms = config
            .poll_interval_ms
            .saturating_mul(u64::from(config.max_poll_attempts));
        if poll_budget_ms > config.generation_timeout_secs.saturating_mul(1000) {
            return Err(GlobalConfigError::InvalidField {
                field: "max_poll_attempts",
                reason: "polling budget exceeds generation_timeout_secs",
            });
        }
        if config.body_limit_bytes == 0 {
            return Err(GlobalConfigError::InvalidField {
                field: "body_limit_bytes",
                reason: "must be positive",
            });
        }
        if config.generation_timeout_secs == 0 || config.chat_timeout_secs == 0 {
            return Err(GlobalConfigError::InvalidField {
                field: "timeout",
                reason: "must be positive",
            });
        }
        Ok(config)
    }
}

impl From<GlobalConfig> for GlobalConfigPatch {
    fn from(value: GlobalConfig) -> Self {
        Self {
            host: Some(value.host),
            port: Some(value.port),
            proxy: value.proxy,
            cors_origins: Some(value.cors_origins),
            body_limit_bytes: Some(value.body_limit_bytes),
            generation_timeout_secs: Some(value.generation_timeout_secs),
            chat_timeout_secs: Some(value.chat_timeout_secs),
            poll_interval_ms: Some(value.poll_interval_ms),
            max_poll_attempts: Some(value.max_poll_attempts),
            base_urls: value.base_urls,
        }
    }
}
