//! Provider identities and their static descriptors.
//!
//! Descriptors are `'static` tables: loaded with the binary, never mutated.

use crate::errors::{ApiError, ApiResult};

/// Provider family as it appears in model-id (`gitee/…`) and bearer-token
/// (`gitee:…`) prefixes. Shared by the image and chat endpoint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderPrefix {
    Gitee,
    ModelScope,
    HuggingFace,
    DeepSeek,
    Pollinations,
}

impl ProviderPrefix {
    /// Match order for model-id prefixes.
    pub const ALL: [ProviderPrefix; 5] = [
        ProviderPrefix::Gitee,
        ProviderPrefix::ModelScope,
        ProviderPrefix::HuggingFace,
        ProviderPrefix::DeepSeek,
        ProviderPrefix::Pollinations,
    ];

    pub fn model_prefix(self) -> &'static str {
        match self {
            ProviderPrefix::Gitee => "gitee/",
            ProviderPrefix::ModelScope => "ms/",
            ProviderPrefix::HuggingFace => "hf/",
            ProviderPrefix::DeepSeek => "deepseek/",
            ProviderPrefix::Pollinations => "pollinations/",
        }
    }

    /// Pollinations is anonymous, so it has no token prefix.
    pub fn token_prefix(self) -> Option<&'static str> {
        match self {
            ProviderPrefix::Gitee => Some("gitee:"),
            ProviderPrefix::ModelScope => Some("ms:"),
            ProviderPrefix::HuggingFace => Some("hf:"),
            ProviderPrefix::DeepSeek => Some("deepseek:"),
            ProviderPrefix::Pollinations => None,
        }
    }
}

/// Minimal credential policy applied before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    pub required: bool,
    pub min_token_len: usize,
}

impl AuthPolicy {
    /// Returns the trimmed token to use, `None` for anonymous access.
    pub fn check<'a>(&self, provider: &str, token: Option<&'a str>) -> ApiResult<Option<&'a str>> {
        let token = token.map(str::trim).filter(|token| !token.is_empty());
        match token {
            None if self.required => Err(ApiError::auth_required(provider)),
            None => Ok(None),
            Some(token) if token.chars().count() < self.min_token_len => Err(
                ApiError::auth_invalid(provider, format!("Invalid {provider} API token")),
            ),
            Some(token) => Ok(Some(token)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageProviderId {
    HuggingFace,
    Gitee,
    ModelScope,
}

impl ImageProviderId {
    pub const ALL: [ImageProviderId; 3] = [
        ImageProviderId::HuggingFace,
        ImageProviderId::Gitee,
        ImageProviderId::ModelScope,
    ];

    pub fn as_str(self) -> &'static str {
        self.descriptor().id
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    pub fn prefix(self) -> ProviderPrefix {
        match self {
            ImageProviderId::HuggingFace => ProviderPrefix::HuggingFace,
            ImageProviderId::Gitee => ProviderPrefix::Gitee,
            ImageProviderId::ModelScope => ProviderPrefix::ModelScope,
        }
    }

    /// `None` for families that only serve chat.
    pub fn from_prefix(prefix: ProviderPrefix) -> Option<Self> {
        match prefix {
            ProviderPrefix::Gitee => Some(ImageProviderId::Gitee),
            ProviderPrefix::ModelScope => Some(ImageProviderId::ModelScope),
            ProviderPrefix::HuggingFace => Some(ImageProviderId::HuggingFace),
            ProviderPrefix::DeepSeek | ProviderPrefix::Pollinations => None,
        }
    }

    pub fn descriptor(self) -> &'static ImageProviderDescriptor {
        match self {
            ImageProviderId::HuggingFace => &HUGGINGFACE,
            ImageProviderId::Gitee => &GITEE,
            ImageProviderId::ModelScope => &MODELSCOPE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageModelSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// Model name the upstream API expects.
    pub upstream: &'static str,
    pub features: &'static [&'static str],
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImageProviderDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub auth: AuthPolicy,
    /// Header carrying the token on the native `/api` routes.
    pub auth_header: &'static str,
    pub default_model: &'static str,
    pub models: &'static [ImageModelSpec],
}

impl ImageProviderDescriptor {
    pub fn model(&self, id: &str) -> Option<&'static ImageModelSpec> {
        self.models.iter().find(|model| model.id == id)
    }

    /// Upstream name for a bare model id; unknown ids pass through unchanged.
    pub fn upstream_model(&self, id: &str) -> String {
        match self.model(id) {
            Some(model) => model.upstream.to_string(),
            None => id.to_string(),
        }
    }
}

const TEXT_TO_IMAGE: &[&str] = &["text-to-image"];
const TEXT_TO_IMAGE_NEGATIVE: &[&str] = &["text-to-image", "negative-prompt"];
const TEXT_TO_IMAGE_LORA: &[&str] = &["text-to-image", "negative-prompt", "lora"];

static HUGGINGFACE: ImageProviderDescriptor = ImageProviderDescriptor {
    id: "huggingface",
    name: "HuggingFace",
    auth: AuthPolicy {
        required: false,
        min_token_len: 8,
    },
    auth_header: "X-HF-Token",
    default_model: "z-image-turbo",
    models: &[
        ImageModelSpec {
            id: "z-image-turbo",
            name: "Z-Image Turbo",
            upstream: "z-image-turbo",
            features: TEXT_TO_IMAGE,
        },
        ImageModelSpec {
            id: "flux-schnell",
            name: "FLUX.1 Schnell",
            upstream: "flux-schnell",
            features: TEXT_TO_IMAGE,
        },
    ],
};

static GITEE: ImageProviderDescriptor = ImageProviderDescriptor {
    id: "gitee",
    name: "Gitee AI",
    auth: AuthPolicy {
        required: true,
        min_token_len: 4,
    },
    auth_header: "X-API-Key",
    default_model: "z-image-turbo",
    models: &[
        ImageModelSpec {
            id: "z-image-turbo",
            name: "Z-Image Turbo",
            upstream: "z-image-turbo",
            features: TEXT_TO_IMAGE_NEGATIVE,
        },
        ImageModelSpec {
            id: "qwen-image",
            name: "Qwen Image",
            upstream: "Qwen-Image",
            features: TEXT_TO_IMAGE_NEGATIVE,
        },
    ],
};

static MODELSCOPE: ImageProviderDescriptor = ImageProviderDescriptor {
    id: "modelscope",
    name: "ModelScope",
    auth: AuthPolicy {
        required: true,
        min_token_len: 8,
    },
    auth_header: "X-MS-Token",
    default_model: "z-image-turbo",
    models: &[
        ImageModelSpec {
            id: "z-image-turbo",
            name: "Z-Image Turbo",
            upstream: "Tongyi-MAI/Z-Image-Turbo",
            features: TEXT_TO_IMAGE_LORA,
        },
        ImageModelSpec {
            id: "flux-2",
            name: "FLUX.2 Dev",
            upstream: "black-forest-labs/FLUX.2-dev",
            features: TEXT_TO_IMAGE_LORA,
        },
        ImageModelSpec {
            id: "qwen-image",
            name: "Qwen Image",
            upstream: "Qwen/Qwen-Image",
            features: TEXT_TO_IMAGE_LORA,
        },
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProviderId {
    Pollinations,
    GiteeLlm,
    ModelScopeLlm,
    HuggingFaceLlm,
    DeepSeek,
}

impl LlmProviderId {
    pub const ALL: [LlmProviderId; 5] = [
        LlmProviderId::Pollinations,
        LlmProviderId::GiteeLlm,
        LlmProviderId::ModelScopeLlm,
        LlmProviderId::HuggingFaceLlm,
        LlmProviderId::DeepSeek,
    ];

    pub fn as_str(self) -> &'static str {
        self.descriptor().id
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    pub fn prefix(self) -> ProviderPrefix {
        match self {
            LlmProviderId::Pollinations => ProviderPrefix::Pollinations,
            LlmProviderId::GiteeLlm => ProviderPrefix::Gitee,
            LlmProviderId::ModelScopeLlm => ProviderPrefix::ModelScope,
            LlmProviderId::HuggingFaceLlm => ProviderPrefix::HuggingFace,
            LlmProviderId::DeepSeek => ProviderPrefix::DeepSeek,
        }
    }

    pub fn from_prefix(prefix: ProviderPrefix) -> Self {
        match prefix {
            ProviderPrefix::Gitee => LlmProviderId::GiteeLlm,
            ProviderPrefix::ModelScope => LlmProviderId::ModelScopeLlm,
            ProviderPrefix::HuggingFace => LlmProviderId::HuggingFaceLlm,
            ProviderPrefix::DeepSeek => LlmProviderId::DeepSeek,
            ProviderPrefix::Pollinations => LlmProviderId::Pollinations,
        }
    }

    pub fn descriptor(self) -> &'static LlmProviderDescriptor {
        match self {
            LlmProviderId::Pollinations => &POLLINATIONS_LLM,
            LlmProviderId::GiteeLlm => &GITEE_LLM,
            LlmProviderId::ModelScopeLlm => &MODELSCOPE_LLM,
            LlmProviderId::HuggingFaceLlm => &HUGGINGFACE_LLM,
            LlmProviderId::DeepSeek => &DEEPSEEK_LLM,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct LlmProviderDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub auth: AuthPolicy,
    pub auth_header: Option<&'static str>,
    pub default_model: &'static str,
    pub models: &'static [&'static str],
    /// Full chat-completions URL.
    pub endpoint: &'static str,
}

static POLLINATIONS_LLM: LlmProviderDescriptor = LlmProviderDescriptor {
    id: "pollinations",
    name: "Pollinations",
    auth: AuthPolicy {
        required: false,
        min_token_len: 0,
    },
    auth_header: None,
    default_model: "openai-fast",
    models: &["openai-fast", "openai", "mistral"],
    endpoint: "https://text.pollinations.ai/openai",
};

static GITEE_LLM: LlmProviderDescriptor = LlmProviderDescriptor {
    id: "gitee-llm",
    name: "Gitee AI",
    auth: AuthPolicy {
        required: true,
        min_token_len: 4,
    },
    auth_header: Some("X-API-Key"),
    default_model: "DeepSeek-V3",
    models: &["DeepSeek-V3", "Qwen3-235B-A22B"],
    endpoint: "https://ai.gitee.com/v1/chat/completions",
};

static MODELSCOPE_LLM: LlmProviderDescriptor = LlmProviderDescriptor {
    id: "modelscope-llm",
    name: "ModelScope",
    auth: AuthPolicy {
        required: true,
        min_token_len: 8,
    },
    auth_header: Some("X-MS-Token"),
    default_model: "deepseek-ai/DeepSeek-V3.2",
    models: &[
        "deepseek-ai/DeepSeek-V3.2",
        "Qwen/Qwen3-235B-A22B-Instruct-2507",
    ],
    endpoint: "https://api-inference.modelscope.cn/v1/chat/completions",
};

static HUGGINGFACE_LLM: LlmProviderDescriptor = LlmProviderDescriptor {
    id: "huggingface-llm",
    name: "HuggingFace",
    auth: AuthPolicy {
        required: true,
        min_token_len: 8,
    },
    auth_header: Some("X-HF-Token"),
    default_model: "openai/gpt-oss-120b",
    models: &["openai/gpt-oss-120b", "meta-llama/Llama-3.3-70B-Instruct"],
    endpoint: "https://router.huggingface.co/v1/chat/completions",
};

static DEEPSEEK_LLM: LlmProviderDescriptor = LlmProviderDescriptor {
    id: "deepseek",
    name: "DeepSeek",
    auth: AuthPolicy {
        required: true,
        min_token_len: 8,
    },
    auth_header: Some("X-DeepSeek-Token"),
    default_model: "deepseek-chat",
    models: &["deepseek-chat", "deepseek-reasoner"],
    endpoint: "https://api.deepseek.com/chat/completions",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorCode;

    #[test]
    fn auth_policy_checks_presence_then_shape() {
        let policy = ImageProviderId::ModelScope.descriptor().auth;
        let err = policy.check("ModelScope", None).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::AuthRequired);
        let err = policy.check("ModelScope", Some("short")).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::AuthInvalid);
        assert_eq!(
            policy.check("ModelScope", Some(" token-12345678 ")).unwrap(),
            Some("token-12345678")
        );

        let optional = ImageProviderId::HuggingFace.descriptor().auth;
        assert_eq!(optional.check("HuggingFace", Some("   ")).unwrap(), None);
    }

    #[test]
    fn image_and_chat_families_share_prefixes() {
        for id in ImageProviderId::ALL {
            assert_eq!(ImageProviderId::from_prefix(id.prefix()), Some(id));
        }
        for id in LlmProviderId::ALL {
            assert_eq!(LlmProviderId::from_prefix(id.prefix()), id);
        }
        assert_eq!(ImageProviderId::from_prefix(ProviderPrefix::DeepSeek), None);
    }

    #[test]
    fn unknown_models_pass_through_upstream() {
        let ms = ImageProviderId::ModelScope.descriptor();
        assert_eq!(ms.upstream_model("flux-2"), "black-forest-labs/FLUX.2-dev");
        assert_eq!(ms.upstream_model("someone/custom"), "someone/custom");
    }

    #[test]
    fn ids_parse_case_insensitively() {
        assert_eq!(ImageProviderId::parse("Gitee"), Some(ImageProviderId::Gitee));
        assert_eq!(LlmProviderId::parse("gitee-llm"), Some(LlmProviderId::GiteeLlm));
        assert_eq!(ImageProviderId::parse("openai"), None);
    }
}
