//! Builders for the prefixed model ids and bearer tokens the server expects.

use zimage_provider_core::{ImageProviderId, LlmProviderId};

/// `gitee:<token>`, `ms:<token>`, `hf:<token>`.
pub fn image_token_with_prefix(provider: ImageProviderId, token: &str) -> String {
    match provider.prefix().token_prefix() {
        Some(prefix) => format!("{prefix}{token}"),
        None => token.to_string(),
    }
}

/// HuggingFace models stay bare since unprefixed ids resolve there.
pub fn full_image_model_id(provider: ImageProviderId, model: &str) -> String {
    match provider {
        ImageProviderId::HuggingFace => model.to_string(),
        _ => format!("{}{model}", provider.prefix().model_prefix()),
    }
}

/// Pollinations needs no token; any token given is passed through bare.
pub fn chat_token_with_prefix(provider: LlmProviderId, token: &str) -> String {
    match provider.prefix().token_prefix() {
        Some(prefix) => format!("{prefix}{token}"),
        None => token.to_string(),
    }
}

pub fn full_chat_model_id(provider: LlmProviderId, model: &str) -> String {
    format!("{}{model}", provider.prefix().model_prefix())
}
