use zimage_provider_core::ProviderPrefix;

/// Provider and model used when a model id is empty or unprefixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDefault {
    pub prefix: ProviderPrefix,
    pub model: &'static str,
}

/// Images default to the anonymous HuggingFace Space.
pub const IMAGE_MODEL_DEFAULT: ModelDefault = ModelDefault {
    prefix: ProviderPrefix::HuggingFace,
    model: "z-image-turbo",
};

/// Chat defaults to Pollinations, which needs no token.
pub const CHAT_MODEL_DEFAULT: ModelDefault = ModelDefault {
    prefix: ProviderPrefix::Pollinations,
    model: "openai-fast",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub prefix: ProviderPrefix,
    /// Model id with the provider prefix stripped.
    pub model: String,
}

/// Splits `<prefix>/<model>`; the first matching prefix wins. Unprefixed ids go
/// to `default.prefix` unchanged, empty ids resolve to the full default pair.
pub fn resolve_model_id(raw: &str, default: ModelDefault) -> ResolvedModel {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ResolvedModel {
            prefix: default.prefix,
            model: default.model.to_string(),
        };
    }

    ProviderPrefix::ALL
        .into_iter()
        .find_map(|prefix| {
            trimmed
                .strip_prefix(prefix.model_prefix())
                .map(|rest| ResolvedModel {
                    prefix,
                    model: rest.to_string(),
                })
        })
        .unwrap_or_else(|| ResolvedModel {
            prefix: default.prefix,
            model: trimmed.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 5] = [
        "z-image-turbo",
        "flux-2",
        "black-forest-labs/FLUX.2-dev",
        "deepseek-chat",
        "a/b/c",
    ];

    #[test]
    fn prefixed_ids_split_for_every_prefix() {
        for prefix in ProviderPrefix::ALL {
            for rest in SAMPLES {
                let raw = format!("{}{rest}", prefix.model_prefix());
                for default in [IMAGE_MODEL_DEFAULT, CHAT_MODEL_DEFAULT] {
                    assert_eq!(
                        resolve_model_id(&raw, default),
                        ResolvedModel {
                            prefix,
                            model: rest.to_string(),
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn unprefixed_ids_keep_their_text_and_take_the_family_default() {
        for raw in SAMPLES {
            assert_eq!(
                resolve_model_id(raw, IMAGE_MODEL_DEFAULT),
                ResolvedModel {
                    prefix: ProviderPrefix::HuggingFace,
                    model: raw.to_string(),
                }
            );
            assert_eq!(
                resolve_model_id(raw, CHAT_MODEL_DEFAULT).prefix,
                ProviderPrefix::Pollinations
            );
        }
    }

    #[test]
    fn empty_ids_resolve_to_default_pair() {
        assert_eq!(
            resolve_model_id("  ", IMAGE_MODEL_DEFAULT),
            ResolvedModel {
                prefix: ProviderPrefix::HuggingFace,
                model: "z-image-turbo".to_string(),
            }
        );
        assert_eq!(
            resolve_model_id("", CHAT_MODEL_DEFAULT),
            ResolvedModel {
                prefix: ProviderPrefix::Pollinations,
                model: "openai-fast".to_string(),
            }
        );
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert_eq!(
            resolve_model_id("GITEE/x", CHAT_MODEL_DEFAULT),
            ResolvedModel {
                prefix: ProviderPrefix::Pollinations,
                model: "GITEE/x".to_string(),
            }
        );
    }
}
