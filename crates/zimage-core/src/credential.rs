use zimage_provider_core::ProviderPrefix;

/// Token and optional provider hint carried by an `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerCredential {
    pub provider_hint: Option<ProviderPrefix>,
    pub token: Option<String>,
}

/// Parses `Bearer [<prefix>:]<token>`.
///
/// A recognized prefix with nothing after it yields no token and no hint at
/// all, rather than an empty token for that provider.
pub fn parse_bearer(header: Option<&str>) -> BearerCredential {
    let Some(raw) = header.and_then(|value| value.strip_prefix("Bearer ")) else {
        return BearerCredential::default();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return BearerCredential::default();
    }

    for prefix in ProviderPrefix::ALL {
        let Some(marker) = prefix.token_prefix() else {
            continue;
        };
        if let Some(token) = raw.strip_prefix(marker) {
            let token = token.trim();
            if token.is_empty() {
                return BearerCredential::default();
            }
            return BearerCredential {
                provider_hint: Some(prefix),
                token: Some(token.to_string()),
            };
        }
    }

    BearerCredential {
        provider_hint: None,
        token: Some(raw.to_string()),
    }
}
