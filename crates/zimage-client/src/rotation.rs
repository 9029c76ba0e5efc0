//! Token rotation over a per-provider credential pool.
//!
//! Tokens are tried in pool order. A quota failure retires the token into the
//! caller-owned [`ExhaustedSet`] and the next one is tried; any other failure
//! ends the sequence. The pool itself is never mutated, and the set is only
//! ever cleared by its owner.

use std::collections::HashSet;
use std::future::Future;

use crate::error::ClientError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const QUOTA_MARKERS: [&str; 6] = [
    "quota",
    "rate limit",
    "too many requests",
    "exceeded",
    "insufficient",
    "credit",
];

/// Decides whether a failure was caused by the credential rather than the
/// request, i.e. whether another token from the same pool might succeed.
pub trait QuotaClassifier: Send + Sync {
    fn is_quota_error(&self, err: &ClientError) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQuotaClassifier;

impl QuotaClassifier for DefaultQuotaClassifier {
    fn is_quota_error(&self, err: &ClientError) -> bool {
        if err.status == Some(429) {
            return true;
        }
        let message = err.message.to_ascii_lowercase();
        QUOTA_MARKERS.iter().any(|marker| message.contains(marker))
    }
}

/// Ordered tokens for one provider. Blank and repeated entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    tokens: Vec<String>,
}

impl CredentialPool {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pool = Vec::new();
        for token in tokens {
            let token = token.into().trim().to_string();
            if !token.is_empty() && !pool.contains(&token) {
                pool.push(token);
            }
        }
        Self { tokens: pool }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First token, in pool order, not yet marked exhausted.
    pub fn next_available<'a>(&'a self, exhausted: &ExhaustedSet) -> Option<&'a str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .find(|token| !exhausted.contains(token))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExhaustedSet {
    tokens: HashSet<String>,
}

impl ExhaustedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, token: &str) {
        self.tokens.insert(token.to_string());
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Makes every token selectable again (e.g. when provider quotas reset).
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("No API token configured for this provider")]
    NoCredential,
    #[error("All API tokens exhausted. Quota will reset tomorrow.")]
    AllCredentialsExhausted,
    #[error("Maximum retry attempts reached")]
    MaxAttemptsReached,
    #[error(transparent)]
    Call(#[from] ClientError),
}

/// Runs `call` with tokens from `pool` until one succeeds.
///
/// `call` receives `None` for an anonymous attempt, which only happens when
/// `requires_auth` is false and no token is left to try.
pub async fn select_and_invoke<T, F, Fut>(
    requires_auth: bool,
    pool: &CredentialPool,
    exhausted: &mut ExhaustedSet,
    max_attempts: u32,
    classifier: &dyn QuotaClassifier,
    mut call: F,
) -> Result<T, RotationError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    if pool.is_empty() {
        if requires_auth {
            return Err(RotationError::NoCredential);
        }
        tracing::debug!(event = "credential_anonymous", reason = "empty_pool");
        return Ok(call(None).await?);
    }

    let mut attempts = 0;
    while attempts < max_attempts {
        let Some(token) = pool.next_available(exhausted) else {
            if requires_auth {
                tracing::warn!(event = "credentials_exhausted", pool_size = pool.len());
                return Err(RotationError::AllCredentialsExhausted);
            }
            tracing::debug!(event = "credential_anonymous", reason = "pool_exhausted");
            return Ok(call(None).await?);
        };

        match call(Some(token.to_string())).await {
            Ok(value) => return Ok(value),
            Err(err) if classifier.is_quota_error(&err) => {
                attempts += 1;
                exhausted.mark(token);
                tracing::warn!(
                    event = "credential_exhausted",
                    attempt = attempts,
                    status = err.status,
                    error = %err
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(RotationError::MaxAttemptsReached)
}
