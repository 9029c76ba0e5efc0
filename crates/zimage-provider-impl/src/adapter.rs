use rand::Rng;

use zimage_provider_core::{ApiResult, GenerationRequest, GenerationResult, ImageProviderId};

/// Largest seed accepted by every backend (signed 32-bit range).
pub const MAX_SEED: u64 = 2_147_483_647;

/// "Submit a generation job, return a terminal result or fail."
///
/// Implementations check the credential against the provider's auth policy
/// before any IO, then shape and send the provider-specific request.
#[async_trait::async_trait]
pub trait ImageAdapter: Send + Sync {
    fn provider(&self) -> ImageProviderId;

    async fn generate(&self, request: &GenerationRequest) -> ApiResult<GenerationResult>;
}

/// Source of seeds for requests that leave `seed` unset.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSeed;

impl SeedSource for RandomSeed {
    fn next_seed(&self) -> u64 {
        rand::rng().random_range(0..MAX_SEED)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn next_seed(&self) -> u64 {
        self.0
    }
}

pub(crate) fn seed_for(request: &GenerationRequest, seeds: &dyn SeedSource) -> u64 {
    request.seed.unwrap_or_else(|| seeds.next_seed())
}
