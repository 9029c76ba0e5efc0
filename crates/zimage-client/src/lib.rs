//! Caller-side pieces: an OpenAI-compatible client for a zimage server and
//! the token-rotation policy that spreads calls over a pool of provider
//! tokens, retiring tokens that hit their quota.

pub mod client;
pub mod error;
pub mod prefix;
pub mod rotation;

pub use client::{OpenAIClient, generate_image_with_rotation};
pub use error::ClientError;
pub use prefix::{
    chat_token_with_prefix, full_chat_model_id, full_image_model_id, image_token_with_prefix,
};
pub use rotation::{
    CredentialPool, DEFAULT_MAX_ATTEMPTS, DefaultQuotaClassifier, ExhaustedSet, QuotaClassifier,
    RotationError, select_and_invoke,
};
