//! The request-facing core: credential and model-id resolution, the
//! OpenAI-compatible facade and native `/api` operations over the provider
//! registry, and the `wreq`-backed upstream client.

pub mod credential;
pub mod engine;
pub mod error;
pub mod ids;
pub mod image_url;
pub mod model_id;
mod native;
pub mod upstream_client;

pub use credential::{BearerCredential, parse_bearer};
pub use engine::{EngineConfig, ProxiedImage, ZImageEngine};
pub use error::{native_error, openai_error};
pub use ids::{IdGenerator, RandomIdGenerator};
pub use image_url::is_allowed_image_url;
pub use model_id::{
    CHAT_MODEL_DEFAULT, IMAGE_MODEL_DEFAULT, ModelDefault, ResolvedModel, resolve_model_id,
};
pub use native::{MAX_TRANSLATE_CHARS, OPTIMIZE_SYSTEM_PROMPT, TRANSLATE_SYSTEM_PROMPT};
pub use upstream_client::{UpstreamClientConfig, WreqUpstreamClient};
