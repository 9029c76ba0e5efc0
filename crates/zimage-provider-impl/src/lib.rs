//! Protocol adapters for every upstream zimage talks to.
//!
//! - [`gitee`]: synchronous REST image generation
//! - [`modelscope`]: submit + poll-until-terminal image generation
//! - [`huggingface`]: Gradio queue + SSE (images, upscaler, image-to-video)
//! - [`chat`]: OpenAI-compatible chat completions
//! - [`video`]: Gitee image-to-video task create/query
//!
//! [`ProviderRegistry`] owns one instance of each and dispatches by provider id.

pub mod adapter;
pub mod chat;
pub mod gitee;
pub mod gradio;
pub mod huggingface;
pub mod modelscope;
pub mod registry;
pub mod settings;
pub mod upstream;
pub mod video;

pub use adapter::{FixedSeed, ImageAdapter, RandomSeed, SeedSource};
pub use chat::{ChatAdapter, ChatInput};
pub use registry::{ImageProvider, ProviderRegistry};
pub use settings::{PollingConfig, ProviderSettings};
pub use video::{GiteeVideoTasks, VideoTaskInput, VideoTaskState};
