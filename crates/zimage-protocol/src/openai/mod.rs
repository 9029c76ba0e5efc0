pub mod chat;
pub mod error;
pub mod images;
pub mod models;

pub use chat::{
    ChatCompletionChoice, ChatCompletionObjectType, ChatCompletionRequest, ChatCompletionResponse,
    ChatFinishReason, ChatMessage, ChatRole, UpstreamChatCompletion,
};
pub use error::{OpenAIErrorBody, OpenAIErrorResponse};
pub use images::{ImageData, ImageGenerationRequest, ImagesResponse};
pub use models::{ListModelsResponse, ListObjectType, Model, ModelObjectType};
