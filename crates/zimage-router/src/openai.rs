use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use bytes::Bytes;

use zimage_protocol::openai::{ChatCompletionRequest, ImageGenerationRequest};

use crate::AppState;
use crate::response::{authorization, openai_json, parse_json};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/images/generations", post(images_generations))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
}

async fn images_generations(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: ImageGenerationRequest = match parse_json(&body) {
        Ok(request) => request,
        Err(err) => return openai_json::<()>(Err(err)),
    };
    openai_json(
        state
            .engine
            .images_generations(authorization(&headers), request)
            .await,
    )
}

async fn chat_completions(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: ChatCompletionRequest = match parse_json(&body) {
        Ok(request) => request,
        Err(err) => return openai_json::<()>(Err(err)),
    };
    openai_json(
        state
            .engine
            .chat_completions(authorization(&headers), request)
            .await,
    )
}

async fn list_models(State(state): State<AppState>) -> Response {
    openai_json(Ok(state.engine.list_models()))
}
