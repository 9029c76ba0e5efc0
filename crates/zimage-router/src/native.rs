use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use serde::Deserialize;

use zimage_protocol::native::{
    GenerateRequest, OptimizeRequest, TranslateRequest, UpscaleRequest, VideoGenerateRequest,
};

use crate::response::{headers_to_vec, native_failure, native_json, parse_json};
use crate::{AppState, TRANSLATE_BODY_LIMIT_BYTES};

const PROXY_CACHE_CONTROL: &str = "public, max-age=86400";

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(health))
        .route("/api/providers", get(providers))
        .route("/api/providers/{provider}/models", get(provider_models))
        .route("/api/models", get(models))
        .route("/api/llm-providers", get(llm_providers))
        .route("/api/generate", post(generate))
        .route("/api/generate-hf", post(generate_hf))
        .route("/api/optimize", post(optimize))
        .route(
            "/api/translate",
            post(translate).layer(DefaultBodyLimit::max(TRANSLATE_BODY_LIMIT_BYTES)),
        )
        .route("/api/upscale", post(upscale))
        .route("/api/proxy-image", get(proxy_image))
        .route("/api/video/generate", post(create_video))
        .route("/api/video/status/{task_id}", get(video_status))
}

/// Decodes a JSON body or returns the native error response from the handler.
macro_rules! json_body {
    ($body:expr) => {
        match parse_json(&$body) {
            Ok(value) => value,
            Err(err) => return native_failure(&err),
        }
    };
}

async fn health(State(state): State<AppState>) -> Response {
    native_json(Ok(state.engine.health()))
}

async fn providers(State(state): State<AppState>) -> Response {
    native_json(Ok(state.engine.providers()))
}

async fn provider_models(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    native_json(state.engine.provider_models(&provider))
}

async fn models(State(state): State<AppState>) -> Response {
    native_json(Ok(state.engine.models()))
}

async fn llm_providers(State(state): State<AppState>) -> Response {
    native_json(Ok(state.engine.llm_providers()))
}

async fn generate(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: GenerateRequest = json_body!(body);
    native_json(state.engine.generate(&headers_to_vec(&headers), request).await)
}

async fn generate_hf(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: GenerateRequest = json_body!(body);
    native_json(state.engine.generate_hf(&headers_to_vec(&headers), request).await)
}

async fn optimize(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: OptimizeRequest = json_body!(body);
    native_json(state.engine.optimize(&headers_to_vec(&headers), request).await)
}

async fn translate(State(state): State<AppState>, body: Bytes) -> Response {
    let request: TranslateRequest = json_body!(body);
    native_json(state.engine.translate(request).await)
}

async fn upscale(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: UpscaleRequest = json_body!(body);
    native_json(state.engine.upscale(&headers_to_vec(&headers), request).await)
}

#[derive(Debug, Default, Deserialize)]
struct ProxyImageQuery {
    #[serde(default)]
    url: String,
}

async fn proxy_image(State(state): State<AppState>, Query(query): Query<ProxyImageQuery>) -> Response {
    match state.engine.proxy_image(&query.url).await {
        Ok(image) => (
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, PROXY_CACHE_CONTROL.to_string()),
            ],
            image.body,
        )
            .into_response(),
        Err(err) => native_failure(&err),
    }
}

async fn create_video(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: VideoGenerateRequest = json_body!(body);
    native_json(state.engine.create_video(&headers_to_vec(&headers), request).await)
}

async fn video_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Response {
    native_json(state.engine.video_status(&headers_to_vec(&headers), &task_id).await)
}
