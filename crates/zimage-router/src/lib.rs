//! HTTP surface: the OpenAI-compatible `/v1` routes and the native `/api`
//! routes, both over one shared [`ZImageEngine`].

mod native;
mod openai;
mod response;
mod trace;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware;
use tower_http::cors::{AllowOrigin, CorsLayer};

use zimage_common::GlobalConfig;
use zimage_core::ZImageEngine;

pub use trace::REQUEST_ID_HEADER;

/// Request-size cap on `/api/translate`, tighter than the global one.
pub const TRANSLATE_BODY_LIMIT_BYTES: usize = 20 * 1024;

const ALLOWED_HEADERS: [&str; 7] = [
    "content-type",
    "authorization",
    "x-api-key",
    "x-hf-token",
    "x-ms-token",
    "x-deepseek-token",
    "x-request-id",
];

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: Arc<ZImageEngine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl RouterConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            cors_origins: global.cors_origins.clone(),
            body_limit_bytes: global.body_limit_bytes,
        }
    }
}

pub fn app_router(engine: Arc<ZImageEngine>, config: &RouterConfig) -> Router {
    let state = AppState { engine };

    Router::new()
        .merge(openai::routes())
        .merge(native::routes())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::from_fn(trace::trace_requests))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin.trim() == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
        .expose_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}
