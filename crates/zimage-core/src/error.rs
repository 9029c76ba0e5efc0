use http::StatusCode;
use serde_json::{Map, Value, json};

use zimage_protocol::native::NativeErrorBody;
use zimage_protocol::openai::{OpenAIErrorBody, OpenAIErrorResponse};
use zimage_provider_core::ApiError;

fn status_of(err: &ApiError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Error envelope of the `/v1` surface.
pub fn openai_error(err: &ApiError) -> (StatusCode, OpenAIErrorResponse) {
    let body = OpenAIErrorResponse {
        error: OpenAIErrorBody {
            message: err.message.clone(),
            kind: err.code.openai_type().to_string(),
            param: err.param.clone(),
            code: Some(err.code.as_str().to_string()),
        },
    };
    (status_of(err), body)
}

/// Error body of the native `/api` surface.
pub fn native_error(err: &ApiError) -> (StatusCode, NativeErrorBody) {
    let mut details = Map::new();
    if let Some(provider) = &err.provider {
        details.insert("provider".to_string(), json!(provider));
    }
    if let Some(param) = &err.param {
        details.insert("param".to_string(), json!(param));
    }
    if let Some(status) = err.upstream_status {
        details.insert("upstreamStatus".to_string(), json!(status));
    }
    let body = NativeErrorBody {
        error: err.message.clone(),
        code: err.code.as_str().to_string(),
        details: (!details.is_empty()).then_some(Value::Object(details)),
    };
    (status_of(err), body)
}
