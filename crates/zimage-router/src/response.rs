use axum::Json;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use zimage_core::{native_error, openai_error};
use zimage_provider_core::{ApiError, ApiResult, Headers};

pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|err| {
        ApiError::invalid_params("body", format!("Invalid JSON body: {err}"))
    })
}

/// `/v1` responses: the value as JSON, or the OpenAI error envelope.
pub(crate) fn openai_json<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => {
            let (status, body) = openai_error(&err);
            (status, Json(body)).into_response()
        }
    }
}

/// `/api` responses: the value as JSON, or `{error, code, details?}`.
pub(crate) fn native_json<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => native_failure(&err),
    }
}

pub(crate) fn native_failure(err: &ApiError) -> Response {
    let (status, body) = native_error(err);
    (status, Json(body)).into_response()
}

pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}

pub(crate) fn headers_to_vec(headers: &HeaderMap) -> Headers {
    let mut out: Headers = Vec::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            out.push((name.as_str().to_string(), v.to_string()));
        }
    }
    out
}
