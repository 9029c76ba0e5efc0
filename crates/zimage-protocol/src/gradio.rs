//! Gradio queue API: `POST {space}/gradio_api/call/{fn}` with a positional
//! `data` array, then `GET {space}/gradio_api/call/{fn}/{event_id}` for the SSE result.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradioCallRequest {
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradioCallResponse {
    #[serde(default)]
    pub event_id: Option<String>,
}

pub fn call_url(space: &str, function: &str) -> String {
    format!("{}/gradio_api/call/{function}", space.trim_end_matches('/'))
}

pub fn result_url(space: &str, function: &str, event_id: &str) -> String {
    format!("{}/{event_id}", call_url(space, function))
}

/// Remote file argument as Gradio expects it for image inputs.
pub fn file_data(url: &str) -> Value {
    json!({ "path": url, "meta": { "_type": "gradio.FileData" } })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradioOutput {
    pub url: String,
    pub seed: Option<u64>,
}

impl GradioOutput {
    /// Reads `data[0].url` (or `data[0].video.url`) and an optional seed in `data[1]`.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let items = payload.as_array()?;
        let first = items.first()?;
        let url = first
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| {
                first
                    .get("video")
                    .and_then(|video| video.get("url"))
                    .and_then(Value::as_str)
            })
            .filter(|url| !url.is_empty())?;
        let seed = items.get(1).and_then(seed_from_value);
        Some(Self {
            url: url.to_string(),
            seed,
        })
    }
}

fn seed_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
