//! Gitee AI REST bodies (`ai.gitee.com/v1`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiteeImageRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    pub response_format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteeImageResponse {
    #[serde(default)]
    pub data: Vec<GiteeImageData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteeImageData {
    #[serde(default)]
    pub url: Option<String>,
}

impl GiteeImageResponse {
    pub fn first_url(&self) -> Option<&str> {
        self.data
            .iter()
            .filter_map(|item| item.url.as_deref())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiteeVideoTaskRequest {
    pub model: String,
    pub image: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteeTaskCreated {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteeTaskStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<GiteeTaskOutput>,
    /// Either a plain string or `{ "message": ... }` depending on the failure path.
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiteeTaskOutput {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl GiteeTaskStatus {
    pub fn video_url(&self) -> Option<&str> {
        let output = self.output.as_ref()?;
        fn present(url: &Option<String>) -> Option<&str> {
            url.as_deref().filter(|url| !url.is_empty())
        }
        present(&output.file_url).or_else(|| present(&output.video_url))
    }

    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::String(message) if !message.is_empty() => Some(message.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
