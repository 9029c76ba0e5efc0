//! ModelScope async inference bodies (`api-inference.modelscope.cn/v1`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const ASYNC_MODE_HEADER: &str = "X-ModelScope-Async-Mode";
pub const TASK_TYPE_HEADER: &str = "X-ModelScope-Task-Type";
pub const TASK_TYPE_IMAGE: &str = "image_generation";

/// LoRA selection: either a single adapter repo id or a map of repo id to weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loras {
    Single(String),
    Weighted(BTreeMap<String, f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScopeSubmitRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// `"{width}x{height}"`
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loras: Option<Loras>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelScopeSubmitResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelScopeTask {
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub output_images: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ModelScopeTask {
    /// Anything that is not an explicit success or failure counts as still running.
    pub fn phase(&self) -> TaskPhase {
        match self.task_status.as_deref() {
            Some("SUCCEED") | Some("SUCCEEDED") => TaskPhase::Succeeded,
            Some("FAILED") => TaskPhase::Failed,
            _ => TaskPhase::Running,
        }
    }

    pub fn first_image(&self) -> Option<&str> {
        self.output_images
            .iter()
            .map(String::as_str)
            .find(|url| !url.is_empty())
    }
}
