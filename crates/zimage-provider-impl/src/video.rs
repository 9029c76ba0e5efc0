//! Gitee image-to-video tasks. Unlike ModelScope images, nothing polls here:
//! the caller re-queries status by task id on its own schedule.

use std::sync::Arc;

use zimage_protocol::gitee::{GiteeTaskCreated, GiteeTaskStatus, GiteeVideoTaskRequest};
use zimage_protocol::video::VideoTaskStatus;
use zimage_provider_core::{
    ApiError, ApiResult, ImageProviderId, UpstreamClient, UpstreamHttpRequest,
};

use crate::huggingface::VIDEO_NEGATIVE_PROMPT;
use crate::upstream::{decode, encode_error, ensure_success, send_logged};

pub const GITEE_VIDEO_MODEL: &str = "Wan2_2-I2V-A14B";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTaskInput {
    pub image_url: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTaskState {
    pub status: VideoTaskStatus,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

/// Maps Gitee's status vocabulary onto the four task states.
pub fn map_gitee_status(raw: &str) -> VideoTaskStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "success" | "succeed" | "succeeded" => VideoTaskStatus::Success,
        "failure" | "failed" | "cancelled" | "canceled" => VideoTaskStatus::Failed,
        "in_progress" | "processing" | "running" => VideoTaskStatus::Processing,
        _ => VideoTaskStatus::Pending,
    }
}

#[derive(Clone)]
pub struct GiteeVideoTasks {
    client: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl GiteeVideoTasks {
    pub fn new(client: Arc<dyn UpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn token<'a>(token: Option<&'a str>) -> ApiResult<&'a str> {
        let descriptor = ImageProviderId::Gitee.descriptor();
        descriptor
            .auth
            .check(descriptor.name, token)?
            .ok_or_else(|| ApiError::auth_required(descriptor.name))
    }

    pub async fn create_task(&self, input: &VideoTaskInput, token: Option<&str>) -> ApiResult<String> {
        let name = ImageProviderId::Gitee.descriptor().name;
        let token = Self::token(token)?;
        let body = GiteeVideoTaskRequest {
            model: GITEE_VIDEO_MODEL.to_string(),
            image: input.image_url.clone(),
            prompt: input.prompt.clone(),
            negative_prompt: VIDEO_NEGATIVE_PROMPT.to_string(),
            width: input.width,
            height: input.height,
            seed: input.seed,
        };
        let upstream_req = UpstreamHttpRequest::post_json(
            format!("{}/async/videos/image-to-video", self.base_url),
            &body,
        )
        .map_err(|err| encode_error(name, err))?
        .bearer(Some(token));

        let response = send_logged(self.client.as_ref(), name, "video.create", upstream_req).await?;
        ensure_success(name, &response)?;
        let created: GiteeTaskCreated = decode(name, &response)?;
        created
            .task_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::generation_failed(name, "No task id returned"))
    }

    pub async fn get_task_status(&self, task_id: &str, token: Option<&str>) -> ApiResult<VideoTaskState> {
        let name = ImageProviderId::Gitee.descriptor().name;
        let token = Self::token(token)?;
        if task_id.is_empty()
            || !task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ApiError::invalid_params("taskId", "Invalid task id"));
        }

        let upstream_req =
            UpstreamHttpRequest::get(format!("{}/task/{task_id}", self.base_url)).bearer(Some(token));
        let response = send_logged(self.client.as_ref(), name, "video.status", upstream_req).await?;
        ensure_success(name, &response)?;
        let task: GiteeTaskStatus = decode(name, &response)?;

        let status = map_gitee_status(task.status.as_deref().unwrap_or(""));
        match status {
            VideoTaskStatus::Success => {
                let url = task
                    .video_url()
                    .ok_or_else(|| ApiError::generation_failed(name, "No video URL in result"))?;
                Ok(VideoTaskState {
                    status,
                    video_url: Some(url.to_string()),
                    error: None,
                })
            }
            VideoTaskStatus::Failed => Ok(VideoTaskState {
                status,
                video_url: None,
                error: Some(
                    task.error_message()
                        .unwrap_or_else(|| "Video generation failed".to_string()),
                ),
            }),
            VideoTaskStatus::Pending | VideoTaskStatus::Processing => Ok(VideoTaskState {
                status,
                video_url: None,
                error: None,
            }),
        }
    }
}
