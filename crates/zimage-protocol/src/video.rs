use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoTaskStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl VideoTaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VideoTaskStatus::Success | VideoTaskStatus::Failed)
    }
}
