use rand::Rng;
use rand::distr::Alphanumeric;

const COMPLETION_ID_LEN: usize = 24;

/// Source of chat completion ids, swappable for deterministic tests.
pub trait IdGenerator: Send + Sync {
    fn completion_id(&self) -> String;
}

/// `chatcmpl-` followed by random lowercase alphanumerics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn completion_id(&self) -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(COMPLETION_ID_LEN)
            .map(|byte| char::from(byte).to_ascii_lowercase())
            .collect();
        format!("chatcmpl-{suffix}")
    }
}
