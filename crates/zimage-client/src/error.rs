use zimage_protocol::openai::OpenAIErrorResponse;
use zimage_provider_core::{UpstreamFailure, upstream_error_text};

/// A failed call as seen by the caller: the server's error envelope when
/// there was one, otherwise a transport or decode failure with no status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    pub status: Option<u16>,
    pub message: String,
    /// OpenAI `type`, or `transport` / `decode` for local failures.
    pub kind: Option<String>,
    pub code: Option<String>,
    pub param: Option<String>,
}

impl ClientError {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<OpenAIErrorResponse>(body) {
            Ok(envelope) => Self {
                status: Some(status),
                message: envelope.error.message,
                kind: Some(envelope.error.kind),
                code: envelope.error.code,
                param: envelope.error.param,
            },
            Err(_) => Self {
                status: Some(status),
                message: upstream_error_text(body),
                kind: None,
                code: None,
                param: None,
            },
        }
    }

    pub fn transport(failure: &UpstreamFailure) -> Self {
        Self {
            status: None,
            message: failure.message.clone(),
            kind: Some("transport".to_string()),
            code: None,
            param: None,
        }
    }

    pub fn decode(err: &serde_json::Error) -> Self {
        Self {
            status: None,
            message: format!("invalid response body: {err}"),
            kind: Some("decode".to_string()),
            code: None,
            param: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_fields_are_kept() {
        let body = br#"{"error":{"message":"bad n","type":"invalid_request_error","param":"n","code":"INVALID_PARAMS"}}"#;
        let err = ClientError::from_response(400, body);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "bad n");
        assert_eq!(err.kind.as_deref(), Some("invalid_request_error"));
        assert_eq!(err.code.as_deref(), Some("INVALID_PARAMS"));
        assert_eq!(err.param.as_deref(), Some("n"));
    }

    #[test]
    fn foreign_bodies_fall_back_to_text() {
        let err = ClientError::from_response(502, b"Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.kind, None);
    }
}
