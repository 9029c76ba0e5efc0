//! In-memory upstream for tests: replays scripted responses in order and
//! records every request it was asked to send.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use bytes::Bytes;
use serde_json::Value;

use crate::upstream::{
    UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};

type Scripted = Result<UpstreamHttpResponse, UpstreamFailure>;

#[derive(Debug, Default)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: Scripted) -> &Self {
        self.script
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push_back(item);
        self
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_bytes(status, "application/json", body.to_string())
    }

    pub fn push_text(&self, status: u16, body: &str) -> &Self {
        self.push_bytes(status, "text/plain", body.to_string())
    }

    pub fn push_bytes(&self, status: u16, content_type: &str, body: impl Into<Bytes>) -> &Self {
        self.push(Ok(UpstreamHttpResponse {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
        }))
    }

    pub fn push_failure(&self, kind: UpstreamTransportErrorKind, message: &str) -> &Self {
        self.push(Err(UpstreamFailure {
            kind,
            message: message.to_string(),
        }))
    }

    pub fn requests(&self) -> Vec<UpstreamHttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }
}

/// Decodes a recorded request body as JSON (`Value::Null` when absent or invalid).
pub fn body_json(req: &UpstreamHttpRequest) -> Value {
    req.body
        .as_ref()
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(Value::Null)
}

impl UpstreamClient for ScriptedUpstream {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            let url = req.url.clone();
            self.requests
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
                .push(req);
            let next = self
                .script
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
                .pop_front();
            next.unwrap_or_else(|| {
                Err(UpstreamFailure {
                    kind: UpstreamTransportErrorKind::Other,
                    message: format!("no scripted response for {url}"),
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::header_get;
    use crate::upstream::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn replays_in_order_and_records_requests() {
        let upstream = ScriptedUpstream::new();
        upstream
            .push_json(200, json!({ "task_id": "t-1" }))
            .push_text(503, "busy");

        let req = UpstreamHttpRequest::post_json("https://up/submit", &json!({ "a": 1 }))
            .unwrap()
            .bearer(Some("tok"));
        let first = upstream.send(req).await.unwrap();
        assert!(first.is_success());
        assert_eq!(first.json::<serde_json::Value>().unwrap()["task_id"], "t-1");

        let second = upstream
            .send(UpstreamHttpRequest::get("https://up/poll"))
            .await
            .unwrap();
        assert_eq!(second.status, 503);
        assert_eq!(second.text(), "busy");

        let failure = upstream
            .send(UpstreamHttpRequest::get("https://up/extra"))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, UpstreamTransportErrorKind::Other);

        let recorded = upstream.requests();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].method, HttpMethod::Post);
        assert_eq!(header_get(&recorded[0].headers, "authorization"), Some("Bearer tok"));
        assert_eq!(
            header_get(&recorded[0].headers, "content-type"),
            Some("application/json")
        );
        assert_eq!(body_json(&recorded[0]), json!({ "a": 1 }));
        assert_eq!(recorded[1].method, HttpMethod::Get);
        assert_eq!(upstream.remaining(), 0);
    }
}
