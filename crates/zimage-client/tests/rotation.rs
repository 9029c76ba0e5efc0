use std::sync::{Arc, Mutex};

use serde_json::json;

use zimage_client::{
    ClientError, CredentialPool, DEFAULT_MAX_ATTEMPTS, DefaultQuotaClassifier, ExhaustedSet,
    OpenAIClient, RotationError, generate_image_with_rotation, select_and_invoke,
};
use zimage_protocol::openai::ImageGenerationRequest;
use zimage_provider_core::testing::{ScriptedUpstream, body_json};
use zimage_provider_core::{ImageProviderId, header_get};

fn failure(status: u16, message: &str) -> ClientError {
    ClientError {
        status: Some(status),
        message: message.to_string(),
        kind: None,
        code: None,
        param: None,
    }
}

/// Records every token the policy hands out and answers from `outcomes`.
struct Recorder {
    seen: Mutex<Vec<Option<String>>>,
    outcomes: Mutex<Vec<Result<&'static str, ClientError>>>,
}

impl Recorder {
    fn new(outcomes: Vec<Result<&'static str, ClientError>>) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
        }
    }

    fn next(&self, token: Option<String>) -> Result<&'static str, ClientError> {
        self.seen.lock().unwrap().push(token);
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(failure(500, "unexpected call")))
    }

    fn seen(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

async fn run(
    requires_auth: bool,
    pool: &CredentialPool,
    exhausted: &mut ExhaustedSet,
    max_attempts: u32,
    recorder: &Recorder,
) -> Result<&'static str, RotationError> {
    select_and_invoke(
        requires_auth,
        pool,
        exhausted,
        max_attempts,
        &DefaultQuotaClassifier,
        |token| {
            let outcome = recorder.next(token);
            async move { outcome }
        },
    )
    .await
}

#[tokio::test]
async fn all_exhausted_with_auth_fails_without_calling() {
    let pool = CredentialPool::new(["a", "b", "c"]);
    let mut exhausted = ExhaustedSet::new();
    for token in ["a", "b", "c"] {
        exhausted.mark(token);
    }
    let recorder = Recorder::new(vec![]);

    let err = run(true, &pool, &mut exhausted, DEFAULT_MAX_ATTEMPTS, &recorder)
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::AllCredentialsExhausted));
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn empty_pool_needs_a_credential_when_auth_is_required() {
    let recorder = Recorder::new(vec![]);
    let err = run(
        true,
        &CredentialPool::default(),
        &mut ExhaustedSet::new(),
        DEFAULT_MAX_ATTEMPTS,
        &recorder,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RotationError::NoCredential));
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn optional_auth_falls_back_to_anonymous() {
    let recorder = Recorder::new(vec![Ok("anonymous")]);
    let value = run(
        false,
        &CredentialPool::default(),
        &mut ExhaustedSet::new(),
        DEFAULT_MAX_ATTEMPTS,
        &recorder,
    )
    .await
    .unwrap();
    assert_eq!(value, "anonymous");
    assert_eq!(recorder.seen(), vec![None]);

    let pool = CredentialPool::new(["a"]);
    let mut exhausted = ExhaustedSet::new();
    let recorder = Recorder::new(vec![Err(failure(429, "slow down")), Ok("anonymous")]);
    let value = run(false, &pool, &mut exhausted, DEFAULT_MAX_ATTEMPTS, &recorder)
        .await
        .unwrap();
    assert_eq!(value, "anonymous");
    assert_eq!(recorder.seen(), vec![Some("a".to_string()), None]);
    assert!(exhausted.contains("a"));
}

#[tokio::test]
async fn quota_failures_retire_tokens_in_pool_order() {
    let pool = CredentialPool::new(["first", "second", "third"]);
    let mut exhausted = ExhaustedSet::new();
    let recorder = Recorder::new(vec![
        Err(failure(429, "Too Many Requests")),
        Err(failure(403, "quota exceeded for today")),
        Ok("done"),
    ]);

    let value = run(true, &pool, &mut exhausted, DEFAULT_MAX_ATTEMPTS, &recorder)
        .await
        .unwrap();
    assert_eq!(value, "done");
    assert_eq!(
        recorder.seen(),
        vec![
            Some("first".to_string()),
            Some("second".to_string()),
            Some("third".to_string()),
        ]
    );
    assert!(exhausted.contains("first"));
    assert!(exhausted.contains("second"));
    assert!(!exhausted.contains("third"));
    assert_eq!(pool.len(), 3);
}

#[tokio::test]
async fn other_failures_propagate_without_marking() {
    let pool = CredentialPool::new(["a", "b"]);
    let mut exhausted = ExhaustedSet::new();
    let recorder = Recorder::new(vec![Err(failure(400, "Prompt is required"))]);

    let err = run(true, &pool, &mut exhausted, DEFAULT_MAX_ATTEMPTS, &recorder)
        .await
        .unwrap_err();
    match err {
        RotationError::Call(err) => assert_eq!(err.status, Some(400)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(exhausted.is_empty());
    assert_eq!(recorder.seen(), vec![Some("a".to_string())]);
}

#[tokio::test]
async fn attempts_run_out_before_the_pool_does() {
    let pool = CredentialPool::new(["a", "b", "c"]);
    let mut exhausted = ExhaustedSet::new();
    let recorder = Recorder::new(vec![
        Err(failure(429, "limit")),
        Err(failure(429, "limit")),
    ]);

    let err = run(true, &pool, &mut exhausted, 2, &recorder)
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::MaxAttemptsReached));
    assert_eq!(exhausted.len(), 2);
    assert!(!exhausted.contains("c"));
}

#[tokio::test]
async fn cleared_set_makes_tokens_selectable_again() {
    let pool = CredentialPool::new(["a"]);
    let mut exhausted = ExhaustedSet::new();
    exhausted.mark("a");
    exhausted.clear();
    let recorder = Recorder::new(vec![Ok("ok")]);

    run(true, &pool, &mut exhausted, DEFAULT_MAX_ATTEMPTS, &recorder)
        .await
        .unwrap();
    assert_eq!(recorder.seen(), vec![Some("a".to_string())]);
}

#[tokio::test]
async fn rotation_through_the_client_prefixes_tokens_and_models() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(
            429,
            json!({ "error": { "message": "Gitee AI rate limited", "type": "rate_limit_error", "code": "PROVIDER_ERROR" } }),
        )
        .push_json(
            200,
            json!({ "created": 1, "data": [{ "url": "https://gitee.com/out.png" }] }),
        );
    let client = OpenAIClient::new("http://localhost:8787/", upstream.clone());
    let pool = CredentialPool::new(["k1", "k2"]);
    let mut exhausted = ExhaustedSet::new();
    let request = ImageGenerationRequest {
        prompt: "a red fox".to_string(),
        ..Default::default()
    };

    let response = generate_image_with_rotation(
        &client,
        ImageProviderId::Gitee,
        &pool,
        &mut exhausted,
        DEFAULT_MAX_ATTEMPTS,
        &request,
    )
    .await
    .unwrap();
    assert_eq!(response.data[0].url, "https://gitee.com/out.png");
    assert!(exhausted.contains("k1"));

    let requests = upstream.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "http://localhost:8787/v1/images/generations");
    assert_eq!(header_get(&requests[0].headers, "authorization"), Some("Bearer gitee:k1"));
    assert_eq!(header_get(&requests[1].headers, "authorization"), Some("Bearer gitee:k2"));
    assert_eq!(body_json(&requests[1])["model"], "gitee/z-image-turbo");
    assert_eq!(body_json(&requests[1])["prompt"], "a red fox");
}

#[tokio::test]
async fn huggingface_rotation_ends_anonymous() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(
            429,
            json!({ "error": { "message": "You have exceeded your GPU quota", "type": "rate_limit_error" } }),
        )
        .push_json(
            200,
            json!({ "created": 1, "data": [{ "url": "https://x.hf.space/file=out.png" }] }),
        );
    let client = OpenAIClient::new("http://localhost:8787", upstream.clone());
    let request = ImageGenerationRequest {
        model: Some("flux-schnell".to_string()),
        prompt: "a lighthouse".to_string(),
        ..Default::default()
    };

    generate_image_with_rotation(
        &client,
        ImageProviderId::HuggingFace,
        &CredentialPool::new(["hf-token-1"]),
        &mut ExhaustedSet::new(),
        DEFAULT_MAX_ATTEMPTS,
        &request,
    )
    .await
    .unwrap();

    let requests = upstream.requests();
    assert_eq!(
        header_get(&requests[0].headers, "authorization"),
        Some("Bearer hf:hf-token-1")
    );
    assert_eq!(header_get(&requests[1].headers, "authorization"), None);
    assert_eq!(body_json(&requests[1])["model"], "flux-schnell");
}

#[tokio::test]
async fn client_decodes_error_envelopes() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream.push_json(
        400,
        json!({ "error": { "message": "Only n=1 is supported", "type": "invalid_request_error", "param": "n", "code": "INVALID_PARAMS" } }),
    );
    let client = OpenAIClient::new("http://localhost:8787", upstream);
    let request = ImageGenerationRequest {
        prompt: "x".to_string(),
        n: Some(2),
        ..Default::default()
    };

    let err = client.generate_image(Some("gitee:k"), &request).await.unwrap_err();
    assert_eq!(err.status, Some(400));
    assert_eq!(err.code.as_deref(), Some("INVALID_PARAMS"));
    assert_eq!(err.param.as_deref(), Some("n"));
    assert_eq!(err.message, "Only n=1 is supported");
}

#[tokio::test]
async fn list_models_is_a_plain_get() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream.push_json(
        200,
        json!({ "object": "list", "data": [{ "id": "z-image-turbo", "object": "model", "created": 1, "owned_by": "huggingface" }] }),
    );
    let client = OpenAIClient::new("http://localhost:8787", upstream.clone());

    let models = client.list_models().await.unwrap();
    assert_eq!(models.data[0].id, "z-image-turbo");
    assert_eq!(upstream.requests()[0].url, "http://localhost:8787/v1/models");
    assert_eq!(header_get(&upstream.requests()[0].headers, "authorization"), None);
}
