use std::sync::Arc;

use serde_json::json;
use zimage_protocol::modelscope::Loras;
use zimage_provider_core::testing::{ScriptedUpstream, body_json};
use zimage_provider_core::{
    ApiErrorCode, GenerationRequest, HttpMethod, ImageProviderId, UpstreamClient,
    UpstreamTransportErrorKind, header_get,
};
use zimage_provider_impl::{FixedSeed, PollingConfig, ProviderRegistry, ProviderSettings};

fn registry(upstream: &Arc<ScriptedUpstream>, max_polls: u32) -> ProviderRegistry {
    let client: Arc<dyn UpstreamClient> = upstream.clone();
    let settings = ProviderSettings {
        polling: PollingConfig::immediate(max_polls),
        ..ProviderSettings::default()
    };
    ProviderRegistry::with_seed_source(client, settings, Arc::new(FixedSeed(7)))
}

fn gitee_request() -> GenerationRequest {
    let mut req = GenerationRequest::new(ImageProviderId::Gitee, "z-image-turbo", "a bird");
    req.width = 1024;
    req.height = 768;
    req.negative_prompt = Some("blurry".to_string());
    req.auth_token = Some("key123".to_string());
    req
}

fn modelscope_request() -> GenerationRequest {
    let mut req = GenerationRequest::new(ImageProviderId::ModelScope, "flux-2", "a robot");
    req.auth_token = Some("token-12345678".to_string());
    req.seed = Some(42);
    req
}

#[tokio::test]
async fn gitee_renames_fields_and_returns_first_url() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream.push_json(200, json!({ "data": [{ "url": "https://example.com/gitee.png" }] }));
    let registry = registry(&upstream, 1);

    let result = registry
        .image(ImageProviderId::Gitee)
        .generate(&gitee_request())
        .await
        .unwrap();
    assert_eq!(result.url, "https://example.com/gitee.png");
    assert_eq!(result.seed, 7);

    let sent = upstream.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].url, "https://ai.gitee.com/v1/images/generations");
    assert_eq!(header_get(&sent[0].headers, "Authorization"), Some("Bearer key123"));
    let body = body_json(&sent[0]);
    assert_eq!(body["width"], 1024);
    assert_eq!(body["height"], 768);
    assert_eq!(body["negative_prompt"], "blurry");
    assert_eq!(body["num_inference_steps"], 9);
    assert_eq!(body["model"], "z-image-turbo");
    assert_eq!(body["seed"], 7);
}

#[tokio::test]
async fn gitee_request_bodies_are_deterministic() {
    let upstream = Arc::new(ScriptedUpstream::new());
    for _ in 0..2 {
        upstream.push_json(200, json!({ "data": [{ "url": "https://example.com/a.png" }] }));
    }
    let registry = registry(&upstream, 1);
    let provider = registry.image(ImageProviderId::Gitee);
    provider.generate(&gitee_request()).await.unwrap();
    provider.generate(&gitee_request()).await.unwrap();

    let sent = upstream.requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body, sent[1].body);
}

#[tokio::test]
async fn gitee_requires_a_token_before_any_io() {
    let upstream = Arc::new(ScriptedUpstream::new());
    let registry = registry(&upstream, 1);
    let mut req = gitee_request();
    req.auth_token = None;

    let err = registry
        .image(ImageProviderId::Gitee)
        .generate(&req)
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::AuthRequired);
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn gitee_failures_are_explicit() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(429, json!({ "error": { "message": "quota exceeded" } }))
        .push_json(200, json!({ "data": [] }));
    let registry = registry(&upstream, 1);
    let provider = registry.image(ImageProviderId::Gitee);

    let err = provider.generate(&gitee_request()).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);
    assert_eq!(err.upstream_status, Some(429));
    assert_eq!(err.http_status(), 429);
    assert!(err.message.contains("quota exceeded"));

    let err = provider.generate(&gitee_request()).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);
}

#[tokio::test]
async fn modelscope_polls_until_success() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "task_id": "task-123" }))
        .push_json(200, json!({ "task_status": "PENDING" }))
        .push_json(200, json!({ "task_status": "RUNNING" }))
        .push_json(
            200,
            json!({ "task_status": "SUCCEED", "output_images": ["https://example.com/ms.png"] }),
        );
    let registry = registry(&upstream, 3);

    let mut req = modelscope_request();
    req.negative_prompt = Some("lowres".to_string());
    req.loras = Some(Loras::Single("someone/lora".to_string()));
    let result = registry
        .image(ImageProviderId::ModelScope)
        .generate(&req)
        .await
        .unwrap();
    assert_eq!(result.url, "https://example.com/ms.png");
    assert_eq!(result.seed, 42);

    let sent = upstream.requests();
    assert_eq!(sent.len(), 4);
    let submit = &sent[0];
    assert_eq!(submit.url, "https://api-inference.modelscope.cn/v1/images/generations");
    assert_eq!(header_get(&submit.headers, "X-ModelScope-Async-Mode"), Some("true"));
    assert_eq!(
        header_get(&submit.headers, "Authorization"),
        Some("Bearer token-12345678")
    );
    let body = body_json(submit);
    assert_eq!(body["model"], "black-forest-labs/FLUX.2-dev");
    assert_eq!(body["size"], "1024x1024");
    assert_eq!(body["negative_prompt"], "lowres");
    assert_eq!(body["loras"], "someone/lora");
    assert_eq!(body["seed"], 42);

    let polls: Vec<_> = sent[1..].iter().collect();
    assert_eq!(polls.len(), 3);
    for poll in polls {
        assert_eq!(poll.method, HttpMethod::Get);
        assert_eq!(poll.url, "https://api-inference.modelscope.cn/v1/tasks/task-123");
        assert_eq!(
            header_get(&poll.headers, "X-ModelScope-Task-Type"),
            Some("image_generation")
        );
    }
}

#[tokio::test]
async fn modelscope_times_out_after_exact_budget() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "task_id": "task-1" }))
        .push_json(200, json!({ "task_status": "RUNNING" }))
        .push_json(200, json!({ "task_status": "RUNNING" }))
        .push_json(200, json!({ "task_status": "RUNNING" }));
    let registry = registry(&upstream, 2);

    let err = registry
        .image(ImageProviderId::ModelScope)
        .generate(&modelscope_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::Timeout);
    // one submit + exactly two polls
    assert_eq!(upstream.request_count(), 3);
    assert_eq!(upstream.remaining(), 1);
}

#[tokio::test]
async fn modelscope_failed_task_carries_provider_message() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "task_id": "task-1" }))
        .push_json(200, json!({ "task_status": "FAILED", "error_message": "NSFW content" }));
    let registry = registry(&upstream, 5);

    let err = registry
        .image(ImageProviderId::ModelScope)
        .generate(&modelscope_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);
    assert!(err.message.contains("NSFW content"));
    assert_eq!(upstream.request_count(), 2);
}

#[tokio::test]
async fn modelscope_rejects_short_tokens_and_missing_task_ids() {
    let upstream = Arc::new(ScriptedUpstream::new());
    let registry = registry(&upstream, 1);
    let provider = registry.image(ImageProviderId::ModelScope);

    let mut req = modelscope_request();
    req.auth_token = Some("short".to_string());
    assert_eq!(
        provider.generate(&req).await.unwrap_err().code,
        ApiErrorCode::AuthInvalid
    );
    assert_eq!(upstream.request_count(), 0);

    upstream.push_json(200, json!({}));
    let err = provider.generate(&modelscope_request()).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);
    assert_eq!(upstream.request_count(), 1);
}

#[tokio::test]
async fn modelscope_transport_timeout_during_poll() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "task_id": "task-1" }))
        .push_failure(UpstreamTransportErrorKind::Timeout, "deadline");
    let registry = registry(&upstream, 5);

    let err = registry
        .image(ImageProviderId::ModelScope)
        .generate(&modelscope_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::Timeout);
}

#[tokio::test]
async fn huggingface_reads_url_and_seed_from_sse() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "event_id": "evt-1" }))
        .push_bytes(
            200,
            "text/event-stream",
            "event: complete\ndata: [{\"url\":\"https://x/y.png\"}, 42]\n\n",
        );
    let registry = registry(&upstream, 1);

    let mut req = GenerationRequest::new(ImageProviderId::HuggingFace, "z-image-turbo", "a cat");
    req.width = 768;
    req.height = 512;
    let result = registry
        .image(ImageProviderId::HuggingFace)
        .generate(&req)
        .await
        .unwrap();
    assert_eq!(result.url, "https://x/y.png");
    assert_eq!(result.seed, 42);

    let sent = upstream.requests();
    assert_eq!(
        sent[0].url,
        "https://mrfakename-z-image-turbo.hf.space/gradio_api/call/generate_image"
    );
    assert_eq!(header_get(&sent[0].headers, "Authorization"), None);
    assert_eq!(
        body_json(&sent[0]),
        json!({ "data": ["a cat", 512, 768, 9, 7, false] })
    );
    assert_eq!(
        sent[1].url,
        "https://mrfakename-z-image-turbo.hf.space/gradio_api/call/generate_image/evt-1"
    );
}

#[tokio::test]
async fn huggingface_error_event_and_missing_terminal_fail() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "event_id": "evt-1" }))
        .push_text(200, "event: error\ndata: \"You have exceeded your GPU quota\"\n\n")
        .push_json(200, json!({ "event_id": "evt-2" }))
        .push_text(200, "event: heartbeat\ndata: null\n\n");
    let registry = registry(&upstream, 1);
    let provider = registry.image(ImageProviderId::HuggingFace);
    let mut req = GenerationRequest::new(ImageProviderId::HuggingFace, "flux-schnell", "a cat");
    req.auth_token = Some("hf_abcdefgh".to_string());

    let err = provider.generate(&req).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);
    assert!(err.message.contains("GPU quota"));

    let err = provider.generate(&req).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);

    let sent = upstream.requests();
    assert_eq!(sent.len(), 4);
    assert_eq!(
        header_get(&sent[0].headers, "Authorization"),
        Some("Bearer hf_abcdefgh")
    );
}

#[tokio::test]
async fn huggingface_unknown_model_is_rejected_without_io() {
    let upstream = Arc::new(ScriptedUpstream::new());
    let registry = registry(&upstream, 1);
    let req = GenerationRequest::new(ImageProviderId::HuggingFace, "sdxl", "a cat");

    let err = registry
        .image(ImageProviderId::HuggingFace)
        .generate(&req)
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::InvalidParams);
    assert_eq!(err.param.as_deref(), Some("model"));
    assert_eq!(upstream.request_count(), 0);
}

#[tokio::test]
async fn upscaler_sends_file_data_and_scale() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "event_id": "up-1" }))
        .push_text(200, "event: complete\ndata: [{\"url\":\"https://x/big.png\"}]\n\n");
    let registry = registry(&upstream, 1);

    let url = registry
        .huggingface()
        .upscale("https://x.hf.space/small.png", 2, None)
        .await
        .unwrap();
    assert_eq!(url, "https://x/big.png");

    let body = body_json(&upstream.requests()[0]);
    assert_eq!(
        body,
        json!({ "data": [
            { "path": "https://x.hf.space/small.png", "meta": { "_type": "gradio.FileData" } },
            "RealESRGAN_x4plus",
            0.5,
            false,
            2
        ] })
    );
}
