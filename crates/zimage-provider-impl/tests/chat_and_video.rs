use std::sync::Arc;

use serde_json::json;
use zimage_protocol::video::VideoTaskStatus;
use zimage_provider_core::testing::{ScriptedUpstream, body_json};
use zimage_provider_core::{ApiErrorCode, LlmProviderId, UpstreamClient, header_get};
use zimage_provider_impl::{
    ChatInput, FixedSeed, ProviderRegistry, ProviderSettings, VideoTaskInput,
};

fn registry(upstream: &Arc<ScriptedUpstream>) -> ProviderRegistry {
    let client: Arc<dyn UpstreamClient> = upstream.clone();
    ProviderRegistry::with_seed_source(client, ProviderSettings::default(), Arc::new(FixedSeed(11)))
}

fn input(model: &str) -> ChatInput {
    ChatInput {
        model: model.to_string(),
        system: Some("You are a prompt optimizer".to_string()),
        user: "a cat".to_string(),
        temperature: None,
        max_tokens: Some(100),
    }
}

#[tokio::test]
async fn pollinations_is_anonymous_and_openai_shaped() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream.push_json(200, json!({ "choices": [{ "message": { "content": " optimized prompt " } }] }));
    let registry = registry(&upstream);

    let content = registry
        .chat()
        .complete(LlmProviderId::Pollinations, None, &input(""))
        .await
        .unwrap();
    assert_eq!(content, "optimized prompt");

    let sent = upstream.requests();
    assert_eq!(sent[0].url, "https://text.pollinations.ai/openai");
    assert_eq!(header_get(&sent[0].headers, "Authorization"), None);
    assert_eq!(
        body_json(&sent[0]),
        json!({
            "model": "openai-fast",
            "messages": [
                { "role": "system", "content": "You are a prompt optimizer" },
                { "role": "user", "content": "a cat" }
            ],
            "max_tokens": 100
        })
    );
}

#[tokio::test]
async fn authenticated_chat_providers_check_tokens_first() {
    let upstream = Arc::new(ScriptedUpstream::new());
    let registry = registry(&upstream);

    let err = registry
        .chat()
        .complete(LlmProviderId::DeepSeek, None, &input("deepseek-chat"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::AuthRequired);
    assert_eq!(upstream.request_count(), 0);

    upstream.push_json(200, json!({ "choices": [{ "message": { "content": "hi" } }] }));
    registry
        .chat()
        .complete(LlmProviderId::DeepSeek, Some("sk-12345678"), &input("deepseek-reasoner"))
        .await
        .unwrap();
    let sent = upstream.requests();
    assert_eq!(sent[0].url, "https://api.deepseek.com/chat/completions");
    assert_eq!(header_get(&sent[0].headers, "Authorization"), Some("Bearer sk-12345678"));
    assert_eq!(body_json(&sent[0])["model"], "deepseek-reasoner");
}

#[tokio::test]
async fn empty_or_failed_chat_responses_are_errors() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "choices": [{ "message": { "content": "   " } }] }))
        .push_json(429, json!({ "error": "Too Many Requests" }));
    let registry = registry(&upstream);

    let err = registry
        .chat()
        .complete(LlmProviderId::Pollinations, None, &input("openai"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);

    let err = registry
        .chat()
        .complete(LlmProviderId::Pollinations, None, &input("openai"))
        .await
        .unwrap_err();
    assert_eq!(err.upstream_status, Some(429));
    assert!(err.message.contains("Too Many Requests"));
}

#[tokio::test]
async fn video_task_create_then_query() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "task_id": "vid-1" }))
        .push_json(200, json!({ "status": "in_progress" }))
        .push_json(200, json!({ "status": "success", "output": { "file_url": "https://x/v.mp4" } }))
        .push_json(200, json!({ "status": "failure", "error": { "message": "bad image" } }));
    let registry = registry(&upstream);
    let video = registry.video();

    let task_input = VideoTaskInput {
        image_url: "https://x/in.png".to_string(),
        prompt: "waves".to_string(),
        width: 832,
        height: 480,
        seed: None,
    };
    let task_id = video.create_task(&task_input, Some("gitee-key")).await.unwrap();
    assert_eq!(task_id, "vid-1");

    let state = video.get_task_status(&task_id, Some("gitee-key")).await.unwrap();
    assert_eq!(state.status, VideoTaskStatus::Processing);
    let state = video.get_task_status(&task_id, Some("gitee-key")).await.unwrap();
    assert_eq!(state.status, VideoTaskStatus::Success);
    assert_eq!(state.video_url.as_deref(), Some("https://x/v.mp4"));
    let state = video.get_task_status(&task_id, Some("gitee-key")).await.unwrap();
    assert_eq!(state.status, VideoTaskStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("bad image"));

    let sent = upstream.requests();
    assert_eq!(sent[0].url, "https://ai.gitee.com/v1/async/videos/image-to-video");
    let body = body_json(&sent[0]);
    assert_eq!(body["model"], "Wan2_2-I2V-A14B");
    assert_eq!(body["image"], "https://x/in.png");
    assert!(body["negative_prompt"].as_str().unwrap().starts_with("Vivid colors"));
    assert_eq!(sent[1].url, "https://ai.gitee.com/v1/task/vid-1");
}

#[tokio::test]
async fn video_status_skips_a_blank_file_url() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream.push_json(
        200,
        json!({ "status": "success", "output": { "file_url": "", "video_url": "https://x/v.mp4" } }),
    );
    let registry = registry(&upstream);

    let state = registry
        .video()
        .get_task_status("vid-3", Some("gitee-key"))
        .await
        .unwrap();
    assert_eq!(state.status, VideoTaskStatus::Success);
    assert_eq!(state.video_url.as_deref(), Some("https://x/v.mp4"));
}

#[tokio::test]
async fn video_success_without_url_and_missing_task_id_fail() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "status": "succeeded", "output": {} }))
        .push_json(200, json!({ "id": "not-a-task-id" }));
    let registry = registry(&upstream);
    let video = registry.video();

    let err = video.get_task_status("vid-2", Some("gitee-key")).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);

    let task_input = VideoTaskInput {
        image_url: "https://x/in.png".to_string(),
        prompt: "waves".to_string(),
        width: 832,
        height: 480,
        seed: Some(3),
    };
    let err = video.create_task(&task_input, Some("gitee-key")).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::GenerationFailed);

    let err = video.get_task_status("../etc", Some("gitee-key")).await.unwrap_err();
    assert_eq!(err.code, ApiErrorCode::InvalidParams);
    assert_eq!(upstream.request_count(), 2);
}

#[tokio::test]
async fn huggingface_video_reads_nested_video_url() {
    let upstream = Arc::new(ScriptedUpstream::new());
    upstream
        .push_json(200, json!({ "event_id": "v-1" }))
        .push_text(
            200,
            "event: complete\ndata: [{\"video\":{\"url\":\"https://x/out.mp4\"}}, 11]\n\n",
        );
    let registry = registry(&upstream);

    let url = registry
        .huggingface()
        .generate_video("https://x/in.png", "waves", None, None)
        .await
        .unwrap();
    assert_eq!(url, "https://x/out.mp4");

    let sent = upstream.requests();
    assert!(sent[0].url.ends_with("/gradio_api/call/generate_video"));
    let data = body_json(&sent[0])["data"].clone();
    assert_eq!(data[1], "waves");
    assert_eq!(data[7], 11);
    assert_eq!(data[8], false);
}
