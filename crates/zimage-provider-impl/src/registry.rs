use std::sync::Arc;

use zimage_provider_core::{
    ApiResult, GenerationRequest, GenerationResult, ImageProviderId, UpstreamClient,
};

use crate::adapter::{ImageAdapter, RandomSeed, SeedSource};
use crate::chat::ChatAdapter;
use crate::gitee::GiteeAdapter;
use crate::huggingface::HuggingFaceAdapter;
use crate::modelscope::ModelScopeAdapter;
use crate::settings::ProviderSettings;
use crate::video::GiteeVideoTasks;

/// Image adapter selected for one provider id.
#[derive(Clone, Copy)]
pub enum ImageProvider<'a> {
    HuggingFace(&'a HuggingFaceAdapter),
    Gitee(&'a GiteeAdapter),
    ModelScope(&'a ModelScopeAdapter),
}

impl ImageProvider<'_> {
    pub fn id(&self) -> ImageProviderId {
        match self {
            ImageProvider::HuggingFace(adapter) => adapter.provider(),
            ImageProvider::Gitee(adapter) => adapter.provider(),
            ImageProvider::ModelScope(adapter) => adapter.provider(),
        }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> ApiResult<GenerationResult> {
        match self {
            ImageProvider::HuggingFace(adapter) => adapter.generate(request).await,
            ImageProvider::Gitee(adapter) => adapter.generate(request).await,
            ImageProvider::ModelScope(adapter) => adapter.generate(request).await,
        }
    }
}

/// One instance of every adapter, built once at startup over a shared client.
#[derive(Clone)]
pub struct ProviderRegistry {
    huggingface: HuggingFaceAdapter,
    gitee: GiteeAdapter,
    modelscope: ModelScopeAdapter,
    chat: ChatAdapter,
    video: GiteeVideoTasks,
}

impl ProviderRegistry {
    pub fn new(client: Arc<dyn UpstreamClient>, settings: ProviderSettings) -> Self {
        Self::with_seed_source(client, settings, Arc::new(RandomSeed))
    }

    pub fn with_seed_source(
        client: Arc<dyn UpstreamClient>,
        settings: ProviderSettings,
        seeds: Arc<dyn SeedSource>,
    ) -> Self {
        let settings = Arc::new(settings);
        Self {
            huggingface: HuggingFaceAdapter::new(
                client.clone(),
                settings.upscaler_space.clone(),
                settings.video_space.clone(),
                seeds.clone(),
            ),
            gitee: GiteeAdapter::new(client.clone(), settings.gitee_base_url.clone(), seeds.clone()),
            modelscope: ModelScopeAdapter::new(
                client.clone(),
                settings.modelscope_base_url.clone(),
                settings.polling,
                seeds,
            ),
            video: GiteeVideoTasks::new(client.clone(), settings.gitee_base_url.clone()),
            chat: ChatAdapter::new(client, settings),
        }
    }

    pub fn image(&self, id: ImageProviderId) -> ImageProvider<'_> {
        match id {
            ImageProviderId::HuggingFace => ImageProvider::HuggingFace(&self.huggingface),
            ImageProviderId::Gitee => ImageProvider::Gitee(&self.gitee),
            ImageProviderId::ModelScope => ImageProvider::ModelScope(&self.modelscope),
        }
    }

    pub fn huggingface(&self) -> &HuggingFaceAdapter {
        &self.huggingface
    }

    pub fn chat(&self) -> &ChatAdapter {
        &self.chat
    }

    pub fn video(&self) -> &GiteeVideoTasks {
        &self.video
    }
}
