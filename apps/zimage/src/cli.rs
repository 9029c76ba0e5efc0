use std::path::PathBuf;

use clap::Parser;
use zimage_common::GlobalConfigPatch;

#[derive(Debug, Parser)]
#[command(name = "zimage", version, about = "Image, video and chat generation gateway")]
pub(crate) struct Cli {
    #[arg(long, env = "ZIMAGE_HOST")]
    pub(crate) host: Option<String>,
    #[arg(long, env = "ZIMAGE_PORT")]
    pub(crate) port: Option<u16>,
    /// Outbound proxy for upstream calls.
    #[arg(long, env = "ZIMAGE_PROXY")]
    pub(crate) proxy: Option<String>,
    /// JSON config file; CLI flags and env vars override its fields.
    #[arg(long, env = "ZIMAGE_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long = "cors-origin", env = "ZIMAGE_CORS_ORIGINS", value_delimiter = ',')]
    pub(crate) cors_origins: Vec<String>,
}

impl Cli {
    /// The flag/env layer of the config merge.
    pub(crate) fn patch(&self) -> GlobalConfigPatch {
        let cors_origins: Vec<String> = self
            .cors_origins
            .iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        GlobalConfigPatch {
            host: self.host.clone(),
            port: self.port,
            proxy: self.proxy.clone(),
            cors_origins: (!cors_origins.is_empty()).then_some(cors_origins),
            ..GlobalConfigPatch::default()
        }
    }
}
