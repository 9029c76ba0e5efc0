use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use zimage_common::{GlobalConfig, GlobalConfigPatch};
use zimage_core::{EngineConfig, UpstreamClientConfig, WreqUpstreamClient, ZImageEngine};
use zimage_provider_impl::ProviderSettings;
use zimage_router::{RouterConfig, app_router};

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("zimage failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    info!(
        host = %config.host,
        port = config.port,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        cors_origins = ?config.cors_origins,
        generation_timeout_secs = config.generation_timeout_secs,
        chat_timeout_secs = config.chat_timeout_secs,
        "config loaded"
    );

    let client = WreqUpstreamClient::new(UpstreamClientConfig::from_global(&config))
        .context("build upstream http client")?;
    let engine = ZImageEngine::new(
        Arc::new(client),
        ProviderSettings::from_global(&config),
        EngineConfig::from_global(&config),
    );
    let app = app_router(Arc::new(engine), &RouterConfig::from_global(&config));

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shutdown complete");
    Ok(())
}

/// Defaults < config file < env < flags.
async fn load_config(cli: &Cli) -> anyhow::Result<GlobalConfig> {
    let mut patch = match &cli.config {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read config file {}", path.display()))?;
            GlobalConfigPatch::from_json_str(&raw)
                .with_context(|| format!("parse config file {}", path.display()))?
        }
        None => GlobalConfigPatch::default(),
    };
    patch.overlay(cli.patch());
    Ok(patch.into_config()?)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl-c received");
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "zimage=info,zimage_core=info,zimage_router=info,zimage_provider_impl=info",
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
