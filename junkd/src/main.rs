//! The junkd binary: continuously uploads junk data to an indexer service to
//! generate sustained load, reporting the average upload speed as it goes.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use argh::FromArgs;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use junkd::config::Config;
use junkd::{observability, uploader};
use junkd_client::{ClientBuilder, RegisterAppRequest};

/// Continuously upload junk data to an indexer to generate load.
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: PathBuf,

    /// override the configured number of upload workers
    #[argh(option)]
    pub threads: Option<usize>,

    /// also write logs to this file, in addition to stderr
    #[argh(option)]
    pub log_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    observability::initialize_tracing(args.log_path.as_deref())?;

    let config_file = std::fs::File::open(&args.config).context("failed to open config file")?;
    let mut config: Config =
        serde_yaml::from_reader(config_file).context("failed to parse config YAML")?;
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    config.validate()?;

    let client = ClientBuilder::new(&config.indexer_url, &config.app_secret)
        .context("failed to create indexer client")?
        .build();

    // Fail fast on bad credentials or an unreachable indexer; no worker
    // starts before the app is connected.
    let registration = client
        .register_app(&RegisterAppRequest {
            name: "junkd".into(),
            description: "A tool to upload junk data to the indexer".into(),
        })
        .await
        .context("failed to connect app to indexer")?;
    if !registration.connected {
        match registration.response_url {
            Some(url) => bail!("app connection requires approval, visit {url} and restart"),
            None => bail!("app connection was denied"),
        }
    }
    tracing::info!("junkd connected");

    let token = CancellationToken::new();
    tokio::spawn(shutdown_signal(token.clone()));

    tracing::info!(
        threads = config.threads,
        slab_size = config.slab_size(),
        indexer_url = %config.indexer_url,
        "starting upload workers"
    );
    uploader::run(Arc::new(client), &config, token).await?;

    tracing::info!("all upload workers finished, exiting");
    Ok(())
}

/// Cancels `token` once the process receives SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(err) => {
            tracing::error!(error = %err, "failed to install SIGTERM handler");
            token.cancel();
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}
