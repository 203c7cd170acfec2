mod clients;
mod config;
mod store_file;

#[cfg(test)]
mod tests;

use clients::wallet_http::WalletHttpClient;
use config::DaemonConfig;
use log::LevelFilter;
use memochat_core::store;
use memochat_core::MessagingEngine;
use std::path::PathBuf;
use std::sync::Arc;
use store_file::FileStore;
use tokio::signal;

#[derive(thiserror::Error, Debug)]
enum DaemonError {
    #[error("config")]
    Config,
    #[error("storage")]
    Storage,
    #[error("engine")]
    Engine,
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let args: Vec<String> = std::env::args().collect();
    let mut path = PathBuf::from("memochat.toml");
    let mut i = 1;
    while i + 1 < args.len() {
        if args[i] == "--config" {
            path = PathBuf::from(&args[i + 1]);
        }
        i += 1;
    }
    let cfg = config::load_config(&path).map_err(|err| {
        eprintln!("memochat-daemon: {err}");
        DaemonError::Config
    })?;
    init_logging(&cfg);

    std::fs::create_dir_all(&cfg.data_dir).map_err(|_| DaemonError::Storage)?;
    let file_store =
        FileStore::open(cfg.data_dir.join("memochat.json")).map_err(|_| DaemonError::Storage)?;
    let rpc = WalletHttpClient::new(&cfg.wallet).map_err(|_| DaemonError::Engine)?;
    let engine = MessagingEngine::new(cfg.engine.clone(), store::shared(file_store), Arc::new(rpc));

    ensure_identity(&engine, &cfg).await?;

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            log::info!("engine event: {event:?}");
        }
    });

    let poller = engine.start_poller();
    log::info!("memochat-daemon polling every {}ms", cfg.engine.poll_interval_ms);
    let _ = signal::ctrl_c().await;
    log::info!("shutting down");
    poller.abort();
    Ok(())
}

async fn ensure_identity(engine: &MessagingEngine, cfg: &DaemonConfig) -> Result<(), DaemonError> {
    match engine.identity().await {
        Ok(Some(identity)) => {
            log::info!(
                "messaging as {} at {}",
                identity.username,
                identity.address
            );
            Ok(())
        }
        Ok(None) => {
            let Some(username) = cfg.identity.username.as_deref() else {
                log::warn!("no identity and no [identity] username configured; idle until one exists");
                return Ok(());
            };
            let identity = engine.create_identity(username).await.map_err(|err| {
                log::error!("identity creation failed: {err}");
                DaemonError::Engine
            })?;
            log::info!(
                "created identity {} at {}",
                identity.username,
                identity.address
            );
            Ok(())
        }
        Err(err) => {
            log::error!("cannot load identity: {err}");
            Err(DaemonError::Storage)
        }
    }
}

fn init_logging(cfg: &DaemonConfig) {
    let level = match cfg.logging.level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}
