//! Turnlog Sync - bootstrap and mirror push for the local store.
//!
//! Opens (or seeds) the directory-backed store, then pushes the full
//! document to the configured remote repository - once by default, or
//! continuously with `TURNLOG_WATCH=1`, where every store mutation
//! schedules a coalesced mirror pass. Intended for headless use: cron
//! mirrors, migration to a new machine, CI snapshots.

use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnlog_sync::{
    bootstrap, AutoSync, DirBackend, LocalStore, MirrorClient, MirrorPass, SyncConfig, SyncPass,
    SyncStatus,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnlog_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let data_dir =
        PathBuf::from(env::var("TURNLOG_DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
    let baseline_dir = PathBuf::from(
        env::var("TURNLOG_BASELINE_DIR").unwrap_or_else(|_| "./baseline".to_string()),
    );

    tracing::info!("Opening local store at {}", data_dir.display());
    let store = LocalStore::new(DirBackend::new(&data_dir)?);

    // Environment overrides the persisted sync configuration when set.
    let env_config = SyncConfig::from_env();
    if env_config.enabled || env_config.is_complete() {
        store.set_sync_config(env_config);
    }

    if bootstrap::initialize_data(&store, &baseline_dir).await? {
        tracing::info!("Seeded local store from {}", baseline_dir.display());
    }

    let config = store.sync_config();
    if !config.enabled {
        tracing::info!("Sync disabled; nothing to push");
        return Ok(());
    }

    tracing::info!(
        "Mirroring to {}/{}@{}",
        config.owner,
        config.repo,
        config.branch
    );

    let watch = matches!(
        env::var("TURNLOG_WATCH").unwrap_or_default().as_str(),
        "1" | "true"
    );
    if watch {
        let scheduler = AutoSync::with_mirror(store.clone(), MirrorClient::new());
        let listener = scheduler.listen();
        scheduler.schedule();

        tracing::info!("Watching for changes; Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
        listener.abort();

        if let Some(status) = store.sync_status() {
            tracing::info!("Last sync: {}", status.message);
        }
        return Ok(());
    }

    let pass = MirrorPass::new(store.clone(), MirrorClient::new());
    match pass.run().await {
        Ok(count) => {
            store.set_sync_status(SyncStatus::success(format!(
                "Mirror push complete ({count} files)"
            )));
            tracing::info!("Mirror push complete: {} files", count);
            Ok(())
        }
        Err(err) => {
            store.set_sync_status(SyncStatus::failure(err.to_string()));
            tracing::error!("Mirror push failed: {}", err);
            Err(err.into())
        }
    }
}
