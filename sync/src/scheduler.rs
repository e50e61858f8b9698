//! Auto-sync scheduler: coalesces mutation bursts into sync passes.
//!
//! The scheduler owns two flags. Idle: no pass running. Syncing: one pass
//! in flight. Syncing-with-pending: a pass in flight plus exactly one
//! queued follow-up, no matter how many triggers arrived meanwhile. On
//! completion the outcome is reported through the store's status channel
//! and the follow-up, if any, runs once with the then-current state.

use crate::{
    error::Result,
    mirror::MirrorClient,
    store::{LocalStore, SyncStatus},
};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;

/// One full-document sync attempt, injected so tests can fake the remote.
pub trait SyncPass: Send + Sync {
    /// Run a pass to completion, returning the number of files mirrored.
    fn run(&self) -> BoxFuture<'static, Result<usize>>;
}

#[derive(Default)]
struct Flags {
    in_flight: bool,
    pending: bool,
}

/// Coalescing task runner triggered on every local mutation.
#[derive(Clone)]
pub struct AutoSync {
    store: LocalStore,
    pass: Arc<dyn SyncPass>,
    flags: Arc<Mutex<Flags>>,
}

impl AutoSync {
    /// Scheduler over an arbitrary pass implementation.
    pub fn new(store: LocalStore, pass: Arc<dyn SyncPass>) -> Self {
        Self {
            store,
            pass,
            flags: Arc::new(Mutex::new(Flags::default())),
        }
    }

    /// Scheduler wired to the real mirror client.
    pub fn with_mirror(store: LocalStore, client: MirrorClient) -> Self {
        let pass = MirrorPass::new(store.clone(), client);
        Self::new(store, Arc::new(pass))
    }

    /// Request a sync. No-op while sync is disabled; collapses into a
    /// single queued follow-up while a pass is in flight.
    pub fn schedule(&self) {
        if !self.store.sync_config().enabled {
            return;
        }

        {
            let mut flags = self.flags.lock().expect("scheduler lock poisoned");
            if flags.in_flight {
                flags.pending = true;
                tracing::debug!("sync pass in flight, follow-up queued");
                return;
            }
            flags.in_flight = true;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.run_pass().await;
        });
    }

    async fn run_pass(&self) {
        match self.pass.run().await {
            Ok(count) => {
                self.store
                    .set_sync_status(SyncStatus::success(format!("Auto sync success ({count} files)")));
            }
            Err(err) => {
                tracing::warn!(%err, "sync pass failed");
                self.store.set_sync_status(SyncStatus::failure(err.to_string()));
            }
        }

        let follow_up = {
            let mut flags = self.flags.lock().expect("scheduler lock poisoned");
            flags.in_flight = false;
            std::mem::take(&mut flags.pending)
        };
        if follow_up {
            self.schedule();
        }
    }

    /// Subscribe to the store's document-changed events and schedule a
    /// pass per event. Returns the listener task handle.
    pub fn listen(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let mut rx = self.store.subscribe_changes();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    // A lagged receiver only means events were coalesced
                    // by the channel; one schedule still covers them all.
                    Ok(()) | Err(RecvError::Lagged(_)) => this.schedule(),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// The production pass: export the full document and push every file.
pub struct MirrorPass {
    store: LocalStore,
    client: MirrorClient,
}

impl MirrorPass {
    pub fn new(store: LocalStore, client: MirrorClient) -> Self {
        Self { store, client }
    }
}

impl SyncPass for MirrorPass {
    fn run(&self) -> BoxFuture<'static, Result<usize>> {
        let store = self.store.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let config = store.sync_config();
            let files = turnlog_engine::database_files(&store.read_document())?;
            client.push_all(&config, &files).await
        })
    }
}
