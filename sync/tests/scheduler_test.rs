//! Integration tests for the auto-sync scheduler.
//!
//! The remote is faked through the `SyncPass` trait so these tests pin the
//! coalescing state machine itself: at most one pass in flight, at most one
//! queued follow-up, status reported on every completion.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use turnlog_sync::{
    AutoSync, LocalStore, MemoryBackend, SyncConfig, SyncError, SyncPass,
};

fn enabled_store() -> LocalStore {
    let store = LocalStore::new(MemoryBackend::new());
    store.set_sync_config(SyncConfig {
        enabled: true,
        owner: "acme".into(),
        repo: "records".into(),
        branch: "main".into(),
        token: "tok".into(),
    });
    store
}

/// A pass that blocks until released, counting its runs.
struct GatedPass {
    runs: Arc<AtomicUsize>,
    started: Arc<Notify>,
    release: Arc<Notify>,
    fail: bool,
}

impl GatedPass {
    fn new(runs: &Arc<AtomicUsize>, started: &Arc<Notify>, release: &Arc<Notify>) -> Self {
        Self {
            runs: runs.clone(),
            started: started.clone(),
            release: release.clone(),
            fail: false,
        }
    }
}

impl SyncPass for GatedPass {
    fn run(&self) -> BoxFuture<'static, turnlog_sync::Result<usize>> {
        let runs = self.runs.clone();
        let started = self.started.clone();
        let release = self.release.clone();
        let fail = self.fail;
        Box::pin(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            started.notify_one();
            release.notified().await;
            if fail {
                Err(SyncError::RemoteWrite {
                    path: "data/inspections.json".into(),
                    status: 409,
                    body: "sha mismatch".into(),
                })
            } else {
                Ok(3)
            }
        })
    }
}

/// A pass that completes immediately with a fixed result.
struct InstantPass {
    runs: Arc<AtomicUsize>,
    fail: bool,
}

impl SyncPass for InstantPass {
    fn run(&self) -> BoxFuture<'static, turnlog_sync::Result<usize>> {
        let runs = self.runs.clone();
        let fail = self.fail;
        Box::pin(async move {
            runs.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(SyncError::RemoteWrite {
                    path: "data/inspections.json".into(),
                    status: 409,
                    body: "sha mismatch".into(),
                })
            } else {
                Ok(5)
            }
        })
    }
}

#[tokio::test]
async fn burst_during_in_flight_pass_coalesces_into_one_follow_up() {
    let store = enabled_store();
    let runs = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let scheduler = AutoSync::new(
        store.clone(),
        Arc::new(GatedPass::new(&runs, &started, &release)),
    );
    let mut status_rx = store.subscribe_status();

    scheduler.schedule();
    started.notified().await;

    // Five mutations land while the pass is in flight.
    for _ in 0..5 {
        scheduler.schedule();
    }

    release.notify_one();
    assert!(status_rx.recv().await.unwrap().ok);

    // Exactly one follow-up runs, capturing all five coalesced triggers.
    started.notified().await;
    release.notify_one();
    assert!(status_rx.recv().await.unwrap().ok);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn schedule_is_a_noop_while_disabled() {
    let store = LocalStore::new(MemoryBackend::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let scheduler = AutoSync::new(
        store.clone(),
        Arc::new(InstantPass {
            runs: runs.clone(),
            fail: false,
        }),
    );

    scheduler.schedule();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(store.sync_status().is_none());
}

#[tokio::test]
async fn successful_pass_reports_file_count() {
    let store = enabled_store();
    let scheduler = AutoSync::new(
        store.clone(),
        Arc::new(InstantPass {
            runs: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }),
    );
    let mut status_rx = store.subscribe_status();

    scheduler.schedule();
    let status = status_rx.recv().await.unwrap();

    assert!(status.ok);
    assert_eq!(status.message, "Auto sync success (5 files)");
    assert_eq!(store.sync_status().unwrap().message, status.message);
}

#[tokio::test]
async fn failed_pass_reports_error_and_still_runs_follow_up() {
    let store = enabled_store();
    let runs = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut pass = GatedPass::new(&runs, &started, &release);
    pass.fail = true;
    let scheduler = AutoSync::new(store.clone(), Arc::new(pass));
    let mut status_rx = store.subscribe_status();

    scheduler.schedule();
    started.notified().await;
    scheduler.schedule(); // queued follow-up

    release.notify_one();
    let status = status_rx.recv().await.unwrap();
    assert!(!status.ok);
    assert!(status.message.contains("data/inspections.json"));
    assert!(status.message.contains("409"));

    // The follow-up still runs after a failure.
    started.notified().await;
    release.notify_one();
    assert!(!status_rx.recv().await.unwrap().ok);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn listener_schedules_a_pass_per_mutation() {
    let store = enabled_store();
    let runs = Arc::new(AtomicUsize::new(0));
    let scheduler = AutoSync::new(
        store.clone(),
        Arc::new(InstantPass {
            runs: runs.clone(),
            fail: false,
        }),
    );
    let mut status_rx = store.subscribe_status();
    let listener = scheduler.listen();

    store.upsert(
        turnlog_engine::CollectionKind::Inspections,
        serde_json::json!({"id": "", "equipment_tag_number": "TAG-1"})
            .as_object()
            .unwrap()
            .clone(),
    );

    let status = status_rx.recv().await.unwrap();
    assert!(status.ok);
    assert!(runs.load(Ordering::SeqCst) >= 1);

    listener.abort();
}
