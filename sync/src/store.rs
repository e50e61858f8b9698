//! Local Store - the persisted document and its satellite keys.
//!
//! One serialized [`Document`] lives under a fixed storage key; session
//! identity, sync configuration, and sync status live under three more.
//! Every mutation reads the full document, changes one collection, and
//! writes the full document back, then emits a document-changed event for
//! the sync scheduler. The store never surfaces a corrupt document to its
//! callers: a failed read falls open to the empty template.

use crate::{config::SyncConfig, storage::StorageBackend};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use turnlog_engine::{
    identity::image_upload_path, users, CollectionKind, Document, Record, Stamper, UpsertOutcome,
};

/// Storage key for the document.
pub const DB_KEY: &str = "turnlog_db";
/// Storage key for the session identity.
pub const SESSION_USER_KEY: &str = "turnlog_session_user";
/// Storage key for the sync configuration.
pub const SYNC_CONFIG_KEY: &str = "turnlog_sync_config";
/// Storage key for the last sync outcome.
pub const SYNC_STATUS_KEY: &str = "turnlog_sync_status";

/// Outcome of the most recent sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub ok: bool,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl SyncStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            timestamp: turnlog_engine::now_stamp(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            timestamp: turnlog_engine::now_stamp(),
        }
    }
}

struct StoreInner {
    backend: Box<dyn StorageBackend>,
    // Whole-document replace is only safe with a single writer; this lock
    // serializes every read-modify-write cycle.
    write_lock: Mutex<()>,
    changes: broadcast::Sender<()>,
    status_events: broadcast::Sender<SyncStatus>,
}

/// Handle to the persisted store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

impl LocalStore {
    /// Open a store over the given backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        let (changes, _) = broadcast::channel(64);
        let (status_events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(StoreInner {
                backend: Box::new(backend),
                write_lock: Mutex::new(()),
                changes,
                status_events,
            }),
        }
    }

    /// Whether a document has ever been written.
    pub fn has_document(&self) -> bool {
        self.inner.backend.get(DB_KEY).is_some()
    }

    /// Read the document, falling open to the empty template when the
    /// stored value is absent or corrupt. Corruption is logged but never
    /// surfaced.
    pub fn read_document(&self) -> Document {
        match self.inner.backend.get(DB_KEY) {
            None => Document::default(),
            Some(raw) => match Document::from_json(&raw) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!(%err, "stored document is corrupt, falling back to empty");
                    Document::default()
                }
            },
        }
    }

    /// Persist the full document and emit a document-changed event.
    pub fn write_document(&self, doc: &Document) {
        match doc.to_json() {
            Ok(raw) => {
                self.inner.backend.set(DB_KEY, &raw);
                let _ = self.inner.changes.send(());
            }
            Err(err) => tracing::error!(%err, "document serialization failed, write dropped"),
        }
    }

    /// Subscribe to document-changed events.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.inner.changes.subscribe()
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// A fresh copy of the named collection.
    pub fn collection(&self, kind: CollectionKind) -> Vec<Record> {
        self.read_document().collection(kind).to_vec()
    }

    /// Replace the named collection and persist.
    pub fn save_collection(&self, kind: CollectionKind, rows: Vec<Record>) {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        doc.set_collection(kind, rows);
        self.write_document(&doc);
    }

    /// Insert or update a record by id and persist. The collection's own
    /// prefix is used for generated ids.
    pub fn upsert(&self, kind: CollectionKind, payload: Map<String, Value>) -> UpsertOutcome {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        let outcome = doc.upsert(kind, payload, kind.id_prefix(), &self.stamper());
        self.write_document(&doc);
        outcome
    }

    /// Delete a record by id and persist. A miss is a no-op.
    pub fn delete(&self, kind: CollectionKind, id: &str) -> bool {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        let removed = doc.delete(kind, id);
        self.write_document(&doc);
        removed
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    /// Store an image blob under a freshly generated upload path.
    pub fn save_image(&self, file_name: &str, data: &str) -> String {
        let path = image_upload_path(file_name);
        self.save_image_at(&path, data);
        path
    }

    /// Store an image blob at the exact caller-supplied path and persist.
    pub fn save_image_at(&self, path: &str, data: &str) {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        doc.insert_image(path, data);
        self.write_document(&doc);
    }

    /// The stored blob for a path, or empty if absent.
    pub fn image_data(&self, path: &str) -> String {
        self.read_document().image_data(path).to_string()
    }

    // ------------------------------------------------------------------
    // Session identity
    // ------------------------------------------------------------------

    /// The logged-in username, or empty when no session is active.
    pub fn session_user(&self) -> String {
        self.inner.backend.get(SESSION_USER_KEY).unwrap_or_default()
    }

    pub fn set_session_user(&self, username: &str) {
        self.inner.backend.set(SESSION_USER_KEY, username);
    }

    pub fn clear_session_user(&self) {
        self.inner.backend.remove(SESSION_USER_KEY);
    }

    /// Stamper for the current actor; falls back to the system identity
    /// when no session is active.
    pub fn stamper(&self) -> Stamper {
        Stamper::new(self.session_user())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Find a user by username.
    pub fn get_user(&self, username: &str) -> Option<Record> {
        users::find_user(&self.read_document(), username).cloned()
    }

    /// Register a pending account request and persist.
    pub fn request_access(&self, user: Map<String, Value>) -> String {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        let id = users::request_access(&mut doc, user, &self.stamper());
        self.write_document(&doc);
        id
    }

    /// Approve a pending user as the current session actor and persist.
    pub fn approve_user(&self, username: &str) -> turnlog_engine::error::Result<()> {
        let _guard = self.inner.write_lock.lock().expect("store lock poisoned");
        let mut doc = self.read_document();
        users::approve_user(&mut doc, username, &self.stamper())?;
        self.write_document(&doc);
        Ok(())
    }

    /// Verify credentials and open a session on success.
    pub fn login(&self, username: &str, password: &str) -> turnlog_engine::error::Result<Record> {
        let doc = self.read_document();
        let user = users::verify_login(&doc, username, password)?.clone();
        self.set_session_user(username);
        Ok(user)
    }

    /// Close the current session.
    pub fn logout(&self) {
        self.clear_session_user();
    }

    // ------------------------------------------------------------------
    // Sync configuration and status
    // ------------------------------------------------------------------

    /// The persisted sync configuration; disabled by default.
    pub fn sync_config(&self) -> SyncConfig {
        self.inner
            .backend
            .get(SYNC_CONFIG_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Persist a normalized sync configuration.
    pub fn set_sync_config(&self, config: SyncConfig) {
        let config = config.normalized();
        match serde_json::to_string(&config) {
            Ok(raw) => self.inner.backend.set(SYNC_CONFIG_KEY, &raw),
            Err(err) => tracing::error!(%err, "sync config serialization failed"),
        }
    }

    /// The last recorded sync outcome, if any.
    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.inner
            .backend
            .get(SYNC_STATUS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Record a sync outcome and broadcast it to subscribers.
    pub fn set_sync_status(&self, status: SyncStatus) {
        if let Ok(raw) = serde_json::to_string(&status) {
            self.inner.backend.set(SYNC_STATUS_KEY, &raw);
        }
        let _ = self.inner.status_events.send(status);
    }

    /// Subscribe to sync status events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<SyncStatus> {
        self.inner.status_events.subscribe()
    }
}
