//! Bootstrap loader: seed the store from baseline files on first run.
//!
//! Inspections and users are required; observations and requisitions
//! degrade to empty collections when their files are missing or unreadable.
//! Once a document exists the loader never runs again, even if every
//! collection is later emptied through deletions.

use crate::{
    error::{Result, SyncError},
    store::LocalStore,
};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use turnlog_engine::{generate_id, CollectionKind, Document, Record, Stamper};

/// Seed the store from `baseline_dir` if no document exists yet.
///
/// Returns `true` when a document was created, `false` when one was
/// already present (in which case no files are read).
pub async fn initialize_data(store: &LocalStore, baseline_dir: &Path) -> Result<bool> {
    if store.has_document() {
        tracing::debug!("document already present, skipping bootstrap");
        return Ok(false);
    }

    let inspections = load_rows(baseline_dir, CollectionKind::Inspections).await?;
    let users = load_rows(baseline_dir, CollectionKind::Users).await?;
    let observations = load_rows(baseline_dir, CollectionKind::Observations)
        .await
        .unwrap_or_default();
    let requisitions = load_rows(baseline_dir, CollectionKind::Requisitions)
        .await
        .unwrap_or_default();

    let stamper = Stamper::system();
    let mut doc = Document::default();
    doc.inspections = seed_rows(inspections, CollectionKind::Inspections, &stamper);
    doc.users = seed_rows(users, CollectionKind::Users, &stamper);
    doc.observations = seed_rows(observations, CollectionKind::Observations, &stamper);
    doc.requisitions = seed_rows(requisitions, CollectionKind::Requisitions, &stamper);

    tracing::info!(
        records = doc.record_count(),
        "seeded local store from baseline files"
    );
    store.write_document(&doc);
    Ok(true)
}

async fn load_rows(dir: &Path, kind: CollectionKind) -> Result<Vec<Map<String, Value>>> {
    let path = dir.join(format!("{}.json", kind.as_str()));
    let raw = fs::read_to_string(&path).await.map_err(|source| SyncError::Baseline {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn seed_rows(rows: Vec<Map<String, Value>>, kind: CollectionKind, stamper: &Stamper) -> Vec<Record> {
    rows.into_iter()
        .map(|row| {
            let mut record = Record::from_payload(row);
            if record.id.is_empty() {
                record.id = generate_id(kind.id_prefix());
            }
            stamper.stamp(record, false)
        })
        .collect()
}
