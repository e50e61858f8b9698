//! Local export: write the document's JSON payloads to a directory.
//!
//! The filesystem analog of the browser download path - image blobs are
//! skipped, since they already live inside the document and the remote
//! mirror handles them.

use crate::error::Result;
use std::path::Path;
use turnlog_engine::{database_files, Document};

/// Write every collection file under `dir`, creating parent directories as
/// needed. Returns the number of files written.
pub fn export_to_dir(doc: &Document, dir: &Path) -> Result<usize> {
    let files = database_files(doc)?;
    let mut count = 0;

    for (path, content) in &files {
        if content.is_data_url() {
            continue;
        }
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content.as_str())?;
        count += 1;
    }

    Ok(count)
}
