//! Export surface: serialize the document into per-file payloads.
//!
//! Each collection becomes one pretty-printed JSON file under `data/`, and
//! every stored image blob is passed through under its own path. The map is
//! consumed either by the remote mirror or by a local-download collaborator.

use crate::{
    document::{CollectionKind, Document},
    error::Result,
    Error, ImagePath,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;

/// One exported file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Pretty-printed JSON text for a collection file
    Json(String),
    /// Base64 data URL passed through for an image blob
    DataUrl(String),
}

impl FileContent {
    /// The raw content string.
    pub fn as_str(&self) -> &str {
        match self {
            FileContent::Json(text) => text,
            FileContent::DataUrl(url) => url,
        }
    }

    /// Base64 body for the remote content API.
    ///
    /// JSON text is encoded; data URLs already carry base64 after the comma,
    /// so only that payload is shipped. A malformed data URL yields an empty
    /// body rather than an error.
    pub fn to_base64(&self) -> String {
        match self {
            FileContent::Json(text) => STANDARD.encode(text),
            FileContent::DataUrl(url) => url
                .split_once(',')
                .map(|(_, payload)| payload.to_string())
                .unwrap_or_default(),
        }
    }

    /// Whether this entry is an image blob.
    pub fn is_data_url(&self) -> bool {
        matches!(self, FileContent::DataUrl(_))
    }
}

/// Map every collection and image blob to its virtual file path.
pub fn database_files(doc: &Document) -> Result<BTreeMap<ImagePath, FileContent>> {
    let mut files = BTreeMap::new();

    for kind in CollectionKind::ALL {
        let text = serde_json::to_string_pretty(doc.collection(kind))
            .map_err(|e| Error::InvalidDocument(e.to_string()))?;
        files.insert(kind.file_path(), FileContent::Json(text));
    }

    for (path, data_url) in &doc.images {
        files.insert(path.clone(), FileContent::DataUrl(data_url.clone()));
    }

    Ok(files)
}

/// Reduce a value to a safe lowercase file-name fragment.
///
/// Runs of non-alphanumeric characters collapse to a single underscore;
/// the result is trimmed, capped at 40 characters, and falls back to
/// `entry` when nothing survives.
pub fn sanitize_name(value: &str) -> String {
    let mut out = String::new();
    let mut last_was_sep = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out.truncate(40);
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        "entry".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Stamper;
    use serde_json::json;

    fn sample_document() -> Document {
        let mut doc = Document::default();
        let stamper = Stamper::new("tester");
        doc.upsert(
            CollectionKind::Inspections,
            json!({"id": "INSP-1", "equipment_tag_number": "TAG-001", "final_status": "Completed"})
                .as_object()
                .unwrap()
                .clone(),
            "INSP",
            &stamper,
        );
        doc.upsert(
            CollectionKind::Users,
            json!({"id": "USR-1", "username": "jdoe", "approved": true})
                .as_object()
                .unwrap()
                .clone(),
            "USR",
            &stamper,
        );
        doc.insert_image("data/images/tag_001_OBS-1_01.png", "data:image/png;base64,QUJDRA==");
        doc
    }

    #[test]
    fn every_collection_gets_a_file() {
        let files = database_files(&Document::default()).unwrap();
        assert_eq!(files.len(), 4);
        for kind in CollectionKind::ALL {
            let content = files.get(&kind.file_path()).unwrap();
            assert_eq!(content.as_str(), "[]");
        }
    }

    #[test]
    fn images_are_passed_through() {
        let files = database_files(&sample_document()).unwrap();
        let image = files.get("data/images/tag_001_OBS-1_01.png").unwrap();
        assert!(image.is_data_url());
        assert_eq!(image.as_str(), "data:image/png;base64,QUJDRA==");
        assert_eq!(image.to_base64(), "QUJDRA==");
    }

    #[test]
    fn json_payload_roundtrips_field_for_field() {
        let doc = sample_document();
        let files = database_files(&doc).unwrap();

        for kind in CollectionKind::ALL {
            let FileContent::Json(text) = files.get(&kind.file_path()).unwrap() else {
                panic!("collection file should be JSON");
            };
            let parsed: Vec<crate::Record> = serde_json::from_str(text).unwrap();
            assert_eq!(parsed, doc.collection(kind));
        }
    }

    #[test]
    fn json_base64_decodes_to_source_text() {
        let content = FileContent::Json("[{\"id\":\"X\"}]".into());
        let decoded = STANDARD.decode(content.to_base64()).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "[{\"id\":\"X\"}]");
    }

    #[test]
    fn data_url_without_comma_yields_empty_body() {
        let content = FileContent::DataUrl("garbage".into());
        assert_eq!(content.to_base64(), "");
    }

    #[test]
    fn sanitize_name_cases() {
        assert_eq!(sanitize_name("TAG-001 / Pump #2"), "tag_001_pump_2");
        assert_eq!(sanitize_name("  --  "), "entry");
        assert_eq!(sanitize_name(""), "entry");
        assert_eq!(sanitize_name("Vessel"), "vessel");
        let long = "x".repeat(80);
        assert_eq!(sanitize_name(&long).len(), 40);
    }
}
