//! # Turnlog Engine
//!
//! Record-keeping core for tracking shutdown inspection activities across
//! industrial process units: equipment inspection checklists, field
//! observations with photos, video/photo requisition jobs, and a
//! lightweight user-approval workflow.
//!
//! This crate holds the pure logic only. Persistence and remote mirroring
//! live in the companion `turnlog-sync` crate; this one has no knowledge of
//! storage backends or the network.
//!
//! ## Core Concepts
//!
//! ### Document
//!
//! All data lives in a single [`Document`]: four ordered record collections
//! (inspections, observations, requisitions, users) plus an embedded image
//! blob map. The document is serialized and replaced as a whole on every
//! mutation.
//!
//! ### Records
//!
//! A [`Record`] is a flat JSON object carrying:
//! - a unique id (`<PREFIX>-<millis>-<suffix>`)
//! - a shared [`Audit`] envelope (`timestamp`, `entered_by`, `updated_by`)
//! - opaque domain fields passed through untouched
//!
//! ### Upsert
//!
//! [`Document::upsert`] is deliberately permissive: a payload matching an
//! existing id merges into that record; any other payload (including one
//! carrying an unknown id) is inserted. Deletes on missing ids are no-ops.
//!
//! ### Export
//!
//! [`export::database_files`] maps the document to virtual file paths -
//! one pretty JSON file per collection plus a passthrough entry per image
//! blob - ready for a remote mirror or a local download.
//!
//! ## Quick Start
//!
//! ```rust
//! use turnlog_engine::{CollectionKind, Document, Stamper};
//! use serde_json::json;
//!
//! let mut doc = Document::default();
//! let stamper = Stamper::new("jdoe");
//!
//! let outcome = doc.upsert(
//!     CollectionKind::Inspections,
//!     json!({"id": "", "equipment_tag_number": "TAG-001", "final_status": "Not Started"})
//!         .as_object()
//!         .unwrap()
//!         .clone(),
//!     "INSP",
//!     &stamper,
//! );
//!
//! let record = doc.find(CollectionKind::Inspections, outcome.id()).unwrap();
//! assert_eq!(record.audit.entered_by, "jdoe");
//! ```

pub mod document;
pub mod error;
pub mod export;
pub mod identity;
pub mod import;
pub mod progress;
pub mod record;
pub mod users;

// Re-export main types at crate root
pub use document::{CollectionKind, Document, UpsertOutcome};
pub use error::Error;
pub use export::{database_files, sanitize_name, FileContent};
pub use identity::{generate_id, image_upload_path, now_stamp, today, Stamper, FALLBACK_ACTOR};
pub use progress::{aggregate_by_unit, progress_summary, ProgressSummary, UnitTally};
pub use record::{Audit, Record};

/// Type aliases for clarity
pub type RecordId = String;
pub type ImagePath = String;
