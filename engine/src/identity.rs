//! Identifier generation and audit stamping.
//!
//! Identifiers are `<PREFIX>-<millis>-<suffix>`: the prefix names the
//! collection, the middle part is the current time in milliseconds, and the
//! suffix is six characters of random entropy. No counter is persisted;
//! collisions are accepted as negligible.

use crate::record::Record;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Actor recorded when no session identity is active.
pub const FALLBACK_ACTOR: &str = "system";

/// Generate a fresh record identifier.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let entropy = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, millis, &entropy[..6])
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current date as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Storage path for a freshly uploaded image blob.
pub fn image_upload_path(file_name: &str) -> String {
    format!("data/images/{}-{}", generate_id("IMG"), file_name)
}

/// Attaches actor and timestamp metadata to records.
#[derive(Debug, Clone)]
pub struct Stamper {
    actor: String,
}

impl Stamper {
    /// Create a stamper for the given actor. An empty or blank actor falls
    /// back to [`FALLBACK_ACTOR`].
    pub fn new(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        let actor = actor.trim();
        Self {
            actor: if actor.is_empty() {
                FALLBACK_ACTOR.to_string()
            } else {
                actor.to_string()
            },
        }
    }

    /// Stamper for writes with no active session.
    pub fn system() -> Self {
        Self::new(FALLBACK_ACTOR)
    }

    /// The actor this stamper records.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Return a copy of `record` with audit metadata applied.
    ///
    /// Sets `timestamp` to now and `updated_by` to the actor. On a first
    /// write (`is_update == false`) `entered_by` is also set, unless the
    /// record already carries one.
    pub fn stamp(&self, record: Record, is_update: bool) -> Record {
        let mut next = record;
        next.audit.timestamp = now_stamp();
        if !is_update && next.audit.entered_by.is_empty() {
            next.audit.entered_by = self.actor.clone();
        }
        next.audit.updated_by = self.actor.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_payload(value.as_object().unwrap().clone())
    }

    fn assert_id_shape(id: &str, prefix: &str) {
        let mut parts = id.splitn(3, '-');
        assert_eq!(parts.next(), Some(prefix));
        let millis = parts.next().expect("millis part");
        assert!(!millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()));
        let suffix = parts.next().expect("suffix part");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn id_format() {
        assert_id_shape(&generate_id("INSP"), "INSP");
        assert_id_shape(&generate_id("REC"), "REC");
    }

    #[test]
    fn ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_id("OBS")));
        }
    }

    #[test]
    fn image_path_embeds_file_name() {
        let path = image_upload_path("pump.png");
        assert!(path.starts_with("data/images/IMG-"));
        assert!(path.ends_with("-pump.png"));
    }

    #[test]
    fn now_stamp_is_iso8601_utc() {
        let stamp = now_stamp();
        assert!(stamp.ends_with('Z'));
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], "T");
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn stamp_on_create_sets_all_audit_fields() {
        let stamper = Stamper::new("alice");
        let stamped = stamper.stamp(record(json!({"tag": "T1"})), false);
        assert_eq!(stamped.audit.entered_by, "alice");
        assert_eq!(stamped.audit.updated_by, "alice");
        assert!(!stamped.audit.timestamp.is_empty());
    }

    #[test]
    fn stamp_on_create_keeps_existing_entered_by() {
        let stamper = Stamper::new("bob");
        let stamped = stamper.stamp(record(json!({"entered_by": "alice"})), false);
        assert_eq!(stamped.audit.entered_by, "alice");
        assert_eq!(stamped.audit.updated_by, "bob");
    }

    #[test]
    fn stamp_on_update_never_touches_entered_by() {
        let stamper = Stamper::new("bob");
        let mut rec = record(json!({}));
        rec.audit.entered_by = "alice".into();
        let stamped = stamper.stamp(rec, true);
        assert_eq!(stamped.audit.entered_by, "alice");
        assert_eq!(stamped.audit.updated_by, "bob");

        // An update on a record that never had entered_by leaves it empty.
        let stamped = stamper.stamp(record(json!({})), true);
        assert!(stamped.audit.entered_by.is_empty());
    }

    #[test]
    fn blank_actor_falls_back_to_system() {
        assert_eq!(Stamper::new("").actor(), FALLBACK_ACTOR);
        assert_eq!(Stamper::new("   ").actor(), FALLBACK_ACTOR);
        assert_eq!(Stamper::system().actor(), FALLBACK_ACTOR);
        assert_eq!(Stamper::new("carol").actor(), "carol");
    }
}
