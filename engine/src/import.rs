//! Bulk row import for inspections and users.
//!
//! Rows arrive as already-parsed JSON objects (spreadsheet parsing happens
//! upstream). Inspection rows are normalized to the canonical field set;
//! user rows merge by username.

use crate::{
    document::{CollectionKind, Document},
    identity::{generate_id, today, Stamper},
    record::Record,
};
use serde_json::{Map, Value};

/// Canonical inspection fields, in form order.
const INSPECTION_FIELDS: [&str; 14] = [
    "id",
    "unit_name",
    "equipment_type",
    "equipment_tag_number",
    "inspection_type",
    "equipment_name",
    "last_inspection_year",
    "inspection_possible",
    "inspection_date",
    "status",
    "final_status",
    "remarks",
    "observation",
    "recommendation",
];

fn text(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Reduce an arbitrary row to the canonical inspection payload.
///
/// Unknown keys are dropped; `inspection_possible` defaults to `Yes` and
/// `final_status` to `Not Started`.
pub fn normalize_inspection_row(row: &Map<String, Value>) -> Map<String, Value> {
    let mut payload = Map::new();
    for field in INSPECTION_FIELDS {
        let mut value = text(row, field);
        if value.is_empty() {
            value = match field {
                "inspection_possible" => "Yes".to_string(),
                "final_status" => "Not Started".to_string(),
                _ => value,
            };
        }
        payload.insert(field.to_string(), Value::String(value));
    }
    payload
}

/// Upsert a batch of inspection rows. Rows without a unit get
/// `default_unit` when one is supplied. Returns the number of rows applied.
pub fn apply_inspection_rows(
    doc: &mut Document,
    rows: &[Map<String, Value>],
    default_unit: Option<&str>,
    stamper: &Stamper,
) -> usize {
    for row in rows {
        let mut payload = normalize_inspection_row(row);
        if let Some(unit) = default_unit {
            let missing = payload
                .get("unit_name")
                .and_then(Value::as_str)
                .map(str::is_empty)
                .unwrap_or(true);
            if missing && !unit.is_empty() {
                payload.insert("unit_name".to_string(), Value::String(unit.to_string()));
            }
        }
        doc.upsert(
            CollectionKind::Inspections,
            payload,
            CollectionKind::Inspections.id_prefix(),
            stamper,
        );
    }
    rows.len()
}

/// Merge a batch of user rows by username.
///
/// Rows with a blank username are skipped. Existing users are overwritten
/// with the row's credential fields; new users are appended with the
/// upload defaults filled in. The whole collection is restamped as updated.
pub fn apply_user_rows(doc: &mut Document, rows: &[Map<String, Value>], stamper: &Stamper) -> usize {
    let mut applied = 0;

    for row in rows {
        let username = text(row, "username").trim().to_string();
        if username.is_empty() {
            continue;
        }

        let approved = match row.get("approved") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        let mut candidate = Map::new();
        candidate.insert("username".to_string(), Value::String(username.clone()));
        candidate.insert(
            "password".to_string(),
            Value::String(non_empty(text(row, "password"), "pass@123")),
        );
        candidate.insert(
            "role".to_string(),
            Value::String(non_empty(text(row, "role"), "inspector")),
        );
        candidate.insert("approved".to_string(), Value::Bool(approved));
        candidate.insert(
            "request_date".to_string(),
            Value::String(non_empty(text(row, "request_date"), &today())),
        );
        candidate.insert(
            "approved_by".to_string(),
            Value::String(text(row, "approved_by")),
        );

        if let Some(existing) = doc
            .users
            .iter_mut()
            .find(|u| u.field_str("username") == username)
        {
            existing.merge_fields(&candidate);
        } else {
            let mut record = Record::from_payload(candidate);
            record.id = generate_id(CollectionKind::Users.id_prefix());
            doc.users.push(record);
        }
        applied += 1;
    }

    let users = std::mem::take(&mut doc.users);
    doc.users = users.into_iter().map(|u| stamper.stamp(u, true)).collect();

    applied
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().expect("object row").clone()
    }

    #[test]
    fn normalize_applies_defaults() {
        let payload = normalize_inspection_row(&row(json!({
            "equipment_tag_number": "TAG-001",
            "extra_column": "dropped",
        })));

        assert_eq!(payload["equipment_tag_number"], "TAG-001");
        assert_eq!(payload["inspection_possible"], "Yes");
        assert_eq!(payload["final_status"], "Not Started");
        assert!(payload.get("extra_column").is_none());
    }

    #[test]
    fn normalize_coerces_numeric_id() {
        let payload = normalize_inspection_row(&row(json!({"id": 1024})));
        assert_eq!(payload["id"], "1024");
    }

    #[test]
    fn inspection_rows_get_default_unit() {
        let mut doc = Document::default();
        apply_inspection_rows(
            &mut doc,
            &[
                row(json!({"equipment_tag_number": "TAG-1"})),
                row(json!({"equipment_tag_number": "TAG-2", "unit_name": "GCU-2"})),
            ],
            Some("GCU-1"),
            &Stamper::new("admin"),
        );

        assert_eq!(doc.inspections.len(), 2);
        assert_eq!(doc.inspections[0].field_str("unit_name"), "GCU-1");
        assert_eq!(doc.inspections[1].field_str("unit_name"), "GCU-2");
    }

    #[test]
    fn inspection_rows_with_id_update_in_place() {
        let mut doc = Document::default();
        let stamper = Stamper::new("admin");
        apply_inspection_rows(
            &mut doc,
            &[row(json!({"id": "INSP-1", "equipment_tag_number": "TAG-1"}))],
            None,
            &stamper,
        );
        apply_inspection_rows(
            &mut doc,
            &[row(json!({"id": "INSP-1", "final_status": "Completed"}))],
            None,
            &stamper,
        );

        assert_eq!(doc.inspections.len(), 1);
        assert_eq!(doc.inspections[0].field_str("final_status"), "Completed");
    }

    #[test]
    fn user_rows_merge_by_username() {
        let mut doc = Document::default();
        let stamper = Stamper::new("admin");

        let applied = apply_user_rows(
            &mut doc,
            &[
                row(json!({"username": "jdoe", "role": "admin", "approved": "true"})),
                row(json!({"username": "", "role": "ignored"})),
            ],
            &stamper,
        );
        assert_eq!(applied, 1);
        assert_eq!(doc.users.len(), 1);

        let user = &doc.users[0];
        assert!(user.id.starts_with("USR-"));
        assert_eq!(user.field_str("password"), "pass@123");
        assert!(user.field_bool("approved"));

        // Second upload for the same username overwrites, not duplicates.
        apply_user_rows(
            &mut doc,
            &[row(json!({"username": "jdoe", "password": "changed", "approved": false}))],
            &stamper,
        );
        assert_eq!(doc.users.len(), 1);
        assert_eq!(doc.users[0].field_str("password"), "changed");
        assert!(!doc.users[0].field_bool("approved"));
    }

    #[test]
    fn user_rows_are_restamped_as_updates() {
        let mut doc = Document::default();
        apply_user_rows(
            &mut doc,
            &[row(json!({"username": "jdoe"}))],
            &Stamper::new("admin"),
        );
        assert_eq!(doc.users[0].audit.updated_by, "admin");
        assert!(!doc.users[0].audit.timestamp.is_empty());
    }
}
