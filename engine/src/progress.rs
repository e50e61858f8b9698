//! Progress aggregation over the inspections collection.
//!
//! Pure roll-ups consumed by dashboard collaborators; chart rendering stays
//! outside the core.

use crate::record::Record;
use serde::Serialize;
use std::collections::BTreeMap;

const STATUS_COMPLETED: &str = "Completed";
const STATUS_IN_PROGRESS: &str = "In Progress";
const STATUS_NOT_STARTED: &str = "Not Started";

/// Overall inspection progress counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    /// Records whose last write happened on the given day
    pub todays_progress: usize,
}

/// Per-unit completion tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitTally {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

/// Summarize inspection progress. `today` is a `YYYY-MM-DD` date; records
/// stamped on that day count toward `todays_progress`.
pub fn progress_summary(inspections: &[Record], today: &str) -> ProgressSummary {
    let mut summary = ProgressSummary {
        total: inspections.len(),
        ..ProgressSummary::default()
    };

    for record in inspections {
        match record.field_str("final_status") {
            STATUS_COMPLETED => summary.completed += 1,
            STATUS_IN_PROGRESS => summary.in_progress += 1,
            STATUS_NOT_STARTED => summary.not_started += 1,
            _ => {}
        }
        if !today.is_empty() && record.audit.timestamp.starts_with(today) {
            summary.todays_progress += 1;
        }
    }

    summary
}

/// Roll inspections up by `unit_name`, optionally restricted to one
/// equipment type. Units come back in stable (sorted) order.
pub fn aggregate_by_unit(
    inspections: &[Record],
    equipment_type: Option<&str>,
) -> BTreeMap<String, UnitTally> {
    let mut map: BTreeMap<String, UnitTally> = BTreeMap::new();

    for record in inspections {
        if let Some(wanted) = equipment_type {
            if record.field_str("equipment_type") != wanted {
                continue;
            }
        }
        let tally = map.entry(record.field_str("unit_name").to_string()).or_default();
        tally.total += 1;
        match record.field_str("final_status") {
            STATUS_COMPLETED => tally.completed += 1,
            STATUS_IN_PROGRESS => tally.in_progress += 1,
            _ => {}
        }
    }

    map
}
