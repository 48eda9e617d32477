//! Pure eligibility evaluation: one academic record against a unit's
//! requirement rows. Rows model alternative admission tracks, so the record
//! is eligible when any single row admits it. No side effects.

mod rules;

use serde::{Deserialize, Serialize};

use super::domain::{AcademicRecord, UnitRequirement};

/// Result of checking a record against a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    pub eligible: bool,
    /// Index of the first requirement row the record satisfied. `None` when
    /// ineligible, and also for an empty ruleset (open unit).
    pub matched_row: Option<usize>,
}

/// Evaluate a record against a unit's requirement rows. A unit with no rows
/// is open to every exam path.
pub fn evaluate(record: &AcademicRecord, requirements: &[UnitRequirement]) -> EligibilityOutcome {
    if requirements.is_empty() {
        return EligibilityOutcome {
            eligible: true,
            matched_row: None,
        };
    }

    match requirements
        .iter()
        .position(|row| rules::row_admits(record, row))
    {
        Some(index) => EligibilityOutcome {
            eligible: true,
            matched_row: Some(index),
        },
        None => EligibilityOutcome {
            eligible: false,
            matched_row: None,
        },
    }
}

pub fn is_eligible(record: &AcademicRecord, requirements: &[UnitRequirement]) -> bool {
    evaluate(record, requirements).eligible
}
