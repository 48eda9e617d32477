use super::super::domain::{AcademicRecord, Stream, UnitRequirement};

/// Whether a single requirement row admits the record. All set constraints on
/// the row must hold; unset constraints are skipped.
pub(crate) fn row_admits(record: &AcademicRecord, row: &UnitRequirement) -> bool {
    let secondary = record.secondary();
    let higher = record.higher_secondary();

    stream_matches(secondary.stream, row.ssc_stream)
        && stream_matches(higher.stream, row.hsc_stream)
        && meets_threshold(secondary.gpa, row.min_ssc_gpa)
        && meets_threshold(higher.gpa, row.min_hsc_gpa)
        && meets_threshold(record.combined_gpa(), row.min_combined_gpa)
        && within_year_bounds(
            higher.passing_year,
            row.min_passing_year,
            row.max_passing_year,
        )
}

// Unset row stream is a wildcard; a set row stream requires an exact match.
fn stream_matches(student: Option<Stream>, required: Option<Stream>) -> bool {
    match required {
        None => true,
        Some(required) => student == Some(required),
    }
}

// A missing GPA on the record fails any set threshold (fail-closed).
fn meets_threshold(gpa: Option<f32>, minimum: Option<f32>) -> bool {
    match minimum {
        None => true,
        Some(minimum) => gpa.map(|gpa| gpa >= minimum).unwrap_or(false),
    }
}

fn within_year_bounds(year: Option<u16>, min: Option<u16>, max: Option<u16>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(year) = year else {
        return false;
    };
    min.map_or(true, |bound| year >= bound) && max.map_or(true, |bound| year <= bound)
}
