use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for institutions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstitutionId(pub String);

/// Identifier wrapper for admission units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Curriculum track a student sat their public exams under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamPath {
    National,
    Madrasha,
}

impl ExamPath {
    pub const fn label(self) -> &'static str {
        match self {
            ExamPath::National => "NATIONAL",
            ExamPath::Madrasha => "MADRASHA",
        }
    }
}

/// Academic stream on the Bangladeshi secondary curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stream {
    Science,
    Arts,
    Commerce,
}

/// Language of instruction recorded on the student profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Medium {
    Bangla,
    English,
}

/// One public-exam credential (SSC/HSC on the national track, Dakhil/Alim on
/// the madrasha track). Fields stay optional because profiles are built
/// incrementally; the eligibility evaluator treats missing values as failing
/// any threshold that reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub stream: Option<Stream>,
    /// GPA on Bangladesh's 0-5 scale.
    pub gpa: Option<f32>,
    pub board: Option<String>,
    pub passing_year: Option<u16>,
}

/// Exactly one populated credential set per student, discriminated by exam
/// path. The sum type makes fields of the non-selected path unrepresentable
/// instead of relying on runtime conditionals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "exam_path", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcademicRecord {
    National { ssc: ExamRecord, hsc: ExamRecord },
    Madrasha { dakhil: ExamRecord, alim: ExamRecord },
}

impl AcademicRecord {
    pub const fn exam_path(&self) -> ExamPath {
        match self {
            AcademicRecord::National { .. } => ExamPath::National,
            AcademicRecord::Madrasha { .. } => ExamPath::Madrasha,
        }
    }

    /// Secondary-level credential regardless of curriculum (SSC or Dakhil).
    pub fn secondary(&self) -> &ExamRecord {
        match self {
            AcademicRecord::National { ssc, .. } => ssc,
            AcademicRecord::Madrasha { dakhil, .. } => dakhil,
        }
    }

    /// Higher-secondary-level credential (HSC or Alim).
    pub fn higher_secondary(&self) -> &ExamRecord {
        match self {
            AcademicRecord::National { hsc, .. } => hsc,
            AcademicRecord::Madrasha { alim, .. } => alim,
        }
    }

    /// Sum of both GPAs, available only when both are recorded.
    pub fn combined_gpa(&self) -> Option<f32> {
        match (self.secondary().gpa, self.higher_secondary().gpa) {
            (Some(first), Some(second)) => Some(first + second),
            _ => None,
        }
    }
}

/// A registered student with identity fields and one academic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub medium: Option<Medium>,
    #[serde(flatten)]
    pub academics: AcademicRecord,
}

/// An institution offering admission units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    pub category: Option<String>,
    pub contact_email: Option<String>,
}

/// One alternative eligibility rule attached to a unit. Unset stream fields
/// are wildcards; unset thresholds do not constrain. A unit admits a student
/// satisfying any one of its rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitRequirement {
    pub ssc_stream: Option<Stream>,
    pub hsc_stream: Option<Stream>,
    pub min_ssc_gpa: Option<f32>,
    pub min_hsc_gpa: Option<f32>,
    pub min_combined_gpa: Option<f32>,
    pub min_passing_year: Option<u16>,
    pub max_passing_year: Option<u16>,
}

/// An admission track within an institution. Owns its requirement rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub institution_id: InstitutionId,
    pub name: String,
    pub is_active: bool,
    pub application_deadline: Option<NaiveDate>,
    pub auto_close_after_deadline: bool,
    pub max_applications: Option<u32>,
    pub requirements: Vec<UnitRequirement>,
}

/// Review state derived from the nullable `reviewed_at` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    UnderReview,
    Approved,
}

impl ReviewState {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewState::UnderReview => "under_review",
            ReviewState::Approved => "approved",
        }
    }
}

/// A student's application to one unit. The `(student_id, unit_id)` pair is
/// unique; the store's guarded insert enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub unit_id: UnitId,
    pub institution_id: InstitutionId,
    pub applied_at: DateTime<Utc>,
    pub center_preference: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub seat_no: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub exam_time: Option<String>,
    pub exam_center: Option<String>,
}

impl Application {
    pub fn review_state(&self) -> ReviewState {
        if self.reviewed_at.is_some() {
            ReviewState::Approved
        } else {
            ReviewState::UnderReview
        }
    }
}
