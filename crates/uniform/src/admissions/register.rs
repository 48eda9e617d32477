use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::auth::{AuthenticatedCaller, CallerRole};
use super::domain::{
    Application, ApplicationId, ExamPath, InstitutionId, Medium, ReviewState, StudentId,
    StudentProfile, Unit, UnitId,
};
use super::eligibility;
use super::repository::{AdmissionStore, ApplicationScan, StoreError};

/// Inbound submission payload for `POST /api/applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub unit_id: UnitId,
    #[serde(default)]
    pub center_preference: Option<String>,
}

/// Optional admin filters for the grouped application listing. Everything is
/// ANDed; `search` is a case-insensitive substring match over student name
/// and email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationQuery {
    pub unit_id: Option<UnitId>,
    pub status: Option<ReviewState>,
    pub exam_path: Option<ExamPath>,
    pub medium: Option<Medium>,
    pub board: Option<String>,
    pub center: Option<String>,
    pub search: Option<String>,
}

/// Public representation of one application row.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub unit_id: UnitId,
    pub institution_id: InstitutionId,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_preference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_center: Option<String>,
}

impl ApplicationView {
    pub fn of(application: &Application) -> Self {
        Self {
            id: application.id.clone(),
            student_id: application.student_id.clone(),
            unit_id: application.unit_id.clone(),
            institution_id: application.institution_id.clone(),
            status: application.review_state().label(),
            applied_at: application.applied_at,
            reviewed_at: application.reviewed_at,
            center_preference: application.center_preference.clone(),
            seat_no: application.seat_no.clone(),
            exam_date: application.exam_date,
            exam_time: application.exam_time.clone(),
            exam_center: application.exam_center.clone(),
        }
    }
}

/// Row in the admin dashboard listing, joined with student identity.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub student_name: String,
    pub student_email: String,
    pub exam_path: ExamPath,
    pub status: &'static str,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_preference: Option<String>,
}

/// Applications of one unit, for the grouped institution-admin display.
#[derive(Debug, Clone, Serialize)]
pub struct UnitApplicationGroup {
    pub unit_id: UnitId,
    pub unit_name: String,
    pub total: usize,
    pub applications: Vec<ApplicationSummary>,
}

/// Full detail for the review panel: the application joined with the
/// student's academic fields and the unit/institution names.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub application: ApplicationView,
    pub student: StudentProfile,
    pub unit_name: String,
    pub institution_name: String,
}

/// One unit in the student-facing catalog, annotated with eligibility.
#[derive(Debug, Clone, Serialize)]
pub struct UnitListing {
    pub unit_id: UnitId,
    pub name: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<NaiveDate>,
    pub eligible: bool,
}

/// Why a unit refuses new submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureReason {
    Inactive,
    DeadlinePassed,
    CapacityReached,
}

impl fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClosureReason::Inactive => "unit is not accepting applications",
            ClosureReason::DeadlinePassed => "application deadline has passed",
            ClosureReason::CapacityReached => "application capacity reached",
        };
        f.write_str(label)
    }
}

/// Error raised by the application register.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("unit not found")]
    UnitNotFound,
    #[error("institution not found")]
    InstitutionNotFound,
    #[error("student profile not found")]
    StudentNotFound,
    #[error("application not found")]
    ApplicationNotFound,
    #[error("unit closed: {0}")]
    UnitClosed(ClosureReason),
    #[error("student does not satisfy any requirement row of the unit")]
    NotEligible,
    #[error("student has already applied to this unit")]
    DuplicateApplication,
    #[error("caller is not permitted to perform this operation")]
    Forbidden,
    #[error(transparent)]
    Store(StoreError),
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Application intake and query facade over the admission store.
pub struct ApplicationRegister<S> {
    store: Arc<S>,
}

impl<S> ApplicationRegister<S>
where
    S: AdmissionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a new application for the calling student.
    pub fn submit(
        &self,
        caller: &AuthenticatedCaller,
        request: SubmitRequest,
    ) -> Result<Application, RegisterError> {
        self.submit_at(caller, request, Utc::now())
    }

    /// Deadline checks compare against `now`; split out so tests control time.
    pub fn submit_at(
        &self,
        caller: &AuthenticatedCaller,
        request: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<Application, RegisterError> {
        if caller.role != CallerRole::Student {
            return Err(RegisterError::Forbidden);
        }

        let student_id = StudentId(caller.id.clone());
        let student = self
            .store
            .student(&student_id)?
            .ok_or(RegisterError::StudentNotFound)?;
        let unit = self
            .store
            .unit(&request.unit_id)?
            .ok_or(RegisterError::UnitNotFound)?;

        if !unit.is_active {
            return Err(RegisterError::UnitClosed(ClosureReason::Inactive));
        }
        if let Some(deadline) = unit.application_deadline {
            if unit.auto_close_after_deadline && now.date_naive() > deadline {
                return Err(RegisterError::UnitClosed(ClosureReason::DeadlinePassed));
            }
        }
        if !eligibility::is_eligible(&student.academics, &unit.requirements) {
            return Err(RegisterError::NotEligible);
        }

        let application = Application {
            id: next_application_id(),
            student_id,
            unit_id: unit.id.clone(),
            institution_id: unit.institution_id.clone(),
            applied_at: now,
            center_preference: request.center_preference,
            reviewed_at: None,
            seat_no: None,
            exam_date: None,
            exam_time: None,
            exam_center: None,
        };

        // Uniqueness and capacity are both decided inside the store's guarded
        // insert; duplicate submissions race at that layer, not here.
        match self
            .store
            .insert_application(application, unit.max_applications)
        {
            Ok(stored) => Ok(stored),
            Err(StoreError::Duplicate) => Err(RegisterError::DuplicateApplication),
            Err(StoreError::CapacityExceeded) => {
                Err(RegisterError::UnitClosed(ClosureReason::CapacityReached))
            }
            Err(other) => Err(RegisterError::Store(other)),
        }
    }

    /// Applications of the caller's institution, filtered and grouped by unit.
    pub fn list(
        &self,
        caller: &AuthenticatedCaller,
        query: &ApplicationQuery,
    ) -> Result<Vec<UnitApplicationGroup>, RegisterError> {
        let institution_id = admin_scope(caller)?;

        let scan = ApplicationScan {
            institution_id: Some(institution_id),
            unit_id: query.unit_id.clone(),
            student_id: None,
        };
        let applications = self.store.applications(&scan)?;

        let mut unit_names: HashMap<UnitId, String> = HashMap::new();
        let mut groups: BTreeMap<String, UnitApplicationGroup> = BTreeMap::new();

        for application in applications {
            let Some(student) = self.store.student(&application.student_id)? else {
                // Cascade-deleted student; its rows are gone in a relational
                // store, so an orphan here is skipped rather than surfaced.
                continue;
            };
            if !matches_query(query, &application, &student) {
                continue;
            }

            let unit_name = match unit_names.get(&application.unit_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .store
                        .unit(&application.unit_id)?
                        .map(|unit| unit.name)
                        .unwrap_or_else(|| application.unit_id.0.clone());
                    unit_names.insert(application.unit_id.clone(), name.clone());
                    name
                }
            };

            let group = groups
                .entry(application.unit_id.0.clone())
                .or_insert_with(|| UnitApplicationGroup {
                    unit_id: application.unit_id.clone(),
                    unit_name,
                    total: 0,
                    applications: Vec::new(),
                });
            group.total += 1;
            group.applications.push(ApplicationSummary {
                id: application.id.clone(),
                student_id: application.student_id.clone(),
                student_name: student.name.clone(),
                student_email: student.email.clone(),
                exam_path: student.academics.exam_path(),
                status: application.review_state().label(),
                applied_at: application.applied_at,
                center_preference: application.center_preference.clone(),
            });
        }

        Ok(groups.into_values().collect())
    }

    /// Joined detail view, visible to the owning institution's admin or the
    /// applicant themselves.
    pub fn detail(
        &self,
        caller: &AuthenticatedCaller,
        id: &ApplicationId,
    ) -> Result<ApplicationDetail, RegisterError> {
        let application = self
            .store
            .application(id)?
            .ok_or(RegisterError::ApplicationNotFound)?;

        let visible = match caller.role {
            CallerRole::Student => caller.id == application.student_id.0,
            CallerRole::InstitutionAdmin => {
                caller.institution_id.as_ref() == Some(&application.institution_id)
            }
            CallerRole::SystemAdmin => true,
        };
        if !visible {
            return Err(RegisterError::Forbidden);
        }

        let student = self
            .store
            .student(&application.student_id)?
            .ok_or(RegisterError::StudentNotFound)?;
        let unit = self
            .store
            .unit(&application.unit_id)?
            .ok_or(RegisterError::UnitNotFound)?;
        let institution = self
            .store
            .institution(&application.institution_id)?
            .ok_or(RegisterError::InstitutionNotFound)?;

        Ok(ApplicationDetail {
            application: ApplicationView::of(&application),
            student,
            unit_name: unit.name,
            institution_name: institution.name,
        })
    }

    /// Units of one institution, annotated with the calling student's
    /// eligibility per unit.
    pub fn eligible_units(
        &self,
        caller: &AuthenticatedCaller,
        institution_id: &InstitutionId,
    ) -> Result<Vec<UnitListing>, RegisterError> {
        if caller.role != CallerRole::Student {
            return Err(RegisterError::Forbidden);
        }

        let student = self
            .store
            .student(&StudentId(caller.id.clone()))?
            .ok_or(RegisterError::StudentNotFound)?;
        self.store
            .institution(institution_id)?
            .ok_or(RegisterError::InstitutionNotFound)?;

        let units = self.store.units_of(institution_id)?;
        Ok(units
            .into_iter()
            .map(|unit| unit_listing(&student, unit))
            .collect())
    }
}

fn unit_listing(student: &StudentProfile, unit: Unit) -> UnitListing {
    let eligible = eligibility::is_eligible(&student.academics, &unit.requirements);
    UnitListing {
        unit_id: unit.id,
        name: unit.name,
        is_active: unit.is_active,
        application_deadline: unit.application_deadline,
        eligible,
    }
}

fn admin_scope(caller: &AuthenticatedCaller) -> Result<InstitutionId, RegisterError> {
    if caller.role != CallerRole::InstitutionAdmin {
        return Err(RegisterError::Forbidden);
    }
    caller
        .institution_id
        .clone()
        .ok_or(RegisterError::Forbidden)
}

fn matches_query(
    query: &ApplicationQuery,
    application: &Application,
    student: &StudentProfile,
) -> bool {
    if let Some(status) = query.status {
        if application.review_state() != status {
            return false;
        }
    }
    if let Some(exam_path) = query.exam_path {
        if student.academics.exam_path() != exam_path {
            return false;
        }
    }
    if let Some(medium) = query.medium {
        if student.medium != Some(medium) {
            return false;
        }
    }
    if let Some(board) = &query.board {
        let on_board = |record: &super::domain::ExamRecord| {
            record
                .board
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(board))
        };
        if !on_board(student.academics.secondary())
            && !on_board(student.academics.higher_secondary())
        {
            return false;
        }
    }
    if let Some(center) = &query.center {
        if application.center_preference.as_deref() != Some(center.as_str()) {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let name_hit = student.name.to_lowercase().contains(&needle);
        let email_hit = student.email.to_lowercase().contains(&needle);
        if !name_hit && !email_hit {
            return false;
        }
    }
    true
}

impl From<StoreError> for RegisterError {
    fn from(value: StoreError) -> Self {
        RegisterError::Store(value)
    }
}
