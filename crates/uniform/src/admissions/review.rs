use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::auth::{AuthenticatedCaller, CallerRole};
use super::domain::{Application, ApplicationId};
use super::repository::{AdmissionStore, StoreError};

/// Optional exam-seat assignments attached while approving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDetails {
    #[serde(default)]
    pub seat_no: Option<String>,
    #[serde(default)]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub exam_time: Option<String>,
    #[serde(default)]
    pub exam_center: Option<String>,
}

/// Error raised by the review workflow.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("application not found")]
    NotFound,
    #[error("application has already been approved")]
    AlreadyReviewed,
    #[error("caller does not administer the owning institution")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Institution-admin actions transitioning an application's review state.
/// The only forward transition is under-review to approved; cancellation is
/// a hard delete, not a state.
pub struct ReviewWorkflow<S> {
    store: Arc<S>,
}

impl<S> ReviewWorkflow<S>
where
    S: AdmissionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn approve(
        &self,
        caller: &AuthenticatedCaller,
        id: &ApplicationId,
        details: ApprovalDetails,
    ) -> Result<Application, ReviewError> {
        self.approve_at(caller, id, details, Utc::now())
    }

    /// Approval is strict-once: a second approve call fails with
    /// [`ReviewError::AlreadyReviewed`] rather than silently succeeding.
    pub fn approve_at(
        &self,
        caller: &AuthenticatedCaller,
        id: &ApplicationId,
        details: ApprovalDetails,
        now: DateTime<Utc>,
    ) -> Result<Application, ReviewError> {
        let mut application = self.store.application(id)?.ok_or(ReviewError::NotFound)?;
        authorize(caller, &application)?;

        if application.reviewed_at.is_some() {
            return Err(ReviewError::AlreadyReviewed);
        }

        application.reviewed_at = Some(now);
        if let Some(seat_no) = details.seat_no {
            application.seat_no = Some(seat_no);
        }
        if let Some(exam_date) = details.exam_date {
            application.exam_date = Some(exam_date);
        }
        if let Some(exam_time) = details.exam_time {
            application.exam_time = Some(exam_time);
        }
        if let Some(exam_center) = details.exam_center {
            application.exam_center = Some(exam_center);
        }

        self.store.update_application(application.clone())?;
        Ok(application)
    }

    /// Delete the application outright, regardless of review state. Not
    /// reversible.
    pub fn cancel(
        &self,
        caller: &AuthenticatedCaller,
        id: &ApplicationId,
    ) -> Result<(), ReviewError> {
        let application = self.store.application(id)?.ok_or(ReviewError::NotFound)?;
        authorize(caller, &application)?;
        self.store.delete_application(id)?;
        Ok(())
    }
}

fn authorize(
    caller: &AuthenticatedCaller,
    application: &Application,
) -> Result<(), ReviewError> {
    if caller.role != CallerRole::InstitutionAdmin {
        return Err(ReviewError::Forbidden);
    }
    if caller.institution_id.as_ref() != Some(&application.institution_id) {
        return Err(ReviewError::Forbidden);
    }
    Ok(())
}
