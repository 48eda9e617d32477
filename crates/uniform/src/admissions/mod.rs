//! Admission intake: student profiles, unit eligibility rules, application
//! submission, and the institution-admin review workflow.

pub mod auth;
pub mod domain;
pub mod eligibility;
pub mod register;
pub mod repository;
pub mod review;
pub mod router;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, AuthenticatedCaller, CallerRole, TokenVerifier};
pub use domain::{
    AcademicRecord, Application, ApplicationId, ExamPath, ExamRecord, Institution, InstitutionId,
    Medium, ReviewState, Stream, StudentId, StudentProfile, Unit, UnitId, UnitRequirement,
};
pub use eligibility::{evaluate, is_eligible, EligibilityOutcome};
pub use register::{
    ApplicationDetail, ApplicationQuery, ApplicationRegister, ApplicationSummary, ApplicationView,
    ClosureReason, RegisterError, SubmitRequest, UnitApplicationGroup, UnitListing,
};
pub use repository::{AdmissionStore, ApplicationScan, StoreError};
pub use review::{ApprovalDetails, ReviewError, ReviewWorkflow};
pub use router::{admission_router, AdmissionState};
