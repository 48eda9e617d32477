use super::domain::{
    Application, ApplicationId, Institution, InstitutionId, StudentId, StudentProfile, Unit, UnitId,
};

/// Filter pushed down to the store when scanning application rows. Joins and
/// free-text filtering happen above the store, in the register.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationScan {
    pub institution_id: Option<InstitutionId>,
    pub unit_id: Option<UnitId>,
    pub student_id: Option<StudentId>,
}

/// Storage abstraction so the register and review workflow can be exercised
/// against an in-memory store in tests and a relational store in production.
pub trait AdmissionStore: Send + Sync {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, StoreError>;
    fn institution(&self, id: &InstitutionId) -> Result<Option<Institution>, StoreError>;
    fn unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError>;
    fn units_of(&self, institution_id: &InstitutionId) -> Result<Vec<Unit>, StoreError>;

    /// Insert an application, enforcing the unique `(student, unit)` pair and
    /// the unit's capacity inside a single critical section. A relational
    /// implementation maps this to an insert guarded by the unique index and
    /// a count subquery, so two racing submissions cannot both pass a
    /// read-then-write capacity check.
    fn insert_application(
        &self,
        application: Application,
        capacity: Option<u32>,
    ) -> Result<Application, StoreError>;

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn applications(&self, scan: &ApplicationScan) -> Result<Vec<Application>, StoreError>;
    fn update_application(&self, application: Application) -> Result<(), StoreError>;
    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an application for this (student, unit) pair already exists")]
    Duplicate,
    #[error("unit application capacity reached")]
    CapacityExceeded,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
