use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::admissions::auth::{AuthError, AuthenticatedCaller, TokenVerifier};
use crate::admissions::domain::{
    AcademicRecord, Application, ApplicationId, ExamRecord, Institution, InstitutionId, Medium,
    Stream, StudentId, StudentProfile, Unit, UnitId, UnitRequirement,
};
use crate::admissions::register::ApplicationRegister;
use crate::admissions::repository::{AdmissionStore, ApplicationScan, StoreError};
use crate::admissions::review::ReviewWorkflow;
use crate::admissions::router::{admission_router, AdmissionState};

#[derive(Default)]
struct MemoryInner {
    students: HashMap<StudentId, StudentProfile>,
    institutions: HashMap<InstitutionId, Institution>,
    units: HashMap<UnitId, Unit>,
    applications: HashMap<ApplicationId, Application>,
}

/// In-memory store whose single mutex makes the guarded insert atomic.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub(super) fn put_student(&self, student: StudentProfile) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.students.insert(student.id.clone(), student);
    }

    pub(super) fn put_institution(&self, institution: Institution) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.institutions.insert(institution.id.clone(), institution);
    }

    pub(super) fn put_unit(&self, unit: Unit) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.units.insert(unit.id.clone(), unit);
    }

    pub(super) fn application_count(&self) -> usize {
        self.inner
            .lock()
            .expect("store mutex poisoned")
            .applications
            .len()
    }
}

impl AdmissionStore for MemoryStore {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.students.get(id).cloned())
    }

    fn institution(&self, id: &InstitutionId) -> Result<Option<Institution>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.institutions.get(id).cloned())
    }

    fn unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.units.get(id).cloned())
    }

    fn units_of(&self, institution_id: &InstitutionId) -> Result<Vec<Unit>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut units: Vec<Unit> = inner
            .units
            .values()
            .filter(|unit| &unit.institution_id == institution_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(units)
    }

    fn insert_application(
        &self,
        application: Application,
        capacity: Option<u32>,
    ) -> Result<Application, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let duplicate = inner.applications.values().any(|existing| {
            existing.student_id == application.student_id
                && existing.unit_id == application.unit_id
        });
        if duplicate {
            return Err(StoreError::Duplicate);
        }
        if let Some(capacity) = capacity {
            let current = inner
                .applications
                .values()
                .filter(|existing| existing.unit_id == application.unit_id)
                .count() as u32;
            if current >= capacity {
                return Err(StoreError::CapacityExceeded);
            }
        }
        inner
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.applications.get(id).cloned())
    }

    fn applications(&self, scan: &ApplicationScan) -> Result<Vec<Application>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut rows: Vec<Application> = inner
            .applications
            .values()
            .filter(|application| {
                scan.institution_id
                    .as_ref()
                    .map_or(true, |id| &application.institution_id == id)
                    && scan
                        .unit_id
                        .as_ref()
                        .map_or(true, |id| &application.unit_id == id)
                    && scan
                        .student_id
                        .as_ref()
                        .map_or(true, |id| &application.student_id == id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(rows)
    }

    fn update_application(&self, application: Application) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.applications.contains_key(&application.id) {
            return Err(StoreError::NotFound);
        }
        inner.applications.insert(application.id.clone(), application);
        Ok(())
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner
            .applications
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

/// Store that refuses every call, for 500-path assertions.
pub(super) struct UnavailableStore;

impl AdmissionStore for UnavailableStore {
    fn student(&self, _id: &StudentId) -> Result<Option<StudentProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn institution(&self, _id: &InstitutionId) -> Result<Option<Institution>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn unit(&self, _id: &UnitId) -> Result<Option<Unit>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn units_of(&self, _institution_id: &InstitutionId) -> Result<Vec<Unit>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert_application(
        &self,
        _application: Application,
        _capacity: Option<u32>,
    ) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn application(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn applications(&self, _scan: &ApplicationScan) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update_application(&self, _application: Application) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete_application(&self, _id: &ApplicationId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Token map for router tests. "token-<id>" resolves to the seeded caller.
#[derive(Default, Clone)]
pub(super) struct StaticVerifier {
    tokens: Arc<Mutex<HashMap<String, AuthenticatedCaller>>>,
}

impl StaticVerifier {
    pub(super) fn grant(&self, token: &str, caller: AuthenticatedCaller) {
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .insert(token.to_string(), caller);
    }
}

impl TokenVerifier for StaticVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedCaller, AuthError> {
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

pub(super) fn du() -> InstitutionId {
    InstitutionId("inst-du".to_string())
}

pub(super) fn ru() -> InstitutionId {
    InstitutionId("inst-ru".to_string())
}

pub(super) fn science_unit_id() -> UnitId {
    UnitId("unit-du-ka".to_string())
}

pub(super) fn open_unit_id() -> UnitId {
    UnitId("unit-du-gha".to_string())
}

pub(super) fn national_record(
    ssc_stream: Stream,
    ssc_gpa: f32,
    hsc_stream: Stream,
    hsc_gpa: f32,
) -> AcademicRecord {
    AcademicRecord::National {
        ssc: ExamRecord {
            stream: Some(ssc_stream),
            gpa: Some(ssc_gpa),
            board: Some("Dhaka".to_string()),
            passing_year: Some(2022),
        },
        hsc: ExamRecord {
            stream: Some(hsc_stream),
            gpa: Some(hsc_gpa),
            board: Some("Dhaka".to_string()),
            passing_year: Some(2024),
        },
    }
}

pub(super) fn science_student() -> StudentProfile {
    StudentProfile {
        id: StudentId("student-ayesha".to_string()),
        name: "Ayesha Rahman".to_string(),
        email: "ayesha@example.com".to_string(),
        phone: Some("+8801700000001".to_string()),
        medium: Some(Medium::Bangla),
        academics: national_record(Stream::Science, 4.8, Stream::Science, 4.6),
    }
}

pub(super) fn arts_student() -> StudentProfile {
    StudentProfile {
        id: StudentId("student-farhan".to_string()),
        name: "Farhan Kabir".to_string(),
        email: "farhan@example.com".to_string(),
        phone: None,
        medium: Some(Medium::English),
        academics: national_record(Stream::Arts, 3.6, Stream::Arts, 3.8),
    }
}

pub(super) fn madrasha_student() -> StudentProfile {
    StudentProfile {
        id: StudentId("student-nusrat".to_string()),
        name: "Nusrat Jahan".to_string(),
        email: "nusrat@example.com".to_string(),
        phone: None,
        medium: Some(Medium::Bangla),
        academics: AcademicRecord::Madrasha {
            dakhil: ExamRecord {
                stream: Some(Stream::Science),
                gpa: Some(4.4),
                board: Some("Madrasah".to_string()),
                passing_year: Some(2022),
            },
            alim: ExamRecord {
                stream: Some(Stream::Science),
                gpa: Some(4.2),
                board: Some("Madrasah".to_string()),
                passing_year: Some(2024),
            },
        },
    }
}

pub(super) fn base_unit(id: &str, institution: InstitutionId, name: &str) -> Unit {
    Unit {
        id: UnitId(id.to_string()),
        institution_id: institution,
        name: name.to_string(),
        is_active: true,
        application_deadline: Some(NaiveDate::from_ymd_opt(2030, 1, 31).expect("valid date")),
        auto_close_after_deadline: true,
        max_applications: None,
        requirements: Vec::new(),
    }
}

pub(super) fn science_unit() -> Unit {
    let mut unit = base_unit("unit-du-ka", du(), "Ka Unit (Science)");
    unit.requirements = vec![UnitRequirement {
        ssc_stream: Some(Stream::Science),
        hsc_stream: Some(Stream::Science),
        min_combined_gpa: Some(9.0),
        ..UnitRequirement::default()
    }];
    unit
}

pub(super) fn open_unit() -> Unit {
    base_unit("unit-du-gha", du(), "Gha Unit (Open)")
}

pub(super) fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    store.put_institution(Institution {
        id: du(),
        name: "University of Dhaka".to_string(),
        category: Some("Public".to_string()),
        contact_email: Some("admissions@du.ac.bd".to_string()),
    });
    store.put_institution(Institution {
        id: ru(),
        name: "University of Rajshahi".to_string(),
        category: Some("Public".to_string()),
        contact_email: None,
    });
    store.put_unit(science_unit());
    store.put_unit(open_unit());
    store.put_unit(base_unit("unit-ru-a", ru(), "A Unit"));
    store.put_student(science_student());
    store.put_student(arts_student());
    store.put_student(madrasha_student());
    store
}

pub(super) fn student_caller(student: &StudentProfile) -> AuthenticatedCaller {
    AuthenticatedCaller::student(student.id.0.clone())
}

pub(super) fn du_admin() -> AuthenticatedCaller {
    AuthenticatedCaller::institution_admin("admin-du", du())
}

pub(super) fn ru_admin() -> AuthenticatedCaller {
    AuthenticatedCaller::institution_admin("admin-ru", ru())
}

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single().expect("valid timestamp")
}

pub(super) fn build_register(store: &MemoryStore) -> ApplicationRegister<MemoryStore> {
    ApplicationRegister::new(Arc::new(store.clone()))
}

pub(super) fn build_review(store: &MemoryStore) -> ReviewWorkflow<MemoryStore> {
    ReviewWorkflow::new(Arc::new(store.clone()))
}

pub(super) fn build_router(store: &MemoryStore, verifier: &StaticVerifier) -> axum::Router {
    let store = Arc::new(store.clone());
    let state = AdmissionState {
        register: Arc::new(ApplicationRegister::new(store.clone())),
        review: Arc::new(ReviewWorkflow::new(store)),
        verifier: Arc::new(verifier.clone()),
    };
    admission_router(state)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
