use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uniform::admissions::{
    AcademicRecord, AdmissionStore, Application, ApplicationId, ApplicationScan, AuthError,
    AuthenticatedCaller, ExamRecord, Institution, InstitutionId, Medium, StoreError, Stream,
    StudentId, StudentProfile, TokenVerifier, Unit, UnitId, UnitRequirement,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct StoreInner {
    students: HashMap<StudentId, StudentProfile>,
    institutions: HashMap<InstitutionId, Institution>,
    units: HashMap<UnitId, Unit>,
    applications: HashMap<ApplicationId, Application>,
}

/// In-memory catalog and application store. One mutex covers all tables, so
/// the guarded insert decides uniqueness and capacity atomically.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAdmissionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryAdmissionStore {
    pub(crate) fn put_student(&self, student: StudentProfile) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.students.insert(student.id.clone(), student);
    }

    pub(crate) fn put_institution(&self, institution: Institution) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.institutions.insert(institution.id.clone(), institution);
    }

    pub(crate) fn put_unit(&self, unit: Unit) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.units.insert(unit.id.clone(), unit);
    }
}

impl AdmissionStore for InMemoryAdmissionStore {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.students.get(id).cloned())
    }

    fn institution(&self, id: &InstitutionId) -> Result<Option<Institution>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.institutions.get(id).cloned())
    }

    fn unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.units.get(id).cloned())
    }

    fn units_of(&self, institution_id: &InstitutionId) -> Result<Vec<Unit>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut units: Vec<Unit> = guard
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
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        let duplicate = guard.applications.values().any(|existing| {
            existing.student_id == application.student_id
                && existing.unit_id == application.unit_id
        });
        if duplicate {
            return Err(StoreError::Duplicate);
        }
        if let Some(capacity) = capacity {
            let current = guard
                .applications
                .values()
                .filter(|existing| existing.unit_id == application.unit_id)
                .count() as u32;
            if current >= capacity {
                return Err(StoreError::CapacityExceeded);
            }
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.applications.get(id).cloned())
    }

    fn applications(&self, scan: &ApplicationScan) -> Result<Vec<Application>, StoreError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut rows: Vec<Application> = guard
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
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        if !guard.applications.contains_key(&application.id) {
            return Err(StoreError::NotFound);
        }
        guard
            .applications
            .insert(application.id.clone(), application);
        Ok(())
    }

    fn delete_application(&self, id: &ApplicationId) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard
            .applications
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

/// Bearer-token table for the demo deployment. Real deployments swap in a
/// verifier backed by the identity provider.
#[derive(Default, Clone)]
pub(crate) struct StaticTokenVerifier {
    tokens: Arc<Mutex<HashMap<String, AuthenticatedCaller>>>,
}

impl StaticTokenVerifier {
    pub(crate) fn register_token(&self, token: &str, caller: AuthenticatedCaller) {
        let mut guard = self.tokens.lock().expect("token mutex poisoned");
        guard.insert(token.to_string(), caller);
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedCaller, AuthError> {
        let guard = self.tokens.lock().expect("token mutex poisoned");
        guard.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

pub(crate) const DEMO_SCIENCE_STUDENT_TOKEN: &str = "demo-student-ayesha";
pub(crate) const DEMO_ARTS_STUDENT_TOKEN: &str = "demo-student-farhan";
pub(crate) const DEMO_ADMIN_TOKEN: &str = "demo-admin-du";

pub(crate) fn demo_institution_id() -> InstitutionId {
    InstitutionId("inst-du".to_string())
}

pub(crate) fn demo_science_student() -> StudentProfile {
    StudentProfile {
        id: StudentId("student-ayesha".to_string()),
        name: "Ayesha Rahman".to_string(),
        email: "ayesha@example.com".to_string(),
        phone: Some("+8801700000001".to_string()),
        medium: Some(Medium::Bangla),
        academics: AcademicRecord::National {
            ssc: ExamRecord {
                stream: Some(Stream::Science),
                gpa: Some(4.8),
                board: Some("Dhaka".to_string()),
                passing_year: Some(2022),
            },
            hsc: ExamRecord {
                stream: Some(Stream::Science),
                gpa: Some(4.6),
                board: Some("Dhaka".to_string()),
                passing_year: Some(2024),
            },
        },
    }
}

pub(crate) fn demo_arts_student() -> StudentProfile {
    StudentProfile {
        id: StudentId("student-farhan".to_string()),
        name: "Farhan Kabir".to_string(),
        email: "farhan@example.com".to_string(),
        phone: None,
        medium: Some(Medium::English),
        academics: AcademicRecord::National {
            ssc: ExamRecord {
                stream: Some(Stream::Arts),
                gpa: Some(3.6),
                board: Some("Jashore".to_string()),
                passing_year: Some(2022),
            },
            hsc: ExamRecord {
                stream: Some(Stream::Arts),
                gpa: Some(3.8),
                board: Some("Jashore".to_string()),
                passing_year: Some(2024),
            },
        },
    }
}

/// Seed the 2026 demo catalog: two public universities, their units, two
/// students, and bearer tokens for each caller.
pub(crate) fn seed_demo_catalog(store: &InMemoryAdmissionStore, verifier: &StaticTokenVerifier) {
    store.put_institution(Institution {
        id: demo_institution_id(),
        name: "University of Dhaka".to_string(),
        category: Some("Public".to_string()),
        contact_email: Some("admissions@du.ac.bd".to_string()),
    });
    store.put_institution(Institution {
        id: InstitutionId("inst-ru".to_string()),
        name: "University of Rajshahi".to_string(),
        category: Some("Public".to_string()),
        contact_email: None,
    });

    let deadline = NaiveDate::from_ymd_opt(2026, 2, 28);
    store.put_unit(Unit {
        id: UnitId("unit-du-ka".to_string()),
        institution_id: demo_institution_id(),
        name: "Ka Unit (Science)".to_string(),
        is_active: true,
        application_deadline: deadline,
        auto_close_after_deadline: true,
        max_applications: Some(50_000),
        requirements: vec![UnitRequirement {
            ssc_stream: Some(Stream::Science),
            hsc_stream: Some(Stream::Science),
            min_combined_gpa: Some(9.0),
            ..UnitRequirement::default()
        }],
    });
    store.put_unit(Unit {
        id: UnitId("unit-du-kha".to_string()),
        institution_id: demo_institution_id(),
        name: "Kha Unit (Arts)".to_string(),
        is_active: true,
        application_deadline: deadline,
        auto_close_after_deadline: true,
        max_applications: None,
        requirements: vec![
            UnitRequirement {
                ssc_stream: Some(Stream::Arts),
                min_combined_gpa: Some(7.0),
                ..UnitRequirement::default()
            },
            UnitRequirement {
                ssc_stream: Some(Stream::Science),
                min_combined_gpa: Some(8.0),
                ..UnitRequirement::default()
            },
        ],
    });
    store.put_unit(Unit {
        id: UnitId("unit-du-gha".to_string()),
        institution_id: demo_institution_id(),
        name: "Gha Unit (Open)".to_string(),
        is_active: true,
        application_deadline: deadline,
        auto_close_after_deadline: false,
        max_applications: None,
        requirements: Vec::new(),
    });
    store.put_unit(Unit {
        id: UnitId("unit-ru-a".to_string()),
        institution_id: InstitutionId("inst-ru".to_string()),
        name: "A Unit".to_string(),
        is_active: true,
        application_deadline: deadline,
        auto_close_after_deadline: true,
        max_applications: None,
        requirements: Vec::new(),
    });

    let science = demo_science_student();
    let arts = demo_arts_student();
    verifier.register_token(
        DEMO_SCIENCE_STUDENT_TOKEN,
        AuthenticatedCaller::student(science.id.0.clone()),
    );
    verifier.register_token(
        DEMO_ARTS_STUDENT_TOKEN,
        AuthenticatedCaller::student(arts.id.0.clone()),
    );
    verifier.register_token(
        DEMO_ADMIN_TOKEN,
        AuthenticatedCaller::institution_admin("admin-du", demo_institution_id()),
    );
    store.put_student(science);
    store.put_student(arts);
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
