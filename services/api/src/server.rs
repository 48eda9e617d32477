use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_catalog, AppState, InMemoryAdmissionStore, StaticTokenVerifier,
    DEMO_ADMIN_TOKEN, DEMO_ARTS_STUDENT_TOKEN, DEMO_SCIENCE_STUDENT_TOKEN,
};
use crate::routes::with_admission_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use uniform::admissions::{AdmissionState, ApplicationRegister, ReviewWorkflow};
use uniform::config::AppConfig;
use uniform::error::AppError;
use uniform::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = InMemoryAdmissionStore::default();
    let verifier = StaticTokenVerifier::default();
    if config.seed_demo_data {
        seed_demo_catalog(&store, &verifier);
        info!(
            student_tokens = %format!("{DEMO_SCIENCE_STUDENT_TOKEN}, {DEMO_ARTS_STUDENT_TOKEN}"),
            admin_token = %DEMO_ADMIN_TOKEN,
            "seeded demo catalog"
        );
    }

    let store = Arc::new(store);
    let admission_state = AdmissionState {
        register: Arc::new(ApplicationRegister::new(store.clone())),
        review: Arc::new(ReviewWorkflow::new(store)),
        verifier: Arc::new(verifier),
    };

    let app = with_admission_routes(admission_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admission service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
