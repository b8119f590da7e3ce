use crate::cli::ServeArgs;
use crate::infra::{AppState, PipelineStore};
use crate::routes::with_pipeline_routes;
use applicant_pipeline::config::AppConfig;
use applicant_pipeline::error::AppError;
use applicant_pipeline::telemetry;
use applicant_pipeline::workflows::applicants::ApplicantPipelineService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let store = Arc::new(PipelineStore::open(config.store.snapshot_path.as_deref())?);
    info!(store = %store.describe(), "record store opened");
    let pipeline_service = Arc::new(ApplicantPipelineService::new(
        store,
        config.shortlist.clone(),
    ));

    let app = with_pipeline_routes(pipeline_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "applicant pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}
