use crate::cli::ServeArgs;
use crate::infra::{seed_catalog, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use handset_credit::config::AppConfig;
use handset_credit::error::AppError;
use handset_credit::intake::{
    FileSystemDocumentSink, InMemoryRecordStore, LoanApplicationService, SystemClock,
};
use handset_credit::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(upload_dir) = args.upload_dir.take() {
        config.intake.upload_dir = upload_dir;
    }
    if let Some(catalog_csv) = args.catalog_csv.take() {
        config.intake.catalog_csv = Some(catalog_csv);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryRecordStore::new());
    let documents = Arc::new(FileSystemDocumentSink::new(&config.intake.upload_dir));
    let application_service = Arc::new(LoanApplicationService::new(
        store,
        documents,
        Arc::new(SystemClock),
    ));

    match &config.intake.catalog_csv {
        Some(path) if path.exists() => {
            let count = seed_catalog(application_service.as_ref(), path)?;
            info!(count, path = %path.display(), "catalog seeded");
        }
        Some(path) => warn!(path = %path.display(), "catalog CSV not found; starting empty"),
        None => warn!("no catalog CSV configured; starting empty"),
    }

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.intake.upload_dir.display(),
        "loan application intake ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
