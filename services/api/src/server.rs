use crate::cli::ServeArgs;
use crate::infra::{marketplace_service, AppState};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use homepal::config::AppConfig;
use homepal::error::AppError;
use homepal::marketplace::BroadcastLiveUpdates;
use homepal::telemetry;
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

    let live = Arc::new(BroadcastLiveUpdates::new(
        config.marketplace.live_update_capacity,
    ));
    let marketplace = Arc::new(marketplace_service(&config.marketplace, live));

    let app = with_marketplace_routes(marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        page_size = config.marketplace.notification_page_size,
        "homepal marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
