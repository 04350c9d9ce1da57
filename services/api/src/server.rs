use crate::cli::ServeArgs;
use crate::infra::{build_scoring_service, AppState, ScoringService};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tenant_scoring::config::AppConfig;
use tenant_scoring::error::AppError;
use tenant_scoring::telemetry;
use tracing::{debug, info};

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

    let (scoring_service, _applications) = build_scoring_service(&config.scoring);
    spawn_cache_sweeper(scoring_service.clone(), config.scoring.cache_ttl);

    let app = with_scoring_routes(scoring_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        cache_ttl_ms = config.scoring.cache_ttl.as_millis() as u64,
        debounce_ms = config.scoring.debounce_delay.as_millis() as u64,
        "compatibility scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Drops expired score entries once per TTL.
fn spawn_cache_sweeper(service: Arc<ScoringService>, ttl: Duration) {
    if ttl.is_zero() {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ttl);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = service.engine().purge_expired();
            if evicted > 0 {
                debug!(evicted, "purged expired score cache entries");
            }
        }
    });
}
