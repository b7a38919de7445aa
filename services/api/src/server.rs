use crate::cli::ServeArgs;
use crate::infra::{source_loader, AppState};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use watchlist::config::AppConfig;
use watchlist::error::AppError;
use watchlist::index::Searcher;
use watchlist::observer::TracingObserver;
use watchlist::refresh::RefreshService;
use watchlist::search::{Evaluator, SearchSettings};
use watchlist::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.data_dir.take() {
        config.screening.data_dir = Some(dir);
    }

    telemetry::init(&config.telemetry)?;

    let searcher = Arc::new(Searcher::default());
    let refresh = RefreshService::new(
        searcher.clone(),
        source_loader(&config.screening),
        config.screening.build_workers,
    );

    // The service starts unready on a failed first load and recovers on the next refresh.
    match refresh.refresh().await {
        Ok(stats) => info!(records = stats.total(), "initial index loaded"),
        Err(err) => error!(error = %err, "initial index load failed"),
    }
    let scheduled = config
        .screening
        .refresh_interval
        .map(|interval| refresh.clone().spawn_periodic(interval));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        searcher,
        evaluator: Evaluator::new(SearchSettings::from(&config.screening))
            .with_observer(Arc::new(TracingObserver)),
        refresh,
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "watchlist screening service ready");

    let served = axum::serve(listener, app).await;
    if let Some(handle) = scheduled {
        handle.abort();
    }
    served?;
    Ok(())
}
