use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;
use watchlist::config::ScreeningConfig;
use watchlist::index::Searcher;
use watchlist::loader::{CsvDirectoryLoader, ListData, SourceLoader, StaticLoader};
use watchlist::refresh::RefreshService;
use watchlist::search::Evaluator;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) searcher: Arc<Searcher>,
    pub(crate) evaluator: Evaluator,
    pub(crate) refresh: RefreshService,
}

/// Reads lists from the configured directory, or serves empty lists when none is set.
pub(crate) fn source_loader(config: &ScreeningConfig) -> Arc<dyn SourceLoader> {
    match &config.data_dir {
        Some(dir) => Arc::new(CsvDirectoryLoader::new(dir.clone())),
        None => {
            warn!("WATCHLIST_DATA_DIR is not set; serving empty lists");
            Arc::new(StaticLoader::new(ListData::default()))
        }
    }
}
