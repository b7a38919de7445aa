//! Audit hook for returned matches. Observers see results after ranking and can never
//! change them; an observer failure is logged and the query still succeeds.

use tracing::debug;

use crate::lists::Category;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchEvent {
    pub category: Category,
    pub record_key: String,
    pub score: f64,
    pub matched_name: Option<String>,
    pub generation: u64,
}

pub trait MatchObserver: Send + Sync {
    fn observe(&self, event: &MatchEvent) -> Result<(), ObserverError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("match observer unavailable: {0}")]
    Unavailable(String),
}

/// Logs every match at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn observe(&self, event: &MatchEvent) -> Result<(), ObserverError> {
        debug!(
            category = %event.category,
            record = %event.record_key,
            score = event.score,
            matched_name = ?event.matched_name,
            generation = event.generation,
            "watchlist match"
        );
        Ok(())
    }
}
