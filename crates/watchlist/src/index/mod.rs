//! Precomputed, immutable indices over the screening lists.

pub mod precompute;
pub mod searcher;
pub mod snapshot;

pub use precompute::{AddressTokens, NameVariant, PrecomputedRecord};
pub use searcher::{RefreshGuard, Searcher};
pub use snapshot::{IndexSnapshot, SnapshotStats};

use crate::lists::Category;

/// A snapshot could not be assembled from the loaded lists. The whole build is
/// rejected; the previously served snapshot stays in place.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("{category} record '{record}' has no entity ID")]
    MissingEntityId { category: Category, record: String },
    #[error("{category} record '{record}' has no usable name")]
    MissingNames { category: Category, record: String },
    #[error("unable to start precompute workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
