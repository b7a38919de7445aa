//! Query validation and evaluation against an index snapshot.

pub mod evaluator;
pub mod query;

pub use evaluator::{
    compare_keys, round_score, EntityMatches, Evaluator, MatchResult, SearchError,
    SearchResults, SearchSettings,
};
pub use query::{QueryError, SearchParams, SearchQuery};
