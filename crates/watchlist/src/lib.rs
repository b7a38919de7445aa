//! Sanctions and denied-party list screening.
//!
//! Source records are normalized once per refresh into an immutable
//! [`index::IndexSnapshot`], served by an [`index::Searcher`] and queried through the
//! [`search::Evaluator`].

pub mod config;
pub mod entity;
pub mod error;
pub mod index;
pub mod lists;
pub mod loader;
pub mod normalize;
pub mod observer;
pub mod refresh;
pub mod search;
pub mod similarity;
pub mod telemetry;
