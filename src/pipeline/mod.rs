//! The two long-running jobs and the fetch engine they share.

pub mod bands;
pub mod fetch;
pub mod harvest;
pub mod shortlist;

pub use fetch::{FetchEngine, FetchOutcome, FetchPolicy};
