//! URL rules for the crawler
//!
//! This module decides which discovered URLs enter the pipeline and how
//! URLs collapse into deduplication fingerprints.

mod follow;
mod normalize;

pub use follow::follow;
pub use normalize::normalize;
