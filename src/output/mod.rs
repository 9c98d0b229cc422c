//! Output module: persisting crawled resources to disk

mod persist;

pub use persist::{destination, Persister};
