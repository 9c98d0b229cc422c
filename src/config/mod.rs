//! Configuration loading for staticgen
//!
//! The generator is configured through a `static.json` file in the working
//! directory. Every key has a default, so a minimal project only needs to
//! override what differs from the conventions.

mod parser;
mod types;
mod validation;

pub use parser::load;
pub use types::Config;
pub use validation::validate;

/// Conventional configuration file name, resolved in the working directory.
pub const DEFAULT_PATH: &str = "static.json";
