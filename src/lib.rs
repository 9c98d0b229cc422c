//! Staticgen: static website generation from a live HTTP server.
//!
//! This crate crawls a running origin server exhaustively, follows every
//! same-origin link it discovers in HTML and CSS, and writes each response
//! into a directory tree that any static file server can host. HTML pages
//! are laid out in directory-index form, so `/posts/7` becomes
//! `posts/7/index.html` on disk.

pub mod config;
pub mod crawler;
pub mod events;
pub mod generator;
pub mod output;
pub mod server;
pub mod url;

use thiserror::Error;

/// Main error type for staticgen operations
#[derive(Debug, Error)]
pub enum StaticgenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Starting origin server: {0}")]
    OriginStartup(String),

    #[error("Stopping origin server: {0}")]
    OriginShutdown(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Per-resource errors recorded on a crawled [`crawler::Resource`].
///
/// These never abort the crawl. They are attached to the resource so the
/// reporter can log them, and the persister skips writing the body.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("{status} response")]
    Status { status: String },

    #[error("parsing css import {import:?}: {source}")]
    CssImport {
        import: String,
        source: ::url::ParseError,
    },
}

/// Result type alias for staticgen operations
pub type Result<T> = std::result::Result<T, StaticgenError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Renders a status code as "404 Not Found" style text.
pub(crate) fn status_text(code: u16) -> String {
    match reqwest::StatusCode::from_u16(code) {
        Ok(status) => match status.canonical_reason() {
            Some(reason) => format!("{} {}", code, reason),
            None => code.to_string(),
        },
        Err(_) => code.to_string(),
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Body, CrawlOptions, Crawler, Resource, Target};
pub use events::{Event, Reporter};
pub use generator::Generator;
