use serde::Deserialize;

/// Static website generator configuration, read from `static.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Seed URL of the website to crawl. Also defines the origin that
    /// discovered links must share to be followed.
    #[serde(default = "default_url")]
    pub url: String,

    /// Output directory, removed and recreated on every run.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Optional server command executed before crawling. Empty means the
    /// origin is assumed to be running already.
    #[serde(default)]
    pub command: String,

    /// Extra paths to seed, typically unlinked pages such as error pages
    /// or landing pages. Resolved against `url`.
    #[serde(default)]
    pub pages: Vec<String>,

    /// Number of concurrent crawl workers and persist tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Treat 404 responses as pages to capture rather than errors.
    #[serde(default)]
    pub allow_404: bool,

    /// Time limit in seconds for any single resource request, covering
    /// connection time, redirects, and reading the response body.
    #[serde(default = "default_resource_timeout")]
    pub resource_timeout: u64,

    /// Choose the link extractor from the Content-Type header when the
    /// server sends one, instead of the URL path extension alone.
    #[serde(default)]
    pub sniff_content_type: bool,
}

fn default_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_dir() -> String {
    "build".to_string()
}

fn default_concurrency() -> usize {
    30
}

fn default_resource_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            dir: default_dir(),
            command: String::new(),
            pages: Vec::new(),
            concurrency: default_concurrency(),
            allow_404: false,
            resource_timeout: default_resource_timeout(),
            sniff_content_type: false,
        }
    }
}
