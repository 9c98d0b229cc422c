//! Resource persistence
//!
//! Maps each crawled URL onto a path inside the output directory and
//! copies the response body there. HTML pages are rewritten into
//! directory-index form so the mirror serves pretty URLs from any static
//! file server.

use crate::crawler::{Body, Resource};
use crate::events::Event;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use url::Url;

/// Computes the on-disk destination for a crawled URL.
///
/// The URL path maps straight onto the directory tree, except that a page
/// (extension `.html` or none) not already named `index.html` is placed in
/// a directory of its own: `/posts/7` and `/posts/7.html` both become
/// `posts/7/index.html`.
pub fn destination(dir: &Path, url: &Url) -> PathBuf {
    let path = url.path();
    let (parent, file) = split_path(path);
    let ext = extension(file);

    let mut dst = dir.join(parent.trim_start_matches('/'));
    if file != "index.html" && (ext == ".html" || ext.is_empty()) {
        let stripped = file.replacen(".html", "", 1);
        if !stripped.is_empty() {
            dst.push(stripped);
        }
        dst.push("index.html");
    } else {
        dst.push(file);
    }
    dst
}

/// Splits a URL path into its directory part (with trailing slash) and
/// final segment.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Extension of a file name including the dot, or "" when there is none.
fn extension(file: &str) -> &str {
    match file.rfind('.') {
        Some(i) => &file[i..],
        None => "",
    }
}

/// Writes crawled resources into the output directory.
pub struct Persister {
    dir: PathBuf,
    events: Option<mpsc::Sender<Event>>,
}

impl Persister {
    pub fn new(dir: impl Into<PathBuf>, events: Option<mpsc::Sender<Event>>) -> Self {
        Self {
            dir: dir.into(),
            events,
        }
    }

    /// Persists one resource and reports it.
    ///
    /// Errored resources are reported but not written; their body, if any,
    /// is dropped, which aborts the transfer. Write failures are logged
    /// per resource and never abort the crawl.
    pub async fn save(&self, resource: Resource) {
        let dst = destination(&self.dir, &resource.target.url);

        self.emit(Event::VisitedResource {
            url: resource.target.url.clone(),
            parent: resource.target.parent.clone(),
            duration: resource.duration,
            status: resource.status,
            filename: dst.clone(),
            error: resource.error.as_ref().map(|error| error.to_string()),
        })
        .await;

        if resource.error.is_some() {
            return;
        }

        if let Err(err) = write_body(&dst, resource.body).await {
            tracing::error!(
                url = %resource.target.url,
                file = %dst.display(),
                "error saving: {err}"
            );
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }
}

/// Creates the parent directories and streams the body into the file.
async fn write_body(dst: &Path, body: Body) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(dst).await?;
    match body {
        Body::Empty => {}
        Body::Buffered(bytes) => file.write_all(&bytes).await?,
        Body::Streaming(mut response) => {
            while let Some(chunk) = response.chunk().await.map_err(io::Error::other)? {
                file.write_all(&chunk).await?;
            }
        }
    }
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(url: &str) -> PathBuf {
        destination(Path::new("build"), &Url::parse(url).unwrap())
    }

    #[test]
    fn test_root_maps_to_index() {
        assert_eq!(dest("http://h/"), PathBuf::from("build/index.html"));
    }

    #[test]
    fn test_pretty_url_page() {
        assert_eq!(
            dest("http://h/posts/7"),
            PathBuf::from("build/posts/7/index.html")
        );
    }

    #[test]
    fn test_html_extension_stripped() {
        assert_eq!(
            dest("http://h/about.html"),
            PathBuf::from("build/about/index.html")
        );
    }

    #[test]
    fn test_existing_index_html_kept_flat() {
        assert_eq!(
            dest("http://h/docs/index.html"),
            PathBuf::from("build/docs/index.html")
        );
        assert_eq!(dest("http://h/index.html"), PathBuf::from("build/index.html"));
    }

    #[test]
    fn test_asset_keeps_filename() {
        assert_eq!(dest("http://h/style.css"), PathBuf::from("build/style.css"));
        assert_eq!(
            dest("http://h/img/logo.png"),
            PathBuf::from("build/img/logo.png")
        );
    }

    #[test]
    fn test_directory_url() {
        assert_eq!(
            dest("http://h/blog/"),
            PathBuf::from("build/blog/index.html")
        );
    }

    #[test]
    fn test_nested_page() {
        assert_eq!(
            dest("http://h/a/b/c"),
            PathBuf::from("build/a/b/c/index.html")
        );
    }
}
