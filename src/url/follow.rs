use url::Url;

/// Decides whether a discovered URL should be crawled.
///
/// A URL is followed only when all three checks hold, in order: the scheme
/// is http or https, the host and port match the root, and the path starts
/// with the root's path. Everything else (mailto links, other domains,
/// paths above the seed) stays out of the pipeline.
pub fn follow(root: &Url, url: &Url) -> bool {
    // invalid scheme
    if url.scheme() != "https" && url.scheme() != "http" {
        return false;
    }

    // cross origin
    if url.host_str() != root.host_str() || url.port() != root.port() {
        return false;
    }

    // path prefix
    url.path().starts_with(root.path())
}
