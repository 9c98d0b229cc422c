use url::Url;

/// Normalizes a URL into its deduplication form by stripping trailing
/// slashes from the path, so `/blog/` and `/blog` collapse into the same
/// fingerprint. The root path `/` is left alone. Fragments and query
/// strings are assumed to have been removed at extraction time.
pub fn normalize(mut url: Url) -> Url {
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    url
}
