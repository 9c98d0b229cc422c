//! Worker-pool crawl engine
//!
//! The crawler owns a targets channel feeding a pool of workers and a
//! resources channel feeding the persister. Each worker fetches a target,
//! extracts child links when the body is HTML or CSS, deduplicates them,
//! queues the novel ones back onto the targets channel, and emits the
//! fetched resource downstream.
//!
//! Termination is driven by the pending counter: a URL is counted before
//! it is queued and discounted once its resource has been handed off, so
//! the counter reaching zero means the whole reachable graph has settled.
//! A supervisor task waits for that and cancels the pipeline; workers drop
//! their resource senders on the way out, which ends the resource stream.

use crate::crawler::dedup::Deduplicator;
use crate::crawler::extract::{extract_css, extract_html};
use crate::crawler::pending::Pending;
use crate::CrawlError;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A unit of crawl work: an accepted URL plus the page that referred to it.
#[derive(Debug, Clone)]
pub struct Target {
    /// Absolute, normalized URL to fetch.
    pub url: Url,
    /// URL of the referring page, or `None` for seeds.
    pub parent: Option<Url>,
}

/// The body of a fetched resource as handed to the persister.
#[derive(Debug)]
pub enum Body {
    /// No body; the request failed before a response arrived.
    Empty,
    /// Fully buffered body. HTML and CSS are read whole so the extractor
    /// and the persister both see the original bytes.
    Buffered(Bytes),
    /// Unread response. The consumer drains it chunk by chunk; dropping it
    /// aborts the transfer.
    Streaming(reqwest::Response),
}

/// The outcome of visiting a [`Target`].
#[derive(Debug)]
pub struct Resource {
    pub target: Target,
    /// HTTP status code, or 0 when the request never completed.
    pub status: u16,
    /// Wall time from request dispatch to response headers (or failure).
    pub duration: Duration,
    pub body: Body,
    /// Transport, status, or extraction failure for this resource.
    pub error: Option<CrawlError>,
}

/// Tunables for a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Worker pool size.
    pub concurrency: usize,
    /// Treat 404 responses as pages rather than errors.
    pub allow_404: bool,
    /// Prefer the Content-Type header over the path extension when
    /// choosing a link extractor.
    pub sniff_content_type: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            allow_404: false,
            sniff_content_type: false,
        }
    }
}

/// How a fetched body should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Html,
    Css,
    Other,
}

/// Crawls every same-origin page and asset reachable from a root URL.
///
/// Cheap to clone; clones share the same crawl state.
#[derive(Clone)]
pub struct Crawler {
    shared: Arc<Shared>,
}

struct Shared {
    root: Url,
    options: CrawlOptions,
    client: Client,
    pending: Pending,
    duplicates: Deduplicator,
    targets_tx: mpsc::Sender<Target>,
    targets_rx: Mutex<mpsc::Receiver<Target>>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler rooted at `root`. The crawl is bounded by a child
    /// of `cancel`, so cancelling the caller's token aborts every worker.
    pub fn new(root: Url, client: Client, options: CrawlOptions, cancel: &CancellationToken) -> Self {
        let (targets_tx, targets_rx) = mpsc::channel(1);

        Self {
            shared: Arc::new(Shared {
                root,
                options,
                client,
                pending: Pending::default(),
                duplicates: Deduplicator::default(),
                targets_tx,
                targets_rx: Mutex::new(targets_rx),
                cancel: cancel.child_token(),
            }),
        }
    }

    /// Starts the workers and queues the root URL. Returns the stream of
    /// visited resources; it ends once the crawl has drained (or been
    /// cancelled) and every worker has exited.
    pub fn start(&self) -> mpsc::Receiver<Resource> {
        let (resources_tx, resources_rx) = mpsc::channel(1);

        let concurrency = self.shared.options.concurrency.max(1);

        // initial page
        self.queue(self.shared.root.clone(), None);

        for _ in 0..concurrency {
            let worker = self.clone();
            let resources = resources_tx.clone();
            tokio::spawn(worker.work(resources));
        }

        // Supervisor: once the pending counter drains, cancel the pipeline
        // so the workers exit and the resource stream ends.
        let supervisor = self.clone();
        tokio::spawn(async move {
            let shared = &supervisor.shared;
            tokio::select! {
                _ = shared.pending.wait() => shared.cancel.cancel(),
                _ = shared.cancel.cancelled() => {}
            }
        });

        resources_rx
    }

    /// Queues a URL for crawling. Non-blocking; already-seen URLs are
    /// dropped here, before they touch the pending counter.
    pub fn queue(&self, url: Url, parent: Option<Url>) {
        let novel = self.shared.duplicates.filter(vec![url]);
        self.enqueue(novel, parent);
    }

    /// Waits until the crawl has terminated, either by draining every
    /// pending target or through cancellation.
    pub async fn wait(&self) {
        self.shared.cancel.cancelled().await;
    }

    /// Number of targets accepted but not yet emitted as resources.
    pub fn pending(&self) -> usize {
        self.shared.pending.count()
    }

    /// Counts the batch into pending, then hands it to a detached sender
    /// task. The add must happen before the task spawns so the supervisor
    /// can never observe a transient zero while targets are in flight.
    fn enqueue(&self, urls: Vec<Url>, parent: Option<Url>) {
        if urls.is_empty() {
            return;
        }
        self.shared.pending.add(urls.len());

        let targets = self.shared.targets_tx.clone();
        let cancel = self.shared.cancel.clone();
        tokio::spawn(async move {
            for url in urls {
                let target = Target {
                    url,
                    parent: parent.clone(),
                };
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    sent = targets.send(target) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }
        });
    }

    /// Worker loop: fetch targets, queue their children, emit resources.
    async fn work(self, resources: mpsc::Sender<Resource>) {
        loop {
            let target = tokio::select! {
                _ = self.shared.cancel.cancelled() => return,
                target = self.next_target() => match target {
                    Some(target) => target,
                    None => return,
                },
            };

            // Racing the fetch against cancellation aborts the in-flight
            // request; the target stays uncounted, which is fine because
            // the crawl is over.
            let (resource, children) = tokio::select! {
                _ = self.shared.cancel.cancelled() => return,
                visited = self.visit(target) => visited,
            };

            // Children are counted into pending before the resource goes
            // out, so an observer seeing the resource knows its children
            // are already accounted for.
            if resource.error.is_none() {
                let novel = self.shared.duplicates.filter(children);
                self.enqueue(novel, Some(resource.target.url.clone()));
            }

            tokio::select! {
                _ = self.shared.cancel.cancelled() => return,
                sent = resources.send(resource) => {
                    if sent.is_err() {
                        return;
                    }
                    self.shared.pending.done();
                }
            }
        }
    }

    async fn next_target(&self) -> Option<Target> {
        let mut targets = self.shared.targets_rx.lock().await;
        targets.recv().await
    }

    /// Fetches one target and returns its resource plus any child URLs
    /// discovered in the body. On error the child list is empty and the
    /// error is recorded on the resource.
    async fn visit(&self, target: Target) -> (Resource, Vec<Url>) {
        let start = Instant::now();

        let response = match self.shared.client.get(target.url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                let resource = Resource {
                    target,
                    status: 0,
                    duration: start.elapsed(),
                    body: Body::Empty,
                    error: Some(CrawlError::Transport(err)),
                };
                return (resource, Vec::new());
            }
        };

        let status = response.status().as_u16();
        let duration = start.elapsed();

        if self.shared.options.allow_404 && response.status() == StatusCode::NOT_FOUND {
            let resource = Resource {
                target,
                status,
                duration,
                body: Body::Streaming(response),
                error: None,
            };
            return (resource, Vec::new());
        }

        if status >= 300 {
            let resource = Resource {
                target,
                status,
                duration,
                body: Body::Streaming(response),
                error: Some(CrawlError::Status {
                    status: crate::status_text(status),
                }),
            };
            return (resource, Vec::new());
        }

        match self.classify(&target.url, &response) {
            ResourceKind::Other => {
                let resource = Resource {
                    target,
                    status,
                    duration,
                    body: Body::Streaming(response),
                    error: None,
                };
                (resource, Vec::new())
            }
            kind => {
                // Buffer the body so the extractor can read it in full and
                // the persister still sees the original bytes.
                let bytes = match response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        let resource = Resource {
                            target,
                            status,
                            duration,
                            body: Body::Empty,
                            error: Some(CrawlError::Transport(err)),
                        };
                        return (resource, Vec::new());
                    }
                };

                let extracted = match kind {
                    ResourceKind::Css => extract_css(&bytes, &self.shared.root, &target.url),
                    _ => extract_html(&bytes, &self.shared.root, &target.url),
                };

                let (children, error) = match extracted {
                    Ok(children) => (children, None),
                    Err(err) => (Vec::new(), Some(err)),
                };

                let resource = Resource {
                    target,
                    status,
                    duration,
                    body: Body::Buffered(bytes),
                    error,
                };
                (resource, children)
            }
        }
    }

    /// Chooses the extractor for a response: by URL path extension, or by
    /// the Content-Type header when sniffing is enabled and the server
    /// sent one.
    fn classify(&self, url: &Url, response: &reqwest::Response) -> ResourceKind {
        if self.shared.options.sniff_content_type {
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            if let Some(content_type) = content_type {
                if content_type.contains("text/html") {
                    return ResourceKind::Html;
                }
                if content_type.contains("text/css") {
                    return ResourceKind::Css;
                }
                return ResourceKind::Other;
            }
        }

        match path_extension(url.path()) {
            "css" => ResourceKind::Css,
            "html" | "htm" | "" => ResourceKind::Html,
            _ => ResourceKind::Other,
        }
    }
}

/// Extension of the final path segment, without the dot. Empty when the
/// segment has none.
fn path_extension(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or("");
    match file.rfind('.') {
        Some(i) => &file[i + 1..],
        None => "",
    }
}
