//! Crawl lifecycle events and the human-readable reporter
//!
//! The generator publishes events on a channel; consumers must drain the
//! channel until the generator closes it. The [`Reporter`] is the stock
//! consumer, logging one line per visited resource and a summary at the
//! end of the crawl.

use crate::status_text;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

/// Events emitted over the lifetime of a generation run.
#[derive(Debug)]
pub enum Event {
    /// The origin server command is being spawned.
    StartingServer { command: String, url: String },
    /// The origin server answered its first liveness probe.
    StartedServer { command: String, url: String },
    /// The origin server is about to receive SIGTERM.
    StoppingServer,
    /// The crawl is starting.
    StartCrawl,
    /// Every resource has been visited and persisted.
    StopCrawl,
    /// One resource was visited (successfully or not).
    VisitedResource {
        url: Url,
        parent: Option<Url>,
        duration: Duration,
        status: u16,
        filename: PathBuf,
        error: Option<String>,
    },
}

/// Logs a human-friendly report of generation events.
#[derive(Debug, Default)]
pub struct Reporter {
    count: u64,
    start: Option<Instant>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the event channel until the sender side closes, logging as
    /// it goes.
    pub async fn report(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::StartCrawl => {
                self.start = Some(Instant::now());
            }
            Event::StartingServer { command, url } => {
                tracing::info!("Starting server with command {:?}", command);
                tracing::info!("Waiting for server to listen on {}", url);
            }
            Event::StartedServer { .. } => {
                tracing::info!("Server is listening for requests");
            }
            Event::StoppingServer => {
                tracing::info!("Stopping server, sending SIGTERM");
            }
            Event::VisitedResource {
                url,
                duration,
                status,
                filename,
                error,
                ..
            } => {
                self.count += 1;
                match error {
                    None => tracing::info!(
                        "GET {} -> {} -> {} ({}ms)",
                        url,
                        filename.display(),
                        status_text(status),
                        duration.as_millis()
                    ),
                    Some(error) => tracing::error!(
                        "GET {} -> {} (error: {})",
                        url,
                        status_text(status),
                        error
                    ),
                }
            }
            Event::StopCrawl => {
                let elapsed = self.start.map(|start| start.elapsed()).unwrap_or_default();
                tracing::info!(
                    "Completed {} resources in {}ms",
                    self.count,
                    elapsed.as_millis()
                );
            }
        }
    }
}
