//! Generation orchestration
//!
//! The [`Generator`] wires the crawler and the persister together: it
//! prepares the output directory, optionally starts the origin server,
//! seeds the crawl, drives a pool of persist tasks over the resource
//! stream, and shuts the origin down again. Cancellation from the caller
//! propagates into every worker, persist task, and in-flight request.

use crate::config::Config;
use crate::crawler::{CrawlOptions, Crawler};
use crate::events::Event;
use crate::output::Persister;
use crate::server::Origin;
use crate::Result;
use futures_util::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Drives one full crawl-and-persist run over a configured website.
pub struct Generator {
    config: Config,
    events: Option<mpsc::Sender<Event>>,
}

impl Generator {
    /// Creates a generator from a loaded configuration. Events are
    /// published on `events` when given; the channel closes when the
    /// generator is dropped.
    pub fn new(config: Config, events: Option<mpsc::Sender<Event>>) -> Self {
        Self { config, events }
    }

    /// Runs the pipeline to completion or cancellation.
    ///
    /// The sequence: wipe and recreate the output directory, start the
    /// origin command when one is configured, crawl from the seed URL plus
    /// any extra pages, persist every visited resource, then stop the
    /// origin. Cancelling `cancel` aborts the crawl early; partial output
    /// is left on disk.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let root = Url::parse(&self.config.url)?;

        self.prepare_output_dir().await?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.resource_timeout))
            .build()?;

        let origin = self.start_origin(&client, &cancel).await?;

        let crawler = Crawler::new(
            root.clone(),
            client,
            CrawlOptions {
                concurrency: self.config.concurrency,
                allow_404: self.config.allow_404,
                sniff_content_type: self.config.sniff_content_type,
            },
            &cancel,
        );

        self.emit(Event::StartCrawl).await;
        let resources = crawler.start();
        self.queue_pages(&crawler, &root);

        // Persist pool: the stream ends once every worker has exited and
        // the buffered resources are drained, on completion or cancel.
        let persister = Arc::new(Persister::new(&self.config.dir, self.events.clone()));
        ReceiverStream::new(resources)
            .for_each_concurrent(self.config.concurrency.max(1), |resource| {
                let persister = Arc::clone(&persister);
                async move { persister.save(resource).await }
            })
            .await;

        self.emit(Event::StopCrawl).await;

        if let Some(origin) = origin {
            self.emit(Event::StoppingServer).await;
            origin.stop().await?;
        }

        Ok(())
    }

    /// Removes and recreates the output directory.
    async fn prepare_output_dir(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.config.dir).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        tokio::fs::create_dir_all(&self.config.dir).await?;
        Ok(())
    }

    /// Starts the configured origin command, if any, and waits until it
    /// accepts requests.
    async fn start_origin(
        &self,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Result<Option<Origin>> {
        if self.config.command.is_empty() {
            return Ok(None);
        }

        self.emit(Event::StartingServer {
            command: self.config.command.clone(),
            url: self.config.url.clone(),
        })
        .await;

        let origin = Origin::spawn(&self.config.command)?;
        if let Err(err) = origin.wait_until_listening(client, &self.config.url, cancel).await {
            let _ = origin.stop().await;
            return Err(err);
        }

        self.emit(Event::StartedServer {
            command: self.config.command.clone(),
            url: self.config.url.clone(),
        })
        .await;

        Ok(Some(origin))
    }

    /// Queues the configured extra pages, resolved against the seed.
    fn queue_pages(&self, crawler: &Crawler, root: &Url) {
        for page in &self.config.pages {
            match root.join(page) {
                Ok(url) => crawler.queue(url, None),
                Err(err) => tracing::warn!("skipping page {:?}: {}", page, err),
            }
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }
}
