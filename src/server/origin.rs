//! Managed origin subprocess
//!
//! When the configuration names a `command`, the generator runs it in a
//! process group of its own, probes it until it accepts requests, and
//! terminates the whole group once the crawl is over. The child sees
//! `STATICGEN=1` in its environment so build scripts can tell a crawl
//! apart from a normal run.

use crate::StaticgenError;
use reqwest::Client;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Interval between liveness probes while the origin boots.
const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Longest we wait for the origin to start listening.
const PROBE_DEADLINE: Duration = Duration::from_secs(15);

/// A spawned origin server process.
pub struct Origin {
    child: Child,
    output: Arc<Mutex<Vec<u8>>>,
}

impl Origin {
    /// Spawns `command` through `sh -c` in a new process group. Stdout and
    /// stderr are captured into a buffer that is only surfaced when
    /// startup fails.
    pub fn spawn(command: &str) -> Result<Self, StaticgenError> {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", command])
            .env("STATICGEN", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = Command::from(cmd).spawn()?;

        let output = Arc::new(Mutex::new(Vec::new()));
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(capture_output(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(capture_output(stderr, Arc::clone(&output)));
        }

        Ok(Self { child, output })
    }

    /// Probes `HEAD url` once per second until the origin answers without
    /// a transport error, giving up after 15 seconds.
    pub async fn wait_until_listening(
        &self,
        client: &Client,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StaticgenError> {
        let mut interval = tokio::time::interval(PROBE_INTERVAL);
        interval.tick().await; // the first tick completes immediately

        let deadline = tokio::time::sleep(PROBE_DEADLINE);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(self.startup_error("cancelled while waiting for server").await);
                }
                _ = &mut deadline => {
                    return Err(self.startup_error("server never started listening").await);
                }
                _ = interval.tick() => {
                    if client.head(url).send().await.is_ok() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Sends SIGTERM to the whole process group and reaps the child.
    pub async fn stop(mut self) -> Result<(), StaticgenError> {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            // The child leads its own process group, so its pid is the
            // group id; a negative pid signals every member.
            let rc = unsafe { libc::kill(-(pid as i32), libc::SIGTERM) };
            if rc != 0 {
                return Err(StaticgenError::OriginShutdown(
                    std::io::Error::last_os_error().to_string(),
                ));
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }

        let _ = self.child.wait().await;
        Ok(())
    }

    /// Builds a startup error, logging whatever the child printed so far.
    async fn startup_error(&self, reason: &str) -> StaticgenError {
        let output = self.output.lock().await;
        if !output.is_empty() {
            tracing::debug!("server output:\n{}", String::from_utf8_lossy(&output));
        }
        StaticgenError::OriginStartup(reason.to_string())
    }
}

/// Appends everything the child writes into the shared buffer.
async fn capture_output(mut reader: impl AsyncRead + Unpin, buffer: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buffer.lock().await.extend_from_slice(&chunk[..n]),
        }
    }
}
