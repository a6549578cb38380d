//! Headless browser session management.
//!
//! A [`BrowserSession`] wraps one isolated Chromium process launched with a
//! throwaway profile and an OS-assigned remote-debugging port. Sessions are
//! acquired per request and never pooled or shared; releasing one kills the
//! process and removes its profile directory.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use luma_shared::{BrowserConfig, LumaError, Result};

/// Browser binaries probed on PATH, in preference order.
const CANDIDATE_BROWSERS: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// Marker the browser prints on stderr once the DevTools endpoint is up.
const ENDPOINT_MARKER: &str = "DevTools listening on ";

/// Stderr lines retained for error context while waiting for the endpoint.
const STDERR_TAIL_LINES: usize = 20;

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Acquires and releases isolated browser sessions.
///
/// One session maps to exactly one browser process. `release` must be called
/// once per acquired session; a session dropped without release still reaps
/// its process via `kill_on_drop`, so cancellation cannot leak browsers.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Launch a browser and wait until its debugging endpoint is announced.
    async fn acquire(&self) -> Result<BrowserSession>;

    /// Terminate the session's browser process and remove its profile.
    async fn release(&self, session: BrowserSession) -> Result<()>;
}

// ---------------------------------------------------------------------------
// BrowserSession
// ---------------------------------------------------------------------------

/// An exclusive handle on one running browser instance.
#[derive(Debug)]
pub struct BrowserSession {
    debug_port: u16,
    endpoint: String,
    process: Option<SessionProcess>,
}

/// Owned process state for a session launched by [`ChromeSessionManager`].
#[derive(Debug)]
struct SessionProcess {
    child: Child,
    /// Removed on drop; keeps each session's profile isolated.
    profile_dir: TempDir,
}

impl BrowserSession {
    /// The remote-debugging port the audit engine connects to.
    pub fn debug_port(&self) -> u16 {
        self.debug_port
    }

    /// The DevTools WebSocket endpoint announced at launch.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wrap an externally launched browser reachable on `debug_port`.
    ///
    /// The returned session owns no process; releasing it only drops the
    /// handle.
    pub fn attached(debug_port: u16) -> Self {
        Self {
            debug_port,
            endpoint: format!("ws://127.0.0.1:{debug_port}"),
            process: None,
        }
    }

    async fn shutdown(mut self) -> Result<()> {
        let Some(mut process) = self.process.take() else {
            debug!(debug_port = self.debug_port, "released attached session");
            return Ok(());
        };

        if let Ok(Some(status)) = process.child.try_wait() {
            debug!(debug_port = self.debug_port, %status, "browser exited before release");
            return Ok(());
        }

        process
            .child
            .kill()
            .await
            .map_err(|e| LumaError::Session(format!("failed to kill browser process: {e}")))?;
        debug!(debug_port = self.debug_port, "browser session released");
        drop(process.profile_dir);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChromeSessionManager
// ---------------------------------------------------------------------------

/// Launches isolated headless Chromium sessions.
///
/// Sandboxing is disabled at launch because the host may lack the privileges
/// Chromium's sandbox needs (restricted container runtimes); the audit only
/// navigates to the caller-supplied URL.
pub struct ChromeSessionManager {
    config: BrowserConfig,
}

impl ChromeSessionManager {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionManager for ChromeSessionManager {
    async fn acquire(&self) -> Result<BrowserSession> {
        let binary = resolve_binary(self.config.binary.as_deref())?;
        let profile_dir = TempDir::new()
            .map_err(|e| LumaError::Session(format!("failed to create profile dir: {e}")))?;

        let mut cmd = Command::new(&binary);
        cmd.arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-data-dir={}", profile_dir.path().display()))
            .arg("--remote-debugging-port=0")
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(browser = %binary.display(), "spawning headless browser");
        let mut child = cmd.spawn().map_err(|e| {
            LumaError::Session(format!("failed to spawn {}: {e}", binary.display()))
        })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LumaError::Session("browser stderr was not captured".into()))?;

        let launch_timeout = Duration::from_secs(self.config.launch_timeout_secs);
        let scan = scan_for_endpoint(BufReader::new(stderr));
        let endpoint = match timeout(launch_timeout, scan).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(err)) => {
                let _ = child.kill().await;
                return Err(err);
            }
            Err(_elapsed) => {
                let _ = child.kill().await;
                return Err(LumaError::Session(format!(
                    "browser did not announce a debugging endpoint within {}s",
                    self.config.launch_timeout_secs
                )));
            }
        };

        let debug_port = match endpoint_port(&endpoint) {
            Ok(port) => port,
            Err(err) => {
                let _ = child.kill().await;
                return Err(err);
            }
        };

        info!(debug_port, browser = %binary.display(), "browser session ready");
        Ok(BrowserSession {
            debug_port,
            endpoint,
            process: Some(SessionProcess { child, profile_dir }),
        })
    }

    async fn release(&self, session: BrowserSession) -> Result<()> {
        session.shutdown().await
    }
}

// ---------------------------------------------------------------------------
// Launch helpers
// ---------------------------------------------------------------------------

/// Resolve the browser binary: the configured value, or the first candidate
/// found on PATH.
fn resolve_binary(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(binary) = configured {
        return which::which(binary).map_err(|e| {
            LumaError::Session(format!("configured browser '{binary}' not usable: {e}"))
        });
    }

    for candidate in CANDIDATE_BROWSERS {
        if let Ok(path) = which::which(candidate) {
            debug!(browser = *candidate, path = %path.display(), "browser detected on PATH");
            return Ok(path);
        }
    }

    Err(LumaError::Session(format!(
        "no headless browser found on PATH (tried {})",
        CANDIDATE_BROWSERS.join(", ")
    )))
}

/// Read stderr lines until the DevTools endpoint announcement appears.
///
/// Keeps a short tail of output so launch failures carry usable context.
async fn scan_for_endpoint<R>(reader: R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| LumaError::Session(format!("failed to read browser output: {e}")))?;
        let Some(line) = line else {
            // EOF: the browser exited (or closed stderr) without announcing.
            let context: Vec<&str> = tail.iter().map(String::as_str).collect();
            return Err(LumaError::Session(format!(
                "browser exited before announcing a debugging endpoint; last output: {}",
                context.join(" | ")
            )));
        };

        if let Some((_, rest)) = line.split_once(ENDPOINT_MARKER) {
            let endpoint = rest.trim().to_string();
            debug!(%endpoint, "browser announced debugging endpoint");
            return Ok(endpoint);
        }

        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
}

/// Extract the port from the announced WebSocket endpoint URL.
fn endpoint_port(endpoint: &str) -> Result<u16> {
    let parsed = Url::parse(endpoint).map_err(|e| {
        LumaError::Session(format!("unparseable debugging endpoint '{endpoint}': {e}"))
    })?;
    parsed
        .port()
        .ok_or_else(|| LumaError::Session(format!("debugging endpoint '{endpoint}' has no port")))
}
