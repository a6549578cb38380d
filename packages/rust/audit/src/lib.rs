//! Audit execution against a live browser session.
//!
//! The production runner shells out to the Lighthouse CLI, pointing it at
//! the session's remote-debugging port and reading the JSON report from
//! stdout. The whole run is bounded by a configurable timeout; there is no
//! partial or degraded report, an engine failure fails the request.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use luma_browser::BrowserSession;
use luma_shared::{AuditConfig, LumaError, RawAuditReport, Result};

/// Characters of subprocess stderr echoed into an audit error message.
const MAX_STDERR_CHARS: usize = 2000;

/// Runs the audit engine against a live browser session.
#[async_trait]
pub trait AuditRunner: Send + Sync {
    /// Audit `url` through the session's debugging endpoint.
    async fn run(&self, url: &str, session: &BrowserSession) -> Result<RawAuditReport>;
}

/// [`AuditRunner`] backed by the Lighthouse CLI.
pub struct LighthouseRunner {
    config: AuditConfig,
}

impl LighthouseRunner {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AuditRunner for LighthouseRunner {
    async fn run(&self, url: &str, session: &BrowserSession) -> Result<RawAuditReport> {
        let args = lighthouse_args(url, session.debug_port());
        debug!(
            command = %self.config.command,
            url = %url,
            debug_port = session.debug_port(),
            "starting audit"
        );

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let audit_timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(audit_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(LumaError::Audit(format!(
                    "failed to run '{}': {e}; is the Lighthouse CLI installed?",
                    self.config.command
                )));
            }
            Err(_elapsed) => {
                return Err(LumaError::Audit(format!(
                    "audit did not finish within {}s",
                    self.config.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LumaError::Audit(format!(
                "'{}' exited with {}: {}",
                self.config.command,
                output.status,
                stderr_tail(&stderr, MAX_STDERR_CHARS)
            )));
        }

        let report = parse_report(&output.stdout)?;
        info!(
            url = %url,
            final_url = report.resolved_url().unwrap_or(url),
            fetch_time = ?report.fetch_time,
            categories = report.categories.len(),
            audits = report.audits.len(),
            engine_version = report.lighthouse_version.as_deref().unwrap_or("unknown"),
            "audit complete"
        );
        Ok(report)
    }
}

/// Arguments for one Lighthouse invocation against a debugging port.
fn lighthouse_args(url: &str, debug_port: u16) -> Vec<String> {
    vec![
        url.to_string(),
        "--port".into(),
        debug_port.to_string(),
        "--output=json".into(),
        "--output-path=stdout".into(),
        "--quiet".into(),
    ]
}

/// Parse the engine's stdout into a typed report.
fn parse_report(stdout: &[u8]) -> Result<RawAuditReport> {
    serde_json::from_slice(stdout)
        .map_err(|e| LumaError::Audit(format!("unreadable audit report: {e}")))
}

/// Keep the last `max_chars` characters of subprocess stderr; failures print
/// at the end of the stream.
fn stderr_tail(stderr: &str, max_chars: usize) -> String {
    let trimmed = stderr.trim();
    let char_count = trimmed.chars().count();
    if char_count <= max_chars {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(char_count - max_chars).collect();
    format!("...{tail}")
}
