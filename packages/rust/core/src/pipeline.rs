//! End-to-end analysis pipeline: browser session, audit, aggregation,
//! explanation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use luma_audit::AuditRunner;
use luma_browser::{BrowserSession, SessionManager};
use luma_completion::CompletionApi;
use luma_shared::{Analysis, LumaError, Result};

use crate::aggregate::aggregate;
use crate::compose::{PromptOptions, explain};

/// Orchestrates one analysis run across the injected components.
///
/// Construction wires concrete session, audit, and completion backends;
/// tests swap in stubs through the same traits.
pub struct Pipeline {
    sessions: Arc<dyn SessionManager>,
    auditor: Arc<dyn AuditRunner>,
    completions: Arc<dyn CompletionApi>,
    prompt: PromptOptions,
}

impl Pipeline {
    pub fn new(
        sessions: Arc<dyn SessionManager>,
        auditor: Arc<dyn AuditRunner>,
        completions: Arc<dyn CompletionApi>,
        prompt: PromptOptions,
    ) -> Self {
        Self {
            sessions,
            auditor,
            completions,
            prompt,
        }
    }

    /// Run the full pipeline for one URL.
    ///
    /// The browser session acquired here is released exactly once on every
    /// path out of the run, including audit, aggregation, and completion
    /// failures. A failed release is logged and never masks the run's own
    /// outcome.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn analyze(&self, url: &str) -> Result<Analysis> {
        if url.trim().is_empty() {
            return Err(LumaError::validation("URL required"));
        }

        let started = Instant::now();
        let session = self.sessions.acquire().await?;
        let debug_port = session.debug_port();
        let outcome = self.audit_and_explain(url, &session).await;

        if let Err(release_err) = self.sessions.release(session).await {
            warn!(debug_port, error = %release_err, "failed to release browser session");
        }

        let analysis = outcome?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            issues = analysis.suggestions.len(),
            "analysis complete"
        );
        Ok(analysis)
    }

    async fn audit_and_explain(&self, url: &str, session: &BrowserSession) -> Result<Analysis> {
        let report = self.auditor.run(url, session).await?;
        let (summary, suggestions) = aggregate(&report, url)?;
        let explanation = explain(
            self.completions.as_ref(),
            &summary,
            &suggestions,
            &self.prompt,
        )
        .await?;
        Ok(Analysis {
            summary,
            suggestions,
            explanation,
        })
    }
}
