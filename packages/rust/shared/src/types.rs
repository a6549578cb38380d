//! Core domain types for Luma page audits.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawAuditReport
// ---------------------------------------------------------------------------

/// The audit engine's JSON report, deserialized from its stdout.
///
/// Only the fields the pipeline consumes are modeled; everything else in the
/// engine's (large) report is ignored. Both mappings preserve the engine's
/// own enumeration order, which downstream filtering must not disturb.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAuditReport {
    /// The URL the engine actually analyzed, after redirects.
    #[serde(
        default,
        rename = "finalDisplayedUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub final_displayed_url: Option<String>,

    /// Pre-v10 engines report the post-redirect URL under this key; v10 and
    /// v11 emit it alongside `finalDisplayedUrl`.
    #[serde(default, rename = "finalUrl", skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,

    /// When the audit data was gathered.
    #[serde(default, rename = "fetchTime", skip_serializing_if = "Option::is_none")]
    pub fetch_time: Option<DateTime<Utc>>,

    /// Engine version that produced the report.
    #[serde(
        default,
        rename = "lighthouseVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub lighthouse_version: Option<String>,

    /// Category id → aggregate category result.
    pub categories: IndexMap<String, CategoryResult>,

    /// Audit id → individual check result.
    pub audits: IndexMap<String, AuditEntry>,
}

impl RawAuditReport {
    /// The post-redirect URL, whichever key the engine version used for it.
    pub fn resolved_url(&self) -> Option<&str> {
        self.final_displayed_url
            .as_deref()
            .or(self.final_url.as_deref())
    }
}

/// Aggregate result for one category (performance, accessibility, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Fractional score in `[0.0, 1.0]`, or null when not computed.
    pub score: Option<f64>,
}

/// Result of one individual automated check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Short human-readable name of the check.
    pub title: String,
    /// Longer explanation, often with remediation hints.
    pub description: String,
    /// Fractional score in `[0.0, 1.0]`, or null when the check is
    /// informational or not applicable to the page.
    pub score: Option<f64>,
}

// ---------------------------------------------------------------------------
// ScoreCard
// ---------------------------------------------------------------------------

/// Rounded percentage scores for the four mandatory categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    /// The analyzed URL (post-redirect when the engine reports one).
    pub url: String,
    /// Performance score, 0–100.
    pub performance: u8,
    /// Accessibility score, 0–100.
    pub accessibility: u8,
    /// Best-practices score, 0–100.
    pub best_practices: u8,
    /// SEO score, 0–100.
    pub seo: u8,
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// A failing check surfaced to the caller, in report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Audit id from the report (e.g., `render-blocking-resources`).
    pub id: String,
    /// Short human-readable name of the check.
    pub title: String,
    /// Fractional score that put this entry below the issue threshold.
    pub score: Option<f64>,
    /// Longer explanation, often with remediation hints.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// The complete result of one analyze request (the HTTP 200 body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// Rounded category scores.
    pub summary: ScoreCard,
    /// Failing checks, in report order.
    pub suggestions: Vec<Issue>,
    /// Natural-language remediation brief from the completion engine,
    /// returned verbatim.
    pub explanation: String,
}
