//! Deterministic aggregation of a raw audit report into a scorecard and
//! issue list.

use luma_shared::{Issue, LumaError, RawAuditReport, Result, ScoreCard};

/// Category ids that must be present in every report.
const REQUIRED_CATEGORIES: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];

/// An audit entry becomes an issue when its score is strictly below this
/// fraction. Entries with a null score are never issues.
pub const ISSUE_SCORE_THRESHOLD: f64 = 0.9;

/// Build the scorecard and filtered issue list from a raw report.
///
/// `requested_url` is used when the report carries no final URL (the engine
/// normally reports the post-redirect URL it actually analyzed).
pub fn aggregate(report: &RawAuditReport, requested_url: &str) -> Result<(ScoreCard, Vec<Issue>)> {
    let summary = build_scorecard(report, requested_url)?;
    let suggestions = collect_issues(report);
    Ok((summary, suggestions))
}

/// Round a fractional score to an integer percentage; a null score counts
/// as zero.
pub(crate) fn to_percent(score: Option<f64>) -> u8 {
    (score.unwrap_or(0.0) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn build_scorecard(report: &RawAuditReport, requested_url: &str) -> Result<ScoreCard> {
    let mut scores = [0u8; 4];
    for (slot, id) in scores.iter_mut().zip(REQUIRED_CATEGORIES) {
        let category = report.categories.get(id).ok_or_else(|| {
            LumaError::aggregation(format!("report is missing the mandatory '{id}' category"))
        })?;
        *slot = to_percent(category.score);
    }

    Ok(ScoreCard {
        url: report.resolved_url().unwrap_or(requested_url).to_string(),
        performance: scores[0],
        accessibility: scores[1],
        best_practices: scores[2],
        seo: scores[3],
    })
}

fn collect_issues(report: &RawAuditReport) -> Vec<Issue> {
    report
        .audits
        .iter()
        .filter(|(_, audit)| matches!(audit.score, Some(s) if s < ISSUE_SCORE_THRESHOLD))
        .map(|(id, audit)| Issue {
            id: id.clone(),
            title: audit.title.clone(),
            score: audit.score,
            description: audit.description.clone(),
        })
        .collect()
}
