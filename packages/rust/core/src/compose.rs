//! Deterministic prompt composition and explanation retrieval.

use tracing::debug;

use luma_completion::CompletionApi;
use luma_shared::{Issue, Result, ScoreCard};

use crate::aggregate::to_percent;

/// Options controlling prompt composition.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Prefix each issue line with its rounded percentage score.
    pub include_issue_scores: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            include_issue_scores: true,
        }
    }
}

/// Build the explanation prompt from the scorecard and ordered issue list.
///
/// Pure function of its inputs: identical inputs yield byte-identical text.
pub fn build_prompt(summary: &ScoreCard, issues: &[Issue], options: &PromptOptions) -> String {
    let issue_lines: Vec<String> = issues
        .iter()
        .map(|issue| {
            if options.include_issue_scores {
                format!(
                    "• [{}%] {}: {}",
                    to_percent(issue.score),
                    issue.title,
                    issue.description
                )
            } else {
                format!("• {}: {}", issue.title, issue.description)
            }
        })
        .collect();

    format!(
        "You are a senior web performance engineer.\n\
         \n\
         A Lighthouse audit was run on: {url}\n\
         \n\
         Category Scores:\n\
         - Performance: {performance}%\n\
         - Accessibility: {accessibility}%\n\
         - Best Practices: {best_practices}%\n\
         - SEO: {seo}%\n\
         \n\
         The following issues were detected:\n\
         {issues}\n\
         \n\
         Please provide a plain-English summary that includes:\n\
         1. The top 3–5 most important issues (ranked by user impact)\n\
         2. Why each issue matters in practical terms\n\
         3. Suggested fixes or techniques for each (brief but specific)\n\
         4. An overall prioritization strategy (what to fix first and why)\n\
         \n\
         Output should be under 300 words and focused on helping a frontend developer take action.\n",
        url = summary.url,
        performance = summary.performance,
        accessibility = summary.accessibility,
        best_practices = summary.best_practices,
        seo = summary.seo,
        issues = issue_lines.join("\n"),
    )
}

/// Request a natural-language explanation for the aggregated results.
///
/// The prompt goes out as a single user message with no system or history
/// context; the completion text comes back verbatim, with no local fallback
/// when the call fails.
pub async fn explain(
    completions: &dyn CompletionApi,
    summary: &ScoreCard,
    issues: &[Issue],
    options: &PromptOptions,
) -> Result<String> {
    let prompt = build_prompt(summary, issues, options);
    debug!(
        prompt_chars = prompt.len(),
        issues = issues.len(),
        "requesting explanation"
    );
    completions.complete(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> ScoreCard {
        ScoreCard {
            url: "https://example.com/".into(),
            performance: 42,
            accessibility: 95,
            best_practices: 88,
            seo: 100,
        }
    }

    fn sample_issues() -> Vec<Issue> {
        vec![Issue {
            id: "render-blocking-resources".into(),
            title: "Eliminate render-blocking resources".into(),
            score: Some(0.3),
            description: "Resources are blocking first paint.".into(),
        }]
    }

    #[test]
    fn golden_prompt_with_issue_scores() {
        let prompt = build_prompt(
            &sample_summary(),
            &sample_issues(),
            &PromptOptions::default(),
        );

        let expected = "You are a senior web performance engineer.\n\
            \n\
            A Lighthouse audit was run on: https://example.com/\n\
            \n\
            Category Scores:\n\
            - Performance: 42%\n\
            - Accessibility: 95%\n\
            - Best Practices: 88%\n\
            - SEO: 100%\n\
            \n\
            The following issues were detected:\n\
            • [30%] Eliminate render-blocking resources: Resources are blocking first paint.\n\
            \n\
            Please provide a plain-English summary that includes:\n\
            1. The top 3–5 most important issues (ranked by user impact)\n\
            2. Why each issue matters in practical terms\n\
            3. Suggested fixes or techniques for each (brief but specific)\n\
            4. An overall prioritization strategy (what to fix first and why)\n\
            \n\
            Output should be under 300 words and focused on helping a frontend developer take action.\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn prompt_is_byte_identical_for_identical_inputs() {
        let a = build_prompt(
            &sample_summary(),
            &sample_issues(),
            &PromptOptions::default(),
        );
        let b = build_prompt(
            &sample_summary(),
            &sample_issues(),
            &PromptOptions::default(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn score_prefix_can_be_disabled() {
        let options = PromptOptions {
            include_issue_scores: false,
        };
        let prompt = build_prompt(&sample_summary(), &sample_issues(), &options);
        assert!(prompt.contains(
            "• Eliminate render-blocking resources: Resources are blocking first paint."
        ));
        assert!(!prompt.contains("[30%]"));
    }

    #[test]
    fn issue_lines_follow_input_order() {
        let issues = vec![
            Issue {
                id: "c".into(),
                title: "Third check".into(),
                score: Some(0.1),
                description: "d".into(),
            },
            Issue {
                id: "a".into(),
                title: "First check".into(),
                score: Some(0.2),
                description: "d".into(),
            },
            Issue {
                id: "b".into(),
                title: "Second check".into(),
                score: Some(0.3),
                description: "d".into(),
            },
        ];

        let prompt = build_prompt(&sample_summary(), &issues, &PromptOptions::default());
        let third = prompt.find("Third check").expect("third");
        let first = prompt.find("First check").expect("first");
        let second = prompt.find("Second check").expect("second");
        assert!(third < first);
        assert!(first < second);
    }

    #[test]
    fn empty_issue_list_keeps_the_section_header() {
        let prompt = build_prompt(&sample_summary(), &[], &PromptOptions::default());
        assert!(prompt.contains("The following issues were detected:\n\n\nPlease provide"));
    }

    #[tokio::test]
    async fn explain_submits_the_built_prompt_and_returns_verbatim() {
        struct CapturingCompletion {
            captured: std::sync::Mutex<Option<String>>,
        }

        #[async_trait::async_trait]
        impl CompletionApi for CapturingCompletion {
            async fn complete(&self, prompt: &str) -> Result<String> {
                *self.captured.lock().unwrap() = Some(prompt.to_string());
                Ok("Fix render-blocking resources first. \n".into())
            }
        }

        let completions = CapturingCompletion {
            captured: std::sync::Mutex::new(None),
        };
        let summary = sample_summary();
        let issues = sample_issues();
        let options = PromptOptions::default();

        let explanation = explain(&completions, &summary, &issues, &options)
            .await
            .expect("explain");
        // Verbatim, including the model's trailing whitespace.
        assert_eq!(explanation, "Fix render-blocking resources first. \n");

        let seen = completions.captured.lock().unwrap().take().expect("prompt");
        assert_eq!(seen, build_prompt(&summary, &issues, &options));
    }
}
