//! End-to-end tests for the analyze HTTP surface.
//!
//! Spins up the router on a random port with stub session, audit, and
//! completion backends, then exercises it over real HTTP.

use std::sync::Arc;

use async_trait::async_trait;

use luma_audit::AuditRunner;
use luma_browser::{BrowserSession, SessionManager};
use luma_completion::CompletionApi;
use luma_core::compose::PromptOptions;
use luma_core::pipeline::Pipeline;
use luma_server::app::{AppState, build_router};
use luma_shared::{LumaError, RawAuditReport, Result};

const REPORT: &str = r#"{
    "finalDisplayedUrl": "https://example.com/",
    "lighthouseVersion": "12.1.0",
    "categories": {
        "performance": { "score": 0.42 },
        "accessibility": { "score": 0.95 },
        "best-practices": { "score": 0.88 },
        "seo": { "score": 1.0 }
    },
    "audits": {
        "render-blocking-resources": {
            "title": "Eliminate render-blocking resources",
            "description": "Resources are blocking first paint.",
            "score": 0.3
        },
        "network-requests": {
            "title": "Network Requests",
            "description": "Lists the network requests made during page load.",
            "score": null
        }
    }
}"#;

struct StubSessions;

#[async_trait]
impl SessionManager for StubSessions {
    async fn acquire(&self) -> Result<BrowserSession> {
        Ok(BrowserSession::attached(9222))
    }

    async fn release(&self, _session: BrowserSession) -> Result<()> {
        Ok(())
    }
}

struct StubAuditor {
    fail: bool,
}

#[async_trait]
impl AuditRunner for StubAuditor {
    async fn run(&self, _url: &str, _session: &BrowserSession) -> Result<RawAuditReport> {
        if self.fail {
            return Err(LumaError::Audit("'lighthouse' exited with exit status: 1".into()));
        }
        Ok(serde_json::from_str(REPORT).expect("stub report"))
    }
}

struct StubCompletions;

#[async_trait]
impl CompletionApi for StubCompletions {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("Start with render-blocking resources.".into())
    }
}

async fn spawn_app(fail_audit: bool) -> String {
    let pipeline = Pipeline::new(
        Arc::new(StubSessions),
        Arc::new(StubAuditor { fail: fail_audit }),
        Arc::new(StubCompletions),
        PromptOptions::default(),
    );
    let app = build_router(AppState::new(Arc::new(pipeline)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn missing_url_key_is_a_bad_request() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body, serde_json::json!({ "error": "URL required" }));
}

#[tokio::test]
async fn empty_url_is_a_bad_request() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({ "url": "" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["error"], "URL required");
}

#[tokio::test]
async fn analyze_returns_the_full_analysis() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({ "url": "https://example.com" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");

    assert_eq!(body["summary"]["url"], "https://example.com/");
    assert_eq!(body["summary"]["performance"], 42);
    assert_eq!(body["summary"]["accessibility"], 95);
    assert_eq!(body["summary"]["bestPractices"], 88);
    assert_eq!(body["summary"]["seo"], 100);

    let suggestions = body["suggestions"].as_array().expect("suggestions array");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["id"], "render-blocking-resources");

    assert_eq!(body["explanation"], "Start with render-blocking resources.");
}

#[tokio::test]
async fn engine_failures_surface_as_internal_errors() {
    let base = spawn_app(true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({ "url": "https://example.com" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("json body");
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("audit error"));
    assert!(message.contains("exit status: 1"));
}

#[tokio::test]
async fn healthz_reports_ok() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_secs"].is_number());
}

#[tokio::test]
async fn cross_origin_callers_are_allowed() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/analyze"))
        .header("origin", "http://localhost:5173")
        .json(&serde_json::json!({ "url": "https://example.com" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn preflight_requests_succeed() {
    let base = spawn_app(false).await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("{base}/analyze"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .expect("request");

    assert!(response.status().is_success());
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-methods")
    );
}
