//! Luma backend — audits a web page in a headless browser and explains the
//! results in plain English.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

use luma_audit::LighthouseRunner;
use luma_browser::ChromeSessionManager;
use luma_completion::OpenAiClient;
use luma_core::compose::PromptOptions;
use luma_core::pipeline::Pipeline;
use luma_server::app::{AppState, build_router};
use luma_shared::{load_config, load_config_from, validate_api_key};

/// Luma — audit a web page's runtime quality and explain the results.
#[derive(Parser)]
#[command(
    name = "luma",
    version,
    about = "Audit a web page in a headless browser and explain the results.",
    long_about = None,
)]
struct Cli {
    /// Port to listen on (overrides config).
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Bind address (overrides config).
    #[arg(long, env = "LUMA_BIND")]
    bind: Option<String>,

    /// Config file path (defaults to ~/.luma/luma.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default_filter = format!(
        "luma_server={level},luma_core={level},luma_browser={level},\
         luma_audit={level},luma_completion={level},luma_shared={level}"
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }

    validate_api_key(&config)?;

    let sessions = Arc::new(ChromeSessionManager::new(config.browser.clone()));
    let auditor = Arc::new(LighthouseRunner::new(config.audit.clone()));
    let completions = Arc::new(OpenAiClient::from_env(&config.openai)?);
    let prompt = PromptOptions {
        include_issue_scores: config.prompt.include_issue_scores,
    };

    let pipeline = Pipeline::new(sessions, auditor, completions, prompt);
    let state = AppState::new(Arc::new(pipeline));
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(model = %config.openai.model, "luma backend listening on http://{addr}");
    axum::serve(listener, router).await?;

    Ok(())
}
