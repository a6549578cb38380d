//! Application configuration for Luma.
//!
//! User config lives at `~/.luma/luma.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LumaError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "luma.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".luma";

// ---------------------------------------------------------------------------
// Config structs (matching luma.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Headless browser settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Audit engine settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// OpenAI settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Explanation prompt settings.
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    3001
}
fn default_bind() -> String {
    "127.0.0.1".into()
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Explicit browser binary (name or path). Unset means probe PATH
    /// for a known Chromium binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Seconds to wait for the browser to announce its debugging endpoint.
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            binary: None,
            launch_timeout_secs: default_launch_timeout_secs(),
        }
    }
}

fn default_launch_timeout_secs() -> u64 {
    30
}

/// `[audit]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Audit CLI command (name or path).
    #[serde(default = "default_audit_command")]
    pub command: String,

    /// Seconds the whole audit run may take before it is killed.
    #[serde(default = "default_audit_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            command: default_audit_command(),
            timeout_secs: default_audit_timeout_secs(),
        }
    }
}

fn default_audit_command() -> String {
    "lighthouse".into()
}
fn default_audit_timeout_secs() -> u64 {
    120
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model to use for explanations.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds before a completion request is abandoned.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_completion_timeout_secs() -> u64 {
    60
}

/// `[prompt]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Prefix each issue line with its rounded percentage score.
    #[serde(default = "default_true")]
    pub include_issue_scores: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_issue_scores: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.luma/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| LumaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.luma/luma.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LumaError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LumaError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Check that the OpenAI API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(LumaError::config(format!(
            "OpenAI API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://platform.openai.com/api-keys"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("lighthouse"));
        assert!(toml_str.contains("port = 3001"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.server.port, 3001);
        assert_eq!(parsed.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(parsed.audit.timeout_secs, 120);
        assert!(parsed.prompt.include_issue_scores);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[server]
port = 8080

[browser]
binary = "/usr/bin/chromium"

[openai]
model = "gpt-4o-mini"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.browser.binary.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(config.browser.launch_timeout_secs, 30);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.audit.command, "lighthouse");
    }

    #[test]
    fn load_config_from_missing_file_is_an_io_error() {
        let err = load_config_from(Path::new("/nonexistent/luma.toml")).unwrap_err();
        match err {
            LumaError::Io { path, .. } => assert!(path.ends_with("luma.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openai.api_key_env = "LUMA_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
