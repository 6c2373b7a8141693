use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailConfig {
    /// Mailbox search query, in Gmail's own query language. Passed through
    /// to the provider unvalidated.
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Google "installed app" client secrets file.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Durable cache for the OAuth credential, so repeat fetches skip the
    /// interactive consent step.
    #[serde(default = "default_token_cache")]
    pub token_cache: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            scopes: default_scopes(),
            credentials_path: default_credentials_path(),
            token_cache: default_token_cache(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_query() -> String {
    "label:CVs".to_string()
}
fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/gmail.readonly".to_string()]
}
fn default_credentials_path() -> PathBuf {
    PathBuf::from("./credentials.json")
}
fn default_token_cache() -> PathBuf {
    std::env::temp_dir().join("smarthire_token.json")
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct JudgeConfig {
    /// `"gemini"` or `"disabled"`.
    #[serde(default = "default_judge_provider")]
    pub provider: String,
    #[serde(default = "default_judge_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: default_judge_provider(),
            model: default_judge_model(),
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_judge_provider() -> String {
    "gemini".to_string()
}
fn default_judge_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    /// Resumes are truncated to this many characters before the judge sees
    /// them. Silent and lossy; long resumes are judged on their prefix.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_max_prompt_chars() -> usize {
    8000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.gmail.query.trim().is_empty() {
        anyhow::bail!("gmail.query must not be empty");
    }

    if config.gmail.scopes.is_empty() {
        anyhow::bail!("gmail.scopes must list at least one scope");
    }

    if config.filter.max_prompt_chars == 0 {
        anyhow::bail!("filter.max_prompt_chars must be > 0");
    }

    match config.judge.provider.as_str() {
        "gemini" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown judge provider: '{}'. Must be gemini or disabled.",
            other
        ),
    }

    Ok(config)
}
