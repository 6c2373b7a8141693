//! Judge capability: the external reasoning service behind every
//! relevance and review decision.
//!
//! The judge is an opaque textual classifier, never replicated locally.
//! [`Judge`] is the injectable seam; tests stub it deterministically.
//!
//! # Retry Strategy
//!
//! The Gemini judge retries transient faults with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::JudgeConfig;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// External reasoning capability: ordered content parts in, free-form
/// text out. Failures surface as errors, never as verdict text.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn generate(&self, parts: &[String]) -> Result<String>;
}

// ============ Disabled Judge ============

/// Always-erroring judge for configurations without an API key.
pub struct DisabledJudge;

#[async_trait]
impl Judge for DisabledJudge {
    async fn generate(&self, _parts: &[String]) -> Result<String> {
        bail!("Judge provider is disabled")
    }
}

// ============ Gemini Judge ============

/// Judge backed by the Google Generative Language API
/// (`models/{model}:generateContent`, API-key auth).
pub struct GeminiJudge {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl GeminiJudge {
    /// # Errors
    ///
    /// Returns an error if the configured API-key environment variable is
    /// not set.
    pub fn new(config: &JudgeConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Judge for GeminiJudge {
    async fn generate(&self, parts: &[String]) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": parts.iter().map(|text| serde_json::json!({ "text": text }))
                    .collect::<Vec<_>>(),
            }],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self.http.post(&url).json(&body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_generate_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("judge API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("judge API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("judge call failed after retries")))
    }
}

/// Extracts the first candidate's text parts, concatenated.
fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid judge response: missing candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        bail!("Invalid judge response: no text parts");
    }

    Ok(text)
}

/// Create the configured [`Judge`].
pub fn create_judge(config: &JudgeConfig) -> Result<Box<dyn Judge>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledJudge)),
        "gemini" => Ok(Box::new(GeminiJudge::new(config)?)),
        other => bail!("Unknown judge provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JudgeConfig;

    #[test]
    fn parse_single_part_response() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Shortlist – strong match" }], "role": "model" }
            }]
        });
        assert_eq!(
            parse_generate_response(&json).unwrap(),
            "Shortlist – strong match"
        );
    }

    #[test]
    fn parse_concatenates_multiple_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Reject. " }, { "text": "Weak fit." }] }
            }]
        });
        assert_eq!(parse_generate_response(&json).unwrap(), "Reject. Weak fit.");
    }

    #[test]
    fn parse_missing_candidates_errors() {
        let json = serde_json::json!({ "promptFeedback": {} });
        assert!(parse_generate_response(&json).is_err());
    }

    #[tokio::test]
    async fn disabled_judge_always_errors() {
        let judge = DisabledJudge;
        assert!(judge.generate(&["hello".to_string()]).await.is_err());
    }

    #[test]
    fn create_judge_disabled() {
        let config = JudgeConfig {
            provider: "disabled".to_string(),
            ..JudgeConfig::default()
        };
        assert!(create_judge(&config).is_ok());
    }

    #[test]
    fn create_judge_unknown_provider_errors() {
        let config = JudgeConfig {
            provider: "oracle".to_string(),
            ..JudgeConfig::default()
        };
        assert!(create_judge(&config).is_err());
    }
}
