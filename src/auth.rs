//! Gmail OAuth2 credential lifecycle.
//!
//! The decision of what to do with a cached credential is a pure function,
//! [`next_action`], over three states: use it as-is, silently refresh it,
//! or fall back to interactive authorization. Network and file I/O live in
//! the helpers around it so the state machine is testable offline.
//!
//! The cache file uses Google's "authorized user" JSON shape (`token`,
//! `refresh_token`, `token_uri`, `client_id`, `client_secret`, `scopes`,
//! `expiry`), so a token file written by other Google tooling keeps
//! working.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::config::GmailConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Redirect target for the console paste flow. The browser lands on
/// localhost, the user copies the `code` query parameter back.
const REDIRECT_URI: &str = "http://localhost";

/// Access tokens within this many seconds of expiry count as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A cached OAuth2 credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Expired means past `expiry` minus a small skew buffer. A credential
    /// without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|exp| now + Duration::seconds(EXPIRY_SKEW_SECS) >= exp)
    }
}

/// What to do with the cached credential before talking to the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialAction {
    UseAsIs,
    Refresh,
    ReauthorizeInteractively,
}

/// Pure credential state machine: no cached credential (or an unusable
/// one) forces interactive authorization; an expired credential with a
/// refresh token is refreshed in place; anything else is used as-is.
pub fn next_action(credential: Option<&StoredCredential>, now: DateTime<Utc>) -> CredentialAction {
    match credential {
        None => CredentialAction::ReauthorizeInteractively,
        Some(c) if c.access_token.is_empty() => CredentialAction::ReauthorizeInteractively,
        Some(c) if !c.is_expired(now) => CredentialAction::UseAsIs,
        Some(c) if c.refresh_token.is_some() => CredentialAction::Refresh,
        Some(_) => CredentialAction::ReauthorizeInteractively,
    }
}

/// Reads the cached credential. Any failure (missing file, bad JSON) is
/// treated as "no cached credential".
pub fn load_cached(path: &Path) -> Option<StoredCredential> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn store_cached(path: &Path, credential: &StoredCredential) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(credential)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write token cache: {}", path.display()))?;
    Ok(())
}

/// Client id/secret from a Google `credentials.json` ("installed" or
/// "web" application).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

pub fn load_client_secrets(path: &Path) -> Result<ClientSecrets> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read client secrets: {}", path.display()))?;
    let file: ClientSecretsFile =
        serde_json::from_str(&content).with_context(|| "Failed to parse client secrets")?;
    file.installed
        .or(file.web)
        .ok_or_else(|| anyhow::anyhow!("client secrets has neither 'installed' nor 'web' section"))
}

/// Builds the consent URL the user opens in a browser. `access_type=offline`
/// with `prompt=consent` so Google returns a refresh token.
pub fn authorization_url(secrets: &ClientSecrets, scopes: &[String]) -> Result<String> {
    let scope = scopes.join(" ");
    let url = reqwest::Url::parse_with_params(
        GOOGLE_AUTH_URL,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )?;
    Ok(url.into())
}

/// Token endpoint response, shared by the refresh and code-exchange calls.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

async fn token_request(
    client: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    let resp = client.post(token_uri).form(form).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!(
            "token endpoint returned HTTP {}: {}",
            status,
            body.chars().take(300).collect::<String>()
        );
    }
    Ok(resp.json().await?)
}

/// Silently refreshes an expired credential in place. The refresh token is
/// carried over when the endpoint does not return a new one.
pub async fn refresh(credential: &StoredCredential, timeout_secs: u64) -> Result<StoredCredential> {
    let refresh_token = credential
        .refresh_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("credential has no refresh token"))?;

    let client = http_client(timeout_secs)?;
    let response = token_request(
        &client,
        &credential.token_uri,
        &[
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ],
    )
    .await?;

    Ok(StoredCredential {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| credential.refresh_token.clone()),
        expiry: response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
        ..credential.clone()
    })
}

/// Exchanges a pasted authorization code for a credential.
pub async fn exchange_code(
    secrets: &ClientSecrets,
    code: &str,
    scopes: &[String],
    timeout_secs: u64,
) -> Result<StoredCredential> {
    let client = http_client(timeout_secs)?;
    let response = token_request(
        &client,
        &secrets.token_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;

    Ok(StoredCredential {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        token_uri: secrets.token_uri.clone(),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes: scopes.to_vec(),
        expiry: response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// Resolves a usable credential per the state machine, writing any
/// refreshed or newly obtained credential back to the cache.
///
/// With `interactive` false (every command except `login`), reaching the
/// interactive state is an error telling the user to run `hire login`;
/// the human-in-the-loop consent step never happens implicitly.
pub async fn ensure_credential(
    gmail: &GmailConfig,
    interactive: bool,
) -> Result<StoredCredential> {
    let cached = load_cached(&gmail.token_cache);
    let action = next_action(cached.as_ref(), Utc::now());

    match (action, cached) {
        (CredentialAction::UseAsIs, Some(credential)) => Ok(credential),
        (CredentialAction::Refresh, Some(credential)) => {
            match refresh(&credential, gmail.timeout_secs).await {
                Ok(refreshed) => {
                    store_cached(&gmail.token_cache, &refreshed)?;
                    Ok(refreshed)
                }
                Err(e) => {
                    // Refresh failure degrades to interactive, not a crash.
                    eprintln!("warning: token refresh failed: {:#}", e);
                    authorize_interactively(gmail, interactive).await
                }
            }
        }
        _ => authorize_interactively(gmail, interactive).await,
    }
}

async fn authorize_interactively(
    gmail: &GmailConfig,
    interactive: bool,
) -> Result<StoredCredential> {
    if !interactive {
        bail!("no valid Gmail credential; run `hire login` first");
    }

    let secrets = load_client_secrets(&gmail.credentials_path)?;
    let url = authorization_url(&secrets, &gmail.scopes)?;

    println!("Open this URL in a browser and authorize access:");
    println!();
    println!("  {}", url);
    println!();
    println!("After consenting, the browser is redirected to {}/?code=...", REDIRECT_URI);
    print!("Paste the value of the code parameter here: ");
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;
    let code = code.trim();
    if code.is_empty() {
        bail!("empty authorization code");
    }

    let credential = exchange_code(&secrets, code, &gmail.scopes, gmail.timeout_secs).await?;
    store_cached(&gmail.token_cache, &credential)?;
    Ok(credential)
}
