//! Gmail provider client and the attachment harvester.
//!
//! [`MailProvider`] is the seam to the mailbox: list message ids for a
//! query, fetch a message's part tree, fetch an attachment body. The
//! [`GmailClient`] implementation talks to the Gmail REST API with a
//! bearer token; tests stub the trait instead.
//!
//! [`harvest`] walks the results: only **top-level** payload parts are
//! inspected (nested multipart trees are deliberately not descended into),
//! candidates are matched by MIME type and filename, deduplicated by
//! filename across the whole batch, and decoded from URL-safe base64.
//! Provider errors short-circuit the harvest with whatever was already
//! accumulated; they never abort the caller.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;
use std::collections::HashSet;

use crate::auth::{self, StoredCredential};
use crate::config::Config;
use crate::models::Attachment;
use crate::report::{PipelineEvent, PipelineReporter};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

// ═══════════════════════════════════════════════════════════════════════
// Provider seam
// ═══════════════════════════════════════════════════════════════════════

/// Read-only mailbox access, as the harvester needs it.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// List ids of messages matching `query` (provider-side filtering;
    /// the query string is opaque to this system).
    async fn list_messages(&self, query: &str) -> Result<Vec<String>>;

    /// Fetch one message's payload with its part list.
    async fn get_message(&self, id: &str) -> Result<MessageDetail>;

    /// Fetch an attachment body as URL-safe base64 text.
    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String>;
}

/// Gmail message detail, reduced to what the harvester inspects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDetail {
    #[serde(default)]
    pub payload: MessagePayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub body: PartBody,
    /// Nested sub-parts. Present in the wire format but not traversed:
    /// the harvester is shallow on purpose.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: i64,
}

// ═══════════════════════════════════════════════════════════════════════
// Gmail REST client
// ═══════════════════════════════════════════════════════════════════════

pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
}

impl GmailClient {
    pub fn new(credential: &StoredCredential, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            access_token: credential.access_token.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: reqwest::Url) -> Result<T> {
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Gmail request failed: {}", url.path()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Gmail API error (HTTP {}) on {}: {}",
                status,
                url.path(),
                body.chars().take(300).collect::<String>()
            );
        }

        Ok(resp.json().await?)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    email_address: String,
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_messages(&self, query: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        // Follows nextPageToken until the listing is exhausted.
        loop {
            let mut params = vec![("q".to_string(), query.to_string())];
            if let Some(ref token) = page_token {
                params.push(("pageToken".to_string(), token.clone()));
            }
            let url =
                reqwest::Url::parse_with_params(&format!("{}/messages", GMAIL_API_BASE), &params)?;

            let page: ListResponse = self.get_json(url).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/messages/{}", GMAIL_API_BASE, id),
            &[("format", "full")],
        )?;
        self.get_json(url).await
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
        let url = reqwest::Url::parse(&format!(
            "{}/messages/{}/attachments/{}",
            GMAIL_API_BASE, message_id, attachment_id
        ))?;
        let resp: AttachmentResponse = self.get_json(url).await?;
        resp.data
            .ok_or_else(|| anyhow::anyhow!("attachment {} has no data", attachment_id))
    }
}

impl GmailClient {
    /// Email address of the authorized account.
    pub async fn profile_email(&self) -> Result<String> {
        let url = reqwest::Url::parse(&format!("{}/profile", GMAIL_API_BASE))?;
        let resp: ProfileResponse = self.get_json(url).await?;
        Ok(resp.email_address)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Harvest
// ═══════════════════════════════════════════════════════════════════════

/// MIME types accepted as resume candidates: PDF, the Office Open XML
/// family, and legacy Word.
fn is_candidate_mime(mime_type: &str) -> bool {
    mime_type == "application/pdf"
        || mime_type.starts_with("application/vnd.openxmlformats-officedocument")
        || mime_type == "application/msword"
}

/// Decodes a Gmail attachment body. Gmail pads some endpoints' base64url
/// output and not others, so both forms are accepted.
pub fn decode_attachment_data(data: &str) -> Result<Vec<u8>> {
    URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .context("attachment body is not valid base64url")
}

/// Harvests resume-candidate attachments for `query`.
///
/// Returns whatever was accumulated when a provider error occurs; the
/// error itself goes to the reporter. Duplicate filenames across the
/// batch are dropped, first occurrence wins.
pub async fn harvest(
    provider: &dyn MailProvider,
    query: &str,
    reporter: &dyn PipelineReporter,
) -> Vec<Attachment> {
    let mut attachments: Vec<Attachment> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    reporter.report(PipelineEvent::Listing {
        query: query.to_string(),
    });

    let ids = match provider.list_messages(query).await {
        Ok(ids) => ids,
        Err(e) => {
            reporter.warn(&format!("mail provider error while listing messages: {:#}", e));
            return attachments;
        }
    };

    'messages: for id in ids {
        let detail = match provider.get_message(&id).await {
            Ok(detail) => detail,
            Err(e) => {
                reporter.warn(&format!("mail provider error on message {}: {:#}", id, e));
                break;
            }
        };

        // Top-level parts only; part.parts is never descended into.
        for part in detail.payload.parts {
            if part.filename.is_empty() || !is_candidate_mime(&part.mime_type) {
                continue;
            }
            if seen.contains(&part.filename) {
                continue;
            }
            // Inline or malformed parts carry no attachment id.
            let Some(attachment_id) = part.body.attachment_id else {
                continue;
            };

            let data = match provider.get_attachment(&id, &attachment_id).await {
                Ok(data) => data,
                Err(e) => {
                    reporter.warn(&format!(
                        "mail provider error fetching {}: {:#}",
                        part.filename, e
                    ));
                    break 'messages;
                }
            };

            let bytes = match decode_attachment_data(&data) {
                Ok(bytes) => bytes,
                Err(e) => {
                    reporter.warn(&format!("skipping {}: {:#}", part.filename, e));
                    continue;
                }
            };

            seen.insert(part.filename.clone());
            attachments.push(Attachment {
                filename: part.filename,
                mime_type: part.mime_type,
                data: bytes,
            });
        }
    }

    attachments
}

// ═══════════════════════════════════════════════════════════════════════
// login / logout commands
// ═══════════════════════════════════════════════════════════════════════

pub async fn run_login(config: &Config) -> Result<()> {
    let credential = auth::ensure_credential(&config.gmail, true).await?;
    let client = GmailClient::new(&credential, config.gmail.timeout_secs)?;
    match client.profile_email().await {
        Ok(email) if !email.is_empty() => println!("Logged in as {}", email),
        _ => println!("Logged in."),
    }
    Ok(())
}

pub fn run_logout(config: &Config) -> Result<()> {
    let cache = &config.gmail.token_cache;
    if cache.exists() {
        std::fs::remove_file(cache)
            .with_context(|| format!("Failed to remove token cache: {}", cache.display()))?;
        println!("Logged out.");
    } else {
        println!("No cached credential.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoReporter;
    use base64::Engine as _;
    use std::sync::Mutex;

    fn b64(data: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(data)
    }

    fn part(filename: &str, mime_type: &str, attachment_id: Option<&str>) -> MessagePart {
        MessagePart {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            body: PartBody {
                attachment_id: attachment_id.map(|s| s.to_string()),
                size: 0,
            },
            parts: Vec::new(),
        }
    }

    /// Scripted in-memory provider: messages keyed by id, attachment
    /// bodies keyed by attachment id, with optional failure points.
    #[derive(Default)]
    struct StubProvider {
        messages: Vec<(String, MessageDetail)>,
        bodies: Vec<(String, String)>,
        fail_list: bool,
        fail_message: Option<String>,
        list_calls: Mutex<usize>,
    }

    #[async_trait]
    impl MailProvider for StubProvider {
        async fn list_messages(&self, _query: &str) -> Result<Vec<String>> {
            *self.list_calls.lock().unwrap() += 1;
            if self.fail_list {
                bail!("quota exceeded");
            }
            Ok(self.messages.iter().map(|(id, _)| id.clone()).collect())
        }

        async fn get_message(&self, id: &str) -> Result<MessageDetail> {
            if self.fail_message.as_deref() == Some(id) {
                bail!("backend error");
            }
            self.messages
                .iter()
                .find(|(mid, _)| mid == id)
                .map(|(_, detail)| detail.clone())
                .ok_or_else(|| anyhow::anyhow!("no such message"))
        }

        async fn get_attachment(&self, _message_id: &str, attachment_id: &str) -> Result<String> {
            self.bodies
                .iter()
                .find(|(aid, _)| aid == attachment_id)
                .map(|(_, data)| data.clone())
                .ok_or_else(|| anyhow::anyhow!("no such attachment"))
        }
    }

    fn message(parts: Vec<MessagePart>) -> MessageDetail {
        MessageDetail {
            payload: MessagePayload { parts },
        }
    }

    #[tokio::test]
    async fn harvests_candidate_attachments() {
        let provider = StubProvider {
            messages: vec![(
                "m1".to_string(),
                message(vec![
                    part("cv.pdf", "application/pdf", Some("a1")),
                    part("notes.txt", "text/plain", Some("a2")),
                ]),
            )],
            bodies: vec![("a1".to_string(), b64(b"%PDF-fake"))],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].filename, "cv.pdf");
        assert_eq!(result[0].mime_type, "application/pdf");
        assert_eq!(result[0].data, b"%PDF-fake");
    }

    #[tokio::test]
    async fn non_candidate_mime_excluded_even_with_filename() {
        let provider = StubProvider {
            messages: vec![(
                "m1".to_string(),
                message(vec![part("photo.png", "image/png", Some("a1"))]),
            )],
            bodies: vec![("a1".to_string(), b64(b"png"))],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn office_family_and_legacy_word_accepted() {
        let provider = StubProvider {
            messages: vec![(
                "m1".to_string(),
                message(vec![
                    part(
                        "cv.docx",
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                        Some("a1"),
                    ),
                    part("cv.doc", "application/msword", Some("a2")),
                ]),
            )],
            bodies: vec![
                ("a1".to_string(), b64(b"docx")),
                ("a2".to_string(), b64(b"doc")),
            ],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_filenames_first_seen_wins_across_messages() {
        let provider = StubProvider {
            messages: vec![
                (
                    "m1".to_string(),
                    message(vec![part("cv.pdf", "application/pdf", Some("a1"))]),
                ),
                (
                    "m2".to_string(),
                    message(vec![part("cv.pdf", "application/pdf", Some("a2"))]),
                ),
            ],
            bodies: vec![
                ("a1".to_string(), b64(b"first")),
                ("a2".to_string(), b64(b"second")),
            ],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].data, b"first");
    }

    #[tokio::test]
    async fn part_without_attachment_id_skipped() {
        let provider = StubProvider {
            messages: vec![(
                "m1".to_string(),
                message(vec![part("cv.pdf", "application/pdf", None)]),
            )],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn nested_parts_not_descended_into() {
        let mut wrapper = part("", "multipart/mixed", None);
        wrapper.parts = vec![part("nested-cv.pdf", "application/pdf", Some("a1"))];
        let provider = StubProvider {
            messages: vec![("m1".to_string(), message(vec![wrapper]))],
            bodies: vec![("a1".to_string(), b64(b"pdf"))],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn message_error_short_circuits_with_partial_results() {
        let provider = StubProvider {
            messages: vec![
                (
                    "m1".to_string(),
                    message(vec![part("first.pdf", "application/pdf", Some("a1"))]),
                ),
                (
                    "m2".to_string(),
                    message(vec![part("second.pdf", "application/pdf", Some("a2"))]),
                ),
            ],
            bodies: vec![
                ("a1".to_string(), b64(b"one")),
                ("a2".to_string(), b64(b"two")),
            ],
            fail_message: Some("m2".to_string()),
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].filename, "first.pdf");
    }

    #[tokio::test]
    async fn list_error_yields_empty_not_panic() {
        let provider = StubProvider {
            fail_list: true,
            ..Default::default()
        };
        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn empty_mailbox_harvests_empty_twice() {
        let provider = StubProvider::default();
        assert!(harvest(&provider, "label:CVs", &NoReporter).await.is_empty());
        assert!(harvest(&provider, "label:CVs", &NoReporter).await.is_empty());
        assert_eq!(*provider.list_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn undecodable_body_skipped_not_fatal() {
        let provider = StubProvider {
            messages: vec![(
                "m1".to_string(),
                message(vec![
                    part("bad.pdf", "application/pdf", Some("a1")),
                    part("good.pdf", "application/pdf", Some("a2")),
                ]),
            )],
            bodies: vec![
                ("a1".to_string(), "!!not-base64!!".to_string()),
                ("a2".to_string(), b64(b"fine")),
            ],
            ..Default::default()
        };

        let result = harvest(&provider, "label:CVs", &NoReporter).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].filename, "good.pdf");
    }

    #[test]
    fn decode_accepts_padded_and_unpadded() {
        let padded = URL_SAFE.encode(b"hello");
        let unpadded = URL_SAFE_NO_PAD.encode(b"hello");
        assert_eq!(decode_attachment_data(&padded).unwrap(), b"hello");
        assert_eq!(decode_attachment_data(&unpadded).unwrap(), b"hello");
    }

    #[test]
    fn candidate_mime_matrix() {
        assert!(is_candidate_mime("application/pdf"));
        assert!(is_candidate_mime(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(is_candidate_mime("application/msword"));
        assert!(!is_candidate_mime("image/png"));
        assert!(!is_candidate_mime("text/plain"));
        assert!(!is_candidate_mime("application/zip"));
    }
}
