//! Relevance filtering of harvested attachments against a job description.
//!
//! Each attachment is extracted, truncated, and put to the judge in input
//! order. The verdict contract is deliberately a literal substring match:
//! any response containing [`SHORTLIST_MARKER`] (case-sensitive) accepts,
//! everything else (including a judge failure) rejects. That contract is
//! part of the interface; changing it means changing these tests with it.

use crate::extract;
use crate::judge::Judge;
use crate::models::{Attachment, FilterOutcome, FilteredResume};
use crate::report::{PipelineEvent, PipelineReporter};

/// Token whose presence in the judge's response means "accept".
pub const SHORTLIST_MARKER: &str = "Shortlist";

/// The shortlist prompt. Shared with the `review` shortlist action so the
/// interactive decision matches what the filter asked.
pub fn shortlist_prompt(job_description: &str, resume: &str) -> String {
    format!(
        "You are a hiring assistant.\n\
         Decide whether to **Shortlist** or **Reject** the candidate.\n\
         Respond with only one word – Shortlist or Reject – and one sentence reason.\n\
         \n\
         Job Description:\n{}\n\
         \n\
         Resume:\n{}\n",
        job_description, resume
    )
}

/// First `max_chars` characters of `text` (not bytes; never splits a
/// multi-byte character).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Partitions `attachments` into accepted and rejected against
/// `job_description`.
///
/// Attachments with no extractable text are skipped and excluded from
/// both counts. A judge failure on one attachment counts it as rejected
/// and moves on; the batch is never aborted.
pub async fn filter_resumes(
    judge: &dyn Judge,
    job_description: &str,
    attachments: &[Attachment],
    max_prompt_chars: usize,
    reporter: &dyn PipelineReporter,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let total = attachments.len();

    for (i, attachment) in attachments.iter().enumerate() {
        reporter.report(PipelineEvent::Checking {
            filename: attachment.filename.clone(),
            n: i + 1,
            total,
        });

        let text = match extract::extract_text(&attachment.filename, &attachment.data, reporter) {
            Some(text) if !text.is_empty() => text,
            _ => {
                reporter.warn(&format!(
                    "could not extract text from {}",
                    attachment.filename
                ));
                outcome.skipped_count += 1;
                continue;
            }
        };

        let prompt = shortlist_prompt(job_description, truncate_chars(&text, max_prompt_chars));

        match judge.generate(&[prompt]).await {
            Ok(verdict) if verdict.contains(SHORTLIST_MARKER) => {
                reporter.report(PipelineEvent::Accepted {
                    filename: attachment.filename.clone(),
                });
                outcome.accepted_count += 1;
                outcome.accepted.push(FilteredResume {
                    attachment: attachment.clone(),
                    text,
                });
            }
            Ok(_) => {
                reporter.report(PipelineEvent::Rejected {
                    filename: attachment.filename.clone(),
                });
                outcome.rejected_count += 1;
            }
            Err(e) => {
                reporter.warn(&format!(
                    "judge error on {}: {:#}",
                    attachment.filename, e
                ));
                outcome.rejected_count += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoReporter;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Judge stub returning a fixed response, capturing every prompt.
    struct FixedJudge {
        response: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedJudge {
        fn accepting() -> Self {
            Self::with_response(Some("Shortlist – strong match"))
        }

        fn with_response(response: Option<&str>) -> Self {
            Self {
                response: response.map(|s| s.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Judge for FixedJudge {
        async fn generate(&self, parts: &[String]) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().extend(parts.iter().cloned());
            match &self.response {
                Some(text) => Ok(text.clone()),
                None => bail!("provider unavailable"),
            }
        }
    }

    fn txt_attachment(filename: &str, content: &str) -> Attachment {
        Attachment {
            filename: filename.to_string(),
            mime_type: "text/plain".to_string(),
            data: content.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn shortlist_response_accepts() {
        let judge = FixedJudge::accepting();
        let outcome = filter_resumes(
            &judge,
            "Rust engineer",
            &[txt_attachment("cv.txt", "ten years of Rust")],
            8000,
            &NoReporter,
        )
        .await;

        assert_eq!(outcome.accepted_count, 1);
        assert_eq!(outcome.rejected_count, 0);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].text, "ten years of Rust");
    }

    #[tokio::test]
    async fn reject_response_rejects() {
        let judge = FixedJudge::with_response(Some("Reject – unrelated background"));
        let outcome = filter_resumes(
            &judge,
            "Rust engineer",
            &[txt_attachment("cv.txt", "florist")],
            8000,
            &NoReporter,
        )
        .await;

        assert_eq!(outcome.accepted_count, 0);
        assert_eq!(outcome.rejected_count, 1);
    }

    #[tokio::test]
    async fn marker_match_is_case_sensitive() {
        let judge = FixedJudge::with_response(Some("SHORTLIST"));
        let outcome = filter_resumes(
            &judge,
            "jd",
            &[txt_attachment("cv.txt", "text")],
            8000,
            &NoReporter,
        )
        .await;
        assert_eq!(outcome.accepted_count, 0);
        assert_eq!(outcome.rejected_count, 1);
    }

    #[tokio::test]
    async fn judge_failure_rejects_and_continues() {
        let judge = FixedJudge::with_response(None);
        let outcome = filter_resumes(
            &judge,
            "jd",
            &[
                txt_attachment("a.txt", "first"),
                txt_attachment("b.txt", "second"),
            ],
            8000,
            &NoReporter,
        )
        .await;

        assert_eq!(outcome.accepted_count, 0);
        assert_eq!(outcome.rejected_count, 2);
        // Both attachments reached the judge despite the first failure.
        assert_eq!(judge.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unextractable_attachment_skipped_and_excluded_from_counts() {
        let judge = FixedJudge::accepting();
        let outcome = filter_resumes(
            &judge,
            "jd",
            &[
                txt_attachment("cv.xyz", "unsupported"),
                txt_attachment("cv.txt", "fine"),
            ],
            8000,
            &NoReporter,
        )
        .await;

        assert_eq!(outcome.skipped_count, 1);
        assert_eq!(outcome.accepted_count, 1);
        assert_eq!(outcome.rejected_count, 0);
        // The unsupported attachment never reached the judge.
        assert_eq!(judge.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_extracted_text_never_reaches_judge() {
        let judge = FixedJudge::accepting();
        let outcome = filter_resumes(
            &judge,
            "jd",
            &[txt_attachment("cv.txt", "")],
            8000,
            &NoReporter,
        )
        .await;

        assert_eq!(outcome.skipped_count, 1);
        assert!(judge.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_resume_truncated_to_exactly_8000_chars() {
        let judge = FixedJudge::accepting();
        let body: String = "x".repeat(10_000);
        filter_resumes(
            &judge,
            "jd",
            &[txt_attachment("cv.txt", &body)],
            8000,
            &NoReporter,
        )
        .await;

        let prompts = judge.prompts.lock().unwrap();
        let resume_part = prompts[0].split("Resume:\n").nth(1).unwrap();
        // Trailing newline from the prompt template.
        assert_eq!(resume_part.trim_end().chars().count(), 8000);
    }

    #[tokio::test]
    async fn prompt_contains_job_description() {
        let judge = FixedJudge::accepting();
        filter_resumes(
            &judge,
            "Senior Rust engineer, Berlin",
            &[txt_attachment("cv.txt", "text")],
            8000,
            &NoReporter,
        )
        .await;

        let prompts = judge.prompts.lock().unwrap();
        assert!(prompts[0].contains("Senior Rust engineer, Berlin"));
    }

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        let text = "éééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("", 10), "");
    }
}
