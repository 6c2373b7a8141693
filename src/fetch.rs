//! The fetch pipeline: harvest the mailbox, filter against a job
//! description, persist what the judge shortlisted.

use anyhow::{Context, Result};

use crate::auth;
use crate::config::Config;
use crate::db;
use crate::filter;
use crate::gmail::{self, GmailClient};
use crate::judge;
use crate::report::PipelineReporter;
use crate::store;

/// Runs the whole harvest-then-filter pipeline for one job description.
///
/// Partial results are normal output: provider faults mid-harvest leave a
/// shorter batch, judge faults on single resumes count as rejections, and
/// the summary always prints whatever was processed.
pub async fn run_fetch(
    config: &Config,
    jd_title: &str,
    query: Option<String>,
    reporter: &dyn PipelineReporter,
) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    let jd = store::get_job_description(&pool, jd_title)
        .await?
        .with_context(|| {
            format!(
                "job description '{}' not found; add it with `hire jd add`",
                jd_title
            )
        })?;

    // Never goes interactive here; a missing credential says to run login.
    let credential = auth::ensure_credential(&config.gmail, false).await?;
    let client = GmailClient::new(&credential, config.gmail.timeout_secs)?;
    let judge = judge::create_judge(&config.judge)?;

    let query = query.unwrap_or_else(|| config.gmail.query.clone());
    let attachments = gmail::harvest(&client, &query, reporter).await;

    let outcome = filter::filter_resumes(
        judge.as_ref(),
        &jd.description,
        &attachments,
        config.filter.max_prompt_chars,
        reporter,
    )
    .await;

    for resume in &outcome.accepted {
        store::save_resume(&pool, &resume.attachment.filename, &resume.text).await?;
    }

    println!("fetch {}", query);
    println!("  job description: {}", jd.title);
    println!("  attachments found: {}", attachments.len());
    println!("  shortlisted: {}", outcome.accepted_count);
    println!("  rejected: {}", outcome.rejected_count);
    println!("  skipped (no text): {}", outcome.skipped_count);
    println!("ok");

    pool.close().await;
    Ok(())
}
