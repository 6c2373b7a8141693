//! `hire review`: run one judge-backed action against a stored resume.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use crate::actions;
use crate::config::Config;
use crate::db;
use crate::judge;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReviewAction {
    /// One-word shortlist/reject decision with a one-sentence reason.
    Shortlist,
    /// Strengths, weaknesses, and overall fit.
    Evaluate,
    /// Match percentage, missing keywords, and summary.
    Match,
    /// Five interview questions from the resume.
    Questions,
    /// Job-board search links from a judge-extracted title and keywords.
    Links,
}

impl ReviewAction {
    fn needs_job_description(self) -> bool {
        !matches!(self, ReviewAction::Questions)
    }
}

pub async fn run_review(
    config: &Config,
    filename: &str,
    jd_title: Option<&str>,
    action: ReviewAction,
) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;

    let resume = store::get_resume(&pool, filename)
        .await?
        .with_context(|| format!("resume '{}' not found; run `hire fetch` first", filename))?;

    let jd = match jd_title {
        Some(title) => Some(
            store::get_job_description(&pool, title)
                .await?
                .with_context(|| format!("job description '{}' not found", title))?,
        ),
        None => None,
    };
    pool.close().await;

    if action.needs_job_description() && jd.is_none() {
        bail!("this action needs a job description; pass --jd <title>");
    }
    let jd_text = jd.as_ref().map(|jd| jd.description.as_str()).unwrap_or("");

    let judge = judge::create_judge(&config.judge)?;
    let max_chars = config.filter.max_prompt_chars;

    match action {
        ReviewAction::Shortlist => {
            let result =
                actions::shortlist_decision(judge.as_ref(), jd_text, &resume.content, max_chars)
                    .await?;
            println!("{}", result);
        }
        ReviewAction::Evaluate => {
            let result = actions::evaluate_resume(judge.as_ref(), jd_text, &resume.content).await?;
            println!("{}", result);
        }
        ReviewAction::Match => {
            let result =
                actions::match_percentage(judge.as_ref(), jd_text, &resume.content).await?;
            println!("{}", result);
        }
        ReviewAction::Questions => {
            let result =
                actions::interview_questions(judge.as_ref(), &resume.content, max_chars).await?;
            println!("{}", result);
        }
        ReviewAction::Links => {
            let links = actions::job_search_links(judge.as_ref(), jd_text, &resume.content).await?;
            println!("Search query: {}", links.query);
            println!();
            for (site, url) in &links.links {
                println!("{:<16} {}", site, url);
            }
        }
    }

    Ok(())
}
