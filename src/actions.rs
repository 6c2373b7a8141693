//! Judge-backed review actions over a stored resume and job description.
//!
//! Prompt wording is carried as opaque constants; none of it is a
//! stability contract (the shortlist verdict contract lives in
//! [`crate::filter`]).

use anyhow::Result;

use crate::filter::{shortlist_prompt, truncate_chars};
use crate::judge::Judge;

const EVAL_PROMPT: &str =
    "Evaluate the resume vs job description. Mention strengths, weaknesses, and overall fit.";
const MATCH_PROMPT: &str = "Give match percentage (0-100%), missing keywords, and summary.";

/// How much resume text the job-search-link prompt sees.
const LINK_RESUME_CHARS: usize = 2000;

/// One-word decision plus a one-sentence reason, using the same prompt as
/// the relevance filter.
pub async fn shortlist_decision(
    judge: &dyn Judge,
    job_description: &str,
    resume: &str,
    max_prompt_chars: usize,
) -> Result<String> {
    judge
        .generate(&[shortlist_prompt(
            job_description,
            truncate_chars(resume, max_prompt_chars),
        )])
        .await
}

pub async fn evaluate_resume(
    judge: &dyn Judge,
    job_description: &str,
    resume: &str,
) -> Result<String> {
    let combined = format!("Job Description:\n{}\n\nResume:\n{}", job_description, resume);
    judge.generate(&[combined, EVAL_PROMPT.to_string()]).await
}

pub async fn match_percentage(
    judge: &dyn Judge,
    job_description: &str,
    resume: &str,
) -> Result<String> {
    let combined = format!("Job Description:\n{}\n\nResume:\n{}", job_description, resume);
    judge.generate(&[combined, MATCH_PROMPT.to_string()]).await
}

pub async fn interview_questions(
    judge: &dyn Judge,
    resume: &str,
    max_prompt_chars: usize,
) -> Result<String> {
    judge
        .generate(&[format!(
            "Generate 5 interview questions based on this resume and job description:\n\n{}",
            truncate_chars(resume, max_prompt_chars)
        )])
        .await
}

/// Job-board search links built from a judge-extracted title + keywords.
#[derive(Debug)]
pub struct JobSearchLinks {
    /// The raw judge answer, flattened to one line, used as the search
    /// query.
    pub query: String,
    /// `(site name, url)` pairs.
    pub links: Vec<(&'static str, String)>,
}

pub async fn job_search_links(
    judge: &dyn Judge,
    job_description: &str,
    resume: &str,
) -> Result<JobSearchLinks> {
    let prompt = format!(
        "From the following job description and resume, extract the best-fit job title \
         and 3-5 relevant keywords or skills to search jobs online.\n\
         \n\
         Job Description:\n{}\n\
         \n\
         Resume:\n{}",
        job_description,
        truncate_chars(resume, LINK_RESUME_CHARS)
    );

    let response = judge.generate(&[prompt]).await?;
    let query = response.replace('\n', " ").trim().to_string();
    let encoded = percent_encode(&query);

    Ok(JobSearchLinks {
        query,
        links: vec![
            (
                "LinkedIn Jobs",
                format!("https://www.linkedin.com/jobs/search/?keywords={}", encoded),
            ),
            ("Indeed", format!("https://www.indeed.com/jobs?q={}", encoded)),
            (
                "Glassdoor",
                format!("https://www.glassdoor.com/Job/jobs.htm?sc.keyword={}", encoded),
            ),
        ],
    })
}

/// Percent-encode per RFC 3986: everything but unreserved characters
/// (`A-Z a-z 0-9 - _ . ~`) is escaped.
fn percent_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}
