//! `hire jd` subcommands: manage stored job descriptions.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::db;
use crate::store;

pub async fn run_add(
    config: &Config,
    title: &str,
    description: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let description = match (description, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read description file: {}", path.display()))?,
        (Some(_), Some(_)) => bail!("pass either --description or --file, not both"),
        (None, None) => bail!("a description is required (--description or --file)"),
    };

    if title.trim().is_empty() || description.trim().is_empty() {
        bail!("title and description must not be empty");
    }

    let pool = db::connect(&config.db.path).await?;
    store::save_job_description(&pool, title, &description).await?;
    pool.close().await;

    println!("Saved job description '{}'.", title);
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let all = store::list_job_descriptions(&pool).await?;
    pool.close().await;

    if all.is_empty() {
        println!("No job descriptions. Add one with `hire jd add`.");
        return Ok(());
    }

    println!("{:<32} {:>8}", "TITLE", "CHARS");
    for jd in all {
        println!("{:<32} {:>8}", jd.title, jd.description.chars().count());
    }
    Ok(())
}

pub async fn run_show(config: &Config, title: &str) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let jd = store::get_job_description(&pool, title).await?;
    pool.close().await;

    match jd {
        Some(jd) => {
            println!("{}", jd.title);
            println!();
            println!("{}", jd.description);
            Ok(())
        }
        None => bail!("job description '{}' not found", title),
    }
}
