//! `hire resumes` subcommands: inspect stored resume texts.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::store;

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let all = store::list_resumes(&pool).await?;
    pool.close().await;

    if all.is_empty() {
        println!("No resumes stored. Run `hire fetch` first.");
        return Ok(());
    }

    println!("{:<40} {:>8}", "FILENAME", "CHARS");
    for resume in all {
        println!("{:<40} {:>8}", resume.filename, resume.content.chars().count());
    }
    Ok(())
}

pub async fn run_show(config: &Config, filename: &str) -> Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let resume = store::get_resume(&pool, filename).await?;
    pool.close().await;

    match resume {
        Some(resume) => {
            println!("{}", resume.content);
            Ok(())
        }
        None => bail!("resume '{}' not found", filename),
    }
}
