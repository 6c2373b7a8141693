//! # SmartHire CLI (`hire`)
//!
//! The `hire` binary drives the recruiting pipeline: authorize against
//! Gmail, manage job descriptions, fetch and filter resume attachments,
//! and run judge-backed review actions over the stored shortlist.
//!
//! ## Usage
//!
//! ```bash
//! hire --config ./config/smarthire.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hire init` | Create the SQLite database and run schema migrations |
//! | `hire login` | Run the interactive Gmail authorization flow |
//! | `hire logout` | Delete the cached Gmail credential |
//! | `hire jd add/list/show` | Manage stored job descriptions |
//! | `hire fetch --jd <title>` | Harvest the mailbox and filter against a job description |
//! | `hire resumes list/show` | Inspect stored resume texts |
//! | `hire review <file> --action <a>` | Run a judge-backed action on a stored resume |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use smarthire::report::{NoReporter, PipelineReporter, StderrReporter};
use smarthire::review::ReviewAction;
use smarthire::{config, fetch, gmail, jd, migrate, resumes, review};

/// SmartHire — harvest resume attachments from Gmail and filter them
/// against a job description with an LLM judge.
#[derive(Parser)]
#[command(
    name = "hire",
    about = "SmartHire — LLM-assisted resume harvesting and shortlisting",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/smarthire.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the job_descriptions/resumes
    /// tables. This command is idempotent; running it multiple times is safe.
    Init,

    /// Authorize against Gmail interactively.
    ///
    /// Prints a consent URL, reads the pasted authorization code, and
    /// caches the obtained credential so later fetches run unattended.
    Login,

    /// Delete the cached Gmail credential.
    Logout,

    /// Manage stored job descriptions.
    Jd {
        #[command(subcommand)]
        action: JdAction,
    },

    /// Harvest resume attachments and filter them against a job description.
    ///
    /// Lists mailbox messages matching the configured query, collects
    /// candidate attachments (PDF/Word, deduplicated by filename),
    /// extracts their text, and asks the judge which are relevant.
    /// Accepted resumes are persisted; a summary with counts is printed.
    Fetch {
        /// Title of the job description to filter against.
        #[arg(long)]
        jd: String,

        /// Override the configured mailbox query for this run.
        #[arg(long)]
        query: Option<String>,

        /// Suppress per-item progress and warnings on stderr.
        #[arg(long)]
        quiet: bool,
    },

    /// Inspect stored resume texts.
    Resumes {
        #[command(subcommand)]
        action: ResumesAction,
    },

    /// Run a judge-backed review action on a stored resume.
    Review {
        /// Filename of the stored resume.
        filename: String,

        /// Title of the job description to review against
        /// (not needed for `questions`).
        #[arg(long)]
        jd: Option<String>,

        #[arg(long, value_enum)]
        action: ReviewAction,
    },
}

#[derive(Subcommand)]
enum JdAction {
    /// Save a job description (upserts by title).
    Add {
        /// Job title, used as the lookup key.
        title: String,

        /// Description text inline.
        #[arg(long)]
        description: Option<String>,

        /// Read the description from a file instead.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List stored job descriptions.
    List,
    /// Print one job description in full.
    Show { title: String },
}

#[derive(Subcommand)]
enum ResumesAction {
    /// List stored resumes.
    List,
    /// Print one stored resume's extracted text.
    Show { filename: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Login => {
            gmail::run_login(&cfg).await?;
        }
        Commands::Logout => {
            gmail::run_logout(&cfg)?;
        }
        Commands::Jd { action } => match action {
            JdAction::Add {
                title,
                description,
                file,
            } => {
                jd::run_add(&cfg, &title, description, file).await?;
            }
            JdAction::List => {
                jd::run_list(&cfg).await?;
            }
            JdAction::Show { title } => {
                jd::run_show(&cfg, &title).await?;
            }
        },
        Commands::Fetch { jd, query, quiet } => {
            let reporter: Box<dyn PipelineReporter> = if quiet {
                Box::new(NoReporter)
            } else {
                Box::new(StderrReporter)
            };
            fetch::run_fetch(&cfg, &jd, query, reporter.as_ref()).await?;
        }
        Commands::Resumes { action } => match action {
            ResumesAction::List => {
                resumes::run_list(&cfg).await?;
            }
            ResumesAction::Show { filename } => {
                resumes::run_show(&cfg, &filename).await?;
            }
        },
        Commands::Review {
            filename,
            jd,
            action,
        } => {
            review::run_review(&cfg, &filename, jd.as_deref(), action).await?;
        }
    }

    Ok(())
}
