//! # SmartHire
//!
//! An LLM-assisted recruiting pipeline. SmartHire pulls resume attachments
//! from a Gmail mailbox, filters them against a stored job description
//! through an external judge (LLM) call, persists the shortlist in SQLite,
//! and offers further judge-backed review actions over stored resumes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │  Gmail   │──▶│ Harvester │──▶│ Extract  │──▶│  Filter  │
//! │ (OAuth2) │   │ dedup/MIME│   │ pdf/docx │   │  (judge) │
//! └──────────┘   └───────────┘   └──────────┘   └────┬─────┘
//!                                                    │ accepted
//!                                                    ▼
//!                                               ┌──────────┐
//!                                               │  SQLite  │
//!                                               └──────────┘
//! ```
//!
//! Every interesting decision is delegated to the judge behind a single
//! textual interface; the pipeline itself is sequential and keeps going
//! past individual item failures (partial results, never a hard abort).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`auth`] | OAuth2 credential lifecycle (cache, refresh, consent) |
//! | [`gmail`] | Mail provider seam + attachment harvester |
//! | [`extract`] | PDF/Word/plain-text extraction |
//! | [`judge`] | Judge capability abstraction (Gemini) |
//! | [`filter`] | Relevance filter over harvested attachments |
//! | [`actions`] | Judge-backed review actions |
//! | [`store`] | Job description / resume persistence |
//! | [`report`] | Pipeline diagnostics channel |

pub mod actions;
pub mod auth;
pub mod config;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod gmail;
pub mod jd;
pub mod judge;
pub mod migrate;
pub mod models;
pub mod report;
pub mod resumes;
pub mod review;
pub mod store;
