//! Core data models used throughout SmartHire.
//!
//! These types represent the attachments, job descriptions, and filter
//! results that flow through the harvest-and-filter pipeline.

/// A named binary attachment pulled from a mail message, candidate for
/// resume processing. Identity within one harvest batch is the filename
/// (case-sensitive, exact match).
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A stored job description row.
#[derive(Debug, Clone)]
pub struct JobDescription {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: i64,
}

/// A persisted resume row: the extracted text of an accepted attachment.
#[derive(Debug, Clone)]
pub struct StoredResume {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub created_at: i64,
}

/// An attachment that passed the relevance filter, carrying its extracted
/// text so the caller can persist it.
#[derive(Debug, Clone)]
pub struct FilteredResume {
    pub attachment: Attachment,
    pub text: String,
}

/// Result of running the relevance filter over one harvested batch.
///
/// `skipped_count` covers attachments with no extractable text; those are
/// excluded from both the accepted and rejected counts.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<FilteredResume>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub skipped_count: usize,
}
