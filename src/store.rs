//! Document store: job descriptions and accepted resume texts in SQLite.

use anyhow::Result;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{JobDescription, StoredResume};

/// Upserts a job description by title. Re-adding a title replaces its
/// description.
pub async fn save_job_description(
    pool: &SqlitePool,
    title: &str,
    description: &str,
) -> Result<String> {
    let existing_id: Option<String> =
        sqlx::query_scalar("SELECT id FROM job_descriptions WHERE title = ?")
            .bind(title)
            .fetch_optional(pool)
            .await?;

    let id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO job_descriptions (id, title, description, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(title) DO UPDATE SET description = excluded.description
        "#,
    )
    .bind(&id)
    .bind(title)
    .bind(description)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn list_job_descriptions(pool: &SqlitePool) -> Result<Vec<JobDescription>> {
    let rows = sqlx::query(
        "SELECT id, title, description, created_at FROM job_descriptions ORDER BY created_at, title",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| JobDescription {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        })
        .collect())
}

pub async fn get_job_description(
    pool: &SqlitePool,
    title: &str,
) -> Result<Option<JobDescription>> {
    let row = sqlx::query(
        "SELECT id, title, description, created_at FROM job_descriptions WHERE title = ?",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| JobDescription {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }))
}

/// Persists an accepted resume's extracted text. Upserts on a content
/// hash so repeated fetches of the same attachment do not duplicate rows.
pub async fn save_resume(pool: &SqlitePool, filename: &str, content: &str) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(content.as_bytes());
    let dedup_hash = format!("{:x}", hasher.finalize());

    let existing_id: Option<String> =
        sqlx::query_scalar("SELECT id FROM resumes WHERE dedup_hash = ?")
            .bind(&dedup_hash)
            .fetch_optional(pool)
            .await?;

    let id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO resumes (id, filename, content, dedup_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(dedup_hash) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(filename)
    .bind(content)
    .bind(&dedup_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn list_resumes(pool: &SqlitePool) -> Result<Vec<StoredResume>> {
    let rows = sqlx::query(
        "SELECT id, filename, content, created_at FROM resumes ORDER BY created_at, filename",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StoredResume {
            id: row.get("id"),
            filename: row.get("filename"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Most recently stored resume with this filename.
pub async fn get_resume(pool: &SqlitePool, filename: &str) -> Result<Option<StoredResume>> {
    let row = sqlx::query(
        "SELECT id, filename, content, created_at FROM resumes WHERE filename = ? \
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(filename)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| StoredResume {
        id: row.get("id"),
        filename: row.get("filename"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }))
}
