//! Bootstrap data for an empty store.
//!
//! A seed document looks like:
//!
//! ```json
//! { "comments": [ { "author": "Kate", "text": "Hi", "date": "2024-01-01T10:00:00Z", "likes": 2 } ] }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::comment::{parent_ref, NewComment};
use crate::usecase::contracts::CommentRepository;

#[derive(Debug, Deserialize)]
pub struct SeedDocument {
    pub comments: Vec<SeedRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SeedRecord {
    pub author: String,
    pub text: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub likes: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "parent_ref")]
    pub parent: Option<i64>,
}

impl SeedRecord {
    fn into_new_comment(self) -> NewComment {
        let mut comment = NewComment::new(self.author, self.text, self.parent, self.image);
        comment.likes = self.likes.unwrap_or(0).max(0);
        comment.created_at = self.date;
        comment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted(usize),
    SkippedNonEmpty(i64),
}

pub fn parse_document(raw: &str) -> Result<SeedDocument> {
    serde_json::from_str(raw).context("invalid seed document")
}

pub fn load_document(path: &Path) -> Result<SeedDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_document(&raw)
}

/// Inserts every record of `document`. Unless `force` is set, a store that
/// already holds comments is left untouched.
#[tracing::instrument(skip(repository, document), fields(records = document.comments.len()))]
pub async fn seed_store<C: CommentRepository>(
    repository: &C,
    document: SeedDocument,
    force: bool,
) -> Result<SeedOutcome> {
    repository
        .check_connection()
        .await
        .context("cannot seed: store unavailable")?;

    let existing = repository.count().await?;
    if existing > 0 && !force {
        tracing::info!(existing, "store already populated, skipping seed");
        return Ok(SeedOutcome::SkippedNonEmpty(existing));
    }

    let mut inserted = 0;
    for record in document.comments {
        let comment = record.into_new_comment();
        repository
            .create(&comment)
            .await
            .with_context(|| format!("failed to insert seed comment by {}", comment.author))?;
        inserted += 1;
    }

    tracing::info!(inserted, "database seeded successfully");
    Ok(SeedOutcome::Inserted(inserted))
}

pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }

    Err(format!("unrecognized date {value:?}"))
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}
