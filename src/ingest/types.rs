// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One raw entry as returned by a feed document, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Body as found in the feed; may contain HTML.
    pub body: String,
    pub published: Option<DateTime<Utc>>,
}

/// A normalized item eligible for selection. `link` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    /// Plain text, markup stripped.
    pub body: String,
    /// Label of the source this candidate came from, e.g. "Aeon".
    pub source: String,
    pub published: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Entries in document order.
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn label(&self) -> &str;
}
