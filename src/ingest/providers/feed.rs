// src/ingest/providers/feed.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::parse::parse_feed;
use crate::ingest::types::{FeedEntry, SourceProvider};

/// RSS/Atom source. Same parser for every mode; only where the document
/// comes from differs.
pub struct FeedSource {
    label: String,
    mode: Mode,
}

enum Mode {
    Http { url: String, client: reqwest::Client },
    Archive(PathBuf),
    // Owned copy so tests and offline runs need no 'static input.
    Fixture(String),
}

impl FeedSource {
    pub fn from_url(label: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            label: label.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    pub fn from_archive(label: &str, path: PathBuf) -> Self {
        Self {
            label: label.to_string(),
            mode: Mode::Archive(path),
        }
    }

    pub fn from_fixture(label: &str, xml: &str) -> Self {
        Self {
            label: label.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    async fn load_document(&self) -> Result<String> {
        match &self.mode {
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url} non-2xx"))?;
                resp.text().await.context("feed http .text()")
            }
            Mode::Archive(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading archive {}", path.display())),
            Mode::Fixture(s) => Ok(s.clone()),
        }
    }
}

#[async_trait]
impl SourceProvider for FeedSource {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        let doc = self.load_document().await?;
        parse_feed(&doc).with_context(|| format!("parsing feed for {}", self.label))
    }

    fn label(&self) -> &str {
        &self.label
    }
}
