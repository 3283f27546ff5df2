// src/ingest/providers/mod.rs
pub mod feed;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::types::SourceProvider;
use feed::FeedSource;

/// One configured origin: a live feed URL or a local archive file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub archive: Option<PathBuf>,
}

impl SourceConfig {
    pub fn feed(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: Some(url.to_string()),
            archive: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            bail!("source without a label");
        }
        match (&self.url, &self.archive) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => bail!("source {:?} sets both url and archive", self.label),
            (None, None) => bail!("source {:?} needs a url or an archive path", self.label),
        }
    }
}

/// Build providers in configuration order.
pub fn build_sources(
    configs: &[SourceConfig],
    client: &reqwest::Client,
) -> Result<Vec<Box<dyn SourceProvider>>> {
    let mut out: Vec<Box<dyn SourceProvider>> = Vec::with_capacity(configs.len());
    for cfg in configs {
        cfg.validate()?;
        let provider = match (&cfg.url, &cfg.archive) {
            (Some(url), _) => FeedSource::from_url(&cfg.label, url, client.clone()),
            (None, Some(path)) => FeedSource::from_archive(&cfg.label, path.clone()),
            (None, None) => bail!("source {:?} has no location", cfg.label),
        };
        out.push(Box::new(provider));
    }
    Ok(out)
}
