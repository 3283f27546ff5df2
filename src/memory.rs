//! Durable record of links that were already posted.
//!
//! Flat text file. In `set` mode every line is one published link and new
//! links are appended. In `last` mode the file holds a single line that is
//! overwritten on each successful post, so only the immediately preceding
//! link is guarded against.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_MEMORY_PATH: &str = "state/published_links.txt";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// Every published link, one per line.
    #[default]
    Set,
    /// Only the last published link.
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub path: PathBuf,
    pub mode: MemoryMode,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MEMORY_PATH),
            mode: MemoryMode::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
    mode: MemoryMode,
    links: HashSet<String>,
    // Set mode: existing file lacks a trailing newline, so the next append
    // must start a fresh line.
    needs_newline: bool,
}

impl MemoryStore {
    /// Load history. A missing or unreadable file is an empty history.
    pub async fn open(cfg: &MemoryConfig) -> Self {
        let (links, needs_newline) = match fs::read_to_string(&cfg.path).await {
            Ok(content) => (
                parse_links(&content, cfg.mode),
                !content.is_empty() && !content.ends_with('\n'),
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %cfg.path.display(), "no memory file yet, starting empty");
                (HashSet::new(), false)
            }
            Err(e) => {
                tracing::warn!(path = %cfg.path.display(), error = %e, "memory file unreadable, treating as empty");
                (HashSet::new(), false)
            }
        };
        Self {
            path: cfg.path.clone(),
            mode: cfg.mode,
            links,
            needs_newline,
        }
    }

    /// In-memory store with a preset history; `record` still writes to
    /// [`DEFAULT_MEMORY_PATH`], so use it for read-only checks.
    pub fn from_links<I, S>(mode: MemoryMode, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let links: HashSet<String> = match mode {
            MemoryMode::Set => links.into_iter().map(Into::into).collect(),
            MemoryMode::Last => links.into_iter().map(Into::into).take(1).collect(),
        };
        Self {
            path: PathBuf::from(DEFAULT_MEMORY_PATH),
            mode,
            links,
            needs_newline: false,
        }
    }

    pub fn has_published(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn mode(&self) -> MemoryMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `link`. Call only after the post was confirmed delivered.
    pub async fn record(&mut self, link: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating memory dir {}", dir.display()))?;
        }

        match self.mode {
            MemoryMode::Set => {
                if self.links.contains(link) {
                    return Ok(());
                }
                let mut f = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await
                    .with_context(|| format!("opening memory file {}", self.path.display()))?;
                let line = if self.needs_newline {
                    format!("\n{link}\n")
                } else {
                    format!("{link}\n")
                };
                f.write_all(line.as_bytes())
                    .await
                    .with_context(|| format!("appending to {}", self.path.display()))?;
                f.flush().await?;
                self.needs_newline = false;
            }
            MemoryMode::Last => {
                let tmp = self.path.with_extension("tmp");
                fs::write(&tmp, format!("{link}\n"))
                    .await
                    .with_context(|| format!("writing {}", tmp.display()))?;
                fs::rename(&tmp, &self.path)
                    .await
                    .with_context(|| format!("replacing {}", self.path.display()))?;
                self.links.clear();
            }
        }

        self.links.insert(link.to_string());
        Ok(())
    }
}

fn parse_links(content: &str, mode: MemoryMode) -> HashSet<String> {
    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    match mode {
        MemoryMode::Set => lines.map(str::to_string).collect(),
        MemoryMode::Last => lines.next().map(str::to_string).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_skips_blank_lines() {
        let links = parse_links("a\n\n  b  \n", MemoryMode::Set);
        assert_eq!(links.len(), 2);
        assert!(links.contains("b"));
    }

    #[test]
    fn parse_last_keeps_first_line_only() {
        let links = parse_links("\nlast-link\nstray\n", MemoryMode::Last);
        assert_eq!(links.len(), 1);
        assert!(links.contains("last-link"));
    }
}
