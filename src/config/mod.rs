// src/config/mod.rs
//! Application configuration: built-in defaults, an optional TOML file, and
//! environment overrides for secrets. Built once at start and passed by
//! reference; component code never reads the environment itself.

pub mod ai;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ingest::providers::SourceConfig;
use crate::ingest::{AggregateOptions, AggregationPolicy};
use crate::memory::MemoryConfig;
use crate::select::SelectConfig;
use ai::AiConfig;

pub const ENV_CONFIG_PATH: &str = "HERALD_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/herald.toml";

pub const ENV_AI_API_KEY: &str = "AI_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_FEED_LABEL: &str = "The School of Life";
const DEFAULT_FEED_URL: &str = "https://rss.app/feed/tVpLudGvjlggDz0Z";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub policy: AggregationPolicy,
    /// Skip entries older than this many days (and undated ones).
    pub max_age_days: Option<u32>,
    /// Regexes matched against entry links; a match drops the entry.
    pub junk_link_patterns: Vec<String>,
}

impl AggregateConfig {
    pub fn to_options(&self) -> Result<AggregateOptions> {
        let junk_links = self
            .junk_link_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid junk link pattern {p:?}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(AggregateOptions {
            policy: self.policy,
            max_age: self.max_age_days.map(|d| Duration::days(i64::from(d))),
            junk_links,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// "ENV" means: read from TELEGRAM_BOT_TOKEN.
    pub bot_token: String,
    /// "ENV" means: read from TELEGRAM_CHAT_ID.
    pub chat_id: String,
    pub api_base: String,
    pub disable_link_preview: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: "ENV".to_string(),
            chat_id: "ENV".to_string(),
            api_base: "https://api.telegram.org".to_string(),
            disable_link_preview: true,
        }
    }
}

/// Captions used by the post template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub source_caption: String,
    pub read_more_caption: String,
    pub signature: Option<String>,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            source_caption: "Source".to_string(),
            read_more_caption: "Read more".to_string(),
            signature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub memory: MemoryConfig,
    pub sources: Vec<SourceConfig>,
    pub aggregate: AggregateConfig,
    pub select: SelectConfig,
    pub ai: AiConfig,
    pub telegram: TelegramConfig,
    pub post: PostConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            sources: vec![SourceConfig::feed(DEFAULT_FEED_LABEL, DEFAULT_FEED_URL)],
            aggregate: AggregateConfig::default(),
            select: SelectConfig::default(),
            ai: AiConfig::default(),
            telegram: TelegramConfig::default(),
            post: PostConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate TOML. Secrets are left as written.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing config toml")?;
        cfg.ai.sanitize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the config file and apply environment overrides:
    /// 1) `explicit` (must exist)
    /// 2) $HERALD_CONFIG_PATH (must exist)
    /// 3) config/herald.toml if present
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut cfg = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(p) => {
                if !p.exists() {
                    return Err(anyhow!("config file {} does not exist", p.display()));
                }
                Self::load_from_file(&p)?
            }
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    tracing::info!("no config file found, using built-in defaults");
                    Self::default()
                }
            }
        };
        cfg.resolve_secrets();
        Ok(cfg)
    }

    /// Environment wins over the file; "ENV" placeholders without a matching
    /// variable become empty (reported later as missing credentials).
    pub fn resolve_secrets(&mut self) {
        self.ai.api_key = resolve_secret(&self.ai.api_key, &[ENV_AI_API_KEY, ENV_OPENAI_API_KEY]);
        self.telegram.bot_token = resolve_secret(&self.telegram.bot_token, &[ENV_TELEGRAM_BOT_TOKEN]);
        self.telegram.chat_id = resolve_secret(&self.telegram.chat_id, &[ENV_TELEGRAM_CHAT_ID]);
    }

    pub fn validate(&self) -> Result<()> {
        for s in &self.sources {
            s.validate()?;
        }
        let archives = self.sources.iter().filter(|s| s.archive.is_some()).count();
        if archives > 1 {
            bail!("at most one archive source is supported, found {archives}");
        }
        self.aggregate.to_options()?;
        Ok(())
    }

    /// Credentials the run cannot proceed without. Dry runs never deliver,
    /// so they only need the text-generation key.
    pub fn missing_credentials(&self, dry_run: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.ai.api_key.trim().is_empty() {
            missing.push(ENV_AI_API_KEY);
        }
        if !dry_run {
            if self.telegram.bot_token.trim().is_empty() {
                missing.push(ENV_TELEGRAM_BOT_TOKEN);
            }
            if self.telegram.chat_id.trim().is_empty() {
                missing.push(ENV_TELEGRAM_CHAT_ID);
            }
        }
        missing
    }
}

fn resolve_secret(value: &str, vars: &[&str]) -> String {
    let from_env = vars
        .iter()
        .filter_map(|v| std::env::var(v).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty());
    match from_env {
        Some(v) => v,
        None if value.trim().eq_ignore_ascii_case("env") => String::new(),
        None => value.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_sections_override_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
[memory]
path = "/tmp/herald/links.txt"
mode = "last"

[[sources]]
label = "Aeon"
url = "https://aeon.co/feed.rss"

[[sources]]
label = "Archive"
archive = "data/archive.xml"

[aggregate]
policy = "newest_per_source"
max_age_days = 2
junk_link_patterns = ["/tag/"]

[select]
policy = "first_available"
seed = 9

[ai]
language = "German"
summary = { max_tokens = 1000, temperature = 0.5 }

[post]
signature = "@herald"
"#,
        )
        .unwrap();
        assert_eq!(cfg.memory.mode, crate::memory::MemoryMode::Last);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.aggregate.policy, AggregationPolicy::NewestPerSource);
        assert_eq!(cfg.select.seed, Some(9));
        assert_eq!(cfg.ai.language, "German");
        assert_eq!(cfg.ai.summary.max_tokens, 1000);
        // untouched stage keeps its default
        assert_eq!(cfg.ai.title.max_tokens, 200);
        assert_eq!(cfg.post.signature.as_deref(), Some("@herald"));
        assert_eq!(cfg.post.read_more_caption, "Read more");
    }

    #[test]
    fn two_archives_are_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
[[sources]]
label = "A"
archive = "a.xml"

[[sources]]
label = "B"
archive = "b.xml"
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("at most one archive"));
    }

    #[test]
    fn bad_junk_pattern_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
[aggregate]
junk_link_patterns = ["("]
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("invalid junk link pattern"));
    }

    #[test]
    fn dry_run_does_not_need_delivery_credentials() {
        let mut cfg = AppConfig::default();
        cfg.ai.api_key = "k".into();
        cfg.telegram.bot_token = String::new();
        cfg.telegram.chat_id = String::new();
        assert!(cfg.missing_credentials(true).is_empty());
        assert_eq!(
            cfg.missing_credentials(false),
            vec![ENV_TELEGRAM_BOT_TOKEN, ENV_TELEGRAM_CHAT_ID]
        );
    }
}
