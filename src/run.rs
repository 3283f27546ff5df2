// src/run.rs
//! One invocation, start to finish:
//! read history → aggregate → select → enrich → assemble → deliver → record.
//!
//! Every early stop ("nothing to do") leaves the memory file untouched. The
//! link is recorded only after the channel confirmed delivery, and never in
//! a dry run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::deliver::{Deliverer, DryRunDeliverer, TelegramDeliverer};
use crate::enrich::client::OpenAiGenerator;
use crate::enrich::throttle::FixedDelay;
use crate::enrich::{EnrichOutcome, EnrichmentPipeline};
use crate::ingest::providers::build_sources;
use crate::ingest::types::SourceProvider;
use crate::ingest::{aggregate, AggregateOptions};
use crate::memory::{MemoryConfig, MemoryStore};
use crate::post::{assemble, PostTemplate};
use crate::select::{SelectConfig, SelectionPolicy, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Required credentials are absent; nothing was attempted.
    Misconfigured { missing: Vec<&'static str> },
    /// Every entry is already published, filtered, or no source answered.
    NothingNew,
    /// The summary stage failed for the selected candidate.
    EnrichmentAborted { link: String },
    DeliveryFailed { link: String, error: String },
    /// `persisted` is false when the memory write failed after delivery.
    Published { link: String, persisted: bool },
    DryRun { link: String, message: String },
}

impl RunOutcome {
    /// Process exit status. Only a failed delivery is a failure; the other
    /// early stops are normal outcomes of a scheduled run.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::DeliveryFailed { .. } => 1,
            _ => 0,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            RunOutcome::EnrichmentAborted { link }
            | RunOutcome::DeliveryFailed { link, .. }
            | RunOutcome::Published { link, .. }
            | RunOutcome::DryRun { link, .. } => Some(link),
            RunOutcome::Misconfigured { .. } | RunOutcome::NothingNew => None,
        }
    }
}

pub struct Runner {
    memory: MemoryConfig,
    sources: Vec<Box<dyn SourceProvider>>,
    aggregate: AggregateOptions,
    selector: Selector,
    pipeline: EnrichmentPipeline,
    template: PostTemplate,
    deliverer: Arc<dyn Deliverer>,
    destination: String,
    missing: Vec<&'static str>,
    dry_run: bool,
}

impl Runner {
    /// Defaults: full pool, the configured default selection policy with
    /// OS entropy, default captions.
    pub fn new(
        memory: MemoryConfig,
        sources: Vec<Box<dyn SourceProvider>>,
        pipeline: EnrichmentPipeline,
        deliverer: Arc<dyn Deliverer>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            memory,
            sources,
            aggregate: AggregateOptions::default(),
            selector: Selector::from_config(&SelectConfig::default()),
            pipeline,
            template: PostTemplate::default(),
            deliverer,
            destination: destination.into(),
            missing: Vec::new(),
            dry_run: false,
        }
    }

    pub fn with_aggregate_options(mut self, opts: AggregateOptions) -> Self {
        self.aggregate = opts;
        self
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_template(mut self, template: PostTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_missing_credentials(mut self, missing: Vec<&'static str>) -> Self {
        self.missing = missing;
        self
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        self.selector.policy()
    }

    /// Never write the memory file; report the message instead.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(cfg: &AppConfig, dry_run: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("feed-herald/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.ai.request_timeout_secs))
            .build()
            .context("building http client")?;
        let sources = build_sources(&cfg.sources, &http)?;
        let generator = OpenAiGenerator::new(&cfg.ai).context("building text generator")?;
        let pipeline = EnrichmentPipeline::new(
            Arc::new(generator),
            Arc::new(FixedDelay::from_secs(cfg.ai.stage_delay_secs)),
            cfg.ai.clone(),
        );
        let deliverer: Arc<dyn Deliverer> = if dry_run {
            Arc::new(DryRunDeliverer)
        } else {
            Arc::new(TelegramDeliverer::from_config(&cfg.telegram)?)
        };

        Ok(Self::new(
            cfg.memory.clone(),
            sources,
            pipeline,
            deliverer,
            cfg.telegram.chat_id.clone(),
        )
        .with_aggregate_options(cfg.aggregate.to_options()?)
        .with_selector(Selector::from_config(&cfg.select))
        .with_template(PostTemplate::from(&cfg.post))
        .with_missing_credentials(cfg.missing_credentials(dry_run))
        .dry_run(dry_run))
    }

    pub async fn run_once(&mut self) -> RunOutcome {
        if !self.missing.is_empty() {
            warn!(missing = ?self.missing, "missing credentials, nothing attempted");
            return RunOutcome::Misconfigured {
                missing: self.missing.clone(),
            };
        }

        let mut memory = MemoryStore::open(&self.memory).await;
        info!(
            known_links = memory.len(),
            mode = ?memory.mode(),
            sources = self.sources.len(),
            "run started"
        );

        let report = aggregate(&self.sources, &memory, &self.aggregate, Utc::now()).await;
        let Some(candidate) = self.selector.select(report.pool) else {
            info!(
                failed_sources = report.failed_sources.len(),
                "nothing new to post"
            );
            return RunOutcome::NothingNew;
        };
        let link = candidate.link.clone();
        info!(
            link = %link,
            source = %candidate.source,
            policy = ?self.selector.policy(),
            "candidate selected"
        );

        let post = match self.pipeline.enrich(&candidate).await {
            EnrichOutcome::Enriched { post, .. } => post,
            EnrichOutcome::Aborted { .. } => {
                return RunOutcome::EnrichmentAborted { link };
            }
        };
        let message = assemble(&post, &self.template);

        if let Err(e) = self.deliverer.deliver(&message, &self.destination).await {
            error!(
                link = %link,
                channel = self.deliverer.channel_name(),
                error = %e,
                "delivery failed, link not recorded"
            );
            return RunOutcome::DeliveryFailed {
                link,
                error: e.to_string(),
            };
        }

        if self.dry_run {
            return RunOutcome::DryRun { link, message };
        }

        let persisted = match memory.record(&link).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    link = %link,
                    path = %memory.path().display(),
                    error = %format!("{e:#}"),
                    "delivered but could not record link; it may be sent again"
                );
                false
            }
        };
        info!(
            link = %link,
            channel = self.deliverer.channel_name(),
            persisted,
            "post published"
        );
        RunOutcome::Published { link, persisted }
    }
}
