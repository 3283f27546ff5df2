// src/enrich/mod.rs
//! # Enrichment pipeline
//! Summarize → translate title → extract hashtags, strictly in sequence.
//!
//! `START → SUMMARIZED → TITLE_RESOLVED → TAGGED → DONE`, with `ABORTED`
//! reachable only from `START`. Only the summary is mandatory; the title
//! falls back to the original and the hashtags to a tag derived from the
//! source label. The throttle runs between consecutive stages.

pub mod client;
pub mod hashtags;
pub mod prompts;
pub mod throttle;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ai::AiConfig;
use crate::ingest::types::Candidate;
use client::{DynGenerator, GenerationError};
use throttle::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Summarized,
    TitleResolved,
    Tagged,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summarize,
    TranslateTitle,
    ExtractHashtags,
}

/// A candidate after enrichment. `summary` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedPost {
    pub display_title: String,
    pub summary: String,
    pub hashtags: Vec<String>,
    pub link: String,
    pub source: String,
}

#[derive(Debug)]
pub enum EnrichOutcome {
    Enriched {
        post: EnrichedPost,
        /// Optional stages that failed and used their fallback value.
        fallbacks: Vec<Stage>,
    },
    Aborted {
        error: GenerationError,
    },
}

impl EnrichOutcome {
    pub fn state(&self) -> PipelineState {
        match self {
            EnrichOutcome::Enriched { .. } => PipelineState::Done,
            EnrichOutcome::Aborted { .. } => PipelineState::Aborted,
        }
    }

    pub fn post(&self) -> Option<&EnrichedPost> {
        match self {
            EnrichOutcome::Enriched { post, .. } => Some(post),
            EnrichOutcome::Aborted { .. } => None,
        }
    }

    pub fn into_post(self) -> Option<EnrichedPost> {
        match self {
            EnrichOutcome::Enriched { post, .. } => Some(post),
            EnrichOutcome::Aborted { .. } => None,
        }
    }
}

pub struct EnrichmentPipeline {
    generator: DynGenerator,
    throttle: Arc<dyn Throttle>,
    settings: AiConfig,
}

impl EnrichmentPipeline {
    pub fn new(generator: DynGenerator, throttle: Arc<dyn Throttle>, settings: AiConfig) -> Self {
        Self {
            generator,
            throttle,
            settings,
        }
    }

    fn advance(&self, state: &mut PipelineState, next: PipelineState, link: &str) {
        let from = *state;
        debug!(?from, to = ?next, link, "pipeline transition");
        *state = next;
    }

    pub async fn enrich(&self, candidate: &Candidate) -> EnrichOutcome {
        let link = candidate.link.as_str();
        let mut state = PipelineState::Start;
        let mut fallbacks = Vec::new();

        // Stage 1: summary (mandatory)
        let summary = match self
            .generator
            .generate(&prompts::summarize(&self.settings, candidate))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => return self.abort(&mut state, link, GenerationError::Empty),
            Err(e) => return self.abort(&mut state, link, e),
        };
        self.advance(&mut state, PipelineState::Summarized, link);

        self.throttle.pause().await;

        // Stage 2: title (falls back to the original)
        let display_title = match self
            .generator
            .generate(&prompts::translate_title(&self.settings, candidate))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            outcome => {
                let error = outcome.err().unwrap_or(GenerationError::Empty);
                warn!(
                    link,
                    stage = ?Stage::TranslateTitle,
                    error = %error,
                    "title translation failed, keeping original"
                );
                fallbacks.push(Stage::TranslateTitle);
                candidate.title.clone()
            }
        };
        self.advance(&mut state, PipelineState::TitleResolved, link);

        self.throttle.pause().await;

        // Stage 3: hashtags (falls back to a tag from the source label)
        let parsed = self
            .generator
            .generate(&prompts::extract_hashtags(&self.settings, &summary))
            .await
            .map(|text| hashtags::parse_hashtags(&text));
        let tags = match parsed {
            Ok(tags) if !tags.is_empty() => tags,
            outcome => {
                let error = outcome.err().unwrap_or(GenerationError::Empty);
                warn!(
                    link,
                    stage = ?Stage::ExtractHashtags,
                    error = %error,
                    "hashtag extraction failed, using source tag"
                );
                fallbacks.push(Stage::ExtractHashtags);
                let source = Some(candidate.source.as_str()).filter(|s| !s.trim().is_empty());
                vec![hashtags::fallback_tag(source)]
            }
        };
        self.advance(&mut state, PipelineState::Tagged, link);
        self.advance(&mut state, PipelineState::Done, link);

        info!(
            link,
            fallbacks = fallbacks.len(),
            provider = self.generator.provider_name(),
            "enrichment finished"
        );
        EnrichOutcome::Enriched {
            post: EnrichedPost {
                display_title,
                summary,
                hashtags: tags,
                link: candidate.link.clone(),
                source: candidate.source.clone(),
            },
            fallbacks,
        }
    }

    fn abort(
        &self,
        state: &mut PipelineState,
        link: &str,
        error: GenerationError,
    ) -> EnrichOutcome {
        tracing::error!(link, stage = ?Stage::Summarize, error = %error, "summary failed, aborting");
        self.advance(state, PipelineState::Aborted, link);
        EnrichOutcome::Aborted { error }
    }
}
