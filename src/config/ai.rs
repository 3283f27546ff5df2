// src/config/ai.rs
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_language() -> String {
    "Persian".to_string()
}
fn default_summary_words() -> u32 {
    300
}
fn default_summary_style() -> String {
    "fluid, engaging and reflective, written like a thoughtful essayist; short paragraphs"
        .to_string()
}
fn default_stage_delay_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_summary_params() -> StageParams {
    StageParams {
        max_tokens: 2048,
        temperature: 0.7,
    }
}
fn default_title_params() -> StageParams {
    StageParams {
        max_tokens: 200,
        temperature: 0.3,
    }
}
fn default_hashtag_params() -> StageParams {
    StageParams {
        max_tokens: 100,
        temperature: 0.5,
    }
}

/// Generation parameters for one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-generation provider settings and prompt knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI-compatible API root, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from AI_API_KEY / OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
    /// Target language for the summary, title and hashtags.
    #[serde(default = "default_language")]
    pub language: String,
    /// Approximate summary length in words.
    #[serde(default = "default_summary_words")]
    pub summary_words: u32,
    #[serde(default = "default_summary_style")]
    pub summary_style: String,
    /// Pause between pipeline stages (provider rate limit).
    #[serde(default = "default_stage_delay_secs")]
    pub stage_delay_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_summary_params")]
    pub summary: StageParams,
    #[serde(default = "default_title_params")]
    pub title: StageParams,
    #[serde(default = "default_hashtag_params")]
    pub hashtags: StageParams,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: "ENV".to_string(),
            language: default_language(),
            summary_words: default_summary_words(),
            summary_style: default_summary_style(),
            stage_delay_secs: default_stage_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            summary: default_summary_params(),
            title: default_title_params(),
            hashtags: default_hashtag_params(),
        }
    }
}

impl AiConfig {
    /// Clamp out-of-range values back to defaults instead of failing the load.
    pub fn sanitize(&mut self) {
        let stages = [
            (&mut self.summary, default_summary_params()),
            (&mut self.title, default_title_params()),
            (&mut self.hashtags, default_hashtag_params()),
        ];
        for (params, fallback) in stages {
            if !(0.0..=2.0).contains(&params.temperature) {
                tracing::warn!(
                    temperature = params.temperature,
                    "temperature out of range, using default"
                );
                params.temperature = fallback.temperature;
            }
            if params.max_tokens == 0 {
                params.max_tokens = fallback.max_tokens;
            }
        }
        if self.summary_words == 0 {
            self.summary_words = default_summary_words();
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_restores_bad_values() {
        let mut cfg = AiConfig {
            base_url: "https://api.avalai.ir/v1/".into(),
            summary_words: 0,
            ..AiConfig::default()
        };
        cfg.title.temperature = 9.0;
        cfg.hashtags.max_tokens = 0;
        cfg.sanitize();
        assert_eq!(cfg.base_url, "https://api.avalai.ir/v1");
        assert_eq!(cfg.summary_words, 300);
        assert_eq!(cfg.title.temperature, 0.3);
        assert_eq!(cfg.hashtags.max_tokens, 100);
    }
}
