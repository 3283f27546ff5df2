// src/enrich/prompts.rs
//! Fixed instructions for each pipeline stage.

use crate::config::ai::AiConfig;
use crate::enrich::client::GenerationRequest;
use crate::ingest::types::Candidate;

pub fn summarize(cfg: &AiConfig, candidate: &Candidate) -> GenerationRequest {
    let system = format!(
        "You are a writer and deep thinker at home in philosophy and psychology. \
         You receive an English article and write a conceptual summary of it in {lang}, \
         about {words} words long, that carries the article's main ideas. \
         Style: {style}. Output only the summary: no title, no preamble, no closing remarks.",
        lang = cfg.language,
        words = cfg.summary_words,
        style = cfg.summary_style,
    );
    let user = format!(
        "Please summarize this article in {lang}:\n\nTitle: {title}\n\nContent:\n{body}",
        lang = cfg.language,
        title = candidate.title,
        body = candidate.body,
    );
    GenerationRequest::new(system, user, cfg.summary)
}

pub fn translate_title(cfg: &AiConfig, candidate: &Candidate) -> GenerationRequest {
    let system = format!(
        "Translate the article title you receive into {lang}. \
         Output only the translated title on one line, without quotes.",
        lang = cfg.language,
    );
    GenerationRequest::new(system, candidate.title.clone(), cfg.title)
}

pub fn extract_hashtags(cfg: &AiConfig, summary: &str) -> GenerationRequest {
    let system = format!(
        "Read the text you receive and return exactly five single-word keywords in {lang} \
         that capture its main themes. Return them on one line, separated by commas, \
         without the # sign and without any other text.",
        lang = cfg.language,
    );
    GenerationRequest::new(system, summary.to_string(), cfg.hashtags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::client::Role;

    #[test]
    fn summarize_embeds_title_body_and_length() {
        let cfg = AiConfig::default();
        let c = Candidate {
            title: "Why Play Matters".into(),
            link: "u".into(),
            body: "Play is immediate and fearless.".into(),
            source: "The School of Life".into(),
            published: None,
        };
        let req = summarize(&cfg, &c);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert!(req.messages[0].content.contains("300 words"));
        assert!(req.user_content().contains("Title: Why Play Matters"));
        assert!(req.user_content().contains("Play is immediate"));
        assert_eq!(req.params.max_tokens, 2048);
    }
}
