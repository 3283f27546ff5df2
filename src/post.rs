//! Post assembly: one Telegram-HTML message per enriched article.
//!
//! Layout, in order:
//! ```text
//! <b>title</b>
//!
//! summary
//!
//! #tag1 #tag2 ...
//!
//! <i>Source: label</i>
//! <a href="link">Read more</a>
//! signature            (only when configured)
//! ```
//! With no hashtags the hashtag line is emitted empty and the blank line
//! after it is left out.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::config::PostConfig;
use crate::enrich::EnrichedPost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTemplate {
    pub source_caption: String,
    pub read_more_caption: String,
    pub signature: Option<String>,
}

impl Default for PostTemplate {
    fn default() -> Self {
        Self::from(&PostConfig::default())
    }
}

impl From<&PostConfig> for PostTemplate {
    fn from(cfg: &PostConfig) -> Self {
        Self {
            source_caption: cfg.source_caption.clone(),
            read_more_caption: cfg.read_more_caption.clone(),
            signature: cfg.signature.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

pub fn assemble(post: &EnrichedPost, template: &PostTemplate) -> String {
    let tags = post
        .hashtags
        .iter()
        .map(|t| encode_text(t).into_owned())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::new();
    out.push_str(&format!("<b>{}</b>\n\n", encode_text(&post.display_title)));
    out.push_str(&format!("{}\n\n", encode_text(&post.summary)));
    out.push_str(&tags);
    out.push('\n');
    if !tags.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!(
        "<i>{}: {}</i>\n",
        encode_text(&template.source_caption),
        encode_text(&post.source)
    ));
    out.push_str(&format!(
        "<a href=\"{}\">{}</a>",
        encode_double_quoted_attribute(&post.link),
        encode_text(&template.read_more_caption)
    ));
    if let Some(sig) = &template.signature {
        out.push('\n');
        out.push_str(&encode_text(sig));
    }
    out
}
