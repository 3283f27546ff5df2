// src/enrich/hashtags.rs
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_HASHTAGS: usize = 5;
pub const DEFAULT_TAG: &str = "#article";

static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+[.)\-]|[-*•])\s*").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Render one keyword as `#tag`: whitespace runs become `_`, surrounding
/// punctuation and a leading `#` are dropped. `None` if nothing is left.
pub fn format_tag(raw: &str) -> Option<String> {
    let t = RE_LIST_MARKER.replace(raw.trim(), "");
    let t = t.trim_matches(|c: char| {
        c == '#' || c.is_whitespace() || (c.is_ascii_punctuation() && c != '_')
    });
    let t = RE_WS.replace_all(t, "_");
    if t.is_empty() {
        None
    } else {
        Some(format!("#{t}"))
    }
}

/// Split provider output into at most five tags. Accepts comma (Latin or
/// Arabic), semicolon, newline, or `#`-separated lists.
pub fn parse_hashtags(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for piece in raw.split([',', '،', ';', '\n', '#']) {
        if let Some(tag) = format_tag(piece) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        if out.len() == MAX_HASHTAGS {
            break;
        }
    }
    out
}

/// Deterministic tag derived from the source label: "Aeon" → `#aeon`,
/// "The School of Life" → `#the_school_of_life`.
pub fn fallback_tag(source: Option<&str>) -> String {
    let Some(source) = source else {
        return DEFAULT_TAG.to_string();
    };
    let lowered = RE_WS.replace_all(source.trim(), "_").to_lowercase();
    let cleaned: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        DEFAULT_TAG.to_string()
    } else {
        format!("#{cleaned}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_list_becomes_five_tags() {
        let tags = parse_hashtags("play, work, Apollo, Dionysus, creativity, extra");
        assert_eq!(
            tags,
            vec!["#play", "#work", "#Apollo", "#Dionysus", "#creativity"]
        );
    }

    #[test]
    fn multiword_and_hash_prefixed_items() {
        let tags = parse_hashtags("#serious play #ancient  greeks\n#work-life");
        assert_eq!(tags, vec!["#serious_play", "#ancient_greeks", "#work-life"]);
    }

    #[test]
    fn numbered_lines_and_persian_commas() {
        let tags = parse_hashtags("1. بازی\n2) کار\n- خلاقیت، فلسفه");
        assert_eq!(tags, vec!["#بازی", "#کار", "#خلاقیت", "#فلسفه"]);
    }

    #[test]
    fn blank_output_yields_no_tags() {
        assert!(parse_hashtags(" , ,\n# ").is_empty());
    }

    #[test]
    fn fallback_from_source_label() {
        assert_eq!(fallback_tag(Some("Aeon")), "#aeon");
        assert_eq!(fallback_tag(Some("The School of Life")), "#the_school_of_life");
        assert_eq!(fallback_tag(Some("  !!  ")), DEFAULT_TAG);
        assert_eq!(fallback_tag(None), DEFAULT_TAG);
    }
}
