//! Final answer and citation resolution

use crate::llm::LLMClient;
use crate::research::prompts;
use crate::types::{Result, Source};
use tracing::info;

/// The answer handed back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswer {
    pub text: String,
    /// Cited sources, deduplicated, in first-seen order
    pub sources: Vec<Source>,
}

/// Write the answer and resolve its citations
pub async fn finalize_answer(
    llm: &dyn LLMClient,
    topic: &str,
    summaries: &[String],
    sources: &[Source],
) -> Result<FinalAnswer> {
    let prompt = prompts::answer(topic, summaries, &prompts::current_date());
    let draft = llm.generate(&prompt).await?;

    let (text, sources) = resolve_citations(&draft, sources);
    info!(
        "Final answer: {} chars, {} cited sources",
        text.len(),
        sources.len()
    );
    Ok(FinalAnswer { text, sources })
}

/// Rewrite short references to real URLs and keep only cited sources
///
/// A source is kept when its short reference or its URL appears in `text`.
/// Matches must end on a token boundary, so `.../id/1-1` does not match inside
/// `.../id/1-10`. Identical source records collapse to one.
pub fn resolve_citations(text: &str, sources: &[Source]) -> (String, Vec<Source>) {
    let mut text = text.to_string();
    let mut cited: Vec<Source> = Vec::new();

    for source in sources {
        let keep = if !source.short_ref.is_empty() && contains_token(&text, &source.short_ref) {
            if source.short_ref != source.url {
                text = replace_token(&text, &source.short_ref, &source.url);
            }
            true
        } else {
            !source.url.is_empty() && contains_token(&text, &source.url)
        };

        if keep && !cited.contains(source) {
            cited.push(source.clone());
        }
    }

    (text, cited)
}

fn continues_token(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/')
}

/// Byte offsets of every occurrence of `needle` not followed by a token character
fn token_matches<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).filter_map(move |(at, _)| {
        let next = haystack[at + needle.len()..].chars().next();
        match next {
            Some(c) if continues_token(c) => None,
            _ => Some(at),
        }
    })
}

fn contains_token(haystack: &str, needle: &str) -> bool {
    token_matches(haystack, needle).next().is_some()
}

fn replace_token(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for at in token_matches(haystack, needle) {
        out.push_str(&haystack[last..at]);
        out.push_str(replacement);
        last = at + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn source(id: &str, url: &str, short_ref: &str) -> Source {
        Source {
            id: id.to_string(),
            title: "T".to_string(),
            url: url.to_string(),
            short_ref: short_ref.to_string(),
            segments: vec![Segment {
                text: "snippet".to_string(),
                url: url.to_string(),
                title: "T".to_string(),
            }],
        }
    }

    const SHORT_1: &str = "https://vertexaisearch.cloud.google.com/id/0-1";
    const SHORT_10: &str = "https://vertexaisearch.cloud.google.com/id/0-10";

    #[test]
    fn test_short_ref_rewritten_to_url() {
        let sources = vec![source("0_0", "https://real.example/a", SHORT_1)];
        let text = format!("Paris [wiki]({}). Again [wiki]({}).", SHORT_1, SHORT_1);

        let (text, cited) = resolve_citations(&text, &sources);
        assert_eq!(
            text,
            "Paris [wiki](https://real.example/a). Again [wiki](https://real.example/a)."
        );
        assert_eq!(cited, sources);
    }

    #[test]
    fn test_url_present_keeps_source() {
        let sources = vec![source("0_0", "http://x", "http://x")];
        let (text, cited) = resolve_citations("The capital is Paris (http://x).", &sources);
        assert_eq!(text, "The capital is Paris (http://x).");
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn test_uncited_sources_dropped() {
        let sources = vec![
            source("0_0", "http://x", "http://x"),
            source("0_1", "http://y", "http://y"),
        ];
        let (_, cited) = resolve_citations("See http://y for details", &sources);
        assert_eq!(cited, vec![sources[1].clone()]);
    }

    #[test]
    fn test_identical_sources_collapse() {
        let a = source("0_0", "http://x", "http://x");
        let b = source("1_0", "http://x", "http://x");
        let (_, cited) = resolve_citations("http://x", &[a.clone(), a.clone(), b.clone()]);
        assert_eq!(cited, vec![a, b]);
    }

    #[test]
    fn test_short_ref_prefix_does_not_match() {
        let sources = vec![
            source("0_1", "https://one.example", SHORT_1),
            source("0_10", "https://ten.example", SHORT_10),
        ];
        let text = format!("Only ten [t]({})", SHORT_10);

        let (text, cited) = resolve_citations(&text, &sources);
        assert_eq!(text, "Only ten [t](https://ten.example)");
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].id, "0_10");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let sources = vec![
            source("0_0", "https://real.example/a", SHORT_1),
            source("1_0", "http://x", "http://x"),
        ];
        let draft = format!("A [a]({}) and http://x.", SHORT_1);

        let (once, cited_once) = resolve_citations(&draft, &sources);
        let (twice, cited_twice) = resolve_citations(&once, &sources);
        assert_eq!(once, twice);
        assert_eq!(cited_once, cited_twice);
    }
}
