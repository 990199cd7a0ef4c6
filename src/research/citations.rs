//! Citation handling for grounded search results
//!
//! Grounded responses cite pages through long redirect URLs. Each raw URL is
//! mapped to a short reference (`shortRef`) that the model sees in its
//! summaries and that [`crate::research::finalize`] rewrites back to the real
//! URL once the answer is written. The mapping lives in a
//! [`ShortRefRegistry`] shared by all tasks of one run, so a page cited by
//! two parallel searches keeps a single reference.

use crate::llm::GroundedResponse;
use crate::types::{Segment, Source};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const SHORT_REF_PREFIX: &str = "https://vertexaisearch.cloud.google.com/id/";

/// Run-scoped map from raw citation URL to short reference
#[derive(Debug, Clone, Default)]
pub struct ShortRefRegistry {
    refs: Arc<Mutex<HashMap<String, String>>>,
}

impl ShortRefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short reference for `url`, allocating `{prefix}{sequence_id}-{index}` on first sight
    pub fn resolve(&self, url: &str, sequence_id: &str, index: usize) -> String {
        self.refs
            .lock()
            .entry(url.to_string())
            .or_insert_with(|| format!("{}{}-{}", SHORT_REF_PREFIX, sequence_id, index))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.refs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.lock().is_empty()
    }
}

/// One cited page within a citation span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitedSegment {
    pub label: String,
    pub short_ref: String,
    pub url: String,
}

/// A span of generated text and the pages backing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub start_index: usize,
    pub end_index: usize,
    /// The supported text itself
    pub text: String,
    pub segments: Vec<CitedSegment>,
}

/// Display label for a cited page: its title without the last dot suffix
///
/// Grounding chunk titles are usually domains, so `"wikipedia.org"` becomes
/// `"wikipedia"`.
pub fn citation_label(title: &str) -> String {
    match title.rsplit_once('.') {
        Some((head, _)) if !head.is_empty() => head.to_string(),
        _ => title.to_string(),
    }
}

/// Build citations from grounding metadata, registering every cited URL
///
/// Chunk indices that point past the chunk list are skipped, as are chunks
/// without a web URI.
pub fn get_citations(
    response: &GroundedResponse,
    registry: &ShortRefRegistry,
    sequence_id: &str,
) -> Vec<Citation> {
    // Register in chunk order so references follow the provider's numbering
    for (index, chunk) in response.chunks.iter().enumerate() {
        if !chunk.uri.is_empty() {
            registry.resolve(&chunk.uri, sequence_id, index);
        }
    }

    response
        .supports
        .iter()
        .map(|support| {
            let segments = support
                .chunk_indices
                .iter()
                .filter_map(|&i| response.chunks.get(i).map(|chunk| (i, chunk)))
                .filter(|(_, chunk)| !chunk.uri.is_empty())
                .map(|(i, chunk)| CitedSegment {
                    label: citation_label(&chunk.title),
                    short_ref: registry.resolve(&chunk.uri, sequence_id, i),
                    url: chunk.uri.clone(),
                })
                .collect();

            Citation {
                start_index: support.start_index,
                end_index: support.end_index,
                text: support.text.clone(),
                segments,
            }
        })
        .collect()
}

/// Insert ` [label](short_ref)` markers at the end of each cited span
///
/// Spans are processed from the end of the text backwards so an insertion
/// never shifts an offset that is still to be used. Offsets past the end are
/// clamped, and offsets inside a multi-byte character move back to its start.
pub fn insert_citation_markers(text: &str, citations: &[Citation]) -> String {
    let mut ordered: Vec<&Citation> = citations.iter().collect();
    ordered.sort_by(|a, b| {
        b.end_index
            .cmp(&a.end_index)
            .then(b.start_index.cmp(&a.start_index))
    });

    let mut out = text.to_string();
    for citation in ordered {
        let marker: String = citation
            .segments
            .iter()
            .map(|s| format!(" [{}]({})", s.label, s.short_ref))
            .collect();
        if marker.is_empty() {
            continue;
        }
        let at = floor_char_boundary(&out, citation.end_index);
        out.insert_str(at, &marker);
    }
    out
}

/// Flatten citations into sources, one per cited segment
pub fn sources_from_citations(citations: &[Citation], sequence_id: &str) -> Vec<Source> {
    citations
        .iter()
        .flat_map(|c| c.segments.iter().map(move |s| (c, s)))
        .enumerate()
        .map(|(i, (citation, segment))| Source {
            id: format!("{}_{}", sequence_id, i),
            title: segment.label.clone(),
            url: segment.url.clone(),
            short_ref: segment.short_ref.clone(),
            segments: vec![Segment {
                text: citation.text.clone(),
                url: segment.url.clone(),
                title: segment.label.clone(),
            }],
        })
        .collect()
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut at = index.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}
