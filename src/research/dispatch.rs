//! Fan-out of pending queries into independent search tasks

use crate::research::state::Query;

/// One unit of web research
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTask {
    pub query: String,
    /// Decimal id, unique across the whole run
    pub sequence_id: String,
}

/// Turn `queries` into search tasks, numbering from `offset`
///
/// Blank queries are dropped and do not consume an id, so a batch of `k`
/// valid queries always gets ids `offset..offset + k`. An empty result means
/// there is nothing left to research.
pub fn fan_out(queries: &[Query], offset: usize) -> Vec<SearchTask> {
    queries
        .iter()
        .filter(|q| !q.query.trim().is_empty())
        .enumerate()
        .map(|(i, q)| SearchTask {
            query: q.query.clone(),
            sequence_id: (offset + i).to_string(),
        })
        .collect()
}
