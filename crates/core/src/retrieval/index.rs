use std::cmp::Ordering;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of snippets returned for a query.
pub const DEFAULT_TOP_K: usize = 3;

/// A page of a PDF or a whole text file from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name relative to the corpus folder.
    pub source: String,
    /// 1-based page number for PDFs.
    pub page: Option<u32>,
    pub text: String,
}

/// A chunk of a source document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub source: String,
    pub page: Option<u32>,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// The persisted retrieval index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Embedding model the vectors were produced with.
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

/// A ranked retrieval hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry<'a> {
    pub score: f32,
    pub entry: &'a IndexEntry,
}

impl VectorIndex {
    pub fn new(model: impl Into<String>, entries: Vec<IndexEntry>) -> Self {
        Self {
            model: model.into(),
            built_at: Utc::now(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The `k` entries most similar to `query`, best first.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredEntry<'_>> {
        let mut scored: Vec<ScoredEntry<'_>> = self
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                score: cosine_similarity(query, &entry.embedding),
                entry,
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Cosine similarity of two vectors; 0.0 when lengths differ or a vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Join retrieved snippets into the context block handed to the prompt.
pub fn join_context(hits: &[ScoredEntry<'_>]) -> String {
    hits.iter()
        .map(|hit| hit.entry.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Why a cached index has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    Forced,
    Missing,
    SourcesUpdated,
    ModelChanged { cached: String, requested: String },
}

/// Decide whether the cached index is still valid.
///
/// `index_modified` is the modification time of the index file (None when it
/// does not exist), `cached_model` the model recorded in it, and
/// `source_modified` the modification times of every corpus file.
pub fn rebuild_reason(
    index_modified: Option<SystemTime>,
    cached_model: Option<&str>,
    requested_model: &str,
    source_modified: &[SystemTime],
) -> Option<RebuildReason> {
    let Some(index_modified) = index_modified else {
        return Some(RebuildReason::Missing);
    };

    if source_modified.iter().any(|modified| *modified > index_modified) {
        return Some(RebuildReason::SourcesUpdated);
    }

    match cached_model {
        Some(cached) if cached != requested_model => Some(RebuildReason::ModelChanged {
            cached: cached.to_string(),
            requested: requested_model.to_string(),
        }),
        _ => None,
    }
}
