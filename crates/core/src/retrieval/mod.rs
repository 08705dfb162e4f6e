pub mod index;
pub mod text;

pub use index::{
    cosine_similarity, join_context, rebuild_reason, IndexEntry, RebuildReason, ScoredEntry,
    SourceDocument, VectorIndex, DEFAULT_TOP_K,
};
pub use text::{chunk_text, cleanup_text, DEFAULT_CHUNK_CHARS};
