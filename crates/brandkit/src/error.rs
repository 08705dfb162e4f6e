#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Corpus folder not found: {0}")]
    DocsDirMissing(String),

    #[error("No source documents found in '{0}' to build the index")]
    NoDocuments(String),

    #[error("Failed to read document '{path}': {reason}")]
    Document { path: String, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Network request failed")]
    Network(#[from] reqwest::Error),
}
