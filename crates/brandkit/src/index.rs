use std::future::Future;
use std::path::{Path, PathBuf};

use brandkit_core::retrieval::{
    chunk_text, join_context, rebuild_reason, IndexEntry, RebuildReason, SourceDocument,
    VectorIndex, DEFAULT_CHUNK_CHARS,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::context::{CorpusOptions, ModelOptions};
use crate::prelude::{println, *};

/// File name of the persisted index inside the index folder.
pub const INDEX_FILE: &str = "index.json";

const EMBED_BATCH_SIZE: usize = 16;

/// Produces embeddings for a batch of texts.
pub trait Embedder {
    /// Name of the embedding model, recorded in the index.
    fn model(&self) -> &str;

    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Embeddings through Ollama's `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(f!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(Error::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(f!("Ollama returned {status}: {body}")).into());
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::Embedding(f!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            ))
            .into());
        }

        Ok(parsed.embeddings)
    }
}

#[derive(Debug, clap::Args)]
pub struct IndexOptions {
    /// Rebuild the index even when the cache is up to date
    #[arg(long)]
    pub force: bool,

    #[clap(flatten)]
    pub corpus: CorpusOptions,

    #[clap(flatten)]
    pub model: ModelOptions,
}

pub async fn run(options: IndexOptions, global: crate::Global) -> Result<()> {
    let client = reqwest::Client::new();
    let embedder = OllamaEmbedder::new(
        client,
        &options.model.ollama_url,
        &options.model.embedding_model,
    );

    let index = load_or_build(
        &options.corpus.docs_dir,
        &options.corpus.index_dir,
        &embedder,
        options.force,
        true,
    )
    .await?;

    println!(
        "Index '{}' holds {} chunks embedded with '{}' (built {})",
        index_path(&options.corpus.index_dir).display(),
        index.len(),
        index.model,
        index.built_at.to_rfc3339()
    );

    if global.verbose {
        let mut sources: Vec<&str> = index.entries.iter().map(|e| e.source.as_str()).collect();
        sources.dedup();
        for source in sources {
            println!("  {source}");
        }
    }

    Ok(())
}

pub fn index_path(index_dir: &Path) -> PathBuf {
    index_dir.join(INDEX_FILE)
}

/// Reuse the cached index when it is up to date, otherwise rebuild and save it.
pub async fn load_or_build<E: Embedder>(
    docs_dir: &Path,
    index_dir: &Path,
    embedder: &E,
    force: bool,
    show_progress: bool,
) -> Result<VectorIndex> {
    let path = index_path(index_dir);
    let sources = crate::corpus::source_files(docs_dir)?;
    let source_modified = crate::corpus::modified_times(&sources)?;

    let index_modified = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .ok();
    let cached = index_modified.and_then(|_| read_cached(&path));

    let reason = if force {
        Some(RebuildReason::Forced)
    } else if index_modified.is_some() && cached.is_none() {
        Some(RebuildReason::Missing)
    } else {
        rebuild_reason(
            index_modified,
            cached.as_ref().map(|index| index.model.as_str()),
            embedder.model(),
            &source_modified,
        )
    };

    match (reason, cached) {
        (None, Some(index)) => {
            log::info!("Using cached index '{}' (no updates in docs)", path.display());
            Ok(index)
        }
        (reason, _) => {
            log::info!(
                "Rebuilding index '{}' ({:?})",
                path.display(),
                reason.unwrap_or(RebuildReason::Missing)
            );

            let docs_dir = docs_dir.to_path_buf();
            let documents =
                tokio::task::spawn_blocking(move || crate::corpus::load_documents(&docs_dir))
                    .await??;

            let index = build(&documents, embedder, show_progress).await?;

            save(&index, &path)?;
            Ok(index)
        }
    }
}

fn embedding_progress(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Embedding corpus [{bar:30.cyan/blue}] {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn read_cached(path: &Path) -> Option<VectorIndex> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(index) => Some(index),
        Err(e) => {
            log::warn!("Ignoring unreadable index '{}': {}", path.display(), e);
            None
        }
    }
}

fn save(index: &VectorIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| f!("Failed to create index folder '{}'", parent.display()))?;
    }
    let data = serde_json::to_string(index)?;
    std::fs::write(path, data).with_context(|| f!("Failed to write index '{}'", path.display()))?;
    Ok(())
}

/// Chunk and embed the documents into a fresh index.
pub async fn build<E: Embedder>(
    documents: &[SourceDocument],
    embedder: &E,
    show_progress: bool,
) -> Result<VectorIndex> {
    let mut pending: Vec<(&SourceDocument, String)> = Vec::new();
    for document in documents {
        for chunk in chunk_text(&document.text, DEFAULT_CHUNK_CHARS) {
            pending.push((document, chunk));
        }
    }

    let progress = show_progress.then(|| embedding_progress(pending.len() as u64));
    let mut entries = Vec::with_capacity(pending.len());

    for batch in pending.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;

        for ((document, text), embedding) in batch.iter().zip(embeddings) {
            entries.push(IndexEntry {
                source: document.source.clone(),
                page: document.page,
                text: text.clone(),
                embedding,
            });
        }

        if let Some(bar) = &progress {
            bar.inc(batch.len() as u64);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    Ok(VectorIndex::new(embedder.model(), entries))
}

/// Retrieve the `k` snippets closest to `query`, joined into one context block.
pub async fn retrieve<E: Embedder>(
    index: &VectorIndex,
    embedder: &E,
    query: &str,
    k: usize,
) -> Result<String> {
    if index.is_empty() {
        return Ok(String::new());
    }

    let query_embedding = embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_eyre("Embedding service returned no vector for the query")?;

    Ok(join_context(&index.top_k(&query_embedding, k)))
}
