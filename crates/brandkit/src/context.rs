use std::path::PathBuf;

use brandkit_core::branding::{build_prompt, extract_branding, BrandingResult};
use brandkit_core::retrieval::{VectorIndex, DEFAULT_TOP_K};
use image::DynamicImage;
use rig::providers::ollama;

use crate::assets::{AssetFetcher, PaletteAsset};
use crate::index::OllamaEmbedder;
use crate::prelude::{eprintln, *};

/// Language and embedding model settings.
#[derive(Debug, Clone, clap::Args)]
pub struct ModelOptions {
    /// Ollama base URL
    #[clap(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model used to write the branding suggestion
    #[clap(long, env = "BRANDKIT_MODEL", default_value = "llama3.2")]
    pub model: String,

    /// Model used to embed the corpus and the descriptions
    #[clap(long, env = "BRANDKIT_EMBEDDING_MODEL", default_value = "llama3.2")]
    pub embedding_model: String,
}

/// Where the corpus and its index live.
#[derive(Debug, Clone, clap::Args)]
pub struct CorpusOptions {
    /// Folder of PDF and text reference documents
    #[clap(long, env = "BRANDKIT_DOCS", default_value = "docs")]
    pub docs_dir: PathBuf,

    /// Folder holding the cached index
    #[clap(long, env = "BRANDKIT_INDEX", default_value = "vectorstore")]
    pub index_dir: PathBuf,
}

/// External image services and the font used on the palette image.
#[derive(Debug, Clone, clap::Args)]
pub struct AssetOptions {
    /// Base URL of the image generation service
    #[clap(
        long,
        env = "BRANDKIT_LOGO_URL",
        default_value = "https://image.pollinations.ai"
    )]
    pub logo_url: String,

    /// Base URL of the palette search service
    #[clap(
        long,
        env = "BRANDKIT_PALETTE_URL",
        default_value = "https://colormagic.app"
    )]
    pub palette_url: String,

    /// TrueType font drawn on the palette image (the built-in font is used if missing)
    #[clap(long, env = "BRANDKIT_FONT", default_value = "arial.ttf")]
    pub font: PathBuf,
}

/// Everything needed to build a [`BrandingContext`].
#[derive(Debug, Clone, clap::Args)]
pub struct ContextOptions {
    #[clap(flatten)]
    pub model: ModelOptions,

    #[clap(flatten)]
    pub corpus: CorpusOptions,

    #[clap(flatten)]
    pub assets: AssetOptions,
}

/// One full generation: the extracted fields and the assets built from them.
#[derive(Debug, Clone)]
pub struct BrandingOutcome {
    pub result: BrandingResult,
    /// Retrieved corpus snippets handed to the model.
    pub context: String,
    pub logo: DynamicImage,
    pub palette: PaletteAsset,
}

/// Clients, index and settings shared by every request.
///
/// Built once with [`BrandingContext::init`] and passed to the web handlers
/// and the CLI.
pub struct BrandingContext {
    options: ContextOptions,
    llm: ollama::Client,
    embedder: OllamaEmbedder,
    index: VectorIndex,
    assets: AssetFetcher,
    verbose: bool,
}

pub fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

impl BrandingContext {
    /// Build the clients and load (or rebuild) the corpus index.
    ///
    /// Fails when the corpus is missing or the index cannot be built.
    pub async fn init(options: ContextOptions, global: &crate::Global) -> Result<Self> {
        if global.verbose {
            eprintln!("Ollama URL: {}", options.model.ollama_url);
            eprintln!("Model: {}", options.model.model);
            eprintln!("Embedding model: {}", options.model.embedding_model);
            eprintln!("Corpus: {}", options.corpus.docs_dir.display());
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;
        let embedder = OllamaEmbedder::new(
            http,
            &options.model.ollama_url,
            &options.model.embedding_model,
        );

        let index = crate::index::load_or_build(
            &options.corpus.docs_dir,
            &options.corpus.index_dir,
            &embedder,
            false,
            global.verbose,
        )
        .await?;

        Self::assemble(options, embedder, index, global.verbose)
    }

    /// Build a context around an index that is already loaded.
    pub fn assemble(
        options: ContextOptions,
        embedder: OllamaEmbedder,
        index: VectorIndex,
        verbose: bool,
    ) -> Result<Self> {
        let llm = create_client(&options.model.ollama_url)?;
        let assets = AssetFetcher::new(&options.assets)?;

        Ok(Self {
            options,
            llm,
            embedder,
            index,
            assets,
            verbose,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Retrieve context for `description`; an embedding failure yields no context.
    pub async fn retrieve_context(&self, description: &str) -> String {
        match crate::index::retrieve(&self.index, &self.embedder, description, DEFAULT_TOP_K)
            .await
        {
            Ok(context) => context,
            Err(e) => {
                log::warn!("Retrieval failed, continuing without context: {e}");
                String::new()
            }
        }
    }

    /// Run the whole pipeline for one description. Never fails.
    pub async fn generate(&self, description: &str) -> BrandingOutcome {
        let context = self.retrieve_context(description).await;
        log::debug!("context:\n{context}");

        let prompt = build_prompt(description, &context);
        let reply = match crate::agent::ask(&self.llm, &self.options.model.model, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Model call failed: {e}");
                String::new()
            }
        };
        log::debug!("LLM response: {reply}");

        if self.verbose {
            eprintln!("Prompt length: {} chars", prompt.len());
            eprintln!("Reply length: {} chars", reply.len());
        }

        let result = extract_branding(&reply);
        let (logo, palette) = self
            .assets
            .fetch_all(&result.logo_mark, &result.slogan, &result.color)
            .await;

        BrandingOutcome {
            result,
            context,
            logo,
            palette,
        }
    }
}
