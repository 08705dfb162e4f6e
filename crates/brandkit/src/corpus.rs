use std::path::{Path, PathBuf};
use std::time::SystemTime;

use brandkit_core::retrieval::{cleanup_text, SourceDocument};

use crate::prelude::*;

/// File extensions read from the corpus folder.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// List the PDF and text files of the corpus folder, sorted by name.
pub fn source_files(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !docs_dir.is_dir() {
        return Err(Error::DocsDirMissing(docs_dir.display().to_string()).into());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(docs_dir)
        .with_context(|| f!("Failed to list corpus folder '{}'", docs_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Modification times of the given files.
pub fn modified_times(files: &[PathBuf]) -> Result<Vec<SystemTime>> {
    files
        .iter()
        .map(|path| {
            std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .with_context(|| f!("Failed to read modification time of '{}'", path.display()))
        })
        .collect()
}

/// Load every document of the corpus folder.
///
/// PDFs yield one document per page with text; text files yield one document
/// each. Fails when the folder is missing or holds no readable content.
pub fn load_documents(docs_dir: &Path) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();

    for path in source_files(docs_dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            documents.extend(load_pdf(&path, &name)?);
        } else if let Some(document) = load_text(&path, &name)? {
            documents.push(document);
        }
    }

    if documents.is_empty() {
        return Err(Error::NoDocuments(docs_dir.display().to_string()).into());
    }

    log::info!(
        "Loaded {} documents from '{}'",
        documents.len(),
        docs_dir.display()
    );

    Ok(documents)
}

fn load_text(path: &Path, name: &str) -> Result<Option<SourceDocument>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Document {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let text = cleanup_text(&String::from_utf8_lossy(&bytes));

    if text.is_empty() {
        log::warn!("Skipping empty document '{}'", name);
        return Ok(None);
    }

    Ok(Some(SourceDocument {
        source: name.to_string(),
        page: None,
        text,
    }))
}

fn load_pdf(path: &Path, name: &str) -> Result<Vec<SourceDocument>> {
    let doc = lopdf::Document::load(path).map_err(|e| Error::Document {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        let raw = match doc.extract_text(&[page_number]) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Skipping page {} of '{}': {}", page_number, name, e);
                continue;
            }
        };

        let text = cleanup_text(&raw);
        if text.is_empty() {
            continue;
        }

        pages.push(SourceDocument {
            source: name.to_string(),
            page: Some(page_number),
            text,
        });
    }

    if pages.is_empty() {
        log::warn!("No extractable text in '{}'", name);
    }

    Ok(pages)
}
