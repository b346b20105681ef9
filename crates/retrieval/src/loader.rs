//! Load `.txt` / `.md` files from a directory into a [`DocumentStore`].
//!
//! Each file is split into paragraphs on blank lines; every non-empty
//! paragraph becomes one snippet whose source is the file name.

use std::path::Path;

use tandem_core::error::RetrievalError;
use tracing::{debug, warn};

use crate::store::DocumentStore;

const EXTENSIONS: &[&str] = &["txt", "md"];

/// Split text into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Load every supported file in `dir` (non-recursive). Returns the number of
/// snippets added.
///
/// Files that cannot be read are skipped with a warning; a missing directory
/// is an error.
pub async fn load_documents(store: &DocumentStore, dir: &Path) -> Result<usize, RetrievalError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        RetrievalError::Storage(format!("cannot read {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RetrievalError::Storage(e.to_string()))?
    {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if supported && path.is_file() {
            files.push(path);
        }
    }
    // read_dir order is platform-dependent
    files.sort();

    let mut added = 0;
    for path in files {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                continue;
            }
        };

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        let paragraphs = split_paragraphs(&text);
        debug!(path = %path.display(), paragraphs = paragraphs.len(), "Loaded document");
        for paragraph in paragraphs {
            store.add(paragraph, source.clone()).await;
            added += 1;
        }
    }

    Ok(added)
}
