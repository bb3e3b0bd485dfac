use crate::core::io::Storage;
use crate::core::state::{Category, SourceDocument};
use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use log::{info, warn};
use std::path::Path;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];
const MAX_CONCURRENT_READS: usize = 4;

/// Plain-text documents filed by category under the input folder.
#[derive(Debug, Default, Clone)]
pub struct Library {
    documents: Vec<SourceDocument>,
}

impl Library {
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }

    /// Reads `input_folder/<category>/*.{txt,md}` for every category.
    ///
    /// Files that cannot be read or are not UTF-8 are logged and skipped.
    pub async fn load(storage: &dyn Storage, input_folder: &str) -> Result<Self> {
        let mut documents = Vec::new();
        for category in Category::ALL {
            let folder = Path::new(input_folder).join(category.folder());
            let folder = folder.to_string_lossy().to_string();
            let paths: Vec<String> = match storage.list(&folder).await {
                Ok(paths) => paths.into_iter().filter(|p| is_text_file(p)).collect(),
                Err(e) => {
                    warn!("Skipping {}: {:#}", folder, e);
                    continue;
                }
            };

            let results: Vec<(String, Result<SourceDocument>)> = stream::iter(paths)
                .map(|path| async move {
                    let loaded = load_document(storage, &path, category).await;
                    (path, loaded)
                })
                .buffered(MAX_CONCURRENT_READS)
                .collect()
                .await;

            let before = documents.len();
            for (path, loaded) in results {
                match loaded {
                    Ok(document) => documents.push(document),
                    Err(e) => warn!("Skipping {}: {:#}", path, e),
                }
            }
            info!(
                "Loaded {} {} document(s) from {}",
                documents.len() - before,
                category.folder(),
                folder
            );
        }
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn by_category(&self, category: Category) -> Vec<&SourceDocument> {
        self.documents
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

}

fn is_text_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

async fn load_document(
    storage: &dyn Storage,
    path: &str,
    category: Category,
) -> Result<SourceDocument> {
    let bytes = storage.read(path).await?;
    let content = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8 text", path))?;
    if content.trim().is_empty() {
        warn!("{} is empty", path);
    }
    let name = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    let uploaded_at = storage.modified_millis(path).await.ok().flatten().unwrap_or(0);

    Ok(SourceDocument {
        id: path.to_string(),
        name,
        category,
        content,
        uploaded_at,
    })
}
