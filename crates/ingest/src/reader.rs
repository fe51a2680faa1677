use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::SourceText;

/// Loads source text from local files instead of Wikipedia
pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<SourceText> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "txt" | "md" => {
                let text = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read file: {:?}", path))?;
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().replace('_', " "))
                    .unwrap_or_default();
                Ok(SourceText { title, text })
            }
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    pub async fn read_directory(dir: &Path) -> Result<Vec<SourceText>> {
        let mut sources = Vec::new();

        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read directory: {:?}", dir))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext == "txt" || ext == "md" {
                        sources.push(Self::read_file(&path).await?);
                    }
                }
            }
        }

        // read_dir order is platform dependent
        sources.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(sources)
    }
}
