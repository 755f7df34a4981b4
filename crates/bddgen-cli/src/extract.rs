//! Design document text extraction
//!
//! PDF documents go through `pdf-extract`; anything else is read as
//! plain UTF-8 text. PDF parsing is CPU bound, so it runs on the
//! blocking pool.

use async_trait::async_trait;
use bddgen_core::{DocumentExtractor, Error, Result};
use std::path::Path;
use tokio::fs;

/// File-based [`DocumentExtractor`] with PDF support.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FileTextExtractor;

#[async_trait]
impl DocumentExtractor for FileTextExtractor {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        let is_pdf = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Ok(fs::read_to_string(path).await?);
        }

        let path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| Error::Collaborator(format!("pdf extraction task failed: {e}")))?
            .map_err(|e| Error::Collaborator(format!("pdf extraction failed: {e}")))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_documents_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.txt");
        std::fs::write(&path, "1. Overview\nBase URL: http://localhost:3000").unwrap();

        let text = FileTextExtractor.extract_text(&path).await.unwrap();
        assert!(text.starts_with("1. Overview"));
    }

    #[tokio::test]
    async fn missing_document_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileTextExtractor
            .extract_text(&dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
