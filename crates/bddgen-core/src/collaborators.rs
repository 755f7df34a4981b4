//! External collaborator seams
//!
//! The generative model, the embedding model, the document text
//! extractor, and the source parser are opaque collaborators. Each is a
//! trait so the pipeline can run against real backends in the binary and
//! against deterministic fakes in tests.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Opaque text-generation function: `generate(prompt) -> text`.
///
/// Synchronous from the pipeline's point of view: one blocking call, no
/// streaming or partial results.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw scenario text from a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Opaque embedding function: `embed(text) -> vector`.
///
/// Dimensionality is fixed across all calls in a run.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a text into a fixed-dimensional vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Opaque document text extraction: `extract_text(path) -> string`.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract the full plain text of a design document.
    async fn extract_text(&self, path: &Path) -> Result<String>;
}

/// One structural entity found in component source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntity {
    /// An interactive markup element (button/input/form equivalent).
    Element {
        /// Lowercased tag name
        tag: String,
        /// Visible text, if any
        text: Option<String>,
        /// `id` attribute, if any
        id: Option<String>,
        /// Element carries a click/activation handler
        has_action: bool,
        /// Byte offset of the element in the source, for synthetic keys
        position: usize,
    },
    /// A navigation call with a literal path argument.
    Navigation {
        /// The literal route path
        target: String,
    },
}

/// Source parser collaborator: `parse(source) -> entity list`.
pub trait SourceParser: Send + Sync {
    /// Extract interactive elements and navigation calls from source.
    fn parse(&self, source: &str) -> Vec<SourceEntity>;
}
