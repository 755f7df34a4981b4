//! BDD scenario generation from a fused knowledge graph
//!
//! Builds a design graph from a specification document and a code graph
//! from each component's source, merges them, and drives an incremental
//! Gherkin generation loop over the merged view. The generative model,
//! the embedder, the document extractor, and the source parser are all
//! trait seams; everything else in here is deterministic and offline.
//!
//! Entry point is [`ScenarioPipeline::run`] over a [`GeneratorConfig`].

#![warn(unreachable_pub)]

pub mod collaborators;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod scenario;
pub mod similarity;
pub mod source;
pub mod store;

pub use collaborators::{DocumentExtractor, Embedder, SourceEntity, SourceParser, TextGenerator};
pub use document::{chunk_document, DesignGraphBuilder, SIMILARITY_GATE};
pub use error::{Error, Result};
pub use orchestrator::{
    build_prompt, component_context, retrieve_similar_context, GeneratorConfig, PromptInputs,
    RunSummary, ScenarioPipeline, SimilarContext, DEFAULT_ADDITIONAL_INFO, RETRIEVAL_THRESHOLD,
};
pub use scenario::{clean_generated_text, split_into_scenarios, ScenarioUnit};
pub use similarity::{cosine_similarity, is_valid_vector};
pub use source::{
    extract_component_code, extract_docstring, CodeGraphBuilder, MarkupScanner, NO_DOCSTRING,
};
pub use store::{CacheStore, MemoryStore};
