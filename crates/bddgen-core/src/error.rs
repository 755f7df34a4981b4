//! Error taxonomy for the generation pipeline
//!
//! Three classes matter at runtime:
//! - configuration errors are fatal before any generation work starts;
//! - generation failures are fatal for the whole run;
//! - cache/memory corruption and malformed similarity vectors are
//!   recovered locally and never surface here.

use std::path::PathBuf;

/// Main pipeline error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing input path
    #[error("invalid path: {}", path.display())]
    InvalidPath {
        /// The offending path
        path: PathBuf,
    },

    /// Missing or malformed configuration (e.g. generation credentials)
    #[error("configuration error: {0}")]
    Config(String),

    /// No design document provided and no design graph cached
    #[error("no design document provided and no design knowledge graph found in cache")]
    MissingDesignGraph,

    /// The generation collaborator failed outright
    #[error("generation failed for {component}: {reason}")]
    GenerationFailed {
        /// Component being processed
        component: String,
        /// Collaborator-reported reason
        reason: String,
    },

    /// The generation collaborator produced nothing usable
    #[error("generated scenario text for {component} is empty after cleanup")]
    EmptyGeneration {
        /// Component being processed
        component: String,
    },

    /// Cache reuse was decided but no prior generated text exists
    #[error("no cached scenario text to reuse for {component}")]
    MissingCachedText {
        /// Component being processed
        component: String,
    },

    /// An external collaborator (embedder, extractor) failed
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error belongs to the pre-flight configuration class.
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. } | Self::Config(_) | Self::MissingDesignGraph
        )
    }
}

/// Pipeline result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_class_membership() {
        assert!(Error::Config("no api key".into()).is_config());
        assert!(Error::MissingDesignGraph.is_config());
        assert!(Error::InvalidPath { path: "/nope".into() }.is_config());
        assert!(!Error::EmptyGeneration { component: "Login".into() }.is_config());
    }

    #[test]
    fn display_includes_component() {
        let err = Error::MissingCachedText {
            component: "Dashboard".into(),
        };
        assert!(err.to_string().contains("Dashboard"));
    }
}
