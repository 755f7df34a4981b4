//! Change-detection cache
//!
//! One persisted JSON document owns every cross-invocation record: the
//! per-file records driving regeneration decisions, the cached design
//! and code knowledge graphs, and the raw generated text per file. The
//! document is rewritten in full after each update (last-writer-wins,
//! at-most-once durability).
//!
//! An unreadable or invalid cache file is never fatal: the store
//! reinitializes to an empty document and logs the recovery.

use bddgen_graph::{ContentHash, KnowledgeGraph};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Per source file record, written on every regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Component name at the time of generation
    pub component_name: String,
    /// Embedding of the extracted component code
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Extracted component code text
    pub code: String,
    /// File modification time, milliseconds since epoch
    pub mtime: u64,
}

/// A cached graph keyed by the content hash it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGraph {
    /// Hash of the full extracted text the graph was built from
    pub hash: ContentHash,
    /// The graph itself, immutable for this hash
    pub graph: KnowledgeGraph,
}

/// Design- and code-graph caches, keyed by document/file path.
///
/// Entries for stale hashes are overwritten per key; distinct documents
/// accumulate without eviction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphCaches {
    #[serde(default)]
    pub design: IndexMap<String, CachedGraph>,
    #[serde(default)]
    pub code: IndexMap<String, CachedGraph>,
}

/// The persisted cache document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    /// Per-file change-detection records
    #[serde(default)]
    pub files: IndexMap<String, FileRecord>,
    /// Cached knowledge graphs
    #[serde(default)]
    pub knowledge_graph: GraphCaches,
    /// Raw generated scenario text per source file
    #[serde(default)]
    pub tests: IndexMap<String, String>,
}

impl CacheDocument {
    /// First cached design graph in insertion order, used when no
    /// design document is supplied on this run.
    #[must_use]
    pub fn any_design_graph(&self) -> Option<&KnowledgeGraph> {
        self.knowledge_graph
            .design
            .values()
            .next()
            .map(|entry| &entry.graph)
    }
}

/// On-disk cache store with explicit load/save lifecycle.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    /// The live document; exclusively owned by this store.
    pub doc: CacheDocument,
}

impl CacheStore {
    /// Load the cache from `path`, reinitializing on any read or parse
    /// failure.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<CacheDocument>(&data) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cache invalid, reinitializing");
                    CacheDocument::default()
                }
            },
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "cache not found, starting fresh");
                CacheDocument::default()
            }
        };
        Self { path, doc }
    }

    /// Rewrite the full document to disk.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.doc)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// The two independent change signals, computed by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ChangeSignals {
    /// Current mtime is strictly newer than the cached mtime
    pub file_changed: bool,
    /// Extracted code text differs from the cached text
    pub code_changed: bool,
}

/// Decide regenerate-vs-reuse for one component file.
///
/// Regeneration fires iff the file timestamp moved AND the code
/// actually changed, or there is no prior record, or the component was
/// renamed. A touched-but-unmodified file never regenerates; a new or
/// renamed component always does (once its timestamp moves).
#[must_use]
pub fn should_regenerate(
    record: Option<&FileRecord>,
    component_name: &str,
    signals: ChangeSignals,
) -> bool {
    let no_prior = record.map_or(true, |r| r.code.is_empty());
    let renamed = record.map_or(true, |r| r.component_name != component_name);
    signals.file_changed && (signals.code_changed || no_prior || renamed)
}

/// Delete previously written scenario files for `component_name`.
///
/// Stale-output invalidation: every file in `features_dir` whose name
/// starts with the lowercase component name plus `-` and ends with
/// `.feature` is removed before new output is written.
pub fn remove_stale_features(features_dir: &Path, component_name: &str) -> Result<usize> {
    let prefix = format!("{}-", component_name.to_lowercase());
    let mut removed = 0;
    if !features_dir.is_dir() {
        return Ok(0);
    }
    for entry in fs::read_dir(features_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && name.ends_with(".feature") {
            fs::remove_file(entry.path())?;
            tracing::info!(file = name, "removed stale feature file");
            removed += 1;
        }
    }
    Ok(removed)
}
