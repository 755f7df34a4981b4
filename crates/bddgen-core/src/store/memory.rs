//! Conversation memory store
//!
//! Per component, an append-only ordered sequence of role/content turns.
//! Read before each generation, appended after. Persisted as one JSON
//! document rewritten in full; corruption reinitializes to empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::Result;

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// `Human` for the generation request, `AI` for the cleaned result
    pub role: String,
    pub content: String,
}

impl Turn {
    /// A request turn.
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: "Human".into(),
            content: content.into(),
        }
    }

    /// A response turn.
    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: "AI".into(),
            content: content.into(),
        }
    }
}

/// On-disk conversation memory, `component -> turns`.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    history: IndexMap<String, Vec<Turn>>,
}

impl MemoryStore {
    /// Load memory from `path`, starting fresh on any failure.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let history = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(history) => history,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "memory history invalid, starting fresh");
                    IndexMap::new()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no prior memory history found, starting fresh");
                IndexMap::new()
            }
        };
        Self { path, history }
    }

    /// Prior turns for a component, oldest first. Empty if none.
    #[must_use]
    pub fn turns(&self, component_name: &str) -> &[Turn] {
        self.history
            .get(component_name)
            .map_or(&[], Vec::as_slice)
    }

    /// Append turns for a component. Existing turns are never rewritten.
    pub fn append(&mut self, component_name: &str, turns: impl IntoIterator<Item = Turn>) {
        self.history
            .entry(component_name.to_string())
            .or_default()
            .extend(turns);
    }

    /// Rewrite the full document to disk.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
