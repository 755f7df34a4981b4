//! Test-order resolution
//!
//! Orders component files for generation: the landing page first, then
//! files reachable over `navigates-to` edges from already-placed
//! components, then whatever is left in stable input order. The result
//! is always a permutation of the input.

use crate::graph::{KnowledgeGraph, Relation};

/// File stem without its extension, used to match files to component
/// node ids (`Login.jsx` -> `Login`).
#[must_use]
pub fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

/// Resolve the processing order of `component_files` from `design`.
///
/// Every input file appears exactly once in the result. Files whose
/// components are unreachable from the landing page fall back to their
/// original relative order.
#[must_use]
pub fn resolve_test_order(component_files: &[String], design: &KnowledgeGraph) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(component_files.len());
    let mut remaining: Vec<String> = component_files.to_vec();

    if let Some(landing) = design.landing_page() {
        if let Some(pos) = remaining.iter().position(|f| file_stem(f) == landing) {
            ordered.push(remaining.remove(pos));
        }
    }

    while !remaining.is_empty() {
        let mut advanced = false;
        for edge in &design.edges {
            if edge.relation != Relation::NavigatesTo {
                continue;
            }
            if !ordered.iter().any(|f| file_stem(f) == edge.from) {
                continue;
            }
            if let Some(pos) = remaining.iter().position(|f| file_stem(f) == edge.to) {
                ordered.push(remaining.remove(pos));
                advanced = true;
                break;
            }
        }
        if !advanced {
            // No navigation edge advances the frontier; fall back to the
            // first remaining file so the walk always terminates.
            ordered.push(remaining.remove(0));
        }
    }

    ordered
}
