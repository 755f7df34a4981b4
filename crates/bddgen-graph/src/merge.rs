//! Design/code graph merge
//!
//! Combines the document-derived design graph with one component's code
//! graph. Document attributes take precedence on shared node keys; the
//! named component is re-overlaid with its code attributes afterwards so
//! code-sourced fields survive the union.

use crate::graph::KnowledgeGraph;

/// Merge `design` and `code` for `component_name`.
///
/// - nodes: union; on a shared key the design attributes win, code-only
///   attributes are filled in;
/// - edges: `design.edges ++ code.edges`, exactly, order preserved;
/// - `base_url`: design's if present, else code's;
/// - the named component's node is overlaid with its code attributes a
///   second time, so structure discovered in source is never dropped by
///   an unrelated overlap.
#[must_use]
pub fn merge(
    design: &KnowledgeGraph,
    code: &KnowledgeGraph,
    component_name: &str,
) -> KnowledgeGraph {
    let mut merged = design.clone();

    for (id, attrs) in &code.nodes {
        match merged.nodes.get_mut(id) {
            Some(existing) => existing.fill_missing(attrs),
            None => {
                merged.nodes.insert(id.clone(), attrs.clone());
            }
        }
    }

    merged.edges.extend(code.edges.iter().cloned());

    if merged.base_url.is_none() {
        merged.base_url = code.base_url.clone();
    }

    if let Some(code_attrs) = code.nodes.get(component_name) {
        if let Some(target) = merged.nodes.get_mut(component_name) {
            target.absorb(code_attrs);
        }
    }

    merged
}
