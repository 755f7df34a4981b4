//! Code graph builder
//!
//! Mines component source files for structural facts: the interactive
//! elements the component renders and the routes it navigates to. Like
//! the design side, the result is cached by content hash so unchanged
//! source never reparses.
//!
//! Also hosts the textual extractors used by the pipeline: the component
//! body slice sent to the generator and the docstring above the
//! component declaration.

use bddgen_graph::{ContentHash, Edge, KnowledgeGraph, NodeType, Relation};
use regex::Regex;
use std::sync::OnceLock;

use crate::collaborators::{SourceEntity, SourceParser};
use crate::error::Result;
use crate::store::{CacheStore, CachedGraph};

/// Placeholder used when a component carries no docstring.
pub const NO_DOCSTRING: &str = "No docstring provided.";

fn element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Open tag of an interactive element, attributes captured raw.
    RE.get_or_init(|| Regex::new(r"(?is)<(button|input|form)\b([^>]*)>").expect("static pattern"))
}

fn id_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bid\s*=\s*["']([^"']+)["']"#).expect("static pattern"))
}

fn action_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bon[cC]lick\b").expect("static pattern"))
}

fn navigation_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:\bnavigate|\.push)\s*\(\s*["']([^"']+)["']"#).expect("static pattern")
    })
}

/// Default [`SourceParser`]: regex scan over markup-style component
/// source. Good enough for the button/input/form and literal-route
/// subset the graph cares about; anything richer plugs in behind the
/// trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupScanner;

impl SourceParser for MarkupScanner {
    fn parse(&self, source: &str) -> Vec<SourceEntity> {
        let mut entities = Vec::new();

        for cap in element_re().captures_iter(source) {
            let whole = cap.get(0).expect("capture 0 always present");
            let tag = cap[1].to_lowercase();
            let attrs = &cap[2];
            let text = visible_text(source, whole.end(), &tag);
            let id = id_attr_re().captures(attrs).map(|c| c[1].to_string());
            entities.push(SourceEntity::Element {
                tag,
                text,
                id,
                has_action: action_attr_re().is_match(attrs),
                position: whole.start(),
            });
        }

        for cap in navigation_call_re().captures_iter(source) {
            entities.push(SourceEntity::Navigation {
                target: cap[1].to_string(),
            });
        }

        entities
    }
}

/// First non-empty text run between an open tag and the next `<`.
fn visible_text(source: &str, after_open: usize, tag: &str) -> Option<String> {
    // Void elements carry no child text.
    if tag == "input" {
        return None;
    }
    let rest = &source[after_open..];
    let end = rest.find('<').unwrap_or(rest.len());
    let text = rest[..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Builds the code knowledge graph for one component file.
pub struct CodeGraphBuilder<'a> {
    parser: &'a dyn SourceParser,
}

impl<'a> CodeGraphBuilder<'a> {
    #[inline]
    #[must_use]
    pub fn new(parser: &'a dyn SourceParser) -> Self {
        Self { parser }
    }

    /// Build (or fetch from cache) the code graph for `file_key`.
    pub fn build(
        &self,
        file_key: &str,
        code: &str,
        component_name: &str,
        cache: &mut CacheStore,
    ) -> Result<KnowledgeGraph> {
        let hash = ContentHash::of_text(code);
        if let Some(entry) = cache.doc.knowledge_graph.code.get(file_key) {
            if entry.hash == hash {
                tracing::info!(file = file_key, "using cached code knowledge graph");
                return Ok(entry.graph.clone());
            }
        }

        tracing::info!(component = component_name, "building code knowledge graph");
        let mut graph = KnowledgeGraph::new();
        graph.ensure_node(component_name, NodeType::Component);

        for entity in self.parser.parse(code) {
            match entity {
                SourceEntity::Element {
                    tag,
                    text,
                    id,
                    has_action,
                    position,
                } => {
                    let key = text
                        .clone()
                        .or(id)
                        .unwrap_or_else(|| format!("{tag}-{position}"));
                    let node = graph.ensure_node(key.clone(), NodeType::Element);
                    node.tag = Some(tag);
                    node.text = text;
                    if has_action {
                        node.has_action = true;
                    }
                    graph.push_edge(Edge::new(component_name, key, Relation::Contains));
                }
                SourceEntity::Navigation { target } => {
                    graph.ensure_node(target.clone(), NodeType::Route);
                    graph.push_edge(Edge::new(component_name, target, Relation::NavigatesTo));
                }
            }
        }

        cache.doc.knowledge_graph.code.insert(
            file_key.to_string(),
            CachedGraph {
                hash,
                graph: graph.clone(),
            },
        );
        cache.save()?;
        Ok(graph)
    }
}

fn declaration_re(component_name: &str) -> Result<Regex> {
    let name = regex::escape(component_name);
    Regex::new(&format!(
        r"(?m)^(?:export\s+(?:default\s+)?)?(?:function\s+{name}\b|(?:const|let|var)\s+{name}\s*=)"
    ))
    .map_err(|e| crate::error::Error::Config(format!("component name unusable in pattern: {e}")))
}

/// Slice out the component's own declaration from its source file.
///
/// The declaration is located by name and extended through its balanced
/// brace block. When no declaration is found (or braces never balance)
/// the whole file stands in for the component.
pub fn extract_component_code(code: &str, component_name: &str) -> Result<String> {
    let Some(m) = declaration_re(component_name)?.find(code) else {
        return Ok(code.to_string());
    };
    let start = m.start();
    let after = &code[start..];

    let Some(open_rel) = after.find('{') else {
        return Ok(code.to_string());
    };
    let mut depth = 0usize;
    for (i, ch) in after[open_rel..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let mut end = start + open_rel + i + 1;
                    // Take a trailing semicolon with the slice.
                    if code[end..].starts_with(';') {
                        end += 1;
                    }
                    return Ok(code[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    Ok(code.to_string())
}

/// Docstring immediately above the component declaration.
///
/// Accepts a `/* ... */` block or a run of `//` lines ending on the
/// line before the declaration; asterisks are stripped. Missing
/// docstrings yield [`NO_DOCSTRING`].
pub fn extract_docstring(code: &str, component_name: &str) -> Result<String> {
    let Some(m) = declaration_re(component_name)?.find(code) else {
        return Ok(NO_DOCSTRING.to_string());
    };
    let above = code[..m.start()].trim_end();

    if above.ends_with("*/") {
        if let Some(open) = above.rfind("/*") {
            let body = &above[open + 2..above.len() - 2];
            let cleaned = body.replace('*', "");
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() {
                return Ok(cleaned.to_string());
            }
        }
    } else {
        let mut lines: Vec<&str> = Vec::new();
        for line in above.lines().rev() {
            let trimmed = line.trim();
            if let Some(comment) = trimmed.strip_prefix("//") {
                lines.push(comment.trim());
            } else {
                break;
            }
        }
        if !lines.is_empty() {
            lines.reverse();
            return Ok(lines.join(" "));
        }
    }
    Ok(NO_DOCSTRING.to_string())
}
