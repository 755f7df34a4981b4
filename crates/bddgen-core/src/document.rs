//! Design graph builder
//!
//! Extracts the design knowledge graph from a specification document:
//! the text is chunked at numbered headings, each chunk is scanned for
//! component candidates, and a structural regex is allowed to fire only
//! after the chunk passes a semantic-similarity gate against a canonical
//! query phrase. The resulting graph is cached by content hash; a cache
//! hit performs no extraction and no embedding calls.
//!
//! The 0.6 gate and the regex-after-gate order are a contract: changing
//! either changes extraction results materially.

use bddgen_graph::{ContentHash, Credentials, Edge, KnowledgeGraph, NodeType, Relation};
use regex::Regex;
use std::sync::OnceLock;

use crate::collaborators::Embedder;
use crate::error::Result;
use crate::similarity::cosine_similarity;
use crate::store::{CacheStore, CachedGraph};

/// Similarity threshold a chunk must clear before a structural regex
/// may fire.
pub const SIMILARITY_GATE: f32 = 0.6;

/// Canonical query phrase marking the landing page.
pub(crate) const QUERY_LANDING_PAGE: &str = "is the first page";
const QUERY_NAVIGATION: &str = "navigates-to";
const QUERY_REQUIRES_LOGIN: &str = "requires login";
const QUERY_API: &str = "API:";

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+\.\s|\d+\.\d+\s)").expect("static pattern"))
}

fn component_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([A-Z][a-zA-Z]+)\s+Page").expect("static pattern"))
}

fn navigation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)navigates-to\s+([A-Za-z]+)\s+with\s+button\s+data-testid="([^"]+)""#)
            .expect("static pattern")
    })
}

fn requires_login_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Requires:\s*Login").expect("static pattern"))
}

fn route_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Route:\s*[A-Za-z]+\s+at\s+(/[a-z/]*)").expect("static pattern"))
}

fn api_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:GET|POST|PUT|DELETE)?\s*/api/[a-z/<>-]+").expect("static pattern")
    })
}

fn api_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(GET|POST|PUT|DELETE)").expect("static pattern"))
}

fn credentials_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"username "([^"]+)" and password "([^"]+)""#).expect("static pattern")
    })
}

fn base_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Base URL: (http://localhost:[0-9]+)").expect("static pattern"))
}

/// Split document text into chunks at numbered-heading lines.
///
/// A heading line (`1. `, `1.1 `, ...) closes the running chunk and
/// starts the next one; lines are trimmed and joined with spaces. Text
/// with no headings yields a single chunk.
#[must_use]
pub fn chunk_document(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if heading_re().is_match(line) && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
        }
        current.push(line.trim());
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Embeddings of the canonical query phrases, computed once per build.
struct QueryEmbeddings {
    landing: Vec<f32>,
    navigation: Vec<f32>,
    requires_login: Vec<f32>,
    api: Vec<f32>,
}

/// Entities and relations extracted from one chunk.
#[derive(Default)]
struct ChunkExtraction {
    components: Vec<String>,
    routes: Vec<String>,
    apis: Vec<String>,
    credentials: Option<Credentials>,
    base_url: Option<String>,
    relations: Vec<Edge>,
    /// Chunk cleared the landing-page similarity gate
    landing_hit: bool,
}

/// Builds the design knowledge graph from document text.
pub struct DesignGraphBuilder<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> DesignGraphBuilder<'a> {
    /// Create a builder over the given embedding collaborator.
    #[inline]
    #[must_use]
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Build (or fetch from cache) the design graph for `doc_key`.
    ///
    /// Identical document text always short-circuits to the cached
    /// graph without touching the embedder.
    pub async fn build(
        &self,
        doc_key: &str,
        full_text: &str,
        cache: &mut CacheStore,
    ) -> Result<KnowledgeGraph> {
        let hash = ContentHash::of_text(full_text);
        if let Some(entry) = cache.doc.knowledge_graph.design.get(doc_key) {
            if entry.hash == hash {
                tracing::info!(doc = doc_key, hash = %hash.short(), "using cached design knowledge graph");
                return Ok(entry.graph.clone());
            }
        }

        tracing::info!(doc = doc_key, "building design knowledge graph with semantic search");
        let queries = self.query_embeddings().await?;
        let mut graph = KnowledgeGraph::new();

        for chunk in chunk_document(full_text) {
            let extraction = self.extract_chunk(&chunk, &queries).await?;
            Self::apply_chunk(&mut graph, &extraction);
        }

        self.mark_landing_page(&mut graph, full_text, &queries).await?;

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            base_url = graph.base_url.as_deref().unwrap_or("none"),
            "design graph built"
        );

        cache.doc.knowledge_graph.design.insert(
            doc_key.to_string(),
            CachedGraph {
                hash,
                graph: graph.clone(),
            },
        );
        cache.save()?;
        Ok(graph)
    }

    async fn query_embeddings(&self) -> Result<QueryEmbeddings> {
        Ok(QueryEmbeddings {
            landing: self.embedder.embed(QUERY_LANDING_PAGE).await?,
            navigation: self.embedder.embed(QUERY_NAVIGATION).await?,
            requires_login: self.embedder.embed(QUERY_REQUIRES_LOGIN).await?,
            api: self.embedder.embed(QUERY_API).await?,
        })
    }

    /// Extract entities and relations from one chunk.
    async fn extract_chunk(
        &self,
        chunk: &str,
        queries: &QueryEmbeddings,
    ) -> Result<ChunkExtraction> {
        let chunk_embedding = self.embedder.embed(chunk).await?;
        let mut out = ChunkExtraction::default();

        for cap in component_re().captures_iter(chunk) {
            let name = cap[1].to_string();
            // "first" and "other" are phrase fragments, not components.
            if name != "first" && name != "other" && !out.components.contains(&name) {
                out.components.push(name);
            }
        }

        out.landing_hit =
            cosine_similarity(&chunk_embedding, &queries.landing) > SIMILARITY_GATE;
        let navigation_hit =
            cosine_similarity(&chunk_embedding, &queries.navigation) > SIMILARITY_GATE;
        let requires_hit =
            cosine_similarity(&chunk_embedding, &queries.requires_login) > SIMILARITY_GATE;
        let api_hit = cosine_similarity(&chunk_embedding, &queries.api) > SIMILARITY_GATE;

        // Navigation targets discovered below join the candidate list
        // and are themselves scanned, so iterate by index.
        let mut i = 0;
        while i < out.components.len() {
            let component = out.components[i].clone();

            if navigation_hit {
                for nav in navigation_re().captures_iter(chunk) {
                    let target = capitalize(&nav[1]);
                    let navigation_id = nav[2].to_string();
                    if !out.components.contains(&target) {
                        out.components.push(target.clone());
                    }
                    tracing::debug!(from = %component, to = %target, id = %navigation_id, "detected navigation");
                    out.relations.push(
                        Edge::new(component.clone(), target, Relation::NavigatesTo)
                            .with_navigation_id(navigation_id),
                    );
                }
            }

            if requires_hit || requires_login_re().is_match(chunk) {
                out.relations
                    .push(Edge::new(component.clone(), "Login", Relation::Requires));
            }

            if let Some(m) = route_re().captures(chunk) {
                let route = m[1].to_string();
                out.routes.push(route.clone());
                out.relations
                    .push(Edge::new(component.clone(), route, Relation::AtRoute));
            }

            if api_hit {
                if let Some(m) = api_re().find(chunk) {
                    let api_path = m.as_str().trim().to_string();
                    out.apis.push(api_path.clone());
                    out.relations
                        .push(Edge::new(component.clone(), api_path, Relation::Uses));
                }
            }

            i += 1;
        }

        if !out.components.is_empty() {
            out.credentials = credentials_re().captures(chunk).map(|c| Credentials {
                username: c[1].to_string(),
                password: c[2].to_string(),
            });
        }
        out.base_url = base_url_re().captures(chunk).map(|c| c[1].to_string());

        Ok(out)
    }

    /// Fold one chunk's extraction into the graph.
    fn apply_chunk(graph: &mut KnowledgeGraph, extraction: &ChunkExtraction) {
        for component in &extraction.components {
            let node = graph.ensure_node(component.clone(), NodeType::Component);
            if extraction.credentials.is_some() && extraction.landing_hit {
                node.credentials = extraction.credentials.clone();
                node.is_landing_page = true;
            }
        }

        for route in &extraction.routes {
            graph.ensure_node(route.clone(), NodeType::Route);
        }

        for api in &extraction.apis {
            let method = api_method_re()
                .find(api)
                .map_or("GET", |m| m.as_str())
                .to_uppercase();
            graph.ensure_node(api.clone(), NodeType::Api).method = Some(method);
        }

        if graph.base_url.is_none() {
            graph.base_url = extraction.base_url.clone();
        }

        for rel in &extraction.relations {
            match rel.relation {
                Relation::AtRoute => {
                    if let Some(node) = graph.nodes.get_mut(&rel.from) {
                        node.route = Some(rel.to.clone());
                    }
                }
                Relation::Requires => {
                    if let Some(node) = graph.nodes.get_mut(&rel.from) {
                        node.requires_login = true;
                    }
                }
                _ => {}
            }
            graph.push_edge(rel.clone());
        }
    }

    /// Whole-document landing-page pass with the Login fallback.
    async fn mark_landing_page(
        &self,
        graph: &mut KnowledgeGraph,
        full_text: &str,
        queries: &QueryEmbeddings,
    ) -> Result<()> {
        let component_ids: Vec<String> = graph
            .nodes
            .iter()
            .filter(|(_, attrs)| attrs.node_type() == NodeType::Component)
            .map(|(id, _)| id.clone())
            .collect();

        let mut landing_set = false;
        if !component_ids.is_empty() {
            let doc_embedding = self.embedder.embed(full_text).await?;
            let doc_similarity = cosine_similarity(&doc_embedding, &queries.landing);
            let lower_text = full_text.to_lowercase();

            for id in component_ids {
                if !lower_text.contains(&id.to_lowercase()) {
                    continue;
                }
                let literal = format!("{} at /", id.to_lowercase());
                if doc_similarity > SIMILARITY_GATE || full_text.contains(&literal) {
                    if let Some(node) = graph.nodes.get_mut(&id) {
                        node.is_landing_page = true;
                        landing_set = true;
                        tracing::info!(component = %id, "identified landing page");
                    }
                }
            }
        }

        if !landing_set {
            if let Some(login) = graph.nodes.get_mut("Login") {
                login.is_landing_page = true;
                tracing::info!("no landing page detected; defaulting to Login");
            }
        }
        Ok(())
    }
}
