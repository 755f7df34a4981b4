//! Directed labeled knowledge graph
//!
//! Shared model for both graph sources: the design graph extracted from
//! a specification document and the code graph extracted from one UI
//! component's source. Node ids are strings (component name, route path,
//! API path, or element key); attributes are a fixed schema with an
//! explicit extension map.
//!
//! Two invariants matter here:
//! - a node's `type` is set exactly once at creation and never changes;
//! - edges are an append-only ordered multiset, never deduplicated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// UI component (e.g. `Login`, `Dashboard`)
    Component,
    /// Route path (e.g. `/dashboard`)
    Route,
    /// Backend API path
    Api,
    /// User action
    Action,
    /// Markup element inside a component
    Element,
}

/// Relation label on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    /// Source component navigates to the target
    NavigatesTo,
    /// Source component requires the target (login)
    Requires,
    /// Source component is mounted at the target route
    AtRoute,
    /// Source component calls the target API
    Uses,
    /// Source component contains the target element
    Contains,
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::NavigatesTo => "navigates-to",
            Relation::Requires => "requires",
            Relation::AtRoute => "at-route",
            Relation::Uses => "uses",
            Relation::Contains => "contains",
        };
        f.write_str(s)
    }
}

/// Login credentials attached to a landing-page node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Attributes of one node.
///
/// `node_type` is private: it is fixed at creation through
/// [`NodeAttrs::new`] / [`KnowledgeGraph::ensure_node`] and no merge or
/// extraction pass can rewrite it. Everything else is open to later
/// passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttrs {
    #[serde(rename = "type")]
    node_type: NodeType,
    /// Flagged as the application's initial entry point
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_landing_page: bool,
    /// Route path the component is mounted at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Component requires a login before it is reachable
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_login: bool,
    /// Credentials extracted from the design document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// HTTP method (api nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Markup tag (element nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Visible text (element nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Element carries a click/activation handler
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_action: bool,
    /// Extension map for attributes outside the recognized schema
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl NodeAttrs {
    /// Create attributes with the type fixed for the node's lifetime.
    #[inline]
    #[must_use]
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            is_landing_page: false,
            route: None,
            requires_login: false,
            credentials: None,
            method: None,
            tag: None,
            text: None,
            has_action: false,
            extra: BTreeMap::new(),
        }
    }

    /// Node type, fixed at creation.
    #[inline]
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Overlay `other`'s set attributes on top of this node.
    ///
    /// Every attribute `other` carries wins; the node type is untouched.
    pub fn absorb(&mut self, other: &NodeAttrs) {
        if other.is_landing_page {
            self.is_landing_page = true;
        }
        if other.route.is_some() {
            self.route = other.route.clone();
        }
        if other.requires_login {
            self.requires_login = true;
        }
        if other.credentials.is_some() {
            self.credentials = other.credentials.clone();
        }
        if other.method.is_some() {
            self.method = other.method.clone();
        }
        if other.tag.is_some() {
            self.tag = other.tag.clone();
        }
        if other.text.is_some() {
            self.text = other.text.clone();
        }
        if other.has_action {
            self.has_action = true;
        }
        for (k, v) in &other.extra {
            self.extra.insert(k.clone(), v.clone());
        }
    }

    /// Take `other`'s attributes only where this node has none set.
    ///
    /// Existing attributes keep precedence; the node type is untouched.
    pub fn fill_missing(&mut self, other: &NodeAttrs) {
        if other.is_landing_page {
            self.is_landing_page = true;
        }
        if self.route.is_none() {
            self.route = other.route.clone();
        }
        if other.requires_login {
            self.requires_login = true;
        }
        if self.credentials.is_none() {
            self.credentials = other.credentials.clone();
        }
        if self.method.is_none() {
            self.method = other.method.clone();
        }
        if self.tag.is_none() {
            self.tag = other.tag.clone();
        }
        if self.text.is_none() {
            self.text = other.text.clone();
        }
        if other.has_action {
            self.has_action = true;
        }
        for (k, v) in &other.extra {
            self.extra.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

/// One directed labeled edge. Append-only; duplicates are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    /// Trigger identifier for navigation edges (e.g. a `data-testid`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_id: Option<String>,
}

impl Edge {
    /// Create an edge without a navigation id.
    #[inline]
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation: Relation) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation,
            navigation_id: None,
        }
    }

    /// Attach the navigation trigger id.
    #[inline]
    #[must_use]
    pub fn with_navigation_id(mut self, id: impl Into<String>) -> Self {
        self.navigation_id = Some(id.into());
        self
    }
}

/// A directed labeled graph with an optional base URL.
///
/// Node iteration order is insertion order (and therefore deterministic
/// for identical input), which the test-order resolver and the
/// serialization format both rely on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: IndexMap<String, NodeAttrs>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the node with `id`, creating it with `node_type` if absent.
    ///
    /// An existing node keeps its original type: creation is the only
    /// point where `type` is ever written.
    pub fn ensure_node(&mut self, id: impl Into<String>, node_type: NodeType) -> &mut NodeAttrs {
        self.nodes
            .entry(id.into())
            .or_insert_with(|| NodeAttrs::new(node_type))
    }

    /// Look up a node by id.
    #[inline]
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeAttrs> {
        self.nodes.get(id)
    }

    /// Append an edge. Edges are never deduplicated.
    #[inline]
    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Outgoing edges of `id`, in append order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// First component node flagged as the landing page, if any.
    #[must_use]
    pub fn landing_page(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, attrs)| attrs.node_type() == NodeType::Component && attrs.is_landing_page)
            .map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_node_sets_type_once() {
        let mut graph = KnowledgeGraph::new();
        graph.ensure_node("Login", NodeType::Component);
        // A later pass asking for the same id with a different type must
        // not rewrite the original type.
        graph.ensure_node("Login", NodeType::Route);

        assert_eq!(graph.node("Login").unwrap().node_type(), NodeType::Component);
    }

    #[test]
    fn ensure_node_updates_other_attributes() {
        let mut graph = KnowledgeGraph::new();
        graph.ensure_node("Dashboard", NodeType::Component).route = Some("/dashboard".into());
        graph.ensure_node("Dashboard", NodeType::Component).requires_login = true;

        let node = graph.node("Dashboard").unwrap();
        assert_eq!(node.route.as_deref(), Some("/dashboard"));
        assert!(node.requires_login);
    }

    #[test]
    fn absorb_overwrites_but_keeps_type() {
        let mut design = NodeAttrs::new(NodeType::Component);
        design.route = Some("/old".into());

        let mut code = NodeAttrs::new(NodeType::Element);
        code.route = Some("/new".into());
        code.has_action = true;

        design.absorb(&code);
        assert_eq!(design.node_type(), NodeType::Component);
        assert_eq!(design.route.as_deref(), Some("/new"));
        assert!(design.has_action);
    }

    #[test]
    fn fill_missing_keeps_existing_values() {
        let mut design = NodeAttrs::new(NodeType::Component);
        design.route = Some("/design".into());

        let mut code = NodeAttrs::new(NodeType::Component);
        code.route = Some("/code".into());
        code.tag = Some("form".into());

        design.fill_missing(&code);
        assert_eq!(design.route.as_deref(), Some("/design"));
        assert_eq!(design.tag.as_deref(), Some("form"));
    }

    #[test]
    fn edges_allow_duplicates() {
        let mut graph = KnowledgeGraph::new();
        let edge = Edge::new("Login", "Dashboard", Relation::NavigatesTo);
        graph.push_edge(edge.clone());
        graph.push_edge(edge);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn landing_page_lookup() {
        let mut graph = KnowledgeGraph::new();
        graph.ensure_node("Dashboard", NodeType::Component);
        graph.ensure_node("Login", NodeType::Component).is_landing_page = true;
        // Route nodes are never landing pages even if flagged.
        graph.ensure_node("/", NodeType::Route).is_landing_page = true;

        assert_eq!(graph.landing_page(), Some("Login"));
    }

    #[test]
    fn relation_serializes_kebab_case() {
        let json = serde_json::to_string(&Relation::NavigatesTo).unwrap();
        assert_eq!(json, "\"navigates-to\"");
        let back: Relation = serde_json::from_str("\"at-route\"").unwrap();
        assert_eq!(back, Relation::AtRoute);
    }

    #[test]
    fn graph_serde_round_trip() {
        let mut graph = KnowledgeGraph::new();
        let login = graph.ensure_node("Login", NodeType::Component);
        login.is_landing_page = true;
        login.credentials = Some(Credentials {
            username: "user".into(),
            password: "pass".into(),
        });
        graph.ensure_node("/api/tasks", NodeType::Api).method = Some("GET".into());
        graph.push_edge(
            Edge::new("Login", "Dashboard", Relation::NavigatesTo).with_navigation_id("login-btn"),
        );
        graph.base_url = Some("http://localhost:3000".into());

        let json = serde_json::to_string(&graph).unwrap();
        let back: KnowledgeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(graph, back);
        // Wire format keeps the original field names.
        assert!(json.contains("\"isLandingPage\":true"));
        assert!(json.contains("\"navigationId\":\"login-btn\""));
        assert!(json.contains("\"baseUrl\""));
    }

    #[test]
    fn outgoing_preserves_append_order() {
        let mut graph = KnowledgeGraph::new();
        graph.push_edge(Edge::new("A", "B", Relation::NavigatesTo));
        graph.push_edge(Edge::new("C", "D", Relation::Uses));
        graph.push_edge(Edge::new("A", "E", Relation::Contains));

        let targets: Vec<&str> = graph.outgoing("A").map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["B", "E"]);
    }
}
