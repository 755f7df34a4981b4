//! Knowledge graph model for BDD scenario generation
//!
//! Holds the directed labeled graph shared by the document and source
//! extraction passes, the design/code merge, the content hash that keys
//! every graph cache, and the test-order resolver.
//!
//! # Example
//!
//! ```rust
//! use bddgen_graph::{Edge, KnowledgeGraph, NodeType, Relation};
//!
//! let mut design = KnowledgeGraph::new();
//! design.ensure_node("Login", NodeType::Component).is_landing_page = true;
//! design.ensure_node("Dashboard", NodeType::Component);
//! design.push_edge(Edge::new("Login", "Dashboard", Relation::NavigatesTo));
//!
//! let files = vec!["Dashboard.js".to_string(), "Login.js".to_string()];
//! let order = bddgen_graph::resolve_test_order(&files, &design);
//! assert_eq!(order, vec!["Login.js".to_string(), "Dashboard.js".to_string()]);
//! ```

#![warn(unreachable_pub)]

pub mod graph;
pub mod hash;
pub mod merge;
pub mod order;

pub use graph::{Credentials, Edge, KnowledgeGraph, NodeAttrs, NodeType, Relation};
pub use hash::{ContentHash, HashParseError};
pub use merge::merge;
pub use order::{file_stem, resolve_test_order};
