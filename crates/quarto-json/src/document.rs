/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Immutable document storage.
//!
//! A [`Document`] is an arena of nodes addressed by [`NodeId`]. Containers
//! refer to their children by id, so the whole tree lives in one allocation
//! and can be shared between threads behind an `Arc` without locking.
//! Documents are only ever built by [`DocumentWriter`] (used by the parser
//! and by [`ValueBuilder`](crate::ValueBuilder)) and never change afterwards.

use crate::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Index of a node inside its [`Document`].
pub(crate) type NodeId = usize;

/// One element of a document tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Null,
    Bool(bool),
    Int64(i64),
    /// Unsigned integers that do not fit in `i64`
    Uint64(u64),
    Double(f64),
    String(String),
    Array(Vec<NodeId>),
    /// Keys are unique; iteration follows insertion order
    Object(IndexMap<String, NodeId>),
}

impl Node {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Bool(_) => NodeKind::Bool,
            Node::Int64(_) => NodeKind::Int64,
            Node::Uint64(_) => NodeKind::Uint64,
            Node::Double(_) => NodeKind::Double,
            Node::String(_) => NodeKind::String,
            Node::Array(_) => NodeKind::Array,
            Node::Object(_) => NodeKind::Object,
        }
    }
}

/// The tag of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Array,
    Object,
}

impl NodeKind {
    /// The name used for this kind in error messages.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Int64 => "int64",
            NodeKind::Uint64 => "uint64",
            NodeKind::Double => "double",
            NodeKind::String => "string",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Array | NodeKind::Object)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared, immutable backing storage for one parsed or built document.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// A value view of the document root.
    pub fn root(self: &Arc<Self>) -> Value {
        Value::from_root(Arc::clone(self))
    }

    /// Number of nodes in the document.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn root_id(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("root", &self.node(self.root).kind())
            .finish()
    }
}

/// Append-only writer that produces a [`Document`].
///
/// Children must be written before the container that refers to them, so
/// every id stored in a container is valid by construction.
#[derive(Debug, Default)]
pub(crate) struct DocumentWriter {
    nodes: Vec<Node>,
}

impl DocumentWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        debug_assert!(match &node {
            Node::Array(items) => items.iter().all(|id| *id < self.nodes.len()),
            Node::Object(entries) => entries.values().all(|id| *id < self.nodes.len()),
            _ => true,
        });
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn finish(self, root: NodeId) -> Arc<Document> {
        debug_assert!(root < self.nodes.len());
        Arc::new(Document {
            nodes: self.nodes,
            root,
        })
    }
}
