// SPDX-License-Identifier: Apache-2.0
//! Dependency-tree vertices and edges.
//!
//! A [`Node`] represents one path segment in the subscription tree. Nodes do
//! not own each other — the tree's table is the sole owner — so ids are
//! cheap-clone [`Arc<str>`] handles and the parent back-reference is a
//! non-owning [`NodeId`] used only for upward pruning walks.

use std::fmt;
use std::sync::Arc;

/// Handle to a node entry in the tree's table.
///
/// Node ids are root-relative path strings (`~`, `~.a`, `~.a.b`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Arc<str>);

impl NodeId {
    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?})", &*self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a query entry in the tree's table.
///
/// Query ids carry the `query:` prefix, keeping them disjoint from node ids
/// inside the shared table.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct QueryId(pub(crate) Arc<str>);

impl QueryId {
    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryId({:?})", &*self.0)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One downstream edge of a node.
///
/// The traversal matches on the variant: child nodes are descended into,
/// queries are fired. An explicit sum type here replaces runtime type
/// inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    /// A child node one segment deeper.
    Node(NodeId),
    /// A subscription attached at this depth.
    Query(QueryId),
}

/// One vertex of the subscription tree, covering a single path segment.
#[derive(Debug)]
pub struct Node {
    /// Root-relative id of this node.
    pub(crate) id: NodeId,
    /// This node's own segment key (empty for the root).
    pub(crate) key: String,
    /// Non-owning handle to the parent node; `None` for the root.
    pub(crate) parent: Option<NodeId>,
    /// Bumped whenever the value at this node's path differs between two
    /// compared snapshots. Monotonically non-decreasing.
    pub(crate) revision: u64,
    /// Downstream edges. Order is irrelevant; the set stays small enough
    /// that a `Vec` beats a hash set.
    edges: Vec<Edge>,
}

impl Node {
    /// Creates a disconnected node with revision zero.
    pub(crate) fn new(id: NodeId, key: &str, parent: Option<NodeId>) -> Self {
        Node {
            id,
            key: key.to_owned(),
            parent,
            revision: 0,
            edges: Vec::new(),
        }
    }

    /// Adds a downstream edge. Idempotent: re-connecting an existing edge is
    /// a no-op.
    pub(crate) fn connect(&mut self, edge: Edge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    /// Removes a downstream edge. No-op if the edge is not present.
    pub(crate) fn disconnect(&mut self, edge: &Edge) {
        self.edges.retain(|existing| existing != edge);
    }

    /// True when no downstream edge depends on this node, making it garbage.
    pub(crate) fn is_alone(&self) -> bool {
        self.edges.is_empty()
    }

    /// The current downstream edges.
    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
