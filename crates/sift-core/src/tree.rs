// SPDX-License-Identifier: Apache-2.0
//! The change-detection engine.
//!
//! [`ChangeTree`] owns the current snapshot and a single table mapping
//! canonical ids to entries — interior [`Node`]s keyed by root-relative path
//! ids, and leaf [`Query`]s keyed by `query:`-prefixed set ids. Branches are
//! materialized lazily on first subscribe and shared across subscriptions
//! with overlapping prefixes; they are pruned again when the last callback
//! for a path set goes away.
//!
//! `update` runs one explicit-stack depth-first pass comparing the previous
//! and next snapshot level by level. An unchanged level (see
//! [`Value::same`]) terminates the descent for its whole subtree, which is
//! the engine's core performance property: unchanged branches cost O(1)
//! regardless of how many subscribers sit beneath them.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::key_path::{self, KeyPath, PathSpec, ROOT_ID};
use crate::node::{Edge, Node, NodeId, QueryId};
use crate::query::{Callback, CallbackToken, Query};
use crate::value::Value;

/// A node-or-query entry in the shared table.
///
/// The two id spaces are structurally disjoint (root-relative vs
/// `query:`-prefixed), so one table can hold both without collisions.
#[derive(Debug)]
enum Entry {
    Node(Node),
    Query(Query),
}

/// Handle returned by [`ChangeTree::on`], identifying the registration.
///
/// The `query` id is shared by every subscription over the same
/// (order-independent) set of paths; the `token` identifies this particular
/// callback within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Canonical id of the query this callback was registered on.
    pub query: QueryId,
    /// Token to present to [`ChangeTree::off`].
    pub token: CallbackToken,
}

/// Incremental change-detection over a linear sequence of snapshots.
///
/// Single-threaded and synchronous: `update` takes `&mut self`, so the
/// borrow checker enforces the non-reentrancy discipline the traversal
/// assumes. Callbacks receive the full new snapshot and re-derive whatever
/// sub-view they need.
pub struct ChangeTree {
    /// The most recent snapshot; replaced wholesale on every update.
    snapshot: Value,
    /// All live nodes and queries, keyed by canonical id.
    nodes: FxHashMap<Arc<str>, Entry>,
    /// Update pass counter; stamps queries so each fires at most once per
    /// pass even when several of its paths changed.
    generation: u64,
    /// Source of never-reused callback tokens.
    next_token: u64,
}

impl ChangeTree {
    /// Creates an engine with an initial snapshot and no subscriptions.
    pub fn new(initial: impl Into<Value>) -> Self {
        ChangeTree {
            snapshot: initial.into(),
            nodes: FxHashMap::default(),
            generation: 0,
            next_token: 0,
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Number of live entries (nodes plus queries). Zero once every
    /// subscription has been removed — pruning leaks nothing.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no nodes or queries are live.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the table holds an entry under `id` (node or query).
    /// Intended for leak checks and diagnostics.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Subscribes `callback` to changes at every path named by `spec`.
    ///
    /// The spec is normalized once; subscriptions over the same set of paths
    /// — in any order, with any duplication — share a single query. The node
    /// chain for each path is created on demand, reusing prefixes already
    /// materialized by earlier subscriptions.
    ///
    /// The callback sees only snapshots applied *after* this call.
    pub fn on<S, F>(&mut self, spec: S, callback: F) -> Subscription
    where
        S: Into<PathSpec>,
        F: FnMut(&Value) + 'static,
    {
        let paths = key_path::normalize(&spec.into());
        let id = key_path::set_id(&paths);
        let query = self.ensure_query(&id, &paths);

        for path in &paths {
            let deepest = self.track(path);
            self.connect(&deepest, Edge::Query(query.clone()));
        }

        let token = CallbackToken(self.next_token);
        self.next_token += 1;
        self.register(&query, token, Box::new(callback));

        debug!(query = %query, paths = paths.len(), "subscribed");
        Subscription { query, token }
    }

    /// Removes the callback registered under `token` for the path set named
    /// by `spec`.
    ///
    /// The spec must match the one passed to [`ChangeTree::on`] up to path
    /// order and duplication — both normalize to the same canonical id. A
    /// spec that was never subscribed, or a token already removed, is a
    /// no-op. When the last callback goes, the query and every node left
    /// without downstream edges are pruned.
    pub fn off<S: Into<PathSpec>>(&mut self, spec: S, token: CallbackToken) {
        let paths = key_path::normalize(&spec.into());
        let id = key_path::set_id(&paths);

        let emptied = match self.nodes.get_mut(id.as_str()) {
            Some(Entry::Query(query)) => {
                query.off(token);
                query.is_empty()
            }
            _ => return,
        };

        debug!(query = %id, emptied, "unsubscribed");
        if emptied {
            self.prune(&id);
        }
    }

    /// Applies the next snapshot and notifies affected subscriptions.
    ///
    /// The previous snapshot is retained only for the duration of this call.
    /// Each query fires at most once, with the full new snapshot, and only
    /// when the value chain down to one of its paths actually changed.
    pub fn update(&mut self, next: impl Into<Value>) {
        let next = next.into();
        let last = std::mem::replace(&mut self.snapshot, next.clone());
        self.generation += 1;
        trace!(generation = self.generation, "update");

        let root = match self.nodes.get_key_value(ROOT_ID) {
            Some((key, _)) => NodeId(Arc::clone(key)),
            None => return,
        };

        // Cheap handle for trigger delivery; `self.snapshot` stays borrowed
        // only for the clone.
        let snapshot = self.snapshot.clone();

        let mut stack = vec![(root, last, next)];
        while let Some((node_id, last, next)) = stack.pop() {
            if Value::same(&last, &next) {
                continue;
            }

            // Defensive copy: a callback fired below may subscribe or
            // unsubscribe, mutating edge sets out from under us.
            let (revision, edges) = match self.nodes.get_mut(node_id.as_str()) {
                Some(Entry::Node(node)) => {
                    node.revision += 1;
                    (node.revision, node.edges().to_vec())
                }
                _ => continue,
            };
            trace!(node = %node_id, revision, "changed");

            for edge in edges {
                match edge {
                    Edge::Query(query_id) => {
                        if let Some(Entry::Query(query)) =
                            self.nodes.get_mut(query_id.as_str())
                        {
                            if query.revision < self.generation {
                                query.revision = self.generation;
                                query.trigger(&snapshot);
                            }
                        }
                    }
                    Edge::Node(child_id) => {
                        let key = match self.nodes.get(child_id.as_str()) {
                            Some(Entry::Node(child)) => child.key.clone(),
                            _ => continue,
                        };
                        // Null on either side propagates Null into children
                        // rather than faulting.
                        stack.push((child_id, last.get(&key), next.get(&key)));
                    }
                }
            }
        }
    }

    /// Find-or-create the query entry for a canonical id.
    fn ensure_query(&mut self, id: &str, paths: &[KeyPath]) -> QueryId {
        if let Some((key, Entry::Query(_))) = self.nodes.get_key_value(id) {
            return QueryId(Arc::clone(key));
        }
        let key: Arc<str> = Arc::from(id);
        let query_id = QueryId(Arc::clone(&key));
        self.nodes.insert(
            key,
            Entry::Query(Query::new(query_id.clone(), paths.to_vec())),
        );
        query_id
    }

    /// Find-or-create the node entry for a canonical id.
    fn ensure_node(&mut self, id: &str, key: &str, parent: Option<NodeId>) -> NodeId {
        if let Some((existing, Entry::Node(_))) = self.nodes.get_key_value(id) {
            return NodeId(Arc::clone(existing));
        }
        let table_key: Arc<str> = Arc::from(id);
        let node_id = NodeId(Arc::clone(&table_key));
        self.nodes.insert(
            table_key,
            Entry::Node(Node::new(node_id.clone(), key, parent)),
        );
        node_id
    }

    /// Builds (or reuses) the node chain for one key path and returns the
    /// deepest node. Prefixes shared with existing chains are reused, which
    /// keeps the tree sub-linear in the number of overlapping subscriptions.
    fn track(&mut self, path: &KeyPath) -> NodeId {
        let mut current = self.ensure_node(ROOT_ID, "", None);
        let mut base = String::from(ROOT_ID);
        for segment in path.segments() {
            base.push('.');
            base.push_str(segment);
            let child = self.ensure_node(&base, segment, Some(current.clone()));
            self.connect(&current, Edge::Node(child.clone()));
            current = child;
        }
        current
    }

    /// Adds an edge to a node entry. Idempotent.
    fn connect(&mut self, node: &NodeId, edge: Edge) {
        if let Some(Entry::Node(entry)) = self.nodes.get_mut(node.as_str()) {
            entry.connect(edge);
        }
    }

    /// Registers a callback on a query entry.
    fn register(&mut self, query: &QueryId, token: CallbackToken, callback: Callback) {
        if let Some(Entry::Query(entry)) = self.nodes.get_mut(query.as_str()) {
            entry.on(token, callback);
        }
    }

    /// Removes an emptied query and every node its paths leave behind.
    ///
    /// For each member path: disconnect the query edge at the deepest node,
    /// then walk parent handles upward, deleting each node that is left
    /// without edges. The walk stops at the first ancestor that still has
    /// other edges — pruning is lazy and local, never a rebuild.
    fn prune(&mut self, id: &str) {
        let (query_id, key_paths) = match self.nodes.get(id) {
            Some(Entry::Query(query)) => (query.id.clone(), query.key_paths.clone()),
            _ => return,
        };

        for path in &key_paths {
            let deepest = path.node_id();
            let mut cursor = match self.nodes.get_key_value(deepest.as_str()) {
                Some((key, Entry::Node(_))) => Some(NodeId(Arc::clone(key))),
                _ => None,
            };

            if let Some(node) = &cursor {
                let edge = Edge::Query(query_id.clone());
                if let Some(Entry::Node(entry)) = self.nodes.get_mut(node.as_str()) {
                    entry.disconnect(&edge);
                }
            }

            while let Some(node_id) = cursor {
                let (alone, parent) = match self.nodes.get(node_id.as_str()) {
                    Some(Entry::Node(node)) => (node.is_alone(), node.parent.clone()),
                    _ => break,
                };
                if !alone {
                    break;
                }
                if let Some(parent_id) = &parent {
                    let edge = Edge::Node(node_id.clone());
                    if let Some(Entry::Node(entry)) = self.nodes.get_mut(parent_id.as_str()) {
                        entry.disconnect(&edge);
                    }
                }
                trace!(node = %node_id, "pruned");
                self.nodes.remove(node_id.as_str());
                cursor = parent;
            }
        }

        trace!(query = %query_id, "pruned");
        self.nodes.remove(id);
    }
}

impl std::fmt::Debug for ChangeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTree")
            .field("entries", &self.nodes.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
