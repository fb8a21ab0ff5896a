// SPDX-License-Identifier: Apache-2.0
//! Subscription leaves.
//!
//! A [`Query`] aggregates the callbacks registered for one canonical set of
//! key paths. It sits in the tree's table alongside nodes and acts as an
//! edge target: when the traversal reaches it through a changed path, it
//! fires every callback with the full new snapshot.

use std::fmt;

use crate::key_path::KeyPath;
use crate::node::QueryId;
use crate::value::Value;

/// Opaque handle identifying one registered callback within a query.
///
/// Tokens are issued by the tree and never reused; unsubscription presents
/// the token instead of a function identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackToken(pub(crate) u64);

/// A change callback; receives the full new snapshot, never a sub-view.
pub type Callback = Box<dyn FnMut(&Value)>;

/// One subscription registration: a set of key paths plus its callbacks.
pub struct Query {
    /// Canonical set id (`query:...`).
    pub(crate) id: QueryId,
    /// The normalized member paths this query depends on.
    pub(crate) key_paths: Vec<KeyPath>,
    /// Update-generation stamp of the last trigger, guarding against firing
    /// more than once within a single update pass.
    pub(crate) revision: u64,
    /// Registered callbacks in registration order.
    callbacks: Vec<(CallbackToken, Callback)>,
}

impl Query {
    /// Creates an empty query for a canonical path set.
    pub(crate) fn new(id: QueryId, key_paths: Vec<KeyPath>) -> Self {
        Query {
            id,
            key_paths,
            revision: 0,
            callbacks: Vec::new(),
        }
    }

    /// Registers a callback under a token.
    pub(crate) fn on(&mut self, token: CallbackToken, callback: Callback) {
        self.callbacks.push((token, callback));
    }

    /// Unregisters the callback for `token`. No-op if the token is absent
    /// (idempotent unsubscribe).
    pub(crate) fn off(&mut self, token: CallbackToken) {
        self.callbacks.retain(|(existing, _)| *existing != token);
    }

    /// True when no callbacks remain; an empty query must be pruned.
    pub(crate) fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invokes every registered callback, in registration order, with the
    /// full new snapshot.
    pub(crate) fn trigger(&mut self, snapshot: &Value) {
        for (_, callback) in &mut self.callbacks {
            callback(snapshot);
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("key_paths", &self.key_paths)
            .field("revision", &self.revision)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn query() -> Query {
        Query::new(
            QueryId(Arc::from("query:a.b")),
            vec![KeyPath::parse("a.b")],
        )
    }

    #[test]
    fn off_removes_only_matching_token() {
        let mut q = query();
        q.on(CallbackToken(1), Box::new(|_| {}));
        q.on(CallbackToken(2), Box::new(|_| {}));
        q.off(CallbackToken(1));
        assert!(!q.is_empty());
        q.off(CallbackToken(2));
        assert!(q.is_empty());
    }

    #[test]
    fn off_absent_token_is_noop() {
        let mut q = query();
        q.on(CallbackToken(1), Box::new(|_| {}));
        q.off(CallbackToken(99));
        assert!(!q.is_empty());
    }

    #[test]
    fn trigger_invokes_in_registration_order() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut q = query();
        for tag in 0u64..3 {
            let order = Rc::clone(&order);
            q.on(
                CallbackToken(tag),
                Box::new(move |_| order.borrow_mut().push(tag)),
            );
        }
        q.trigger(&Value::Null);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn trigger_passes_the_snapshot() {
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        let mut q = query();
        q.on(
            CallbackToken(0),
            Box::new(move |snapshot| flag.set(snapshot.get("a").get("b") == Value::Int(1))),
        );
        q.trigger(&Value::object([(
            "a",
            Value::object([("b", Value::Int(1))]),
        )]));
        assert!(seen.get());
    }
}
