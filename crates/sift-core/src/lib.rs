// SPDX-License-Identifier: Apache-2.0
//! sift-core: incremental key-path change detection over immutable snapshots.
//!
//! Given a linear sequence of immutable snapshots of a nested value, the
//! engine lets consumers subscribe to specific key paths and be notified
//! exactly when the values reachable at those paths change — without
//! re-diffing the whole structure per update, and without false positives
//! for unrelated mutations.
//!
//! Subscriptions over overlapping paths share node chains (structural
//! sharing), so the dependency tree stays sub-linear in subscription count.
//! Each update runs one depth-first comparison pass that skips any branch
//! whose value is unchanged at that level, making untouched subtrees cost
//! O(1) regardless of how many subscribers sit beneath them.
//!
//! # Quick Start
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use serde_json::json;
//! use sift_core::{ChangeTree, Value};
//!
//! let mut tree = ChangeTree::new(Value::Null);
//!
//! let hits = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&hits);
//! let sub = tree.on("a.b", move |_snapshot| seen.set(seen.get() + 1));
//!
//! // `a.b` appears: the callback fires with the full snapshot.
//! tree.update(json!({"a": {"b": 1, "c": 1}}));
//! assert_eq!(hits.get(), 1);
//!
//! // Only `a.c` changed; `a.b` is untouched, so no notification.
//! tree.update(json!({"a": {"b": 1, "c": 2}}));
//! assert_eq!(hits.get(), 1);
//!
//! tree.off("a.b", sub.token);
//! ```
//!
//! # Concurrency
//!
//! Single-threaded by design. `update` takes `&mut self`, so the borrow
//! checker rules out re-entrant updates; callbacks that need to subscribe or
//! unsubscribe must defer that work until the update call returns.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::manual_let_else,
    clippy::needless_pass_by_value,
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening,
    clippy::multiple_crate_versions
)]

pub mod key_path;
mod node;
mod query;
pub mod registration;
mod tree;
mod value;

pub use key_path::{KeyPath, PathSpec, ROOT_ID};
pub use node::{Edge, NodeId, QueryId};
pub use query::CallbackToken;
pub use registration::{get_registration, RegistrationError, Status};
pub use tree::{ChangeTree, Subscription};
pub use value::Value;
