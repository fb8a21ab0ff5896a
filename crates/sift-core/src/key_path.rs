// SPDX-License-Identifier: Apache-2.0
//! Key-path parsing, canonicalization, and id derivation.
//!
//! A [`KeyPath`] locates a value inside a nested snapshot. Subscriptions name
//! one or more paths via a [`PathSpec`], which is resolved exactly once at
//! the boundary into a canonical sorted list of paths ([`normalize`]); the
//! engine never branches on spec shape past that point.
//!
//! Two id spaces are derived here and must stay disjoint, because node and
//! query entries share one table:
//!
//! - **Node ids** are root-relative: the root sentinel [`ROOT_ID`] (`~`)
//!   followed by `.`-joined segments (`~.users.0.name`).
//! - **Query ids** carry the `query:` prefix over the sorted, `,`-joined
//!   member paths (`query:a.b,c`).
//!
//! The `~` prefix on every node id is what keeps the spaces disjoint even
//! when a snapshot key itself starts with `query:`.

use std::collections::BTreeMap;

/// Reserved id for the root node of the dependency tree.
pub const ROOT_ID: &str = "~";

/// Separator between segments inside one key string.
const KEY_DELIMITER: char = '.';

/// Separator between paths inside one canonical set id.
const PATH_DELIMITER: char = ',';

/// An ordered sequence of string segments locating a value in a snapshot.
///
/// The empty path addresses the whole snapshot (the root).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The empty path, addressing the whole snapshot.
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    /// Builds a path from individual segments.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(segments: I) -> Self {
        KeyPath(segments.into_iter().map(Into::into).collect())
    }

    /// Parses dotted syntax (`"a.b.c"`). Blank input yields the root path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return KeyPath::root();
        }
        KeyPath(trimmed.split(KEY_DELIMITER).map(str::to_owned).collect())
    }

    /// The path's segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True for the empty (whole-snapshot) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The `.`-joined key string used inside canonical set ids.
    ///
    /// The root path renders as the empty string here; node-table addressing
    /// goes through [`KeyPath::node_id`] instead.
    pub fn key_string(&self) -> String {
        self.0.join(".")
    }

    /// The node-table id for the deepest node of this path.
    ///
    /// Root-relative: `~` for the root path, `~.a.b` otherwise.
    pub fn node_id(&self) -> String {
        let mut id = String::from(ROOT_ID);
        for segment in &self.0 {
            id.push(KEY_DELIMITER);
            id.push_str(segment);
        }
        id
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        KeyPath::parse(raw)
    }
}

/// A subscription's path specification, resolved once at the boundary.
///
/// Consumers rarely construct this directly — the `From` impls cover the
/// usual shapes: a single dotted string (commas separate multiple paths),
/// a list of paths, or a named mapping whose values are paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    /// One key path.
    One(KeyPath),
    /// An explicit list of key paths.
    Many(Vec<KeyPath>),
    /// A mapping whose values are key paths; names are ignored for identity.
    Named(BTreeMap<String, KeyPath>),
}

impl From<KeyPath> for PathSpec {
    fn from(path: KeyPath) -> Self {
        PathSpec::One(path)
    }
}

impl From<&str> for PathSpec {
    /// Parses `"a.b"` as one path, `"a.b, c"` as two.
    fn from(raw: &str) -> Self {
        let paths: Vec<KeyPath> = raw.split(PATH_DELIMITER).map(KeyPath::parse).collect();
        match <[KeyPath; 1]>::try_from(paths) {
            Ok([only]) => PathSpec::One(only),
            Err(paths) => PathSpec::Many(paths),
        }
    }
}

impl From<Vec<KeyPath>> for PathSpec {
    fn from(paths: Vec<KeyPath>) -> Self {
        PathSpec::Many(paths)
    }
}

impl From<Vec<&str>> for PathSpec {
    fn from(paths: Vec<&str>) -> Self {
        PathSpec::Many(paths.into_iter().map(KeyPath::parse).collect())
    }
}

impl From<BTreeMap<String, KeyPath>> for PathSpec {
    fn from(named: BTreeMap<String, KeyPath>) -> Self {
        PathSpec::Named(named)
    }
}

/// Resolves a spec into the canonical ordered list of member paths.
///
/// Deterministic and side-effect-free: paths are sorted and de-duplicated,
/// which is what makes [`set_id`] independent of the order (and duplication)
/// in which the caller listed them.
pub fn normalize(spec: &PathSpec) -> Vec<KeyPath> {
    let mut paths: Vec<KeyPath> = match spec {
        PathSpec::One(path) => vec![path.clone()],
        PathSpec::Many(paths) => paths.clone(),
        PathSpec::Named(named) => named.values().cloned().collect(),
    };
    paths.sort();
    paths.dedup();
    paths
}

/// Canonical, order-independent identity for a set of key paths.
///
/// Expects the output of [`normalize`]; the `query:` prefix keeps query ids
/// disjoint from node ids (see module docs).
pub fn set_id(paths: &[KeyPath]) -> String {
    let mut id = String::from("query:");
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            id.push(PATH_DELIMITER);
        }
        id.push_str(&path.key_string());
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_dots() {
        assert_eq!(KeyPath::parse("a.b.c").segments(), ["a", "b", "c"]);
    }

    #[test]
    fn parse_blank_is_root() {
        assert!(KeyPath::parse("").is_root());
        assert!(KeyPath::parse("   ").is_root());
    }

    #[test]
    fn node_ids_are_root_relative() {
        assert_eq!(KeyPath::root().node_id(), "~");
        assert_eq!(KeyPath::parse("a.b").node_id(), "~.a.b");
    }

    #[test]
    fn spec_from_str_splits_on_commas() {
        let spec = PathSpec::from("a.b, c");
        assert_eq!(
            normalize(&spec),
            vec![KeyPath::parse("a.b"), KeyPath::parse("c")]
        );
    }

    #[test]
    fn normalize_sorts_and_dedupes() {
        let spec = PathSpec::from(vec!["c", "a.b", "c"]);
        assert_eq!(
            normalize(&spec),
            vec![KeyPath::parse("a.b"), KeyPath::parse("c")]
        );
    }

    #[test]
    fn normalize_named_uses_values_only() {
        let mut named = BTreeMap::new();
        named.insert(String::from("user"), KeyPath::parse("users.0"));
        named.insert(String::from("count"), KeyPath::parse("stats.count"));
        let spec = PathSpec::from(named);
        assert_eq!(
            normalize(&spec),
            vec![KeyPath::parse("stats.count"), KeyPath::parse("users.0")]
        );
    }

    #[test]
    fn set_id_is_order_independent() {
        let forward = normalize(&PathSpec::from("a.b, c"));
        let backward = normalize(&PathSpec::from("c, a.b"));
        assert_eq!(set_id(&forward), set_id(&backward));
        assert_eq!(set_id(&forward), "query:a.b,c");
    }

    #[test]
    fn distinct_sets_get_distinct_ids() {
        let one = normalize(&PathSpec::from("a.b"));
        let other = normalize(&PathSpec::from("a, b"));
        assert_ne!(set_id(&one), set_id(&other));
    }

    #[test]
    fn root_subscription_id_is_bare_prefix() {
        let paths = normalize(&PathSpec::One(KeyPath::root()));
        assert_eq!(set_id(&paths), "query:");
    }

    #[test]
    fn query_ids_cannot_collide_with_node_ids() {
        // A snapshot key literally named "query:a" produces a node id with
        // the `~.` prefix, so the two id spaces stay disjoint.
        assert_eq!(KeyPath::parse("query:a").node_id(), "~.query:a");
        let paths = normalize(&PathSpec::from("a"));
        assert_eq!(set_id(&paths), "query:a");
    }
}
