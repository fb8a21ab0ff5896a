// SPDX-License-Identifier: Apache-2.0
//! Property tests for canonical path-set identity.

use proptest::prelude::*;

use sift_core::key_path::{normalize, set_id, KeyPath, PathSpec};

/// Dot-free, non-empty segment; dots are the path delimiter.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn key_path() -> impl Strategy<Value = KeyPath> {
    prop::collection::vec(segment(), 0..4).prop_map(KeyPath::new)
}

fn path_set() -> impl Strategy<Value = Vec<KeyPath>> {
    prop::collection::vec(key_path(), 1..6)
}

proptest! {
    #[test]
    fn set_id_ignores_order(paths in path_set(), seed in any::<u64>()) {
        let forward = normalize(&PathSpec::Many(paths.clone()));

        // Deterministic pseudo-shuffle driven by the seed.
        let mut shuffled = paths;
        let len = shuffled.len();
        let mut state = seed;
        for i in (1..len).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            #[allow(clippy::cast_possible_truncation)]
            let j = (state % (i as u64 + 1)) as usize;
            shuffled.swap(i, j);
        }
        let backward = normalize(&PathSpec::Many(shuffled));

        prop_assert_eq!(set_id(&forward), set_id(&backward));
    }

    #[test]
    fn set_id_ignores_duplication(paths in path_set()) {
        let plain = normalize(&PathSpec::Many(paths.clone()));
        let mut doubled = paths.clone();
        doubled.extend(paths);
        let deduped = normalize(&PathSpec::Many(doubled));

        prop_assert_eq!(set_id(&plain), set_id(&deduped));
    }

    #[test]
    fn distinct_normalized_sets_get_distinct_ids(
        left in path_set(),
        right in path_set(),
    ) {
        let left = normalize(&PathSpec::Many(left));
        let right = normalize(&PathSpec::Many(right));
        if left != right {
            prop_assert_ne!(set_id(&left), set_id(&right));
        }
    }

    #[test]
    fn normalize_is_idempotent(paths in path_set()) {
        let once = normalize(&PathSpec::Many(paths));
        let twice = normalize(&PathSpec::Many(once.clone()));
        prop_assert_eq!(once, twice);
    }
}
