//! Containment comparison between queries.
//!
//! `compare_queries(a, b)` answers how the set of cases matched by `a`
//! relates to the set matched by `b`. Comparison descends level by level:
//! suite, file path, test path, params. At each level the path relation is
//! computed, then combined with whether each query "bottoms out" (is a
//! wildcard) at that level.

use super::params::{is_public_param, TestParams};
use super::TestQuery;

/// How the cases matched by one query relate to those matched by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordering {
    /// Disjoint or incomparable.
    Unordered,
    /// `a` matches strictly more than `b`.
    StrictSuperset,
    /// `a` and `b` match the same cases.
    Equal,
    /// `a` matches strictly less than `b`.
    StrictSubset,
}

impl Ordering {
    /// The relation seen from the other side: `compare(b, a)`.
    pub fn reverse(self) -> Self {
        match self {
            Self::StrictSuperset => Self::StrictSubset,
            Self::StrictSubset => Self::StrictSuperset,
            other => other,
        }
    }
}

/// Compares the case sets of `a` and `b`.
pub fn compare_queries(a: &TestQuery, b: &TestQuery) -> Ordering {
    if a.suite() != b.suite() {
        return Ordering::Unordered;
    }

    let file_ordering = compare_paths(a.file_path(), b.file_path());
    if file_ordering != Ordering::Equal || a.is_multi_file() || b.is_multi_file() {
        return compare_one_level(file_ordering, a.is_multi_file(), b.is_multi_file());
    }

    let (Some(a_test), Some(b_test)) = (a.test_path(), b.test_path()) else {
        // Only file-level queries lack a test path, and those returned above.
        return Ordering::Unordered;
    };
    let test_ordering = compare_paths(a_test, b_test);
    if test_ordering != Ordering::Equal || a.is_multi_test() || b.is_multi_test() {
        return compare_one_level(test_ordering, a.is_multi_test(), b.is_multi_test());
    }

    let (Some(a_params), Some(b_params)) = (a.params(), b.params()) else {
        return Ordering::Unordered;
    };
    let params_ordering = compare_public_params_paths(a_params, b_params);
    if params_ordering != Ordering::Equal || a.is_multi_case() || b.is_multi_case() {
        return compare_one_level(params_ordering, a.is_multi_case(), b.is_multi_case());
    }
    Ordering::Equal
}

/// Combines the path ordering at one level with whether each side is a
/// wildcard ("big") at that level.
fn compare_one_level(ordering: Ordering, a_is_big: bool, b_is_big: bool) -> Ordering {
    if ordering == Ordering::Unordered {
        return Ordering::Unordered;
    }
    if a_is_big && b_is_big {
        return ordering;
    }
    if !a_is_big && !b_is_big {
        // Equal paths with neither side big were handled by the caller.
        return Ordering::Unordered;
    }
    if a_is_big && ordering != Ordering::StrictSubset {
        return Ordering::StrictSuperset;
    }
    if b_is_big && ordering != Ordering::StrictSuperset {
        return Ordering::StrictSubset;
    }
    Ordering::Unordered
}

/// Compares two paths as prefixes: the shorter path matches more.
pub fn compare_paths(a: &[String], b: &[String]) -> Ordering {
    if a.iter().zip(b).any(|(x, y)| x != y) {
        return Ordering::Unordered;
    }
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Equal => Ordering::Equal,
        std::cmp::Ordering::Less => Ordering::StrictSuperset,
        std::cmp::Ordering::Greater => Ordering::StrictSubset,
    }
}

/// Compares public params as key/value sets: fewer constraints match more.
pub fn compare_public_params_paths(a: &TestParams, b: &TestParams) -> Ordering {
    let a_keys: Vec<&String> = a.keys().filter(|k| is_public_param(k)).collect();
    let b_count = b.keys().filter(|k| is_public_param(k)).count();

    let mut common = 0;
    for key in &a_keys {
        if let Some(b_value) = b.get(*key) {
            if a.get(*key) != Some(b_value) {
                return Ordering::Unordered;
            }
            common += 1;
        }
    }

    let a_remaining = a_keys.len() - common;
    let b_remaining = b_count - common;
    match (a_remaining, b_remaining) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::StrictSuperset,
        (_, 0) => Ordering::StrictSubset,
        _ => Ordering::Unordered,
    }
}
