//! Parameter combinators.
//!
//! A [`ParamsBuilder`] is a lazy, finite, restartable sequence of parameter
//! sets. Every call to [`ParamsBuilder::iter`] walks the sequence afresh, so
//! one builder can feed any number of consumers.
//!
//! ```
//! use suitetree::params::{combine, enumerate};
//!
//! let cases = combine([enumerate("x", [1, 2]), enumerate("y", ["a", "b"])]);
//! let sets = cases.collect_params().unwrap();
//! assert_eq!(sets.len(), 4);
//! ```
//!
//! Merging two sets that share a parameter name is an error (the parameter
//! would be ambiguous), even when both sides carry the same value.

use std::iter;
use std::sync::Arc;

use crate::errors::{Result, SuiteTreeError};
use crate::query::params::{params_superset, ParamValue, TestParams};

/// One pass over a builder's parameter sets.
pub type ParamsIter = Box<dyn Iterator<Item = Result<TestParams>> + Send>;

trait ParamSource: Send + Sync {
    fn iter(self: Arc<Self>) -> ParamsIter;
}

/// A restartable sequence of parameter sets.
#[derive(Clone)]
pub struct ParamsBuilder {
    source: Arc<dyn ParamSource>,
}

impl std::fmt::Debug for ParamsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamsBuilder").finish_non_exhaustive()
    }
}

// =====================
// Constructors
// =====================

/// A sequence holding exactly one empty parameter set.
pub fn unit() -> ParamsBuilder {
    ParamsBuilder::from(vec![TestParams::new()])
}

/// One single-key set `{name: value}` per value, in order.
pub fn enumerate<I, V>(name: &str, values: I) -> ParamsBuilder
where
    I: IntoIterator<Item = V>,
    V: Into<ParamValue>,
{
    let sets = values
        .into_iter()
        .map(|v| {
            let mut params = TestParams::new();
            params.insert(name.to_string(), v.into());
            params
        })
        .collect::<Vec<_>>();
    ParamsBuilder::from(sets)
}

/// `enumerate(name, [false, true])`.
pub fn pbool(name: &str) -> ParamsBuilder {
    enumerate(name, [false, true])
}

/// Cartesian product of `sources`; the first source varies slowest.
///
/// `combine([])` is the unit sequence. Any empty source makes the product empty.
pub fn combine<I, S>(sources: I) -> ParamsBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<ParamsBuilder>,
{
    sources
        .into_iter()
        .fold(unit(), |acc, source| acc.combine(source))
}

impl From<Vec<TestParams>> for ParamsBuilder {
    fn from(sets: Vec<TestParams>) -> Self {
        Self {
            source: Arc::new(Literal(sets)),
        }
    }
}

// =====================
// Operators
// =====================

impl ParamsBuilder {
    /// Walks the sequence from the start.
    pub fn iter(&self) -> ParamsIter {
        Arc::clone(&self.source).iter()
    }

    /// Collects one full pass, failing on the first ambiguous merge.
    pub fn collect_params(&self) -> Result<Vec<TestParams>> {
        self.iter().collect()
    }

    /// Product with `other`: every set of `self` merged with every set of `other`.
    pub fn combine(self, other: impl Into<ParamsBuilder>) -> Self {
        Self {
            source: Arc::new(Product {
                left: self,
                right: other.into(),
            }),
        }
    }

    /// For every set `p`, merges `p` with each set of `expander(p)`.
    pub fn expand<F>(self, expander: F) -> Self
    where
        F: Fn(&TestParams) -> ParamsBuilder + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(Expanded {
                base: self,
                expander: Arc::new(expander),
            }),
        }
    }

    /// Keeps the sets for which `predicate` holds.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&TestParams) -> bool + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(Filtered {
                base: self,
                predicate: Arc::new(predicate),
            }),
        }
    }

    /// Drops the sets for which `predicate` holds.
    pub fn unless<F>(self, predicate: F) -> Self
    where
        F: Fn(&TestParams) -> bool + Send + Sync + 'static,
    {
        self.filter(move |p| !predicate(p))
    }

    /// Drops every set that contains all key/values of any of `excluded`.
    pub fn exclude<I>(self, excluded: I) -> Self
    where
        I: IntoIterator<Item = TestParams>,
    {
        let excluded = excluded.into_iter().collect::<Vec<_>>();
        self.filter(move |p| !excluded.iter().any(|e| params_superset(p, e)))
    }
}

/// Union of `a` and `b`; a shared key is an ambiguous parameter.
fn merge_params(a: &TestParams, b: &TestParams) -> Result<TestParams> {
    if let Some(key) = b.keys().find(|k| a.contains_key(*k)) {
        return Err(SuiteTreeError::DuplicateParam { key: key.clone() });
    }
    let mut merged = a.clone();
    merged.extend(b.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(merged)
}

// =====================
// Sources
// =====================

struct Literal(Vec<TestParams>);

impl ParamSource for Literal {
    fn iter(self: Arc<Self>) -> ParamsIter {
        let len = self.0.len();
        Box::new((0..len).map(move |i| Ok(self.0[i].clone())))
    }
}

struct Product {
    left: ParamsBuilder,
    right: ParamsBuilder,
}

impl ParamSource for Product {
    fn iter(self: Arc<Self>) -> ParamsIter {
        let right = self.right.clone();
        Box::new(self.left.iter().flat_map(move |a| -> ParamsIter {
            match a {
                Ok(a) => Box::new(right.iter().map(move |b| merge_params(&a, &b?))),
                Err(e) => Box::new(iter::once(Err(e))),
            }
        }))
    }
}

type Expander = dyn Fn(&TestParams) -> ParamsBuilder + Send + Sync;

struct Expanded {
    base: ParamsBuilder,
    expander: Arc<Expander>,
}

impl ParamSource for Expanded {
    fn iter(self: Arc<Self>) -> ParamsIter {
        let expander = Arc::clone(&self.expander);
        Box::new(self.base.iter().flat_map(move |a| -> ParamsIter {
            match a {
                Ok(a) => {
                    let derived = expander(&a);
                    Box::new(derived.iter().map(move |b| merge_params(&a, &b?)))
                }
                Err(e) => Box::new(iter::once(Err(e))),
            }
        }))
    }
}

type Predicate = dyn Fn(&TestParams) -> bool + Send + Sync;

struct Filtered {
    base: ParamsBuilder,
    predicate: Arc<Predicate>,
}

impl ParamSource for Filtered {
    fn iter(self: Arc<Self>) -> ParamsIter {
        let predicate = Arc::clone(&self.predicate);
        Box::new(self.base.iter().filter(move |p| match p {
            Ok(p) => predicate(p),
            Err(_) => true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_params;

    #[test]
    fn test_unit_is_one_empty_set() {
        assert_eq!(unit().collect_params().unwrap(), vec![test_params! {}]);
    }

    #[test]
    fn test_enumerate_preserves_order() {
        let sets = enumerate("x", [3, 1, 2]).collect_params().unwrap();
        assert_eq!(
            sets,
            vec![test_params! { "x" => 3 }, test_params! { "x" => 1 }, test_params! { "x" => 2 }]
        );
    }

    #[test]
    fn test_builder_is_restartable() {
        let b = combine([enumerate("x", [1, 2]), pbool("flag")]);
        let first = b.collect_params().unwrap();
        let second = b.collect_params().unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_expand_derives_from_each_set() {
        let sets = enumerate("n", [1, 2])
            .expand(|p| {
                let n = p["n"].as_i64().unwrap_or(0);
                enumerate("i", 0..n)
            })
            .collect_params()
            .unwrap();
        assert_eq!(
            sets,
            vec![
                test_params! { "n" => 1, "i" => 0 },
                test_params! { "n" => 2, "i" => 0 },
                test_params! { "n" => 2, "i" => 1 },
            ]
        );
    }

    #[test]
    fn test_filter_unless_exclude() {
        let base = combine([enumerate("x", [1, 2]), enumerate("y", [1, 2])]);
        let diagonal = base
            .clone()
            .filter(|p| p["x"] == p["y"])
            .collect_params()
            .unwrap();
        assert_eq!(diagonal.len(), 2);

        let off_diagonal = base
            .clone()
            .unless(|p| p["x"] == p["y"])
            .collect_params()
            .unwrap();
        assert_eq!(off_diagonal.len(), 2);

        let excluded = base
            .exclude([test_params! { "x" => 1 }])
            .collect_params()
            .unwrap();
        assert_eq!(
            excluded,
            vec![test_params! { "x" => 2, "y" => 1 }, test_params! { "x" => 2, "y" => 2 }]
        );
    }

    #[test]
    fn test_expand_collision_is_reported() {
        let result = enumerate("x", [1])
            .expand(|_| enumerate("x", [1]))
            .collect_params();
        assert!(matches!(result, Err(SuiteTreeError::DuplicateParam { .. })));
    }
}
