//! Builds a [`TestTree`] for a query from a loader's listing.
//!
//! The suite listing is walked in order. Spec files whose path cannot overlap
//! the load query are skipped without being imported. For every other file
//! the loader's case sequence is consumed once; each case whose query is
//! within the load query gets a chain of subtrees (directories, file, test
//! path segments, test, param prefixes) ending in a leaf.
//!
//! A README whose path names a spec file describes that file's node; any
//! other README describes the directory node at its path.
//!
//! Every subtree's `collapsible` flag is computed against the expand list as
//! it is created. Each expand entry must be met by an `Equal` query at least
//! once during the walk, or the build fails.

use std::collections::HashSet;

use indexmap::map::Entry;
use tracing::{debug, info, trace};

use super::{TestSubtree, TestTree, TestTreeLeaf, TestTreeNode};
use crate::errors::{Result, SuiteTreeError};
use crate::loader::{Case, ListingEntry, TestFileLoader};
use crate::query::compare::{compare_queries, Ordering};
use crate::query::params::{extract_public_params, stringify_single_param, TestParams};
use crate::query::{TestQuery, BIG_SEPARATOR, PARAM_SEPARATOR, PATH_SEPARATOR, WILDCARD};

/// Tree keys for the file node under a directory, the test node under its
/// last path segment, and a leaf under its last param node.
const LEVEL_KEY: &str = "";

/// Descriptions containing this marker may belong to files without cases.
const TODO_MARKER: &str = "TODO";

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Queries that must be shown expanded: any subtree strictly containing
    /// one of them is not collapsible. Each must equal some node's query.
    pub subqueries_to_expand: Vec<TestQuery>,
    /// Any subtree overlapping one of these is not collapsible.
    pub fully_expand_subtrees: Vec<TestQuery>,
}

/// Loads the tree of every case in `query_to_load`.
#[tracing::instrument(skip(loader, query_to_load, options), fields(query = %query_to_load))]
pub async fn load_tree_for_query<L>(
    loader: &L,
    query_to_load: &TestQuery,
    options: &LoadOptions,
) -> Result<TestTree>
where
    L: TestFileLoader + ?Sized,
{
    let suite = query_to_load.suite();
    let entries = loader.listing(suite).await?;
    debug!(entries = entries.len(), "listed suite");

    let mut check = CollapseCheck::new(options);
    let mut root = make_tree_for_suite(suite, &mut check)?;
    let mut found_case = false;
    let mut files_imported = 0usize;

    let spec_paths: HashSet<Vec<String>> = entries
        .iter()
        .filter_map(|entry| match entry {
            ListingEntry::Spec { file_path } => Some(file_path.clone()),
            ListingEntry::Readme { .. } => None,
        })
        .collect();

    for entry in entries {
        match entry {
            ListingEntry::Readme { file_path, readme } => {
                if file_path.is_empty() {
                    set_description(&mut root, &readme)?;
                    continue;
                }
                if spec_paths.contains(&file_path) {
                    let file_query = TestQuery::multi_test(
                        suite,
                        file_path.iter().cloned(),
                        Vec::<String>::new(),
                    )?;
                    if compare_queries(&file_query, query_to_load) == Ordering::Unordered {
                        continue;
                    }
                    let subtree = add_subtree_for_file_path(&mut root, &file_path, &mut check)?;
                    set_description(subtree, &readme)?;
                    continue;
                }
                let dir_query = TestQuery::multi_file(suite, file_path.iter().cloned())?;
                if compare_queries(&dir_query, query_to_load) == Ordering::Unordered {
                    continue;
                }
                let subtree = add_subtree_for_dir_path(&mut root, &file_path, &mut check)?;
                set_description(subtree, &readme)?;
            }
            ListingEntry::Spec { file_path } => {
                let file_query =
                    TestQuery::multi_test(suite, file_path.iter().cloned(), Vec::<String>::new())?;
                if compare_queries(&file_query, query_to_load) == Ordering::Unordered {
                    trace!(file = %file_query, "file not matched by query");
                    continue;
                }

                debug!(file = %file_query, "importing spec file");
                let spec = loader.import_spec_file(suite, &file_path).await?;
                files_imported += 1;

                let file_subtree = add_subtree_for_file_path(&mut root, &file_path, &mut check)?;
                set_description(file_subtree, &spec.description)?;

                let mut file_has_cases = false;
                for case in spec.cases {
                    let case = case?;
                    file_has_cases = true;

                    let case_query = TestQuery::single_case(
                        suite,
                        file_path.iter().cloned(),
                        case.id.test_path.iter().cloned(),
                        extract_public_params(&case.id.params),
                    )?;
                    match compare_queries(&case_query, query_to_load) {
                        Ordering::Unordered | Ordering::StrictSuperset => continue,
                        Ordering::Equal | Ordering::StrictSubset => {}
                    }

                    let test_subtree =
                        add_subtree_for_test_path(file_subtree, &case.id.test_path, &mut check)?;
                    add_leaf_for_case(test_subtree, case_query, case, &mut check)?;
                    found_case = true;
                }

                if !file_has_cases && !spec.description.contains(TODO_MARKER) {
                    return Err(SuiteTreeError::EmptySpecFile {
                        query: file_query.to_string(),
                    });
                }
            }
        }
    }

    check.ensure_all_seen()?;
    if !found_case {
        return Err(SuiteTreeError::NothingMatched {
            query: query_to_load.to_string(),
        });
    }

    let tree = TestTree::new(query_to_load.clone(), root);
    info!(files_imported, cases = tree.case_count(), "loaded test tree");
    Ok(tree)
}

// ============================================================================
// COLLAPSIBILITY
// ============================================================================

struct CollapseCheck<'o> {
    subqueries_to_expand: &'o [TestQuery],
    fully_expand_subtrees: &'o [TestQuery],
    seen: Vec<bool>,
}

impl<'o> CollapseCheck<'o> {
    fn new(options: &'o LoadOptions) -> Self {
        Self {
            subqueries_to_expand: &options.subqueries_to_expand,
            fully_expand_subtrees: &options.fully_expand_subtrees,
            seen: vec![false; options.subqueries_to_expand.len()],
        }
    }

    /// Whether `subquery` may be collapsed; marks expand entries equal to it as seen.
    fn is_collapsible(&mut self, subquery: &TestQuery) -> bool {
        let mut collapsible = true;
        for (i, to_expand) in self.subqueries_to_expand.iter().enumerate() {
            match compare_queries(to_expand, subquery) {
                Ordering::Equal => self.seen[i] = true,
                Ordering::StrictSubset => collapsible = false,
                Ordering::StrictSuperset | Ordering::Unordered => {}
            }
        }
        collapsible
            && self
                .fully_expand_subtrees
                .iter()
                .all(|q| compare_queries(q, subquery) == Ordering::Unordered)
    }

    fn ensure_all_seen(&self) -> Result<()> {
        match self.seen.iter().position(|seen| !seen) {
            Some(i) => Err(SuiteTreeError::UnusedExpansion {
                query: self.subqueries_to_expand[i].to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// NODE INSERTION
// ============================================================================

/// Root is `suite:*`. It is never collapsible, but still counts as seen.
fn make_tree_for_suite(suite: &str, check: &mut CollapseCheck<'_>) -> Result<TestSubtree> {
    let query = TestQuery::multi_file(suite, Vec::<String>::new())?;
    check.is_collapsible(&query);
    Ok(TestSubtree::new(
        format!("{suite}{BIG_SEPARATOR}"),
        query,
        false,
    ))
}

/// Blank descriptions are ignored; a second non-blank one is an error.
fn set_description(subtree: &mut TestSubtree, description: &str) -> Result<()> {
    let description = description.trim();
    if description.is_empty() {
        return Ok(());
    }
    if subtree.description.is_some() {
        return Err(SuiteTreeError::DuplicateDescription {
            query: subtree.query.to_string(),
        });
    }
    subtree.description = Some(description.to_string());
    Ok(())
}

/// Returns the subtree under `key`, creating it if missing.
fn get_or_insert_subtree<'t, F>(
    parent: &'t mut TestSubtree,
    key: &str,
    create: F,
) -> Result<&'t mut TestSubtree>
where
    F: FnOnce(&TestQuery) -> Result<TestSubtree>,
{
    let TestSubtree {
        query: parent_query,
        children,
        ..
    } = parent;
    let node = match children.entry(key.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let subtree = create(parent_query)?;
            trace!(query = %subtree.query, "inserted subtree");
            entry.insert(TestTreeNode::Subtree(subtree))
        }
    };
    match node {
        TestTreeNode::Subtree(subtree) => Ok(subtree),
        TestTreeNode::Leaf(_) => Err(SuiteTreeError::StructuralCorruption {
            key: key.to_string(),
            parent: parent_query.to_string(),
            expected: "subtree",
            found: "leaf",
        }),
    }
}

/// `suite:*` -> `suite:a,*` -> `suite:a,b,*`
fn add_subtree_for_dir_path<'t>(
    root: &'t mut TestSubtree,
    dir: &[String],
    check: &mut CollapseCheck<'_>,
) -> Result<&'t mut TestSubtree> {
    let mut tree = root;
    for (depth, part) in dir.iter().enumerate() {
        tree = get_or_insert_subtree(tree, part, |parent| {
            let query = TestQuery::multi_file(parent.suite(), dir[..=depth].iter().cloned())?;
            let collapsible = check.is_collapsible(&query);
            Ok(TestSubtree::new(
                format!("{part}{PATH_SEPARATOR}{WILDCARD}"),
                query,
                collapsible,
            ))
        })?;
    }
    Ok(tree)
}

/// `suite:*` -> ... -> `suite:a,b,*` -> `suite:a,b:*`
fn add_subtree_for_file_path<'t>(
    root: &'t mut TestSubtree,
    file: &[String],
    check: &mut CollapseCheck<'_>,
) -> Result<&'t mut TestSubtree> {
    let Some(last) = file.last() else {
        return Err(SuiteTreeError::invalid_query("spec file path is empty"));
    };
    let dir = add_subtree_for_dir_path(root, file, check)?;
    get_or_insert_subtree(dir, LEVEL_KEY, |parent| {
        let query = TestQuery::multi_test(
            parent.suite(),
            parent.file_path().iter().cloned(),
            Vec::<String>::new(),
        )?;
        let collapsible = check.is_collapsible(&query);
        Ok(TestSubtree::new(
            format!("{last}{BIG_SEPARATOR}{WILDCARD}"),
            query,
            collapsible,
        ))
    })
}

/// `suite:a,b:*` -> `suite:a,b:c,*` -> `suite:a,b:c,d,*` -> `suite:a,b:c,d:*`
fn add_subtree_for_test_path<'t>(
    file_tree: &'t mut TestSubtree,
    test: &[String],
    check: &mut CollapseCheck<'_>,
) -> Result<&'t mut TestSubtree> {
    let Some(last) = test.last() else {
        return Err(SuiteTreeError::invalid_query("case test path is empty"));
    };
    let mut tree = file_tree;
    for (depth, part) in test.iter().enumerate() {
        tree = get_or_insert_subtree(tree, part, |parent| {
            let query = TestQuery::multi_test(
                parent.suite(),
                parent.file_path().iter().cloned(),
                test[..=depth].iter().cloned(),
            )?;
            let collapsible = check.is_collapsible(&query);
            Ok(TestSubtree::new(
                format!("{part}{PATH_SEPARATOR}{WILDCARD}"),
                query,
                collapsible,
            ))
        })?;
    }
    get_or_insert_subtree(tree, LEVEL_KEY, |parent| {
        let query = TestQuery::multi_case(
            parent.suite(),
            parent.file_path().iter().cloned(),
            test.iter().cloned(),
            TestParams::new(),
        )?;
        let collapsible = check.is_collapsible(&query);
        Ok(TestSubtree::new(
            format!("{last}{BIG_SEPARATOR}{WILDCARD}"),
            query,
            collapsible,
        ))
    })
}

/// `suite:a,b:c:*` -> `suite:a,b:c:x=1;*` -> ... -> leaf `suite:a,b:c:x=1;y=2`
fn add_leaf_for_case(
    test_tree: &mut TestSubtree,
    case_query: TestQuery,
    case: Case,
    check: &mut CollapseCheck<'_>,
) -> Result<()> {
    let params = case_query.params().cloned().unwrap_or_default();
    let mut tree = test_tree;
    let mut prefix = TestParams::new();
    for (key, value) in &params {
        prefix.insert(key.clone(), value.clone());
        let name = stringify_single_param(key, value);
        tree = get_or_insert_subtree(tree, &name, |parent| {
            let query = TestQuery::multi_case(
                parent.suite(),
                parent.file_path().iter().cloned(),
                case.id.test_path.iter().cloned(),
                prefix.clone(),
            )?;
            let collapsible = check.is_collapsible(&query);
            Ok(TestSubtree::new(
                format!("{name}{PARAM_SEPARATOR}{WILDCARD}"),
                query,
                collapsible,
            ))
        })?;
    }

    // Leaves are never collapsed, but an expand entry may name one exactly.
    check.is_collapsible(&case_query);
    insert_leaf(tree, case_query, case)
}

fn insert_leaf(parent: &mut TestSubtree, query: TestQuery, case: Case) -> Result<()> {
    match parent.children.get(LEVEL_KEY) {
        Some(TestTreeNode::Leaf(_)) => {
            return Err(SuiteTreeError::DuplicateCase {
                query: query.to_string(),
            })
        }
        Some(TestTreeNode::Subtree(_)) => {
            return Err(SuiteTreeError::StructuralCorruption {
                key: LEVEL_KEY.to_string(),
                parent: parent.query.to_string(),
                expected: "leaf",
                found: "subtree",
            })
        }
        None => {}
    }
    let name = readable_name_for_case(&query);
    trace!(query = %query, "inserted leaf");
    parent.children.insert(
        LEVEL_KEY.to_string(),
        TestTreeNode::Leaf(TestTreeLeaf::new(name, query, case.run)),
    );
    Ok(())
}

/// The last param (`y=2`), or `c:` for a case without params.
fn readable_name_for_case(query: &TestQuery) -> String {
    if let Some((key, value)) = query.params().and_then(|p| p.last()) {
        return stringify_single_param(key, value);
    }
    let last = query
        .test_path()
        .and_then(|t| t.last())
        .map(String::as_str)
        .unwrap_or_default();
    format!("{last}{BIG_SEPARATOR}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loader::{CaseId, CaseStatus, RunCase};
    use crate::test_params;

    fn runner() -> Arc<dyn RunCase> {
        Arc::new(|_: &TestQuery| CaseStatus::Pass)
    }

    fn file_subtree() -> TestSubtree {
        let query = TestQuery::multi_test("s", ["a"], Vec::<String>::new()).unwrap();
        TestSubtree::new("a:*".into(), query, true)
    }

    #[test]
    fn test_leaf_where_subtree_expected_is_corruption() {
        let mut parent = file_subtree();
        let leaf_query = TestQuery::single_case("s", ["a"], ["c"], test_params! {}).unwrap();
        parent.children.insert(
            "c".into(),
            TestTreeNode::Leaf(TestTreeLeaf::new("c:".into(), leaf_query, runner())),
        );

        let err = get_or_insert_subtree(&mut parent, "c", |_| {
            panic!("an occupied key must not be recreated")
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SuiteTreeError::StructuralCorruption {
                expected: "subtree",
                found: "leaf",
                ..
            }
        ));
    }

    #[test]
    fn test_subtree_where_leaf_expected_is_corruption() {
        let mut parent = file_subtree();
        let nested = TestQuery::multi_case("s", ["a"], ["c"], test_params! {}).unwrap();
        parent.children.insert(
            LEVEL_KEY.into(),
            TestTreeNode::Subtree(TestSubtree::new("c:*".into(), nested, true)),
        );

        let case_query = TestQuery::single_case("s", ["a"], ["c"], test_params! {}).unwrap();
        let case = Case {
            id: CaseId {
                test_path: vec!["c".into()],
                params: test_params! {},
            },
            run: runner(),
        };
        let err = insert_leaf(&mut parent, case_query, case).unwrap_err();
        assert!(matches!(
            err,
            SuiteTreeError::StructuralCorruption {
                expected: "leaf",
                found: "subtree",
                ..
            }
        ));
    }

    #[test]
    fn test_existing_subtree_is_reused() {
        let mut parent = file_subtree();
        let mut created = 0;
        for _ in 0..2 {
            get_or_insert_subtree(&mut parent, "c", |p| {
                created += 1;
                let query = TestQuery::multi_test(p.suite(), ["a"], ["c"])?;
                Ok(TestSubtree::new("c,*".into(), query, true))
            })
            .unwrap();
        }
        assert_eq!(created, 1);
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn test_blank_description_never_conflicts() {
        let mut subtree = file_subtree();
        set_description(&mut subtree, "  ").unwrap();
        set_description(&mut subtree, "from readme").unwrap();
        set_description(&mut subtree, "").unwrap();
        assert_eq!(subtree.description.as_deref(), Some("from readme"));
        assert!(matches!(
            set_description(&mut subtree, "again"),
            Err(SuiteTreeError::DuplicateDescription { .. })
        ));
    }
}
