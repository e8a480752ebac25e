//! Test trees.
//!
//! A [`TestTree`] mirrors the structure of a suite for one load query:
//!
//! ```text
//! suite:*                        root (MultiFile, empty file path)
//!   a,*                          directory (MultiFile)
//!     b:*                        file (MultiTest, empty test path)
//!       c,*                      test path segment (MultiTest)
//!         c:*                    test (MultiCase, no params)
//!           x=1;*                param prefix (MultiCase)
//!             x=1                case leaf (SingleCase)
//! ```
//!
//! Trees are produced by [`builder::load_tree_for_query`] and are read-only
//! afterwards, except for [`TestTree::dissolve_level_boundaries`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

pub mod builder;
pub mod iter;

pub use builder::{load_tree_for_query, LoadOptions};
pub use iter::{CollapseOptions, CollapsedNodes, Leaves, NodeRef};

use crate::loader::{CaseStatus, RunCase};
use crate::query::{QueryLevel, TestQuery, WILDCARD};

/// A node of a test tree: an internal subtree or a case leaf.
#[derive(Debug)]
pub enum TestTreeNode {
    Subtree(TestSubtree),
    Leaf(TestTreeLeaf),
}

impl TestTreeNode {
    pub fn query(&self) -> &TestQuery {
        match self {
            Self::Subtree(s) => &s.query,
            Self::Leaf(l) => &l.query,
        }
    }

    pub fn readable_relative_name(&self) -> &str {
        match self {
            Self::Subtree(s) => &s.readable_relative_name,
            Self::Leaf(l) => &l.readable_relative_name,
        }
    }

    fn set_readable_relative_name(&mut self, name: String) {
        match self {
            Self::Subtree(s) => s.readable_relative_name = name,
            Self::Leaf(l) => l.readable_relative_name = name,
        }
    }
}

#[derive(Debug)]
pub struct TestSubtree {
    pub readable_relative_name: String,
    pub query: TestQuery,
    pub children: IndexMap<String, TestTreeNode>,
    /// True when no expand query strictly refines this subtree.
    pub collapsible: bool,
    pub description: Option<String>,
}

impl TestSubtree {
    pub fn new(readable_relative_name: String, query: TestQuery, collapsible: bool) -> Self {
        Self {
            readable_relative_name,
            query,
            children: IndexMap::new(),
            collapsible,
            description: None,
        }
    }
}

/// A single runnable case. Its query is always a `SingleCase`.
pub struct TestTreeLeaf {
    pub readable_relative_name: String,
    pub query: TestQuery,
    runner: Arc<dyn RunCase>,
}

impl TestTreeLeaf {
    pub fn new(readable_relative_name: String, query: TestQuery, runner: Arc<dyn RunCase>) -> Self {
        Self {
            readable_relative_name,
            query,
            runner,
        }
    }

    /// Runs this leaf's case.
    pub fn run(&self) -> CaseStatus {
        self.runner.run(&self.query)
    }
}

impl fmt::Debug for TestTreeLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestTreeLeaf")
            .field("readable_relative_name", &self.readable_relative_name)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// A finished tree for one load query.
#[derive(Debug)]
pub struct TestTree {
    for_query: TestQuery,
    root: TestSubtree,
}

impl TestTree {
    pub(crate) fn new(for_query: TestQuery, root: TestSubtree) -> Self {
        Self { for_query, root }
    }

    /// The query this tree was loaded for.
    pub fn for_query(&self) -> &TestQuery {
        &self.for_query
    }

    pub fn root(&self) -> &TestSubtree {
        &self.root
    }

    /// Queries covering every matched case, stopping at collapsible subtrees.
    pub fn iterate_collapsed_queries(&self) -> impl Iterator<Item = &TestQuery> + '_ {
        self.iterate_collapsed_nodes(CollapseOptions::default())
            .map(|node| node.query())
    }

    pub fn iterate_collapsed_nodes(&self, options: CollapseOptions) -> CollapsedNodes<'_> {
        CollapsedNodes::new(&self.root, &self.for_query, options)
    }

    pub fn iterate_leaves(&self) -> Leaves<'_> {
        Leaves::new(&self.root)
    }

    pub fn case_count(&self) -> usize {
        self.iterate_leaves().count()
    }

    /// Replaces every description-less subtree whose only child sits at a
    /// deeper query level with that child, carrying the removed subtree's
    /// name as a prefix of the child's. The root is never replaced.
    pub fn dissolve_level_boundaries(&mut self) {
        dissolve_children(&mut self.root);
    }

    /// Indented multi-line rendering; same as `to_string()`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

// ============================================================================
// DISSOLVE
// ============================================================================

fn dissolve_children(subtree: &mut TestSubtree) {
    subtree.children = std::mem::take(&mut subtree.children)
        .into_iter()
        .map(|(key, child)| (key, dissolve(child)))
        .collect();
}

fn dissolve(node: TestTreeNode) -> TestTreeNode {
    let TestTreeNode::Subtree(mut subtree) = node else {
        return node;
    };
    dissolve_children(&mut subtree);

    let replaceable = subtree.children.len() == 1
        && subtree.description.is_none()
        && subtree
            .children
            .values()
            .all(|child| child.query().level() > subtree.query.level());
    if replaceable {
        if let Some((_, mut child)) = subtree.children.pop() {
            if !restates(&subtree.query, child.query()) {
                let prefix = subtree
                    .readable_relative_name
                    .strip_suffix(WILDCARD)
                    .unwrap_or(&subtree.readable_relative_name);
                let name = format!("{prefix}{}", child.readable_relative_name());
                child.set_readable_relative_name(name);
            }
            return child;
        }
    }
    TestTreeNode::Subtree(subtree)
}

/// Whether `child` repeats the part `parent` names at its own level, as a
/// file node repeats its directory's last segment.
fn restates(parent: &TestQuery, child: &TestQuery) -> bool {
    match parent.level() {
        QueryLevel::MultiFile => parent.file_path() == child.file_path(),
        QueryLevel::MultiTest => parent.test_path() == child.test_path(),
        QueryLevel::MultiCase => parent.params() == child.params(),
        QueryLevel::SingleCase => true,
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn json_string(s: &str) -> serde_json::Value {
    serde_json::Value::String(s.to_string())
}

fn write_node(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    node: NodeRef<'_>,
    indent: &str,
) -> fmt::Result {
    let marker = match node {
        NodeRef::Leaf(_) => '>',
        NodeRef::Subtree(s) if s.collapsible => '+',
        NodeRef::Subtree(_) => '-',
    };
    write!(f, "{indent}{marker} {} => {}", json_string(name), node.query())?;

    if let NodeRef::Subtree(subtree) = node {
        if let Some(description) = &subtree.description {
            write!(f, "\n{indent}  | {}", json_string(description))?;
        }
        let child_indent = format!("{indent}  ");
        for child in subtree.children.values() {
            writeln!(f)?;
            write_node(
                f,
                child.readable_relative_name(),
                NodeRef::from(child),
                &child_indent,
            )?;
        }
    }
    Ok(())
}

impl fmt::Display for TestTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, "(root)", NodeRef::Subtree(&self.root), "")
    }
}
