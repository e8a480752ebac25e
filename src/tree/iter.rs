//! Lazy depth-first traversals over a finished tree.
//!
//! Each traversal keeps an explicit stack of child iterators, so creating one
//! is cheap and every call re-walks the tree from the root.

use indexmap::map::Values;

use super::{TestSubtree, TestTreeLeaf, TestTreeNode};
use crate::query::compare::{compare_queries, Ordering};
use crate::query::{QueryLevel, TestQuery};

/// A borrowed view of either kind of node (the root is a bare subtree).
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Subtree(&'a TestSubtree),
    Leaf(&'a TestTreeLeaf),
}

impl<'a> NodeRef<'a> {
    pub fn query(&self) -> &'a TestQuery {
        match self {
            Self::Subtree(s) => &s.query,
            Self::Leaf(l) => &l.query,
        }
    }
}

impl<'a> From<&'a TestTreeNode> for NodeRef<'a> {
    fn from(node: &'a TestTreeNode) -> Self {
        match node {
            TestTreeNode::Subtree(s) => Self::Subtree(s),
            TestTreeNode::Leaf(l) => Self::Leaf(l),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollapseOptions {
    /// Also yield every subtree that is descended into (the root first).
    pub include_intermediate_nodes: bool,
    /// Yield collapsible subtrees that have no children.
    pub include_empty_subtrees: bool,
    /// Subtrees at or below this level are descended into even when collapsible.
    pub expand_through_level: Option<QueryLevel>,
}

impl Default for CollapseOptions {
    fn default() -> Self {
        Self {
            include_intermediate_nodes: false,
            include_empty_subtrees: true,
            expand_through_level: None,
        }
    }
}

/// Yields leaves and collapsible subtrees without descending into the latter.
///
/// A subtree broader than the load query is always descended into, so every
/// yielded query lies within the load query.
pub struct CollapsedNodes<'a> {
    stack: Vec<Values<'a, String, TestTreeNode>>,
    pending_root: Option<&'a TestSubtree>,
    for_query: &'a TestQuery,
    options: CollapseOptions,
}

impl<'a> CollapsedNodes<'a> {
    pub(super) fn new(
        root: &'a TestSubtree,
        for_query: &'a TestQuery,
        options: CollapseOptions,
    ) -> Self {
        Self {
            stack: vec![root.children.values()],
            pending_root: options.include_intermediate_nodes.then_some(root),
            for_query,
            options,
        }
    }

    fn collapses(&self, subtree: &TestSubtree) -> bool {
        let forced_open = self
            .options
            .expand_through_level
            .is_some_and(|level| subtree.query.level() <= level);
        let broader_than_load =
            compare_queries(&subtree.query, self.for_query) == Ordering::StrictSuperset;
        subtree.collapsible && !forced_open && !broader_than_load
    }
}

impl<'a> Iterator for CollapsedNodes<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            return Some(NodeRef::Subtree(root));
        }
        loop {
            let Some(child) = self.stack.last_mut()?.next() else {
                self.stack.pop();
                continue;
            };
            match child {
                TestTreeNode::Leaf(leaf) => return Some(NodeRef::Leaf(leaf)),
                TestTreeNode::Subtree(subtree) if self.collapses(subtree) => {
                    if !subtree.children.is_empty() || self.options.include_empty_subtrees {
                        return Some(NodeRef::Subtree(subtree));
                    }
                }
                TestTreeNode::Subtree(subtree) => {
                    self.stack.push(subtree.children.values());
                    if self.options.include_intermediate_nodes {
                        return Some(NodeRef::Subtree(subtree));
                    }
                }
            }
        }
    }
}

/// Yields every leaf, depth first.
pub struct Leaves<'a> {
    stack: Vec<Values<'a, String, TestTreeNode>>,
}

impl<'a> Leaves<'a> {
    pub(super) fn new(root: &'a TestSubtree) -> Self {
        Self {
            stack: vec![root.children.values()],
        }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a TestTreeLeaf;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.last_mut()?.next() {
                Some(TestTreeNode::Leaf(leaf)) => return Some(leaf),
                Some(TestTreeNode::Subtree(subtree)) => self.stack.push(subtree.children.values()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
