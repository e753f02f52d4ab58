//! Cycle-safe flattening of trees and graphs.
//!
//! Nodes are discovered in pre-order, first visit wins. A node reached again
//! (through a cycle, a shared subtree or another root) is skipped without
//! asking the branch locator for its children a second time.

use std::collections::hash_set;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::slice;

use tracing::{debug, instrument, trace};

/// Set of visited nodes, enumerated in discovery order.
#[derive(Clone)]
pub struct VisitedSet<T> {
    order: Vec<T>,
    seen: HashSet<T>,
}

impl<T> Default for VisitedSet<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> VisitedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `node` as visited. Returns `false` if it was already present.
    pub fn insert(&mut self, node: &T) -> bool {
        if self.seen.contains(node) {
            return false;
        }
        self.seen.insert(node.clone());
        self.order.push(node.clone());
        true
    }

    pub fn contains(&self, node: &T) -> bool {
        self.seen.contains(node)
    }
}

impl<T> VisitedSet<T> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates in discovery order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<T> {
        self.order
    }

    /// Unordered view, for set algebra with other `HashSet`s.
    pub fn members(&self) -> hash_set::Iter<'_, T> {
        self.seen.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for VisitedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.order.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for VisitedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl<T: Eq> Eq for VisitedSet<T> {}

impl<T> IntoIterator for VisitedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a VisitedSet<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

/// Depth-first walker over a node/children relation.
///
/// The walk keeps an explicit stack of child iterators instead of recursing,
/// so arbitrarily deep chains do not grow the call stack.
pub struct GraphWalker<F> {
    branch_locator: F,
}

impl<F> GraphWalker<F> {
    pub fn new(branch_locator: F) -> Self {
        Self { branch_locator }
    }

    /// Walks every node of `frontier` that `visited` does not contain yet,
    /// descending into its children before moving on to the next sibling.
    pub fn walk<T, R, I>(&mut self, frontier: R, visited: &mut VisitedSet<T>)
    where
        T: Hash + Eq + Clone,
        R: IntoIterator<Item = T>,
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> I,
    {
        for node in frontier {
            if visited.insert(&node) {
                let children = (self.branch_locator)(&node);
                self.descend(children, visited);
            }
        }
    }

    fn descend<T, I>(&mut self, children: I, visited: &mut VisitedSet<T>)
    where
        T: Hash + Eq + Clone,
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> I,
    {
        let mut stack = vec![children.into_iter()];

        while let Some(siblings) = stack.last_mut() {
            let Some(node) = siblings.next() else {
                stack.pop();
                continue;
            };
            if visited.insert(&node) {
                trace!(depth = stack.len(), "discovered node");
                stack.push((self.branch_locator)(&node).into_iter());
            }
        }
    }
}

/// Flattens a multi-root graph.
///
/// Every element of `roots` is a traversal root. Roots take part in discovery
/// like any other node, so a root already reached from an earlier root is not
/// walked twice.
#[instrument(level = "debug", skip_all)]
pub fn flatten<T, R, I, F>(roots: R, branch_locator: F) -> VisitedSet<T>
where
    T: Hash + Eq + Clone,
    R: IntoIterator<Item = T>,
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> I,
{
    let mut visited = VisitedSet::new();
    GraphWalker::new(branch_locator).walk(roots, &mut visited);
    debug!(nodes = visited.len(), "flattened graph");
    visited
}

/// Flattens the graph reachable from a single `root`.
///
/// The root is always the first element of the result.
#[instrument(level = "debug", skip_all)]
pub fn flatten_root<T, I, F>(root: T, mut branch_locator: F) -> VisitedSet<T>
where
    T: Hash + Eq + Clone,
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> I,
{
    let mut visited = VisitedSet::new();
    visited.insert(&root);
    let children = branch_locator(&root);
    GraphWalker::new(branch_locator).walk(children, &mut visited);
    debug!(nodes = visited.len(), "flattened tree");
    visited
}
