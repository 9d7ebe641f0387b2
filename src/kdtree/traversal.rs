//! Utilities to traverse the KdTree structure.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::{KdTreeError, Result};
use crate::kdtree::node::NodeId;
use crate::kdtree::{KdTree, Region};
use crate::r#type::{Accessor, Comparator};

/// A detached position in a [`KdTree`].
///
/// Unlike [`Iter`], a cursor does not borrow the tree, so it can be kept across calls and used
/// to erase the value it points to. Any structural change (insert, erase, optimize, clear,
/// load) invalidates every cursor taken before it; the tree then rejects it with
/// [`KdTreeError::StaleCursor`]. A cursor must only be used with the tree that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub(crate) node: Option<NodeId>,
    pub(crate) generation: u64,
}

impl Cursor {
    pub(crate) fn new(node: Option<NodeId>, generation: u64) -> Self {
        Self { node, generation }
    }

    /// Whether this is the one-past-the-last position.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }
}

impl<const K: usize, V, A, C> KdTree<K, V, A, C> {
    /// An in-order iterator over the stored values.
    ///
    /// The order is left subtree, node, right subtree. It is not sorted on any axis, but it is
    /// total and repeatable until the next structural change.
    pub fn iter(&self) -> Iter<'_, K, V, A, C> {
        Iter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
            remaining: self.len,
        }
    }

    /// A cursor at the first value in iteration order, or [`end`][KdTree::end] if empty.
    pub fn begin(&self) -> Cursor {
        Cursor::new(self.root.map(|root| self.leftmost(root)), self.generation)
    }

    /// The one-past-the-last cursor.
    pub fn end(&self) -> Cursor {
        Cursor::new(None, self.generation)
    }

    /// The value a cursor points to.
    pub fn get(&self, cursor: Cursor) -> Result<&V> {
        match self.check_cursor(cursor)? {
            Some(id) => Ok(&self.arena[id].value),
            None => Err(KdTreeError::PastTheEnd),
        }
    }

    /// The cursor following `cursor` in iteration order.
    pub fn advance(&self, cursor: Cursor) -> Result<Cursor> {
        match self.check_cursor(cursor)? {
            Some(id) => Ok(Cursor::new(self.successor(id), self.generation)),
            None => Err(KdTreeError::PastTheEnd),
        }
    }

    pub(crate) fn check_cursor(&self, cursor: Cursor) -> Result<Option<NodeId>> {
        if cursor.generation != self.generation {
            return Err(KdTreeError::StaleCursor {
                cursor: cursor.generation,
                current: self.generation,
            });
        }
        match cursor.node {
            Some(id) if self.arena.try_get(id).is_none() => Err(KdTreeError::StaleCursor {
                cursor: cursor.generation,
                current: self.generation,
            }),
            node => Ok(node),
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    /// The in-order successor, found through the right subtree or the parent links.
    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.arena[id].right {
            return Some(self.leftmost(right));
        }
        let mut child = id;
        let mut parent = self.arena[id].parent;
        while let Some(p) = parent {
            if self.arena[p].right == Some(child) {
                child = p;
                parent = self.arena[p].parent;
            } else {
                return Some(p);
            }
        }
        None
    }
}

/// In-order iterator over the values of a [`KdTree`], created by [`KdTree::iter`].
///
/// Two iterators compare equal when they walk the same tree and are at the same position.
pub struct Iter<'a, const K: usize, V, A, C> {
    tree: &'a KdTree<K, V, A, C>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, const K: usize, V, A, C> Iterator for Iter<'a, K, V, A, C> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        let id = self.next?;
        self.next = self.tree.successor(id);
        self.remaining -= 1;
        Some(&self.tree.arena[id].value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const K: usize, V, A, C> ExactSizeIterator for Iter<'_, K, V, A, C> {}

impl<const K: usize, V, A, C> FusedIterator for Iter<'_, K, V, A, C> {}

impl<const K: usize, V, A, C> Clone for Iter<'_, K, V, A, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<const K: usize, V, A, C> PartialEq for Iter<'_, K, V, A, C> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.next == other.next
    }
}

impl<const K: usize, V, A, C> Eq for Iter<'_, K, V, A, C> {}

impl<const K: usize, V, A, C> fmt::Debug for Iter<'_, K, V, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("next", &self.next)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, const K: usize, V, A, C> IntoIterator for &'a KdTree<K, V, A, C> {
    type Item = &'a V;
    type IntoIter = Iter<'a, K, V, A, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy region query, created by [`KdTree::find_within_range`].
///
/// Values come out in pre-order (node, left subtree, right subtree). Each pending subtree
/// carries its bounding region so that subtrees which cannot touch the query are skipped.
pub struct RangeIter<'a, const K: usize, V, A: Accessor<V>, C> {
    tree: &'a KdTree<K, V, A, C>,
    query: Region<A::Coord, K>,
    stack: Vec<(NodeId, Region<A::Coord, K>)>,
}

impl<'a, const K: usize, V, A, C> RangeIter<'a, K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    pub(crate) fn new(tree: &'a KdTree<K, V, A, C>, query: Region<A::Coord, K>) -> Self {
        let mut stack = Vec::new();
        stack.extend(tree.root.map(|root| (root, Region::unbounded())));
        Self { tree, query, stack }
    }
}

impl<'a, const K: usize, V, A, C> Iterator for RangeIter<'a, K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        let tree = self.tree;
        let (accessor, comparator) = (&tree.accessor, &tree.comparator);
        while let Some((id, bounds)) = self.stack.pop() {
            let node = &tree.arena[id];

            // right goes first so the left subtree is popped next
            if let Some(right) = node.right {
                let mut child_bounds = bounds;
                child_bounds.set_low_bound(accessor, &node.value, node.axis);
                if self.query.intersects_with(comparator, &child_bounds) {
                    self.stack.push((right, child_bounds));
                }
            }
            if let Some(left) = node.left {
                let mut child_bounds = bounds;
                child_bounds.set_high_bound(accessor, &node.value, node.axis);
                if self.query.intersects_with(comparator, &child_bounds) {
                    self.stack.push((left, child_bounds));
                }
            }

            if self.query.encloses(accessor, comparator, &node.value) {
                return Some(&node.value);
            }
        }
        None
    }
}

impl<const K: usize, V, A, C> FusedIterator for RangeIter<'_, K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
}
