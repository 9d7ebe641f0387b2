use std::fmt;

use crate::error::{KdTreeError, Result};
use crate::kdtree::builder::build_balanced;
use crate::kdtree::node::{Node, NodeArena, NodeId};
use crate::kdtree::{Cursor, Region};
use crate::r#type::{Accessor, Comparator, IndexAccessor, LessThan};

/// A mutable K-d tree over values of type `V`.
///
/// Each depth level splits on the next of the `K` axes, wrapping around: the root splits on
/// axis 0, its children on axis 1, and so on. At a node splitting on axis `a`, values whose
/// coordinate `a` is strictly less than the node's go left, all others (including ties) go
/// right.
///
/// Coordinates are read through the accessor `A` and ordered by the comparator `C`; the tree
/// never compares values by itself. The defaults read `value[axis]` and order with
/// [`PartialOrd`], which fits arrays such as `[f64; 3]`.
///
/// Plain inserts do not rebalance, so the shape depends on insertion order. Call
/// [`optimize`][KdTree::optimize] (or build with [`KdTreeBuilder`][crate::kdtree::KdTreeBuilder])
/// to get a tree of logarithmic height.
///
/// The tree does no locking. Queries take `&self` and may run side by side; mutation takes
/// `&mut self`.
///
/// ```
/// use kdtree_index::kdtree::{EuclideanDistance, KdTree};
///
/// let mut tree = KdTree::<2, [f64; 2]>::new();
/// tree.insert([0., 0.]);
/// tree.insert([3., 4.]);
/// tree.insert([1., 1.]);
///
/// let (nearest, distance) = tree.find_nearest(&[2.5, 3.5], &EuclideanDistance).unwrap();
/// assert_eq!(nearest, &[3., 4.]);
/// assert!(distance < 1.);
/// ```
#[derive(Clone)]
pub struct KdTree<const K: usize, V, A = IndexAccessor, C = LessThan> {
    pub(crate) arena: NodeArena<V>,
    pub(crate) root: Option<NodeId>,
    pub(crate) len: usize,
    /// Bumped on every structural mutation; cursors carry the value they were taken at.
    pub(crate) generation: u64,
    pub(crate) accessor: A,
    pub(crate) comparator: C,
}

impl<const K: usize, V, A: Default, C: Default> KdTree<K, V, A, C> {
    /// Create an empty tree with the default accessor and comparator.
    pub fn new() -> Self {
        Self::with_accessor_and_comparator(A::default(), C::default())
    }
}

impl<const K: usize, V, A, C: Default> KdTree<K, V, A, C> {
    /// Create an empty tree reading coordinates through `accessor`.
    pub fn with_accessor(accessor: A) -> Self {
        Self::with_accessor_and_comparator(accessor, C::default())
    }
}

impl<const K: usize, V, A: Default, C: Default> Default for KdTree<K, V, A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const K: usize, V, A, C> KdTree<K, V, A, C> {
    const DIMENSIONS: () = assert!(K > 0, "a kd-tree needs at least one dimension");

    /// Create an empty tree with the provided accessor and comparator.
    pub fn with_accessor_and_comparator(accessor: A, comparator: C) -> Self {
        Self::from_parts(NodeArena::default(), None, 0, accessor, comparator)
    }

    pub(crate) fn from_parts(
        arena: NodeArena<V>,
        root: Option<NodeId>,
        len: usize,
        accessor: A,
        comparator: C,
    ) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::DIMENSIONS;
        Self {
            arena,
            root,
            len,
            generation: 0,
            accessor,
            comparator,
        }
    }

    /// The number of values in this tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The coordinate accessor.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// The coordinate comparator.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// The number of levels of this tree; 0 when empty.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        stack.extend(self.root.map(|root| (root, 1)));
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.arena[id];
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }
        height
    }

    /// Remove every value. Invalidates all cursors.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
        self.bump();
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<const K: usize, V, A, C> KdTree<K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    /// Insert a value and return a cursor to it.
    ///
    /// The value descends to an empty child slot: left when its coordinate on the node's axis
    /// is strictly less, right otherwise. No rebalancing happens. Invalidates all earlier
    /// cursors.
    pub fn insert(&mut self, value: V) -> Cursor {
        let id = match self.root {
            None => {
                let id = self.arena.alloc(Node::new(value, 0, None));
                self.root = Some(id);
                id
            }
            Some(mut current) => loop {
                let node = &self.arena[current];
                let axis = node.axis;
                let go_left = self.comparator.less(
                    &self.accessor.coord(&value, axis),
                    &self.accessor.coord(&node.value, axis),
                );
                let next = if go_left { node.left } else { node.right };
                match next {
                    Some(child) => current = child,
                    None => {
                        let id = self
                            .arena
                            .alloc(Node::new(value, (axis + 1) % K, Some(current)));
                        let parent = &mut self.arena[current];
                        if go_left {
                            parent.left = Some(id);
                        } else {
                            parent.right = Some(id);
                        }
                        break id;
                    }
                }
            },
        };

        self.len += 1;
        self.bump();
        log::trace!("inserted node {} ({} values)", id, self.len);
        Cursor::new(Some(id), self.generation)
    }

    /// Rebuild the whole tree by recursive median selection.
    ///
    /// The stored values are unchanged, the shape becomes balanced. Invalidates all cursors.
    pub fn optimize(&mut self) {
        let mut values = Vec::with_capacity(self.len);
        self.arena.drain_subtree(self.root, &mut values);
        self.arena.clear();
        self.root = build_balanced::<K, _, _, _>(
            &mut self.arena,
            values,
            0,
            None,
            &self.accessor,
            &self.comparator,
        );
        self.bump();
        log::debug!(
            "optimized kd-tree: {} values, height {}",
            self.len,
            self.height()
        );
    }

    /// Find a value whose coordinates all equal those of `value`.
    ///
    /// Returns `None` when there is no such value.
    pub fn find(&self, value: &V) -> Option<Cursor> {
        self.locate(value, |_| true)
            .map(|id| Cursor::new(Some(id), self.generation))
    }

    /// Find a value equal to `value` both by coordinates and by [`PartialEq`].
    pub fn find_exact(&self, value: &V) -> Option<Cursor>
    where
        V: PartialEq,
    {
        self.locate(value, |candidate| candidate == value)
            .map(|id| Cursor::new(Some(id), self.generation))
    }

    /// Whether a value with the same coordinates as `value` is stored.
    pub fn contains(&self, value: &V) -> bool {
        self.locate(value, |_| true).is_some()
    }

    /// Remove a value whose coordinates all equal those of `value`, returning it.
    ///
    /// Returns `None`, leaving the tree untouched, when there is no such value. Otherwise the
    /// subtree below the removed node is rebuilt and all cursors are invalidated.
    pub fn erase(&mut self, value: &V) -> Option<V> {
        let id = self.locate(value, |_| true)?;
        Some(self.remove_node(id))
    }

    /// Like [`erase`][KdTree::erase], additionally requiring [`PartialEq`] equality.
    pub fn erase_exact(&mut self, value: &V) -> Option<V>
    where
        V: PartialEq,
    {
        let id = self.locate(value, |candidate| candidate == value)?;
        Some(self.remove_node(id))
    }

    /// Remove the value a cursor points to, returning it.
    pub fn erase_at(&mut self, cursor: Cursor) -> Result<V> {
        match self.check_cursor(cursor)? {
            Some(id) => Ok(self.remove_node(id)),
            None => Err(KdTreeError::PastTheEnd),
        }
    }

    /// Check the structural invariants of the tree.
    ///
    /// Verifies the partition rule at every node, that every node splits on `depth % K`, the
    /// parent links and the value count.
    pub fn validate(&self) -> Result<()> {
        check_structure::<K, _, _, _>(
            &self.arena,
            self.root,
            self.len,
            &self.accessor,
            &self.comparator,
        )
        .map_err(KdTreeError::InvariantViolation)?;
        if self.arena.live() != self.len {
            return Err(KdTreeError::InvariantViolation(format!(
                "{} nodes allocated for {} values",
                self.arena.live(),
                self.len
            )));
        }
        Ok(())
    }

    /// Whether `a` and `b` have equal coordinates on every axis.
    pub(crate) fn same_coords(&self, a: &V, b: &V) -> bool {
        (0..K).all(|axis| {
            self.comparator
                .equal(&self.accessor.coord(a, axis), &self.accessor.coord(b, axis))
        })
    }

    /// Walk the insertion path of `value`, returning the first node with equal coordinates
    /// that `is_match` accepts.
    ///
    /// Values tying on a node's axis are always stored to its right, so one path suffices.
    fn locate(&self, value: &V, mut is_match: impl FnMut(&V) -> bool) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.arena[id];
            let v = self.accessor.coord(value, node.axis);
            let n = self.accessor.coord(&node.value, node.axis);
            if self.comparator.less(&v, &n) {
                current = node.left;
            } else {
                if !self.comparator.less(&n, &v)
                    && self.same_coords(value, &node.value)
                    && is_match(&node.value)
                {
                    return Some(id);
                }
                current = node.right;
            }
        }
        None
    }

    /// Detach a node and rebuild what was below it in its place.
    fn remove_node(&mut self, id: NodeId) -> V {
        // Record the side before any slot gets reused by the rebuild.
        let side = self.arena[id]
            .parent
            .map(|parent| (parent, self.arena[parent].left == Some(id)));

        let node = self.arena.take(id);
        let mut rest = Vec::new();
        self.arena.drain_subtree(node.left, &mut rest);
        self.arena.drain_subtree(node.right, &mut rest);
        let rebuilt = rest.len();

        let subtree = build_balanced::<K, _, _, _>(
            &mut self.arena,
            rest,
            node.axis,
            node.parent,
            &self.accessor,
            &self.comparator,
        );
        match side {
            Some((parent, true)) => self.arena[parent].left = subtree,
            Some((parent, false)) => self.arena[parent].right = subtree,
            None => self.root = subtree,
        }

        self.len -= 1;
        self.bump();
        if rebuilt > 0 {
            log::debug!("erase rebuilt a subtree of {} values", rebuilt);
        }
        node.value
    }
}

/// Walk the whole structure checking the partition rule, axes and parent links.
pub(crate) fn check_structure<const K: usize, V, A, C>(
    arena: &NodeArena<V>,
    root: Option<NodeId>,
    len: usize,
    accessor: &A,
    comparator: &C,
) -> std::result::Result<(), String>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    // Low bounds are inclusive, high bounds exclusive.
    let mut stack: Vec<(NodeId, usize, Region<A::Coord, K>)> = Vec::new();
    if let Some(root) = root {
        if arena[root].parent.is_some() {
            return Err(format!("root node {} has a parent", root));
        }
        stack.push((root, 0, Region::unbounded()));
    }

    let mut seen = 0;
    while let Some((id, depth, bounds)) = stack.pop() {
        seen += 1;
        if seen > len {
            return Err(format!("more than the {} recorded values are reachable", len));
        }

        let node = &arena[id];
        if node.axis != depth % K {
            return Err(format!(
                "node {} at depth {} splits on axis {}",
                id, depth, node.axis
            ));
        }

        for axis in 0..K {
            let c = accessor.coord(&node.value, axis);
            let under = bounds.low[axis]
                .as_ref()
                .is_some_and(|low| comparator.less(&c, low));
            let over = bounds.high[axis]
                .as_ref()
                .is_some_and(|high| !comparator.less(&c, high));
            if under || over {
                return Err(format!(
                    "node {} is on the wrong side of an ancestor on axis {}",
                    id, axis
                ));
            }
        }

        for (child, is_left) in [(node.left, true), (node.right, false)] {
            let Some(child) = child else {
                continue;
            };
            if arena.try_get(child).is_none() {
                return Err(format!("node {} links to a vacant slot {}", id, child));
            }
            if arena[child].parent != Some(id) {
                return Err(format!("node {} does not point back to parent {}", child, id));
            }
            let mut child_bounds = bounds;
            if is_left {
                child_bounds.set_high_bound(accessor, &node.value, node.axis);
            } else {
                child_bounds.set_low_bound(accessor, &node.value, node.axis);
            }
            stack.push((child, depth + 1, child_bounds));
        }
    }

    if seen != len {
        return Err(format!("{} values reachable, {} recorded", seen, len));
    }
    Ok(())
}

impl<const K: usize, V, A, C> Extend<V> for KdTree<K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    /// Inserts each value in turn, without rebalancing.
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<const K: usize, V: fmt::Debug, A, C> fmt::Debug for KdTree<K, V, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdTree")
            .field("dimensions", &K)
            .field("len", &self.len)
            .field("values", &DebugValues(self))
            .finish()
    }
}

struct DebugValues<'a, const K: usize, V, A, C>(&'a KdTree<K, V, A, C>);

impl<const K: usize, V: fmt::Debug, A, C> fmt::Debug for DebugValues<'_, K, V, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
