use std::cmp;

use crate::kdtree::node::{Node, NodeArena, NodeId};
use crate::kdtree::KdTree;
use crate::r#type::{Accessor, Comparator, IndexAccessor, LessThan};

/// A builder to create a balanced [`KdTree`] from a batch of values.
///
/// Values are buffered and the tree is built in one pass by repeated median selection, which
/// gives a tree of height `floor(log2(n)) + 1` (for distinct coordinates) instead of the shape
/// that repeated [`KdTree::insert`] calls would produce.
pub struct KdTreeBuilder<const K: usize, V, A = IndexAccessor, C = LessThan> {
    values: Vec<V>,
    accessor: A,
    comparator: C,
}

impl<const K: usize, V, A: Default, C: Default> KdTreeBuilder<K, V, A, C> {
    /// Create a new builder with the default accessor and comparator.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new builder with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            accessor: A::default(),
            comparator: C::default(),
        }
    }
}

impl<const K: usize, V, A: Default, C: Default> Default for KdTreeBuilder<K, V, A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const K: usize, V, A, C> KdTreeBuilder<K, V, A, C> {
    /// Create a new builder with the provided accessor and comparator.
    pub fn with_accessor_and_comparator(accessor: A, comparator: C) -> Self {
        Self {
            values: Vec::new(),
            accessor,
            comparator,
        }
    }

    /// Add a value, returning its insertion index.
    pub fn add(&mut self, value: V) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// The number of values added so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value has been added yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<const K: usize, V, A, C> KdTreeBuilder<K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    /// Consume this builder, performing the median split and generating a balanced tree.
    pub fn finish(self) -> KdTree<K, V, A, C> {
        let num_items = self.values.len();
        let mut arena = NodeArena::with_capacity(num_items);
        let root = build_balanced::<K, _, _, _>(
            &mut arena,
            self.values,
            0,
            None,
            &self.accessor,
            &self.comparator,
        );
        log::debug!("built balanced kd-tree of {} values", num_items);
        KdTree::from_parts(arena, root, num_items, self.accessor, self.comparator)
    }
}

impl<const K: usize, V, A, C> Extend<V> for KdTreeBuilder<K, V, A, C> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl<const K: usize, V, A, C> FromIterator<V> for KdTree<K, V, A, C>
where
    A: Accessor<V> + Default,
    C: Comparator<A::Coord> + Default,
{
    /// Builds a balanced tree, see [`KdTreeBuilder`].
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut builder = KdTreeBuilder::new();
        builder.extend(iter);
        builder.finish()
    }
}

/// Where a pending subtree gets attached once its root is allocated.
#[derive(Clone, Copy)]
enum Slot {
    /// The subtree returned to the caller, hanging below the given parent.
    Top(Option<NodeId>),
    Left(NodeId),
    Right(NodeId),
}

impl Slot {
    fn parent(self) -> Option<NodeId> {
        match self {
            Slot::Top(parent) => parent,
            Slot::Left(parent) | Slot::Right(parent) => Some(parent),
        }
    }
}

/// Build a balanced subtree over `values` splitting on `axis`, allocating its nodes in `arena`.
///
/// Returns the id of the subtree root, or `None` when `values` is empty. The work is driven by
/// an explicit stack: ties on an axis always go right, so duplicates can make the subtree
/// arbitrarily deep.
pub(crate) fn build_balanced<const K: usize, V, A, C>(
    arena: &mut NodeArena<V>,
    values: Vec<V>,
    axis: usize,
    parent: Option<NodeId>,
    accessor: &A,
    comparator: &C,
) -> Option<NodeId>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    let mut top = None;
    let mut pending = vec![(values, axis, Slot::Top(parent))];

    while let Some((mut values, axis, slot)) = pending.pop() {
        let id = if all_same_coords::<K, _, _, _>(&values, accessor, comparator) {
            build_chain::<K, _>(arena, values, axis, slot.parent())
        } else {
            let split = median_split(&mut values, axis, accessor, comparator);
            let right = values.split_off(split + 1);
            match values.pop() {
                Some(value) => {
                    let id = arena.alloc(Node::new(value, axis, slot.parent()));
                    let next_axis = (axis + 1) % K;
                    pending.push((right, next_axis, Slot::Right(id)));
                    pending.push((values, next_axis, Slot::Left(id)));
                    Some(id)
                }
                None => None,
            }
        };

        match slot {
            Slot::Top(_) => top = id,
            Slot::Left(parent) => arena[parent].left = id,
            Slot::Right(parent) => arena[parent].right = id,
        }
    }
    top
}

/// Whether every value shares the coordinates of the first one on all axes.
fn all_same_coords<const K: usize, V, A, C>(values: &[V], accessor: &A, comparator: &C) -> bool
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    let Some((first, rest)) = values.split_first() else {
        return true;
    };
    rest.iter().all(|value| {
        (0..K).all(|axis| {
            comparator.equal(&accessor.coord(first, axis), &accessor.coord(value, axis))
        })
    })
}

/// Link identical values into a right-leaning chain, the only shape the partition rule allows
/// for them.
fn build_chain<const K: usize, V>(
    arena: &mut NodeArena<V>,
    values: Vec<V>,
    mut axis: usize,
    parent: Option<NodeId>,
) -> Option<NodeId> {
    let mut top = None;
    let mut last: Option<NodeId> = None;
    for value in values {
        let id = arena.alloc(Node::new(value, axis, last.or(parent)));
        match last {
            Some(prev) => arena[prev].right = Some(id),
            None => top = Some(id),
        }
        last = Some(id);
        axis = (axis + 1) % K;
    }
    top
}

/// Reorder `values` around the median on `axis` and return the index of the subtree root.
///
/// Afterwards everything before the returned index is strictly less on `axis` and everything
/// after it is not less. Values equal to the median on `axis` all end up on the right, the
/// root being the leftmost of them.
pub(crate) fn median_split<V, A, C>(
    values: &mut [V],
    axis: usize,
    accessor: &A,
    comparator: &C,
) -> usize
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    let len = values.len();
    if len < 2 {
        return 0;
    }

    let m = len >> 1;
    select(values, m, 0, len - 1, axis, accessor, comparator);

    let t = accessor.coord(&values[m], axis);
    let mut split = 0;
    for i in 0..m {
        if comparator.less(&accessor.coord(&values[i], axis), &t) {
            values.swap(split, i);
            split += 1;
        }
    }
    values.swap(split, m);
    split
}

/// Floyd-Rivest selection: reorder `values` so that [left..k-1] are not greater than the k-th
/// item on `axis` and [k+1..right] are not less.
///
/// `k` must be at least 1.
fn select<V, A, C>(
    values: &mut [V],
    k: usize,
    mut left: usize,
    mut right: usize,
    axis: usize,
    accessor: &A,
    comparator: &C,
) where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    let coord = |value: &V| accessor.coord(value, axis);

    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = f64::ln(n);
            let s = 0.5 * f64::exp((2.0 * z) / 3.0);
            let sd = 0.5
                * f64::sqrt((z * s * (n - s)) / n)
                * (if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 });
            let new_left = cmp::max(left, f64::floor(k as f64 - (m * s) / n + sd) as usize);
            let new_right = cmp::min(
                right,
                f64::floor(k as f64 + ((n - m) * s) / n + sd) as usize,
            );
            select(values, k, new_left, new_right, axis, accessor, comparator);
        }

        let t = coord(&values[k]);
        let mut i = left;
        let mut j = right;

        values.swap(left, k);
        if comparator.less(&t, &coord(&values[right])) {
            values.swap(left, right);
        }

        while i < j {
            values.swap(i, j);
            i += 1;
            j -= 1;
            while comparator.less(&coord(&values[i]), &t) {
                i += 1;
            }
            while comparator.less(&t, &coord(&values[j])) {
                j -= 1;
            }
        }

        if comparator.equal(&coord(&values[left]), &t) {
            values.swap(left, j);
        } else {
            j += 1;
            values.swap(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            right = j - 1;
        }
    }
}
