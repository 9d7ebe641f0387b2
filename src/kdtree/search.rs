use num_traits::Num;

use crate::kdtree::node::NodeId;
use crate::kdtree::traversal::RangeIter;
use crate::kdtree::{DistanceMetric, KdTree, Region};
use crate::r#type::{Accessor, Comparator};

impl<const K: usize, V, A, C> KdTree<K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    /// The degenerate region at `value`.
    pub fn region_of(&self, value: &V) -> Region<A::Coord, K> {
        Region::around_point(&self.accessor, value)
    }

    /// Search the tree for values inside `region`.
    ///
    /// The iterator is lazy and yields in tree order; call again to restart the query.
    pub fn find_within_range(&self, region: &Region<A::Coord, K>) -> RangeIter<'_, K, V, A, C> {
        RangeIter::new(self, *region)
    }

    /// Count the values inside `region`.
    pub fn count_within_range(&self, region: &Region<A::Coord, K>) -> usize {
        self.find_within_range(region).count()
    }

    /// Call `visitor` on every value inside `region`.
    pub fn visit_within_range(&self, region: &Region<A::Coord, K>, mut visitor: impl FnMut(&V)) {
        for value in self.find_within_range(region) {
            visitor(value);
        }
    }

    /// Search the tree for values within `radius` of `target` on every axis.
    ///
    /// This is the hypercube `[c - radius, c + radius]`, not a ball; see
    /// [`find_within_radius`][KdTree::find_within_radius] for a distance check.
    pub fn find_within_distance(&self, target: &V, radius: A::Coord) -> RangeIter<'_, K, V, A, C>
    where
        A::Coord: Num,
    {
        RangeIter::new(
            self,
            Region::around_point_with_radius(&self.accessor, target, radius),
        )
    }

    /// Search the tree for values whose distance to `target` is at most `radius`.
    ///
    /// Results are in tree order.
    pub fn find_within_radius<M>(&self, target: &V, radius: A::Coord, metric: &M) -> Vec<&V>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.find_within_distance(target, radius)
            .filter(|value| {
                let d = metric.distance::<K, A>(&self.accessor, target, value);
                !self.comparator.less(&radius, &d)
            })
            .collect()
    }

    /// The stored value closest to `target`, with its distance.
    ///
    /// Returns `None` on an empty tree. When several values are equally close, the first one
    /// met in search order wins.
    pub fn find_nearest<M>(&self, target: &V, metric: &M) -> Option<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.find_nearest_if(target, None, metric, |_| true)
    }

    /// Like [`find_nearest`][KdTree::find_nearest], ignoring values farther than `max_distance`.
    pub fn find_nearest_within<M>(
        &self,
        target: &V,
        max_distance: A::Coord,
        metric: &M,
    ) -> Option<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.find_nearest_if(target, Some(max_distance), metric, |_| true)
    }

    /// The closest value to `target` among those accepted by `predicate`.
    pub fn find_nearest_if<M, P>(
        &self,
        target: &V,
        max_distance: Option<A::Coord>,
        metric: &M,
        predicate: P,
    ) -> Option<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
        P: FnMut(&V) -> bool,
    {
        self.nearest_search(target, 1, max_distance, metric, predicate)
            .into_iter()
            .next()
            .map(|(id, d)| (&self.arena[id].value, d))
    }

    /// The `k` values closest to `target`, nearest first.
    ///
    /// Values farther than `max_distance`, if given, are left out, so fewer than `k` may come
    /// back. Equal distances keep search order.
    pub fn nearest_k<M>(
        &self,
        target: &V,
        k: usize,
        max_distance: Option<A::Coord>,
        metric: &M,
    ) -> Vec<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.nearest_search(target, k, max_distance, metric, |_| true)
            .into_iter()
            .map(|(id, d)| (&self.arena[id].value, d))
            .collect()
    }

    /// The stored value farthest from `target`, with its distance.
    pub fn find_furthest<M>(&self, target: &V, metric: &M) -> Option<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.furthest_k(target, 1, metric).into_iter().next()
    }

    /// The `k` values farthest from `target`, farthest first.
    pub fn furthest_k<M>(&self, target: &V, k: usize, metric: &M) -> Vec<(&V, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        self.furthest_search(target, k, metric)
            .into_iter()
            .map(|(id, d)| (&self.arena[id].value, d))
            .collect()
    }

    /// Depth-first branch and bound, nearer child first.
    fn nearest_search<M, P>(
        &self,
        target: &V,
        k: usize,
        max_distance: Option<A::Coord>,
        metric: &M,
        mut predicate: P,
    ) -> Vec<(NodeId, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
        P: FnMut(&V) -> bool,
    {
        let (Some(root), true) = (self.root, k > 0) else {
            return Vec::new();
        };
        let (accessor, comparator) = (&self.accessor, &self.comparator);
        let center = Region::around_point(accessor, target);
        let mut best = Candidates::new(k);

        let mut stack = vec![(root, Region::unbounded())];
        while let Some((id, bounds)) = stack.pop() {
            let radius = if best.is_full() {
                best.worst()
            } else {
                max_distance
            };
            if let Some(radius) = radius {
                if !bounds.intersects_with_center(comparator, &center, radius) {
                    continue;
                }
            }

            let node = &self.arena[id];
            if predicate(&node.value) {
                let d = metric.distance::<K, A>(accessor, target, &node.value);
                let in_range = max_distance.map_or(true, |max| !comparator.less(&max, &d));
                if in_range {
                    best.offer(id, d, |a, b| comparator.less(a, b));
                }
            }

            let (near, far) = self.children_by_side(id, target, bounds);
            stack.extend(far);
            stack.extend(near);
        }

        best.items
    }

    /// Depth-first branch and bound for the largest distances, farther child first.
    fn furthest_search<M>(&self, target: &V, k: usize, metric: &M) -> Vec<(NodeId, A::Coord)>
    where
        A::Coord: Num,
        M: DistanceMetric<V, A::Coord>,
    {
        let (Some(root), true) = (self.root, k > 0) else {
            return Vec::new();
        };
        let (accessor, comparator) = (&self.accessor, &self.comparator);
        let center = Region::around_point(accessor, target);
        let mut best = Candidates::new(k);

        let mut stack = vec![(root, Region::unbounded())];
        while let Some((id, bounds)) = stack.pop() {
            if let (true, Some(worst)) = (best.is_full(), best.worst()) {
                let reach = bounds.farthest_extent(comparator, &center);
                if reach.is_some_and(|reach| comparator.less(&reach, &worst)) {
                    continue;
                }
            }

            let node = &self.arena[id];
            let d = metric.distance::<K, A>(accessor, target, &node.value);
            best.offer(id, d, |a, b| comparator.less(b, a));

            let (near, far) = self.children_by_side(id, target, bounds);
            stack.extend(near);
            stack.extend(far);
        }

        best.items
    }

    /// The children of `id` with their regions, split into the side `target` would descend
    /// into and the other one.
    #[allow(clippy::type_complexity)]
    fn children_by_side(
        &self,
        id: NodeId,
        target: &V,
        bounds: Region<A::Coord, K>,
    ) -> (
        Option<(NodeId, Region<A::Coord, K>)>,
        Option<(NodeId, Region<A::Coord, K>)>,
    ) {
        let node = &self.arena[id];
        let left = node.left.map(|left| {
            let mut region = bounds;
            region.set_high_bound(&self.accessor, &node.value, node.axis);
            (left, region)
        });
        let right = node.right.map(|right| {
            let mut region = bounds;
            region.set_low_bound(&self.accessor, &node.value, node.axis);
            (right, region)
        });

        let goes_left = self.comparator.less(
            &self.accessor.coord(target, node.axis),
            &self.accessor.coord(&node.value, node.axis),
        );
        if goes_left {
            (left, right)
        } else {
            (right, left)
        }
    }
}

/// The best `capacity` candidates seen so far, best first.
struct Candidates<T> {
    items: Vec<(NodeId, T)>,
    capacity: usize,
}

impl<T: Copy> Candidates<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// The worst distance held.
    fn worst(&self) -> Option<T> {
        self.items.last().map(|(_, d)| *d)
    }

    /// Keep `(id, d)` if it ranks among the best. `better(a, b)` is true when `a` ranks
    /// strictly ahead of `b`; a newcomer goes after every candidate it does not beat.
    fn offer(&mut self, id: NodeId, d: T, better: impl Fn(&T, &T) -> bool) {
        let position = self.items.partition_point(|(_, held)| !better(&d, held));
        if position >= self.capacity {
            return;
        }
        self.items.insert(position, (id, d));
        self.items.truncate(self.capacity);
    }
}
