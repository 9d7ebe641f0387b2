//! Axis-aligned bounding regions used to prune subtrees during search.

use num_traits::Num;

use crate::r#type::{abs_diff, Accessor, Comparator};

/// An axis-aligned box over the K-dimensional coordinate space.
///
/// Each axis has an optional inclusive low and high bound; `None` leaves that side open, so
/// [`Region::unbounded`] covers the whole space. A region only describes space, it never owns
/// values. All comparisons go through the tree's [`Comparator`], which is passed to the methods
/// that need it.
///
/// A region whose low bound is greater than its high bound on some axis is legal and simply
/// encloses nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region<T, const K: usize> {
    pub(crate) low: [Option<T>; K],
    pub(crate) high: [Option<T>; K],
}

impl<T: Copy, const K: usize> Region<T, K> {
    /// A region bounded on every axis.
    pub fn new(low: [T; K], high: [T; K]) -> Self {
        Self {
            low: low.map(Some),
            high: high.map(Some),
        }
    }

    /// The whole coordinate space.
    pub fn unbounded() -> Self {
        Self {
            low: [None; K],
            high: [None; K],
        }
    }

    /// The degenerate box `low == high == value` on every axis.
    pub fn around_point<V, A>(accessor: &A, value: &V) -> Self
    where
        A: Accessor<V, Coord = T>,
    {
        let coords: [T; K] = std::array::from_fn(|axis| accessor.coord(value, axis));
        Self::new(coords, coords)
    }

    /// The box `[c - radius, c + radius]` on every axis.
    ///
    /// This is the hypercube enclosing the ball of the same radius, so it may enclose values
    /// that are farther than `radius` but never misses one that is closer.
    pub fn around_point_with_radius<V, A>(accessor: &A, value: &V, radius: T) -> Self
    where
        A: Accessor<V, Coord = T>,
        T: Num,
    {
        let mut region = Self::unbounded();
        for axis in 0..K {
            let c = accessor.coord(value, axis);
            region.low[axis] = Some(c - radius);
            region.high[axis] = Some(c + radius);
        }
        region
    }

    /// Restrict `axis` to `[low, high]`.
    pub fn with_bounds(mut self, axis: usize, low: T, high: T) -> Self {
        self.low[axis % K] = Some(low);
        self.high[axis % K] = Some(high);
        self
    }

    /// The low bound of `axis`, if any.
    pub fn low(&self, axis: usize) -> Option<T> {
        self.low[axis % K]
    }

    /// The high bound of `axis`, if any.
    pub fn high(&self, axis: usize) -> Option<T> {
        self.high[axis % K]
    }

    /// Whether every coordinate of `value` lies within the bounds, inclusive.
    pub fn encloses<V, A, C>(&self, accessor: &A, comparator: &C, value: &V) -> bool
    where
        A: Accessor<V, Coord = T>,
        C: Comparator<T>,
    {
        (0..K).all(|axis| {
            let c = accessor.coord(value, axis);
            !below(comparator, &c, &self.low[axis]) && !above(comparator, &c, &self.high[axis])
        })
    }

    /// Whether the two boxes overlap on every axis.
    pub fn intersects_with<C: Comparator<T>>(&self, comparator: &C, other: &Self) -> bool {
        (0..K).all(|axis| {
            let disjoint_low = match (&other.high[axis], &self.low[axis]) {
                (Some(h), Some(l)) => comparator.less(h, l),
                _ => false,
            };
            let disjoint_high = match (&self.high[axis], &other.low[axis]) {
                (Some(h), Some(l)) => comparator.less(h, l),
                _ => false,
            };
            !disjoint_low && !disjoint_high
        })
    }

    /// Whether the box overlaps the hypercube of half-width `radius` around `center`.
    ///
    /// `center` is a degenerate region: only its low bounds are read; an open bound on the
    /// center makes that axis overlap unconditionally.
    pub fn intersects_with_center<C>(&self, comparator: &C, center: &Self, radius: T) -> bool
    where
        C: Comparator<T>,
        T: Num,
    {
        (0..K).all(|axis| {
            let Some(c) = center.low[axis] else {
                return true;
            };
            if let Some(low) = &self.low[axis] {
                if comparator.less(&(c + radius), low) {
                    return false;
                }
            }
            if let Some(high) = &self.high[axis] {
                if comparator.less(high, &(c - radius)) {
                    return false;
                }
            }
            true
        })
    }

    /// Upper bound on how far from `center` anything inside this region can be, taken as the
    /// sum over axes of the larger distance to either bound. `None` if any bound is open.
    pub fn farthest_extent<C>(&self, comparator: &C, center: &Self) -> Option<T>
    where
        C: Comparator<T>,
        T: Num,
    {
        let mut total = T::zero();
        for axis in 0..K {
            let c = center.low[axis]?;
            let to_low = abs_diff(comparator, c, self.low[axis]?);
            let to_high = abs_diff(comparator, c, self.high[axis]?);
            total = total
                + if comparator.less(&to_low, &to_high) {
                    to_high
                } else {
                    to_low
                };
        }
        Some(total)
    }

    /// Replace the high bound of `axis` with the coordinate of `value`.
    pub fn set_high_bound<V, A>(&mut self, accessor: &A, value: &V, axis: usize) -> &mut Self
    where
        A: Accessor<V, Coord = T>,
    {
        let axis = axis % K;
        self.high[axis] = Some(accessor.coord(value, axis));
        self
    }

    /// Replace the low bound of `axis` with the coordinate of `value`.
    pub fn set_low_bound<V, A>(&mut self, accessor: &A, value: &V, axis: usize) -> &mut Self
    where
        A: Accessor<V, Coord = T>,
    {
        let axis = axis % K;
        self.low[axis] = Some(accessor.coord(value, axis));
        self
    }
}

#[inline]
fn below<T, C: Comparator<T>>(comparator: &C, c: &T, low: &Option<T>) -> bool {
    low.as_ref().is_some_and(|low| comparator.less(c, low))
}

#[inline]
fn above<T, C: Comparator<T>>(comparator: &C, c: &T, high: &Option<T>) -> bool {
    high.as_ref().is_some_and(|high| comparator.less(high, c))
}
