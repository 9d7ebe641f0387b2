//! Distance metrics for nearest and furthest queries.
//!
//! The tree itself never measures distance; searches take a [`DistanceMetric`]. Any closure
//! `Fn(&V, &V) -> T` is a metric, and the structs here cover the common norms over the tree's
//! accessor.
//!
//! Pruning relies on two properties that are documented, not checked. Nearest searches need
//! `|a_i - b_i| <= d(a, b)` on every axis, furthest searches also need
//! `d(a, b) <= sum_i |a_i - b_i|`. Every Lp norm with p >= 1 has both. The distance type is the
//! coordinate type.

use num_traits::{Float, Signed};

use crate::r#type::Accessor;

/// A trait for calculating the distance between two stored values.
pub trait DistanceMetric<V, T> {
    /// The distance between `a` and `b`, reading coordinates through `accessor`.
    fn distance<const K: usize, A>(&self, accessor: &A, a: &V, b: &V) -> T
    where
        A: Accessor<V, Coord = T>;
}

impl<V, T, F> DistanceMetric<V, T> for F
where
    F: Fn(&V, &V) -> T,
{
    #[inline]
    fn distance<const K: usize, A>(&self, _accessor: &A, a: &V, b: &V) -> T
    where
        A: Accessor<V, Coord = T>,
    {
        self(a, b)
    }
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl<V, T: Float> DistanceMetric<V, T> for EuclideanDistance {
    #[inline]
    fn distance<const K: usize, A>(&self, accessor: &A, a: &V, b: &V) -> T
    where
        A: Accessor<V, Coord = T>,
    {
        (0..K)
            .fold(T::zero(), |sum, axis| {
                let d = accessor.coord(a, axis) - accessor.coord(b, axis);
                sum + d * d
            })
            .sqrt()
    }
}

/// Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanDistance;

impl<V, T: Signed + Copy> DistanceMetric<V, T> for ManhattanDistance {
    #[inline]
    fn distance<const K: usize, A>(&self, accessor: &A, a: &V, b: &V) -> T
    where
        A: Accessor<V, Coord = T>,
    {
        (0..K).fold(T::zero(), |sum, axis| {
            sum + (accessor.coord(a, axis) - accessor.coord(b, axis)).abs()
        })
    }
}

/// Chebyshev (L-infinity) distance, the largest per-axis difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChebyshevDistance;

impl<V, T: Signed + PartialOrd + Copy> DistanceMetric<V, T> for ChebyshevDistance {
    #[inline]
    fn distance<const K: usize, A>(&self, accessor: &A, a: &V, b: &V) -> T
    where
        A: Accessor<V, Coord = T>,
    {
        (0..K).fold(T::zero(), |max, axis| {
            let d = (accessor.coord(a, axis) - accessor.coord(b, axis)).abs();
            if d > max {
                d
            } else {
                max
            }
        })
    }
}
