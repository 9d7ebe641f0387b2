use std::ops::Index;

/// Extracts the coordinate of a stored value along one axis.
///
/// The tree never looks at values directly; every ordering and containment decision goes
/// through an accessor and a [`Comparator`]. Closures of the form `Fn(&V, usize) -> T` are
/// accessors.
///
/// `axis` is always in `0..K`.
pub trait Accessor<V> {
    /// The coordinate type.
    type Coord: Copy;

    /// The coordinate of `value` along `axis`.
    fn coord(&self, value: &V, axis: usize) -> Self::Coord;
}

impl<V, T, F> Accessor<V> for F
where
    F: Fn(&V, usize) -> T,
    T: Copy,
{
    type Coord = T;

    #[inline]
    fn coord(&self, value: &V, axis: usize) -> T {
        self(value, axis)
    }
}

/// Accessor for anything indexable by axis, such as `[f64; 3]` or `Vec<i32>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexAccessor;

impl<V> Accessor<V> for IndexAccessor
where
    V: Index<usize>,
    V::Output: Copy + Sized,
{
    type Coord = V::Output;

    #[inline]
    fn coord(&self, value: &V, axis: usize) -> V::Output {
        value[axis]
    }
}

/// A strict weak ordering over coordinates.
///
/// This is a precondition that is documented, not checked: `less(a, a)` must be false and
/// "neither is less" must be transitive. Two coordinates are considered equal when neither is
/// less than the other. Closures of the form `Fn(&T, &T) -> bool` are comparators.
pub trait Comparator<T> {
    /// `true` iff `a` orders strictly before `b`.
    fn less(&self, a: &T, b: &T) -> bool;

    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// Comparator using [`PartialOrd`]. Coordinates must not be NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessThan;

impl<T: PartialOrd> Comparator<T> for LessThan {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Comparator reversing another one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reversed<C>(pub C);

impl<T, C: Comparator<T>> Comparator<T> for Reversed<C> {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self.0.less(b, a)
    }
}

/// Absolute difference of two coordinates, computed with the comparator.
#[inline]
pub(crate) fn abs_diff<T, C>(comparator: &C, a: T, b: T) -> T
where
    T: Copy + num_traits::Num,
    C: Comparator<T>,
{
    if comparator.less(&a, &b) {
        b - a
    } else {
        a - b
    }
}
