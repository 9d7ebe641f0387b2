//! An implementation of a mutable, generic K-d tree.

#![warn(missing_docs)]

mod builder;
#[cfg(feature = "serde")]
pub(crate) mod constants;
mod distance;
mod index;
pub(crate) mod node;
#[cfg(feature = "serde")]
mod persist;
mod region;
mod search;
mod traversal;

pub use builder::KdTreeBuilder;
pub use distance::{ChebyshevDistance, DistanceMetric, EuclideanDistance, ManhattanDistance};
pub use index::KdTree;
pub use region::Region;
pub use traversal::{Cursor, Iter, RangeIter};

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod test;
