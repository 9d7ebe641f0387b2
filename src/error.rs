use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdTreeError {
    /// A failure with no dedicated variant, such as a value too large to persist.
    #[error("General error: {0}")]
    General(String),

    /// A [`Cursor`][crate::kdtree::Cursor] was used after the tree it came from was
    /// structurally modified.
    #[error("Stale cursor: taken at generation {cursor}, tree is at generation {current}")]
    StaleCursor { cursor: u64, current: u64 },

    /// The end cursor was dereferenced.
    #[error("Cursor is past the end of the tree")]
    PastTheEnd,

    /// Persisted data was written by a tree with a different number of dimensions.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Persisted data does not decode to a well-formed tree.
    #[error("Corrupt tree data: {0}")]
    Corruption(String),

    /// A value could not be encoded while persisting the tree.
    #[cfg(feature = "serde")]
    #[error("Failed to encode value: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Returned by [`KdTree::validate`][crate::kdtree::KdTree::validate].
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, KdTreeError>;
