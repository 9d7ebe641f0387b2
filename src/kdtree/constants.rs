/// The first byte of every persisted tree.
pub(crate) const KDTREE_MAGIC: u8 = 0x6b;

/// Format version, stored in the high nibble of the second byte.
pub(crate) const KDTREE_VERSION: u8 = 1;

/// Magic, version, dimensions (u16) and value count (u32).
pub(crate) const KDTREE_HEADER_SIZE: usize = 8;

/// Record flag: a left subtree follows.
pub(crate) const HAS_LEFT: u8 = 0b01;

/// Record flag: a right subtree follows (after the left one, if any).
pub(crate) const HAS_RIGHT: u8 = 0b10;

/// Upper bound on the encoded size of one value. Length prefixes claiming more are corrupt.
pub(crate) const KDTREE_MAX_VALUE_BYTES: usize = 1 << 24;
