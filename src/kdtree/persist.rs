//! Binary persistence of the exact tree shape.
//!
//! Layout: an 8-byte header (magic, `version << 4`, dimensions as little-endian `u16`, value
//! count as little-endian `u32`) followed by one record per node in pre-order. A record is a
//! flag byte ([`HAS_LEFT`], [`HAS_RIGHT`]) and the value encoded by `bincode` through its
//! `serde` implementation, at most [`KDTREE_MAX_VALUE_BYTES`] long. Axes are not stored; they
//! follow from depth.

use bincode::config::standard;
use bincode::error::DecodeError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{KdTreeError, Result};
use crate::kdtree::constants::{
    HAS_LEFT, HAS_RIGHT, KDTREE_HEADER_SIZE, KDTREE_MAGIC, KDTREE_MAX_VALUE_BYTES, KDTREE_VERSION,
};
use crate::kdtree::index::check_structure;
use crate::kdtree::node::{Node, NodeArena, NodeId, NodeStack};
use crate::kdtree::KdTree;
use crate::r#type::{Accessor, Comparator};

impl<const K: usize, V, A, C> KdTree<K, V, A, C>
where
    A: Accessor<V>,
    C: Comparator<A::Coord>,
{
    /// Encode the tree, shape included, into a byte buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>>
    where
        V: Serialize,
    {
        let dims = u16::try_from(K).map_err(|_| {
            KdTreeError::General(format!("{} dimensions do not fit the header", K))
        })?;
        let count = u32::try_from(self.len).map_err(|_| {
            KdTreeError::General(format!("{} values do not fit the header", self.len))
        })?;

        let mut data = Vec::with_capacity(KDTREE_HEADER_SIZE + self.len * 2);
        data.push(KDTREE_MAGIC);
        data.push(KDTREE_VERSION << 4);
        data.extend_from_slice(bytemuck::bytes_of(&dims.to_le()));
        data.extend_from_slice(bytemuck::bytes_of(&count.to_le()));

        let mut stack = NodeStack::new();
        if let Some(root) = self.root {
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            let mut flags = 0;
            if node.left.is_some() {
                flags |= HAS_LEFT;
            }
            if node.right.is_some() {
                flags |= HAS_RIGHT;
            }
            data.push(flags);
            let written =
                bincode::serde::encode_into_std_write(&node.value, &mut data, standard())?;
            if written > KDTREE_MAX_VALUE_BYTES {
                return Err(KdTreeError::General(format!(
                    "value of {} bytes exceeds the {} byte limit",
                    written, KDTREE_MAX_VALUE_BYTES
                )));
            }

            if let Some(right) = node.right {
                stack.push(right);
            }
            if let Some(left) = node.left {
                stack.push(left);
            }
        }
        Ok(data)
    }

    /// Replace the contents of this tree with a tree decoded from `data`.
    ///
    /// On error the tree is left exactly as it was. On success all cursors are invalidated.
    pub fn load(&mut self, data: &[u8]) -> Result<()>
    where
        V: DeserializeOwned,
    {
        let (arena, root, len) = self.decode(data)?;
        self.arena = arena;
        self.root = root;
        self.len = len;
        self.bump();
        log::debug!("loaded kd-tree of {} values ({} bytes)", len, data.len());
        Ok(())
    }

    /// Decode a tree produced by [`to_bytes`][KdTree::to_bytes].
    pub fn from_bytes(data: &[u8], accessor: A, comparator: C) -> Result<Self>
    where
        V: DeserializeOwned,
    {
        let mut tree = Self::with_accessor_and_comparator(accessor, comparator);
        tree.load(data)?;
        Ok(tree)
    }

    fn decode(&self, data: &[u8]) -> Result<(NodeArena<V>, Option<NodeId>, usize)>
    where
        V: DeserializeOwned,
    {
        if data.len() < KDTREE_HEADER_SIZE {
            return Err(corrupt(format!(
                "{} bytes is shorter than the header",
                data.len()
            )));
        }
        if data[0] != KDTREE_MAGIC {
            return Err(corrupt("data not in kd-tree format".to_string()));
        }
        let version = data[1] >> 4;
        if version != KDTREE_VERSION || data[1] & 0x0f != 0 {
            return Err(corrupt(format!(
                "got v{} data when expected v{}",
                version, KDTREE_VERSION
            )));
        }

        let dims = u16::from_le(bytemuck::pod_read_unaligned(&data[2..4])) as usize;
        if dims != K {
            return Err(KdTreeError::DimensionMismatch {
                expected: K,
                found: dims,
            });
        }
        let count = u32::from_le(bytemuck::pod_read_unaligned(&data[4..8])) as usize;
        let body = &data[KDTREE_HEADER_SIZE..];

        // Every record takes at least two bytes, so a count above that is bogus anyway.
        let mut arena = NodeArena::with_capacity(count.min(body.len() / 2));
        let mut root = None;
        let mut read = 0;
        let mut pos = 0;

        // Child slots still to be filled: (parent, is_left, axis).
        let mut pending: Vec<(Option<NodeId>, bool, usize)> = Vec::new();
        if count > 0 {
            pending.push((None, false, 0));
        }
        while let Some((parent, is_left, axis)) = pending.pop() {
            if read == count {
                return Err(corrupt(format!(
                    "child markers point past the {} values in the header",
                    count
                )));
            }
            let flags = *body
                .get(pos)
                .ok_or_else(|| corrupt(format!("truncated before value {}", read)))?;
            pos += 1;
            if flags & !(HAS_LEFT | HAS_RIGHT) != 0 {
                return Err(corrupt(format!(
                    "unknown flags {:#04x} on value {}",
                    flags, read
                )));
            }

            let config = standard().with_limit::<KDTREE_MAX_VALUE_BYTES>();
            let (value, used): (V, usize) = bincode::serde::decode_from_slice(&body[pos..], config)
                .map_err(|e| match e {
                    DecodeError::LimitExceeded => corrupt(format!(
                        "value {} claims more than {} bytes",
                        read, KDTREE_MAX_VALUE_BYTES
                    )),
                    e => corrupt(format!("value {} failed to decode: {}", read, e)),
                })?;
            pos += used;

            let id = arena.alloc(Node::new(value, axis, parent));
            match parent {
                None => root = Some(id),
                Some(parent) if is_left => arena[parent].left = Some(id),
                Some(parent) => arena[parent].right = Some(id),
            }
            read += 1;

            let child_axis = (axis + 1) % K;
            if flags & HAS_RIGHT != 0 {
                pending.push((Some(id), false, child_axis));
            }
            if flags & HAS_LEFT != 0 {
                pending.push((Some(id), true, child_axis));
            }
        }

        if read != count {
            return Err(corrupt(format!(
                "header declares {} values, found {}",
                count, read
            )));
        }
        if pos != body.len() {
            return Err(corrupt(format!(
                "{} trailing bytes after the last value",
                body.len() - pos
            )));
        }
        check_structure::<K, _, _, _>(&arena, root, read, &self.accessor, &self.comparator)
            .map_err(corrupt)?;

        Ok((arena, root, read))
    }
}

fn corrupt(message: String) -> KdTreeError {
    log::warn!("rejected persisted kd-tree: {}", message);
    KdTreeError::Corruption(message)
}
