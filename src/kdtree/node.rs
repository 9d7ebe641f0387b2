//! Node storage.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. A node is owned by exactly one slot:
//! its parent's left or right child slot, or the tree's root slot. The parent link is a plain
//! back reference used for in-order navigation.

use tinyvec::TinyVec;

pub(crate) type NodeId = usize;

/// Stack used by index-only walks over the arena.
pub(crate) type NodeStack = TinyVec<[NodeId; 32]>;

#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    /// The axis this node splits on.
    pub(crate) axis: usize,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<V> Node<V> {
    pub(crate) fn new(value: V, axis: usize, parent: Option<NodeId>) -> Self {
        Self {
            value,
            axis,
            left: None,
            right: None,
            parent,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeArena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
}

impl<V> Default for NodeArena<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<V> NodeArena<V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.slots[id].is_none());
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Remove a node, returning it. Its id may be handed out again by the next `alloc`.
    pub(crate) fn take(&mut self, id: NodeId) -> Node<V> {
        match self.slots.get_mut(id).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => unreachable!("node {id} is not allocated"),
        }
    }

    /// The node at `id`, or `None` if the slot is vacant or out of range.
    #[inline]
    pub(crate) fn try_get(&self, id: NodeId) -> Option<&Node<V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Number of live nodes.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Take out every node of the subtree rooted at `root`, collecting their values.
    pub(crate) fn drain_subtree(&mut self, root: Option<NodeId>, out: &mut Vec<V>) {
        let mut stack = NodeStack::new();
        if let Some(root) = root {
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            let node = self.take(id);
            if let Some(left) = node.left {
                stack.push(left);
            }
            if let Some(right) = node.right {
                stack.push(right);
            }
            out.push(node.value);
        }
    }
}

impl<V> std::ops::Index<NodeId> for NodeArena<V> {
    type Output = Node<V>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<V> {
        match self.try_get(id) {
            Some(node) => node,
            None => unreachable!("node {id} is not allocated"),
        }
    }
}

impl<V> std::ops::IndexMut<NodeId> for NodeArena<V> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("node {id} is not allocated"),
        }
    }
}
