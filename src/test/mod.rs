//! Shared fixtures for the tests in this crate.


use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::kdtree::node::{NodeArena, NodeId};
use crate::kdtree::KdTree;
use crate::r#type::Accessor;

/// A point with integer coordinates, measured in `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Triplet(pub [i32; 3]);

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TripletAccessor;

impl Accessor<Triplet> for TripletAccessor {
    type Coord = f64;

    fn coord(&self, value: &Triplet, axis: usize) -> f64 {
        value.0[axis] as f64
    }
}

pub(crate) type TripletTree = KdTree<3, Triplet, TripletAccessor>;

pub(crate) fn triplet_distance(a: &Triplet, b: &Triplet) -> f64 {
    (0..3)
        .map(|i| {
            let d = (a.0[i] - b.0[i]) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

pub(crate) fn random_triplets(seed: u64, n: usize, range: i32) -> Vec<Triplet> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Triplet([
                rng.gen_range(-range..=range),
                rng.gen_range(-range..=range),
                rng.gen_range(-range..=range),
            ])
        })
        .collect()
}

pub(crate) fn triplet_tree(values: &[Triplet]) -> TripletTree {
    let mut tree = TripletTree::new();
    tree.extend(values.iter().copied());
    tree
}

/// In-order `(value, axis, depth)` triples, describing shape as well as contents.
pub(crate) fn shape<const K: usize, V: Clone, A, C>(
    tree: &KdTree<K, V, A, C>,
) -> Vec<(V, usize, usize)> {
    fn walk<V: Clone>(
        arena: &NodeArena<V>,
        id: Option<NodeId>,
        depth: usize,
        out: &mut Vec<(V, usize, usize)>,
    ) {
        if let Some(id) = id {
            let node = &arena[id];
            walk(arena, node.left, depth + 1, out);
            out.push((node.value.clone(), node.axis, depth));
            walk(arena, node.right, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(&tree.arena, tree.root, 0, &mut out);
    out
}

/// Sorted copy, for order-insensitive comparisons.
pub(crate) fn sorted(mut values: Vec<Triplet>) -> Vec<Triplet> {
    values.sort_by_key(|t| t.0);
    values
}
