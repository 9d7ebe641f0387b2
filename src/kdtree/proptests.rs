use super::*;

use proptest::prelude::*;

type Point = [i32; 3];

#[derive(Clone, Debug)]
enum Op {
    Insert(Point),
    Erase(Point),
    Find(Point),
    Nearest(Point),
    Range(Point, Point),
    Optimize,
}

// A narrow coordinate range so that insert/erase sequences hit plenty of ties.
fn point_strategy() -> impl Strategy<Value = Point> + Clone {
    prop::array::uniform3(-8i32..=8)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let point = point_strategy();
    let op = prop_oneof![
        45 => point.clone().prop_map(Op::Insert),
        25 => point.clone().prop_map(Op::Erase),
        10 => point.clone().prop_map(Op::Find),
        10 => point.clone().prop_map(Op::Nearest),
        8 => (point.clone(), point.clone()).prop_map(|(a, b)| Op::Range(a, b)),
        2 => Just(Op::Optimize),
    ];
    prop::collection::vec(op, 0..=400)
}

fn manhattan(a: &Point, b: &Point) -> i32 {
    (0..3).map(|i| (a[i] - b[i]).abs()).sum()
}

fn sorted(mut points: Vec<Point>) -> Vec<Point> {
    points.sort();
    points
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_vec(ops in ops_strategy()) {
        let mut t: KdTree<3, Point> = KdTree::new();
        let mut m: Vec<Point> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(p) => {
                    let cursor = t.insert(p);
                    prop_assert_eq!(t.get(cursor).copied().ok(), Some(p));
                    m.push(p);
                }
                Op::Erase(p) => {
                    let erased = t.erase(&p);
                    let expected = m.iter().position(|q| *q == p).map(|i| m.swap_remove(i));
                    prop_assert_eq!(erased, expected);
                }
                Op::Find(p) => {
                    prop_assert_eq!(t.contains(&p), m.contains(&p));
                    prop_assert_eq!(t.find(&p).is_some(), m.contains(&p));
                }
                Op::Nearest(p) => {
                    let got = t.find_nearest(&p, &ManhattanDistance).map(|(_, d)| d);
                    let expected = m.iter().map(|q| manhattan(q, &p)).min();
                    prop_assert_eq!(got, expected);
                }
                Op::Range(a, b) => {
                    let region = Region::new(a, b);
                    let got = sorted(t.find_within_range(&region).copied().collect());
                    let expected = sorted(
                        m.iter()
                            .filter(|q| (0..3).all(|i| a[i] <= q[i] && q[i] <= b[i]))
                            .copied()
                            .collect(),
                    );
                    prop_assert_eq!(got, expected);
                }
                Op::Optimize => {
                    t.optimize();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            prop_assert!(t.validate().is_ok(), "{:?}", t.validate());
        }

        let got = sorted(t.iter().copied().collect());
        prop_assert_eq!(got, sorted(m));
    }

    #[test]
    fn prop_furthest_matches_brute_force(
        points in prop::collection::vec(point_strategy(), 1..=200),
        target in point_strategy(),
        k in 1usize..=5,
    ) {
        let t: KdTree<3, Point> = points.iter().copied().collect();
        let got: Vec<i32> = t
            .furthest_k(&target, k, &ManhattanDistance)
            .into_iter()
            .map(|(_, d)| d)
            .collect();

        let mut expected: Vec<i32> = points.iter().map(|q| manhattan(q, &target)).collect();
        expected.sort_by(|a, b| b.cmp(a));
        expected.truncate(k);
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_nearest_k_matches_brute_force(
        points in prop::collection::vec(point_strategy(), 1..=200),
        target in point_strategy(),
        k in 1usize..=8,
    ) {
        let mut t: KdTree<3, Point> = KdTree::new();
        t.extend(points.iter().copied());
        let got: Vec<i32> = t
            .nearest_k(&target, k, None, &ManhattanDistance)
            .into_iter()
            .map(|(_, d)| d)
            .collect();

        let mut expected: Vec<i32> = points.iter().map(|q| manhattan(q, &target)).collect();
        expected.sort();
        expected.truncate(k);
        prop_assert_eq!(got, expected);
    }
}
