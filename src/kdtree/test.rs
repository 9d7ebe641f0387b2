use crate::error::KdTreeError;
use crate::kdtree::{EuclideanDistance, KdTree, KdTreeBuilder, Region};

type Item = (usize, [f64; 2]);
type Tree = KdTree<2, Item, fn(&Item, usize) -> f64>;

fn coord(item: &Item, axis: usize) -> f64 {
    item.1[axis]
}

fn points() -> Vec<Item> {
    let coords: Vec<[i32; 2]> = vec![
        [54, 1],
        [97, 21],
        [65, 35],
        [33, 54],
        [95, 39],
        [54, 3],
        [53, 54],
        [84, 72],
        [33, 34],
        [43, 15],
        [52, 83],
        [81, 23],
        [1, 61],
        [38, 74],
        [11, 91],
        [24, 56],
        [90, 31],
        [25, 57],
        [46, 61],
        [29, 69],
        [49, 60],
        [4, 98],
        [71, 15],
        [60, 25],
        [38, 84],
        [52, 38],
        [94, 51],
        [13, 25],
        [77, 73],
        [88, 87],
        [6, 27],
        [58, 22],
        [53, 28],
        [27, 91],
        [96, 98],
        [93, 14],
        [22, 93],
        [45, 94],
        [18, 28],
        [35, 15],
        [19, 81],
        [20, 81],
        [67, 53],
        [43, 3],
        [47, 66],
        [48, 34],
        [46, 12],
        [32, 38],
        [43, 12],
        [39, 94],
        [88, 62],
        [66, 14],
        [84, 30],
        [72, 81],
        [41, 92],
        [26, 4],
        [6, 76],
        [47, 21],
        [57, 70],
        [71, 82],
        [50, 68],
        [96, 18],
        [40, 31],
        [78, 53],
        [71, 90],
        [32, 14],
        [55, 6],
        [32, 88],
        [62, 32],
        [21, 67],
        [73, 81],
        [44, 64],
        [29, 50],
        [70, 5],
        [6, 22],
        [68, 3],
        [11, 23],
        [20, 42],
        [21, 73],
        [63, 86],
        [9, 40],
        [99, 2],
        [99, 76],
        [56, 77],
        [83, 6],
        [21, 72],
        [78, 30],
        [75, 53],
        [41, 11],
        [95, 20],
        [30, 38],
        [96, 82],
        [65, 48],
        [33, 18],
        [87, 28],
        [10, 10],
        [40, 34],
        [10, 20],
        [47, 29],
        [46, 78],
    ];

    coords
        .into_iter()
        .enumerate()
        .map(|(id, [x, y])| (id, [x.into(), y.into()]))
        .collect()
}

fn make_index() -> Tree {
    let mut builder = KdTreeBuilder::with_accessor_and_comparator(
        coord as fn(&Item, usize) -> f64,
        Default::default(),
    );
    builder.extend(points());
    builder.finish()
}

fn sorted_ids<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<usize> {
    let mut ids: Vec<usize> = items.into_iter().map(|item| item.0).collect();
    ids.sort();
    ids
}

fn sq_dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

#[test]
fn creates_an_index() {
    let tree = make_index();
    assert_eq!(tree.len(), 100);
    assert!(tree.height() <= 8, "built by median selection");
    tree.validate().unwrap();
    assert_eq!(sorted_ids(&tree), (0..100).collect::<Vec<_>>());
}

#[test]
fn range_search() {
    let tree = make_index();

    let min_x = 20.;
    let min_y = 30.;
    let max_x = 50.;
    let max_y = 70.;

    let region = Region::new([min_x, min_y], [max_x, max_y]);
    let result = sorted_ids(tree.find_within_range(&region));
    let mut expected_ids = vec![
        60, 20, 45, 3, 17, 71, 44, 19, 18, 15, 69, 90, 62, 96, 47, 8, 77, 72,
    ];
    expected_ids.sort();

    assert_eq!(result, expected_ids, "returns ids");
    assert_eq!(tree.count_within_range(&region), expected_ids.len());

    let points = points();
    for id in result.iter() {
        let [x, y] = points[*id].1;
        if x < min_x || x > max_x || y < min_y || y > max_y {
            panic!("result point in range");
        }
    }
    // result points in range

    for (id, [x, y]) in points {
        if !result.contains(&id) && x >= min_x && x <= max_x && y >= min_y && y <= max_y {
            panic!("outside point not in range");
        }
    }
    // outside points not in range
}

#[test]
fn radius_search() {
    let tree = make_index();

    let q = [50., 50.];
    let r = 20.;
    let r2 = r * r;

    let result = sorted_ids(tree.find_within_radius(&(0, q), r, &EuclideanDistance));
    let mut expected_ids = vec![60, 6, 25, 92, 42, 20, 45, 3, 71, 44, 18, 96];
    expected_ids.sort();

    assert_eq!(result, expected_ids, "returns ids");

    let points = points();
    for id in result.iter() {
        if sq_dist(points[*id].1, q) > r2 {
            panic!("result point in range");
        }
    }
    // result points in range

    for (id, p) in points {
        if !result.contains(&id) && sq_dist(p, q) <= r2 {
            panic!("outside point not in range");
        }
    }
    // outside points not in range
}

#[test]
fn distance_search_is_a_square() {
    let tree = make_index();
    let q = (0, [50., 50.]);
    let square = sorted_ids(tree.find_within_distance(&q, 20.));
    let ball = sorted_ids(tree.find_within_radius(&q, 20., &EuclideanDistance));
    assert!(ball.iter().all(|id| square.contains(id)));
    // [65, 35] is inside the square but 21.2 away
    assert!(square.contains(&2));
    assert!(!ball.contains(&2));
    assert!(square.len() > ball.len());
}

#[test]
fn nearest_matches_brute_force() {
    let tree = make_index();
    let points = points();
    for q in [[0., 0.], [50., 50.], [99., 1.], [33.3, 66.6], [120., -5.]] {
        let (found, d) = tree.find_nearest(&(0, q), &EuclideanDistance).unwrap();
        let best = points
            .iter()
            .map(|p| sq_dist(p.1, q))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(sq_dist(found.1, q), best);
        assert!((d * d - best).abs() < 1e-9);
    }
}

#[test]
fn inorder_iteration_visits_each_value_once() {
    let tree = make_index();
    let mut cursor = tree.begin();
    let mut walked = Vec::new();
    while !cursor.is_end() {
        walked.push(tree.get(cursor).unwrap().0);
        cursor = tree.advance(cursor).unwrap();
    }
    let iterated: Vec<usize> = tree.iter().map(|item| item.0).collect();
    assert_eq!(walked, iterated);
    assert_eq!(tree.iter().len(), 100);
    assert!(tree.iter().eq(tree.iter()));

    let mut sorted = walked.clone();
    sorted.sort();
    assert_eq!(sorted, (0..100).collect::<Vec<_>>());
}

#[test]
fn insert_find_erase() {
    let mut tree = make_index();
    let extra = (100, [50., 50.]);
    assert!(!tree.contains(&extra));

    let cursor = tree.insert(extra);
    assert_eq!(tree.get(cursor).unwrap(), &extra);
    assert_eq!(tree.len(), 101);
    tree.validate().unwrap();

    let found = tree.find(&(0, [50., 50.])).unwrap();
    assert_eq!(tree.get(found).unwrap().0, 100);

    assert_eq!(tree.erase(&(0, [50., 50.])), Some(extra));
    assert_eq!(tree.erase(&(0, [50., 50.])), None);
    assert_eq!(tree.len(), 100);
    tree.validate().unwrap();
}

#[test]
fn find_exact_tells_duplicates_apart() {
    let mut tree = Tree::with_accessor(coord);
    tree.insert((1, [3., 3.]));
    tree.insert((2, [3., 3.]));
    tree.insert((3, [3., 3.]));
    tree.validate().unwrap();

    let second = tree.find_exact(&(2, [3., 3.])).unwrap();
    assert_eq!(tree.get(second).unwrap().0, 2);
    assert!(tree.find_exact(&(4, [3., 3.])).is_none());

    assert_eq!(tree.erase_exact(&(3, [3., 3.])), Some((3, [3., 3.])));
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.erase(&(9, [3., 3.])).map(|item| item.1), Some([3., 3.]));
    assert_eq!(tree.len(), 1);
    tree.validate().unwrap();
}

#[test]
fn erase_through_a_cursor() {
    let mut tree = make_index();
    let cursor = tree.find(&(0, [54., 1.])).unwrap();
    assert_eq!(tree.erase_at(cursor).unwrap(), (0, [54., 1.]));
    assert!(!tree.contains(&(0, [54., 1.])));
    tree.validate().unwrap();

    // the same cursor is now stale
    assert!(matches!(
        tree.erase_at(cursor),
        Err(KdTreeError::StaleCursor { .. })
    ));
}

#[test]
fn cursors_go_stale_after_mutation() {
    let mut tree = make_index();
    let begin = tree.begin();
    let end = tree.end();
    assert!(tree.get(begin).is_ok());
    assert!(matches!(tree.get(end), Err(KdTreeError::PastTheEnd)));
    assert!(matches!(tree.advance(end), Err(KdTreeError::PastTheEnd)));

    tree.insert((100, [1., 1.]));
    assert!(matches!(tree.get(begin), Err(KdTreeError::StaleCursor { .. })));
    assert!(matches!(tree.advance(end), Err(KdTreeError::StaleCursor { .. })));

    let fresh = tree.begin();
    tree.optimize();
    assert!(matches!(tree.get(fresh), Err(KdTreeError::StaleCursor { .. })));

    let fresh = tree.begin();
    tree.clear();
    assert!(matches!(tree.get(fresh), Err(KdTreeError::StaleCursor { .. })));
    assert!(tree.begin().is_end());
}

#[test]
fn failed_erase_keeps_cursors_valid() {
    let mut tree = make_index();
    let begin = tree.begin();
    assert_eq!(tree.erase(&(0, [-1., -1.])), None);
    assert!(tree.get(begin).is_ok());
}

#[test]
fn optimize_balances_a_degenerate_tree() {
    let mut tree = Tree::with_accessor(coord);
    for i in 0..127 {
        tree.insert((i, [i as f64, i as f64]));
    }
    assert_eq!(tree.height(), 127);

    let before = sorted_ids(&tree);
    tree.optimize();
    assert_eq!(tree.height(), 7);
    assert_eq!(sorted_ids(&tree), before);
    tree.validate().unwrap();
}

#[test]
fn debug_lists_values() {
    let mut tree = KdTree::<2, [i32; 2]>::new();
    tree.insert([1, 2]);
    let s = format!("{:?}", tree);
    assert_eq!(s, "KdTree { dimensions: 2, len: 1, values: [[1, 2]] }");
}
