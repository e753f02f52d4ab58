//! Tests for graph flattening

use std::collections::HashMap;

use rstest::rstest;

use collection_helpers::domain::{flatten, flatten_root, GraphWalker, VisitedSet};
use collection_helpers::util::testing::init_test_setup;

type Graph = HashMap<&'static str, Vec<&'static str>>;

fn graph(edges: &[(&'static str, &[&'static str])]) -> Graph {
    edges.iter().map(|(node, children)| (*node, children.to_vec())).collect()
}

fn children_of(graph: &Graph) -> impl FnMut(&&'static str) -> Vec<&'static str> + '_ {
    move |node| graph.get(node).cloned().unwrap_or_default()
}

// ============================================================
// Single root
// ============================================================

#[test]
fn given_tree_with_cycle_to_root_when_flattening_then_visits_each_node_once_in_preorder() {
    init_test_setup();
    // Arrange
    let g = graph(&[
        ("N1", &["N9", "N8", "N2"]),
        ("N2", &["N7", "N6", "N3"]),
        ("N3", &["N5", "N4"]),
        ("N7", &["N10"]),
        ("N10", &["N11"]),
        ("N11", &["N1"]),
    ]);

    // Act
    let nodes = flatten_root("N1", children_of(&g));

    // Assert
    assert_eq!(nodes.len(), 11);
    assert_eq!(
        nodes.into_vec(),
        vec!["N1", "N9", "N8", "N2", "N7", "N10", "N11", "N6", "N3", "N5", "N4"]
    );
}

#[test]
fn given_diamond_when_flattening_then_shared_node_appears_once_at_first_discovery() {
    init_test_setup();
    // Arrange
    let g = graph(&[("A", &["B", "C"]), ("B", &["D"]), ("C", &["D"])]);

    // Act
    let nodes = flatten_root("A", children_of(&g));

    // Assert
    assert_eq!(nodes.as_slice(), &["A", "B", "D", "C"]);
}

#[test]
fn given_leaf_root_when_flattening_then_contains_only_root() {
    init_test_setup();
    let g = Graph::new();

    let nodes = flatten_root("lonely", children_of(&g));

    assert_eq!(nodes.into_vec(), vec!["lonely"]);
}

#[test]
fn given_absent_children_when_flattening_then_treated_as_empty() {
    init_test_setup();
    // Locator models "no children collection at all" as None
    let g: HashMap<u32, Option<Vec<u32>>> =
        [(1, Some(vec![2, 3])), (2, None), (3, Some(vec![]))].into_iter().collect();

    let nodes = flatten_root(1, |n| g.get(n).cloned().flatten().into_iter().flatten());

    assert_eq!(nodes.into_vec(), vec![1, 2, 3]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(10)]
#[case(1_000)]
fn given_ring_of_n_nodes_when_flattening_then_terminates_with_n_nodes(#[case] n: u32) {
    init_test_setup();
    // Arrange: 0 -> 1 -> ... -> n-1 -> 0
    let next = |node: &u32| vec![(node + 1) % n];

    // Act
    let nodes = flatten_root(0, next);

    // Assert
    assert_eq!(nodes.len() as u32, n);
    assert_eq!(nodes.into_vec(), (0..n).collect::<Vec<_>>());
}

// ============================================================
// Multiple roots
// ============================================================

#[test]
fn given_roots_sharing_subtree_when_flattening_then_subtree_flattened_once() {
    init_test_setup();
    // Arrange
    let g = graph(&[("R1", &["S"]), ("R2", &["S", "X"]), ("S", &["T"])]);

    // Act
    let nodes = flatten(["R1", "R2"], children_of(&g));

    // Assert
    assert_eq!(nodes.into_vec(), vec!["R1", "S", "T", "R2", "X"]);
}

#[test]
fn given_root_reachable_from_earlier_root_when_flattening_then_not_walked_twice() {
    init_test_setup();
    let g = graph(&[("A", &["B"]), ("B", &["C"])]);

    let nodes = flatten(["A", "B"], children_of(&g));

    assert_eq!(nodes.into_vec(), vec!["A", "B", "C"]);
}

#[test]
fn given_no_roots_when_flattening_then_empty() {
    init_test_setup();
    let g = Graph::new();

    let nodes = flatten(Vec::<&str>::new(), children_of(&g));

    assert!(nodes.is_empty());
}

#[test]
fn given_single_root_when_flattening_both_ways_then_results_match() {
    init_test_setup();
    let g = graph(&[("A", &["B", "C"]), ("C", &["A", "D"])]);

    let single = flatten_root("A", children_of(&g));
    let multi = flatten(["A"], children_of(&g));

    assert_eq!(single, multi);
}

// ============================================================
// Walker reuse
// ============================================================

#[test]
fn given_shared_visited_set_when_walking_twice_then_second_walk_skips_known_nodes() {
    init_test_setup();
    // Arrange
    let g = graph(&[("A", &["B"]), ("C", &["B", "D"])]);
    let mut visited = VisitedSet::new();
    let mut walker = GraphWalker::new(children_of(&g));

    // Act
    walker.walk(["A"], &mut visited);
    walker.walk(["C"], &mut visited);

    // Assert
    assert_eq!(visited.as_slice(), &["A", "B", "C", "D"]);
    assert!(visited.contains(&"D"));
    assert!(!visited.contains(&"Z"));
}
