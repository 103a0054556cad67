use std::collections::BTreeSet;

use vargraph::{GraphChunk, Side, Traversal, VariationGraph};

fn sample_graph() -> VariationGraph {
    let mut g = VariationGraph::new();
    g.create_node_with_id(b"ACGT".to_vec(), 1).unwrap();
    g.create_node_with_id(b"TT".to_vec(), 2).unwrap();
    g.create_node_with_id(b"GGA".to_vec(), 3).unwrap();
    g.create_node_with_id(b"C".to_vec(), 4).unwrap();
    g.create_edge(Side::end(1), Side::start(2)).unwrap();
    g.create_edge(Side::end(1), Side::end(3)).unwrap();
    g.create_edge(Side::start(3), Side::start(4)).unwrap();
    g.paths.append_step("hap1", Traversal::forward(1));
    g.paths.append_step("hap1", Traversal::forward(2));
    g.paths.append_step("hap2", Traversal::forward(1));
    g.paths.append_step("hap2", Traversal::reverse(3));
    g.paths.append_step("hap2", Traversal::forward(4));
    g
}

fn assert_same_graph(a: &VariationGraph, b: &VariationGraph) {
    assert_eq!(a.node_count(), b.node_count());
    assert_eq!(a.edge_count(), b.edge_count());
    for node in a.nodes() {
        assert_eq!(
            b.get_node(node.id).map(|n| n.sequence.clone()),
            Some(node.sequence.clone())
        );
    }
    for edge in a.edges() {
        let (s1, s2) = edge.side_pair();
        assert!(b.has_edge(s1, s2));
    }
    let names_a: BTreeSet<String> = a.paths.names().into_iter().collect();
    let names_b: BTreeSet<String> = b.paths.names().into_iter().collect();
    assert_eq!(names_a, names_b);
    for name in names_a {
        assert_eq!(
            a.paths.get(&name).unwrap().steps,
            b.paths.get(&name).unwrap().steps
        );
    }
}

#[test]
fn gfa_file_round_trip() {
    let g = sample_graph();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.gfa");
    g.to_gfa_file(&path).unwrap();
    let rebuilt = VariationGraph::from_gfa_file(&path).unwrap();
    assert_same_graph(&g, &rebuilt);
    assert!(rebuilt.is_valid());
}

#[test]
fn chunked_stream_round_trip() {
    let g = sample_graph();
    for chunk_size in [1, 2, 3, 1000] {
        let mut chunks: Vec<GraphChunk> = Vec::new();
        g.for_each_chunk(chunk_size, |c| chunks.push(c));
        let rebuilt = VariationGraph::from_chunks(chunks).unwrap();
        assert_same_graph(&g, &rebuilt);
        assert!(rebuilt.is_valid());
    }
}

#[test]
fn round_trip_survives_renumbering() {
    // serialize, renumber, and compare up to the id mapping
    let g = sample_graph();
    let mut renumbered = sample_graph();
    renumbered.increment_node_ids(10).unwrap();
    renumbered.compact_ids();
    assert_eq!(g.node_count(), renumbered.node_count());
    assert_eq!(g.edge_count(), renumbered.edge_count());
    for name in g.paths.names() {
        assert_eq!(
            g.path_sequence(&name).unwrap(),
            renumbered.path_sequence(&name).unwrap()
        );
    }
}

#[test]
fn extend_warns_and_drops_duplicates() {
    let g = sample_graph();
    let mut target = sample_graph();
    target.extend(&g.to_chunk(), true).unwrap();
    assert_eq!(target.node_count(), g.node_count());
    assert_eq!(target.edge_count(), g.edge_count());
    assert!(target.is_valid());
}

#[test]
fn combine_shifts_ids_and_keeps_both_graphs() {
    let mut a = sample_graph();
    let b = sample_graph();
    let a_nodes = a.node_count();
    a.combine(b).unwrap();
    assert_eq!(a.node_count(), 2 * a_nodes);
    assert!(a.is_valid());
    // the copy landed above the original id range
    assert!(a.max_node_id() > 4);
}

#[test]
fn append_links_tails_to_heads() {
    let mut a = VariationGraph::new();
    a.create_node_with_id(b"AA".to_vec(), 1).unwrap();
    let mut b = VariationGraph::new();
    b.create_node_with_id(b"CC".to_vec(), 1).unwrap();
    a.append(b).unwrap();
    assert_eq!(a.node_count(), 2);
    assert!(a.has_edge(Side::end(1), Side::start(2)));
    assert!(a.is_valid());
}

#[test]
fn wrap_with_null_nodes_brackets_the_graph() {
    let mut g = sample_graph();
    let (head, tail) = g.wrap_with_null_nodes();
    assert!(g.get_node(head).unwrap().sequence.is_empty());
    assert!(g.get_node(tail).unwrap().sequence.is_empty());
    // the old heads hang off the new head marker
    assert!(g.has_edge(Side::end(head), Side::start(1)));
    assert!(g.is_valid());

    // removing the nulls with forwarding restores traversability
    g.remove_null_nodes_forwarding_edges().unwrap();
    assert!(!g.has_node(head) && !g.has_node(tail));
    assert!(g.is_valid());
}
