use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::graph::VariationGraph;
use crate::side::{canonical_side_pair, reverse_complement, NodeId, Side, Traversal};

impl VariationGraph {
    /// Topologically order the graph's oriented nodes.
    ///
    /// A modified Kahn's algorithm over node sides: the frontier is keyed by
    /// node id, so when following an edge discovers a node in the opposite
    /// orientation from its head-seeded one, the discovered orientation wins.
    /// Edges are masked as they are consumed. Cycles are broken by seeding
    /// first from traversals observed to still have unconsumed left edges,
    /// then from the smallest unvisited id. Ties always break by ascending
    /// node id, so the order depends only on the graph, not insertion order.
    ///
    /// Every node is emitted exactly once, in the orientation it was first
    /// reached; in an acyclic, orientable graph every edge then runs left to
    /// right.
    pub fn topological_order(&self) -> Vec<Traversal> {
        let mut order: Vec<Traversal> = Vec::with_capacity(self.node_count());
        if self.empty() {
            return order;
        }

        let mut frontier: BTreeMap<NodeId, Traversal> = BTreeMap::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut masked: HashSet<(Side, Side)> = HashSet::new();
        let mut seeds: VecDeque<Traversal> = VecDeque::new();

        for head in self.head_nodes() {
            frontier.insert(head, Traversal::forward(head));
        }

        while order.len() < self.node_count() {
            if frontier.is_empty() {
                let mut seeded = false;
                while let Some(seed) = seeds.pop_front() {
                    if !visited.contains(&seed.node) {
                        frontier.insert(seed.node, seed);
                        seeded = true;
                        break;
                    }
                }
                if !seeded {
                    let id = self
                        .node_ids()
                        .into_iter()
                        .find(|id| !visited.contains(id))
                        .expect("unvisited node must exist");
                    frontier.insert(id, Traversal::forward(id));
                }
            }

            while let Some((&id, &t)) = frontier.iter().next() {
                frontier.remove(&id);
                if !visited.insert(id) {
                    continue;
                }
                order.push(t);

                // edges into the left side are consumed by placing the node
                for prev in self.nodes_prev(t) {
                    masked.insert(canonical_side_pair(t.left_side(), prev.right_side()));
                }
                // consume right-side edges, releasing neighbors whose left
                // side has nothing unconsumed left
                for next in self.nodes_next(t) {
                    masked.insert(canonical_side_pair(t.right_side(), next.left_side()));
                    if visited.contains(&next.node) {
                        continue;
                    }
                    let blocked = self.nodes_prev(next).iter().any(|p| {
                        !masked.contains(&canonical_side_pair(next.left_side(), p.right_side()))
                    });
                    if blocked {
                        if !seeds.contains(&next) {
                            seeds.push_back(next);
                        }
                    } else {
                        frontier.insert(next.node, next);
                    }
                }
            }
        }
        order
    }

    pub(crate) fn apply_node_order(&mut self, order: &[Traversal]) {
        let rank: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, t)| (t.node, i)).collect();
        self.nodes
            .sort_by_key(|n| rank.get(&n.id).copied().unwrap_or(usize::MAX));
        self.node_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();
    }

    /// Reorder the node array to the topological order.
    pub fn sort(&mut self) {
        let order = self.topological_order();
        self.apply_node_order(&order);
    }

    /// Sort, then flip every node the order reached backward so that all
    /// heads and tails end up forward: its sequence is reverse-complemented,
    /// the side flags of its incident edges are toggled, and its path visits
    /// flip orientation. Returns the ids of the flipped nodes.
    pub fn orient_nodes_forward(&mut self) -> HashSet<NodeId> {
        let order = self.topological_order();
        let flipped: HashSet<NodeId> =
            order.iter().filter(|t| t.backward).map(|t| t.node).collect();

        for &id in &flipped {
            let pos = self.node_by_id[&id];
            let rc = reverse_complement(&self.nodes[pos].sequence);
            self.nodes[pos].sequence = rc;
            self.paths.flip_node_orientation(id);
        }
        if !flipped.is_empty() {
            for edge in &mut self.edges {
                if flipped.contains(&edge.from) {
                    edge.from_start = !edge.from_start;
                }
                if flipped.contains(&edge.to) {
                    edge.to_end = !edge.to_end;
                }
            }
            // the sides edges attach to moved; rebuild the side indexes
            self.rebuild_indexes();
        }
        self.apply_node_order(&order);
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;

    #[test]
    fn test_linear_order_is_left_to_right() {
        let mut g = VariationGraph::new();
        for (i, seq) in [b"A".as_ref(), b"C", b"G"].iter().enumerate() {
            g.create_node_with_id(seq.to_vec(), (i + 1) as NodeId).unwrap();
        }
        g.create_edge(Side::end(2), Side::start(3)).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        let order = g.topological_order();
        assert_eq!(
            order,
            vec![
                Traversal::forward(1),
                Traversal::forward(2),
                Traversal::forward(3)
            ]
        );
        g.sort();
        let ids: Vec<NodeId> = g.nodes().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_branching_ties_break_by_id() {
        let mut g = VariationGraph::new();
        for id in 1..=4 {
            g.create_node_with_id(b"A".to_vec(), id).unwrap();
        }
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(2), Side::start(4)).unwrap();
        g.create_edge(Side::end(3), Side::start(4)).unwrap();
        let order = g.topological_order();
        assert_eq!(
            order,
            vec![
                Traversal::forward(1),
                Traversal::forward(2),
                Traversal::forward(3),
                Traversal::forward(4)
            ]
        );
    }

    #[test]
    fn test_cycle_is_broken_deterministically() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"A".to_vec(), 1).unwrap();
        g.create_node_with_id(b"C".to_vec(), 2).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(2), Side::start(1)).unwrap();
        let order = g.topological_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0], Traversal::forward(1));
    }

    #[test]
    fn test_orient_flips_backward_node() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        // node 2 attached backward: 1.end to 2.end
        g.create_edge(Side::end(1), Side::end(2)).unwrap();
        let flipped = g.orient_nodes_forward();
        assert_eq!(flipped, [2].into_iter().collect());
        assert_eq!(g.get_node(2).unwrap().sequence, b"AC".to_vec());
        assert!(g.has_edge(Side::end(1), Side::start(2)));
        assert_eq!(g.edge_count(), 1);
        assert!(g.is_valid());
    }

    #[test]
    fn test_orient_is_insertion_order_independent() {
        let build = |ids: &[(NodeId, &[u8])], edges: &[(Side, Side)]| {
            let mut g = VariationGraph::new();
            for &(id, seq) in ids {
                g.create_node_with_id(seq.to_vec(), id).unwrap();
            }
            for &(a, b) in edges {
                g.create_edge(a, b).unwrap();
            }
            g
        };
        let nodes_a: Vec<(NodeId, &[u8])> = vec![(1, b"AC"), (2, b"GT"), (3, b"TTA")];
        let nodes_b: Vec<(NodeId, &[u8])> = vec![(3, b"TTA"), (1, b"AC"), (2, b"GT")];
        let edges_a = vec![
            (Side::end(1), Side::end(2)),
            (Side::start(2), Side::start(3)),
        ];
        let mut edges_b = edges_a.clone();
        edges_b.reverse();

        let mut g1 = build(&nodes_a, &edges_a);
        let mut g2 = build(&nodes_b, &edges_b);
        let f1 = g1.orient_nodes_forward();
        let f2 = g2.orient_nodes_forward();
        assert_eq!(f1, f2);
        for id in [1, 2, 3] {
            assert_eq!(g1.get_node(id).unwrap().sequence, g2.get_node(id).unwrap().sequence);
        }
    }
}
