use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::error::GraphError;
use crate::graph::VariationGraph;
use crate::side::{NodeId, Side, Traversal};

impl VariationGraph {
    /// Remove every node whose presence lets a walk of at most `path_length`
    /// bp cross more than `edge_max` edges. Surviving neighbors of removed
    /// positions are reconnected to the given head and tail markers so the
    /// graph stays traversable end to end.
    pub fn prune_complex(
        &mut self,
        path_length: i64,
        edge_max: i64,
        head: NodeId,
        tail: NodeId,
    ) -> Result<(), GraphError> {
        if !self.has_node(head) {
            return Err(GraphError::MissingNode(head));
        }
        if !self.has_node(tail) {
            return Err(GraphError::MissingNode(tail));
        }

        let prev_maxed: Mutex<BTreeSet<Traversal>> = Mutex::new(BTreeSet::new());
        let next_maxed: Mutex<BTreeSet<Traversal>> = Mutex::new(BTreeSet::new());
        self.for_each_kpath_parallel(
            path_length,
            edge_max,
            |t| {
                prev_maxed.lock().unwrap().insert(t);
            },
            |t| {
                next_maxed.lock().unwrap().insert(t);
            },
            |_, _| {},
        );
        let prev = prev_maxed.into_inner().unwrap();
        let next = next_maxed.into_inner().unwrap();

        let mut kill: BTreeSet<NodeId> = prev.iter().chain(next.iter()).map(|t| t.node).collect();
        kill.remove(&head);
        kill.remove(&tail);

        for t in &prev {
            for successor in self.nodes_next(*t) {
                if !kill.contains(&successor.node) {
                    self.create_edge(Side::end(head), successor.left_side())?;
                }
            }
        }
        for t in &next {
            for predecessor in self.nodes_prev(*t) {
                if !kill.contains(&predecessor.node) {
                    self.create_edge(predecessor.right_side(), Side::start(tail))?;
                }
            }
        }
        for id in kill {
            self.destroy_node(id)?;
        }
        Ok(())
    }

    /// Bracket the graph with `#`/`$` markers, prune, then drop the markers.
    pub fn prune_complex_with_head_tail(
        &mut self,
        path_length: i64,
        edge_max: i64,
    ) -> Result<(), GraphError> {
        let (head, tail) =
            self.add_start_end_markers(path_length.max(1) as usize, b'#', b'$', 0, 0)?;
        self.prune_complex(path_length, edge_max, head, tail)?;
        self.destroy_node(head)?;
        self.destroy_node(tail)?;
        Ok(())
    }

    /// Drop connected components carrying less than `min_size` bp.
    pub fn prune_short_subgraphs(&mut self, min_size: usize) {
        for component in self.connected_components() {
            let total: usize = component.iter().map(|&id| self.node_len(id)).sum();
            if total < min_size {
                for id in component {
                    let _ = self.destroy_node(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_short_subgraphs() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"ACGTACGT".to_vec(), 1).unwrap();
        g.create_node_with_id(b"A".to_vec(), 2).unwrap();
        g.create_node_with_id(b"C".to_vec(), 3).unwrap();
        g.create_edge(Side::end(2), Side::start(3)).unwrap();
        g.prune_short_subgraphs(5);
        assert!(g.has_node(1));
        assert!(!g.has_node(2) && !g.has_node(3));
        assert!(g.is_valid());
    }

    #[test]
    fn test_prune_complex_removes_maxed_nodes() {
        // a dense ladder of single-base nodes: 1 -> 2 -> 3 -> 4 -> 5
        let mut g = VariationGraph::new();
        for id in 1..=5 {
            g.create_node_with_id(b"A".to_vec(), id).unwrap();
        }
        for id in 1..5 {
            g.create_edge(Side::end(id), Side::start(id + 1)).unwrap();
        }
        let before = g.node_count();
        g.prune_complex_with_head_tail(5, 2).unwrap();
        // walks of 5 bp would cross 4 edges; something had to go
        assert!(g.node_count() < before);
        assert!(g.is_valid());
        let walks = g.kpaths(5, 0);
        for walk in walks {
            assert!(walk.len() <= 3);
        }
    }
}
