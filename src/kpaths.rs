use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::error::GraphError;
use crate::graph::VariationGraph;
use crate::side::{NodeId, Traversal};

impl VariationGraph {
    /// Grow walks leftward from a traversal by depth-first search, inserting
    /// each maximal walk (ending with the starting traversal) into `paths`.
    ///
    /// `length` bounds the sequence added beyond the walk so far; a neighbor
    /// longer than the remaining budget still joins the walk, used
    /// partially. When `edge_bounding` is set and the edge budget runs out,
    /// the unreachable neighbor is reported to `maxed` instead. Children are
    /// visited in ascending (id, orientation) order, so enumeration is
    /// deterministic.
    pub fn prev_kpaths_from_node(
        &self,
        node: Traversal,
        length: i64,
        edge_max: i64,
        edge_bounding: bool,
        postfix: Vec<Traversal>,
        paths: &mut BTreeSet<Vec<Traversal>>,
        maxed: &mut dyn FnMut(Traversal),
    ) {
        let mut walk = Vec::with_capacity(postfix.len() + 1);
        walk.push(node);
        walk.extend_from_slice(&postfix);

        let prevs = self.nodes_prev(node);
        if prevs.is_empty() || length <= 0 {
            paths.insert(walk);
            return;
        }
        for prev in prevs {
            if edge_bounding && edge_max <= 0 {
                maxed(prev);
                paths.insert(walk.clone());
            } else if (self.node_len(prev.node) as i64) < length {
                self.prev_kpaths_from_node(
                    prev,
                    length - self.node_len(prev.node) as i64,
                    edge_max - i64::from(edge_bounding),
                    edge_bounding,
                    walk.clone(),
                    paths,
                    maxed,
                );
            } else {
                // the neighbor overflows the budget; take it partially
                let mut bounded = Vec::with_capacity(walk.len() + 1);
                bounded.push(prev);
                bounded.extend_from_slice(&walk);
                paths.insert(bounded);
            }
        }
    }

    /// The rightward mirror of
    /// [`prev_kpaths_from_node`](Self::prev_kpaths_from_node): walks start
    /// with the given traversal.
    pub fn next_kpaths_from_node(
        &self,
        node: Traversal,
        length: i64,
        edge_max: i64,
        edge_bounding: bool,
        prefix: Vec<Traversal>,
        paths: &mut BTreeSet<Vec<Traversal>>,
        maxed: &mut dyn FnMut(Traversal),
    ) {
        let mut walk = prefix;
        walk.push(node);

        let nexts = self.nodes_next(node);
        if nexts.is_empty() || length <= 0 {
            paths.insert(walk);
            return;
        }
        for next in nexts {
            if edge_bounding && edge_max <= 0 {
                maxed(next);
                paths.insert(walk.clone());
            } else if (self.node_len(next.node) as i64) < length {
                self.next_kpaths_from_node(
                    next,
                    length - self.node_len(next.node) as i64,
                    edge_max - i64::from(edge_bounding),
                    edge_bounding,
                    walk.clone(),
                    paths,
                    maxed,
                );
            } else {
                let mut bounded = walk.clone();
                bounded.push(next);
                paths.insert(bounded);
            }
        }
    }

    /// Enumerate every bounded walk through a node: left and right
    /// expansions around its forward traversal, combined as a cartesian
    /// product. The visitor receives the index of the node's traversal
    /// within each walk. An `edge_max` of 0 disables edge bounding.
    pub fn kpaths_of_node(
        &self,
        id: NodeId,
        length: i64,
        edge_max: i64,
        prev_maxed: &mut dyn FnMut(Traversal),
        next_maxed: &mut dyn FnMut(Traversal),
        visitor: &mut dyn FnMut(usize, &[Traversal]),
    ) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::MissingNode(id));
        }
        let center = Traversal::forward(id);
        let bounding = edge_max > 0;

        let mut prev_paths = BTreeSet::new();
        self.prev_kpaths_from_node(
            center,
            length,
            edge_max,
            bounding,
            Vec::new(),
            &mut prev_paths,
            prev_maxed,
        );
        let mut next_paths = BTreeSet::new();
        self.next_kpaths_from_node(
            center,
            length,
            edge_max,
            bounding,
            Vec::new(),
            &mut next_paths,
            next_maxed,
        );

        for p in &prev_paths {
            for n in &next_paths {
                let mut walk = p.clone();
                walk.extend_from_slice(&n[1..]);
                visitor(p.len() - 1, &walk);
            }
        }
        Ok(())
    }

    /// Walks around every node, in node array order.
    pub fn for_each_kpath(
        &self,
        length: i64,
        edge_max: i64,
        mut prev_maxed: impl FnMut(Traversal),
        mut next_maxed: impl FnMut(Traversal),
        mut visitor: impl FnMut(usize, &[Traversal]),
    ) {
        for node in self.nodes() {
            let _ = self.kpaths_of_node(
                node.id,
                length,
                edge_max,
                &mut |t| prev_maxed(t),
                &mut |t| next_maxed(t),
                &mut |c, w| visitor(c, w),
            );
        }
    }

    /// Parallel form: nodes are distributed over the worker pool and the
    /// callbacks run concurrently; they must synchronize their own state.
    pub fn for_each_kpath_parallel(
        &self,
        length: i64,
        edge_max: i64,
        prev_maxed: impl Fn(Traversal) + Sync,
        next_maxed: impl Fn(Traversal) + Sync,
        visitor: impl Fn(usize, &[Traversal]) + Sync,
    ) {
        let ids: Vec<NodeId> = self.nodes().map(|n| n.id).collect();
        ids.par_iter().for_each(|&id| {
            let _ = self.kpaths_of_node(
                id,
                length,
                edge_max,
                &mut |t| prev_maxed(t),
                &mut |t| next_maxed(t),
                &mut |c, w| visitor(c, w),
            );
        });
    }

    /// Collect every bounded walk in the graph.
    pub fn kpaths(&self, length: i64, edge_max: i64) -> BTreeSet<Vec<Traversal>> {
        let mut all = BTreeSet::new();
        self.for_each_kpath(length, edge_max, |_| {}, |_| {}, |_, walk| {
            all.insert(walk.to_vec());
        });
        all
    }

    /// Collect the bounded walks through one node.
    pub fn kpaths_of_node_set(
        &self,
        id: NodeId,
        length: i64,
        edge_max: i64,
    ) -> Result<BTreeSet<Vec<Traversal>>, GraphError> {
        let mut all = BTreeSet::new();
        self.kpaths_of_node(id, length, edge_max, &mut |_| {}, &mut |_| {}, &mut |_, walk| {
            all.insert(walk.to_vec());
        })?;
        Ok(all)
    }
}
