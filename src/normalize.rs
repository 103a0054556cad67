use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::graph::VariationGraph;
use crate::side::{NodeId, Side, Traversal};

impl VariationGraph {
    /// Whether two adjacent traversals can be merged without changing the
    /// path space: every path visit of `a` continues into `b` and vice
    /// versa, on both strands.
    fn mergeable_neighbors(&self, a: Traversal, b: Traversal) -> bool {
        let ra = b.flip();
        let rb = a.flip();
        for path in self.paths.iter() {
            let steps = &path.steps;
            for i in 0..steps.len() {
                if steps[i] == a && (i + 1 >= steps.len() || steps[i + 1] != b) {
                    return false;
                }
                if steps[i] == b && (i == 0 || steps[i - 1] != a) {
                    return false;
                }
                if steps[i] == ra && (i + 1 >= steps.len() || steps[i + 1] != rb) {
                    return false;
                }
                if steps[i] == rb && (i == 0 || steps[i - 1] != ra) {
                    return false;
                }
            }
        }
        true
    }

    /// Maximal chains of traversals that can be collapsed into single nodes
    /// without changing the path space of the graph: every internal junction
    /// has exactly one edge on both of its sides, and paths run the whole
    /// junction.
    pub fn simple_components(&self) -> Vec<Vec<Traversal>> {
        let mut used: HashSet<NodeId> = HashSet::new();
        let mut components = Vec::new();
        for id in self.node_ids() {
            if used.contains(&id) {
                continue;
            }
            let mut chain: VecDeque<Traversal> = VecDeque::new();
            chain.push_back(Traversal::forward(id));
            let mut members: HashSet<NodeId> = HashSet::new();
            members.insert(id);

            loop {
                let front = *chain.front().unwrap();
                let prevs = self.nodes_prev(front);
                if prevs.len() != 1 {
                    break;
                }
                let p = prevs[0];
                if members.contains(&p.node) || used.contains(&p.node) {
                    break;
                }
                if self.nodes_next(p).len() != 1 || !self.mergeable_neighbors(p, front) {
                    break;
                }
                members.insert(p.node);
                chain.push_front(p);
            }
            loop {
                let back = *chain.back().unwrap();
                let nexts = self.nodes_next(back);
                if nexts.len() != 1 {
                    break;
                }
                let n = nexts[0];
                if members.contains(&n.node) || used.contains(&n.node) {
                    break;
                }
                if self.nodes_prev(n).len() != 1 || !self.mergeable_neighbors(back, n) {
                    break;
                }
                members.insert(n.node);
                chain.push_back(n);
            }

            used.extend(members);
            if chain.len() >= 2 {
                components.push(chain.into_iter().collect());
            }
        }
        components
    }

    /// Collapse every simple component, repeating until nothing merges.
    /// Returns the number of nodes eliminated.
    pub fn unchop(&mut self, verbose: bool) -> usize {
        let mut eliminated = 0;
        loop {
            let components = self.simple_components();
            if components.is_empty() {
                break;
            }
            let mut round = 0;
            for chain in components {
                match self.merge_traversals(&chain) {
                    Ok(_) => round += chain.len() - 1,
                    Err(e) => eprintln!("[unchop] skipping chain: {}", e),
                }
            }
            if round == 0 {
                break;
            }
            eliminated += round;
            if verbose {
                eprintln!("[unchop] merged away {} node(s)", round);
            }
        }
        eliminated
    }

    /// Traversals whose left side receives exactly the same set of sides as
    /// this one's. The result includes the argument.
    pub fn full_siblings_to(&self, t: Traversal) -> BTreeSet<Traversal> {
        let mut sibs = BTreeSet::new();
        sibs.insert(t);
        let ups: Vec<Side> = self.sides_to(t.left_side());
        if ups.is_empty() {
            return sibs;
        }
        for cand_side in self.sides_from(ups[0]) {
            // a left side that is an end side belongs to a backward traversal
            let cand = Traversal::new(cand_side.node, cand_side.is_end);
            if self.sides_to(cand_side) == ups {
                sibs.insert(cand);
            }
        }
        sibs
    }

    /// Traversals whose right side feeds exactly the same set of sides as
    /// this one's.
    pub fn full_siblings_from(&self, t: Traversal) -> BTreeSet<Traversal> {
        let mut sibs = BTreeSet::new();
        sibs.insert(t);
        let downs: Vec<Side> = self.sides_from(t.right_side());
        if downs.is_empty() {
            return sibs;
        }
        for cand_side in self.sides_to(downs[0]) {
            // a right side that is a start side belongs to a backward traversal
            let cand = Traversal::new(cand_side.node, !cand_side.is_end);
            if self.sides_from(cand_side) == downs {
                sibs.insert(cand);
            }
        }
        sibs
    }

    /// Merge traversals that carry an identical oriented sequence and stand
    /// in parallel: the new node takes the union of their attachments and
    /// their path visits, and the pieces are destroyed.
    fn merge_parallel_pieces(&mut self, pieces: &[Traversal], seq: Vec<u8>) -> NodeId {
        let mut upstream: BTreeSet<Side> = BTreeSet::new();
        let mut downstream: BTreeSet<Side> = BTreeSet::new();
        for p in pieces {
            upstream.extend(self.sides_to(p.left_side()));
            downstream.extend(self.sides_from(p.right_side()));
        }
        let piece_ids: HashSet<NodeId> = pieces.iter().map(|p| p.node).collect();
        let new_id = self.create_node(seq);
        for s in upstream {
            if !piece_ids.contains(&s.node) {
                let _ = self.create_edge(s, Side::start(new_id));
            }
        }
        for s in downstream {
            if !piece_ids.contains(&s.node) {
                let _ = self.create_edge(Side::end(new_id), s);
            }
        }
        for p in pieces {
            self.paths.replace_step(*p, Traversal::forward(new_id));
            self.paths.replace_step(p.flip(), Traversal::reverse(new_id));
            let _ = self.destroy_node(p.node);
        }
        new_id
    }

    fn sibling_groups(&self, to_side: bool) -> Vec<Vec<Traversal>> {
        let mut groups: BTreeMap<Vec<Side>, Vec<Traversal>> = BTreeMap::new();
        for id in self.node_ids() {
            for t in [Traversal::forward(id), Traversal::reverse(id)] {
                let key = if to_side {
                    self.sides_to(t.left_side())
                } else {
                    self.sides_from(t.right_side())
                };
                if key.is_empty() {
                    continue;
                }
                groups.entry(key).or_default().push(t);
            }
        }
        groups.into_values().filter(|g| g.len() > 1).collect()
    }

    /// One round of to-sibling simplification. Processes at most one sibling
    /// set, then recomputes, since splitting invalidates the other groups.
    fn simplify_to_siblings_once(&mut self, verbose: bool) -> bool {
        'group: for group in self.sibling_groups(true) {
            let mut ids = HashSet::new();
            for t in &group {
                if !self.has_node(t.node) || !ids.insert(t.node) {
                    continue 'group;
                }
            }
            let ups = self.sides_to(group[0].left_side());
            if ups.iter().any(|s| ids.contains(&s.node)) {
                continue;
            }
            let seqs: Vec<Vec<u8>> = group
                .iter()
                .map(|t| self.oriented_sequence(*t).expect("sibling node exists"))
                .collect();
            let min_len = seqs.iter().map(|s| s.len()).min().unwrap_or(0);
            if min_len == 0 {
                continue;
            }
            let mut shared = 0;
            'scan: for i in 0..min_len {
                for s in &seqs {
                    if s[i] != seqs[0][i] {
                        break 'scan;
                    }
                }
                shared += 1;
            }
            if shared == 0 {
                continue;
            }

            let mut pieces = Vec::with_capacity(group.len());
            for (t, seq) in group.iter().zip(&seqs) {
                if seq.len() > shared {
                    let cut = if t.backward { seq.len() - shared } else { shared };
                    let (left, right) =
                        self.divide_node(t.node, cut).expect("validated sibling split");
                    pieces.push(if t.backward {
                        Traversal::reverse(right)
                    } else {
                        Traversal::forward(left)
                    });
                } else {
                    pieces.push(*t);
                }
            }
            self.merge_parallel_pieces(&pieces, seqs[0][..shared].to_vec());
            if verbose {
                eprintln!(
                    "[normalize] merged a shared prefix of {} bp across {} siblings",
                    shared,
                    group.len()
                );
            }
            return true;
        }
        false
    }

    /// One round of from-sibling simplification: shared suffixes.
    fn simplify_from_siblings_once(&mut self, verbose: bool) -> bool {
        'group: for group in self.sibling_groups(false) {
            let mut ids = HashSet::new();
            for t in &group {
                if !self.has_node(t.node) || !ids.insert(t.node) {
                    continue 'group;
                }
            }
            let downs = self.sides_from(group[0].right_side());
            if downs.iter().any(|s| ids.contains(&s.node)) {
                continue;
            }
            let seqs: Vec<Vec<u8>> = group
                .iter()
                .map(|t| self.oriented_sequence(*t).expect("sibling node exists"))
                .collect();
            let min_len = seqs.iter().map(|s| s.len()).min().unwrap_or(0);
            if min_len == 0 {
                continue;
            }
            let mut shared = 0;
            'scan: for i in 0..min_len {
                for s in &seqs {
                    if s[s.len() - 1 - i] != seqs[0][seqs[0].len() - 1 - i] {
                        break 'scan;
                    }
                }
                shared += 1;
            }
            if shared == 0 {
                continue;
            }

            let mut pieces = Vec::with_capacity(group.len());
            for (t, seq) in group.iter().zip(&seqs) {
                if seq.len() > shared {
                    let cut = if t.backward { shared } else { seq.len() - shared };
                    let (left, right) =
                        self.divide_node(t.node, cut).expect("validated sibling split");
                    pieces.push(if t.backward {
                        Traversal::reverse(left)
                    } else {
                        Traversal::forward(right)
                    });
                } else {
                    pieces.push(*t);
                }
            }
            let suffix = seqs[0][seqs[0].len() - shared..].to_vec();
            self.merge_parallel_pieces(&pieces, suffix);
            if verbose {
                eprintln!(
                    "[normalize] merged a shared suffix of {} bp across {} siblings",
                    shared,
                    group.len()
                );
            }
            return true;
        }
        false
    }

    /// Remove node-level redundancy between siblings. Returns whether the
    /// graph changed.
    pub fn simplify_siblings(&mut self, verbose: bool) -> bool {
        let mut changed = false;
        while self.simplify_to_siblings_once(verbose) {
            changed = true;
        }
        while self.simplify_from_siblings_once(verbose) {
            changed = true;
        }
        changed
    }

    /// Normalize: alternate sibling simplification and unchop to a fixpoint.
    pub fn normalize(&mut self, verbose: bool) {
        for _ in 0..16 {
            let simplified = self.simplify_siblings(verbose);
            let unchopped = self.unchop(verbose) > 0;
            if !simplified && !unchopped {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;

    #[test]
    fn test_simple_components_of_linear_chain() {
        let mut g = VariationGraph::new();
        for (i, seq) in [b"A".as_ref(), b"C", b"G", b"T"].iter().enumerate() {
            g.create_node_with_id(seq.to_vec(), (i + 1) as NodeId).unwrap();
        }
        for i in 1..4 {
            g.create_edge(Side::end(i), Side::start(i + 1)).unwrap();
        }
        let comps = g.simple_components();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 4);
    }

    #[test]
    fn test_branch_blocks_components() {
        let mut g = VariationGraph::new();
        for id in 1..=4 {
            g.create_node_with_id(b"AA".to_vec(), id).unwrap();
        }
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        g.create_edge(Side::end(2), Side::start(4)).unwrap();
        g.create_edge(Side::end(3), Side::start(4)).unwrap();
        assert!(g.simple_components().is_empty());
    }

    #[test]
    fn test_full_siblings_to() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AA".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GC".to_vec(), 2).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        let sibs = g.full_siblings_to(Traversal::forward(2));
        assert!(sibs.contains(&Traversal::forward(2)));
        assert!(sibs.contains(&Traversal::forward(3)));
        assert_eq!(sibs.len(), 2);
    }

    #[test]
    fn test_simplify_siblings_merges_shared_prefix() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AA".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GCT".to_vec(), 2).unwrap();
        g.create_node_with_id(b"GCA".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        g.paths.append_step("p", Traversal::forward(1));
        g.paths.append_step("p", Traversal::forward(2));
        g.paths.append_step("q", Traversal::forward(1));
        g.paths.append_step("q", Traversal::forward(3));
        let hp = g.path_hash("p").unwrap();
        let hq = g.path_hash("q").unwrap();

        assert!(g.simplify_siblings(false));
        // the shared GC prefix now exists exactly once
        let gc_nodes: Vec<_> = g
            .nodes()
            .filter(|n| n.sequence == b"GC".to_vec())
            .collect();
        assert_eq!(gc_nodes.len(), 1);
        assert_eq!(g.path_hash("p").unwrap(), hp);
        assert_eq!(g.path_hash("q").unwrap(), hq);
        assert!(g.is_valid());
    }

    #[test]
    fn test_normalize_collapses_redundancy() {
        // 1 -> {2:"GCT", 3:"GCT"} -> 4 normalizes to a single linear run
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AA".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GCT".to_vec(), 2).unwrap();
        g.create_node_with_id(b"GCT".to_vec(), 3).unwrap();
        g.create_node_with_id(b"TT".to_vec(), 4).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        g.create_edge(Side::end(2), Side::start(4)).unwrap();
        g.create_edge(Side::end(3), Side::start(4)).unwrap();
        g.normalize(false);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.nodes().next().unwrap().sequence, b"AAGCTTT".to_vec());
        assert!(g.is_valid());
    }
}
