use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::GraphError;
use crate::graph::VariationGraph;
use crate::side::{canonical_side_pair, NodeId, Side, Traversal};

impl VariationGraph {
    /// Divide a forward node at an offset, producing a left node covering
    /// `[0, offset)` and a right node covering `[offset, len)`.
    ///
    /// Edges on the start side move to the left node's start, edges on the
    /// end side to the right node's end, and a new edge joins
    /// `left.end` to `right.start`. Paths are rewritten in place: a forward
    /// visit becomes two forward visits, a backward visit two backward
    /// visits in reversed order.
    pub fn divide_node(&mut self, id: NodeId, offset: usize) -> Result<(NodeId, NodeId), GraphError> {
        let node = self.get_node(id).ok_or(GraphError::MissingNode(id))?;
        let len = node.sequence.len();
        if offset == 0 || offset >= len {
            return Err(GraphError::OffsetOutOfRange { node: id, offset, len });
        }
        let seq = node.sequence.clone();
        let left = self.create_node(seq[..offset].to_vec());
        let right = self.create_node(seq[offset..].to_vec());
        self.create_edge(Side::end(left), Side::start(right))?;

        let map_side = |s: Side| -> Side {
            if s.node != id {
                s
            } else if s.is_end {
                Side::end(right)
            } else {
                Side::start(left)
            }
        };
        for edge in self.edges_of_node(id) {
            let (a, b) = edge.side_pair();
            self.create_edge(map_side(a), map_side(b))?;
        }

        self.paths.replace_node_with_pair(id, left, right);
        self.destroy_node(id)?;
        Ok((left, right))
    }

    /// Chop every node longer than `max_size` into pieces of at most that
    /// length.
    pub fn dice_nodes(&mut self, max_size: usize) -> Result<(), GraphError> {
        if max_size == 0 {
            return Ok(());
        }
        let long: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.sequence.len() > max_size)
            .map(|n| n.id)
            .collect();
        for id in long {
            let mut current = id;
            while self.node_len(current) > max_size {
                let (_, rest) = self.divide_node(current, max_size)?;
                current = rest;
            }
        }
        Ok(())
    }

    /// Whether every path visit of a chain member runs through the complete
    /// chain, in either orientation.
    fn chain_runs_intact(&self, chain: &[Traversal]) -> bool {
        let rev: Vec<Traversal> = chain.iter().rev().map(|t| t.flip()).collect();
        let members: HashSet<NodeId> = chain.iter().map(|t| t.node).collect();
        for path in self.paths.iter() {
            let mut i = 0;
            while i < path.steps.len() {
                if path.steps[i..].starts_with(chain) {
                    i += chain.len();
                } else if path.steps[i..].starts_with(&rev) {
                    i += rev.len();
                } else if members.contains(&path.steps[i].node) {
                    return false;
                } else {
                    i += 1;
                }
            }
        }
        true
    }

    /// Merge a chain of forward nodes into a single node. See
    /// [`merge_traversals`](Self::merge_traversals).
    pub fn merge_nodes(&mut self, chain: &[NodeId]) -> Result<NodeId, GraphError> {
        let travs: Vec<Traversal> = chain.iter().map(|&id| Traversal::forward(id)).collect();
        self.merge_traversals(&travs)
    }

    /// Merge a simple linear chain of traversals into one node carrying the
    /// concatenated sequence.
    ///
    /// Every internal junction must have exactly one edge on both of its
    /// sides and every path visit must run the whole chain, otherwise the
    /// merge fails with `NotSimple` and the graph is unchanged. External
    /// edges are re-anchored onto the new node and paths are rewritten.
    pub fn merge_traversals(&mut self, chain: &[Traversal]) -> Result<NodeId, GraphError> {
        if chain.is_empty() {
            return Err(GraphError::NotSimple("empty chain".to_string()));
        }
        if chain.len() == 1 {
            return if self.has_node(chain[0].node) {
                Ok(chain[0].node)
            } else {
                Err(GraphError::MissingNode(chain[0].node))
            };
        }
        let mut seen = HashSet::new();
        for t in chain {
            if !self.has_node(t.node) {
                return Err(GraphError::MissingNode(t.node));
            }
            if !seen.insert(t.node) {
                return Err(GraphError::NotSimple(format!("node {} repeats in the chain", t.node)));
            }
        }
        for w in chain.windows(2) {
            let right = w[0].right_side();
            let left = w[1].left_side();
            if self.adjacent_sides(right).len() != 1
                || self.adjacent_sides(left).len() != 1
                || !self.has_edge(right, left)
            {
                return Err(GraphError::NotSimple(format!(
                    "{} and {} are not uniquely linked",
                    w[0], w[1]
                )));
            }
        }
        if !self.chain_runs_intact(chain) {
            return Err(GraphError::NotSimple(
                "a path enters or leaves the chain mid-run".to_string(),
            ));
        }

        let mut seq = Vec::new();
        for t in chain {
            seq.extend(self.oriented_sequence(*t).expect("nodes checked above"));
        }
        let first = chain[0];
        let last = *chain.last().unwrap();
        let upstream = self.sides_to(first.left_side());
        let downstream = self.sides_from(last.right_side());

        let new_id = self.create_node(seq);
        let map_boundary = |s: Side| -> Side {
            if s == first.left_side() {
                Side::start(new_id)
            } else if s == last.right_side() {
                Side::end(new_id)
            } else {
                s
            }
        };
        for s in upstream {
            self.create_edge(map_boundary(s), Side::start(new_id))?;
        }
        for s in downstream {
            self.create_edge(Side::end(new_id), map_boundary(s))?;
        }

        self.paths.replace_run(chain, Traversal::forward(new_id));
        for t in chain {
            self.destroy_node(t.node)?;
        }
        Ok(new_id)
    }

    fn apply_node_id_mapping(&mut self, mapping: &HashMap<NodeId, NodeId>) {
        for node in &mut self.nodes {
            if let Some(&new_id) = mapping.get(&node.id) {
                node.id = new_id;
            }
        }
        for edge in &mut self.edges {
            if let Some(&new_id) = mapping.get(&edge.from) {
                edge.from = new_id;
            }
            if let Some(&new_id) = mapping.get(&edge.to) {
                edge.to = new_id;
            }
        }
        self.paths.translate_ids(mapping);
        self.rebuild_indexes();
    }

    /// Renumber all nodes 1..N in node-array order, rewriting every edge and
    /// path.
    pub fn compact_ids(&mut self) {
        let mapping: HashMap<NodeId, NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, (i + 1) as NodeId))
            .collect();
        self.apply_node_id_mapping(&mapping);
    }

    /// Add `increment` to every node id. Paths are preserved.
    pub fn increment_node_ids(&mut self, increment: i64) -> Result<(), GraphError> {
        if increment == 0 || self.empty() {
            return Ok(());
        }
        let new_min = self.min_node_id() + increment;
        if new_min <= 0 {
            return Err(GraphError::InvalidId(new_min));
        }
        let mapping: HashMap<NodeId, NodeId> =
            self.nodes.iter().map(|n| (n.id, n.id + increment)).collect();
        self.apply_node_id_mapping(&mapping);
        Ok(())
    }

    /// Subtract `decrement` from every node id; must not produce ids <= 0.
    pub fn decrement_node_ids(&mut self, decrement: i64) -> Result<(), GraphError> {
        self.increment_node_ids(-decrement)
    }

    /// Change one node's id to an unused one. Paths containing the node
    /// cannot be kept consistent and are removed.
    pub fn swap_node_id(&mut self, id: NodeId, new_id: NodeId) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::MissingNode(id));
        }
        if new_id <= 0 {
            return Err(GraphError::InvalidId(new_id));
        }
        if self.has_node(new_id) {
            return Err(GraphError::DuplicateId(new_id));
        }
        let removed = self.paths.remove_paths_containing(id);
        if !removed.is_empty() {
            eprintln!(
                "[graph] swap_node_id({} -> {}): removed {} invalidated path(s)",
                id,
                new_id,
                removed.len()
            );
        }
        let mapping: HashMap<NodeId, NodeId> = [(id, new_id)].into_iter().collect();
        self.apply_node_id_mapping(&mapping);
        Ok(())
    }

    /// Remove a node but connect each of its predecessor sides to each of
    /// its successor sides, preserving the walk space across it.
    pub fn remove_node_forwarding_edges(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::MissingNode(id));
        }
        let preds: Vec<Side> = self
            .sides_to(Side::start(id))
            .into_iter()
            .filter(|s| s.node != id)
            .collect();
        let succs: Vec<Side> = self
            .sides_from(Side::end(id))
            .into_iter()
            .filter(|s| s.node != id)
            .collect();
        for &p in &preds {
            for &s in &succs {
                self.create_edge(p, s)?;
            }
        }
        self.destroy_node(id)
    }

    /// Destroy every node with an empty sequence.
    pub fn remove_null_nodes(&mut self) -> Result<(), GraphError> {
        let nulls: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.sequence.is_empty())
            .map(|n| n.id)
            .collect();
        for id in nulls {
            self.destroy_node(id)?;
        }
        Ok(())
    }

    /// Destroy every empty node, forwarding edges across it first.
    pub fn remove_null_nodes_forwarding_edges(&mut self) -> Result<(), GraphError> {
        let nulls: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.sequence.is_empty())
            .map(|n| n.id)
            .collect();
        for id in nulls {
            self.remove_node_forwarding_edges(id)?;
        }
        Ok(())
    }

    /// Drop edges whose endpoints are gone. Only needed after mutating the
    /// arenas directly; the public operators never leave orphans.
    pub fn remove_orphan_edges(&mut self) {
        let orphaned = self
            .edges()
            .any(|e| !self.has_node(e.from) || !self.has_node(e.to));
        if orphaned {
            self.rebuild_indexes();
        }
    }

    /// Keep only the named paths and the nodes and edges they touch;
    /// everything else is destroyed, including edges between kept nodes that
    /// no kept path uses. Returns the names actually found.
    pub fn keep_paths(&mut self, names: &BTreeSet<String>) -> BTreeSet<String> {
        let mut keep_nodes: HashSet<NodeId> = HashSet::new();
        let mut keep_edges: HashSet<(Side, Side)> = HashSet::new();
        let mut kept = BTreeSet::new();
        for path in self.paths.iter() {
            if !names.contains(&path.name) {
                continue;
            }
            kept.insert(path.name.clone());
            for step in &path.steps {
                keep_nodes.insert(step.node);
            }
            for w in path.steps.windows(2) {
                keep_edges.insert(canonical_side_pair(w[0].right_side(), w[1].left_side()));
            }
        }

        let drop_nodes: Vec<NodeId> = self
            .node_ids()
            .into_iter()
            .filter(|id| !keep_nodes.contains(id))
            .collect();
        for id in drop_nodes {
            let _ = self.destroy_node(id);
        }
        let drop_edges: Vec<(Side, Side)> = self
            .edges()
            .map(|e| e.side_pair())
            .filter(|p| !keep_edges.contains(p))
            .collect();
        for (a, b) in drop_edges {
            let _ = self.destroy_edge(a, b);
        }
        self.paths.keep_only(&kept);
        kept
    }

    pub fn keep_path(&mut self, name: &str) -> bool {
        let mut names = BTreeSet::new();
        names.insert(name.to_string());
        !self.keep_paths(&names).is_empty()
    }

    /// Remove every piece of the graph not covered by some path.
    pub fn remove_non_path(&mut self) {
        let names: BTreeSet<String> = self.paths.names().into_iter().collect();
        self.keep_paths(&names);
    }

    /// Join every head to a new single empty head node; returns its id.
    pub fn join_heads(&mut self) -> NodeId {
        let heads = self.head_nodes();
        let id = self.create_node(Vec::new());
        for h in heads {
            let _ = self.create_edge(Side::end(id), Side::start(h));
        }
        id
    }

    /// Join every tail to a new single empty tail node; returns its id.
    pub fn join_tails(&mut self) -> NodeId {
        let tails = self.tail_nodes();
        let id = self.create_node(Vec::new());
        for t in tails {
            let _ = self.create_edge(Side::end(t), Side::start(id));
        }
        id
    }

    /// Bracket the graph between a single empty head and tail node.
    pub fn wrap_with_null_nodes(&mut self) -> (NodeId, NodeId) {
        let head = self.join_heads();
        let tail = self.join_tails();
        (head, tail)
    }

    /// Add a start marker (`start_char` repeated `length` times) connected
    /// to every head and an end marker connected from every tail. Connected
    /// components without a head (resp. tail) get the missing marker
    /// attached at their smallest-id node, so every component is bracketed.
    /// Marker ids of 0 ask for generated ones.
    pub fn add_start_end_markers(
        &mut self,
        length: usize,
        start_char: u8,
        end_char: u8,
        start_id: NodeId,
        end_id: NodeId,
    ) -> Result<(NodeId, NodeId), GraphError> {
        let components = self.connected_components();
        let head_set: HashSet<NodeId> = self.head_nodes().into_iter().collect();
        let tail_set: HashSet<NodeId> = self.tail_nodes().into_iter().collect();

        let start = self.create_node_with_id(vec![start_char; length], start_id)?;
        let end = self.create_node_with_id(vec![end_char; length], end_id)?;

        for component in components {
            let heads: Vec<NodeId> = component.iter().copied().filter(|id| head_set.contains(id)).collect();
            let tails: Vec<NodeId> = component.iter().copied().filter(|id| tail_set.contains(id)).collect();
            for &h in &heads {
                self.create_edge(Side::end(start), Side::start(h))?;
            }
            for &t in &tails {
                self.create_edge(Side::end(t), Side::start(end))?;
            }
            if heads.is_empty() {
                self.create_edge(Side::end(start), Side::start(component[0]))?;
            }
            if tails.is_empty() {
                self.create_edge(Side::end(component[0]), Side::start(end))?;
            }
        }
        Ok((start, end))
    }

    /// Shift the other graph's ids past this graph's and copy it in.
    pub fn combine(&mut self, mut other: VariationGraph) -> Result<(), GraphError> {
        if !other.empty() && !self.empty() {
            let shift = self.max_node_id() - other.min_node_id() + 1;
            if shift > 0 {
                other.increment_node_ids(shift)?;
            }
        }
        let chunk = other.to_chunk();
        self.extend(&chunk, false)?;
        Ok(())
    }

    /// Like [`combine`](Self::combine), but also wire this graph's tails to
    /// the other graph's heads.
    pub fn append(&mut self, mut other: VariationGraph) -> Result<(), GraphError> {
        let my_tails = self.tail_nodes();
        if !other.empty() && !self.empty() {
            let shift = self.max_node_id() - other.min_node_id() + 1;
            if shift > 0 {
                other.increment_node_ids(shift)?;
            }
        }
        let other_heads = other.head_nodes();
        let chunk = other.to_chunk();
        self.extend(&chunk, false)?;
        for t in my_tails {
            for &h in &other_heads {
                self.create_edge(Side::end(t), Side::start(h))?;
            }
        }
        Ok(())
    }
}
