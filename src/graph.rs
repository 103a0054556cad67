use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::GraphError;
use crate::paths::PathStore;
use crate::side::{
    canonical_side_pair, reverse_complement, side_pair_from_edge, side_pair_from_end_edge,
    side_pair_from_start_edge, NodeId, Side, Traversal,
};

/// A graph node: a strictly positive id and a forward DNA sequence.
///
/// Orientation is not a property of a node; nodes are always stored as their
/// forward sequence. Empty sequences occur only on transient marker nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub sequence: Vec<u8>,
}

impl Node {
    pub fn new(id: NodeId, sequence: Vec<u8>) -> Self {
        Node { id, sequence }
    }
}

/// An edge between two node sides.
///
/// The declared from/to direction is nominal: the graph is bidirected, and
/// the identity of an edge is the unordered pair of sides it connects.
/// `from_start == false` means the edge leaves the end of `from`;
/// `to_end == false` means it enters the start of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub from_start: bool,
    pub to_end: bool,
}

impl Edge {
    /// Build an edge connecting two sides, declared in the given order.
    pub fn between(side1: Side, side2: Side) -> Self {
        Edge {
            from: side1.node,
            to: side2.node,
            from_start: !side1.is_end,
            to_end: side2.is_end,
        }
    }

    /// The canonical unordered pair of sides this edge connects.
    pub fn side_pair(&self) -> (Side, Side) {
        side_pair_from_edge(self.from, self.to, self.from_start, self.to_end)
    }
}

/// An in-memory, mutable, bidirected sequence graph.
///
/// Nodes and edges are owned by value in two arenas. Four indexes keep
/// lookups fast: id to node position, canonical side pair to edge position,
/// and per-node start-side and end-side adjacency lists. The adjacency lists
/// store (neighbor id, relative backward flag): on the start list, `false`
/// means the neighbor's end is attached; on the end list, `false` means the
/// neighbor's start is attached.
#[derive(Debug, Clone)]
pub struct VariationGraph {
    pub name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) node_by_id: HashMap<NodeId, usize>,
    pub(crate) edge_by_sides: HashMap<(Side, Side), usize>,
    pub(crate) edges_on_start: HashMap<NodeId, Vec<(NodeId, bool)>>,
    pub(crate) edges_on_end: HashMap<NodeId, Vec<(NodeId, bool)>>,
    pub paths: PathStore,
    pub(crate) current_id: NodeId,
}

impl Default for VariationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl VariationGraph {
    pub fn new() -> Self {
        VariationGraph {
            name: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            node_by_id: HashMap::new(),
            edge_by_sides: HashMap::new(),
            edges_on_start: HashMap::new(),
            edges_on_end: HashMap::new(),
            paths: PathStore::new(),
            current_id: 1,
        }
    }

    // ----- nodes -----

    /// Create a node with a generated id.
    pub fn create_node(&mut self, sequence: Vec<u8>) -> NodeId {
        self.create_node_with_id(sequence, 0)
            .expect("generated ids cannot collide")
    }

    /// Create a node. An id of 0 asks for a generated one; reusing a live id
    /// fails with `DuplicateId`.
    pub fn create_node_with_id(&mut self, sequence: Vec<u8>, id: NodeId) -> Result<NodeId, GraphError> {
        let id = if id == 0 { self.current_id } else { id };
        if id < 0 {
            return Err(GraphError::InvalidId(id));
        }
        if self.node_by_id.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        self.node_by_id.insert(id, self.nodes.len());
        self.nodes.push(Node::new(id, sequence));
        if id >= self.current_id {
            self.current_id = id + 1;
        }
        Ok(id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.node_by_id.contains_key(&id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.node_by_id.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Sequence length of a node; 0 if the node is absent.
    pub fn node_len(&self, id: NodeId) -> usize {
        self.get_node(id).map_or(0, |n| n.sequence.len())
    }

    /// The sequence read along a traversal: forward, or reverse complement.
    pub fn oriented_sequence(&self, t: Traversal) -> Option<Vec<u8>> {
        self.get_node(t.node).map(|n| {
            if t.backward {
                reverse_complement(&n.sequence)
            } else {
                n.sequence.clone()
            }
        })
    }

    /// Destroy a node, all edges incident to it, and every path step that
    /// visits it.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::MissingNode(id));
        }
        for edge in self.edges_of_node(id) {
            let (a, b) = edge.side_pair();
            self.destroy_edge(a, b)?;
        }
        self.edges_on_start.remove(&id);
        self.edges_on_end.remove(&id);
        let pos = self.node_by_id.remove(&id).expect("checked above");
        self.nodes.swap_remove(pos);
        if pos < self.nodes.len() {
            let moved = self.nodes[pos].id;
            self.node_by_id.insert(moved, pos);
        }
        self.paths.remove_node_steps(id);
        Ok(())
    }

    // ----- edges -----

    /// Create an edge between two sides. If an edge already connects them it
    /// is returned unchanged; absent endpoints fail with `MissingNode`.
    pub fn create_edge(&mut self, side1: Side, side2: Side) -> Result<Edge, GraphError> {
        if !self.has_node(side1.node) {
            return Err(GraphError::MissingNode(side1.node));
        }
        if !self.has_node(side2.node) {
            return Err(GraphError::MissingNode(side2.node));
        }
        let pair = canonical_side_pair(side1, side2);
        if let Some(&pos) = self.edge_by_sides.get(&pair) {
            return Ok(self.edges[pos]);
        }
        let edge = Edge::between(side1, side2);
        self.edge_by_sides.insert(pair, self.edges.len());
        self.edges.push(edge);
        self.index_adjacency(&edge);
        Ok(edge)
    }

    /// Create a left-to-right edge between two traversals.
    pub fn create_edge_between(&mut self, left: Traversal, right: Traversal) -> Result<Edge, GraphError> {
        self.create_edge(left.right_side(), right.left_side())
    }

    pub fn has_edge(&self, side1: Side, side2: Side) -> bool {
        self.edge_by_sides
            .contains_key(&canonical_side_pair(side1, side2))
    }

    pub fn get_edge(&self, side1: Side, side2: Side) -> Option<&Edge> {
        self.edge_by_sides
            .get(&canonical_side_pair(side1, side2))
            .map(|&pos| &self.edges[pos])
    }

    /// Destroy the edge between two sides, in either order.
    pub fn destroy_edge(&mut self, side1: Side, side2: Side) -> Result<(), GraphError> {
        let pair = canonical_side_pair(side1, side2);
        let pos = match self.edge_by_sides.remove(&pair) {
            Some(pos) => pos,
            None => return Err(GraphError::MissingEdge(side1, side2)),
        };
        let edge = self.edges[pos];
        self.unindex_adjacency(&edge);
        self.edges.swap_remove(pos);
        if pos < self.edges.len() {
            let moved_pair = self.edges[pos].side_pair();
            self.edge_by_sides.insert(moved_pair, pos);
        }
        Ok(())
    }

    fn adjacency_entry(on: Side, other: Side) -> (NodeId, bool) {
        let flag = if on.is_end { other.is_end } else { !other.is_end };
        (other.node, flag)
    }

    fn add_adjacency(&mut self, on: Side, other: Side) {
        let entry = Self::adjacency_entry(on, other);
        let list = if on.is_end {
            self.edges_on_end.entry(on.node).or_default()
        } else {
            self.edges_on_start.entry(on.node).or_default()
        };
        list.push(entry);
    }

    fn remove_adjacency(&mut self, on: Side, other: Side) {
        let entry = Self::adjacency_entry(on, other);
        let map = if on.is_end {
            &mut self.edges_on_end
        } else {
            &mut self.edges_on_start
        };
        if let Some(list) = map.get_mut(&on.node) {
            if let Some(i) = list.iter().position(|&e| e == entry) {
                list.remove(i);
            }
            if list.is_empty() {
                map.remove(&on.node);
            }
        }
    }

    pub(crate) fn index_adjacency(&mut self, edge: &Edge) {
        let (a, b) = edge.side_pair();
        self.add_adjacency(a, b);
        // a self-edge on a single side is counted once
        if a != b {
            self.add_adjacency(b, a);
        }
    }

    fn unindex_adjacency(&mut self, edge: &Edge) {
        let (a, b) = edge.side_pair();
        self.remove_adjacency(a, b);
        if a != b {
            self.remove_adjacency(b, a);
        }
    }

    /// Every edge incident to a node, each exactly once.
    pub fn edges_of_node(&self, id: NodeId) -> Vec<Edge> {
        let mut pairs = BTreeSet::new();
        if let Some(list) = self.edges_on_start.get(&id) {
            for &entry in list {
                pairs.insert(side_pair_from_start_edge(id, entry));
            }
        }
        if let Some(list) = self.edges_on_end.get(&id) {
            for &entry in list {
                pairs.insert(side_pair_from_end_edge(id, entry));
            }
        }
        pairs
            .into_iter()
            .filter_map(|pair| self.edge_by_sides.get(&pair).map(|&pos| self.edges[pos]))
            .collect()
    }

    // ----- adjacency views -----

    /// Sides connected by an edge to the given side, sorted.
    pub fn adjacent_sides(&self, side: Side) -> Vec<Side> {
        let list = if side.is_end {
            self.edges_on_end.get(&side.node)
        } else {
            self.edges_on_start.get(&side.node)
        };
        let mut out: Vec<Side> = list
            .map(|l| {
                l.iter()
                    .map(|&(o, b)| {
                        if side.is_end {
                            Side::new(o, b)
                        } else {
                            Side::new(o, !b)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Sides on the other end of edges reaching this side.
    pub fn sides_to(&self, side: Side) -> Vec<Side> {
        self.adjacent_sides(side)
    }

    /// Sides on the other end of edges leaving this side.
    pub fn sides_from(&self, side: Side) -> Vec<Side> {
        self.adjacent_sides(side)
    }

    /// Traversals attached to the left side of a traversal, in their proper
    /// orientations, sorted by (id, backward).
    pub fn nodes_prev(&self, t: Traversal) -> Vec<Traversal> {
        let list = if t.backward {
            self.edges_on_end.get(&t.node)
        } else {
            self.edges_on_start.get(&t.node)
        };
        let mut out: Vec<Traversal> = list
            .map(|l| {
                l.iter()
                    .map(|&(o, b)| Traversal::new(o, b != t.backward))
                    .collect()
            })
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Traversals attached to the right side of a traversal, sorted.
    pub fn nodes_next(&self, t: Traversal) -> Vec<Traversal> {
        let list = if t.backward {
            self.edges_on_start.get(&t.node)
        } else {
            self.edges_on_end.get(&t.node)
        };
        let mut out: Vec<Traversal> = list
            .map(|l| {
                l.iter()
                    .map(|&(o, b)| Traversal::new(o, b != t.backward))
                    .collect()
            })
            .unwrap_or_default();
        out.sort();
        out
    }

    pub fn start_degree(&self, id: NodeId) -> usize {
        self.edges_on_start.get(&id).map_or(0, |l| l.len())
    }

    pub fn end_degree(&self, id: NodeId) -> usize {
        self.edges_on_end.get(&id).map_or(0, |l| l.len())
    }

    pub fn left_degree(&self, t: Traversal) -> usize {
        if t.backward {
            self.end_degree(t.node)
        } else {
            self.start_degree(t.node)
        }
    }

    pub fn right_degree(&self, t: Traversal) -> usize {
        if t.backward {
            self.start_degree(t.node)
        } else {
            self.end_degree(t.node)
        }
    }

    // ----- properties -----

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn total_sequence_length(&self) -> usize {
        self.nodes.iter().map(|n| n.sequence.len()).sum()
    }

    pub fn min_node_id(&self) -> NodeId {
        self.nodes.iter().map(|n| n.id).min().unwrap_or(0)
    }

    pub fn max_node_id(&self) -> NodeId {
        self.nodes.iter().map(|n| n.id).max().unwrap_or(0)
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        ids
    }

    // ----- iteration -----

    /// Nodes in array order: the order of the most recent sort, or insertion
    /// order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn for_each_node(&self, mut f: impl FnMut(&Node)) {
        for node in &self.nodes {
            f(node);
        }
    }

    /// Visit every node from the worker pool. The visitor is called
    /// concurrently and must synchronize its own state.
    pub fn for_each_node_parallel(&self, f: impl Fn(&Node) + Sync) {
        self.nodes.par_iter().for_each(|n| f(n));
    }

    pub fn for_each_edge(&self, mut f: impl FnMut(&Edge)) {
        for edge in &self.edges {
            f(edge);
        }
    }

    pub fn for_each_edge_parallel(&self, f: impl Fn(&Edge) + Sync) {
        self.edges.par_iter().for_each(|e| f(e));
    }

    // ----- heads, tails, connectivity -----

    /// Nodes with no edges on their start side, ascending.
    pub fn head_nodes(&self) -> Vec<NodeId> {
        let mut heads: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|&id| self.start_degree(id) == 0)
            .collect();
        heads.sort_unstable();
        heads
    }

    /// Nodes with no edges on their end side, ascending.
    pub fn tail_nodes(&self) -> Vec<NodeId> {
        let mut tails: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|&id| self.end_degree(id) == 0)
            .collect();
        tails.sort_unstable();
        tails
    }

    pub fn is_head_node(&self, id: NodeId) -> bool {
        self.has_node(id) && self.start_degree(id) == 0
    }

    pub fn is_tail_node(&self, id: NodeId) -> bool {
        self.has_node(id) && self.end_degree(id) == 0
    }

    /// Distance in bp from the left of a traversal back to a head, or None
    /// if no head is reachable within `limit` bp.
    pub fn distance_to_head(&self, t: Traversal, limit: usize) -> Option<usize> {
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        queue.push_back((t, 0usize));
        seen.insert(t);
        while let Some((cur, dist)) = queue.pop_front() {
            let prevs = self.nodes_prev(cur);
            if prevs.is_empty() {
                return Some(dist);
            }
            for prev in prevs {
                let d = dist + self.node_len(prev.node);
                if d <= limit && seen.insert(prev) {
                    queue.push_back((prev, d));
                }
            }
        }
        None
    }

    /// Distance in bp from the right of a traversal forward to a tail.
    pub fn distance_to_tail(&self, t: Traversal, limit: usize) -> Option<usize> {
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        queue.push_back((t, 0usize));
        seen.insert(t);
        while let Some((cur, dist)) = queue.pop_front() {
            let nexts = self.nodes_next(cur);
            if nexts.is_empty() {
                return Some(dist);
            }
            for next in nexts {
                let d = dist + self.node_len(next.node);
                if d <= limit && seen.insert(next) {
                    queue.push_back((next, d));
                }
            }
        }
        None
    }

    fn undirected_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(list) = self.edges_on_start.get(&id) {
            out.extend(list.iter().map(|&(o, _)| o));
        }
        if let Some(list) = self.edges_on_end.get(&id) {
            out.extend(list.iter().map(|&(o, _)| o));
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Visit every node in the same connected component, ignoring relative
    /// orientation.
    pub fn for_each_connected_node(&self, start: NodeId, mut f: impl FnMut(NodeId)) {
        if !self.has_node(start) {
            return;
        }
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        queue.push_back(start);
        seen.insert(start);
        while let Some(id) = queue.pop_front() {
            f(id);
            for n in self.undirected_neighbors(id) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
    }

    /// Connected components as sorted id lists, ordered by smallest member.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen = HashSet::new();
        let mut components = Vec::new();
        for id in self.node_ids() {
            if seen.contains(&id) {
                continue;
            }
            let mut component = Vec::new();
            self.for_each_connected_node(id, |n| {
                seen.insert(n);
                component.push(n);
            });
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    // ----- index maintenance -----

    /// Drop all four indexes and rebuild them in one pass over the arenas.
    ///
    /// The recovery hatch after bulk mutation: duplicate ids, duplicate
    /// canonical side pairs, and orphan edges are silently discarded.
    pub fn rebuild_indexes(&mut self) {
        self.node_by_id.clear();
        self.edge_by_sides.clear();
        self.edges_on_start.clear();
        self.edges_on_end.clear();

        let mut kept_nodes = Vec::with_capacity(self.nodes.len());
        for node in std::mem::take(&mut self.nodes) {
            if node.id <= 0 || self.node_by_id.contains_key(&node.id) {
                continue;
            }
            self.node_by_id.insert(node.id, kept_nodes.len());
            kept_nodes.push(node);
        }
        self.nodes = kept_nodes;

        let mut kept_edges = Vec::with_capacity(self.edges.len());
        for edge in std::mem::take(&mut self.edges) {
            if !self.node_by_id.contains_key(&edge.from) || !self.node_by_id.contains_key(&edge.to) {
                continue;
            }
            let pair = edge.side_pair();
            if self.edge_by_sides.contains_key(&pair) {
                continue;
            }
            self.edge_by_sides.insert(pair, kept_edges.len());
            kept_edges.push(edge);
        }
        self.edges = kept_edges;

        let edges: Vec<Edge> = self.edges.clone();
        for edge in &edges {
            self.index_adjacency(edge);
        }
        self.current_id = self.max_node_id() + 1;
    }

    /// Check the structural invariants, complaining to stderr. Returns
    /// whether the graph is coherent.
    pub fn is_valid(&self) -> bool {
        let mut ok = true;
        let complain = |msg: String| {
            eprintln!("[graph] invalid: {}", msg);
        };

        for (pos, node) in self.nodes.iter().enumerate() {
            if node.id <= 0 {
                complain(format!("node at position {} has non-positive id {}", pos, node.id));
                ok = false;
            }
            if self.node_by_id.get(&node.id) != Some(&pos) {
                complain(format!("node {} is misindexed", node.id));
                ok = false;
            }
        }
        if self.node_by_id.len() != self.nodes.len() {
            complain(format!(
                "id index has {} entries for {} nodes",
                self.node_by_id.len(),
                self.nodes.len()
            ));
            ok = false;
        }

        if self.edge_by_sides.len() != self.edges.len() {
            complain(format!(
                "side-pair index has {} entries for {} edges",
                self.edge_by_sides.len(),
                self.edges.len()
            ));
            ok = false;
        }
        for (pos, edge) in self.edges.iter().enumerate() {
            if !self.has_node(edge.from) || !self.has_node(edge.to) {
                complain(format!("edge {:?} references a missing node", edge));
                ok = false;
                continue;
            }
            let pair = edge.side_pair();
            if self.edge_by_sides.get(&pair) != Some(&pos) {
                complain(format!("edge {:?} is misindexed", edge));
                ok = false;
            }
            let (a, b) = pair;
            if !self.adjacency_contains(a, b) || (a != b && !self.adjacency_contains(b, a)) {
                complain(format!("edge {:?} is missing from an adjacency list", edge));
                ok = false;
            }
        }

        for (&id, list) in &self.edges_on_start {
            for &entry in list {
                let pair = side_pair_from_start_edge(id, entry);
                if !self.edge_by_sides.contains_key(&pair) {
                    complain(format!("orphan start adjacency {:?} on node {}", entry, id));
                    ok = false;
                }
            }
        }
        for (&id, list) in &self.edges_on_end {
            for &entry in list {
                let pair = side_pair_from_end_edge(id, entry);
                if !self.edge_by_sides.contains_key(&pair) {
                    complain(format!("orphan end adjacency {:?} on node {}", entry, id));
                    ok = false;
                }
            }
        }

        for (name, node) in self.paths.invalid_steps(|id| self.has_node(id)) {
            complain(format!("path {} visits missing node {}", name, node));
            ok = false;
        }

        ok
    }

    fn adjacency_contains(&self, on: Side, other: Side) -> bool {
        let entry = Self::adjacency_entry(on, other);
        let list = if on.is_end {
            self.edges_on_end.get(&on.node)
        } else {
            self.edges_on_start.get(&on.node)
        };
        list.map_or(false, |l| l.contains(&entry))
    }

    // ----- path sequences -----

    /// The sequence spelled by a named path.
    pub fn path_sequence(&self, name: &str) -> Result<Vec<u8>, GraphError> {
        let path = self
            .paths
            .get(name)
            .ok_or_else(|| GraphError::Parse(format!("no path named {}", name)))?;
        let mut seq = Vec::new();
        for step in &path.steps {
            let part = self
                .oriented_sequence(*step)
                .ok_or(GraphError::MissingNode(step.node))?;
            seq.extend(part);
        }
        Ok(seq)
    }

    /// SHA-256 digest of a path's sequence, hex encoded.
    pub fn path_hash(&self, name: &str) -> Result<String, GraphError> {
        let mut hasher = Sha256::new();
        hasher.update(self.path_sequence(name)?);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Digests for every path, keyed by name.
    pub fn all_path_hashes(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for name in self.paths.names() {
            if let Ok(h) = self.path_hash(&name) {
                out.insert(name, h);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let mut g = VariationGraph::new();
        let a = g.create_node(b"ACGT".to_vec());
        assert_eq!(a, 1);
        let b = g.create_node_with_id(b"TT".to_vec(), 5).unwrap();
        assert_eq!(b, 5);
        // generation continues past explicit ids
        let c = g.create_node(b"G".to_vec());
        assert_eq!(c, 6);
        assert!(g.has_node(1) && g.has_node(5) && g.has_node(6));
        assert_eq!(
            g.create_node_with_id(b"A".to_vec(), 5),
            Err(GraphError::DuplicateId(5))
        );
    }

    #[test]
    fn test_duplicate_edge_returns_existing() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        let e1 = g.create_edge(Side::end(1), Side::start(2)).unwrap();
        // same sides declared the other way around
        let e2 = g.create_edge(Side::start(2), Side::end(1)).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_edge_to_missing_node_fails() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        assert_eq!(
            g.create_edge(Side::end(1), Side::start(9)),
            Err(GraphError::MissingNode(9))
        );
    }

    #[test]
    fn test_destroy_node_detaches_everything() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"A".to_vec(), 1).unwrap();
        g.create_node_with_id(b"C".to_vec(), 2).unwrap();
        g.create_node_with_id(b"G".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(2), Side::start(3)).unwrap();
        g.paths.append_step("p", Traversal::forward(1));
        g.paths.append_step("p", Traversal::forward(2));
        g.paths.append_step("p", Traversal::forward(3));

        g.destroy_node(2).unwrap();
        assert!(!g.has_node(2));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.nodes_next(Traversal::forward(1)), vec![]);
        assert_eq!(
            g.paths.get("p").unwrap().steps,
            vec![Traversal::forward(1), Traversal::forward(3)]
        );
        assert!(g.is_valid());
    }

    #[test]
    fn test_nodes_prev_next_orientations() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        // inverting edge: 1.end to 2.end
        g.create_edge(Side::end(1), Side::end(2)).unwrap();
        assert_eq!(g.nodes_next(Traversal::forward(1)), vec![Traversal::reverse(2)]);
        assert_eq!(g.nodes_prev(Traversal::reverse(2)), vec![Traversal::forward(1)]);
        assert_eq!(g.nodes_next(Traversal::forward(2)), vec![Traversal::reverse(1)]);
    }

    #[test]
    fn test_same_side_self_loop_counted_once() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"ACGT".to_vec(), 1).unwrap();
        g.create_edge(Side::start(1), Side::start(1)).unwrap();
        assert_eq!(g.start_degree(1), 1);
        assert_eq!(g.nodes_prev(Traversal::forward(1)), vec![Traversal::reverse(1)]);
        assert_eq!(g.nodes_next(Traversal::reverse(1)), vec![Traversal::forward(1)]);
        assert!(g.is_valid());
        g.destroy_node(1).unwrap();
        assert!(g.empty());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_heads_and_tails() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"A".to_vec(), 1).unwrap();
        g.create_node_with_id(b"C".to_vec(), 2).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        assert_eq!(g.head_nodes(), vec![1]);
        assert_eq!(g.tail_nodes(), vec![2]);
        assert!(g.is_head_node(1) && g.is_tail_node(2));
        assert_eq!(g.distance_to_head(Traversal::forward(2), 100), Some(1));
        assert_eq!(g.distance_to_tail(Traversal::forward(1), 100), Some(1));
    }

    #[test]
    fn test_rebuild_indexes_drops_duplicates_and_orphans() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"A".to_vec(), 1).unwrap();
        g.create_node_with_id(b"C".to_vec(), 2).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        // sneak in a duplicate node and an orphan edge behind the indexes
        g.nodes.push(Node::new(1, b"G".to_vec()));
        g.edges.push(Edge::between(Side::end(1), Side::start(7)));
        g.rebuild_indexes();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.is_valid());
    }

    #[test]
    fn test_path_hash_tracks_sequence() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"ACG".to_vec(), 1).unwrap();
        g.create_node_with_id(b"T".to_vec(), 2).unwrap();
        g.paths.append_step("p", Traversal::forward(1));
        g.paths.append_step("p", Traversal::forward(2));
        assert_eq!(g.path_sequence("p").unwrap(), b"ACGT".to_vec());
        let h1 = g.path_hash("p").unwrap();

        let mut g2 = VariationGraph::new();
        g2.create_node_with_id(b"ACGT".to_vec(), 9).unwrap();
        g2.paths.append_step("p", Traversal::forward(9));
        assert_eq!(h1, g2.path_hash("p").unwrap());
    }
}
