use std::fmt;

/// Node identifier. Strictly positive; 0 is reserved to mean "generate one".
pub type NodeId = i64;

/// One side of a node, for the purposes of indexing edges.
///
/// Every node has a start side (`is_end == false`) and an end side
/// (`is_end == true`). Edges attach to sides, not to nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Side {
    pub node: NodeId,
    pub is_end: bool,
}

impl Side {
    pub fn new(node: NodeId, is_end: bool) -> Self {
        Side { node, is_end }
    }

    /// The start side of a node.
    pub fn start(node: NodeId) -> Self {
        Side { node, is_end: false }
    }

    /// The end side of a node.
    pub fn end(node: NodeId) -> Self {
        Side { node, is_end: true }
    }

    /// The other side of the same node.
    pub fn flip(&self) -> Self {
        Side { node: self.node, is_end: !self.is_end }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, if self.is_end { "end" } else { "start" })
    }
}

/// A node traversed in a certain orientation.
///
/// Forward enters at the start and leaves at the end; backward enters at the
/// end and leaves at the start, reading the reverse complement. A traversal
/// has a left and a right side, which swap when the orientation flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Traversal {
    pub node: NodeId,
    pub backward: bool,
}

impl Traversal {
    pub fn new(node: NodeId, backward: bool) -> Self {
        Traversal { node, backward }
    }

    pub fn forward(node: NodeId) -> Self {
        Traversal { node, backward: false }
    }

    pub fn reverse(node: NodeId) -> Self {
        Traversal { node, backward: true }
    }

    /// The same node in the opposite orientation.
    pub fn flip(&self) -> Self {
        Traversal { node: self.node, backward: !self.backward }
    }

    /// The side this traversal is entered through.
    pub fn left_side(&self) -> Side {
        Side::new(self.node, self.backward)
    }

    /// The side this traversal is left through.
    pub fn right_side(&self) -> Side {
        Side::new(self.node, !self.backward)
    }

    pub fn orientation_char(&self) -> char {
        if self.backward { '-' } else { '+' }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.node, self.orientation_char())
    }
}

/// Canonically order a pair of sides so that callers may pass them either way.
pub fn canonical_side_pair(a: Side, b: Side) -> (Side, Side) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The canonical side pair designated by an edge's declared fields.
///
/// `from_start == false` means the edge leaves the end of `from`;
/// `to_end == false` means it enters the start of `to`.
pub fn side_pair_from_edge(from: NodeId, to: NodeId, from_start: bool, to_end: bool) -> (Side, Side) {
    canonical_side_pair(Side::new(from, !from_start), Side::new(to, to_end))
}

/// Canonical side pair for an edge on the start of a node, given the
/// (neighbor, relative backward) entry stored in the start adjacency list.
pub fn side_pair_from_start_edge(start_id: NodeId, other: (NodeId, bool)) -> (Side, Side) {
    canonical_side_pair(Side::start(start_id), Side::new(other.0, !other.1))
}

/// Canonical side pair for an edge on the end of a node, given the
/// (neighbor, relative backward) entry stored in the end adjacency list.
pub fn side_pair_from_end_edge(end_id: NodeId, other: (NodeId, bool)) -> (Side, Side) {
    canonical_side_pair(Side::end(end_id), Side::new(other.0, other.1))
}

/// Complement a single base. Non-ACGT characters are left unchanged, so
/// marker characters survive a round trip.
#[inline]
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' | b'a' => b'T',
        b'T' | b't' => b'A',
        b'C' | b'c' => b'G',
        b'G' | b'g' => b'C',
        b'N' | b'n' => b'N',
        _ => base,
    }
}

/// Compute the reverse complement of a DNA sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_ordering() {
        assert!(Side::start(1) < Side::end(1));
        assert!(Side::end(1) < Side::start(2));
    }

    #[test]
    fn test_traversal_sides() {
        let t = Traversal::forward(7);
        assert_eq!(t.left_side(), Side::start(7));
        assert_eq!(t.right_side(), Side::end(7));

        let r = t.flip();
        assert_eq!(r.left_side(), Side::end(7));
        assert_eq!(r.right_side(), Side::start(7));
    }

    #[test]
    fn test_canonical_pair_is_order_independent() {
        let a = Side::end(1);
        let b = Side::start(2);
        assert_eq!(canonical_side_pair(a, b), canonical_side_pair(b, a));
    }

    #[test]
    fn test_side_pair_from_edge_matches_reversed_declaration() {
        // 1.end -> 2.start declared both ways around
        let p1 = side_pair_from_edge(1, 2, false, false);
        let p2 = side_pair_from_edge(2, 1, true, true);
        assert_eq!(p1, p2);
        assert_eq!(p1, (Side::end(1), Side::start(2)));
    }

    #[test]
    fn test_adjacency_entry_pairs() {
        // Edge 1.end <-> 2.start: on the end list of 1 the neighbor 2 is in
        // the same relative orientation, and symmetrically on 2's start list.
        assert_eq!(
            side_pair_from_end_edge(1, (2, false)),
            (Side::end(1), Side::start(2))
        );
        assert_eq!(
            side_pair_from_start_edge(2, (1, false)),
            (Side::end(1), Side::start(2))
        );
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ATCG"), b"CGAT");
        assert_eq!(reverse_complement(b"AAAA"), b"TTTT");
        assert_eq!(reverse_complement(b"#$"), b"$#");
    }
}
