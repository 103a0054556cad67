use rand::Rng;

use crate::graph::VariationGraph;
use crate::side::{reverse_complement, Traversal};

impl VariationGraph {
    /// Sample a read of up to `read_len` bp: a uniform random start node and
    /// offset, then a walk rightward taking uniform random branches. With
    /// `either_strand`, half the reads come back reverse-complemented.
    /// Returns the read with its starting traversal and offset, or None if
    /// the graph is empty or the chosen node has no sequence.
    pub fn random_read<R: Rng>(
        &self,
        read_len: usize,
        rng: &mut R,
        either_strand: bool,
    ) -> Option<(String, Traversal, usize)> {
        if self.empty() || read_len == 0 {
            return None;
        }
        let node = &self.nodes[rng.gen_range(0..self.nodes.len())];
        if node.sequence.is_empty() {
            return None;
        }
        let offset = rng.gen_range(0..node.sequence.len());
        let start = Traversal::forward(node.id);

        let mut seq: Vec<u8> = node.sequence[offset..].to_vec();
        let mut cur = start;
        while seq.len() < read_len {
            let nexts = self.nodes_next(cur);
            if nexts.is_empty() {
                break;
            }
            let next = nexts[rng.gen_range(0..nexts.len())];
            match self.oriented_sequence(next) {
                Some(part) => seq.extend(part),
                None => break,
            }
            cur = next;
        }
        seq.truncate(read_len);
        if either_strand && rng.gen_bool(0.5) {
            seq = reverse_complement(&seq);
        }
        Some((String::from_utf8_lossy(&seq).into_owned(), start, offset))
    }
}
