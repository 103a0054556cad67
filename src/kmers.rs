use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::GraphError;
use crate::graph::VariationGraph;
use crate::side::{complement_base, reverse_complement, NodeId, Traversal};

/// One k-mer occurrence record for the downstream suffix-array builder.
///
/// `pos` and the members of `next_positions` are formatted `id[+/-]:offset`,
/// with the offset measured in the orientation the walk reads the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct KmerPosition {
    pub kmer: String,
    pub pos: String,
    pub prev_chars: BTreeSet<char>,
    pub next_chars: BTreeSet<char>,
    pub next_positions: BTreeSet<String>,
}

/// Where a k-mer window lands in its walk: the traversal index and offset of
/// the window's last base, the (char, node, backward, offset) positions that
/// can precede the window, and those that can follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmerContext {
    pub end_idx: usize,
    pub end_offset: usize,
    pub prev: BTreeSet<(u8, NodeId, bool, usize)>,
    pub next: BTreeSet<(u8, NodeId, bool, usize)>,
}

/// Render a position as `id[+/-]:offset`.
pub fn format_pos(node: NodeId, backward: bool, offset: usize) -> String {
    format!("{}{}:{}", node, if backward { '-' } else { '+' }, offset)
}

impl VariationGraph {
    /// The sequence read along a walk.
    pub fn walk_sequence(&self, walk: &[Traversal]) -> Vec<u8> {
        let mut seq = Vec::new();
        for t in walk {
            if let Some(part) = self.oriented_sequence(*t) {
                seq.extend(part);
            }
        }
        seq
    }

    pub fn walk_string(&self, walk: &[Traversal]) -> String {
        String::from_utf8_lossy(&self.walk_sequence(walk)).into_owned()
    }

    /// Slide a `k`-window at `stride` over every bounded walk through a
    /// node, visiting only windows that start inside that node's traversal
    /// so each occurrence is attributed to exactly one center. The visitor
    /// receives (kmer, walk, center index, offset within the center).
    pub fn for_each_kmer_of_node(
        &self,
        id: NodeId,
        k: usize,
        edge_max: i64,
        stride: usize,
        visitor: &mut dyn FnMut(&str, &[Traversal], usize, usize),
    ) -> Result<(), GraphError> {
        if k == 0 {
            return if self.has_node(id) {
                Ok(())
            } else {
                Err(GraphError::MissingNode(id))
            };
        }
        let stride = stride.max(1);
        self.kpaths_of_node(id, k as i64, edge_max, &mut |_| {}, &mut |_| {}, &mut |center, walk| {
            let seq = self.walk_sequence(walk);
            if seq.len() < k {
                return;
            }
            let center_start: usize = walk[..center].iter().map(|t| self.node_len(t.node)).sum();
            let center_len = self.node_len(walk[center].node);
            let mut i = 0;
            while i + k <= seq.len() {
                if i >= center_start && i < center_start + center_len {
                    let kmer = String::from_utf8_lossy(&seq[i..i + k]).into_owned();
                    visitor(&kmer, walk, center, i - center_start);
                }
                i += stride;
            }
        })
    }

    /// K-mers of every node, sequentially in node array order.
    pub fn for_each_kmer(
        &self,
        k: usize,
        edge_max: i64,
        stride: usize,
        mut visitor: impl FnMut(&str, &[Traversal], usize, usize),
    ) {
        for node in self.nodes() {
            let _ = self.for_each_kmer_of_node(node.id, k, edge_max, stride, &mut |km, w, c, o| {
                visitor(km, w, c, o)
            });
        }
    }

    /// Parallel form; the visitor is called concurrently.
    pub fn for_each_kmer_parallel(
        &self,
        k: usize,
        edge_max: i64,
        stride: usize,
        visitor: impl Fn(&str, &[Traversal], usize, usize) + Sync,
    ) {
        let ids: Vec<NodeId> = self.nodes().map(|n| n.id).collect();
        ids.par_iter().for_each(|&id| {
            let _ = self.for_each_kmer_of_node(id, k, edge_max, stride, &mut |km, w, c, o| {
                visitor(km, w, c, o)
            });
        });
    }

    /// Locate the end of a `k`-window starting at `start_offset` within
    /// `walk[start_idx]`, and gather the characters and positions
    /// immediately before and after it. At node boundaries the graph
    /// adjacency supplies the candidates: the characters at the last base of
    /// every predecessor traversal, and the first base of every successor.
    pub fn kmer_context(
        &self,
        walk: &[Traversal],
        start_idx: usize,
        start_offset: usize,
        k: usize,
    ) -> KmerContext {
        let mut ctx = KmerContext::default();

        // walk to the window's last base
        let mut idx = start_idx;
        let mut off = start_offset + k - 1;
        while off >= self.node_len(walk[idx].node) && idx + 1 < walk.len() {
            off -= self.node_len(walk[idx].node);
            idx += 1;
        }
        ctx.end_idx = idx;
        ctx.end_offset = off;

        let start = walk[start_idx];
        if start_offset > 0 {
            if let Some(seq) = self.oriented_sequence(start) {
                ctx.prev
                    .insert((seq[start_offset - 1], start.node, start.backward, start_offset - 1));
            }
        } else {
            for p in self.nodes_prev(start) {
                if let Some(seq) = self.oriented_sequence(p) {
                    if !seq.is_empty() {
                        ctx.prev
                            .insert((seq[seq.len() - 1], p.node, p.backward, seq.len() - 1));
                    }
                }
            }
        }

        let end = walk[ctx.end_idx];
        let end_seq = self.oriented_sequence(end).unwrap_or_default();
        if ctx.end_offset + 1 < end_seq.len() {
            ctx.next.insert((
                end_seq[ctx.end_offset + 1],
                end.node,
                end.backward,
                ctx.end_offset + 1,
            ));
        } else {
            for n in self.nodes_next(end) {
                if let Some(seq) = self.oriented_sequence(n) {
                    if !seq.is_empty() {
                        ctx.next.insert((seq[0], n.node, n.backward, 0));
                    }
                }
            }
        }
        ctx
    }

    /// All unique (kmer, position) records with unioned character and
    /// position sets: the merging form, with no strand doubling and no
    /// padding. Records are sorted.
    pub fn kmer_positions(&self, k: usize, edge_max: i64, stride: usize) -> Vec<KmerPosition> {
        let records: Mutex<BTreeMap<(String, String), KmerPosition>> = Mutex::new(BTreeMap::new());
        let ids: Vec<NodeId> = self.nodes().map(|n| n.id).collect();
        ids.par_iter().for_each(|&id| {
            let mut local = Vec::new();
            let _ = self.for_each_kmer_of_node(id, k, edge_max, stride, &mut |kmer, walk, center, offset| {
                let ctx = self.kmer_context(walk, center, offset, k);
                let t = walk[center];
                let mut rec = KmerPosition {
                    kmer: kmer.to_string(),
                    pos: format_pos(t.node, t.backward, offset),
                    ..KmerPosition::default()
                };
                for &(c, _, _, _) in &ctx.prev {
                    rec.prev_chars.insert(c as char);
                }
                for &(c, n, b, o) in &ctx.next {
                    rec.next_chars.insert(c as char);
                    rec.next_positions.insert(format_pos(n, b, o));
                }
                local.push(rec);
            });
            let mut map = records.lock().unwrap();
            for rec in local {
                merge_record(&mut map, rec);
            }
        });
        records.into_inner().unwrap().into_values().collect()
    }

    /// Stream per-occurrence GCSA records from the worker pool.
    ///
    /// The graph is copied and padded with a `#`-run head and `$`-run tail
    /// of length `k` so no window runs off an end; the marker ids chosen
    /// (or passed in, if nonzero) are written back through `head_id` and
    /// `tail_id`. With `forward_only` unset, each record is also emitted for
    /// the reverse-complement strand, and node ids are doubled: `2*id` for
    /// the forward copy, `2*id + 1` for the reverse copy, positions always
    /// signed `+`. A given (kmer, pos) may be delivered more than once with
    /// partial sets; the consumer merges, or uses
    /// [`gcsa_kmer_positions`](Self::gcsa_kmer_positions).
    pub fn for_each_gcsa_kmer_position_parallel(
        &self,
        k: usize,
        edge_max: i64,
        stride: usize,
        forward_only: bool,
        head_id: &mut NodeId,
        tail_id: &mut NodeId,
        visitor: impl Fn(&KmerPosition) + Sync,
    ) -> Result<(), GraphError> {
        if k == 0 {
            return Ok(());
        }
        let mut work = self.clone();
        work.paths.clear();
        let (head, tail) = work.add_start_end_markers(k, b'#', b'$', *head_id, *tail_id)?;
        *head_id = head;
        *tail_id = tail;

        let fmt = move |t: Traversal, off: usize| -> String {
            if forward_only {
                format_pos(t.node, t.backward, off)
            } else {
                format_pos(2 * t.node + NodeId::from(t.backward), false, off)
            }
        };

        let ids: Vec<NodeId> = work.nodes().map(|n| n.id).collect();
        ids.par_iter().try_for_each(|&id| -> Result<(), GraphError> {
            work.for_each_kmer_of_node(id, k, edge_max, stride, &mut |kmer, walk, center, offset| {
                let ctx = work.kmer_context(walk, center, offset, k);
                let t = walk[center];

                let mut rec = KmerPosition {
                    kmer: kmer.to_string(),
                    pos: fmt(t, offset),
                    ..KmerPosition::default()
                };
                for &(c, _, _, _) in &ctx.prev {
                    rec.prev_chars.insert(c as char);
                }
                for &(c, n, b, o) in &ctx.next {
                    rec.next_chars.insert(c as char);
                    rec.next_positions.insert(fmt(Traversal::new(n, b), o));
                }
                visitor(&rec);

                if !forward_only {
                    // the same occurrence, read on the opposite strand
                    let end = walk[ctx.end_idx];
                    let end_len = work.node_len(end.node);
                    let rc_kmer =
                        String::from_utf8_lossy(&reverse_complement(kmer.as_bytes())).into_owned();
                    let mut rc = KmerPosition {
                        kmer: rc_kmer,
                        pos: fmt(end.flip(), end_len - 1 - ctx.end_offset),
                        ..KmerPosition::default()
                    };
                    for &(c, _, _, _) in &ctx.next {
                        rc.prev_chars.insert(complement_base(c) as char);
                    }
                    for &(c, n, b, o) in &ctx.prev {
                        rc.next_chars.insert(complement_base(c) as char);
                        let len = work.node_len(n);
                        rc.next_positions
                            .insert(fmt(Traversal::new(n, !b), len - 1 - o));
                    }
                    visitor(&rc);
                }
            })
        })?;
        Ok(())
    }

    /// The merging form of the GCSA producer: each distinct (kmer, pos)
    /// exactly once, with unioned sets, sorted.
    pub fn gcsa_kmer_positions(
        &self,
        k: usize,
        edge_max: i64,
        stride: usize,
        forward_only: bool,
        head_id: &mut NodeId,
        tail_id: &mut NodeId,
    ) -> Result<Vec<KmerPosition>, GraphError> {
        let records: Mutex<BTreeMap<(String, String), KmerPosition>> = Mutex::new(BTreeMap::new());
        self.for_each_gcsa_kmer_position_parallel(
            k,
            edge_max,
            stride,
            forward_only,
            head_id,
            tail_id,
            |rec| {
                let mut map = records.lock().unwrap();
                merge_record(&mut map, rec.clone());
            },
        )?;
        Ok(records.into_inner().unwrap().into_values().collect())
    }
}

/// Union a record into a map keyed by (kmer, pos).
pub fn merge_record(map: &mut BTreeMap<(String, String), KmerPosition>, rec: KmerPosition) {
    let key = (rec.kmer.clone(), rec.pos.clone());
    let entry = map.entry(key).or_insert_with(|| KmerPosition {
        kmer: rec.kmer.clone(),
        pos: rec.pos.clone(),
        ..KmerPosition::default()
    });
    entry.prev_chars.extend(rec.prev_chars);
    entry.next_chars.extend(rec.next_chars);
    entry.next_positions.extend(rec.next_positions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;

    #[test]
    fn test_single_node_kmers() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AAGT".to_vec(), 1).unwrap();
        let records = g.kmer_positions(3, 0, 1);
        assert_eq!(records.len(), 2);

        let aag = records.iter().find(|r| r.kmer == "AAG").unwrap();
        assert_eq!(aag.pos, "1+:0");
        assert!(aag.prev_chars.is_empty());
        assert_eq!(aag.next_chars, ['T'].into_iter().collect());
        assert_eq!(aag.next_positions, ["1+:3".to_string()].into_iter().collect());

        let agt = records.iter().find(|r| r.kmer == "AGT").unwrap();
        assert_eq!(agt.pos, "1+:1");
        assert_eq!(agt.prev_chars, ['A'].into_iter().collect());
        assert!(agt.next_chars.is_empty());
        assert!(agt.next_positions.is_empty());
    }

    #[test]
    fn test_branching_kmers_share_position() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        g.create_node_with_id(b"TT".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        let records = g.kmer_positions(3, 0, 1);

        let at_start: Vec<&KmerPosition> =
            records.iter().filter(|r| r.pos == "1+:0").collect();
        let kmers: BTreeSet<&str> = at_start.iter().map(|r| r.kmer.as_str()).collect();
        assert!(kmers.contains("ACG"));
        assert!(kmers.contains("ACT"));

        let acg = at_start.iter().find(|r| r.kmer == "ACG").unwrap();
        assert_eq!(acg.next_positions, ["2+:1".to_string()].into_iter().collect());
        let act = at_start.iter().find(|r| r.kmer == "ACT").unwrap();
        assert_eq!(act.next_positions, ["3+:1".to_string()].into_iter().collect());
    }

    #[test]
    fn test_same_kmer_from_two_walks_merges() {
        // 1:"AC" -> 2:"GT" and 1 -> 3:"GA": "ACG" at 1+:0 ends in either
        // branch, so its next sets union
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        g.create_node_with_id(b"GA".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        let records = g.kmer_positions(3, 0, 1);
        let acg = records
            .iter()
            .find(|r| r.kmer == "ACG" && r.pos == "1+:0")
            .unwrap();
        assert_eq!(acg.next_chars, ['A', 'T'].into_iter().collect());
        assert_eq!(
            acg.next_positions,
            ["2+:1".to_string(), "3+:1".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn test_prev_chars_union_across_predecessors() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"CA".to_vec(), 1).unwrap();
        g.create_node_with_id(b"TG".to_vec(), 2).unwrap();
        g.create_node_with_id(b"CCC".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();
        g.create_edge(Side::end(2), Side::start(3)).unwrap();
        let records = g.kmer_positions(3, 0, 1);
        let ccc = records
            .iter()
            .find(|r| r.kmer == "CCC" && r.pos == "3+:0")
            .unwrap();
        assert_eq!(ccc.prev_chars, ['A', 'G'].into_iter().collect());
    }

    #[test]
    fn test_gcsa_doubling_and_padding() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AAGT".to_vec(), 1).unwrap();
        let mut head = 0;
        let mut tail = 0;
        let records = g.gcsa_kmer_positions(3, 0, 1, false, &mut head, &mut tail).unwrap();
        assert!(head > 1 && tail > head);
        // untouched original
        assert_eq!(g.node_count(), 1);

        // forward-strand record for AAG sits on gcsa node 2*1
        let aag = records.iter().find(|r| r.kmer == "AAG" && r.pos == "2+:0").unwrap();
        assert!(aag.prev_chars.contains(&'#'));
        // its reverse complement lives on gcsa node 2*1+1
        assert!(records.iter().any(|r| r.kmer == "CTT" && r.pos == "3+:1"));
        assert!(records.iter().any(|r| r.kmer == "ACT" && r.pos == "3+:0"));
        // padding k-mers exist on the marker nodes
        assert!(records.iter().any(|r| r.kmer.contains('#')));
        assert!(records.iter().any(|r| r.kmer.contains('$')));
    }

    #[test]
    fn test_streaming_union_matches_merged_form() {
        let mut g = VariationGraph::new();
        g.create_node_with_id(b"AC".to_vec(), 1).unwrap();
        g.create_node_with_id(b"GT".to_vec(), 2).unwrap();
        g.create_node_with_id(b"GA".to_vec(), 3).unwrap();
        g.create_edge(Side::end(1), Side::start(2)).unwrap();
        g.create_edge(Side::end(1), Side::start(3)).unwrap();

        let mut h1 = 0;
        let mut t1 = 0;
        let merged = g.gcsa_kmer_positions(3, 0, 1, false, &mut h1, &mut t1).unwrap();

        let streamed: Mutex<BTreeMap<(String, String), KmerPosition>> =
            Mutex::new(BTreeMap::new());
        let mut h2 = h1;
        let mut t2 = t1;
        g.for_each_gcsa_kmer_position_parallel(3, 0, 1, false, &mut h2, &mut t2, |rec| {
            let mut map = streamed.lock().unwrap();
            merge_record(&mut map, rec.clone());
        })
        .unwrap();
        let unioned: Vec<KmerPosition> = streamed.into_inner().unwrap().into_values().collect();
        assert_eq!(unioned, merged);
    }
}
