//! # vargraph: an in-memory bidirected sequence graph
//!
//! A mutable variation graph for pangenome construction and read indexing.
//! Nodes carry forward DNA sequences; edges connect node *sides* (start or
//! end), so the graph is bidirected and a traversal reads a node forward or
//! as its reverse complement. Named paths record haplotypes as ordered
//! oriented visits and follow the graph through every structural mutation.
//!
//! The main entry point is [`VariationGraph`]:
//!
//! - construction and lookups keyed by id or canonical side pair, with
//!   start- and end-side adjacency indexes kept coherent through every
//!   mutation (`rebuild_indexes` is the recovery hatch after bulk edits);
//! - structural operators: `divide_node`, `merge_nodes`, id renumbering,
//!   null-node removal with edge forwarding, path-driven pruning, and
//!   head/tail marker wrapping;
//! - normalization: bidirected topological sorting, `orient_nodes_forward`,
//!   `unchop` of simple components, sibling simplification, and complexity
//!   pruning;
//! - bounded walk enumeration (`for_each_kpath` and friends) and the k-mer
//!   producer built on it, including the doubled-strand GCSA form;
//! - GFA text and chunked interchange at the boundary.
//!
//! Read-only iteration has data-parallel forms driven by the rayon pool;
//! visitors run concurrently and synchronize their own state. Mutating
//! operators need exclusive access.

pub mod error;
pub mod gfa;
pub mod graph;
pub mod kmers;
pub mod kpaths;
pub mod normalize;
pub mod ops;
pub mod paths;
pub mod prune;
pub mod side;
pub mod sim;
pub mod sort;
pub mod stream;

pub use error::GraphError;
pub use graph::{Edge, Node, VariationGraph};
pub use kmers::{format_pos, merge_record, KmerContext, KmerPosition};
pub use paths::{Path, PathStore};
pub use side::{
    canonical_side_pair, complement_base, reverse_complement, side_pair_from_edge,
    side_pair_from_end_edge, side_pair_from_start_edge, NodeId, Side, Traversal,
};
pub use stream::GraphChunk;
