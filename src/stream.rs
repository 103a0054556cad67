use crate::error::GraphError;
use crate::graph::{Edge, Node, VariationGraph};
use crate::paths::Path;

/// One unit of the chunked interchange format: a slice of the graph small
/// enough to stream. The wire encoding itself belongs to the caller; the
/// engine only fills and consumes these in-memory messages.
#[derive(Debug, Clone, Default)]
pub struct GraphChunk {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub paths: Vec<Path>,
}

impl GraphChunk {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.paths.is_empty()
    }
}

impl VariationGraph {
    /// The whole graph as a single chunk.
    pub fn to_chunk(&self) -> GraphChunk {
        GraphChunk {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            paths: self.paths.iter().cloned().collect(),
        }
    }

    /// Add a chunk's contents to the graph. Duplicate nodes and edges are
    /// dropped, with a diagnostic when `warn_on_duplicates` is set; edges and
    /// path steps referencing absent nodes are always complained about and
    /// skipped.
    pub fn extend(&mut self, chunk: &GraphChunk, warn_on_duplicates: bool) -> Result<(), GraphError> {
        for node in &chunk.nodes {
            match self.create_node_with_id(node.sequence.clone(), node.id) {
                Ok(_) => {}
                Err(GraphError::DuplicateId(id)) => {
                    if warn_on_duplicates {
                        eprintln!("[extend] dropping duplicate node {}", id);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        for edge in &chunk.edges {
            let (a, b) = edge.side_pair();
            if !self.has_node(a.node) || !self.has_node(b.node) {
                eprintln!("[extend] dropping edge {:?}: missing endpoint", edge);
                continue;
            }
            if self.has_edge(a, b) {
                if warn_on_duplicates {
                    eprintln!("[extend] dropping duplicate edge {:?}", edge);
                }
                continue;
            }
            self.create_edge(a, b)?;
        }
        for path in &chunk.paths {
            for step in &path.steps {
                if self.has_node(step.node) {
                    self.paths.append_step(&path.name, *step);
                } else {
                    eprintln!("[extend] dropping step {} of path {}: missing node", step, path.name);
                }
            }
        }
        Ok(())
    }

    /// Stream the graph as chunks of `chunk_size` nodes, filled in node
    /// array order. An edge travels with the chunk of its later-positioned
    /// endpoint, so replaying the chunks through [`extend`](Self::extend)
    /// never sees a dangling edge; paths travel in the final chunk.
    pub fn for_each_chunk(&self, chunk_size: usize, mut f: impl FnMut(GraphChunk)) {
        let chunk_size = chunk_size.max(1);
        if self.nodes.is_empty() {
            let chunk = GraphChunk {
                paths: self.paths.iter().cloned().collect(),
                ..GraphChunk::default()
            };
            if !chunk.is_empty() {
                f(chunk);
            }
            return;
        }
        let n_chunks = (self.nodes.len() + chunk_size - 1) / chunk_size;
        let mut chunk_edges: Vec<Vec<Edge>> = vec![Vec::new(); n_chunks];
        for edge in &self.edges {
            let from_pos = self.node_by_id[&edge.from];
            let to_pos = self.node_by_id[&edge.to];
            chunk_edges[from_pos.max(to_pos) / chunk_size].push(*edge);
        }
        for (i, block) in self.nodes.chunks(chunk_size).enumerate() {
            let mut chunk = GraphChunk {
                nodes: block.to_vec(),
                edges: std::mem::take(&mut chunk_edges[i]),
                paths: Vec::new(),
            };
            if i == n_chunks - 1 {
                chunk.paths = self.paths.iter().cloned().collect();
            }
            f(chunk);
        }
    }

    /// Reassemble a graph from a chunk stream.
    pub fn from_chunks(chunks: impl IntoIterator<Item = GraphChunk>) -> Result<Self, GraphError> {
        let mut graph = VariationGraph::new();
        for chunk in chunks {
            graph.extend(&chunk, false)?;
        }
        Ok(graph)
    }
}
