use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path as FsPath;

use crate::error::GraphError;
use crate::graph::VariationGraph;
use crate::side::{NodeId, Side, Traversal};

impl VariationGraph {
    /// Write the graph as GFA: `S` lines for nodes, `L` lines for edges
    /// (`+` leaves the end side of from / enters the start side of to),
    /// `P` lines for paths.
    pub fn to_gfa<W: Write>(&self, out: &mut W) -> Result<(), GraphError> {
        writeln!(out, "H\tVN:Z:1.0")?;

        let mut nodes: Vec<_> = self.nodes().collect();
        nodes.sort_by_key(|n| n.id);
        for node in nodes {
            writeln!(out, "S\t{}\t{}", node.id, String::from_utf8_lossy(&node.sequence))?;
        }

        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_by_key(|e| e.side_pair());
        for edge in edges {
            writeln!(
                out,
                "L\t{}\t{}\t{}\t{}\t*",
                edge.from,
                if edge.from_start { '-' } else { '+' },
                edge.to,
                if edge.to_end { '-' } else { '+' },
            )?;
        }

        for path in self.paths.iter() {
            let steps: Vec<String> = path
                .steps
                .iter()
                .map(|t| format!("{}{}", t.node, t.orientation_char()))
                .collect();
            writeln!(out, "P\t{}\t{}\t*", path.name, steps.join(","))?;
        }
        Ok(())
    }

    pub fn to_gfa_file(&self, path: impl AsRef<FsPath>) -> Result<(), GraphError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.to_gfa(&mut out)
    }

    /// Parse a GFA stream. Lines may arrive in any order; segments are
    /// installed before links and paths.
    pub fn from_gfa<R: BufRead>(input: R) -> Result<Self, GraphError> {
        let mut lines = Vec::new();
        for line in input.lines() {
            let line = line?;
            if !line.is_empty() {
                lines.push(line);
            }
        }

        let mut graph = VariationGraph::new();
        for line in lines.iter().filter(|l| l.starts_with('S')) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(GraphError::Parse(format!("short S line: {}", line)));
            }
            let id = parse_id(fields[1])?;
            let seq = if fields[2] == "*" {
                Vec::new()
            } else {
                fields[2].as_bytes().to_vec()
            };
            graph.create_node_with_id(seq, id)?;
        }
        for line in lines.iter().filter(|l| l.starts_with('L')) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(GraphError::Parse(format!("short L line: {}", line)));
            }
            let from = parse_id(fields[1])?;
            let to = parse_id(fields[3])?;
            let from_side = match fields[2] {
                "+" => Side::end(from),
                "-" => Side::start(from),
                o => return Err(GraphError::Parse(format!("bad orientation {}", o))),
            };
            let to_side = match fields[4] {
                "+" => Side::start(to),
                "-" => Side::end(to),
                o => return Err(GraphError::Parse(format!("bad orientation {}", o))),
            };
            graph.create_edge(from_side, to_side)?;
        }
        for line in lines.iter().filter(|l| l.starts_with('P')) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(GraphError::Parse(format!("short P line: {}", line)));
            }
            let name = fields[1];
            for step in fields[2].split(',') {
                let step = step.trim();
                if step.is_empty() {
                    continue;
                }
                let (id_part, orient) = step.split_at(step.len() - 1);
                let backward = match orient {
                    "+" => false,
                    "-" => true,
                    o => return Err(GraphError::Parse(format!("bad step orientation {}", o))),
                };
                let id = parse_id(id_part)?;
                if !graph.has_node(id) {
                    return Err(GraphError::MissingNode(id));
                }
                graph.paths.append_step(name, Traversal::new(id, backward));
            }
        }
        Ok(graph)
    }

    pub fn from_gfa_file(path: impl AsRef<FsPath>) -> Result<Self, GraphError> {
        Self::from_gfa(BufReader::new(File::open(path)?))
    }
}

fn parse_id(field: &str) -> Result<NodeId, GraphError> {
    field
        .parse::<NodeId>()
        .map_err(|_| GraphError::Parse(format!("bad node id: {}", field)))
}
