use std::io::Write;

use clap::Parser;

use vargraph::VariationGraph;

#[derive(Parser)]
#[command(
    name = "vargraph",
    version,
    about = "Bidirected sequence graph toolkit: normalize, prune, and extract k-mers"
)]
struct Args {
    /// Input GFA file
    #[arg(short, long)]
    input: String,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Number of worker threads (0 = all available)
    #[arg(short, long, default_value = "0")]
    threads: usize,

    /// Topologically sort and orient all nodes forward
    #[arg(long)]
    sort: bool,

    /// Collapse simple linear components
    #[arg(long)]
    unchop: bool,

    /// Full normalization: sibling simplification plus unchop
    #[arg(long)]
    normalize: bool,

    /// Renumber node ids 1..N in sorted order
    #[arg(long)]
    compact_ids: bool,

    /// Prune regions where walks of this many bp would cross too many edges
    #[arg(long)]
    prune_length: Option<i64>,

    /// Edge crossing bound used with --prune-length
    #[arg(long, default_value = "3")]
    prune_edge_max: i64,

    /// Emit k-mers of this size as TSV instead of GFA
    #[arg(short = 'k', long)]
    kmers: Option<usize>,

    /// Edge crossing bound for k-mer walks (0 = unbounded)
    #[arg(long, default_value = "0")]
    edge_max: i64,

    /// Stride between k-mer windows
    #[arg(long, default_value = "1")]
    stride: usize,

    /// Emit doubled-strand GCSA records with head/tail padding
    #[arg(long)]
    gcsa: bool,

    /// Restrict GCSA records to the forward strand
    #[arg(long)]
    forward_only: bool,

    /// Check graph invariants after processing; exit nonzero on failure
    #[arg(long)]
    validate: bool,

    /// Verbose progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .ok();
    }

    let mut graph = VariationGraph::from_gfa_file(&args.input)?;
    if args.verbose {
        eprintln!(
            "[vargraph] loaded {} nodes, {} edges, {} paths",
            graph.node_count(),
            graph.edge_count(),
            graph.paths.len()
        );
    }

    if args.normalize {
        graph.normalize(args.verbose);
    } else if args.unchop {
        graph.unchop(args.verbose);
    }
    if let Some(length) = args.prune_length {
        graph.prune_complex_with_head_tail(length, args.prune_edge_max)?;
        if args.verbose {
            eprintln!("[vargraph] pruned to {} nodes", graph.node_count());
        }
    }
    if args.sort {
        let flipped = graph.orient_nodes_forward();
        if args.verbose {
            eprintln!("[vargraph] flipped {} node(s)", flipped.len());
        }
    }
    if args.compact_ids {
        graph.compact_ids();
    }

    if args.validate && !graph.is_valid() {
        eprintln!("[vargraph] graph failed validation");
        std::process::exit(1);
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::BufWriter::new(std::io::stdout())),
    };

    match args.kmers {
        Some(k) => {
            let records = if args.gcsa {
                let mut head = 0;
                let mut tail = 0;
                let records = graph.gcsa_kmer_positions(
                    k,
                    args.edge_max,
                    args.stride,
                    args.forward_only,
                    &mut head,
                    &mut tail,
                )?;
                if args.verbose {
                    eprintln!("[vargraph] head marker {}, tail marker {}", head, tail);
                }
                records
            } else {
                graph.kmer_positions(k, args.edge_max, args.stride)
            };
            for rec in records {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}",
                    rec.kmer,
                    rec.pos,
                    rec.prev_chars.iter().collect::<String>(),
                    rec.next_chars.iter().collect::<String>(),
                    rec.next_positions.iter().cloned().collect::<Vec<_>>().join(","),
                )?;
            }
        }
        None => {
            graph.to_gfa(&mut out)?;
        }
    }
    Ok(())
}
