use clap::{Args, Parser, Subcommand, ValueEnum};
use proxgraph_core::config;
use proxgraph_core::graph::DistanceMetric;
use proxgraph_core::report::{load_ground_truth, SearchLog};
use proxgraph_core::search::{ground_truth, recall};
use proxgraph_core::storage::{load_snapshot, save_snapshot};
use proxgraph_core::{
    Dataset, GraphConfig, GraphIndex, HybridConfig, HybridIndex, LshConfig, Neighbor,
    NnDescentBuilder, SearchOutcome,
};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proxgraph", about = "Proximity-graph ANN benchmark driver")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a k-NN graph with NN-Descent and write it as an edge file
    Build(BuildArgs),
    /// Load and refine a graph, then run a graph search for every query
    Search(SearchArgs),
    /// LSH-seeded search over a refined graph
    Hybrid(HybridArgs),
    /// Exact k-NN by linear scan (ground truth)
    Scan(ScanArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Dataset CSV, one vector per line
    #[arg(long)]
    data: PathBuf,

    /// Load at most this many vectors (0 = all)
    #[arg(short = 'n', long, default_value_t = 0)]
    n: usize,

    /// Distance metric: l2, sqeuclidean, cosine or dot
    #[arg(long, default_value = "l2", value_parser = parse_metric)]
    metric: DistanceMetric,
}

#[derive(Args)]
struct QueryArgs {
    /// Query CSV, one vector per line
    #[arg(long)]
    queries: PathBuf,

    /// Load at most this many queries (0 = all)
    #[arg(long, default_value_t = 0)]
    n_query: usize,

    /// Results per query
    #[arg(short, long, default_value_t = config::DEFAULT_K)]
    k: usize,

    /// Result file written by `scan`, used to compute recall
    #[arg(long)]
    ground_truth: Option<PathBuf>,

    /// Per-query log CSV
    #[arg(long, default_value = "log.csv")]
    log: PathBuf,

    /// Per-result CSV
    #[arg(long, default_value = "result.csv")]
    result: PathBuf,
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Neighbors per node
    #[arg(long, default_value_t = config::DEFAULT_DEGREE)]
    degree: usize,

    /// RNG seed for the random initialization
    #[arg(long, default_value_t = config::DEFAULT_BUILD_SEED)]
    seed: u64,

    /// Stop after this many rounds even if not converged
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Output edge file (`*.csv`) or shard directory
    #[arg(long)]
    out: PathBuf,

    /// Also refine the graph and write a binary snapshot here
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Beam,
    List,
    TolerantBeam,
    TolerantList,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    query: QueryArgs,

    /// Edge file or shard directory (or a snapshot with --from-snapshot)
    #[arg(long)]
    graph: PathBuf,

    /// Treat --graph as a binary snapshot of an already refined graph
    #[arg(long, default_value_t = false)]
    from_snapshot: bool,

    /// Construction degree; max degree is twice this
    #[arg(long, default_value_t = config::DEFAULT_DEGREE)]
    degree: usize,

    /// Import every edge of the file instead of the first `degree` per node
    #[arg(long, default_value_t = false)]
    unbounded: bool,

    #[arg(long, value_enum, default_value_t = Strategy::Beam)]
    strategy: Strategy,

    /// Beam width
    #[arg(long, default_value_t = config::DEFAULT_EF)]
    ef: usize,

    /// List size
    #[arg(short, long, default_value_t = config::DEFAULT_LIST_SIZE)]
    l: usize,

    /// Patience of the tolerant strategies
    #[arg(long, default_value_t = config::DEFAULT_TOLERANCE)]
    tol: usize,

    /// Random start ids drawn per query
    #[arg(long, default_value_t = config::DEFAULT_START_IDS)]
    n_start: usize,

    /// RNG seed for start id sampling
    #[arg(long, default_value_t = config::DEFAULT_BUILD_SEED)]
    seed: u64,
}

#[derive(Args)]
struct HybridArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    query: QueryArgs,

    /// Edge file or shard directory of the companion graph
    #[arg(long)]
    graph: PathBuf,

    #[arg(long, default_value_t = config::DEFAULT_DEGREE)]
    degree: usize,

    #[arg(long, default_value_t = false)]
    unbounded: bool,

    /// Hash functions per table
    #[arg(short, long, default_value_t = config::LSH_DEFAULT_HASHES)]
    m: usize,

    /// Quantization width
    #[arg(short, long, default_value_t = config::LSH_DEFAULT_WIDTH)]
    w: f32,

    /// Number of tables (one search per table)
    #[arg(long, default_value_t = config::LSH_DEFAULT_TABLES)]
    tables: usize,

    #[arg(long, default_value_t = config::LSH_DEFAULT_SEED)]
    lsh_seed: u64,

    #[arg(long, default_value_t = config::DEFAULT_EF)]
    ef: usize,

    /// Bucket members evaluated before picking the seed
    #[arg(long, default_value_t = config::DEFAULT_START_IDS)]
    n_start: usize,

    /// Query the routing table only instead of all tables in parallel
    #[arg(long, default_value_t = false)]
    single: bool,
}

#[derive(Args)]
struct ScanArgs {
    #[command(flatten)]
    data: DataArgs,

    #[command(flatten)]
    query: QueryArgs,
}

fn parse_metric(name: &str) -> Result<DistanceMetric, String> {
    DistanceMetric::from_name(name).ok_or_else(|| format!("unknown metric '{name}'"))
}

fn limit(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}

fn load_dataset(args: &DataArgs) -> proxgraph_core::Result<Arc<Dataset>> {
    Ok(Arc::new(Dataset::load_csv(&args.data, limit(args.n))?))
}

fn load_queries(args: &QueryArgs) -> proxgraph_core::Result<Dataset> {
    Dataset::load_csv(&args.queries, limit(args.n_query))
}

fn load_truth(path: Option<&Path>) -> proxgraph_core::Result<Option<Vec<Vec<Neighbor>>>> {
    path.map(load_ground_truth).transpose()
}

fn query_recall(
    truth: Option<&Vec<Vec<Neighbor>>>,
    qid: usize,
    result: &[Neighbor],
    k: usize,
) -> f64 {
    truth
        .and_then(|t| t.get(qid))
        .map_or(0.0, |expected| recall(result, expected, k))
}

fn graph_config(degree: usize, metric: DistanceMetric, unbounded: bool) -> GraphConfig {
    let cfg = GraphConfig::new(degree).with_metric(metric);
    if unbounded {
        cfg.unbounded_import()
    } else {
        cfg
    }
}

fn run_build(args: BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(&args.data)?;
    let cfg = GraphConfig::new(args.degree).with_metric(args.data.metric);
    let mut builder = NnDescentBuilder::new(cfg);
    if let Some(rounds) = args.max_rounds {
        builder = builder.with_max_rounds(rounds);
    }
    let (mut graph, stats) = builder.build(dataset, &mut StdRng::seed_from_u64(args.seed))?;
    if !stats.converged {
        tracing::warn!("Graph written without converging ({} rounds)", stats.rounds);
    }
    graph.save_edges(&args.out)?;

    if let Some(path) = args.snapshot {
        graph.refine();
        save_snapshot(&graph, &path)?;
    }
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(&args.data)?;
    let queries = load_queries(&args.query)?;
    let truth = load_truth(args.query.ground_truth.as_deref())?;

    let graph = if args.from_snapshot {
        load_snapshot(&args.graph, dataset)?
    } else {
        let cfg = graph_config(args.degree, args.data.metric, args.unbounded);
        let (mut graph, report) = GraphIndex::load_edges(dataset, cfg, &args.graph)?;
        if report.rejected() > 0 {
            tracing::warn!("{} malformed edge rows skipped", report.rejected());
        }
        graph.refine();
        graph
    };

    let k = args.query.k;
    let n_start = args.n_start.min(graph.len());
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut log = SearchLog::new();
    let start = Instant::now();

    for (qid, query) in queries.iter() {
        let start_ids: Vec<u32> = index::sample(&mut rng, graph.len(), n_start)
            .into_iter()
            .map(|i| i as u32)
            .collect();
        let outcome: SearchOutcome = match args.strategy {
            Strategy::Beam => graph.beam_search(query, k, args.ef, &start_ids, n_start),
            Strategy::List => graph.list_search(query, k, &start_ids, args.l),
            Strategy::TolerantBeam => {
                graph.tolerant_beam_search(query, k, args.ef, &start_ids, n_start, args.tol)
            }
            Strategy::TolerantList => {
                graph.tolerant_list_search(query, k, &start_ids, args.l, args.tol)
            }
        };
        let r = query_recall(truth.as_ref(), qid as usize, &outcome.neighbors, k);
        log.push_search(&outcome, r);
    }

    let elapsed = start.elapsed();
    tracing::info!(
        "{} queries in {:?} ({:.0} QPS), mean recall {:.4}",
        log.len(),
        elapsed,
        log.len() as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        log.mean_recall()
    );
    log.save(&args.query.log, &args.query.result)?;
    Ok(())
}

fn run_hybrid(args: HybridArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(&args.data)?;
    let queries = load_queries(&args.query)?;
    let truth = load_truth(args.query.ground_truth.as_deref())?;

    let lsh = LshConfig::default()
        .with_hashes(args.m)
        .with_width(args.w)
        .with_tables(args.tables)
        .with_seed(args.lsh_seed);
    let cfg = HybridConfig::default()
        .with_lsh(lsh)
        .with_ef(args.ef)
        .with_n_start(args.n_start);
    let graph_cfg = graph_config(args.degree, args.data.metric, args.unbounded);
    let (hybrid, report) = HybridIndex::build(dataset, &args.graph, graph_cfg, cfg)?;
    if report.rejected() > 0 {
        tracing::warn!("{} malformed edge rows skipped", report.rejected());
    }

    let k = args.query.k;
    let mut log = SearchLog::new();
    let start = Instant::now();
    for (qid, query) in queries.iter() {
        let outcome = if args.single {
            hybrid.search(query, k)
        } else {
            hybrid.search_parallel(query, k)
        };
        let r = query_recall(truth.as_ref(), qid as usize, &outcome.neighbors, k);
        log.push_hybrid(&outcome, r);
    }

    let elapsed = start.elapsed();
    tracing::info!(
        "{} hybrid queries in {:?}, mean recall {:.4}",
        log.len(),
        elapsed,
        log.mean_recall()
    );
    log.save(&args.query.log, &args.query.result)?;
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load_dataset(&args.data)?;
    let queries = load_queries(&args.query)?;
    let outcomes = ground_truth(&dataset, args.data.metric, &queries, args.query.k);

    let mut log = SearchLog::new();
    for outcome in &outcomes {
        log.push_search(outcome, 1.0);
    }
    log.save(&args.query.log, &args.query.result)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env()
        .add_directive("proxgraph=info".parse()?)
        .add_directive("proxgraph_core=info".parse()?);
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Build(args) => run_build(args),
        Command::Search(args) => run_search(args),
        Command::Hybrid(args) => run_hybrid(args),
        Command::Scan(args) => run_scan(args),
    }
}
