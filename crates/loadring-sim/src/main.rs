//! `loadsim`: key distribution and churn simulations for the loadring
//! mappers.
//!
//! # Usage
//!
//! ```text
//! loadsim distribution --algo chbl --nodes 8 --keys 100000
//! loadsim distribution --algo maglev --zipf-s 1.1 --out maglev.csv
//! loadsim churn --algo jump --op add --count 1
//! loadsim -c loadsim.toml churn --algo ring --op remove
//! ```

mod config;
mod report;
mod workload;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use loadring_metrics::{ChurnReport, compute_int_stats};
use loadring_router::{Algorithm, Mapper, Router};
use tracing::{debug, info};

use config::SimConfig;
use report::RunParams;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "loadsim",
    version,
    about = "Simulate key placement across consistent-hashing mappers"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a key workload once and report per-node counts.
    Distribution {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Route a workload, change membership, route it again and report
    /// how many keys moved.
    Churn {
        #[command(flatten)]
        run: RunArgs,

        /// Membership change to apply between the two passes.
        #[arg(long, value_enum)]
        op: ChurnOp,

        /// Number of nodes to add or remove.
        #[arg(long, default_value = "1")]
        count: usize,
    },
}

/// Flags shared by every simulation. Unset flags fall back to the config
/// file, then to built-in defaults.
#[derive(Args)]
struct RunArgs {
    /// Mapping algorithm: ring, jump, maglev or chbl.
    #[arg(short, long, default_value = "jump")]
    algo: Algorithm,

    /// Number of nodes.
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Number of keys to route.
    #[arg(short, long)]
    keys: Option<usize>,

    /// Zipf skew parameter `s` (0 = uniform).
    #[arg(long)]
    zipf_s: Option<f64>,

    /// Maglev table size (must be prime).
    #[arg(long)]
    table_size: Option<usize>,

    /// CH-BL load factor `c` (>= 1.0).
    #[arg(long)]
    load_factor: Option<f64>,

    /// Virtual nodes per physical node (ring, chbl).
    #[arg(long)]
    vnodes: Option<usize>,

    /// CH-BL walk steps before the two-choice fallback.
    #[arg(long)]
    walk_threshold: Option<usize>,

    /// Workload and hash seed. Defaults to the current time.
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path (default: stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChurnOp {
    Add,
    Remove,
}

impl ChurnOp {
    fn as_str(self) -> &'static str {
        match self {
            ChurnOp::Add => "add",
            ChurnOp::Remove => "remove",
        }
    }
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SimConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Distribution { run } => cmd_distribution(config, run),
        Commands::Churn { run, op, count } => cmd_churn(config, run, op, count),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr so the CSV on stdout stays clean.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Merge CLI flags over the config file and validate the result.
fn resolve(mut config: SimConfig, run: &RunArgs) -> Result<RunParams> {
    // CLI args override config file values.
    if let Some(n) = run.nodes {
        config.workload.nodes = n;
    }
    if let Some(k) = run.keys {
        config.workload.keys = k;
    }
    if let Some(s) = run.zipf_s {
        config.workload.zipf_s = s;
    }
    if let Some(m) = run.table_size {
        config.router.table_size = m;
    }
    if let Some(c) = run.load_factor {
        config.router.load_factor = c;
    }
    if let Some(v) = run.vnodes {
        config.router.vnodes = v;
    }
    if let Some(w) = run.walk_threshold {
        config.router.walk_threshold = w;
    }
    if let Some(s) = run.seed {
        config.workload.seed = Some(s);
    }

    let workload = &config.workload;
    if workload.nodes == 0 {
        bail!("nodes must be > 0");
    }
    if workload.keys == 0 {
        bail!("keys must be > 0");
    }
    if !workload.zipf_s.is_finite() {
        bail!("zipf-s must be a finite number");
    }

    let seed = workload.seed.unwrap_or_else(clock_seed);
    let mut options = config.router;
    options.hash_seed = seed;
    // Every key is routed once per pass, so the pass size is the expected
    // CH-BL volume unless the config pins it.
    if options.expected_keys == 0 {
        options.expected_keys = workload.keys;
    }

    Ok(RunParams {
        algo: run.algo,
        nodes: workload.nodes,
        keys: workload.keys,
        zipf_s: workload.zipf_s,
        options,
        seed,
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("failed to create {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Route every key once; returns the chosen node per key.
fn route_all(router: &Router, keys: &[String]) -> Result<Vec<String>> {
    keys.iter()
        .map(|k| {
            router
                .pick(k.as_bytes())
                .with_context(|| format!("failed to route {k}"))
        })
        .collect()
}

/// Per-node counts in `nodes` order.
fn count_per_node(nodes: &[String], assignments: &[String]) -> Vec<usize> {
    let mut counts = vec![0usize; nodes.len()];
    for a in assignments {
        if let Some(i) = nodes.iter().position(|n| n == a) {
            counts[i] += 1;
        }
    }
    counts
}

// -----------------------------------------------------------------------
// loadsim distribution
// -----------------------------------------------------------------------

fn cmd_distribution(config: SimConfig, run: RunArgs) -> Result<()> {
    let params = resolve(config, &run)?;
    let nodes = workload::node_names(0, params.nodes);
    let router =
        Router::new(params.algo, &params.options, &nodes).context("failed to build mapper")?;
    debug!(algo = %params.algo, nodes = params.nodes, "mapper ready");

    let keys = workload::generate_keys(params.keys, params.zipf_s, params.seed);
    let assignments = route_all(&router, &keys)?;
    let counts = count_per_node(&nodes, &assignments);
    let stats = compute_int_stats(&counts);

    let mut out = open_output(run.out.as_ref())?;
    report::write_distribution(&mut out, &params, &nodes, &counts, &stats)
        .context("failed to write report")?;

    info!(
        algo = %params.algo,
        nodes = params.nodes,
        keys = params.keys,
        zipf_s = params.zipf_s,
        mean = format_args!("{:.2}", stats.mean),
        max = stats.max,
        cv = format_args!("{:.4}", stats.cv),
        "distribution done"
    );
    Ok(())
}

// -----------------------------------------------------------------------
// loadsim churn
// -----------------------------------------------------------------------

fn cmd_churn(config: SimConfig, run: RunArgs, op: ChurnOp, count: usize) -> Result<()> {
    let params = resolve(config, &run)?;
    if count == 0 {
        bail!("count must be > 0");
    }
    if matches!(op, ChurnOp::Remove) && count >= params.nodes {
        bail!(
            "cannot remove {count} of {} nodes; at least one must remain",
            params.nodes
        );
    }

    let nodes = workload::node_names(0, params.nodes);
    let router =
        Router::new(params.algo, &params.options, &nodes).context("failed to build mapper")?;
    let keys = workload::generate_keys(params.keys, params.zipf_s, params.seed);

    let before = route_all(&router, &keys)?;

    // Rows cover the larger of the two node sets.
    let (all_nodes, nodes_after) = match op {
        ChurnOp::Add => {
            let added = workload::node_names(params.nodes, count);
            let added_refs: Vec<&str> = added.iter().map(String::as_str).collect();
            router.add(&added_refs);
            (workload::node_names(0, params.nodes + count), params.nodes + count)
        }
        ChurnOp::Remove => {
            let removed = workload::node_names(params.nodes - count, count);
            let removed_refs: Vec<&str> = removed.iter().map(String::as_str).collect();
            router.remove(&removed_refs);
            (nodes, params.nodes - count)
        }
    };
    debug!(op = op.as_str(), nodes_after, "membership changed");

    // CH-BL loads were reset by the rebuild, so the second pass starts
    // from an empty ring just like the first.
    let after = route_all(&router, &keys)?;
    let churn = ChurnReport::compute(&all_nodes, &before, &after);

    let mut out = open_output(run.out.as_ref())?;
    report::write_churn(&mut out, &params, op.as_str(), nodes_after, &churn)
        .context("failed to write report")?;

    info!(
        algo = %params.algo,
        op = op.as_str(),
        nodes_before = params.nodes,
        nodes_after,
        moved = churn.moved,
        moved_ratio = format_args!("{:.4}", churn.moved_ratio),
        "churn done"
    );
    Ok(())
}
