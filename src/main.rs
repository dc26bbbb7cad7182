//! `quorum-gossip`: builds a small-world network, has node 0 propose a
//! batch of records, runs the gossip to quiescence and reports what every
//! node ended up holding.

use std::time::Duration;

use anyhow::bail;
use clap::{Parser, ValueEnum};
use gossip::{common::DEFAULT_QUORUM_THRESHOLD, Network, NodeConfig, TieBreak, Topology};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Round-robin draining on one thread, deterministic.
    Sequential,
    /// One task per node.
    Concurrent,
}

#[derive(Parser, Debug)]
#[command(name = "quorum-gossip", version, about = "Signature-quorum gossip simulation")]
struct Args {
    #[arg(long, short = 'n', env = "GOSSIP_NODES", default_value_t = 10)]
    nodes: usize,

    /// Records proposed by node 0 before processing starts.
    #[arg(long, env = "GOSSIP_PROPOSALS", default_value_t = 30)]
    proposals: usize,

    /// Ring-lattice degree of the small-world topology.
    #[arg(long, env = "GOSSIP_DEGREE", default_value_t = 2)]
    degree: usize,

    /// Probability of rewiring each lattice edge.
    #[arg(long, env = "GOSSIP_REWIRE", default_value_t = 0.1)]
    rewire: f64,

    /// Seed for the topology generator.
    #[arg(long, env = "GOSSIP_SEED")]
    seed: Option<u64>,

    #[arg(long, value_enum, env = "GOSSIP_MODE", default_value_t = Mode::Sequential)]
    mode: Mode,

    /// strict | merge
    #[arg(long, env = "GOSSIP_TIE_BREAK", default_value_t = TieBreak::Strict)]
    tie_break: TieBreak,

    #[arg(long, env = "GOSSIP_MAX_HOPS")]
    max_hops: Option<u32>,

    /// Upper bound of the random per-message delay in concurrent mode.
    #[arg(long, env = "GOSSIP_DELAY_MS", default_value_t = 0)]
    delay_ms: u64,

    /// Signer count reported as quorum.
    #[arg(long, env = "GOSSIP_QUORUM", default_value_t = DEFAULT_QUORUM_THRESHOLD)]
    quorum: usize,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let topology = Topology::watts_strogatz(args.nodes, args.degree, args.rewire, &mut rng)?;
    for (i, neighbors) in topology.adjacency().iter().enumerate() {
        tracing::debug!("node {} connected to {:?}", i, neighbors);
    }

    let config = NodeConfig {
        tie_break: args.tie_break,
        max_hops: args.max_hops,
        processing_delay: (args.delay_ms > 0).then(|| Duration::from_millis(args.delay_ms)),
        quorum_threshold: args.quorum,
        ..NodeConfig::default()
    };
    let mut network = Network::new(topology, config);

    let mut keys = Vec::with_capacity(args.proposals);
    for i in 0..args.proposals {
        keys.push(network.propose(0, format!("tx-{i}").into_bytes())?);
    }
    tracing::info!(
        nodes = network.len(),
        proposals = keys.len(),
        mode = ?args.mode,
        tie_break = %args.tie_break,
        "starting propagation"
    );

    match args.mode {
        Mode::Sequential => {
            network.run_sequential();
        }
        Mode::Concurrent => network.run_concurrent().await?,
    }

    for node in network.nodes() {
        let scores: Vec<usize> = keys.iter().map(|k| node.store().score(k)).collect();
        let at_quorum = keys.iter().filter(|k| node.has_quorum(k)).count();
        let stats = node.stats();
        tracing::info!(
            node = %node.label(),
            id = %node.id(),
            neighbors = node.neighbors().len(),
            records = node.store().len(),
            at_quorum,
            min_score = scores.iter().min().copied().unwrap_or(0),
            max_score = scores.iter().max().copied().unwrap_or(0),
            received = stats.received,
            accepted = stats.accepted,
            rejected = stats.rejected,
            sent = stats.sent,
            "storage"
        );
    }

    let converged = keys.iter().filter(|k| network.converged_on(k)).count();
    let unanimous = keys.iter().filter(|k| network.unanimous_on(k)).count();
    tracing::info!(converged, unanimous, total = keys.len(), "propagation finished");

    if network.topology().is_connected() && args.max_hops.is_none() && converged < keys.len() {
        bail!("{} of {} records did not reach every node", keys.len() - converged, keys.len());
    }
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
