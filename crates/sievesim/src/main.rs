//! sievesim - replay a skewed read-through workload against LRU and SIEVE

mod config;
mod sim;
mod workload;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use sievecache::EvictionPolicy;
use tracing::info;

use crate::config::{Overrides, SimConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    Lru,
    Sieve,
    Both,
}

impl PolicyChoice {
    fn policies(self) -> Vec<EvictionPolicy> {
        match self {
            PolicyChoice::Lru => vec![EvictionPolicy::LeastRecentlyUsed],
            PolicyChoice::Sieve => vec![EvictionPolicy::Sieve],
            PolicyChoice::Both => vec![EvictionPolicy::LeastRecentlyUsed, EvictionPolicy::Sieve],
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (command-line flags override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache capacity (number of items)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Eviction policy to run; defaults to the config file's, or both
    #[arg(short, long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Entry time-to-live in milliseconds
    #[arg(long)]
    ttl_ms: Option<u64>,

    /// Number of distinct keys
    #[arg(short, long)]
    keys: Option<u64>,

    /// Total number of requests
    #[arg(short = 'n', long)]
    ops: Option<usize>,

    /// Zipf exponent (0.0 = uniform)
    #[arg(long)]
    skew: Option<f64>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads sharing one cache
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            capacity: self.capacity,
            ttl_ms: self.ttl_ms,
            keys: self.keys,
            ops: self.ops,
            skew: self.skew,
            seed: self.seed,
            threads: self.threads,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            SimConfig::load(path)?
        }
        None => SimConfig::default(),
    };
    config.apply(&args.overrides());
    config.validate()?;

    let policies = match (args.policy, &args.config) {
        (Some(choice), _) => choice.policies(),
        (None, Some(_)) => vec![config.cache.policy],
        (None, None) => PolicyChoice::Both.policies(),
    };

    info!("sievesim v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", config.cache.capacity);
    info!(
        "Workload: {} ops over {} keys, skew {}, {} thread(s)",
        config.workload.ops, config.workload.keys, config.workload.skew, config.workload.threads
    );

    let mut reports = Vec::with_capacity(policies.len());
    for policy in policies {
        let mut cache = config.cache;
        cache.policy = policy;
        reports.push(sim::run(&cache, &config.workload)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", sim::render_table(&reports));
    }

    Ok(())
}
