//! Puppetmaster simulation harness.
//!
//! Loads transactions from CSV test files (or generates a built-in
//! workload), feeds them through the scheduling pipeline respecting its
//! back-pressure, and prints the started/finished event stream.

mod cli;
mod error;
mod input;
mod workload;

use crate::cli::{Cli, Workload};
use crate::error::HarnessError;
use crate::workload::AccessPattern;
use puppet_core::{EnqueueError, Puppetmaster};
use puppet_types::{InputTransaction, SystemConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), HarnessError> {
    let config = load_config(cli)?;
    let mut transactions = load_workload(cli)?;
    if let Some(seed) = cli.shuffle_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        transactions.shuffle(&mut rng);
    }

    let total = transactions.len();
    info!(transactions = total, "submitting workload");

    let mut master = Puppetmaster::new(config)
        .map_err(|err| HarnessError::InvalidConfig(err.to_string()))?;
    let mut queue: VecDeque<InputTransaction> = transactions.into();

    while master.cycle() < cli.max_cycles {
        if let Some(txn) = queue.pop_front() {
            if let Err(EnqueueError::Backpressure(txn)) = master.try_enqueue(txn) {
                queue.push_front(txn);
            }
        }
        master.tick();
        while let Some(event) = master.try_next_event() {
            println!("{event}");
        }
        if queue.is_empty() && master.is_idle() {
            break;
        }
    }

    info!(
        finished = master.finished_count(),
        dropped = master.dropped(),
        cycles = master.cycle(),
        "simulation complete"
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SystemConfig, HarnessError> {
    let Some(path) = &cli.config else {
        return Ok(SystemConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|_| HarnessError::FileNotFound(path.clone()))?;
    let config: SystemConfig = serde_json::from_str(&text)
        .map_err(|err| HarnessError::InvalidConfig(err.to_string()))?;
    config
        .validate()
        .map_err(|err| HarnessError::InvalidConfig(err.to_string()))?;
    Ok(config)
}

fn load_workload(cli: &Cli) -> Result<Vec<InputTransaction>, HarnessError> {
    if cli.files.is_empty() {
        info!(workload = ?cli.workload, count = cli.count, "generating built-in tests");
        return Ok(match cli.workload {
            Workload::Mixed => workload::mixed(cli.count),
            Workload::Disjoint => workload::uniform(AccessPattern::Disjoint, cli.count),
            Workload::Pairs => workload::uniform(AccessPattern::EvenOddPairs, cli.count),
            Workload::Halves => workload::uniform(AccessPattern::ConflictingHalves, cli.count),
            Workload::Hot => workload::uniform(AccessPattern::SharedHotSet, cli.count),
        });
    }

    let mut transactions = Vec::new();
    for path in &cli.files {
        info!(path = %path.display(), "loading tests");
        let loaded = input::load_transactions(path, transactions.len() as u64)?;
        transactions.extend(loaded);
    }
    Ok(transactions)
}
