//! CLI argument parsing for the simulation harness.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Workload to generate when no input files are given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    /// Pattern rotates per transaction, like the original default test.
    Mixed,
    /// No conflicts at all.
    Disjoint,
    /// Even/odd neighbors conflict.
    Pairs,
    /// Two conflicting halves.
    Halves,
    /// Everyone writes the same hot set.
    Hot,
}

/// Puppetmaster transaction-scheduler simulation
#[derive(Parser, Debug, Clone)]
#[command(name = "puppetmaster")]
#[command(about = "Simulates the Puppetmaster transaction-scheduling pipeline")]
#[command(version)]
pub struct Cli {
    /// CSV test files; runs the built-in workload when none are given
    pub files: Vec<PathBuf>,

    /// JSON file with pipeline sizing parameters
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Built-in workload pattern
    #[arg(long, value_enum, default_value = "mixed")]
    pub workload: Workload,

    /// Number of generated transactions
    #[arg(long, default_value = "32")]
    pub count: u64,

    /// Shuffle submission order with this seed
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    /// Stop after this many cycles even if transactions remain
    #[arg(long, default_value = "10000000")]
    pub max_cycles: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["puppetmaster"]);
        assert!(cli.files.is_empty());
        assert!(cli.config.is_none());
        assert_eq!(cli.workload, Workload::Mixed);
        assert_eq!(cli.count, 32);
        assert_eq!(cli.shuffle_seed, None);
        assert_eq!(cli.max_cycles, 10_000_000);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_custom_values() {
        let cli = Cli::parse_from([
            "puppetmaster",
            "tests.csv",
            "more.csv",
            "--config",
            "params.json",
            "--workload",
            "hot",
            "--count",
            "8",
            "--shuffle-seed",
            "42",
            "--max-cycles",
            "5000",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.config, Some(PathBuf::from("params.json")));
        assert_eq!(cli.workload, Workload::Hot);
        assert_eq!(cli.count, 8);
        assert_eq!(cli.shuffle_seed, Some(42));
        assert_eq!(cli.max_cycles, 5000);
        assert_eq!(cli.log_level, "debug");
    }
}
