//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Headless runner for the reaching experiment
#[derive(Parser, Debug)]
#[command(name = "reach")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Experiment config file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Participant id used in record file names
    #[arg(short, long, global = true, default_value = "0")]
    pub participant: String,

    /// Directory receiving one CSV file per trial
    #[arg(short, long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Seed for trial order and dot clouds (overrides the config file)
    #[arg(short, long, global = true)]
    pub seed: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a session with a synthetic participant
    Run {
        /// Condition table CSV (defaults to the configured grid)
        #[arg(long)]
        conditions: Option<PathBuf>,

        /// Repetitions of the condition table (overrides the config file)
        #[arg(short, long)]
        repetitions: Option<usize>,

        /// Fraction of the cursor shift the participant corrects for (0..=1)
        #[arg(long, default_value = "0.0")]
        compensation: f32,

        /// Save the generated pointer stream for later replay
        #[arg(long)]
        record_trace: Option<PathBuf>,

        /// Keep records in memory instead of writing CSV files
        #[arg(long)]
        dry_run: bool,
    },

    /// Replay a recorded pointer trace through the experiment
    Replay {
        /// Pointer trace file
        #[arg(short, long)]
        trace: PathBuf,

        /// Condition table CSV (defaults to the configured grid)
        #[arg(long)]
        conditions: Option<PathBuf>,

        /// Repetitions used when the trace was recorded
        #[arg(short, long)]
        repetitions: Option<usize>,

        /// Keep records in memory instead of writing CSV files
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the configured condition grid as CSV
    Grid {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_run_with_defaults() {
        let cli = Cli::try_parse_from(["reach", "run"]).unwrap();
        assert_eq!(cli.participant, "0");
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert!(cli.seed.is_none());
        match cli.command {
            Commands::Run {
                conditions,
                repetitions,
                compensation,
                record_trace,
                dry_run,
            } => {
                assert!(conditions.is_none());
                assert!(repetitions.is_none());
                assert_eq!(compensation, 0.0);
                assert!(record_trace.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reach",
            "replay",
            "--trace",
            "session.trace",
            "--participant",
            "17",
            "--seed",
            "99",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.participant, "17");
        assert_eq!(cli.seed, Some(99));
        match cli.command {
            Commands::Replay { trace, .. } => assert_eq!(trace, PathBuf::from("session.trace")),
            _ => panic!("Expected Replay command"),
        }
    }

    #[test]
    fn test_cli_replay_requires_trace() {
        assert!(Cli::try_parse_from(["reach", "replay"]).is_err());
    }
}
