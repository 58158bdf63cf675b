//! Reach - headless runner for the reaching experiment
//!
//! Builds the condition table, drives the trial controller from a synthetic
//! participant or a recorded pointer trace, and writes one CSV file per trial.

mod cli;
mod config;
mod participant;
mod session;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use proto::PointerTrace;
use reach_core::analysis::remove_outliers;
use reach_core::conditions::{load_conditions, repeat_and_shuffle, write_conditions};
use reach_core::{
    ConditionRow, CsvTrialWriter, ExperimentRng, MemorySink, RecordSink, TrialController,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::ExperimentFile;
use crate::participant::{ParticipantProfile, SyntheticParticipant};
use crate::session::{MovementLog, SessionReport};

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let file = ExperimentFile::load_or_default(cli.config.as_deref())
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;

    match &cli.command {
        Commands::Run {
            conditions,
            repetitions,
            compensation,
            record_trace,
            dry_run,
        } => {
            let profile = ParticipantProfile {
                compensation: *compensation,
                ..ParticipantProfile::default()
            };
            run_synthetic_session(
                &cli,
                &file,
                conditions.as_deref(),
                repetitions.unwrap_or(file.session.repetitions),
                profile,
                record_trace.as_deref(),
                *dry_run,
            )?;
        }
        Commands::Replay {
            trace,
            conditions,
            repetitions,
            dry_run,
        } => {
            run_replay(
                &cli,
                &file,
                trace,
                conditions.as_deref(),
                repetitions.unwrap_or(file.session.repetitions),
                *dry_run,
            )?;
        }
        Commands::Grid { output } => {
            write_grid(&file, output.as_deref())?;
        }
        Commands::ShowConfig => {
            print!("{}", file.to_toml()?);
        }
    }

    Ok(())
}

/// Raise the returned flag on Ctrl-C; checked between frames
fn install_stop_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, Ordering::SeqCst);
    })?;
    Ok(stop_flag)
}

fn resolve_seed(cli: &Cli, file: &ExperimentFile) -> u64 {
    cli.seed
        .or(file.session.seed)
        .unwrap_or_else(rand::random)
}

/// Load or generate the base conditions, then repeat and order them
fn build_table(
    file: &ExperimentFile,
    conditions: Option<&Path>,
    repetitions: usize,
    rng: &mut ExperimentRng,
) -> anyhow::Result<Vec<ConditionRow>> {
    let rows = match conditions.or(file.session.conditions.as_deref()) {
        Some(path) => load_conditions(path)
            .with_context(|| format!("Failed to load conditions from {:?}", path))?,
        None => file.grid().expand(),
    };
    let table = repeat_and_shuffle(&rows, repetitions, &file.session.order(), &mut rng.0)?;
    info!(
        conditions = rows.len(),
        repetitions,
        trials = table.len(),
        order = ?file.session.order(),
        "Condition table ready"
    );
    Ok(table)
}

/// Memory or CSV sink behind one trait object
fn with_sink<T>(
    data_dir: &Path,
    dry_run: bool,
    run: impl FnOnce(&mut dyn RecordSink) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if dry_run {
        let mut sink = MemorySink::new();
        run(&mut sink)
    } else {
        let mut sink = CsvTrialWriter::new(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
        info!("Writing trial records to {:?}", sink.data_dir());
        run(&mut sink)
    }
}

fn summarize(report: &SessionReport, log: &MovementLog<&mut dyn RecordSink>) {
    if report.stopped {
        warn!(
            finished_trials = report.scores.len(),
            "Session stopped; only finished trials were written"
        );
    } else if !report.completed {
        warn!(
            finished_trials = report.scores.len(),
            "Input ended before the experiment was complete"
        );
    }

    let split = remove_outliers(&log.movement_times);
    let mean_peak = if log.peak_speeds.is_empty() {
        0.0
    } else {
        log.peak_speeds.iter().sum::<f64>() / log.peak_speeds.len() as f64
    };
    info!(
        trials = report.scores.len(),
        total_score = report.total_score,
        frames = report.frames,
        outliers = split.removed.len(),
        mean_peak_speed = mean_peak,
        "Session finished"
    );
}

fn run_synthetic_session(
    cli: &Cli,
    file: &ExperimentFile,
    conditions: Option<&Path>,
    repetitions: usize,
    profile: ParticipantProfile,
    record_trace: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let seed = resolve_seed(cli, file);
    info!(seed, participant = %cli.participant, "Starting synthetic session");

    let mut rng = ExperimentRng::new(seed);
    let table = build_table(file, conditions, repetitions, &mut rng)?;
    let mut participant =
        SyntheticParticipant::new(profile, file.session.frame_rate, seed.wrapping_add(1));
    let stop = install_stop_flag()?;

    let trace = with_sink(&cli.data_dir, dry_run, |sink| {
        let mut controller = TrialController::new(
            file.experiment.clone(),
            table,
            cli.participant.clone(),
            MovementLog::new(sink),
            rng,
        )?;
        let (report, trace) = session::run_synthetic(&mut controller, &mut participant, &stop)?;
        summarize(&report, &controller.into_sink());
        Ok(trace)
    })?;

    if let Some(path) = record_trace {
        let bytes = trace
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Failed to encode trace: {e}"))?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write trace {:?}", path))?;
        info!(frames = trace.len(), "Saved pointer trace to {:?}", path);
    }
    Ok(())
}

fn run_replay(
    cli: &Cli,
    file: &ExperimentFile,
    trace_path: &Path,
    conditions: Option<&Path>,
    repetitions: usize,
    dry_run: bool,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(trace_path)
        .with_context(|| format!("Failed to read trace {:?}", trace_path))?;
    let trace = PointerTrace::from_bytes(&bytes)
        .map_err(|e| anyhow::anyhow!("Malformed trace {:?}: {e}", trace_path))?;
    info!(
        frames = trace.len(),
        presses = trace.presses(),
        duration_ms = trace.duration_ms(),
        "Loaded pointer trace"
    );

    // The same seed reproduces the recorded trial order
    let seed = resolve_seed(cli, file);
    let mut rng = ExperimentRng::new(seed);
    let table = build_table(file, conditions, repetitions, &mut rng)?;
    let stop = install_stop_flag()?;

    with_sink(&cli.data_dir, dry_run, |sink| {
        let mut controller = TrialController::new(
            file.experiment.clone(),
            table,
            cli.participant.clone(),
            MovementLog::new(sink),
            rng,
        )?;
        let report = session::replay(&mut controller, &trace, &stop)?;
        summarize(&report, &controller.into_sink());
        Ok(())
    })
}

fn write_grid(file: &ExperimentFile, output: Option<&Path>) -> anyhow::Result<()> {
    let rows = file.grid().expand();
    match output {
        Some(path) => {
            let out = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            write_conditions(&rows, out)?;
            info!(rows = rows.len(), "Wrote condition grid to {:?}", path);
        }
        None => write_conditions(&rows, std::io::stdout().lock())?,
    }
    Ok(())
}
