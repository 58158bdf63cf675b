//! Feeding pointer frames into the trial controller

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use glam::Vec2;
use proto::{PointerFrame, PointerTrace};
use reach_core::analysis::trajectory_velocity;
use reach_core::{FrameInput, RecordError, RecordSink, TickOutcome, TrialController, TrialRecord};
use tracing::debug;

use crate::participant::SyntheticParticipant;

/// What a session produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub scores: Vec<i32>,
    pub total_score: i64,
    pub frames: usize,
    pub completed: bool,
    pub stopped: bool,
}

impl SessionReport {
    fn observe(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::TrialEnded(summary) => {
                self.scores.push(summary.score);
                self.total_score = summary.total_score;
            }
            TickOutcome::ExperimentComplete {
                last_trial,
                total_score,
            } => {
                if let Some(summary) = last_trial {
                    self.scores.push(summary.score);
                }
                self.total_score = total_score;
                self.completed = true;
            }
            TickOutcome::Waiting
            | TickOutcome::TrialStarted { .. }
            | TickOutcome::Reaching { .. }
            | TickOutcome::Idle => {}
        }
    }

    fn finished(&self) -> bool {
        self.completed || self.stopped
    }
}

/// Forwards records to a sink and keeps per-trial kinematics
pub struct MovementLog<S> {
    inner: S,
    pub movement_times: Vec<(usize, f64)>,
    pub peak_speeds: Vec<f64>,
}

impl<S> MovementLog<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            movement_times: Vec::new(),
            peak_speeds: Vec::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordSink> RecordSink for MovementLog<S> {
    fn persist(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        self.inner.persist(record)?;
        let peak = trajectory_velocity(&record.samples)
            .iter()
            .map(|row| row.speed)
            .fold(0.0, f64::max);
        debug!(trial = record.trial, peak_speed = peak, "Trial kinematics");
        self.movement_times.push((record.trial, record.movement_time()));
        self.peak_speeds.push(peak);
        Ok(())
    }
}

/// Tick the controller with each frame until the experiment completes, the
/// frames run out, or the stop flag is raised
pub fn feed<S, I>(
    controller: &mut TrialController<S>,
    frames: I,
    stop: &AtomicBool,
    report: &mut SessionReport,
) -> reach_core::Result<()>
where
    S: RecordSink,
    I: IntoIterator<Item = FrameInput>,
{
    for input in frames {
        if stop.load(Ordering::SeqCst) {
            report.stopped = true;
            break;
        }
        let outcome = controller.tick(&input)?;
        report.frames += 1;
        report.observe(outcome);
        if report.completed {
            break;
        }
    }
    Ok(())
}

/// Run every remaining trial with a synthetic participant. Returns the report
/// and the pointer stream that was fed in.
pub fn run_synthetic<S: RecordSink>(
    controller: &mut TrialController<S>,
    participant: &mut SyntheticParticipant,
    stop: &AtomicBool,
) -> anyhow::Result<(SessionReport, PointerTrace)> {
    let mut report = SessionReport::default();
    let mut trace = PointerTrace::new();

    while !report.finished() {
        let Some(row) = controller.current_condition().cloned() else {
            // Nothing left to run; collect the completion signal
            let input = FrameInput::new(0.0, Vec2::ZERO, false);
            feed(controller, [input], stop, &mut report)?;
            if !report.completed {
                bail!("Controller finished without reporting completion");
            }
            break;
        };

        let trial = controller.trial_index();
        let frames = participant.plan_trial(&row);
        for input in &frames {
            trace.push(to_pointer_frame(input));
        }
        feed(controller, frames, stop, &mut report)?;

        if !report.finished() && controller.trial_index() == trial {
            bail!(
                "Trial {} never ended: the target lies within the end distance of the start",
                trial
            );
        }
    }

    Ok((report, trace))
}

/// Replay a recorded pointer stream
pub fn replay<S: RecordSink>(
    controller: &mut TrialController<S>,
    trace: &PointerTrace,
    stop: &AtomicBool,
) -> reach_core::Result<SessionReport> {
    let mut report = SessionReport::default();
    feed(
        controller,
        trace.frames.iter().map(to_frame_input),
        stop,
        &mut report,
    )?;
    Ok(report)
}

pub fn to_pointer_frame(input: &FrameInput) -> PointerFrame {
    PointerFrame::new(
        (input.now * 1000.0).round() as u32,
        input.pointer.x,
        input.pointer.y,
        input.button_down,
    )
}

pub fn to_frame_input(frame: &PointerFrame) -> FrameInput {
    FrameInput::new(
        frame.seconds(),
        Vec2::new(frame.x, frame.y),
        frame.pressed,
    )
}
