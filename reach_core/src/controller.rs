//! Trial controller
//!
//! Drives one trial at a time through its phases, frame by frame:
//!
//! 1. **AwaitingStart**: the cursor follows the pointer; a fresh click
//!    strictly inside the start zone begins the reach on the same frame.
//! 2. **Reaching**: every frame the pointer is (possibly) shifted, clouds age,
//!    and a sample is recorded. A fresh click beyond the end distance from the
//!    start scores the trial, hands the record to the sink and advances to the
//!    next condition.
//!
//! When the conditions run out the controller reports completion once and
//! then idles.

use std::sync::Arc;

use glam::Vec2;
use hecs::World;
use tracing::{debug, info, warn};

use crate::components::{Role, StartZone};
use crate::conditions::ConditionRow;
use crate::config::Config;
use crate::error::Result;
use crate::fsm::{Phase, PhaseEvent, PhaseMachine};
use crate::record::{RecordSink, Sample, TrialRecord};
use crate::resources::{ButtonEdge, ExperimentRng, FrameInput, ScoreBoard};
use crate::systems::{compute_end_score, stimulus_position, tick_clouds, track_pointer, ShiftRule};
use crate::{draw_list, spawn_trial, DrawItem};

/// Score of one finished trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSummary {
    pub trial: usize,
    pub score: i32,
    pub total_score: i64,
    pub frames: u32,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Waiting for a click inside the start zone
    Waiting,
    /// The reach began on this frame
    TrialStarted { trial: usize },
    /// A reaching frame was recorded
    Reaching { frame: u32 },
    /// The trial was scored and persisted; the next one is waiting
    TrialEnded(TrialSummary),
    /// No conditions left. Reported exactly once.
    ExperimentComplete {
        last_trial: Option<TrialSummary>,
        total_score: i64,
    },
    /// Nothing left to do
    Idle,
}

/// Per-trial protocol over a shared, read-only condition table
pub struct TrialController<S: RecordSink> {
    config: Config,
    conditions: Arc<[ConditionRow]>,
    participant: String,
    sink: S,
    rng: ExperimentRng,
    world: World,
    fsm: PhaseMachine,
    button: ButtonEdge,
    score: ScoreBoard,
    zone: StartZone,
    shift_rule: ShiftRule,
    trial: usize,
    frame_count: u32,
    shift_applied: bool,
    trial_started_at: f64,
    history: Vec<Sample>,
    finished: bool,
    completion_reported: bool,
}

impl<S: RecordSink> TrialController<S> {
    pub fn new(
        config: Config,
        conditions: impl Into<Arc<[ConditionRow]>>,
        participant: impl Into<String>,
        sink: S,
        rng: ExperimentRng,
    ) -> Result<Self> {
        config.validate()?;
        let conditions = conditions.into();
        for row in conditions.iter() {
            row.validate()?;
        }

        let mut controller = Self {
            config,
            conditions,
            participant: participant.into(),
            sink,
            rng,
            world: World::new(),
            fsm: PhaseMachine::new(),
            button: ButtonEdge::new(),
            score: ScoreBoard::new(),
            zone: StartZone::new(Vec2::ZERO, 0.0),
            shift_rule: ShiftRule::new(0.0, f32::INFINITY),
            trial: 0,
            frame_count: 0,
            shift_applied: false,
            trial_started_at: 0.0,
            history: Vec::new(),
            finished: false,
            completion_reported: false,
        };

        if controller.conditions.is_empty() {
            controller.finished = true;
        } else {
            controller.setup_trial()?;
        }
        Ok(controller)
    }

    /// Build the stimuli for the current condition and wait at the start
    fn setup_trial(&mut self) -> Result<()> {
        let row = &self.conditions[self.trial];
        // The old stimuli stay until the new ones exist
        let mut world = World::new();
        spawn_trial(&mut world, row, &self.config, &mut self.rng)?;
        self.world = world;

        self.zone = StartZone::new(row.start(), row.start_radius);
        self.shift_rule = ShiftRule::new(row.cursor_shift, row.shift_threshold);
        self.fsm.reset();
        self.frame_count = 0;
        self.shift_applied = false;
        self.history.clear();

        debug!(
            trial = self.trial,
            condition = row.index,
            cursor_dots = row.n_dots_cursor,
            target_dots = row.n_dots_target,
            shift = row.cursor_shift,
            "Trial set up"
        );
        Ok(())
    }

    /// Advance one frame
    pub fn tick(&mut self, input: &FrameInput) -> Result<TickOutcome> {
        if self.finished {
            if self.completion_reported {
                return Ok(TickOutcome::Idle);
            }
            self.completion_reported = true;
            info!(total_score = self.score.total, "Experiment complete");
            return Ok(TickOutcome::ExperimentComplete {
                last_trial: None,
                total_score: self.score.total,
            });
        }

        let pressed = self.button.update(input.button_down);
        let mut outcome = None;

        if self.fsm.phase() == Phase::AwaitingStart {
            track_pointer(&mut self.world, input.pointer, input.pointer);

            if !(pressed && self.zone.contains(input.pointer)) {
                return Ok(TickOutcome::Waiting);
            }

            let result = self.fsm.transition(PhaseEvent::StartClicked);
            debug!(from = ?result.from, to = ?result.to, "Phase transition");
            self.frame_count = 0;
            self.trial_started_at = input.now;
            self.history.clear();
            self.shift_applied = false;
            outcome = Some(TickOutcome::TrialStarted { trial: self.trial });
        }

        self.frame_count += 1;

        let (cursor, shifted) = self.shift_rule.apply(input.pointer);
        self.shift_applied |= shifted;
        track_pointer(&mut self.world, cursor, input.pointer);
        tick_clouds(&mut self.world, &mut self.rng);

        self.history.push(Sample {
            time: input.now - self.trial_started_at,
            frame: self.frame_count,
            cursor_x: cursor.x,
            cursor_y: cursor.y,
            shift_applied: self.shift_applied,
        });

        let end_distance = self.config.end_distance(self.zone.radius);
        if pressed && self.zone.distance(input.pointer) > end_distance {
            return self.finish_trial(cursor);
        }

        Ok(outcome.unwrap_or(TickOutcome::Reaching {
            frame: self.frame_count,
        }))
    }

    /// Score, persist, and move on to the next condition
    fn finish_trial(&mut self, cursor: Vec2) -> Result<TickOutcome> {
        let row = &self.conditions[self.trial];
        let target = stimulus_position(&self.world, Role::Target).unwrap_or_else(|| row.target());
        let score = compute_end_score(cursor, target, row.target_size(), self.config.score_slope);

        let record = TrialRecord {
            participant: self.participant.clone(),
            trial: self.trial,
            condition: row.clone(),
            score,
            samples: std::mem::take(&mut self.history),
        };
        if let Err(e) = self.sink.persist(&record) {
            warn!(trial = self.trial, error = %e, "Failed to persist trial");
            self.history = record.samples;
            return Err(e.into());
        }

        let result = self.fsm.transition(PhaseEvent::TargetClicked);
        debug!(from = ?result.from, to = ?result.to, "Phase transition");

        self.score.record(score);
        let summary = TrialSummary {
            trial: self.trial,
            score,
            total_score: self.score.total,
            frames: self.frame_count,
        };
        info!(
            trial = summary.trial,
            score = summary.score,
            total_score = summary.total_score,
            frames = summary.frames,
            "Trial finished"
        );

        self.trial += 1;
        if self.trial >= self.conditions.len() {
            self.finished = true;
            self.completion_reported = true;
            self.world.clear();
            info!(total_score = self.score.total, "Experiment complete");
            return Ok(TickOutcome::ExperimentComplete {
                last_trial: Some(summary),
                total_score: self.score.total,
            });
        }

        if let Err(e) = self.setup_trial() {
            // The next trial has no stimuli
            warn!(trial = self.trial, error = %e, "Failed to set up trial; ending session");
            self.finished = true;
            self.completion_reported = true;
            self.world.clear();
            return Err(e);
        }
        Ok(TickOutcome::TrialEnded(summary))
    }

    /// Shapes and dots to render for the current phase
    pub fn draw_list(&self) -> Vec<DrawItem> {
        if self.finished {
            return Vec::new();
        }
        draw_list(&self.world, self.fsm.phase())
    }

    pub fn phase(&self) -> Phase {
        self.fsm.phase()
    }

    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// Index of the current trial in the session order
    pub fn trial_index(&self) -> usize {
        self.trial
    }

    pub fn remaining_trials(&self) -> usize {
        self.conditions.len().saturating_sub(self.trial)
    }

    pub fn current_condition(&self) -> Option<&ConditionRow> {
        if self.finished {
            None
        } else {
            self.conditions.get(self.trial)
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn shift_applied(&self) -> bool {
        self.shift_applied
    }

    pub fn trial_score(&self) -> i32 {
        self.score.trial
    }

    pub fn total_score(&self) -> i64 {
        self.score.total
    }

    /// Samples of the reach in progress
    pub fn history(&self) -> &[Sample] {
        &self.history
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        stimulus_position(&self.world, Role::Cursor)
    }

    pub fn target_position(&self) -> Option<Vec2> {
        stimulus_position(&self.world, Role::Target)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
