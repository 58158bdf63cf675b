//! Scripted stand-in for a human participant
//!
//! Produces the pointer stream of one trial: settle on the start, click,
//! reach along a minimum-jerk path to the target, click again.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use reach_core::{ConditionRow, FrameInput};

/// Frames spent on the start before clicking
const DWELL_FRAMES: u32 = 6;

/// Knobs of the synthetic reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipantProfile {
    /// Fraction of the cursor shift corrected for by aiming the other way
    pub compensation: f32,
    /// Endpoint scatter, pixels (per axis)
    pub endpoint_noise: f32,
    /// Duration of the reach, seconds
    pub movement_time: f32,
}

impl Default for ParticipantProfile {
    fn default() -> Self {
        Self {
            compensation: 0.0,
            endpoint_noise: 4.0,
            movement_time: 0.6,
        }
    }
}

pub struct SyntheticParticipant {
    profile: ParticipantProfile,
    frame_time: f64,
    clock: f64,
    rng: StdRng,
}

impl SyntheticParticipant {
    pub fn new(profile: ParticipantProfile, frame_rate: f32, seed: u64) -> Self {
        Self {
            profile,
            frame_time: 1.0 / f64::from(frame_rate),
            clock: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn frame(&mut self, pointer: Vec2, button_down: bool) -> FrameInput {
        let input = FrameInput::new(self.clock, pointer, button_down);
        self.clock += self.frame_time;
        input
    }

    /// Where the raw pointer is aimed so the (possibly shifted) cursor lands
    /// near the target
    pub fn aim_point(&self, row: &ConditionRow) -> Vec2 {
        let mut aim = row.target();
        if aim.y > row.shift_threshold {
            aim.x -= self.profile.compensation * row.cursor_shift;
        }
        aim
    }

    /// Every frame of one trial, ending with the button released
    pub fn plan_trial(&mut self, row: &ConditionRow) -> Vec<FrameInput> {
        let start = row.start();
        let noise = Vec2::new(
            self.rng.sample::<f32, _>(StandardNormal),
            self.rng.sample::<f32, _>(StandardNormal),
        ) * self.profile.endpoint_noise;
        let end = self.aim_point(row) + noise;

        let mut frames = Vec::new();
        for _ in 0..DWELL_FRAMES {
            frames.push(self.frame(start, false));
        }
        frames.push(self.frame(start, true));

        let steps = (self.profile.movement_time as f64 / self.frame_time).ceil().max(1.0) as u32;
        for step in 1..=steps {
            let tau = step as f32 / steps as f32;
            let pointer = start.lerp(end, minimum_jerk(tau));
            frames.push(self.frame(pointer, false));
        }
        frames.push(self.frame(end, true));
        frames.push(self.frame(end, false));
        frames
    }
}

/// Normalised position along a minimum-jerk reach at normalised time `tau`
pub fn minimum_jerk(tau: f32) -> f32 {
    let t = tau.clamp(0.0, 1.0);
    t * t * t * (10.0 - 15.0 * t + 6.0 * t * t)
}
