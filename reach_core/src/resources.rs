use glam::Vec2;

/// Input polled from the window collaborator once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub now: f64,         // Seconds on the caller's monotonic clock
    pub pointer: Vec2,    // Pointer position in pixels, y up
    pub button_down: bool, // Primary button currently held
}

impl FrameInput {
    pub fn new(now: f64, pointer: Vec2, button_down: bool) -> Self {
        Self {
            now,
            pointer,
            button_down,
        }
    }
}

/// Turns the polled button level into press edges
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonEdge {
    was_down: bool,
}

impl ButtonEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's level; true only on the frame the button goes down
    pub fn update(&mut self, down: bool) -> bool {
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

/// Score tracking across trials
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreBoard {
    pub trial: i32, // Score of the last finished trial
    pub total: i64, // Sum over all finished trials
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: i32) {
        self.trial = score;
        self.total += i64::from(score);
    }
}

/// Random number generator
pub struct ExperimentRng(pub rand::rngs::StdRng);

impl ExperimentRng {
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

impl Default for ExperimentRng {
    fn default() -> Self {
        Self::new(crate::params::Params::RNG_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edge_fires_once_per_press() {
        let mut edge = ButtonEdge::new();
        assert!(!edge.update(false));
        assert!(edge.update(true), "Press edge");
        assert!(!edge.update(true), "Held button is not a new press");
        assert!(!edge.update(false));
        assert!(edge.update(true), "Second press");
    }

    #[test]
    fn test_score_board_accumulates() {
        let mut score = ScoreBoard::new();
        score.record(100);
        score.record(37);
        assert_eq!(score.trial, 37);
        assert_eq!(score.total, 137);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        use rand::Rng;
        let mut a = ExperimentRng::new(7);
        let mut b = ExperimentRng::new(7);
        for _ in 0..10 {
            assert_eq!(a.0.gen::<u32>(), b.0.gen::<u32>());
        }
    }
}
