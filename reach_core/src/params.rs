/// Experiment tuning parameters
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    // Dot clouds
    pub const DOT_LIFESPAN: u32 = 5; // frames (~83 ms at 60 Hz)
    pub const SPAWN_CORRELATION: f32 = 0.0;

    // Trial protocol
    pub const END_DISTANCE_FACTOR: f32 = 2.0; // x start radius
    pub const PRECURSOR_RADIUS: f32 = 5.0;

    // Score
    pub const FULL_SCORE: i32 = 100;
    pub const SCORE_SLOPE: f32 = 0.2; // decay per unit of error beyond 1

    // Session
    pub const REPETITIONS: usize = 5;
    pub const FRAME_RATE: f32 = 60.0;
    pub const RNG_SEED: u64 = 12345;
}
