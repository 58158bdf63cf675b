//! Pointer trace format
//!
//! A recorded stream of pointer samples, as produced by the input
//! collaborator and consumed by the headless runner. Uses postcard for
//! compact binary serialization.

use postcard::{from_bytes, to_allocvec};

// ============================================================================
// Frames
// ============================================================================

/// One pointer sample, taken once per display frame
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerFrame {
    /// Milliseconds since the start of the recording
    pub t_ms: u32,
    pub x: f32,
    pub y: f32,
    /// Button held down during this frame
    pub pressed: bool,
}

impl PointerFrame {
    pub fn new(t_ms: u32, x: f32, y: f32, pressed: bool) -> Self {
        Self { t_ms, x, y, pressed }
    }

    /// Timestamp in seconds
    pub fn seconds(&self) -> f64 {
        f64::from(self.t_ms) / 1000.0
    }
}

/// A whole recording, in frame order
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerTrace {
    pub frames: Vec<PointerFrame>,
}

impl PointerTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: PointerFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of press edges (button up on the previous frame, down now)
    pub fn presses(&self) -> usize {
        let mut previous = false;
        self.frames
            .iter()
            .filter(|f| {
                let edge = f.pressed && !previous;
                previous = f.pressed;
                edge
            })
            .count()
    }

    /// Duration covered by the recording, in milliseconds
    pub fn duration_ms(&self) -> u32 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.t_ms.saturating_sub(first.t_ms),
            _ => 0,
        }
    }
}

// ============================================================================
// Serialization Helpers
// ============================================================================

impl PointerTrace {
    /// Serialize the trace to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        to_allocvec(self)
    }

    /// Deserialize a trace from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        from_bytes(bytes)
    }
}
