//! Trial phase state machine
//!
//! A trial waits at the start until the participant clicks inside the start
//! zone, then records the reach until a click far enough from the start ends
//! it. The next trial begins waiting again.

/// Trial phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingStart,
    Reaching,
}

/// Events that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Fresh click strictly inside the start zone
    StartClicked,
    /// Fresh click beyond the end distance while reaching
    TargetClicked,
}

/// Result of a phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionResult {
    pub success: bool,
    pub from: Phase,
    pub to: Phase,
    pub event: PhaseEvent,
}

/// Phase machine for one trial at a time
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingStart,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn can_transition(&self, event: PhaseEvent) -> bool {
        next_phase(self.phase, event).is_some()
    }

    /// Attempt a transition
    pub fn transition(&mut self, event: PhaseEvent) -> TransitionResult {
        let from = self.phase;
        match next_phase(from, event) {
            Some(to) => {
                self.phase = to;
                TransitionResult {
                    success: true,
                    from,
                    to,
                    event,
                }
            }
            None => TransitionResult {
                success: false,
                from,
                to: from,
                event,
            },
        }
    }

    /// Back to waiting for the next trial
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingStart;
    }

    pub fn is_reaching(&self) -> bool {
        self.phase == Phase::Reaching
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Next phase for a given event (if valid)
pub fn next_phase(phase: Phase, event: PhaseEvent) -> Option<Phase> {
    match (phase, event) {
        (Phase::AwaitingStart, PhaseEvent::StartClicked) => Some(Phase::Reaching),
        // The trial is over; the following one starts out waiting
        (Phase::Reaching, PhaseEvent::TargetClicked) => Some(Phase::AwaitingStart),
        _ => None,
    }
}
