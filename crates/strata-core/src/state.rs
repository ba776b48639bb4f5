//! Round state machine
//!
//! ```text
//! Init ─┬─> Round1 ─┬─> GenerationOk ─────────────> Done
//!       └─> RoundN ─┘         (RoundN: merge first)
//!                   └─> GenerationFailed ─> Fallback ─> Done
//! ```

use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    /// Nothing decided yet
    Init,
    /// No artifact exists for the target
    Round1,
    /// An artifact exists and will be merged into
    RoundN,
    /// The generator produced usable HTML
    GenerationOk,
    /// The generator failed or produced unusable output
    GenerationFailed,
    /// A fallback artifact is being produced
    Fallback,
    /// Artifact written and record appended
    Done,
}

impl RoundState {
    /// Terminal state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Round1 => "round_1",
            Self::RoundN => "round_n",
            Self::GenerationOk => "generation_ok",
            Self::GenerationFailed => "generation_failed",
            Self::Fallback => "fallback",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Validates a state transition
pub fn validate_transition(from: RoundState, to: RoundState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: RoundState) -> &'static [RoundState] {
    use RoundState::{Done, Fallback, GenerationFailed, GenerationOk, Init, Round1, RoundN};
    match from {
        Init => &[Round1, RoundN],
        Round1 | RoundN => &[GenerationOk, GenerationFailed],
        GenerationOk | Fallback => &[Done],
        GenerationFailed => &[Fallback],
        Done => &[],
    }
}

/// Current state plus every state visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundMachine {
    trace: Vec<RoundState>,
}

impl RoundMachine {
    /// Machine in [`RoundState::Init`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            trace: vec![RoundState::Init],
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> RoundState {
        self.trace.last().copied().unwrap_or(RoundState::Init)
    }

    /// Move to `to` if the transition is legal
    pub fn advance(&mut self, to: RoundState) -> Result<(), StateError> {
        validate_transition(self.state(), to)?;
        tracing::trace!(from = %self.state(), %to, "round transition");
        self.trace.push(to);
        Ok(())
    }

    /// Whether the round started from an existing artifact
    #[must_use]
    pub fn is_later_round(&self) -> bool {
        self.trace.contains(&RoundState::RoundN)
    }

    /// Visited states, oldest first
    #[inline]
    #[must_use]
    pub fn trace(&self) -> &[RoundState] {
        &self.trace
    }

    /// Consume into the visited states
    #[must_use]
    pub fn into_trace(self) -> Vec<RoundState> {
        self.trace
    }
}

impl Default for RoundMachine {
    fn default() -> Self {
        Self::new()
    }
}
