//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Recording session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Recording,
    Stopping,
    Crashed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Crashed => "crashed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Recording session lifecycle.
///
/// State machine:
///   IDLE -> STARTING (begin_start)
///   STARTING -> RECORDING (confirm_started)
///   STARTING -> IDLE (abort_start)
///   RECORDING -> STOPPING (begin_stop)
///   STOPPING -> IDLE (finish_stop)
///   RECORDING -> CRASHED (mark_crashed)
///   CRASHED -> IDLE (finish_crash)
#[derive(Debug, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// Create a new session machine in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    fn transition(
        &mut self,
        from: SessionState,
        to: SessionState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Transition from IDLE to STARTING
    pub fn begin_start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Idle, SessionState::Starting, "start recording")
    }

    /// Transition from STARTING to RECORDING once the capture process is up
    pub fn confirm_started(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Starting,
            SessionState::Recording,
            "confirm start",
        )
    }

    /// Transition from STARTING back to IDLE when startup fails
    pub fn abort_start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Starting, SessionState::Idle, "abort start")
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Recording,
            SessionState::Stopping,
            "stop recording",
        )
    }

    /// Transition from STOPPING to IDLE
    pub fn finish_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Stopping, SessionState::Idle, "finish stop")
    }

    /// Transition from RECORDING to CRASHED when the capture exits on its own
    pub fn mark_crashed(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            SessionState::Recording,
            SessionState::Crashed,
            "mark crashed",
        )
    }

    /// Transition from CRASHED to IDLE after salvage
    pub fn finish_crash(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(SessionState::Crashed, SessionState::Idle, "recover")
    }
}
