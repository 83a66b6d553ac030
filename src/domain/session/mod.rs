//! Recording session domain module

mod state;

pub use state::{InvalidStateTransition, SessionMachine, SessionState};
