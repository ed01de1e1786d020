//! Errors of [`StackerEnv`](crate::StackerEnv).
use crate::simulator::SimulatorError;
use thiserror::Error;

/// Errors surfaced to the caller of [`StackerEnv`](crate::StackerEnv).
///
/// A simulator reply without data is not an error; it is resolved with
/// fallback observations and a zero reward.
#[derive(Error, Debug)]
pub enum StackerEnvError {
    /// The action does not belong to the action space.
    #[error("invalid action: expected {expected}, got {got}")]
    InvalidAction {
        /// The action space.
        expected: String,
        /// Shape and type of the given action.
        got: String,
    },

    /// The environment was closed.
    #[error("the environment has been closed")]
    ClosedEnvironment,

    /// The simulator cannot be reached.
    #[error("simulator unavailable: {0}")]
    SimulatorUnavailable(#[from] SimulatorError),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
