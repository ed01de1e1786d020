//! Protocol of decision-stepping simulators.
//!
//! A simulator is driven tick by tick. The environment sets the action of a
//! behavior with [`Simulator::set_action`], advances the simulation with
//! [`Simulator::advance_tick`] and reads back two [`StepChannel`]s with
//! [`Simulator::get_step_channels`]: the decision channel, carrying data of
//! agents still in the episode, and the terminal channel, populated only when
//! an episode ended during the tick. Either channel may report no agent at all.
use ndarray::{Array2, ArrayD};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
mod scripted;
pub use scripted::{ScriptedSimulator, ScriptedSimulatorConfig, ScriptedTick};

/// Errors at the connection level of a simulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    /// The connection could not be established.
    #[error("failed to connect to the simulator: {0}")]
    Connection(String),

    /// The connection dropped while the simulator was driven.
    #[error("connection to the simulator dropped: {0}")]
    Disconnected(String),

    /// The simulator exposes no behavior to drive.
    #[error("the simulator exposes no behavior")]
    NoBehavior,

    /// The simulator does not know the behavior.
    #[error("unknown behavior `{0}`")]
    UnknownBehavior(String),
}

/// Action sent to the simulator for a behavior.
///
/// Arrays have one row per agent, so a single-agent action has shape `[1, n]`.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionPayload {
    /// Continuous actions.
    Continuous(Array2<f32>),

    /// Discrete actions, one bucket index per branch.
    Discrete(Array2<i32>),
}

/// Per-tick output of the simulator for a behavior.
///
/// `obs` is indexed by modality; each tensor has the agent axis first. `reward`
/// and `interrupted` have one entry per agent reporting in the tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepChannel {
    /// Observation tensors, indexed by modality.
    pub obs: Vec<ArrayD<f32>>,

    /// Rewards of the agents.
    pub reward: Vec<f32>,

    /// `true` if the episode of the agent was cut off externally rather than completed.
    pub interrupted: Vec<bool>,
}

impl StepChannel {
    /// Number of agents reporting in this channel.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if no agent reported in this channel.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

/// A decision-stepping simulator.
///
/// An implementation owns a single connection, which is released by
/// [`Simulator::close`].
pub trait Simulator {
    /// Configuration used to connect to the simulator.
    type Config: Clone + Default + Serialize + DeserializeOwned;

    /// Connects to the simulator.
    fn connect(config: &Self::Config) -> Result<Self, SimulatorError>
    where
        Self: Sized;

    /// Names of the behaviors exposed by the simulator.
    fn behavior_names(&self) -> Vec<String>;

    /// Sets the action of the agents of a behavior for the next tick.
    fn set_action(&mut self, behavior: &str, action: ActionPayload) -> Result<(), SimulatorError>;

    /// Advances the simulation by one tick.
    fn advance_tick(&mut self) -> Result<(), SimulatorError>;

    /// Returns the decision channel and the terminal channel of a behavior.
    fn get_step_channels(
        &mut self,
        behavior: &str,
    ) -> Result<(StepChannel, StepChannel), SimulatorError>;

    /// Starts a fresh episode.
    ///
    /// The simulator may return the initial observation tensors, indexed by
    /// modality, or nothing.
    fn reset_episode(&mut self) -> Result<Option<Vec<ArrayD<f32>>>, SimulatorError>;

    /// Sets the seed of the simulator's random number generator.
    fn set_seed(&mut self, seed: i64) -> Result<(), SimulatorError>;

    /// Releases the connection.
    fn close(&mut self) -> Result<(), SimulatorError>;
}
