#![warn(missing_docs)]
//! An episodic environment on top of a decision-stepping stacking simulator.
//!
//! [`StackerEnv`] drives one behavior of a [`Simulator`], which advances in
//! ticks. At every tick the simulator reports two channels for the behavior:
//! the decision channel, for agents requesting a new action, and the terminal
//! channel, for agents whose episode just ended. The environment implements
//! [`Env`](stacker_core::Env), so it can be used with any policy and with
//! [`DefaultEvaluator`](stacker_core::DefaultEvaluator).
//!
//! ## Observation
//!
//! The raw tensors of the simulator are converted to [`StackerObs`] by
//! [`ObservationCodec`]. Three modalities are supported, chosen at
//! construction with [`ObservationModality`]:
//!
//! * `Vector` - a single scalar in `[0, 4]`.
//! * `Visual` - an RGB image of bytes, `84x84x3` by default.
//! * `Both` - a dictionary with the image as floats in `[0, 1]` under
//!   [`VISUAL_OBS_KEY`] and the scalar under [`VECTOR_OBS_KEY`].
//!
//! When the simulator replies without data for a modality, a fallback of
//! zeros is used. The initial observation of an episode falls back to `1`
//! plus small noise for the vector.
//!
//! ## Action
//!
//! Actions are two dimensional. With [`ActionEncoding::Continuous`] they are
//! floats in `[-1, 1]` forwarded as they are. With [`ActionEncoding::Discrete`]
//! each component is a bucket in `{0, 1, 2}` meaning decrease, hold and
//! increase. [`ActionCodec`] keeps an accumulator of discrete actions for
//! diagnostics.
//!
//! ## Simulator
//!
//! [`Simulator`] is the protocol to the simulation engine. [`ScriptedSimulator`]
//! is an in-process implementation replaying scripted ticks, used for tests and
//! demos.
mod act;
mod base;
mod config;
pub mod episode;
mod error;
mod obs;
pub mod simulator;
pub mod space;
pub use act::{
    ActionCodec, ActionEncoding, StackerAct, DEFAULT_EPSILON, LAST_ACTION_SENTINEL, N_BUCKETS,
};
pub use base::{StackerEnv, StackerInfo};
pub use config::StackerEnvConfig;
pub use episode::{EpisodeState, EpisodeStateMachine};
pub use error::StackerEnvError;
pub use obs::{
    ObservationCodec, ObservationModality, StackerObs, DEFAULT_IMAGE_SHAPE, VECTOR_OBS_BOUNDS,
    VECTOR_OBS_KEY, VISUAL_OBS_KEY,
};
pub use simulator::{
    ActionPayload, ScriptedSimulator, ScriptedSimulatorConfig, ScriptedTick, Simulator,
    SimulatorError, StepChannel,
};
pub use space::{DType, Space};
