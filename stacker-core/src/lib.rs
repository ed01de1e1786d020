#![warn(missing_docs)]
//! Core traits of the stacker environment bridge.
//!
//! This crate defines the contract between a training loop and an episodic
//! environment: observations ([`Obs`]), actions ([`Act`]), the environment
//! itself ([`Env`]) and the [`Step`] object it emits at every interaction.
//! A [`Policy`] maps observations to actions, and [`DefaultEvaluator`] runs a
//! policy for a number of episodes.
//!
//! Environments attach diagnostic values to every step in a
//! [`Record`](record::Record), which is a flexible key/value container.
pub mod error;
pub mod record;

mod base;
pub use base::{Act, Configurable, Env, Info, Obs, Policy, Step};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};
