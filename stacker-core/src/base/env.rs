//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an episodic environment, typically an MDP.
///
/// The trait mirrors the conventional single-agent episodic interface, so a
/// training loop written against it can drive any implementation:
///
/// * [`Env::reset`] starts an episode and returns its initial observation.
/// * [`Env::step`] applies an action and returns a [`Step`].
/// * [`Env::seed`] schedules a seed for the next episode.
/// * [`Env::close`] releases the resources held by the environment.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    ///
    /// The seed is applied at the first call of [`Env::reset`].
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    ///
    /// Fails when the action does not belong to the action space of the
    /// environment, or when the environment can no longer be driven.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Sets the seed used by the next call of [`Env::reset`].
    ///
    /// `None` clears a seed set before. The episode in progress, if any,
    /// is not affected.
    fn seed(&mut self, seed: Option<i64>);

    /// Releases the environment.
    fn close(&mut self) -> Result<()>;

    /// Performes an environment step and resets the environment if an episode ends.
    ///
    /// The initial observation of the next episode is stored in [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized,
    {
        let (step, record) = self.step(a)?;
        if step.is_done() {
            let init_obs = self.reset()?;
            Ok((step.with_init_obs(init_obs), record))
        } else {
            Ok((step, record))
        }
    }

    /// Resets the environment with a given index.
    ///
    /// The index is used as the seed of the episode, which is useful when
    /// evaluating a trained agent on a fixed set of episodes.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.seed(Some(ix as i64));
        self.reset()
    }
}
