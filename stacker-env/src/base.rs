//! Environment bridging a decision-stepping simulator.
use crate::{
    episode::{seed_in_range, Authority, EpisodeState, EpisodeStateMachine, SEED_LIMIT},
    simulator::{ActionPayload, Simulator, SimulatorError, StepChannel},
    space::Space,
    ActionCodec, ObservationCodec, StackerAct, StackerEnvConfig, StackerEnvError, StackerObs,
};
use anyhow::Result;
use log::{debug, info, trace, warn};
use ndarray::{ArrayD, Axis};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use stacker_core::{
    record::{Record, RecordValue},
    Env, Info, Step,
};

/// Information given at every step of the interaction with the environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackerInfo {
    /// `Some(true)` if the episode was cut off by the simulator,
    /// `Some(false)` if it was completed, `None` if it goes on.
    pub interrupted: Option<bool>,

    /// Steps since the start of the episode, including this one.
    pub episode_steps: usize,
}

impl Info for StackerInfo {}

/// An episodic environment on top of a decision-stepping [`Simulator`].
///
/// The environment sends the action of the agent to the simulator, advances
/// one tick and reads back the decision and terminal channels. The terminal
/// channel decides the end of an episode. Replies without data are resolved
/// with fallback observations and a zero reward, so [`Env::step`] and
/// [`Env::reset`] always return values of the declared observation space.
///
/// The observation space and the action space are fixed when the environment
/// is built. The simulator is owned by the environment and released by
/// [`Env::close`], or when the environment is dropped.
pub struct StackerEnv<S: Simulator> {
    simulator: Option<S>,
    behavior: String,
    obs_codec: ObservationCodec,
    act_codec: ActionCodec,
    episode: EpisodeStateMachine,
    observation_space: Space,
    action_space: Space,
    max_steps: Option<usize>,
    reset_noise_std: f32,
    rng: SmallRng,
}

impl<S: Simulator> StackerEnv<S> {
    /// Creates an environment on a simulator connected beforehand.
    ///
    /// No episode is started. The first behavior of the simulator is driven.
    pub fn new(config: &StackerEnvConfig<S::Config>, simulator: S) -> Result<Self> {
        config.validate()?;
        let behavior = simulator
            .behavior_names()
            .into_iter()
            .next()
            .ok_or(StackerEnvError::SimulatorUnavailable(
                SimulatorError::NoBehavior,
            ))?;
        info!("Driving behavior {}", behavior);

        let observation_space = config.modality.space(config.image_shape);
        let action_space = config.encoding.space();
        info!("Observation space = {:?}", observation_space);
        info!("Action space = {:?}", action_space);

        Ok(Self {
            simulator: Some(simulator),
            behavior,
            obs_codec: ObservationCodec::new(config.modality, config.image_shape),
            act_codec: ActionCodec::new(config.encoding, config.epsilon),
            episode: EpisodeStateMachine::new(),
            observation_space,
            action_space,
            max_steps: config.max_steps,
            reset_noise_std: config.reset_noise_std,
            rng: SmallRng::from_entropy(),
        })
    }

    /// The observation space.
    pub fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    /// The action space.
    pub fn action_space(&self) -> &Space {
        &self.action_space
    }

    /// Name of the behavior driven in the simulator.
    pub fn behavior_name(&self) -> &str {
        &self.behavior
    }

    /// State of the episode.
    pub fn state(&self) -> EpisodeState {
        self.episode.state()
    }

    /// Seed to be applied at the next reset.
    pub fn pending_seed(&self) -> Option<i64> {
        self.episode.pending_seed()
    }

    /// Accumulator of discrete actions; `None` for continuous actions.
    pub fn action_accumulator(&self) -> Option<[f64; 2]> {
        self.act_codec.accumulator()
    }

    /// The last action sent in the episode, `[-inf, -inf]` if none.
    pub fn last_action(&self) -> [f32; 2] {
        self.act_codec.last_action()
    }

    /// Steps over the lifetime of the environment.
    pub fn total_steps(&self) -> usize {
        self.episode.total_steps()
    }

    /// Returns `true` after [`Env::close`].
    pub fn is_closed(&self) -> bool {
        self.simulator.is_none()
    }

    /// The simulator, or `None` after [`Env::close`].
    pub fn simulator(&self) -> Option<&S> {
        self.simulator.as_ref()
    }

    /// The simulator, or `None` after [`Env::close`].
    pub fn simulator_mut(&mut self) -> Option<&mut S> {
        self.simulator.as_mut()
    }

    fn request_episode(
        sim: &mut S,
        seed: Option<i64>,
        rng: &mut SmallRng,
    ) -> Result<Option<Vec<ArrayD<f32>>>, SimulatorError> {
        if let Some(seed) = seed {
            let seed = if seed_in_range(seed) {
                seed
            } else {
                let seed_ = rng.gen_range(0..SEED_LIMIT);
                warn!("Seed {} is out of range, using {} instead", seed, seed_);
                seed_
            };
            sim.set_seed(seed)?;
            *rng = SmallRng::seed_from_u64(seed as u64);
            info!("Applied seed {}", seed);
        }
        sim.reset_episode()
    }

    fn round_trip(
        sim: &mut S,
        behavior: &str,
        payload: ActionPayload,
    ) -> Result<(StepChannel, StepChannel), SimulatorError> {
        sim.set_action(behavior, payload)?;
        sim.advance_tick()?;
        sim.get_step_channels(behavior)
    }
}

impl<S: Simulator> Env for StackerEnv<S> {
    type Config = StackerEnvConfig<S::Config>;
    type Obs = StackerObs;
    type Act = StackerAct;
    type Info = StackerInfo;

    /// Connects to the simulator and creates the environment.
    ///
    /// * `seed` - Applied at the first call of the reset method.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        info!("Connecting to the simulator");
        let simulator = S::connect(&config.simulator).map_err(StackerEnvError::from)?;
        let mut env = Self::new(config, simulator)?;
        env.seed(Some(seed));
        Ok(env)
    }

    /// Resets the environment and returns the initial observation.
    ///
    /// The pending seed, if any, is applied before the simulator resets. If
    /// the simulator gives no initial observation, one is synthesized: the
    /// vector is `1` plus small noise and images are black.
    ///
    /// A reset requested while another one is in progress returns the
    /// fallback observation without resetting the simulator again.
    fn reset(&mut self) -> Result<StackerObs> {
        let sim = self
            .simulator
            .as_mut()
            .ok_or(StackerEnvError::ClosedEnvironment)?;
        let ticket = match self.episode.begin_reset() {
            Some(ticket) => ticket,
            None => return Ok(self.obs_codec.fallback()),
        };
        info!("Resetting");

        let raw = match Self::request_episode(sim, ticket.seed, &mut self.rng) {
            Ok(raw) => raw,
            Err(e) => {
                self.episode.abort_reset();
                return Err(StackerEnvError::from(e).into());
            }
        };
        self.act_codec.reset();

        let obs = match raw {
            Some(raw) if raw.iter().any(has_agents) => self.obs_codec.decode(&raw).0,
            _ => {
                let obs = self
                    .obs_codec
                    .reset_fallback(&mut self.rng, self.reset_noise_std);
                debug!("No initial observation, setting it to {:?}", obs.vector());
                obs
            }
        };
        self.episode.finish_reset();

        Ok(obs)
    }

    /// Runs a tick of the simulator with the given action.
    ///
    /// It returns [`Step`] and [`Record`] objects. The [`Record`] merges those
    /// of the [`ObservationCodec`] and the [`ActionCodec`], and has `reward`.
    ///
    /// Fails with [`StackerEnvError::InvalidAction`] if the action is not in
    /// the action space, [`StackerEnvError::ClosedEnvironment`] after close and
    /// [`StackerEnvError::SimulatorUnavailable`] if the simulator cannot be reached.
    fn step(&mut self, act: &StackerAct) -> Result<(Step<Self>, Record)> {
        trace!("StackerEnv::step()");
        let sim = self
            .simulator
            .as_mut()
            .ok_or(StackerEnvError::ClosedEnvironment)?;
        self.act_codec.validate(act)?;

        if !self.episode.accepts_step() {
            debug!("Step requested while resetting, ignored");
            let step = Step::new(
                self.obs_codec.fallback(),
                act.clone(),
                0.0,
                false,
                false,
                StackerInfo::default(),
            );
            return Ok((step, Record::empty()));
        }

        let (payload, record_a) = self.act_codec.encode(act);
        let (decision, terminal) =
            Self::round_trip(sim, &self.behavior, payload).map_err(StackerEnvError::from)?;

        let (obs, reward, interrupted, record_o) = match self.episode.reconcile(&decision, &terminal)
        {
            Authority::Terminal => {
                let (obs, record) = self.obs_codec.decode(&terminal.obs);
                let reward = terminal.reward.first().copied().unwrap_or(0.0);
                let interrupted = terminal.interrupted.first().copied().unwrap_or(false);
                self.act_codec.clear_last_action();
                info!(
                    "Terminated: reward = {}, interrupted = {}, steps = {}",
                    reward,
                    interrupted,
                    self.episode.episode_steps()
                );
                (obs, reward, Some(interrupted), record)
            }
            Authority::Decision => {
                let (obs, record) = self.obs_codec.decode(&decision.obs);
                let reward = match decision.reward.first() {
                    Some(r) => *r,
                    None => {
                        trace!("No reward in the tick, setting it to 0");
                        0.0
                    }
                };
                (obs, reward, None, record)
            }
        };

        let is_terminated = interrupted == Some(false);
        let mut is_truncated = interrupted == Some(true);
        if let Some(max_steps) = self.max_steps {
            if interrupted.is_none() && self.episode.episode_steps() >= max_steps {
                info!("Truncated at {} steps", max_steps);
                self.episode.truncate();
                is_truncated = true;
            }
        }

        let info = StackerInfo {
            interrupted,
            episode_steps: self.episode.episode_steps(),
        };
        let mut record = record_o.merge(record_a);
        record.insert("reward", RecordValue::Scalar(reward));

        Ok((
            Step::new(obs, act.clone(), reward, is_terminated, is_truncated, info),
            record,
        ))
    }

    /// Sets the seed applied at the next reset.
    ///
    /// The valid range is `[0, 99999)`. A seed outside of it is stored with a
    /// warning, and a random seed in the range is used at the next reset.
    fn seed(&mut self, seed: Option<i64>) {
        self.episode.set_pending_seed(seed);
    }

    /// Releases the simulator. Calling it again does nothing.
    fn close(&mut self) -> Result<()> {
        match self.simulator.take() {
            Some(mut sim) => {
                info!("Closing the simulator");
                sim.close().map_err(StackerEnvError::from)?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn has_agents(t: &ArrayD<f32>) -> bool {
    t.ndim() > 0 && t.len_of(Axis(0)) > 0
}

impl<S: Simulator> Drop for StackerEnv<S> {
    fn drop(&mut self) {
        if let Some(mut sim) = self.simulator.take() {
            if let Err(e) = sim.close() {
                warn!("Failed to close the simulator: {}", e);
            }
        }
    }
}
