//! A simulator replaying scripted ticks.
//!
//! [`ScriptedSimulator`] stands in for a live simulator in tests and examples.
//! Ticks queued with [`ScriptedSimulator::push_tick`] are replayed in order.
//! When the queue is empty, ticks are generated from the configuration: every
//! tick reports one agent whose tensors are filled with
//! [`ScriptedSimulatorConfig::fill`], and an episode ends after
//! [`ScriptedSimulatorConfig::episode_length`] ticks if it is set.
use super::{ActionPayload, Simulator, SimulatorError, StepChannel};
use log::trace;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Configuration of [`ScriptedSimulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptedSimulatorConfig {
    /// Name of the single behavior exposed.
    pub behavior_name: String,

    /// Per-agent shapes of the generated observation tensors, indexed by modality.
    pub obs_shapes: Vec<Vec<usize>>,

    /// Value filling the generated observation tensors.
    pub fill: f32,

    /// Reward of generated mid-episode ticks.
    pub reward: f32,

    /// Reward of generated terminal ticks.
    pub terminal_reward: f32,

    /// Number of generated ticks in an episode. Episodes never end if `None`.
    pub episode_length: Option<usize>,

    /// If `true`, [`Simulator::connect`] fails.
    pub refuse_connection: bool,
}

impl Default for ScriptedSimulatorConfig {
    fn default() -> Self {
        Self {
            behavior_name: "Stacker?team=0".to_string(),
            obs_shapes: vec![vec![1]],
            fill: 1.0,
            reward: 0.0,
            terminal_reward: 1.0,
            episode_length: None,
            refuse_connection: false,
        }
    }
}

/// A pair of channels returned at a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptedTick {
    /// Decision channel.
    pub decision: StepChannel,

    /// Terminal channel.
    pub terminal: StepChannel,
}

impl ScriptedTick {
    /// A tick where no agent reports.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A mid-episode tick of a single agent.
    pub fn decision(obs: Vec<ArrayD<f32>>, reward: f32) -> Self {
        Self {
            decision: StepChannel {
                obs,
                reward: vec![reward],
                interrupted: vec![false],
            },
            terminal: StepChannel::default(),
        }
    }

    /// A tick where the episode of a single agent ends.
    pub fn terminal(obs: Vec<ArrayD<f32>>, reward: f32, interrupted: bool) -> Self {
        Self {
            decision: StepChannel::default(),
            terminal: StepChannel {
                obs,
                reward: vec![reward],
                interrupted: vec![interrupted],
            },
        }
    }

    /// Sets the decision channel, keeping the terminal one.
    pub fn with_decision(mut self, decision: StepChannel) -> Self {
        self.decision = decision;
        self
    }
}

/// A simulator replaying scripted ticks.
#[derive(Debug)]
pub struct ScriptedSimulator {
    config: ScriptedSimulatorConfig,
    ticks: VecDeque<ScriptedTick>,
    reset_replies: VecDeque<Option<Vec<ArrayD<f32>>>>,
    current: ScriptedTick,
    pending_failure: Option<SimulatorError>,
    actions: Vec<ActionPayload>,
    seeds: Vec<i64>,
    n_resets: usize,
    n_ticks: usize,
    n_closes: usize,
    episode_ticks: usize,
}

impl ScriptedSimulator {
    /// Creates a simulator with the given configuration.
    pub fn new(config: ScriptedSimulatorConfig) -> Self {
        Self {
            config,
            ticks: VecDeque::new(),
            reset_replies: VecDeque::new(),
            current: ScriptedTick::default(),
            pending_failure: None,
            actions: vec![],
            seeds: vec![],
            n_resets: 0,
            n_ticks: 0,
            n_closes: 0,
            episode_ticks: 0,
        }
    }

    /// Queues a tick.
    pub fn push_tick(&mut self, tick: ScriptedTick) {
        self.ticks.push_back(tick);
    }

    /// Queues the reply of a call of [`Simulator::reset_episode`].
    ///
    /// Without queued replies, resets return `None`.
    pub fn push_reset_reply(&mut self, obs: Option<Vec<ArrayD<f32>>>) {
        self.reset_replies.push_back(obs);
    }

    /// Makes the next protocol call fail with the given error.
    pub fn fail_next(&mut self, err: SimulatorError) {
        self.pending_failure = Some(err);
    }

    /// Actions received so far.
    pub fn actions(&self) -> &[ActionPayload] {
        &self.actions
    }

    /// Seeds received so far.
    pub fn seeds(&self) -> &[i64] {
        &self.seeds
    }

    /// Number of episode resets requested.
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    /// Number of ticks advanced.
    pub fn n_ticks(&self) -> usize {
        self.n_ticks
    }

    /// Number of calls of [`Simulator::close`].
    pub fn n_closes(&self) -> usize {
        self.n_closes
    }

    fn check(&mut self) -> Result<(), SimulatorError> {
        if self.n_closes > 0 {
            return Err(SimulatorError::Disconnected("closed".to_string()));
        }
        match self.pending_failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_behavior(&self, behavior: &str) -> Result<(), SimulatorError> {
        if behavior == self.config.behavior_name {
            Ok(())
        } else {
            Err(SimulatorError::UnknownBehavior(behavior.to_string()))
        }
    }

    fn generated_obs(&self) -> Vec<ArrayD<f32>> {
        self.config
            .obs_shapes
            .iter()
            .map(|shape| {
                let mut shape = shape.clone();
                shape.insert(0, 1);
                ArrayD::from_elem(IxDyn(&shape), self.config.fill)
            })
            .collect()
    }

    fn generated_tick(&self) -> ScriptedTick {
        match self.config.episode_length {
            Some(n) if self.episode_ticks >= n => {
                ScriptedTick::terminal(self.generated_obs(), self.config.terminal_reward, false)
            }
            _ => ScriptedTick::decision(self.generated_obs(), self.config.reward),
        }
    }
}

impl Simulator for ScriptedSimulator {
    type Config = ScriptedSimulatorConfig;

    fn connect(config: &Self::Config) -> Result<Self, SimulatorError> {
        if config.refuse_connection {
            Err(SimulatorError::Connection("connection refused".to_string()))
        } else {
            Ok(Self::new(config.clone()))
        }
    }

    fn behavior_names(&self) -> Vec<String> {
        vec![self.config.behavior_name.clone()]
    }

    fn set_action(&mut self, behavior: &str, action: ActionPayload) -> Result<(), SimulatorError> {
        self.check()?;
        self.check_behavior(behavior)?;
        self.actions.push(action);
        Ok(())
    }

    fn advance_tick(&mut self) -> Result<(), SimulatorError> {
        self.check()?;
        self.n_ticks += 1;
        self.episode_ticks += 1;
        self.current = match self.ticks.pop_front() {
            Some(tick) => tick,
            None => self.generated_tick(),
        };
        if !self.current.terminal.is_empty() {
            self.episode_ticks = 0;
        }
        trace!("ScriptedSimulator: tick {}", self.n_ticks);
        Ok(())
    }

    fn get_step_channels(
        &mut self,
        behavior: &str,
    ) -> Result<(StepChannel, StepChannel), SimulatorError> {
        self.check()?;
        self.check_behavior(behavior)?;
        let tick = std::mem::take(&mut self.current);
        Ok((tick.decision, tick.terminal))
    }

    fn reset_episode(&mut self) -> Result<Option<Vec<ArrayD<f32>>>, SimulatorError> {
        self.check()?;
        self.n_resets += 1;
        self.episode_ticks = 0;
        Ok(self.reset_replies.pop_front().flatten())
    }

    fn set_seed(&mut self, seed: i64) -> Result<(), SimulatorError> {
        self.check()?;
        self.seeds.push(seed);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SimulatorError> {
        self.n_closes += 1;
        Ok(())
    }
}
