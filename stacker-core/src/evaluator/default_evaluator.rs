//! Default implementation of the [`Evaluator`] trait.
//!
//! The evaluator runs a fixed number of episodes and reports the average
//! return and the average length of the episodes.
use super::Evaluator;
use crate::{record::Record, record::RecordValue, Env, Policy};
use anyhow::Result;
use log::info;

/// Runs a number of episodes and averages their returns.
///
/// Episode `ix` is started with [`Env::reset_with_index`], so evaluations of
/// different policies see the same sequence of episode seeds.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::new(&env_config, 42, 10)?;
/// let record = evaluator.evaluate(&mut policy)?;
/// println!("Average return: {}", record.get_scalar("Episode return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    /// Runs `n_episodes` episodes with `policy`.
    ///
    /// The returned [`Record`] has `Episode return` and `Episode length`,
    /// both averaged over episodes.
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let mut r_total = 0f32;
        let mut len_total = 0usize;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_episode = 0f32;

            loop {
                let act = policy.sample(&prev_obs);
                let (step, _) = self.env.step(&act)?;
                r_episode += step.reward;
                len_total += 1;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }

            info!("Episode {}: return = {}", ix, r_episode);
            r_total += r_episode;
        }

        let n = self.n_episodes.max(1) as f32;
        Ok(Record::from_slice(&[
            ("Episode return", RecordValue::Scalar(r_total / n)),
            ("Episode length", RecordValue::Scalar(len_total as f32 / n)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`], building the environment from `config`.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }

    /// Constructs a new [`DefaultEvaluator`] on an environment built beforehand.
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self { n_episodes, env }
    }

    /// Returns the environment used for evaluation.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}
