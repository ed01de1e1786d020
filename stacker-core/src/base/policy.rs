//! Policies driving an environment.
use super::Env;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Chooses the action of the agent on an environment `E`.
///
/// [`DefaultEvaluator`](crate::DefaultEvaluator) calls [`Policy::sample`] once
/// per step with the latest observation, and sends the returned action to
/// [`Env::step`]. A policy may keep state across calls, e.g. a random number
/// generator or a counter of samples.
pub trait Policy<E: Env> {
    /// Returns the action for `obs`.
    fn sample(&mut self, obs: &E::Obs) -> E::Act;
}

/// A policy, or any other object on `E`, built from a configuration.
pub trait Configurable<E: Env> {
    /// Configuration, deserializable from yaml.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Self;

    /// Reads [`Configurable::Config`] from the yaml file at `path` and builds the object.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let rdr = std::io::BufReader::new(std::fs::File::open(path)?);
        let config: Self::Config = serde_yaml::from_reader(rdr)?;
        Ok(Self::build(config))
    }
}
