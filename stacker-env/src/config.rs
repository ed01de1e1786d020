//! Configuration of [`StackerEnv`](crate::StackerEnv).
use crate::{
    act::DEFAULT_EPSILON, obs::DEFAULT_IMAGE_SHAPE, ActionEncoding, ObservationModality,
    StackerEnvError,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`StackerEnv`](crate::StackerEnv).
///
/// `C` is the configuration of the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackerEnvConfig<C> {
    pub(crate) modality: ObservationModality,
    pub(crate) encoding: ActionEncoding,
    pub(crate) epsilon: f64,
    pub(crate) reset_noise_std: f32,
    pub(crate) image_shape: [usize; 3],
    pub(crate) max_steps: Option<usize>,
    pub(crate) simulator: C,
}

impl<C: Default> Default for StackerEnvConfig<C> {
    fn default() -> Self {
        Self {
            modality: ObservationModality::Vector,
            encoding: ActionEncoding::Continuous,
            epsilon: DEFAULT_EPSILON,
            reset_noise_std: 0.05,
            image_shape: DEFAULT_IMAGE_SHAPE,
            max_steps: None,
            simulator: C::default(),
        }
    }
}

impl<C> StackerEnvConfig<C> {
    /// Sets the observation modality.
    pub fn modality(mut self, v: ObservationModality) -> Self {
        self.modality = v;
        self
    }

    /// Sets the action encoding.
    pub fn encoding(mut self, v: ActionEncoding) -> Self {
        self.encoding = v;
        self
    }

    /// Sets the step of the accumulator of discrete actions.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the standard deviation of the noise of the initial vector observation.
    pub fn reset_noise_std(mut self, v: f32) -> Self {
        self.reset_noise_std = v;
        self
    }

    /// Sets the shape of image observations, `[height, width, channels]`.
    pub fn image_shape(mut self, v: [usize; 3]) -> Self {
        self.image_shape = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the configuration of the simulator.
    pub fn simulator(mut self, v: C) -> Self {
        self.simulator = v;
        self
    }

    /// Returns the configuration of the simulator.
    pub fn simulator_config(&self) -> &C {
        &self.simulator
    }

    /// Checks the values of the configuration.
    pub fn validate(&self) -> Result<(), StackerEnvError> {
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(StackerEnvError::InvalidConfig(format!(
                "epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        if !(self.reset_noise_std.is_finite() && self.reset_noise_std >= 0.0) {
            return Err(StackerEnvError::InvalidConfig(format!(
                "reset_noise_std must be a non-negative number, got {}",
                self.reset_noise_std
            )));
        }
        if self.image_shape.iter().any(|d| *d == 0) {
            return Err(StackerEnvError::InvalidConfig(format!(
                "image_shape must not have zero dimensions, got {:?}",
                self.image_shape
            )));
        }
        if self.max_steps == Some(0) {
            return Err(StackerEnvError::InvalidConfig(
                "max_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl<C> StackerEnvConfig<C>
where
    C: Serialize + for<'de> Deserialize<'de>,
{
    /// Loads the configuration from a yaml file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(rdr)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a yaml file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedSimulatorConfig;
    use tempdir::TempDir;

    type Config = StackerEnvConfig<ScriptedSimulatorConfig>;

    #[test]
    fn test_save_and_load_yaml() -> Result<()> {
        let config = Config::default()
            .modality(ObservationModality::Both)
            .encoding(ActionEncoding::Discrete)
            .max_steps(Some(300))
            .simulator(ScriptedSimulatorConfig {
                episode_length: Some(5),
                ..Default::default()
            });

        let dir = TempDir::new("stacker_env_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        let loaded = Config::load(&path)?;

        assert_eq!(config, loaded);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::default().epsilon(-1.0).validate().is_err());
        assert!(Config::default().reset_noise_std(f32::NAN).validate().is_err());
        assert!(Config::default().image_shape([84, 0, 3]).validate().is_err());
        assert!(Config::default().max_steps(Some(0)).validate().is_err());
    }
}
