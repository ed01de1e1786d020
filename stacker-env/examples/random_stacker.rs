use anyhow::Result;
use serde::Deserialize;
use stacker_core::{Configurable, DefaultEvaluator, Env as _, Evaluator, Policy};
use stacker_env::{
    ActionEncoding, ScriptedSimulator, ScriptedSimulatorConfig, StackerAct, StackerEnv,
    StackerEnvConfig, StackerObs,
};

type Obs = StackerObs;
type Act = StackerAct;
type EnvConfig = StackerEnvConfig<ScriptedSimulatorConfig>;
type Env = StackerEnv<ScriptedSimulator>;

#[derive(Clone, Deserialize)]
struct RandomPolicyConfig {
    pub encoding: ActionEncoding,
}

struct RandomPolicy {
    encoding: ActionEncoding,
}

impl Policy<Env> for RandomPolicy {
    fn sample(&mut self, _: &Obs) -> Act {
        match self.encoding {
            ActionEncoding::Continuous => {
                let x = || fastrand::f32() * 2.0 - 1.0;
                [x(), x()].into()
            }
            ActionEncoding::Discrete => [fastrand::i32(0..3), fastrand::i32(0..3)].into(),
        }
    }
}

impl Configurable<Env> for RandomPolicy {
    type Config = RandomPolicyConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            encoding: config.encoding,
        }
    }
}

fn env_config(encoding: ActionEncoding) -> EnvConfig {
    EnvConfig::default()
        .encoding(encoding)
        .max_steps(Some(300))
        .simulator(ScriptedSimulatorConfig {
            episode_length: Some(50),
            fill: 2.0,
            ..Default::default()
        })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    fastrand::seed(42);

    for encoding in [ActionEncoding::Continuous, ActionEncoding::Discrete] {
        let env_config = env_config(encoding);

        // Checks the spaces before running episodes
        {
            let env = Env::build(&env_config, 42)?;
            log::info!("{:?} action space = {:?}", encoding, env.action_space());
        }

        let mut policy = RandomPolicy::build(RandomPolicyConfig { encoding });
        let record = DefaultEvaluator::<Env>::new(&env_config, 0, 5)?.evaluate(&mut policy)?;
        log::info!(
            "{:?}: average return = {}",
            encoding,
            record.get_scalar("Episode return")?
        );
    }

    Ok(())
}
