use anyhow::Result;
use ndarray::{arr1, arr2, Array3, ArrayD, IxDyn};
use stacker_core::Env;
use stacker_env::{
    ActionEncoding, ActionPayload, EpisodeState, ObservationModality, ScriptedSimulator,
    ScriptedSimulatorConfig, ScriptedTick, SimulatorError, StackerAct, StackerEnv,
    StackerEnvConfig, StackerEnvError, StackerObs, StepChannel, DEFAULT_EPSILON,
    LAST_ACTION_SENTINEL,
};

type Config = StackerEnvConfig<ScriptedSimulatorConfig>;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn env(config: &Config) -> Result<StackerEnv<ScriptedSimulator>> {
    let sim = ScriptedSimulator::new(config.simulator_config().clone());
    StackerEnv::new(config, sim)
}

fn sim(env: &mut StackerEnv<ScriptedSimulator>) -> &mut ScriptedSimulator {
    env.simulator_mut().unwrap()
}

fn act(x: f32, y: f32) -> StackerAct {
    StackerAct::from([x, y])
}

/// Tensor of a single agent reporting the given vector observation.
fn vector(v: f32) -> ArrayD<f32> {
    ArrayD::from_elem(IxDyn(&[1, 1]), v)
}

fn expect_env_error(res: Result<()>) -> StackerEnvError {
    res.unwrap_err().downcast::<StackerEnvError>().unwrap()
}

#[test]
fn test_vector_continuous_episode() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;

    let obs = env.reset()?;
    let v = obs.vector().unwrap();
    assert!((0.9..=1.1).contains(&v), "{}", v);
    assert_eq!(env.state(), EpisodeState::Active);

    sim(&mut env).push_tick(ScriptedTick::decision(vec![vector(2.0)], 1.0));
    let (step, record) = env.step(&act(0.0, 0.0))?;

    assert_eq!(step.obs, StackerObs::Vector(arr1(&[2.0])));
    assert_eq!(step.reward, 1.0);
    assert!(!step.is_done());
    assert_eq!(step.info.interrupted, None);
    assert_eq!(step.info.episode_steps, 1);
    assert_eq!(record.get_scalar("reward")?, 1.0);
    assert_eq!(record.get_array1("obs")?, vec![2.0]);
    assert_eq!(record.get_array1("act")?, vec![0.0, 0.0]);
    assert_eq!(
        sim(&mut env).actions(),
        &[ActionPayload::Continuous(arr2(&[[0.0, 0.0]]))]
    );
    assert_eq!(env.last_action(), [0.0, 0.0]);
    assert_eq!(env.action_accumulator(), None);

    Ok(())
}

#[test]
fn test_bundled_observation_with_missing_image() -> Result<()> {
    init();
    let config = Config::default().modality(ObservationModality::Both);
    let mut env = env(&config)?;
    env.reset()?;

    let images = ArrayD::zeros(IxDyn(&[0, 84, 84, 3]));
    sim(&mut env).push_tick(ScriptedTick::decision(vec![images, vector(0.5)], 0.0));
    let (step, record) = env.step(&act(0.3, -0.3))?;

    match &step.obs {
        StackerObs::Both { visual, vector } => {
            assert_eq!(visual, &Array3::<f32>::zeros((84, 84, 3)));
            assert_eq!(vector, &arr1(&[0.5]));
        }
        obs => panic!("unexpected observation {:?}", obs),
    }
    assert!(env.observation_space().contains(&step.obs));
    assert!(record.contains_key("fallback_visual"));
    assert!(!record.contains_key("fallback_vector"));

    Ok(())
}

#[test]
fn test_visual_observation_is_in_byte_range() -> Result<()> {
    init();
    let sim_config = ScriptedSimulatorConfig {
        obs_shapes: vec![vec![84, 84, 3]],
        fill: 0.5,
        ..Default::default()
    };
    let config = Config::default()
        .modality(ObservationModality::Visual)
        .simulator(sim_config);
    let mut env = env(&config)?;

    let obs = env.reset()?;
    assert_eq!(obs, StackerObs::Visual(Array3::zeros((84, 84, 3))));

    let (step, _) = env.step(&act(0.0, 0.0))?;
    assert_eq!(step.obs, StackerObs::Visual(Array3::from_elem((84, 84, 3), 128)));
    assert!(env.observation_space().contains(&step.obs));

    Ok(())
}

#[test]
fn test_discrete_accumulator() -> Result<()> {
    init();
    let config = Config::default().encoding(ActionEncoding::Discrete);
    let mut env = env(&config)?;
    env.reset()?;
    assert_eq!(env.action_accumulator(), Some([0.0, 0.0]));

    let (_, record) = env.step(&StackerAct::from([0i32, 2]))?;
    let acc = env.action_accumulator().unwrap();
    assert!((acc[0] + DEFAULT_EPSILON).abs() < 1e-12);
    assert!((acc[1] - DEFAULT_EPSILON).abs() < 1e-12);
    assert!(record.contains_key("act_accumulator"));

    env.step(&StackerAct::from([1i32, 1]))?;
    assert_eq!(env.action_accumulator().unwrap(), acc);

    // Bucket indices are sent, not the accumulator.
    assert_eq!(
        sim(&mut env).actions(),
        &[
            ActionPayload::Discrete(arr2(&[[0, 2]])),
            ActionPayload::Discrete(arr2(&[[1, 1]]))
        ]
    );

    env.step(&StackerAct::from([0i32, 0]))?;
    env.reset()?;
    assert_eq!(env.action_accumulator(), Some([0.0, 0.0]));

    Ok(())
}

#[test]
fn test_interrupted_terminal() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;

    env.step(&act(0.5, 0.5))?;
    assert_eq!(env.last_action(), [0.5, 0.5]);

    sim(&mut env).push_tick(ScriptedTick::terminal(vec![vector(1.5)], -2.0, true));
    let (step, _) = env.step(&act(0.1, 0.1))?;

    assert!(step.is_done());
    assert!(step.is_truncated);
    assert!(!step.is_terminated);
    assert_eq!(step.reward, -2.0);
    assert_eq!(step.info.interrupted, Some(true));
    assert_eq!(env.last_action(), LAST_ACTION_SENTINEL);
    assert_eq!(env.state(), EpisodeState::Idle);

    Ok(())
}

#[test]
fn test_terminal_channel_takes_precedence() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;

    let decision = StepChannel {
        obs: vec![vector(1.0)],
        reward: vec![0.5],
        interrupted: vec![false],
    };
    let tick = ScriptedTick::terminal(vec![vector(3.0)], 5.0, false).with_decision(decision);
    sim(&mut env).push_tick(tick);
    let (step, _) = env.step(&act(0.0, 0.0))?;

    assert_eq!(step.obs, StackerObs::Vector(arr1(&[3.0])));
    assert_eq!(step.reward, 5.0);
    assert!(step.is_terminated);
    assert!(!step.is_truncated);

    Ok(())
}

#[test]
fn test_empty_tick_falls_back() -> Result<()> {
    init();
    for modality in [
        ObservationModality::Vector,
        ObservationModality::Visual,
        ObservationModality::Both,
    ] {
        let mut env = env(&Config::default().modality(modality))?;
        env.reset()?;
        sim(&mut env).push_tick(ScriptedTick::empty());
        let (step, record) = env.step(&act(0.0, 0.0))?;

        assert_eq!(step.reward, 0.0);
        assert!(!step.is_done());
        assert_eq!(step.obs.modality(), modality);
        assert!(env.observation_space().contains(&step.obs));
        assert!(record.contains_key("fallback_vector") || record.contains_key("fallback_visual"));
    }

    Ok(())
}

#[test]
fn test_spaces_are_stable() -> Result<()> {
    init();
    let config = Config::default().simulator(ScriptedSimulatorConfig {
        episode_length: Some(3),
        fill: 2.5,
        ..Default::default()
    });
    let mut env = env(&config)?;
    let obs_space = env.observation_space().clone();
    let act_space = env.action_space().clone();

    for _ in 0..3 {
        let obs = env.reset()?;
        assert!(obs_space.contains(&obs));
        loop {
            let (step, _) = env.step(&act(0.0, 0.0))?;
            assert!(obs_space.contains(&step.obs));
            if step.is_done() {
                break;
            }
        }
        assert_eq!(env.observation_space(), &obs_space);
        assert_eq!(env.action_space(), &act_space);
    }
    assert_eq!(env.total_steps(), 9);

    Ok(())
}

#[test]
fn test_seed_applies_on_next_reset() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;
    env.step(&act(0.0, 0.0))?;

    env.seed(Some(42));
    assert_eq!(env.pending_seed(), Some(42));
    env.step(&act(0.0, 0.0))?;
    assert!(sim(&mut env).seeds().is_empty());
    assert_eq!(sim(&mut env).n_resets(), 1);

    env.reset()?;
    assert_eq!(sim(&mut env).seeds(), &[42]);
    assert_eq!(env.pending_seed(), None);

    // The seed is consumed.
    env.reset()?;
    assert_eq!(sim(&mut env).seeds(), &[42]);

    Ok(())
}

#[test]
fn test_out_of_range_seed_is_replaced() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.seed(Some(123456));
    env.reset()?;

    let seeds = sim(&mut env).seeds().to_vec();
    assert_eq!(seeds.len(), 1);
    assert!((0..99999).contains(&seeds[0]));

    Ok(())
}

#[test]
fn test_build_seeds_first_reset() -> Result<()> {
    init();
    let mut env = StackerEnv::<ScriptedSimulator>::build(&Config::default(), 7)?;
    assert_eq!(env.behavior_name(), "Stacker?team=0");
    env.reset()?;
    assert_eq!(sim(&mut env).seeds(), &[7]);

    Ok(())
}

#[test]
fn test_refused_connection() {
    init();
    let config = Config::default().simulator(ScriptedSimulatorConfig {
        refuse_connection: true,
        ..Default::default()
    });
    let res = StackerEnv::<ScriptedSimulator>::build(&config, 0).map(|_| ());

    match expect_env_error(res) {
        StackerEnvError::SimulatorUnavailable(SimulatorError::Connection(_)) => {}
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    init();
    let config = Config::default().epsilon(-1.0);
    let res = env(&config).map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::InvalidConfig(_)
    ));
}

#[test]
fn test_invalid_action() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;

    let res = env.step(&StackerAct::from([0i32, 1])).map(|_| ());
    match expect_env_error(res) {
        StackerEnvError::InvalidAction { got, .. } => assert!(got.contains("I32")),
        e => panic!("unexpected error {:?}", e),
    }

    let res = env.step(&StackerAct::Continuous(arr1(&[0.0, 0.0, 0.0]))).map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::InvalidAction { .. }
    ));

    let mut env = discrete_env()?;
    env.reset()?;
    let res = env.step(&StackerAct::from([0i32, 3])).map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::InvalidAction { .. }
    ));
    // Nothing reached the simulator.
    assert!(sim(&mut env).actions().is_empty());

    Ok(())
}

fn discrete_env() -> Result<StackerEnv<ScriptedSimulator>> {
    env(&Config::default().encoding(ActionEncoding::Discrete))
}

#[test]
fn test_simulator_failure() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;

    sim(&mut env).fail_next(SimulatorError::Disconnected("broken pipe".to_string()));
    let res = env.step(&act(0.0, 0.0)).map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::SimulatorUnavailable(SimulatorError::Disconnected(_))
    ));

    // A failed reset does not leave the environment resetting.
    sim(&mut env).fail_next(SimulatorError::Disconnected("broken pipe".to_string()));
    assert!(env.reset().is_err());
    assert_eq!(env.state(), EpisodeState::Idle);
    env.reset()?;
    assert_eq!(env.state(), EpisodeState::Active);

    Ok(())
}

#[test]
fn test_close() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    env.reset()?;

    env.close()?;
    assert!(env.is_closed());
    env.close()?;

    let res = env.step(&act(0.0, 0.0)).map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::ClosedEnvironment
    ));
    let res = env.reset().map(|_| ());
    assert!(matches!(
        expect_env_error(res),
        StackerEnvError::ClosedEnvironment
    ));

    Ok(())
}

#[test]
fn test_max_steps_truncates() -> Result<()> {
    init();
    let mut env = env(&Config::default().max_steps(Some(3)))?;
    env.reset()?;

    for t in 1..=3 {
        let (step, _) = env.step(&act(0.0, 0.0))?;
        assert_eq!(step.info.episode_steps, t);
        assert_eq!(step.is_truncated, t == 3);
        assert!(!step.is_terminated);
    }
    assert_eq!(env.state(), EpisodeState::Idle);

    Ok(())
}

#[test]
fn test_step_with_reset() -> Result<()> {
    init();
    let config = Config::default().simulator(ScriptedSimulatorConfig {
        episode_length: Some(2),
        ..Default::default()
    });
    let mut env = env(&config)?;
    env.reset()?;

    let (step, _) = env.step_with_reset(&act(0.0, 0.0))?;
    assert!(!step.is_done());
    assert!(step.init_obs.is_none());

    let (step, _) = env.step_with_reset(&act(0.0, 0.0))?;
    assert!(step.is_terminated);
    assert_eq!(step.reward, 1.0);
    assert!(step.init_obs.is_some());
    assert_eq!(env.state(), EpisodeState::Active);
    assert_eq!(sim(&mut env).n_resets(), 2);

    Ok(())
}

#[test]
fn test_step_without_reset_starts_episode() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    assert_eq!(env.state(), EpisodeState::Idle);

    let (step, _) = env.step(&act(0.0, 0.0))?;
    assert_eq!(step.obs, StackerObs::Vector(arr1(&[1.0])));
    assert_eq!(env.state(), EpisodeState::Active);

    Ok(())
}

#[test]
fn test_reset_with_observation() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    sim(&mut env).push_reset_reply(Some(vec![vector(3.5)]));
    assert_eq!(env.reset()?, StackerObs::Vector(arr1(&[3.5])));

    Ok(())
}

#[test]
fn test_reset_reply_without_agents_falls_back() -> Result<()> {
    init();
    let mut env = env(&Config::default())?;
    sim(&mut env).push_reset_reply(Some(vec![ArrayD::zeros(IxDyn(&[0, 1]))]));
    sim(&mut env).push_reset_reply(Some(vec![]));

    for _ in 0..2 {
        let v = env.reset()?.vector().unwrap();
        assert!((0.9..=1.1).contains(&v), "{}", v);
    }

    Ok(())
}
