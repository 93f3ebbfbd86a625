//! Deterministic environment and agent used for tests.
use crate::{Act, Agent, Env, Explorer, Info, Obs, Policy, Step};
use anyhow::{bail, Result};
use std::{fs, path::Path};

#[derive(Clone, Debug, PartialEq)]
/// Dummy observation, the number of steps in the current episode.
pub struct DummyObs(pub usize);

impl Obs for DummyObs {}

#[derive(Clone, Debug, PartialEq)]
/// Dummy discrete action.
pub struct DummyAct(pub usize);

impl Act for DummyAct {}

impl From<usize> for DummyAct {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

#[derive(Clone, Debug)]
/// Dummy info.
pub struct DummyInfo;

impl Info for DummyInfo {}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Reward at every step, indexed by episode in a cyclic manner.
    pub episode_rewards: Vec<f32>,

    /// Length of episodes. `None` means episodes never terminate.
    pub episode_len: Option<usize>,

    /// If given, [`Env::step`] fails at this step of the first episode reaching it.
    pub fail_at_step: Option<usize>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_rewards: vec![1.0],
            episode_len: Some(1),
            fail_at_step: None,
        }
    }
}

impl DummyEnvConfig {
    /// Sets rewards of episodes.
    pub fn episode_rewards(mut self, v: Vec<f32>) -> Self {
        self.episode_rewards = v;
        self
    }

    /// Sets the length of episodes.
    pub fn episode_len(mut self, v: Option<usize>) -> Self {
        self.episode_len = v;
        self
    }

    /// Sets the step at which the environment fails.
    pub fn fail_at_step(mut self, v: Option<usize>) -> Self {
        self.fail_at_step = v;
        self
    }
}

/// Dummy environment with scripted rewards.
///
/// In the `i`-th episode (0-origin), every step gives reward
/// `episode_rewards[i % episode_rewards.len()]`.
pub struct DummyEnv {
    config: DummyEnvConfig,
    n_resets: usize,
    t: usize,

    /// Actions applied to the environment.
    pub acts: Vec<usize>,
}

impl DummyEnv {
    /// Constructs the environment.
    pub fn new(config: DummyEnvConfig) -> Self {
        Self {
            config,
            n_resets: 0,
            t: 0,
            acts: vec![],
        }
    }
}

impl Env for DummyEnv {
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = DummyInfo;

    fn reset(&mut self) -> Result<DummyObs> {
        self.n_resets += 1;
        self.t = 0;
        Ok(DummyObs(0))
    }

    fn step(&mut self, a: &DummyAct) -> Result<Step<Self>> {
        if self.config.fail_at_step == Some(self.t) {
            bail!("DummyEnv failed at step {}", self.t);
        }
        if self.n_resets == 0 {
            bail!("DummyEnv must be reset before stepping");
        }

        self.acts.push(a.0);
        self.t += 1;

        let rewards = &self.config.episode_rewards;
        let reward = rewards[(self.n_resets - 1) % rewards.len()];
        let is_terminated = match self.config.episode_len {
            Some(n) => self.t >= n,
            None => false,
        };

        Ok(Step::new(DummyObs(self.t), reward, is_terminated, false, DummyInfo))
    }
}

/// Dummy agent always taking action `0`.
#[derive(Debug, Clone, Default)]
pub struct DummyAgent {
    /// Statistics returned by [`Agent::get_statistics`].
    pub stats: Vec<(String, f64)>,

    /// The number of calls of [`Policy::sample`].
    pub n_samples: usize,

    /// The number of calls of [`Agent::stop_episode`].
    pub n_stop_episodes: usize,
}

impl DummyAgent {
    /// File written in the directory given to [`Agent::save`].
    pub const FILE_NAME: &'static str = "agent.txt";

    /// Constructs the agent with the given statistics.
    pub fn with_stats(stats: &[(&str, f64)]) -> Self {
        Self {
            stats: stats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &DummyObs) -> DummyAct {
        self.n_samples += 1;
        DummyAct(0)
    }
}

impl Agent<DummyEnv> for DummyAgent {
    fn stop_episode(&mut self) {
        self.n_stop_episodes += 1;
    }

    fn get_statistics(&self) -> Vec<(String, f64)> {
        self.stats.clone()
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path.join(Self::FILE_NAME), self.n_stop_episodes.to_string())?;
        Ok(())
    }
}

/// Explorer taking the greedy action and recording the time steps it is called with.
#[derive(Debug, Clone, Default)]
pub struct RecordingExplorer {
    /// Time steps given to [`Explorer::select_action`].
    pub ts: Vec<usize>,
}

impl<E: Env> Explorer<E> for RecordingExplorer {
    fn select_action(&mut self, t: usize, greedy_action: &mut dyn FnMut() -> E::Act) -> E::Act {
        self.ts.push(t);
        greedy_action()
    }
}
