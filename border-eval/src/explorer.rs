//! Exploration strategies applied in evaluation episodes.
use crate::{error::EvalError, Env, Explorer};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Always takes the greedy action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Greedy;

impl<E: Env> Explorer<E> for Greedy {
    fn select_action(&mut self, _t: usize, greedy_action: &mut dyn FnMut() -> E::Act) -> E::Act {
        greedy_action()
    }
}

/// Configuration of [`EpsilonGreedy`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedyConfig {
    /// Probability of taking a random action.
    pub eps: f64,

    /// The number of discrete actions.
    pub n_actions: usize,

    /// Random seed.
    pub seed: u64,
}

impl Default for EpsilonGreedyConfig {
    fn default() -> Self {
        Self {
            eps: 0.05,
            n_actions: 2,
            seed: 42,
        }
    }
}

impl EpsilonGreedyConfig {
    /// Sets the probability of taking a random action.
    pub fn eps(mut self, v: f64) -> Self {
        self.eps = v;
        self
    }

    /// Sets the number of discrete actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the values of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_actions == 0 {
            return Err(EvalError::InvalidConfig("n_actions must be positive".to_string()).into());
        }
        if !(0.0..=1.0).contains(&self.eps) {
            return Err(EvalError::InvalidConfig(format!(
                "eps must be in [0, 1], got {}",
                self.eps
            ))
            .into());
        }
        Ok(())
    }
}

/// Epsilon-greedy explorer for discrete actions.
///
/// Takes an action uniformly sampled from `0..n_actions` with probability `eps`,
/// otherwise the greedy action.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    eps: f64,
    n_actions: usize,

    // Seed of the next draw. A plain integer keeps the explorer `Sync`.
    rng_state: u64,
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn build(config: EpsilonGreedyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            eps: config.eps,
            n_actions: config.n_actions,
            rng_state: config.seed,
        })
    }
}

impl<E> Explorer<E> for EpsilonGreedy
where
    E: Env,
    E::Act: From<usize>,
{
    fn select_action(&mut self, _t: usize, greedy_action: &mut dyn FnMut() -> E::Act) -> E::Act {
        let rng = fastrand::Rng::with_seed(self.rng_state);
        let is_random = rng.f64() < self.eps;
        let act = if is_random {
            E::Act::from(rng.usize(..self.n_actions))
        } else {
            greedy_action()
        };
        self.rng_state = rng.u64(..);
        act
    }
}
