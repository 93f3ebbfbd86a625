//! Utilities for evaluating agents and saving them.
use crate::{error::EvalError, Agent, Env, Explorer};
use anyhow::Result;
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Log target used when no target is given in the configuration.
pub const DEFAULT_LOG_TARGET: &str = "border_eval";

/// Summary statistics of scores over evaluation episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalResult {
    /// Arithmetic mean of the scores.
    pub mean: f64,

    /// Median of the scores.
    pub median: f64,

    /// Sample standard deviation of the scores, `0` if less than two scores.
    pub stdev: f64,
}

impl EvalResult {
    /// Computes statistics of the given scores.
    ///
    /// `scores` must not be empty.
    pub fn from_scores(scores: &[f64]) -> Self {
        let n = scores.len();
        let mean = scores.iter().sum::<f64>() / n as f64;

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        let stdev = if n >= 2 {
            let ss = scores.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            median,
            stdev,
        }
    }
}

/// Runs `n_runs` episodes and returns statistics of the scores.
///
/// An episode ends when the environment signals termination or truncation,
/// or when the number of steps reaches `max_episode_len`. Actions are taken
/// greedily by `agent`, or through `explorer` if given.
/// [`Agent::stop_episode`] is called at the end of every episode.
///
/// Rewards are accumulated in `f64`. Any error of the environment aborts
/// the evaluation.
pub fn eval_performance<E, A>(
    env: &mut E,
    agent: &mut A,
    n_runs: usize,
    max_episode_len: Option<usize>,
    mut explorer: Option<&mut dyn Explorer<E>>,
    log_target: &str,
) -> Result<EvalResult>
where
    E: Env,
    A: Agent<E>,
{
    if n_runs == 0 {
        return Err(EvalError::InvalidConfig("n_runs must be positive".to_string()).into());
    }

    let mut scores = Vec::with_capacity(n_runs);

    for i in 0..n_runs {
        let mut obs = env.reset()?;
        let mut done = false;
        let mut test_r = 0f64;
        let mut t = 0;

        while !(done || Some(t) == max_episode_len) {
            let act = match explorer.as_mut() {
                Some(explorer) => explorer.select_action(t, &mut || agent.sample(&obs)),
                None => agent.sample(&obs),
            };
            let step = env.step(&act)?;
            test_r += step.reward as f64;
            done = step.is_done();
            obs = step.obs;
            t += 1;
        }

        agent.stop_episode();
        scores.push(test_r);
        info!(target: log_target, "test episode: {} R: {}", i, test_r);
    }

    Ok(EvalResult::from_scores(&scores))
}

/// Saves the agent in directory `(outdir)/(t)(suffix)` and returns its path.
pub fn save_agent<E, A>(
    agent: &A,
    t: usize,
    outdir: &Path,
    log_target: &str,
    suffix: &str,
) -> Result<PathBuf>
where
    E: Env,
    A: Agent<E>,
{
    let dirname = outdir.join(format!("{}{}", t, suffix));
    fs::create_dir_all(&dirname)?;
    agent.save(&dirname)?;
    info!(target: log_target, "Saved the agent to {:?}", &dirname);
    Ok(dirname)
}

/// Saves the agent as the best model so far.
///
/// Each best model is saved in its own directory named after `t`.
pub fn update_best_model<E, A>(
    agent: &A,
    outdir: &Path,
    t: usize,
    old_max_score: f64,
    new_max_score: f64,
    log_target: &str,
) -> Result<PathBuf>
where
    E: Env,
    A: Agent<E>,
{
    info!(
        target: log_target,
        "The best score is updated {} -> {}", old_max_score, new_max_score
    );
    save_agent::<E, A>(agent, t, outdir, log_target, "")
}
