//! Configuration of evaluators.
use crate::{error::EvalError, util::DEFAULT_LOG_TARGET};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Evaluator`](super::Evaluator).
///
/// The same configuration is used for the evaluator shared among workers
/// in `border-async-eval`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EvaluatorConfig {
    /// The number of episodes in an evaluation.
    pub n_runs: usize,

    /// Interval of evaluation in environment steps.
    pub eval_interval: usize,

    /// Directory where the scores file and agents are saved.
    pub outdir: PathBuf,

    /// The maximum number of steps in an evaluation episode. `None` means no limit.
    pub max_episode_len: Option<usize>,

    /// Environment steps at the beginning of training, used when training is resumed.
    pub step_offset: usize,

    /// Target of log messages. If `None`, [`DEFAULT_LOG_TARGET`] is used.
    pub log_target: Option<String>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            n_runs: 10,
            eval_interval: 10_000,
            outdir: PathBuf::from("."),
            max_episode_len: None,
            step_offset: 0,
            log_target: None,
        }
    }
}

impl EvaluatorConfig {
    /// Sets the number of episodes in an evaluation.
    pub fn n_runs(mut self, v: usize) -> Self {
        self.n_runs = v;
        self
    }

    /// Sets the interval of evaluation in environment steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the output directory.
    pub fn outdir(mut self, v: impl AsRef<Path>) -> Self {
        self.outdir = v.as_ref().to_path_buf();
        self
    }

    /// Sets the maximum number of steps in an evaluation episode.
    pub fn max_episode_len(mut self, v: Option<usize>) -> Self {
        self.max_episode_len = v;
        self
    }

    /// Sets environment steps at the beginning of training.
    pub fn step_offset(mut self, v: usize) -> Self {
        self.step_offset = v;
        self
    }

    /// Sets the target of log messages.
    pub fn log_target(mut self, v: impl Into<String>) -> Self {
        self.log_target = Some(v.into());
        self
    }

    /// Returns the target of log messages.
    pub fn log_target_or_default(&self) -> &str {
        self.log_target.as_deref().unwrap_or(DEFAULT_LOG_TARGET)
    }

    /// Returns `step_offset` rounded down to a multiple of `eval_interval`.
    pub fn initial_eval_t(&self) -> usize {
        self.step_offset - self.step_offset % self.eval_interval
    }

    /// Checks the values of the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_runs == 0 {
            return Err(EvalError::InvalidConfig("n_runs must be positive".to_string()).into());
        }
        if self.eval_interval == 0 {
            return Err(
                EvalError::InvalidConfig("eval_interval must be positive".to_string()).into(),
            );
        }
        if self.max_episode_len == Some(0) {
            return Err(
                EvalError::InvalidConfig("max_episode_len must be positive".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Constructs [`EvaluatorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`EvaluatorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
