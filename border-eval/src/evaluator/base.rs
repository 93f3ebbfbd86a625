use super::EvaluatorConfig;
use crate::{
    explorer::Greedy,
    record::{record_stats, write_header, ScoreRow},
    util::{eval_performance, save_agent, update_best_model},
    Agent, Env, Explorer,
};
use anyhow::Result;
use log::debug;
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Evaluates an agent every `eval_interval` environment steps and saves the best one.
///
/// This evaluator is used by a single training loop. It owns the environment
/// for evaluation, while the agent is given at every call.
///
/// ```mermaid
/// stateDiagram-v2
///     Idle --> Idle: t < prev_eval_t + eval_interval
///     Idle --> Evaluating: t >= prev_eval_t + eval_interval
///     Evaluating --> Idle: prev_eval_t = t - t % eval_interval
/// ```
///
/// In an evaluation, `n_runs` episodes are run, a row is appended to
/// `(outdir)/scores.txt`, and the agent is saved in `(outdir)/(t)` if the mean
/// score is strictly greater than the best score so far.
///
/// The header of the scores file is written when the evaluator is created,
/// with the names of the statistics of the agent at that time.
pub struct Evaluator<E: Env, X: Explorer<E> = Greedy> {
    env: E,
    explorer: Option<X>,
    n_runs: usize,
    eval_interval: usize,
    outdir: PathBuf,
    max_episode_len: Option<usize>,
    log_target: String,
    start_time: SystemTime,
    max_score: f64,
    prev_eval_t: usize,
}

impl<E: Env> Evaluator<E, Greedy> {
    /// Constructs an evaluator taking greedy actions of the agent.
    ///
    /// `agent` is used to write the header of the scores file.
    pub fn new<A: Agent<E>>(config: &EvaluatorConfig, env: E, agent: &A) -> Result<Self> {
        Self::build(config, env, None, agent)
    }
}

impl<E: Env, X: Explorer<E>> Evaluator<E, X> {
    /// Constructs an evaluator taking actions through `explorer`.
    pub fn with_explorer<A: Agent<E>>(
        config: &EvaluatorConfig,
        env: E,
        explorer: X,
        agent: &A,
    ) -> Result<Self> {
        Self::build(config, env, Some(explorer), agent)
    }

    fn build<A: Agent<E>>(
        config: &EvaluatorConfig,
        env: E,
        explorer: Option<X>,
        agent: &A,
    ) -> Result<Self> {
        config.validate()?;
        write_header(&config.outdir, &agent.get_statistics())?;

        Ok(Self {
            env,
            explorer,
            n_runs: config.n_runs,
            eval_interval: config.eval_interval,
            outdir: config.outdir.clone(),
            max_episode_len: config.max_episode_len,
            log_target: config.log_target_or_default().to_string(),
            start_time: SystemTime::now(),
            max_score: f32::MIN as f64,
            prev_eval_t: config.initial_eval_t(),
        })
    }

    /// The best mean score so far.
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Environment steps of the last evaluation, aligned to `eval_interval`.
    pub fn prev_eval_t(&self) -> usize {
        self.prev_eval_t
    }

    /// Directory where the scores file and agents are saved.
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Runs an evaluation, records its result and saves the agent if it is the best so far.
    ///
    /// Returns the mean score.
    pub fn evaluate_and_update_max_score<A: Agent<E>>(&mut self, t: usize, agent: &mut A) -> Result<f64> {
        let result = eval_performance(
            &mut self.env,
            agent,
            self.n_runs,
            self.max_episode_len,
            self.explorer.as_mut().map(|x| x as &mut dyn Explorer<E>),
            &self.log_target,
        )?;
        let row = ScoreRow {
            step: t,
            elapsed: self.start_time.elapsed()?.as_secs_f64(),
            result,
            agent_stats: agent.get_statistics(),
        };
        record_stats(&self.outdir, &row.values())?;

        if result.mean > self.max_score {
            update_best_model::<E, A>(
                agent,
                &self.outdir,
                t,
                self.max_score,
                result.mean,
                &self.log_target,
            )?;
            self.max_score = result.mean;
        }

        Ok(result.mean)
    }

    /// Evaluates the agent if `eval_interval` steps have passed since the last evaluation.
    ///
    /// Returns the mean score, or `None` if no evaluation was done.
    pub fn evaluate_if_necessary<A: Agent<E>>(&mut self, t: usize, agent: &mut A) -> Result<Option<f64>> {
        if t < self.prev_eval_t.saturating_add(self.eval_interval) {
            return Ok(None);
        }

        debug!(target: self.log_target.as_str(), "Starts evaluation at step {}", t);
        let score = self.evaluate_and_update_max_score(t, agent)?;
        self.prev_eval_t = t - t % self.eval_interval;
        Ok(Some(score))
    }

    /// Saves the agent in `(outdir)/(t)(suffix)`, independently of the score.
    ///
    /// It is typically used at the end of training with suffix `"_finish"`.
    pub fn save_agent<A: Agent<E>>(&self, t: usize, agent: &A, suffix: &str) -> Result<PathBuf> {
        save_agent::<E, A>(agent, t, &self.outdir, &self.log_target, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
        explorer::{EpsilonGreedy, EpsilonGreedyConfig},
        record::scores_path,
    };
    use std::fs;
    use tempdir::TempDir;
    use test_log::test;

    fn config(outdir: &Path) -> EvaluatorConfig {
        EvaluatorConfig::default()
            .n_runs(1)
            .eval_interval(100)
            .outdir(outdir)
    }

    fn read_lines(outdir: &Path) -> Result<Vec<String>> {
        let s = fs::read_to_string(scores_path(outdir))?;
        Ok(s.lines().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_header_written_on_construction() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        fs::write(scores_path(tmp_dir.path()), "old contents\n")?;
        let agent = DummyAgent::with_stats(&[("average_q", 0.0), ("average_loss", 0.0)]);
        let env = DummyEnv::new(DummyEnvConfig::default());
        let _evaluator = Evaluator::new(&config(tmp_dir.path()), env, &agent)?;

        let lines = read_lines(tmp_dir.path())?;
        assert_eq!(
            lines,
            vec!["steps\telapsed\tmean\tmedian\tstdev\taverage_q\taverage_loss".to_string()]
        );
        Ok(())
    }

    #[test]
    fn test_evaluate_if_necessary() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default());
        let mut evaluator = Evaluator::new(&config(tmp_dir.path()), env, &agent)?;
        assert_eq!(evaluator.prev_eval_t(), 0);

        assert_eq!(evaluator.evaluate_if_necessary(50, &mut agent)?, None);
        assert_eq!(evaluator.evaluate_if_necessary(100, &mut agent)?, Some(1.0));
        assert_eq!(evaluator.prev_eval_t(), 100);
        assert_eq!(evaluator.evaluate_if_necessary(150, &mut agent)?, None);
        assert_eq!(evaluator.evaluate_if_necessary(250, &mut agent)?, Some(1.0));
        assert_eq!(evaluator.prev_eval_t(), 200);
        assert_eq!(evaluator.evaluate_if_necessary(299, &mut agent)?, None);
        assert_eq!(agent.n_stop_episodes, 2);

        let lines = read_lines(tmp_dir.path())?;
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("100\t"));
        assert!(lines[2].starts_with("250\t"));
        assert!(lines[2].ends_with("\t1.0\t1.0\t0.0"));
        Ok(())
    }

    #[test]
    fn test_step_offset() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default());
        let config = config(tmp_dir.path()).step_offset(250);
        let mut evaluator = Evaluator::new(&config, env, &agent)?;
        assert_eq!(evaluator.prev_eval_t(), 200);

        assert_eq!(evaluator.evaluate_if_necessary(299, &mut agent)?, None);
        assert!(evaluator.evaluate_if_necessary(300, &mut agent)?.is_some());
        Ok(())
    }

    #[test]
    fn test_best_model_strictly_greater() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env_config = DummyEnvConfig::default().episode_rewards(vec![1.0, 3.0, 3.0, 2.0]);
        let env = DummyEnv::new(env_config);
        let mut evaluator = Evaluator::new(&config(tmp_dir.path()), env, &agent)?;
        assert_eq!(evaluator.max_score(), f32::MIN as f64);

        for t in &[100, 200, 300, 400] {
            evaluator.evaluate_if_necessary(*t, &mut agent)?;
        }

        assert_eq!(evaluator.max_score(), 3.0);
        assert!(tmp_dir.path().join("100").join(DummyAgent::FILE_NAME).is_file());
        assert!(tmp_dir.path().join("200").join(DummyAgent::FILE_NAME).is_file());
        assert!(!tmp_dir.path().join("300").exists());
        assert!(!tmp_dir.path().join("400").exists());
        Ok(())
    }

    #[test]
    fn test_statistics_of_multiple_runs() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::with_stats(&[("n_updates", 4.0)]);
        let env_config = DummyEnvConfig::default().episode_rewards(vec![1.0, 3.0, 2.0]);
        let env = DummyEnv::new(env_config);
        let config = config(tmp_dir.path()).n_runs(3);
        let mut evaluator = Evaluator::new(&config, env, &agent)?;

        assert_eq!(evaluator.evaluate_if_necessary(100, &mut agent)?, Some(2.0));
        let lines = read_lines(tmp_dir.path())?;
        let cols = lines[1].split('\t').collect::<Vec<_>>();
        assert_eq!(cols.len(), 6);
        assert_eq!(cols[0], "100");
        assert_eq!(&cols[2..], &["2.0", "2.0", "1.0", "4.0"]);
        Ok(())
    }

    #[test]
    fn test_with_explorer() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default().episode_len(Some(10)));
        let explorer = EpsilonGreedy::build(EpsilonGreedyConfig::default().eps(1.0))?;
        let mut evaluator =
            Evaluator::with_explorer(&config(tmp_dir.path()), env, explorer, &agent)?;

        assert_eq!(evaluator.evaluate_if_necessary(100, &mut agent)?, Some(10.0));
        assert_eq!(agent.n_samples, 0);
        Ok(())
    }

    #[test]
    fn test_max_episode_len() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default().episode_len(None));
        let config = config(tmp_dir.path()).max_episode_len(Some(5));
        let mut evaluator = Evaluator::new(&config, env, &agent)?;

        assert_eq!(evaluator.evaluate_if_necessary(100, &mut agent)?, Some(5.0));
        Ok(())
    }

    #[test]
    fn test_env_error_aborts_evaluation() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default().fail_at_step(Some(0)));
        let mut evaluator = Evaluator::new(&config(tmp_dir.path()), env, &agent)?;

        assert!(evaluator.evaluate_if_necessary(100, &mut agent).is_err());
        assert_eq!(evaluator.prev_eval_t(), 0);
        assert_eq!(read_lines(tmp_dir.path())?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_large_eval_interval() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let mut agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default());
        let config = config(tmp_dir.path()).eval_interval(usize::MAX).step_offset(10);
        let mut evaluator = Evaluator::new(&config, env, &agent)?;

        assert_eq!(evaluator.evaluate_if_necessary(100, &mut agent)?, None);
        assert_eq!(evaluator.evaluate_if_necessary(usize::MAX - 1, &mut agent)?, None);
        assert_eq!(evaluator.evaluate_if_necessary(usize::MAX, &mut agent)?, Some(1.0));
        assert_eq!(evaluator.prev_eval_t(), usize::MAX);
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default());
        let config = config(tmp_dir.path()).eval_interval(0);
        assert!(Evaluator::new(&config, env, &agent).is_err());
        assert!(!scores_path(tmp_dir.path()).exists());
        Ok(())
    }

    #[test]
    fn test_save_agent_with_suffix() -> Result<()> {
        let tmp_dir = TempDir::new("evaluator")?;
        let agent = DummyAgent::default();
        let env = DummyEnv::new(DummyEnvConfig::default());
        let evaluator = Evaluator::new(&config(tmp_dir.path()), env, &agent)?;

        let path = evaluator.save_agent(1000, &agent, "_finish")?;
        assert_eq!(path, tmp_dir.path().join("1000_finish"));
        assert!(path.join(DummyAgent::FILE_NAME).is_file());
        Ok(())
    }
}
