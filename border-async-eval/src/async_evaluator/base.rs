use anyhow::Result;
use border_eval::{
    error::EvalError,
    record::{record_stats, scores_path, write_header, ScoreRow},
    util::{eval_performance, update_best_model},
    Agent, Env, EvaluatorConfig, Explorer,
};
use log::debug;
use std::{
    fs::OpenOptions,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::SystemTime,
};

fn lock<'a, T>(m: &'a Mutex<T>, name: &'static str) -> Result<MutexGuard<'a, T>> {
    m.lock().map_err(|_| EvalError::LockPoisoned(name).into())
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Evaluator shared among training workers running asynchronously.
///
/// Each worker owns an agent and an environment, and calls
/// [`AsyncEvaluator::evaluate_if_necessary`] through an `Arc<AsyncEvaluator>`.
/// Workers exploring in evaluation episodes also own their explorers and call
/// [`AsyncEvaluator::evaluate_if_necessary_with_explorer`], so that the state of
/// each explorer carries over between evaluations of that worker.
/// The state of the evaluator is kept in independent locks:
///
/// ```mermaid
/// graph LR
///     W1[Worker 1] -->|claim| P[prev_eval_t]
///     W2[Worker 2] -->|claim| P
///     W1 -->|first caller| H[wrote_header]
///     W2 -->|first caller| H
///     W1 -->|compare and save| M[max_score]
///     W2 -->|compare and save| M
/// ```
///
/// * `prev_eval_t`: a worker whose step `t` satisfies `t >= prev_eval_t + eval_interval`
///   advances it by `eval_interval` and claims the evaluation. Only one worker
///   claims each window. The evaluation itself runs without holding any lock.
/// * `wrote_header`: the header of the scores file is written by the first
///   worker claiming an evaluation, as agents are not available at construction.
/// * `max_score`: the best score is compared and updated, and the agent is saved,
///   while holding this lock. Saves of best models never overlap.
///
/// Rows of the scores file are appended under another lock, so that rows of
/// concurrent evaluations are not interleaved.
pub struct AsyncEvaluator<E: Env> {
    n_runs: usize,
    eval_interval: usize,
    outdir: PathBuf,
    max_episode_len: Option<usize>,
    log_target: String,
    start_time: SystemTime,
    prev_eval_t: Mutex<usize>,
    max_score: Mutex<f64>,
    wrote_header: Mutex<bool>,
    scores_lock: Mutex<()>,
    phantom: PhantomData<fn() -> E>,
}

impl<E: Env> AsyncEvaluator<E> {
    /// Constructs an evaluator.
    ///
    /// The scores file is created if it does not exist. Its header is written
    /// by the first worker claiming an evaluation.
    pub fn new(config: &EvaluatorConfig) -> Result<Self> {
        config.validate()?;

        // Creates the scores file, the header is written later
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(scores_path(&config.outdir))?;

        Ok(Self {
            n_runs: config.n_runs,
            eval_interval: config.eval_interval,
            outdir: config.outdir.clone(),
            max_episode_len: config.max_episode_len,
            log_target: config.log_target_or_default().to_string(),
            start_time: SystemTime::now(),
            prev_eval_t: Mutex::new(config.initial_eval_t()),
            max_score: Mutex::new(f32::MIN as f64),
            wrote_header: Mutex::new(false),
            scores_lock: Mutex::new(()),
            phantom: PhantomData,
        })
    }

    /// The best mean score so far.
    pub fn max_score(&self) -> Result<f64> {
        Ok(*lock(&self.max_score, "max_score")?)
    }

    /// Environment steps of the last claimed evaluation window.
    pub fn prev_eval_t(&self) -> Result<usize> {
        Ok(*lock(&self.prev_eval_t, "prev_eval_t")?)
    }

    /// Directory where the scores file and agents are saved.
    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Writes the header of the scores file with the statistics of `agent`.
    pub fn write_header<A: Agent<E>>(&self, agent: &A) -> Result<()> {
        write_header(&self.outdir, &agent.get_statistics())
    }

    /// Runs an evaluation, records its result and saves the agent if it is the best so far.
    ///
    /// Returns the mean score.
    pub fn evaluate_and_update_max_score<A: Agent<E>>(
        &self,
        t: usize,
        env: &mut E,
        agent: &mut A,
        explorer: Option<&mut dyn Explorer<E>>,
    ) -> Result<f64> {
        let result = eval_performance(
            env,
            agent,
            self.n_runs,
            self.max_episode_len,
            explorer,
            &self.log_target,
        )?;
        let row = ScoreRow {
            step: t,
            elapsed: self.start_time.elapsed()?.as_secs_f64(),
            result,
            agent_stats: agent.get_statistics(),
        };
        {
            let _guard = lock(&self.scores_lock, "scores")?;
            record_stats(&self.outdir, &row.values())?;
        }

        let mut max_score = lock(&self.max_score, "max_score")?;
        if result.mean > *max_score {
            update_best_model::<E, A>(
                agent,
                &self.outdir,
                t,
                *max_score,
                result.mean,
                &self.log_target,
            )?;
            *max_score = result.mean;
        }

        Ok(result.mean)
    }

    /// Evaluates the agent greedily if this call claims an evaluation window.
    ///
    /// Returns the mean score, or `None` if no evaluation was done.
    pub fn evaluate_if_necessary<A: Agent<E>>(
        &self,
        t: usize,
        env: &mut E,
        agent: &mut A,
    ) -> Result<Option<f64>> {
        self.claim_and_evaluate(t, env, agent, None)
    }

    /// Evaluates the agent with `explorer` if this call claims an evaluation window.
    ///
    /// `explorer` is owned by the calling worker and keeps its state between calls.
    pub fn evaluate_if_necessary_with_explorer<A: Agent<E>>(
        &self,
        t: usize,
        env: &mut E,
        agent: &mut A,
        explorer: &mut dyn Explorer<E>,
    ) -> Result<Option<f64>> {
        self.claim_and_evaluate(t, env, agent, Some(explorer))
    }

    fn claim_and_evaluate<A: Agent<E>>(
        &self,
        t: usize,
        env: &mut E,
        agent: &mut A,
        explorer: Option<&mut dyn Explorer<E>>,
    ) -> Result<Option<f64>> {
        let necessary = {
            let mut prev_eval_t = lock(&self.prev_eval_t, "prev_eval_t")?;
            let next_eval_t = prev_eval_t.saturating_add(self.eval_interval);
            if t >= next_eval_t {
                *prev_eval_t = next_eval_t;
                true
            } else {
                false
            }
        };
        if !necessary {
            return Ok(None);
        }

        {
            let mut wrote_header = lock(&self.wrote_header, "wrote_header")?;
            if !*wrote_header {
                self.write_header(agent)?;
                *wrote_header = true;
            }
        }

        debug!(target: self.log_target.as_str(), "Starts evaluation at step {}", t);
        self.evaluate_and_update_max_score(t, env, agent, explorer)
            .map(Some)
    }
}
