//! Agent.
use super::{Env, Policy};
use anyhow::Result;
use std::path::Path;

/// Represents a policy being trained, seen from the evaluator.
///
/// Training itself happens elsewhere; the evaluator only needs to act greedily,
/// to notify the end of episodes, to read statistics and to save the agent.
pub trait Agent<E: Env>: Policy<E> {
    /// Notifies the agent that an episode ended.
    ///
    /// Agents holding episode-scoped state, like recurrent hidden states or
    /// trajectory buffers, reset it here.
    fn stop_episode(&mut self);

    /// Returns statistics of the agent as ordered name-value pairs.
    ///
    /// Names are assumed to be the same during a training run, because they
    /// are used as the columns of the scores file.
    fn get_statistics(&self) -> Vec<(String, f64)>;

    /// Save the agent in the given directory.
    ///
    /// The contents of the directory are defined by the agent.
    fn save(&self, path: &Path) -> Result<()>;
}
