//! Explorer.
use super::Env;

/// Perturbs the greedy policy of an agent during evaluation episodes.
pub trait Explorer<E: Env> {
    /// Selects an action at time step `t` of the current episode.
    ///
    /// `greedy_action` produces the action of the agent for the current
    /// observation. Explorers not taking the greedy action may skip calling it.
    fn select_action(&mut self, t: usize, greedy_action: &mut dyn FnMut() -> E::Act) -> E::Act;
}
