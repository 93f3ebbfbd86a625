#![warn(missing_docs)]
//! Periodic evaluation of reinforcement learning agents during training.
//!
//! A training loop calls [`Evaluator::evaluate_if_necessary`] with the current
//! environment steps. Every `eval_interval` steps, the agent is evaluated on
//! `n_runs` episodes, the statistics of the scores are appended to
//! `(outdir)/scores.txt`, and the agent is saved if its mean score is the best so far.
//!
//! The evaluator shared among asynchronous training workers is provided in
//! `border-async-eval`, built on the helpers in [`util`] and [`record`].
pub mod dummy;
pub mod error;
pub mod explorer;
pub mod record;
pub mod util;

mod base;
pub use base::{Act, Agent, Env, Explorer, Info, Obs, Policy, Step};

mod evaluator;
pub use evaluator::{Evaluator, EvaluatorConfig};
