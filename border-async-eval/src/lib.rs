//! Evaluator shared among asynchronous training workers.
//!
//! Workers, each owning an agent and an environment, share an
//! [`AsyncEvaluator`] through `Arc` and call
//! [`AsyncEvaluator::evaluate_if_necessary`] in their training loops.
//! The evaluator is configured with
//! [`EvaluatorConfig`](border_eval::EvaluatorConfig), like the single-process
//! [`Evaluator`](border_eval::Evaluator).
mod async_evaluator;
pub use async_evaluator::AsyncEvaluator;
pub use border_eval::EvaluatorConfig;
