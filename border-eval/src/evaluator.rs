//! Evaluate an [`Agent`](crate::Agent) periodically during training.
mod base;
mod config;
pub use base::Evaluator;
pub use config::EvaluatorConfig;
