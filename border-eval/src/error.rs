//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Invalid configuration of an evaluator.
    #[error("Invalid evaluator configuration: {0}")]
    InvalidConfig(String),

    /// A lock guarding state shared among workers was poisoned.
    #[error("Lock of {0} is poisoned")]
    LockPoisoned(&'static str),
}
