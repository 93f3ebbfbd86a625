//! Core functionalities.
mod agent;
mod env;
mod explorer;
mod policy;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use explorer::Explorer;
pub use policy::Policy;
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
pub trait Obs: Clone + Debug {}

/// An action of an environment.
pub trait Act: Clone + Debug {}
