//! Core functionalities.
mod env;
mod policy;
mod step;
pub use env::Env;
pub use policy::{Configurable, Policy};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Environments in this library are not vectorized, so an observation
/// always describes a single agent.
pub trait Obs: Clone + Debug {
    /// Returns the number of observations in the object.
    ///
    /// Implementations for non-vectorized environments return 1.
    fn len(&self) -> usize;
}

/// An action of an environment.
pub trait Act: Clone + Debug {
    /// Returns the number of actions in the object.
    fn len(&self) -> usize;
}
