//! Stepflow Compute
//!
//! The seam between the state machine compiler and whatever provisions the
//! invocable units backing leaf tasks. The compiler asks a [`ComputeFactory`]
//! for one unit per leaf and only ever sees the returned [`ComputeHandle`].

mod error;
mod factory;
mod local;

pub use error::ComputeError;
pub use factory::{ComputeFactory, ComputeHandle, ComputeRequest};
pub use local::LocalComputeFactory;
