//! Stepflow Config
//!
//! This crate contains the serializable declarative types for stepflow.
//! These types describe state machines before they are compiled: the
//! resources, their leaf tasks, and the task specifications that link them.
//!
//! A [`Manifest`] is the registration output of the annotation layer. It is
//! built once before compilation starts and is read-only from then on.
//!
//! Manifests can be loaded from:
//! - JSON files (via CLI with `stepflow compile manifest.json`)
//! - Programmatic registration (`Manifest::register`)

mod enums;
mod function;
mod manifest;
mod param;
mod resource;
mod task;
mod validation;

pub use enums::{CombinatorMode, ProcessorExecutionType, ProcessorMode};
pub use function::{EnvVar, FunctionProps, NodeRuntime};
pub use manifest::Manifest;
pub use param::{
  ExecutionField, MapField, ParamBinding, ParamRef, ParamSource, StateField, StateMachineField,
  TaskField,
};
pub use resource::{ResourceDef, ResourceKind, SourceLocation};
pub use task::{CatchDef, ChoiceDef, LeafTaskDef, RetryDef, TaskRef, TaskSpec};
pub use validation::Validation;
