//! Stepflow Compiler
//!
//! Turns the declarative resources of a [`stepflow_config::Manifest`] into
//! validated [`stepflow_workflow::StateMachine`]s.
//!
//! Compiling a resource runs in three phases:
//! 1. Plan: walk the task graph without provisioning anything, collecting
//!    the leaf tasks that need a compute unit and surfacing every
//!    configuration error
//! 2. Provision: ask the [`stepflow_compute::ComputeFactory`] for one unit
//!    per planned leaf
//! 3. Compile: walk the task graph again against the provisioned units and
//!    validate the resulting state machine

mod compiler;
mod condition;
mod config;
mod error;
mod naming;
mod param;
mod plan;
mod standard;

pub use compiler::{ComputeUnits, TaskGraphCompiler, UnitSource};
pub use condition::translate;
pub use config::CompilerConfig;
pub use error::{CompileError, ConditionError};
pub use naming::NameAllocator;
pub use param::{resolve, resolve_source};
pub use plan::Plan;
pub use standard::{CompiledMachine, Compiler, StandardCompiler};
