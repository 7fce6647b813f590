//! Stepflow Workflow
//!
//! This crate provides the compiled representation of a state machine.
//! A compiled state machine is the validated, engine-ready form of the
//! declarative task specifications found in `stepflow-config`.
//!
//! Key differences from `stepflow-config`:
//! - Every node is a concrete [`State`] with a unique, generated name
//! - Transitions point at states by [`StateId`] inside one [`StateGraph`] arena
//! - Parameter references are resolved to path expressions
//! - Choice validations are translated to engine [`Condition`]s
//! - Ready to be rendered as an Amazon States Language definition

mod condition;
mod definition;
mod error;
mod graph;
mod machine;
mod state;

pub use condition::{Condition, ComparisonOperator, Operand};
pub use error::WorkflowError;
pub use graph::Graph;
pub use machine::StateMachine;
pub use state::{
  Catch, ChoiceBranch, ChoiceState, InvokeState, MapState, ParallelState, PayloadValue,
  ProcessorConfig, State, StateGraph, StateId, StateKind,
};
