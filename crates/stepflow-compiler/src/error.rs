use thiserror::Error;

/// Errors that can occur while translating a choice validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
  /// The `mode` string names no known comparison.
  #[error("unknown condition mode: {mode}")]
  UnknownMode { mode: String },

  /// An `and`/`or` combinator without children.
  #[error("'{mode}' condition requires at least one child condition")]
  EmptyCombinator { mode: String },

  /// A custom literal used where a path is required.
  #[error("'{mode}' condition variable must reference a path, not a literal")]
  LiteralVariable { mode: String },

  /// A comparison mode without a value to compare against.
  #[error("'{mode}' condition requires a value")]
  MissingValue { mode: String },

  /// A `*JsonPath` comparison whose value is not a path string.
  #[error("'{mode}' condition value must be a path string")]
  InvalidPathOperand { mode: String },
}

/// Errors that can occur while compiling a resource.
///
/// Every variant names the resource, and where it applies the task, that
/// caused it.
#[derive(Debug, Error)]
pub enum CompileError {
  /// No resource with this name is registered.
  #[error("resource not found: {resource}")]
  ResourceNotFound { resource: String },

  /// Two resources of one manifest share a name.
  #[error("duplicate resource: {resource}")]
  DuplicateResource { resource: String },

  /// Only state machine resources compile at the top level.
  #[error("resource '{resource}' is a {found}, not a state machine")]
  NotAStateMachine { resource: String, found: String },

  /// A map's item processor is not tagged as a map iterator.
  #[error("item processor '{iterator}' of map in '{resource}' is a {found}, not a map iterator")]
  NotAMapIterator {
    resource: String,
    iterator: String,
    found: String,
  },

  /// A map iterator that embeds itself, directly or indirectly.
  #[error("map iterator '{iterator}' embeds itself (from '{resource}')")]
  RecursiveIterator { resource: String, iterator: String },

  /// A named reference to a leaf task the resource does not declare.
  #[error("task '{task}' not found in resource '{resource}'")]
  UnknownTask { resource: String, task: String },

  /// Two leaf tasks of one resource share a name.
  #[error("duplicate task '{task}' in resource '{resource}'")]
  DuplicateTask { resource: String, task: String },

  /// A choice validation could not be translated.
  #[error("invalid condition in '{resource}' at task '{task}': {source}")]
  Condition {
    resource: String,
    task: String,
    #[source]
    source: ConditionError,
  },

  /// A choice state without any guarded branch.
  #[error("choice in '{resource}' at task '{task}' has no branches")]
  EmptyChoice { resource: String, task: String },

  /// A parallel state without any branch.
  #[error("parallel in '{resource}' at task '{task}' has no branches")]
  EmptyParallel { resource: String, task: String },

  /// A map whose items source is a custom literal.
  #[error("map in '{resource}' at task '{task}' must read its items from a path")]
  LiteralItemsPath { resource: String, task: String },

  /// No compute unit was provisioned for a leaf task.
  #[error("no compute unit provisioned for task '{task}' in resource '{resource}'")]
  MissingComputeUnit { resource: String, task: String },

  /// The compute factory failed to provision a unit.
  #[error("compute error: {0}")]
  Compute(#[from] stepflow_compute::ComputeError),

  /// The compiled state machine is malformed.
  #[error("invalid state machine '{resource}': {source}")]
  Workflow {
    resource: String,
    #[source]
    source: stepflow_workflow::WorkflowError,
  },
}
