use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("state name used more than once: {0}")]
  DuplicateStateName(String),

  #[error("state '{state}' transitions to a state outside its graph (index {target})")]
  DanglingTransition { state: String, target: usize },
}
