use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::state::StateGraph;

/// A compiled state machine ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
  pub name: String,
  pub graph: StateGraph,
}

impl StateMachine {
  pub fn new(name: impl Into<String>, graph: StateGraph) -> Self {
    Self {
      name: name.into(),
      graph,
    }
  }

  /// Build the transition structure of the top-level graph.
  pub fn transitions(&self) -> Graph {
    Graph::new(&self.graph)
  }

  /// Names of every state, nested graphs included, in depth-first order.
  pub fn state_names(&self) -> Vec<&str> {
    let mut names = Vec::new();
    collect_names(&self.graph, &mut names);
    names
  }

  /// Check that state names are unique across the whole machine and that
  /// every transition stays inside its own graph.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for name in self.state_names() {
      if !seen.insert(name) {
        return Err(WorkflowError::DuplicateStateName(name.to_string()));
      }
    }
    validate_transitions(&self.graph)
  }
}

fn collect_names<'a>(graph: &'a StateGraph, names: &mut Vec<&'a str>) {
  for (_, state) in graph.states() {
    names.push(state.name.as_str());
  }
  for nested in graph.nested_graphs() {
    collect_names(nested, names);
  }
}

fn validate_transitions(graph: &StateGraph) -> Result<(), WorkflowError> {
  for (_, state) in graph.states() {
    for target in state.transitions() {
      if graph.state(target).is_none() {
        return Err(WorkflowError::DanglingTransition {
          state: state.name.clone(),
          target: target.0,
        });
      }
    }
  }
  for nested in graph.nested_graphs() {
    validate_transitions(nested)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::state::{ParallelState, State, StateId, StateKind};

  fn single(name: &str) -> StateGraph {
    StateGraph::new(
      StateId(0),
      vec![State::new(name, StateKind::Succeed)],
      HashMap::new(),
    )
  }

  #[test]
  fn test_duplicate_names_across_branches() {
    let parallel = State::new(
      "parallel_a_1",
      StateKind::Parallel(ParallelState {
        branches: vec![single("succeed_a_2"), single("succeed_a_2")],
      }),
    );
    let machine = StateMachine::new(
      "Orders",
      StateGraph::new(StateId(0), vec![parallel], HashMap::new()),
    );

    assert_eq!(
      machine.state_names(),
      vec!["parallel_a_1", "succeed_a_2", "succeed_a_2"]
    );
    assert!(matches!(
      machine.validate(),
      Err(WorkflowError::DuplicateStateName(name)) if name == "succeed_a_2"
    ));
  }

  #[test]
  fn test_dangling_transition() {
    let mut pass = State::new("pass_a_1", StateKind::Pass);
    pass.next = Some(StateId(7));
    let machine = StateMachine::new(
      "Orders",
      StateGraph::new(StateId(0), vec![pass], HashMap::new()),
    );

    assert!(matches!(
      machine.validate(),
      Err(WorkflowError::DanglingTransition { target: 7, .. })
    ));
  }

  #[test]
  fn test_valid_machine() {
    let machine = StateMachine::new("Orders", single("succeed_a_1"));
    assert!(machine.validate().is_ok());
    assert_eq!(machine.transitions().terminals(), &[StateId(0)]);
  }
}
