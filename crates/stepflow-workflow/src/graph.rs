use std::collections::{HashMap, HashSet};

use crate::state::{StateGraph, StateId};

/// Transition structure of one [`StateGraph`] for traversal and analysis.
///
/// Nested graphs (parallel branches, map processors) are not included; build
/// a separate `Graph` for each of them.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: state -> states it can transition to.
  adjacency: HashMap<StateId, Vec<StateId>>,
  /// Reverse adjacency: state -> states that transition to it.
  reverse_adjacency: HashMap<StateId, Vec<StateId>>,
  /// States with no outgoing transitions.
  terminals: Vec<StateId>,
  /// States with multiple incoming transitions.
  join_points: HashSet<StateId>,
}

impl Graph {
  /// Build the transition structure of a state graph.
  pub fn new(graph: &StateGraph) -> Self {
    let mut adjacency: HashMap<StateId, Vec<StateId>> = HashMap::new();
    let mut reverse_adjacency: HashMap<StateId, Vec<StateId>> = HashMap::new();

    // Initialize all states
    for (id, _) in graph.states() {
      adjacency.entry(id).or_default();
      reverse_adjacency.entry(id).or_default();
    }

    for (id, state) in graph.states() {
      for target in state.transitions() {
        adjacency.entry(id).or_default().push(target);
        reverse_adjacency.entry(target).or_default().push(id);
      }
    }

    let mut terminals: Vec<StateId> = adjacency
      .iter()
      .filter(|(_, outgoing)| outgoing.is_empty())
      .map(|(id, _)| *id)
      .collect();
    terminals.sort();

    let join_points: HashSet<StateId> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| *id)
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      terminals,
      join_points,
    }
  }

  /// States that end an execution path.
  pub fn terminals(&self) -> &[StateId] {
    &self.terminals
  }

  /// Get the states a given state can transition to.
  pub fn downstream(&self, id: StateId) -> &[StateId] {
    self.adjacency.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Get the states that transition to a given state.
  pub fn upstream(&self, id: StateId) -> &[StateId] {
    self
      .reverse_adjacency
      .get(&id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a state has multiple incoming transitions.
  pub fn is_join_point(&self, id: StateId) -> bool {
    self.join_points.contains(&id)
  }

  /// Total number of transitions.
  pub fn edge_count(&self) -> usize {
    self.adjacency.values().map(Vec::len).sum()
  }

  /// States reachable from `start` by following transitions.
  pub fn reachable_from(&self, start: StateId) -> HashSet<StateId> {
    let mut seen = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
      if seen.insert(id) {
        stack.extend(self.downstream(id).iter().copied());
      }
    }
    seen
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::{State, StateKind};

  fn linear_with_loop() -> StateGraph {
    // wait -> pass -> wait (cycle), plus an unreachable succeed
    let mut wait = State::new("wait_a_1", StateKind::Wait { seconds: 5 });
    wait.next = Some(StateId(1));
    let mut pass = State::new("pass_a_2", StateKind::Pass);
    pass.next = Some(StateId(0));
    let succeed = State::new("succeed_a_3", StateKind::Succeed);

    StateGraph::new(StateId(0), vec![wait, pass, succeed], HashMap::new())
  }

  #[test]
  fn test_adjacency_follows_next() {
    let graph = Graph::new(&linear_with_loop());

    assert_eq!(graph.downstream(StateId(0)), &[StateId(1)]);
    assert_eq!(graph.upstream(StateId(0)), &[StateId(1)]);
    assert_eq!(graph.edge_count(), 2);
  }

  #[test]
  fn test_terminals_and_reachability() {
    let graph = Graph::new(&linear_with_loop());

    assert_eq!(graph.terminals(), &[StateId(2)]);
    let reachable = graph.reachable_from(StateId(0));
    assert!(reachable.contains(&StateId(1)));
    assert!(!reachable.contains(&StateId(2)));
  }

  #[test]
  fn test_join_point() {
    let mut first = State::new("pass_a_1", StateKind::Pass);
    first.next = Some(StateId(2));
    let mut second = State::new("pass_a_2", StateKind::Pass);
    second.next = Some(StateId(2));
    let end = State::new("succeed_a_3", StateKind::Succeed);
    let state_graph = StateGraph::new(StateId(0), vec![first, second, end], HashMap::new());

    let graph = Graph::new(&state_graph);
    assert!(graph.is_join_point(StateId(2)));
    assert!(!graph.is_join_point(StateId(0)));
  }
}
