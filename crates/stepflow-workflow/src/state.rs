use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use stepflow_config::{ProcessorExecutionType, ProcessorMode, RetryDef};

use crate::condition::Condition;

/// Index of a state inside its [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

/// A compiled, engine-ready state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
  /// Unique name of the state within the whole state machine.
  pub name: String,
  pub kind: StateKind,
  /// Successor. `None` ends the execution path for states that accept a
  /// successor; always `None` for fail, succeed and choice states.
  pub next: Option<StateId>,
}

impl State {
  pub fn new(name: impl Into<String>, kind: StateKind) -> Self {
    Self {
      name: name.into(),
      kind,
      next: None,
    }
  }

  /// Every state this one can transition to within its own graph.
  pub fn transitions(&self) -> Vec<StateId> {
    let mut targets: Vec<StateId> = self.next.into_iter().collect();
    match &self.kind {
      StateKind::Invoke(invoke) => targets.extend(invoke.catch.iter().map(|c| c.next)),
      StateKind::Choice(choice) => {
        targets.extend(choice.choices.iter().map(|c| c.next));
        targets.extend(choice.default);
      }
      _ => {}
    }
    targets
  }

  /// Whether this state can be wired to a successor.
  pub fn accepts_next(&self) -> bool {
    !matches!(
      self.kind,
      StateKind::Fail { .. } | StateKind::Succeed | StateKind::Choice(_)
    )
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateKind {
  Invoke(InvokeState),
  Wait { seconds: u64 },
  Fail { cause: String, error: String },
  Pass,
  Succeed,
  Choice(ChoiceState),
  Parallel(ParallelState),
  Map(MapState),
}

impl StateKind {
  /// The engine's type name for this state.
  pub fn type_name(&self) -> &'static str {
    match self {
      StateKind::Invoke(_) => "Task",
      StateKind::Wait { .. } => "Wait",
      StateKind::Fail { .. } => "Fail",
      StateKind::Pass => "Pass",
      StateKind::Succeed => "Succeed",
      StateKind::Choice(_) => "Choice",
      StateKind::Parallel(_) => "Parallel",
      StateKind::Map(_) => "Map",
    }
  }
}

/// A value in a task payload or map item selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayloadValue {
  /// A path expression evaluated by the engine at run time.
  Path(String),
  /// A literal copied into the payload.
  Literal(serde_json::Value),
}

/// Invocation of a leaf task's compute unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeState {
  /// Name of the leaf task this state was compiled from.
  pub task: String,
  /// Generated name of the compute unit to invoke.
  pub function_name: String,
  /// Projected payload. `None` forwards the whole state input.
  pub payload: Option<BTreeMap<String, PayloadValue>>,
  pub result_path: String,
  pub retry: Vec<RetryDef>,
  pub catch: Vec<Catch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
  pub error_equals: Vec<String>,
  pub next: StateId,
  pub result_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceState {
  pub choices: Vec<ChoiceBranch>,
  pub default: Option<StateId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceBranch {
  pub condition: Condition,
  pub next: StateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelState {
  /// Independent sub-graphs run concurrently by the engine.
  pub branches: Vec<StateGraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapState {
  pub items_path: String,
  pub item_selector: BTreeMap<String, PayloadValue>,
  pub max_concurrency: Option<u32>,
  pub processor: Box<StateGraph>,
  pub processor_config: ProcessorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
  pub mode: Option<ProcessorMode>,
  pub execution_type: Option<ProcessorExecutionType>,
}

/// An arena of states with a single entry point.
///
/// Leaf tasks are registered by name so that later references to an already
/// compiled task resolve to the same state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateGraph {
  start: StateId,
  states: Vec<State>,
  tasks: HashMap<String, StateId>,
}

impl StateGraph {
  pub fn new(start: StateId, states: Vec<State>, tasks: HashMap<String, StateId>) -> Self {
    Self {
      start,
      states,
      tasks,
    }
  }

  /// The entry state.
  pub fn start(&self) -> StateId {
    self.start
  }

  pub fn start_state(&self) -> Option<&State> {
    self.state(self.start)
  }

  /// Get a state by ID.
  pub fn state(&self, id: StateId) -> Option<&State> {
    self.states.get(id.0)
  }

  /// Iterate states in allocation order.
  pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
    self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
  }

  /// Find a state by its generated name.
  pub fn find(&self, name: &str) -> Option<StateId> {
    self
      .states
      .iter()
      .position(|s| s.name == name)
      .map(StateId)
  }

  /// The invoke state compiled for a leaf task.
  pub fn task_state(&self, task: &str) -> Option<StateId> {
    self.tasks.get(task).copied()
  }

  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  /// Graphs embedded by parallel and map states, one level deep.
  pub fn nested_graphs(&self) -> Vec<&StateGraph> {
    let mut nested = Vec::new();
    for state in &self.states {
      match &state.kind {
        StateKind::Parallel(parallel) => nested.extend(parallel.branches.iter()),
        StateKind::Map(map) => nested.push(map.processor.as_ref()),
        _ => {}
      }
    }
    nested
  }
}
