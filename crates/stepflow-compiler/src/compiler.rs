//! The task graph compiler.
//!
//! Compilation is a recursive descent over the `next` relation of a
//! resource's task specifications. Every control node becomes one state;
//! every named leaf becomes one invoke state per graph scope, registered by
//! name before its successors are compiled so that later references,
//! including cyclic ones, reuse it.
//!
//! Graph scopes are the root of a unit, each parallel branch and each map
//! processor. A map processor is a separate compilation unit with its own
//! [`NameAllocator`]; parallel branches share the allocator of their unit.

use std::collections::{BTreeMap, HashMap, HashSet};

use stepflow_compute::ComputeHandle;
use stepflow_config::{LeafTaskDef, Manifest, ResourceDef, ResourceKind, TaskRef, TaskSpec};
use stepflow_workflow::{
  Catch, ChoiceBranch, ChoiceState, InvokeState, MapState, ParallelState, PayloadValue,
  ProcessorConfig, State, StateGraph, StateId, StateKind,
};
use tracing::{debug, warn};

use crate::condition::translate;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::naming::NameAllocator;
use crate::param::{resolve, resolve_source};

/// Prefix of invoke state names.
const INVOKE_PREFIX: &str = "task";

/// Supplies the compute unit name of each leaf task the compiler reaches.
pub trait UnitSource {
  /// `None` when the leaf has no unit.
  fn function_name(&mut self, resource: &ResourceDef, task: &LeafTaskDef) -> Option<String>;
}

/// Provisioned compute units, keyed by resource and leaf task.
#[derive(Debug, Clone, Default)]
pub struct ComputeUnits {
  units: HashMap<(String, String), ComputeHandle>,
}

impl ComputeUnits {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, resource: impl Into<String>, task: impl Into<String>, handle: ComputeHandle) {
    self.units.insert((resource.into(), task.into()), handle);
  }

  pub fn get(&self, resource: &str, task: &str) -> Option<&ComputeHandle> {
    self.units.get(&(resource.to_string(), task.to_string()))
  }

  pub fn len(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  /// Every handle, ordered by function name.
  pub fn handles(&self) -> Vec<ComputeHandle> {
    let mut handles: Vec<ComputeHandle> = self.units.values().cloned().collect();
    handles.sort_by(|a, b| a.function_name.cmp(&b.function_name));
    handles
  }
}

impl UnitSource for ComputeUnits {
  fn function_name(&mut self, resource: &ResourceDef, task: &LeafTaskDef) -> Option<String> {
    self
      .get(&resource.name, &task.name)
      .map(|handle| handle.function_name.clone())
  }
}

/// States of one graph scope under construction.
#[derive(Default)]
struct Scope {
  states: Vec<State>,
  tasks: HashMap<String, StateId>,
}

impl Scope {
  /// Add a state whose kind and successor are filled in later.
  fn reserve(&mut self, name: String) -> StateId {
    let id = StateId(self.states.len());
    debug!(state = %name, "allocated state");
    self.states.push(State::new(name, StateKind::Pass));
    id
  }

  fn fill(&mut self, id: StateId, kind: StateKind, next: Option<StateId>) {
    let state = &mut self.states[id.0];
    state.kind = kind;
    state.next = next;
  }

  fn name(&self, id: StateId) -> &str {
    &self.states[id.0].name
  }

  fn into_graph(self, start: StateId) -> StateGraph {
    StateGraph::new(start, self.states, self.tasks)
  }
}

/// Compiles resources of one manifest against a source of compute units.
pub struct TaskGraphCompiler<'a, U: UnitSource> {
  manifest: &'a Manifest,
  config: &'a CompilerConfig,
  units: &'a mut U,
  /// Units currently being compiled, outermost first.
  units_in_progress: Vec<String>,
}

impl<'a, U: UnitSource> TaskGraphCompiler<'a, U> {
  pub fn new(manifest: &'a Manifest, config: &'a CompilerConfig, units: &'a mut U) -> Self {
    Self {
      manifest,
      config,
      units,
      units_in_progress: Vec::new(),
    }
  }

  /// Compile a state machine resource from its start specification.
  pub fn compile(&mut self, resource: &'a ResourceDef) -> Result<StateGraph, CompileError> {
    if !resource.is_state_machine() {
      return Err(CompileError::NotAStateMachine {
        resource: resource.name.clone(),
        found: resource.kind.tag().to_string(),
      });
    }
    let entry = entry_name(resource.start_at(), &format!("start-{}", resource.name));
    self.compile_unit(resource, &entry, resource.start_at())
  }

  /// Compile one independent unit: a task registry (the resource's leaf
  /// tasks) entered at `entry`, with a fresh name allocator.
  pub fn compile_unit(
    &mut self,
    resource: &'a ResourceDef,
    entry_name: &str,
    entry: &'a TaskRef,
  ) -> Result<StateGraph, CompileError> {
    check_unique_tasks(resource)?;

    self.units_in_progress.push(resource.name.clone());
    let mut names = NameAllocator::new();
    let graph = self.compile_graph(resource, &mut names, entry, entry_name);
    self.units_in_progress.pop();

    let graph = graph?;
    debug!(
      resource = %resource.name,
      states = graph.len(),
      "compiled unit"
    );
    Ok(graph)
  }

  fn compile_graph(
    &mut self,
    resource: &'a ResourceDef,
    names: &mut NameAllocator,
    entry: &'a TaskRef,
    origin: &str,
  ) -> Result<StateGraph, CompileError> {
    let mut scope = Scope::default();
    let start = self.compile_ref(resource, names, &mut scope, entry, origin)?;
    Ok(scope.into_graph(start))
  }

  fn compile_ref(
    &mut self,
    resource: &'a ResourceDef,
    names: &mut NameAllocator,
    scope: &mut Scope,
    target: &'a TaskRef,
    origin: &str,
  ) -> Result<StateId, CompileError> {
    match target {
      TaskRef::Named(name) => self.compile_leaf(resource, names, scope, name),
      TaskRef::Inline(spec) => self.compile_spec(resource, names, scope, spec, origin),
    }
  }

  /// Compile an optional successor. `None` means the path ends here.
  fn compile_next(
    &mut self,
    resource: &'a ResourceDef,
    names: &mut NameAllocator,
    scope: &mut Scope,
    next: Option<&'a TaskRef>,
    end: bool,
    origin: &str,
  ) -> Result<Option<StateId>, CompileError> {
    if end {
      if next.is_some() {
        warn!(resource = %resource.name, task = %origin, "end is set, ignoring next");
      }
      return Ok(None);
    }
    match next {
      Some(next) => self
        .compile_ref(resource, names, scope, next, origin)
        .map(Some),
      None => Ok(None),
    }
  }

  fn compile_leaf(
    &mut self,
    resource: &'a ResourceDef,
    names: &mut NameAllocator,
    scope: &mut Scope,
    name: &str,
  ) -> Result<StateId, CompileError> {
    if let Some(id) = scope.tasks.get(name) {
      return Ok(*id);
    }

    let task = resource.task(name).ok_or_else(|| CompileError::UnknownTask {
      resource: resource.name.clone(),
      task: name.to_string(),
    })?;
    let function_name = self
      .units
      .function_name(resource, task)
      .ok_or_else(|| CompileError::MissingComputeUnit {
        resource: resource.name.clone(),
        task: name.to_string(),
      })?;

    let id = scope.reserve(format!("{}-{}", INVOKE_PREFIX, task.name));
    scope.tasks.insert(task.name.clone(), id);

    let mut catch = Vec::with_capacity(task.catch.len());
    for rule in &task.catch {
      let next = self.compile_ref(resource, names, scope, &rule.next, &task.name)?;
      catch.push(Catch {
        error_equals: rule.error_equals.clone(),
        next,
        result_path: rule.result_path.clone(),
      });
    }
    let next = self.compile_next(
      resource,
      names,
      scope,
      task.next.as_ref(),
      task.end,
      &task.name,
    )?;

    let payload = if task.params.is_empty() {
      None
    } else {
      Some(
        task
          .params
          .iter()
          .map(|binding| {
            (
              binding.name.clone(),
              resolve(&binding.reference, Some(&binding.name)),
            )
          })
          .collect(),
      )
    };

    let kind = StateKind::Invoke(InvokeState {
      task: task.name.clone(),
      function_name,
      payload,
      result_path: self.config.result_path.clone(),
      retry: task.retry.clone(),
      catch,
    });
    scope.fill(id, kind, next);
    Ok(id)
  }

  fn compile_spec(
    &mut self,
    resource: &'a ResourceDef,
    names: &mut NameAllocator,
    scope: &mut Scope,
    spec: &'a TaskSpec,
    origin: &str,
  ) -> Result<StateId, CompileError> {
    let id = scope.reserve(names.allocate(spec.kind(), origin));

    let (kind, next) = match spec {
      TaskSpec::Wait { seconds, next } => {
        let next = self.compile_ref(resource, names, scope, next, origin)?;
        (StateKind::Wait { seconds: *seconds }, Some(next))
      }
      TaskSpec::Fail { cause, error } => (
        StateKind::Fail {
          cause: cause.clone(),
          error: error.clone(),
        },
        None,
      ),
      TaskSpec::Pass { next, end } => {
        let next = self.compile_next(resource, names, scope, next.as_ref(), *end, origin)?;
        (StateKind::Pass, next)
      }
      TaskSpec::Succeed => (StateKind::Succeed, None),
      TaskSpec::Choice { choices, default } => {
        if choices.is_empty() {
          return Err(CompileError::EmptyChoice {
            resource: resource.name.clone(),
            task: origin.to_string(),
          });
        }
        let mut branches = Vec::with_capacity(choices.len());
        for choice in choices {
          let condition =
            translate(&choice.validation).map_err(|source| CompileError::Condition {
              resource: resource.name.clone(),
              task: origin.to_string(),
              source,
            })?;
          let next = self.compile_ref(resource, names, scope, &choice.next, origin)?;
          branches.push(ChoiceBranch { condition, next });
        }
        let default = match default {
          Some(default) => Some(self.compile_ref(resource, names, scope, default, origin)?),
          None => None,
        };
        (
          StateKind::Choice(ChoiceState {
            choices: branches,
            default,
          }),
          None,
        )
      }
      TaskSpec::Parallel {
        branches,
        next,
        end,
      } => {
        if branches.is_empty() {
          return Err(CompileError::EmptyParallel {
            resource: resource.name.clone(),
            task: origin.to_string(),
          });
        }
        let branches = branches
          .iter()
          .map(|branch| self.compile_graph(resource, names, branch, origin))
          .collect::<Result<Vec<_>, _>>()?;
        let next = self.compile_next(resource, names, scope, next.as_ref(), *end, origin)?;
        (StateKind::Parallel(ParallelState { branches }), next)
      }
      TaskSpec::Map {
        items_path,
        item_processor,
        max_concurrency,
        next,
      } => {
        let items_path = match resolve_source(items_path) {
          PayloadValue::Path(path) => path,
          PayloadValue::Literal(_) => {
            return Err(CompileError::LiteralItemsPath {
              resource: resource.name.clone(),
              task: origin.to_string(),
            });
          }
        };
        let iterator = self.iterator(resource, item_processor)?;
        let processor_config = match &iterator.kind {
          ResourceKind::MapIterator {
            mode,
            execution_type,
            ..
          } => ProcessorConfig {
            mode: *mode,
            execution_type: *execution_type,
          },
          ResourceKind::StateMachine { .. } => ProcessorConfig::default(),
        };

        let entry = entry_name(iterator.start_at(), &format!("start-{}", scope.name(id)));
        let processor = self.compile_unit(iterator, &entry, iterator.start_at())?;
        let next = self.compile_next(resource, names, scope, next.as_ref(), false, origin)?;

        let mut item_selector = BTreeMap::new();
        item_selector.insert(
          "index".to_string(),
          PayloadValue::Path("$$.Map.Item.Index".to_string()),
        );
        item_selector.insert(
          "value".to_string(),
          PayloadValue::Path("$$.Map.Item.Value".to_string()),
        );

        (
          StateKind::Map(MapState {
            items_path,
            item_selector,
            max_concurrency: *max_concurrency,
            processor: Box::new(processor),
            processor_config,
          }),
          next,
        )
      }
    };

    scope.fill(id, kind, next);
    Ok(id)
  }

  /// Look up a map's item processor and check it can be embedded.
  fn iterator(
    &self,
    resource: &ResourceDef,
    name: &str,
  ) -> Result<&'a ResourceDef, CompileError> {
    let iterator = self
      .manifest
      .resource(name)
      .ok_or_else(|| CompileError::ResourceNotFound {
        resource: name.to_string(),
      })?;
    if !iterator.is_map_iterator() {
      return Err(CompileError::NotAMapIterator {
        resource: resource.name.clone(),
        iterator: name.to_string(),
        found: iterator.kind.tag().to_string(),
      });
    }
    if self.units_in_progress.iter().any(|unit| unit == name) {
      return Err(CompileError::RecursiveIterator {
        resource: resource.name.clone(),
        iterator: name.to_string(),
      });
    }
    Ok(iterator)
  }
}

/// Origin name of a unit's entry: the leaf name, or `fallback` when the
/// unit starts with an inline specification.
fn entry_name(start_at: &TaskRef, fallback: &str) -> String {
  match start_at {
    TaskRef::Named(name) => name.clone(),
    TaskRef::Inline(_) => fallback.to_string(),
  }
}

fn check_unique_tasks(resource: &ResourceDef) -> Result<(), CompileError> {
  let mut seen = HashSet::new();
  for task in &resource.tasks {
    if !seen.insert(task.name.as_str()) {
      return Err(CompileError::DuplicateTask {
        resource: resource.name.clone(),
        task: task.name.clone(),
      });
    }
  }
  Ok(())
}
