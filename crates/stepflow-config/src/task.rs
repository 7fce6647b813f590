use serde::{Deserialize, Serialize};

use crate::function::FunctionProps;
use crate::param::{ParamBinding, ParamSource};
use crate::validation::Validation;

/// A reference to the next node of a state machine.
///
/// A bare string names a leaf task of the same resource; an object is an
/// inline control node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
  Named(String),
  Inline(Box<TaskSpec>),
}

impl From<&str> for TaskRef {
  fn from(name: &str) -> Self {
    TaskRef::Named(name.to_string())
  }
}

impl From<TaskSpec> for TaskRef {
  fn from(spec: TaskSpec) -> Self {
    TaskRef::Inline(Box::new(spec))
  }
}

/// An inline control node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskSpec {
  /// Delay for a fixed number of seconds.
  Wait { seconds: u64, next: TaskRef },

  /// Stop the execution as failed.
  Fail { cause: String, error: String },

  /// Forward the input unchanged.
  Pass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<TaskRef>,
    #[serde(default)]
    end: bool,
  },

  /// Stop the execution successfully.
  Succeed,

  /// Branch on the first matching condition.
  Choice {
    choices: Vec<ChoiceDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<TaskRef>,
  },

  /// Run every branch concurrently, then continue.
  Parallel {
    branches: Vec<TaskRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<TaskRef>,
    #[serde(default)]
    end: bool,
  },

  /// Run the item processor resource once per element of `items_path`.
  Map {
    items_path: ParamSource,
    /// Name of a resource registered as a map iterator.
    item_processor: String,
    #[serde(
      default,
      alias = "max_currency",
      skip_serializing_if = "Option::is_none"
    )]
    max_concurrency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<TaskRef>,
  },
}

impl TaskSpec {
  /// The `type` tag of this node.
  pub fn kind(&self) -> &'static str {
    match self {
      TaskSpec::Wait { .. } => "wait",
      TaskSpec::Fail { .. } => "fail",
      TaskSpec::Pass { .. } => "pass",
      TaskSpec::Succeed => "succeed",
      TaskSpec::Choice { .. } => "choice",
      TaskSpec::Parallel { .. } => "parallel",
      TaskSpec::Map { .. } => "map",
    }
  }
}

/// A guarded choice branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDef {
  #[serde(flatten)]
  pub validation: Validation,
  pub next: TaskRef,
}

/// A named method backed by a compute unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafTaskDef {
  pub name: String,

  #[serde(default)]
  pub function: FunctionProps,

  /// Fields projected into the invocation payload.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub params: Vec<ParamBinding>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub retry: Vec<RetryDef>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub catch: Vec<CatchDef>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next: Option<TaskRef>,

  #[serde(default)]
  pub end: bool,
}

impl LeafTaskDef {
  /// A leaf with default function properties and no successor.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      function: FunctionProps::default(),
      params: Vec::new(),
      retry: Vec::new(),
      catch: Vec::new(),
      next: None,
      end: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryDef {
  pub error_equals: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interval_seconds: Option<u32>,
  #[serde(default, alias = "max_attempt", skip_serializing_if = "Option::is_none")]
  pub max_attempts: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub backoff_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchDef {
  pub error_equals: Vec<String>,
  /// A leaf name, or an inline pass, succeed or fail node.
  pub next: TaskRef,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result_path: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_leaf_with_inline_choice() {
    let leaf: LeafTaskDef = serde_json::from_value(json!({
      "name": "check",
      "next": {
        "type": "choice",
        "choices": [
          { "mode": "booleanEquals", "variable": "ok", "value": true, "next": "ship" }
        ],
        "default": { "type": "fail", "cause": "bad", "error": "Invalid" }
      }
    }))
    .unwrap();

    match leaf.next {
      Some(TaskRef::Inline(spec)) => match *spec {
        TaskSpec::Choice { choices, default } => {
          assert_eq!(choices.len(), 1);
          assert_eq!(choices[0].next, TaskRef::Named("ship".to_string()));
          assert_eq!(choices[0].validation.mode(), "booleanEquals");
          assert!(matches!(default, Some(TaskRef::Inline(_))));
        }
        other => panic!("expected choice, got {:?}", other),
      },
      other => panic!("expected inline next, got {:?}", other),
    }
  }

  #[test]
  fn test_map_accepts_legacy_concurrency_key() {
    let spec: TaskSpec = serde_json::from_value(json!({
      "type": "map",
      "items_path": "$",
      "item_processor": "ProcessItem",
      "max_currency": 4
    }))
    .unwrap();

    assert!(matches!(
      spec,
      TaskSpec::Map {
        max_concurrency: Some(4),
        ..
      }
    ));
  }

  #[test]
  fn test_succeed_has_only_a_tag() {
    let spec: TaskSpec = serde_json::from_value(json!({ "type": "succeed" })).unwrap();
    assert_eq!(spec, TaskSpec::Succeed);
    assert_eq!(spec.kind(), "succeed");
  }

  #[test]
  fn test_leaf_defaults() {
    let leaf: LeafTaskDef = serde_json::from_value(json!({ "name": "solo" })).unwrap();
    assert_eq!(leaf, LeafTaskDef::new("solo"));
    assert!(!leaf.end);
  }
}
