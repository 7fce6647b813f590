use serde::{Deserialize, Serialize};

use crate::enums::{ProcessorExecutionType, ProcessorMode};
use crate::task::{LeafTaskDef, TaskRef};

/// Where a resource's handler code lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
  /// Directory holding the built handler files.
  pub folder: String,
  /// File name without extension, e.g. "orders" for `orders.js`.
  pub file: String,
}

/// A state machine, or a map iterator embedded by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
  pub name: String,
  pub source: SourceLocation,
  #[serde(flatten)]
  pub kind: ResourceKind,
  #[serde(default)]
  pub tasks: Vec<LeafTaskDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKind {
  StateMachine {
    start_at: TaskRef,
  },
  MapIterator {
    start_at: TaskRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<ProcessorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    execution_type: Option<ProcessorExecutionType>,
  },
}

impl ResourceKind {
  /// The `type` tag of this resource.
  pub fn tag(&self) -> &'static str {
    match self {
      ResourceKind::StateMachine { .. } => "state_machine",
      ResourceKind::MapIterator { .. } => "map_iterator",
    }
  }
}

impl ResourceDef {
  pub fn start_at(&self) -> &TaskRef {
    match &self.kind {
      ResourceKind::StateMachine { start_at } | ResourceKind::MapIterator { start_at, .. } => {
        start_at
      }
    }
  }

  pub fn is_state_machine(&self) -> bool {
    matches!(self.kind, ResourceKind::StateMachine { .. })
  }

  pub fn is_map_iterator(&self) -> bool {
    matches!(self.kind, ResourceKind::MapIterator { .. })
  }

  /// Get a leaf task by name.
  pub fn task(&self, name: &str) -> Option<&LeafTaskDef> {
    self.tasks.iter().find(|t| t.name == name)
  }
}
