//! Parameter resolution.
//!
//! Maps a [`ParamRef`] onto the path expression the engine evaluates at run
//! time. Each context has a fixed root:
//!
//! | context         | root                  |
//! |-----------------|-----------------------|
//! | `execution`     | `$$.Execution`        |
//! | `input`         | `$$.Execution.Input`  |
//! | `state`         | `$$.State`            |
//! | `state_machine` | `$$.StateMachine`     |
//! | `task`          | `$$.Task`             |
//! | `payload`       | `$`                   |
//! | `map`           | `$$.Map.Item`         |
//!
//! `custom` references resolve to their literal value.

use stepflow_config::{ParamRef, ParamSource};
use stepflow_workflow::PayloadValue;

const EXECUTION_ROOT: &str = "$$.Execution";
const INPUT_ROOT: &str = "$$.Execution.Input";
const STATE_ROOT: &str = "$$.State";
const STATE_MACHINE_ROOT: &str = "$$.StateMachine";
const TASK_ROOT: &str = "$$.Task";
const PAYLOAD_ROOT: &str = "$";
const MAP_ROOT: &str = "$$.Map.Item";

/// Resolve a reference bound under `name`.
///
/// The name stands in for a missing `input` source.
pub fn resolve(reference: &ParamRef, name: Option<&str>) -> PayloadValue {
  let path = match reference {
    ParamRef::Execution { source } => join(EXECUTION_ROOT, source.field_name()),
    ParamRef::Input { source } => match source.as_deref().filter(|s| !s.is_empty()).or(name) {
      Some(field) => join(INPUT_ROOT, field),
      None => INPUT_ROOT.to_string(),
    },
    ParamRef::State { source } => join(STATE_ROOT, source.field_name()),
    ParamRef::StateMachine { source } => join(STATE_MACHINE_ROOT, source.field_name()),
    ParamRef::Task { source } => join(TASK_ROOT, source.field_name()),
    ParamRef::Payload { source } => match source.as_str() {
      "" | PAYLOAD_ROOT => PAYLOAD_ROOT.to_string(),
      field => join(PAYLOAD_ROOT, field),
    },
    ParamRef::Map { source } => join(MAP_ROOT, source.field_name()),
    ParamRef::Custom { value } => return PayloadValue::Literal(value.clone()),
  };
  PayloadValue::Path(path)
}

/// Resolve an unnamed source, such as a condition variable or map items.
pub fn resolve_source(source: &ParamSource) -> PayloadValue {
  resolve(&source.to_ref(), None)
}

fn join(root: &str, field: &str) -> String {
  format!("{}.{}", root, field)
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use stepflow_config::{ExecutionField, MapField, StateField, TaskField};

  use super::*;

  fn path(value: PayloadValue) -> String {
    match value {
      PayloadValue::Path(path) => path,
      PayloadValue::Literal(value) => panic!("expected a path, got literal {}", value),
    }
  }

  #[test]
  fn test_context_roots() {
    assert_eq!(
      path(resolve(
        &ParamRef::Execution {
          source: ExecutionField::RoleArn
        },
        None
      )),
      "$$.Execution.RoleArn"
    );
    assert_eq!(
      path(resolve(
        &ParamRef::State {
          source: StateField::EnteredTime
        },
        None
      )),
      "$$.State.EnteredTime"
    );
    assert_eq!(
      path(resolve(
        &ParamRef::Task {
          source: TaskField::Token
        },
        None
      )),
      "$$.Task.Token"
    );
    assert_eq!(
      path(resolve(
        &ParamRef::Map {
          source: MapField::Index
        },
        None
      )),
      "$$.Map.Item.Index"
    );
  }

  #[test]
  fn test_input_falls_back_to_binding_name() {
    let reference = ParamRef::Input { source: None };

    assert_eq!(
      path(resolve(&reference, Some("customerId"))),
      "$$.Execution.Input.customerId"
    );
    assert_eq!(path(resolve(&reference, None)), "$$.Execution.Input");

    let explicit = ParamRef::Input {
      source: Some("isInTheMorning".to_string()),
    };
    assert_eq!(
      path(resolve(&explicit, Some("flag"))),
      "$$.Execution.Input.isInTheMorning"
    );
  }

  #[test]
  fn test_empty_input_source_is_root() {
    let empty = ParamRef::Input {
      source: Some(String::new()),
    };

    assert_eq!(path(resolve(&empty, None)), "$$.Execution.Input");
    assert_eq!(
      path(resolve(&empty, Some("customerId"))),
      "$$.Execution.Input.customerId"
    );
  }

  #[test]
  fn test_payload_paths() {
    assert_eq!(path(resolve_source(&"order.items".into())), "$.order.items");
    assert_eq!(path(resolve_source(&"$".into())), "$");
  }

  #[test]
  fn test_custom_is_literal() {
    let reference = ParamRef::Custom {
      value: json!({ "stage": "prod" }),
    };
    assert_eq!(
      resolve(&reference, Some("config")),
      PayloadValue::Literal(json!({ "stage": "prod" }))
    );
  }
}
