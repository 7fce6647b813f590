//! Parameter references into the execution contexts of a running state machine.
//!
//! A reference names a context and a source inside it. The compiler turns it
//! into a path expression, except for `custom` references which carry a
//! literal value.
//!
//! # Examples
//!
//! ```json
//! { "name": "id", "context": "execution", "source": "id" }
//! { "name": "flag", "context": "input", "source": "isInTheMorning" }
//! { "name": "total", "context": "payload", "source": "order.total" }
//! { "name": "stage", "context": "custom", "value": "prod" }
//! ```

use serde::{Deserialize, Serialize};

/// A tagged pointer into one of the well-known execution contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum ParamRef {
  Execution {
    source: ExecutionField,
  },
  /// The original execution input. Without a source the binding name is used.
  Input {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
  },
  State {
    source: StateField,
  },
  StateMachine {
    source: StateMachineField,
  },
  Task {
    source: TaskField,
  },
  /// The effective input of the current state.
  Payload {
    source: String,
  },
  /// The current item of a map iteration.
  Map {
    source: MapField,
  },
  /// A literal value, passed through unchanged.
  Custom {
    value: serde_json::Value,
  },
}

/// A named parameter bound into a leaf task's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamBinding {
  pub name: String,
  #[serde(flatten)]
  pub reference: ParamRef,
}

/// Where a condition variable or a map's items come from.
///
/// A bare string is shorthand for a payload reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSource {
  Path(String),
  Reference(ParamRef),
}

impl ParamSource {
  /// Normalize into a full reference.
  pub fn to_ref(&self) -> ParamRef {
    match self {
      ParamSource::Path(source) => ParamRef::Payload {
        source: source.clone(),
      },
      ParamSource::Reference(reference) => reference.clone(),
    }
  }
}

impl From<&str> for ParamSource {
  fn from(source: &str) -> Self {
    ParamSource::Path(source.to_string())
  }
}

impl From<ParamRef> for ParamSource {
  fn from(reference: ParamRef) -> Self {
    ParamSource::Reference(reference)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionField {
  Id,
  Input,
  Name,
  RoleArn,
  StartTime,
  RedriveCount,
  RedriveTime,
}

impl ExecutionField {
  pub fn field_name(&self) -> &'static str {
    match self {
      ExecutionField::Id => "Id",
      ExecutionField::Input => "Input",
      ExecutionField::Name => "Name",
      ExecutionField::RoleArn => "RoleArn",
      ExecutionField::StartTime => "StartTime",
      ExecutionField::RedriveCount => "RedriveCount",
      ExecutionField::RedriveTime => "RedriveTime",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
  EnteredTime,
  Name,
  RetryCount,
}

impl StateField {
  pub fn field_name(&self) -> &'static str {
    match self {
      StateField::EnteredTime => "EnteredTime",
      StateField::Name => "Name",
      StateField::RetryCount => "RetryCount",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMachineField {
  Id,
  Name,
}

impl StateMachineField {
  pub fn field_name(&self) -> &'static str {
    match self {
      StateMachineField::Id => "Id",
      StateMachineField::Name => "Name",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
  Token,
}

impl TaskField {
  pub fn field_name(&self) -> &'static str {
    match self {
      TaskField::Token => "Token",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapField {
  Index,
  Value,
}

impl MapField {
  pub fn field_name(&self) -> &'static str {
    match self {
      MapField::Index => "Index",
      MapField::Value => "Value",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_binding_flattens_context() {
    let binding: ParamBinding = serde_json::from_value(json!({
      "name": "execution_id",
      "context": "execution",
      "source": "id"
    }))
    .unwrap();

    assert_eq!(binding.name, "execution_id");
    assert_eq!(
      binding.reference,
      ParamRef::Execution {
        source: ExecutionField::Id
      }
    );
  }

  #[test]
  fn test_input_source_is_optional() {
    let binding: ParamBinding = serde_json::from_value(json!({
      "name": "user",
      "context": "input"
    }))
    .unwrap();

    assert_eq!(binding.reference, ParamRef::Input { source: None });
  }

  #[test]
  fn test_bare_string_source_is_payload() {
    let source: ParamSource = serde_json::from_value(json!("items")).unwrap();
    assert_eq!(
      source.to_ref(),
      ParamRef::Payload {
        source: "items".to_string()
      }
    );
  }

  #[test]
  fn test_custom_carries_literal() {
    let source: ParamSource = serde_json::from_value(json!({
      "context": "custom",
      "value": { "nested": [1, 2] }
    }))
    .unwrap();

    assert_eq!(
      source,
      ParamSource::Reference(ParamRef::Custom {
        value: json!({ "nested": [1, 2] })
      })
    );
  }
}
