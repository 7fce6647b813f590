//! Boolean validation expressions guarding choice branches.
//!
//! The JSON shape is flat and discriminated by `mode`:
//!
//! ```json
//! { "mode": "booleanEquals", "variable": { "context": "input", "source": "isInTheMorning" }, "value": true }
//! { "mode": "isPresent", "variable": "order.id" }
//! { "mode": "not", "condition": { "mode": "isNull", "variable": "order" } }
//! { "mode": "and", "conditions": [ ... ] }
//! ```
//!
//! Comparison modes are kept as strings here; the compiler maps them onto
//! its closed set of engine operators and rejects the ones it does not know.

use serde::{Deserialize, Serialize};

use crate::enums::CombinatorMode;
use crate::param::ParamSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValidation", into = "RawValidation")]
pub enum Validation {
  /// Compare a variable against a literal (or a second path for `*Path` modes).
  Comparison {
    mode: String,
    variable: ParamSource,
    value: serde_json::Value,
  },
  /// Presence and type checks on a variable.
  Unary { mode: String, variable: ParamSource },
  Not { condition: Box<Validation> },
  Combinator {
    mode: CombinatorMode,
    conditions: Vec<Validation>,
  },
}

impl Validation {
  /// The `mode` string as written in the manifest.
  pub fn mode(&self) -> &str {
    match self {
      Validation::Comparison { mode, .. } | Validation::Unary { mode, .. } => mode,
      Validation::Not { .. } => "not",
      Validation::Combinator {
        mode: CombinatorMode::And,
        ..
      } => "and",
      Validation::Combinator {
        mode: CombinatorMode::Or,
        ..
      } => "or",
    }
  }
}

#[derive(Serialize, Deserialize)]
struct RawValidation {
  mode: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  variable: Option<ParamSource>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  value: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  condition: Option<Box<Validation>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  conditions: Option<Vec<Validation>>,
}

impl TryFrom<RawValidation> for Validation {
  type Error = String;

  fn try_from(raw: RawValidation) -> Result<Self, Self::Error> {
    match raw.mode.as_str() {
      "and" | "or" => {
        let mode = if raw.mode == "and" {
          CombinatorMode::And
        } else {
          CombinatorMode::Or
        };
        let conditions = raw
          .conditions
          .ok_or_else(|| format!("'{}' validation requires 'conditions'", raw.mode))?;
        Ok(Validation::Combinator { mode, conditions })
      }
      "not" => {
        let condition = raw
          .condition
          .ok_or_else(|| "'not' validation requires 'condition'".to_string())?;
        Ok(Validation::Not { condition })
      }
      _ => {
        let variable = raw
          .variable
          .ok_or_else(|| format!("'{}' validation requires 'variable'", raw.mode))?;
        Ok(match raw.value {
          Some(value) => Validation::Comparison {
            mode: raw.mode,
            variable,
            value,
          },
          None => Validation::Unary {
            mode: raw.mode,
            variable,
          },
        })
      }
    }
  }
}

impl From<Validation> for RawValidation {
  fn from(validation: Validation) -> Self {
    let mode = validation.mode().to_string();
    let mut raw = RawValidation {
      mode,
      variable: None,
      value: None,
      condition: None,
      conditions: None,
    };

    match validation {
      Validation::Comparison {
        variable, value, ..
      } => {
        raw.variable = Some(variable);
        raw.value = Some(value);
      }
      Validation::Unary { variable, .. } => raw.variable = Some(variable),
      Validation::Not { condition } => raw.condition = Some(condition),
      Validation::Combinator { conditions, .. } => raw.conditions = Some(conditions),
    }

    raw
  }
}
