//! Translation of choice validations into engine conditions.

use stepflow_config::{CombinatorMode, Validation};
use stepflow_workflow::{ComparisonOperator, Condition, Operand, PayloadValue};

use crate::error::ConditionError;
use crate::param::resolve_source;

/// How a `mode` string becomes an engine comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule {
  /// Compare against a literal value.
  Value(ComparisonOperator),
  /// Compare against a second path given as the value.
  Path(ComparisonOperator),
  /// Presence or type check with the expected outcome.
  Check(ComparisonOperator, bool),
}

fn rule(mode: &str) -> Option<Rule> {
  use ComparisonOperator::*;
  let rule = match mode {
    "stringEquals" => Rule::Value(StringEquals),
    "stringEqualsJsonPath" => Rule::Path(StringEqualsPath),
    "stringLessThan" => Rule::Value(StringLessThan),
    "stringLessThanJsonPath" => Rule::Path(StringLessThanPath),
    "stringLessThanEquals" => Rule::Value(StringLessThanEquals),
    "stringLessThanEqualsJsonPath" => Rule::Path(StringLessThanEqualsPath),
    "stringGreaterThan" => Rule::Value(StringGreaterThan),
    "stringGreaterThanJsonPath" => Rule::Path(StringGreaterThanPath),
    "stringGreaterThanEquals" => Rule::Value(StringGreaterThanEquals),
    "stringGreaterThanEqualsJsonPath" => Rule::Path(StringGreaterThanEqualsPath),
    "stringMatches" => Rule::Value(StringMatches),
    "numberEquals" => Rule::Value(NumericEquals),
    "numberEqualsJsonPath" => Rule::Path(NumericEqualsPath),
    "numberLessThan" => Rule::Value(NumericLessThan),
    "numberLessThanJsonPath" => Rule::Path(NumericLessThanPath),
    "numberLessThanEquals" => Rule::Value(NumericLessThanEquals),
    "numberLessThanEqualsJsonPath" => Rule::Path(NumericLessThanEqualsPath),
    "numberGreaterThan" => Rule::Value(NumericGreaterThan),
    "numberGreaterThanJsonPath" => Rule::Path(NumericGreaterThanPath),
    "numberGreaterThanEquals" => Rule::Value(NumericGreaterThanEquals),
    "numberGreaterThanEqualsJsonPath" => Rule::Path(NumericGreaterThanEqualsPath),
    "booleanEquals" => Rule::Value(BooleanEquals),
    "booleanEqualsJsonPath" => Rule::Path(BooleanEqualsPath),
    "timestampEquals" => Rule::Value(TimestampEquals),
    "timestampEqualsJsonPath" => Rule::Path(TimestampEqualsPath),
    "timestampLessThan" => Rule::Value(TimestampLessThan),
    "timestampLessThanJsonPath" => Rule::Path(TimestampLessThanPath),
    "timestampLessThanEquals" => Rule::Value(TimestampLessThanEquals),
    "timestampLessThanEqualsJsonPath" => Rule::Path(TimestampLessThanEqualsPath),
    "timestampGreaterThan" => Rule::Value(TimestampGreaterThan),
    "timestampGreaterThanJsonPath" => Rule::Path(TimestampGreaterThanPath),
    "timestampGreaterThanEquals" => Rule::Value(TimestampGreaterThanEquals),
    "timestampGreaterThanEqualsJsonPath" => Rule::Path(TimestampGreaterThanEqualsPath),
    "isPresent" => Rule::Check(IsPresent, true),
    "isNotPresent" => Rule::Check(IsPresent, false),
    "isNull" => Rule::Check(IsNull, true),
    "isNotNull" => Rule::Check(IsNull, false),
    "isString" => Rule::Check(IsString, true),
    "isNotString" => Rule::Check(IsString, false),
    "isNumeric" => Rule::Check(IsNumeric, true),
    "isNotNumeric" => Rule::Check(IsNumeric, false),
    "isBoolean" => Rule::Check(IsBoolean, true),
    "isNotBoolean" => Rule::Check(IsBoolean, false),
    "isTimestamp" => Rule::Check(IsTimestamp, true),
    "isNotTimestamp" => Rule::Check(IsTimestamp, false),
    _ => return None,
  };
  Some(rule)
}

/// Translate a validation tree into an engine condition.
pub fn translate(validation: &Validation) -> Result<Condition, ConditionError> {
  match validation {
    Validation::Combinator { mode, conditions } => {
      if conditions.is_empty() {
        return Err(ConditionError::EmptyCombinator {
          mode: validation.mode().to_string(),
        });
      }
      let children = conditions
        .iter()
        .map(translate)
        .collect::<Result<Vec<_>, _>>()?;
      Ok(match mode {
        CombinatorMode::And => Condition::And(children),
        CombinatorMode::Or => Condition::Or(children),
      })
    }
    Validation::Not { condition } => Ok(Condition::Not(Box::new(translate(condition)?))),
    Validation::Comparison {
      mode,
      variable,
      value,
    } => compare(mode, variable, Some(value)),
    Validation::Unary { mode, variable } => compare(mode, variable, None),
  }
}

fn compare(
  mode: &str,
  variable: &stepflow_config::ParamSource,
  value: Option<&serde_json::Value>,
) -> Result<Condition, ConditionError> {
  let rule = rule(mode).ok_or_else(|| ConditionError::UnknownMode {
    mode: mode.to_string(),
  })?;

  let variable = match resolve_source(variable) {
    PayloadValue::Path(path) => path,
    PayloadValue::Literal(_) => {
      return Err(ConditionError::LiteralVariable {
        mode: mode.to_string(),
      });
    }
  };

  let missing_value = || ConditionError::MissingValue {
    mode: mode.to_string(),
  };

  let (operator, operand) = match rule {
    Rule::Value(operator) => (operator, Operand::Value(value.ok_or_else(missing_value)?.clone())),
    Rule::Path(operator) => {
      let path = value
        .ok_or_else(missing_value)?
        .as_str()
        .ok_or_else(|| ConditionError::InvalidPathOperand {
          mode: mode.to_string(),
        })?;
      (operator, Operand::Path(path.to_string()))
    }
    Rule::Check(operator, expected) => (operator, Operand::Flag(expected)),
  };

  Ok(Condition::Compare {
    variable,
    operator,
    operand,
  })
}
