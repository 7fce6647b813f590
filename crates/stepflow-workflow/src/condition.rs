use serde::{Deserialize, Serialize};

/// A choice rule in the engine's representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
  And(Vec<Condition>),
  Or(Vec<Condition>),
  Not(Box<Condition>),
  Compare {
    /// Path expression of the inspected value.
    variable: String,
    operator: ComparisonOperator,
    operand: Operand,
  },
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
  /// A literal to compare against.
  Value(serde_json::Value),
  /// A second path expression, for `*Path` operators.
  Path(String),
  /// Expected outcome of a presence or type check.
  Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
  StringEquals,
  StringEqualsPath,
  StringLessThan,
  StringLessThanPath,
  StringLessThanEquals,
  StringLessThanEqualsPath,
  StringGreaterThan,
  StringGreaterThanPath,
  StringGreaterThanEquals,
  StringGreaterThanEqualsPath,
  StringMatches,
  NumericEquals,
  NumericEqualsPath,
  NumericLessThan,
  NumericLessThanPath,
  NumericLessThanEquals,
  NumericLessThanEqualsPath,
  NumericGreaterThan,
  NumericGreaterThanPath,
  NumericGreaterThanEquals,
  NumericGreaterThanEqualsPath,
  BooleanEquals,
  BooleanEqualsPath,
  TimestampEquals,
  TimestampEqualsPath,
  TimestampLessThan,
  TimestampLessThanPath,
  TimestampLessThanEquals,
  TimestampLessThanEqualsPath,
  TimestampGreaterThan,
  TimestampGreaterThanPath,
  TimestampGreaterThanEquals,
  TimestampGreaterThanEqualsPath,
  IsPresent,
  IsNull,
  IsString,
  IsNumeric,
  IsBoolean,
  IsTimestamp,
}

impl ComparisonOperator {
  /// Field name of this operator in a choice rule.
  pub fn rule_name(&self) -> &'static str {
    use ComparisonOperator::*;
    match self {
      StringEquals => "StringEquals",
      StringEqualsPath => "StringEqualsPath",
      StringLessThan => "StringLessThan",
      StringLessThanPath => "StringLessThanPath",
      StringLessThanEquals => "StringLessThanEquals",
      StringLessThanEqualsPath => "StringLessThanEqualsPath",
      StringGreaterThan => "StringGreaterThan",
      StringGreaterThanPath => "StringGreaterThanPath",
      StringGreaterThanEquals => "StringGreaterThanEquals",
      StringGreaterThanEqualsPath => "StringGreaterThanEqualsPath",
      StringMatches => "StringMatches",
      NumericEquals => "NumericEquals",
      NumericEqualsPath => "NumericEqualsPath",
      NumericLessThan => "NumericLessThan",
      NumericLessThanPath => "NumericLessThanPath",
      NumericLessThanEquals => "NumericLessThanEquals",
      NumericLessThanEqualsPath => "NumericLessThanEqualsPath",
      NumericGreaterThan => "NumericGreaterThan",
      NumericGreaterThanPath => "NumericGreaterThanPath",
      NumericGreaterThanEquals => "NumericGreaterThanEquals",
      NumericGreaterThanEqualsPath => "NumericGreaterThanEqualsPath",
      BooleanEquals => "BooleanEquals",
      BooleanEqualsPath => "BooleanEqualsPath",
      TimestampEquals => "TimestampEquals",
      TimestampEqualsPath => "TimestampEqualsPath",
      TimestampLessThan => "TimestampLessThan",
      TimestampLessThanPath => "TimestampLessThanPath",
      TimestampLessThanEquals => "TimestampLessThanEquals",
      TimestampLessThanEqualsPath => "TimestampLessThanEqualsPath",
      TimestampGreaterThan => "TimestampGreaterThan",
      TimestampGreaterThanPath => "TimestampGreaterThanPath",
      TimestampGreaterThanEquals => "TimestampGreaterThanEquals",
      TimestampGreaterThanEqualsPath => "TimestampGreaterThanEqualsPath",
      IsPresent => "IsPresent",
      IsNull => "IsNull",
      IsString => "IsString",
      IsNumeric => "IsNumeric",
      IsBoolean => "IsBoolean",
      IsTimestamp => "IsTimestamp",
    }
  }
}
