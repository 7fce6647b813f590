//! Rendering of compiled state machines as Amazon States Language.
//!
//! ```json
//! {
//!   "StartAt": "task-validate",
//!   "States": {
//!     "task-validate": { "Type": "Task", "Resource": "arn:aws:states:::lambda:invoke", "Next": "wait_validate_1" },
//!     "wait_validate_1": { "Type": "Wait", "Seconds": 30, "End": true }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use stepflow_config::{ProcessorExecutionType, ProcessorMode, RetryDef};

use crate::condition::{Condition, Operand};
use crate::machine::StateMachine;
use crate::state::{PayloadValue, State, StateGraph, StateId, StateKind};

const LAMBDA_INVOKE_RESOURCE: &str = "arn:aws:states:::lambda:invoke";

impl StateMachine {
  /// Render the definition body of this state machine.
  pub fn to_definition(&self) -> Value {
    graph_definition(&self.graph)
  }
}

impl Condition {
  /// Render this condition as a choice rule (without `Next`).
  pub fn to_rule(&self) -> Value {
    match self {
      Condition::And(conditions) => {
        json!({ "And": conditions.iter().map(Condition::to_rule).collect::<Vec<_>>() })
      }
      Condition::Or(conditions) => {
        json!({ "Or": conditions.iter().map(Condition::to_rule).collect::<Vec<_>>() })
      }
      Condition::Not(inner) => json!({ "Not": inner.to_rule() }),
      Condition::Compare {
        variable,
        operator,
        operand,
      } => {
        let operand = match operand {
          Operand::Value(value) => value.clone(),
          Operand::Path(path) => Value::String(path.clone()),
          Operand::Flag(flag) => Value::Bool(*flag),
        };
        let mut rule = Map::new();
        rule.insert("Variable".to_string(), Value::String(variable.clone()));
        rule.insert(operator.rule_name().to_string(), operand);
        Value::Object(rule)
      }
    }
  }
}

fn graph_definition(graph: &StateGraph) -> Value {
  let mut states = Map::new();
  for (_, state) in graph.states() {
    states.insert(state.name.clone(), state_definition(graph, state));
  }

  json!({
    "StartAt": name_of(graph, graph.start()),
    "States": states,
  })
}

fn name_of(graph: &StateGraph, id: StateId) -> &str {
  graph.state(id).map(|s| s.name.as_str()).unwrap_or_default()
}

fn state_definition(graph: &StateGraph, state: &State) -> Value {
  let mut def = Map::new();
  def.insert("Type".to_string(), json!(state.kind.type_name()));

  match &state.kind {
    StateKind::Invoke(invoke) => {
      def.insert("Resource".to_string(), json!(LAMBDA_INVOKE_RESOURCE));
      let mut parameters = Map::new();
      parameters.insert("FunctionName".to_string(), json!(invoke.function_name));
      match &invoke.payload {
        Some(payload) => {
          parameters.insert("Payload".to_string(), payload_object(payload));
        }
        None => {
          parameters.insert("Payload.$".to_string(), json!("$"));
        }
      }
      def.insert("Parameters".to_string(), Value::Object(parameters));
      def.insert("ResultPath".to_string(), json!(invoke.result_path));

      if !invoke.retry.is_empty() {
        let retry: Vec<Value> = invoke.retry.iter().map(retry_definition).collect();
        def.insert("Retry".to_string(), Value::Array(retry));
      }
      if !invoke.catch.is_empty() {
        let catch: Vec<Value> = invoke
          .catch
          .iter()
          .map(|c| {
            let mut rule = Map::new();
            rule.insert("ErrorEquals".to_string(), json!(c.error_equals));
            rule.insert("Next".to_string(), json!(name_of(graph, c.next)));
            if let Some(result_path) = &c.result_path {
              rule.insert("ResultPath".to_string(), json!(result_path));
            }
            Value::Object(rule)
          })
          .collect();
        def.insert("Catch".to_string(), Value::Array(catch));
      }
    }
    StateKind::Wait { seconds } => {
      def.insert("Seconds".to_string(), json!(seconds));
    }
    StateKind::Fail { cause, error } => {
      def.insert("Cause".to_string(), json!(cause));
      def.insert("Error".to_string(), json!(error));
    }
    StateKind::Pass | StateKind::Succeed => {}
    StateKind::Choice(choice) => {
      let choices: Vec<Value> = choice
        .choices
        .iter()
        .map(|branch| {
          let mut rule = branch.condition.to_rule();
          if let Value::Object(map) = &mut rule {
            map.insert("Next".to_string(), json!(name_of(graph, branch.next)));
          }
          rule
        })
        .collect();
      def.insert("Choices".to_string(), Value::Array(choices));
      if let Some(default) = choice.default {
        def.insert("Default".to_string(), json!(name_of(graph, default)));
      }
    }
    StateKind::Parallel(parallel) => {
      let branches: Vec<Value> = parallel.branches.iter().map(graph_definition).collect();
      def.insert("Branches".to_string(), Value::Array(branches));
    }
    StateKind::Map(map) => {
      def.insert("ItemsPath".to_string(), json!(map.items_path));
      def.insert(
        "ItemSelector".to_string(),
        payload_object(&map.item_selector),
      );
      if let Some(max_concurrency) = map.max_concurrency {
        def.insert("MaxConcurrency".to_string(), json!(max_concurrency));
      }

      let mut processor = graph_definition(&map.processor);
      let mut config = Map::new();
      if let Some(mode) = map.processor_config.mode {
        let mode = match mode {
          ProcessorMode::Inline => "INLINE",
          ProcessorMode::Distributed => "DISTRIBUTED",
        };
        config.insert("Mode".to_string(), json!(mode));
      }
      if let Some(execution_type) = map.processor_config.execution_type {
        let execution_type = match execution_type {
          ProcessorExecutionType::Standard => "STANDARD",
          ProcessorExecutionType::Express => "EXPRESS",
        };
        config.insert("ExecutionType".to_string(), json!(execution_type));
      }
      if let Value::Object(processor) = &mut processor {
        if !config.is_empty() {
          processor.insert("ProcessorConfig".to_string(), Value::Object(config));
        }
      }
      def.insert("ItemProcessor".to_string(), processor);
    }
  }

  if state.accepts_next() {
    match state.next {
      Some(next) => {
        def.insert("Next".to_string(), json!(name_of(graph, next)));
      }
      None => {
        def.insert("End".to_string(), json!(true));
      }
    }
  }

  Value::Object(def)
}

fn payload_object(payload: &BTreeMap<String, PayloadValue>) -> Value {
  let mut object = Map::new();
  for (key, value) in payload {
    match value {
      PayloadValue::Path(path) => {
        object.insert(format!("{}.$", key), json!(path));
      }
      PayloadValue::Literal(literal) => {
        object.insert(key.clone(), literal.clone());
      }
    }
  }
  Value::Object(object)
}

fn retry_definition(retry: &RetryDef) -> Value {
  let mut def = Map::new();
  def.insert("ErrorEquals".to_string(), json!(retry.error_equals));
  if let Some(interval) = retry.interval_seconds {
    def.insert("IntervalSeconds".to_string(), json!(interval));
  }
  if let Some(max_attempts) = retry.max_attempts {
    def.insert("MaxAttempts".to_string(), json!(max_attempts));
  }
  if let Some(backoff_rate) = retry.backoff_rate {
    def.insert("BackoffRate".to_string(), json!(backoff_rate));
  }
  Value::Object(def)
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::condition::ComparisonOperator;
  use crate::state::{
    Catch, ChoiceBranch, ChoiceState, InvokeState, MapState, ProcessorConfig,
  };

  fn invoke(task: &str, payload: Option<BTreeMap<String, PayloadValue>>) -> StateKind {
    StateKind::Invoke(InvokeState {
      task: task.to_string(),
      function_name: format!("sf-handler-Orders-{}", task),
      payload,
      result_path: "$".to_string(),
      retry: Vec::new(),
      catch: Vec::new(),
    })
  }

  #[test]
  fn test_compare_rule() {
    let condition = Condition::Compare {
      variable: "$$.Execution.Input.isInTheMorning".to_string(),
      operator: ComparisonOperator::BooleanEquals,
      operand: Operand::Value(json!(true)),
    };

    assert_eq!(
      condition.to_rule(),
      json!({ "Variable": "$$.Execution.Input.isInTheMorning", "BooleanEquals": true })
    );
  }

  #[test]
  fn test_nested_rule() {
    let condition = Condition::Not(Box::new(Condition::And(vec![Condition::Compare {
      variable: "$.order".to_string(),
      operator: ComparisonOperator::IsPresent,
      operand: Operand::Flag(false),
    }])));

    assert_eq!(
      condition.to_rule(),
      json!({ "Not": { "And": [{ "Variable": "$.order", "IsPresent": false }] } })
    );
  }

  #[test]
  fn test_invoke_with_payload_and_catch() {
    let mut payload = BTreeMap::new();
    payload.insert(
      "id".to_string(),
      PayloadValue::Path("$$.Execution.Id".to_string()),
    );
    payload.insert("stage".to_string(), PayloadValue::Literal(json!("prod")));

    let mut task = State::new("task-charge", invoke("charge", Some(payload)));
    if let StateKind::Invoke(invoke) = &mut task.kind {
      invoke.catch.push(Catch {
        error_equals: vec!["States.ALL".to_string()],
        next: StateId(1),
        result_path: Some("$.error".to_string()),
      });
    }
    let fail = State::new(
      "fail_charge_1",
      StateKind::Fail {
        cause: "card declined".to_string(),
        error: "Declined".to_string(),
      },
    );
    let machine = StateMachine::new(
      "Orders",
      StateGraph::new(StateId(0), vec![task, fail], HashMap::new()),
    );

    let def = machine.to_definition();
    assert_eq!(def["StartAt"], "task-charge");
    let task = &def["States"]["task-charge"];
    assert_eq!(task["Type"], "Task");
    assert_eq!(task["Parameters"]["FunctionName"], "sf-handler-Orders-charge");
    assert_eq!(task["Parameters"]["Payload"]["id.$"], "$$.Execution.Id");
    assert_eq!(task["Parameters"]["Payload"]["stage"], "prod");
    assert_eq!(task["End"], true);
    assert_eq!(task["Catch"][0]["Next"], "fail_charge_1");

    let fail = &def["States"]["fail_charge_1"];
    assert_eq!(fail["Error"], "Declined");
    assert!(fail.get("End").is_none());
  }

  #[test]
  fn test_choice_with_default() {
    let choice = State::new(
      "choice_a_1",
      StateKind::Choice(ChoiceState {
        choices: vec![ChoiceBranch {
          condition: Condition::Compare {
            variable: "$.n".to_string(),
            operator: ComparisonOperator::NumericGreaterThan,
            operand: Operand::Value(json!(3)),
          },
          next: StateId(1),
        }],
        default: Some(StateId(2)),
      }),
    );
    let big = State::new("succeed_a_2", StateKind::Succeed);
    let small = State::new("pass_a_3", StateKind::Pass);
    let machine = StateMachine::new(
      "Numbers",
      StateGraph::new(StateId(0), vec![choice, big, small], HashMap::new()),
    );

    let def = machine.to_definition();
    let choice = &def["States"]["choice_a_1"];
    assert_eq!(choice["Choices"][0]["Next"], "succeed_a_2");
    assert_eq!(choice["Choices"][0]["NumericGreaterThan"], 3);
    assert_eq!(choice["Default"], "pass_a_3");
    assert!(choice.get("End").is_none());
    assert_eq!(def["States"]["pass_a_3"]["End"], true);
  }

  #[test]
  fn test_map_processor() {
    let processor = StateGraph::new(
      StateId(0),
      vec![State::new("task-ship", invoke("ship", None))],
      HashMap::new(),
    );
    let mut selector = BTreeMap::new();
    selector.insert(
      "index".to_string(),
      PayloadValue::Path("$$.Map.Item.Index".to_string()),
    );
    let map = State::new(
      "map_split_1",
      StateKind::Map(MapState {
        items_path: "$.items".to_string(),
        item_selector: selector,
        max_concurrency: Some(2),
        processor: Box::new(processor),
        processor_config: ProcessorConfig {
          mode: Some(ProcessorMode::Distributed),
          execution_type: Some(ProcessorExecutionType::Express),
        },
      }),
    );
    let machine = StateMachine::new(
      "Orders",
      StateGraph::new(StateId(0), vec![map], HashMap::new()),
    );

    let def = machine.to_definition();
    let map = &def["States"]["map_split_1"];
    assert_eq!(map["ItemsPath"], "$.items");
    assert_eq!(map["MaxConcurrency"], 2);
    assert_eq!(map["ItemSelector"]["index.$"], "$$.Map.Item.Index");
    assert_eq!(map["ItemProcessor"]["StartAt"], "task-ship");
    assert_eq!(map["ItemProcessor"]["ProcessorConfig"]["Mode"], "DISTRIBUTED");
    assert_eq!(
      map["ItemProcessor"]["ProcessorConfig"]["ExecutionType"],
      "EXPRESS"
    );
    assert_eq!(
      map["ItemProcessor"]["States"]["task-ship"]["Parameters"]["Payload.$"],
      "$"
    );
  }
}
