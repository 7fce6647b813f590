use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stepflow_config::{FunctionProps, SourceLocation};

use crate::error::ComputeError;

/// Everything needed to provision the unit behind one leaf task.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
  /// Resource declaring the leaf.
  pub resource: String,
  pub source: SourceLocation,
  /// Leaf task name, also the exported handler method.
  pub handler: String,
  pub function: FunctionProps,
  /// Prefix of the generated function name.
  pub prefix: String,
  /// Handler file kinds left out of the code bundle, e.g. `api`, `event`.
  pub exclusions: Vec<String>,
}

impl ComputeRequest {
  /// The generated, process-wide unique function name.
  pub fn function_name(&self) -> String {
    format!("{}-{}-{}", self.prefix, self.resource, self.handler)
  }
}

/// A provisioned compute unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeHandle {
  pub function_name: String,
  /// Leaf task the unit was provisioned for.
  pub task: String,
  /// Entry point in `<file>.<method>` form.
  pub handler: String,
  pub code_path: String,
  /// Glob patterns excluded from the code bundle.
  pub exclude: Vec<String>,
  pub runtime: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<u32>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub environment: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
  #[serde(default)]
  pub tracing: bool,
}

/// Provisions invocable units for leaf tasks.
///
/// Implementations must be idempotent per generated function name: asking
/// twice for the same unit returns the same handle.
#[async_trait]
pub trait ComputeFactory: Send + Sync {
  async fn create(&self, request: ComputeRequest) -> Result<ComputeHandle, ComputeError>;
}
