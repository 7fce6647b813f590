use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Properties of the compute unit backing a leaf task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionProps {
  /// Execution time limit in seconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<u32>,

  /// Memory, in MB, allocated to the function.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<u32>,

  #[serde(default)]
  pub runtime: NodeRuntime,

  /// Environment entries, either names looked up in the build environment
  /// or literal key/value maps.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env: Vec<EnvVar>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,

  #[serde(default)]
  pub enable_trace: bool,
}

/// Node.js runtime major version the handler runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NodeRuntime {
  #[default]
  Node18,
  Node20,
  Node22,
}

impl NodeRuntime {
  /// Runtime identifier understood by the function service.
  pub fn identifier(&self) -> &'static str {
    match self {
      NodeRuntime::Node18 => "nodejs18.x",
      NodeRuntime::Node20 => "nodejs20.x",
      NodeRuntime::Node22 => "nodejs22.x",
    }
  }
}

impl TryFrom<u8> for NodeRuntime {
  type Error = String;

  fn try_from(version: u8) -> Result<Self, Self::Error> {
    match version {
      18 => Ok(NodeRuntime::Node18),
      20 => Ok(NodeRuntime::Node20),
      22 => Ok(NodeRuntime::Node22),
      other => Err(format!("unsupported node runtime: {}", other)),
    }
  }
}

impl From<NodeRuntime> for u8 {
  fn from(runtime: NodeRuntime) -> Self {
    match runtime {
      NodeRuntime::Node18 => 18,
      NodeRuntime::Node20 => 20,
      NodeRuntime::Node22 => 22,
    }
  }
}

/// A single environment entry.
///
/// ```json
/// ["DB_HOST", { "STAGE": "prod", "RETRIES": 3 }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvVar {
  /// Name of a variable taken from the build environment.
  Named(String),
  /// Literal values; non-string scalars are stringified.
  Values(BTreeMap<String, serde_json::Value>),
}
