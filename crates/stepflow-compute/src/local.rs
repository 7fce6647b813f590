//! In-memory compute provisioning.
//!
//! Units are built once per function name and kept for the lifetime of the
//! factory, so the set of provisioned units can be listed after a build.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use stepflow_config::EnvVar;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ComputeError;
use crate::factory::{ComputeFactory, ComputeHandle, ComputeRequest};

/// Handler files matching these are never bundled.
const STACK_EXCLUSION: &str = "*.stack.js";

/// A compute factory that records units instead of provisioning them.
pub struct LocalComputeFactory {
  env: HashMap<String, String>,
  units: RwLock<HashMap<String, ComputeHandle>>,
}

impl LocalComputeFactory {
  pub fn new() -> Self {
    Self::with_env(HashMap::new())
  }

  /// Create a factory resolving named environment entries from `env`.
  pub fn with_env(env: impl IntoIterator<Item = (String, String)>) -> Self {
    Self {
      env: env.into_iter().collect(),
      units: RwLock::new(HashMap::new()),
    }
  }

  /// Every unit provisioned so far, ordered by function name.
  pub async fn units(&self) -> Vec<ComputeHandle> {
    let units = self.units.read().await;
    let mut units: Vec<ComputeHandle> = units.values().cloned().collect();
    units.sort_by(|a, b| a.function_name.cmp(&b.function_name));
    units
  }

  pub async fn len(&self) -> usize {
    self.units.read().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.units.read().await.is_empty()
  }

  fn build(&self, request: ComputeRequest) -> Result<ComputeHandle, ComputeError> {
    let function_name = request.function_name();

    let mut environment = BTreeMap::new();
    for entry in &request.function.env {
      match entry {
        EnvVar::Named(name) => {
          let value = self
            .env
            .get(name)
            .ok_or_else(|| ComputeError::MissingEnvVar {
              function: function_name.clone(),
              name: name.clone(),
            })?;
          environment.insert(name.clone(), value.clone());
        }
        EnvVar::Values(values) => {
          for (key, value) in values {
            let value = match value {
              serde_json::Value::String(s) => s.clone(),
              other => other.to_string(),
            };
            environment.insert(key.clone(), value);
          }
        }
      }
    }

    let mut exclude = vec![STACK_EXCLUSION.to_string()];
    exclude.extend(request.exclusions.iter().map(|kind| format!("*.{}.js", kind)));

    Ok(ComputeHandle {
      function_name,
      handler: format!("{}.{}", request.source.file, request.handler),
      task: request.handler,
      code_path: request.source.folder,
      exclude,
      runtime: request.function.runtime.identifier().to_string(),
      memory: request.function.memory,
      timeout: request.function.timeout,
      environment,
      tags: request.function.tags,
      tracing: request.function.enable_trace,
    })
  }
}

impl Default for LocalComputeFactory {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl ComputeFactory for LocalComputeFactory {
  async fn create(&self, request: ComputeRequest) -> Result<ComputeHandle, ComputeError> {
    let function_name = request.function_name();

    // Try read lock first
    {
      let units = self.units.read().await;
      if let Some(handle) = units.get(&function_name) {
        return Ok(handle.clone());
      }
    }

    let handle = self.build(request)?;
    debug!(function = %handle.function_name, handler = %handle.handler, "provisioned compute unit");

    let mut units = self.units.write().await;
    Ok(units.entry(function_name).or_insert(handle).clone())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use stepflow_config::{FunctionProps, NodeRuntime, SourceLocation};

  use super::*;

  fn request(handler: &str) -> ComputeRequest {
    ComputeRequest {
      resource: "Orders".to_string(),
      source: SourceLocation {
        folder: "dist/orders".to_string(),
        file: "orders".to_string(),
      },
      handler: handler.to_string(),
      function: FunctionProps::default(),
      prefix: "sf-handler".to_string(),
      exclusions: vec!["api".to_string(), "event".to_string()],
    }
  }

  #[tokio::test]
  async fn test_create_builds_handle() {
    let factory = LocalComputeFactory::new();
    let mut req = request("charge");
    req.function.memory = Some(512);
    req.function.runtime = NodeRuntime::Node20;

    let handle = factory.create(req).await.unwrap();

    assert_eq!(handle.function_name, "sf-handler-Orders-charge");
    assert_eq!(handle.handler, "orders.charge");
    assert_eq!(handle.task, "charge");
    assert_eq!(handle.code_path, "dist/orders");
    assert_eq!(handle.runtime, "nodejs20.x");
    assert_eq!(handle.memory, Some(512));
    assert_eq!(
      handle.exclude,
      vec!["*.stack.js", "*.api.js", "*.event.js"]
    );
  }

  #[tokio::test]
  async fn test_create_is_idempotent() {
    let factory = LocalComputeFactory::new();

    let first = factory.create(request("charge")).await.unwrap();
    let mut changed = request("charge");
    changed.function.memory = Some(1024);
    let second = factory.create(changed).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(factory.len().await, 1);
  }

  #[tokio::test]
  async fn test_environment_resolution() {
    let factory = LocalComputeFactory::with_env([("DB_HOST".to_string(), "db.local".to_string())]);
    let mut req = request("charge");
    req.function.env = vec![
      EnvVar::Named("DB_HOST".to_string()),
      serde_json::from_value(json!({ "STAGE": "prod", "RETRIES": 3 })).unwrap(),
    ];

    let handle = factory.create(req).await.unwrap();

    assert_eq!(handle.environment["DB_HOST"], "db.local");
    assert_eq!(handle.environment["STAGE"], "prod");
    assert_eq!(handle.environment["RETRIES"], "3");
  }

  #[tokio::test]
  async fn test_missing_environment_variable() {
    let factory = LocalComputeFactory::new();
    let mut req = request("charge");
    req.function.env = vec![EnvVar::Named("SECRET".to_string())];

    let result = factory.create(req).await;

    assert!(matches!(
      result,
      Err(ComputeError::MissingEnvVar { name, .. }) if name == "SECRET"
    ));
    assert!(factory.is_empty().await);
  }

  #[tokio::test]
  async fn test_units_sorted_by_name() {
    let factory = LocalComputeFactory::new();
    factory.create(request("ship")).await.unwrap();
    factory.create(request("charge")).await.unwrap();

    let names: Vec<String> = factory
      .units()
      .await
      .into_iter()
      .map(|u| u.function_name)
      .collect();
    assert_eq!(names, vec!["sf-handler-Orders-charge", "sf-handler-Orders-ship"]);
  }
}
