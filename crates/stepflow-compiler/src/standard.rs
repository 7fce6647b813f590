use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use stepflow_compute::{ComputeFactory, ComputeHandle};
use stepflow_config::{Manifest, ResourceDef};
use stepflow_workflow::StateMachine;
use tracing::{info, instrument};

use crate::compiler::{ComputeUnits, TaskGraphCompiler, UnitSource};
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::plan::Plan;

/// A compiled state machine together with the compute units it invokes.
#[derive(Debug, Clone)]
pub struct CompiledMachine {
  pub machine: StateMachine,
  /// Provisioned units, ordered by function name.
  pub functions: Vec<ComputeHandle>,
}

impl CompiledMachine {
  pub fn name(&self) -> &str {
    &self.machine.name
  }

  /// The engine definition of the machine.
  pub fn definition(&self) -> Value {
    self.machine.to_definition()
  }
}

/// Compiler turns state machine resources into validated state machines.
#[async_trait]
pub trait Compiler: Send + Sync {
  /// Compile a single state machine resource.
  ///
  /// This process:
  /// 1. Plans the resource, reporting configuration errors
  /// 2. Provisions one compute unit per leaf task
  /// 3. Compiles and validates the state machine
  async fn compile(
    &self,
    manifest: &Manifest,
    resource: &str,
  ) -> Result<CompiledMachine, CompileError>;

  /// Compile every state machine resource of a manifest, in declaration
  /// order. Map iterators are only compiled embedded in their maps.
  async fn compile_all(&self, manifest: &Manifest) -> Result<Vec<CompiledMachine>, CompileError>;
}

/// Standard compiler implementation that provisions through a compute factory.
pub struct StandardCompiler<F: ComputeFactory> {
  factory: F,
  config: CompilerConfig,
}

impl<F: ComputeFactory> StandardCompiler<F> {
  /// Create a new compiler with the default configuration.
  pub fn new(factory: F) -> Self {
    Self::with_config(factory, CompilerConfig::default())
  }

  pub fn with_config(factory: F, config: CompilerConfig) -> Self {
    Self { factory, config }
  }

  pub fn factory(&self) -> &F {
    &self.factory
  }

  pub fn config(&self) -> &CompilerConfig {
    &self.config
  }

  /// Plan a resource without provisioning anything.
  ///
  /// Runs the full compilation against the names units would get, so a
  /// successful check means only provisioning can still fail.
  pub fn check(&self, manifest: &Manifest, resource: &str) -> Result<Plan, CompileError> {
    check_unique_resources(manifest)?;
    let mut plan = Plan::new(&self.config);
    self.build(manifest, lookup(manifest, resource)?, &mut plan)?;
    Ok(plan)
  }

  /// Provision every planned unit.
  async fn provision(&self, plan: &Plan) -> Result<ComputeUnits, CompileError> {
    let mut units = ComputeUnits::new();
    for request in plan.requests() {
      let resource = request.resource.clone();
      let task = request.handler.clone();
      let handle = self.factory.create(request.clone()).await?;
      units.insert(resource, task, handle);
    }
    Ok(units)
  }

  fn build<U: UnitSource>(
    &self,
    manifest: &Manifest,
    resource: &ResourceDef,
    units: &mut U,
  ) -> Result<StateMachine, CompileError> {
    let graph = TaskGraphCompiler::new(manifest, &self.config, units).compile(resource)?;
    let machine = StateMachine::new(resource.name.clone(), graph);
    machine
      .validate()
      .map_err(|source| CompileError::Workflow {
        resource: resource.name.clone(),
        source,
      })?;
    Ok(machine)
  }
}

fn lookup<'a>(manifest: &'a Manifest, resource: &str) -> Result<&'a ResourceDef, CompileError> {
  manifest
    .resource(resource)
    .ok_or_else(|| CompileError::ResourceNotFound {
      resource: resource.to_string(),
    })
}

fn check_unique_resources(manifest: &Manifest) -> Result<(), CompileError> {
  let mut seen = HashSet::new();
  for resource in &manifest.resources {
    if !seen.insert(resource.name.as_str()) {
      return Err(CompileError::DuplicateResource {
        resource: resource.name.clone(),
      });
    }
  }
  Ok(())
}

#[async_trait]
impl<F: ComputeFactory> Compiler for StandardCompiler<F> {
  #[instrument(skip(self, manifest))]
  async fn compile(
    &self,
    manifest: &Manifest,
    resource: &str,
  ) -> Result<CompiledMachine, CompileError> {
    let plan = self.check(manifest, resource)?;
    let mut units = self.provision(&plan).await?;
    let machine = self.build(manifest, lookup(manifest, resource)?, &mut units)?;

    info!(
      states = machine.state_names().len(),
      functions = units.len(),
      "compiled state machine"
    );

    Ok(CompiledMachine {
      machine,
      functions: units.handles(),
    })
  }

  #[instrument(skip_all)]
  async fn compile_all(&self, manifest: &Manifest) -> Result<Vec<CompiledMachine>, CompileError> {
    let mut compiled = Vec::new();
    for resource in manifest.state_machines() {
      compiled.push(self.compile(manifest, &resource.name).await?);
    }
    Ok(compiled)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use serde_json::json;
  use stepflow_compute::{ComputeError, ComputeRequest, LocalComputeFactory};

  use super::*;

  /// Factory that records every request it receives.
  #[derive(Default)]
  struct RecordingFactory {
    inner: LocalComputeFactory,
    calls: Mutex<Vec<String>>,
  }

  #[async_trait]
  impl ComputeFactory for RecordingFactory {
    async fn create(&self, request: ComputeRequest) -> Result<ComputeHandle, ComputeError> {
      self.calls.lock().unwrap().push(request.function_name());
      self.inner.create(request).await
    }
  }

  fn manifest() -> Manifest {
    serde_json::from_value(json!({
      "resources": [
        {
          "name": "Orders",
          "source": { "folder": "dist/orders", "file": "orders" },
          "type": "state_machine",
          "start_at": "charge",
          "tasks": [
            { "name": "charge", "next": "ship" },
            { "name": "ship", "end": true }
          ]
        },
        {
          "name": "Billing",
          "source": { "folder": "dist/billing", "file": "billing" },
          "type": "state_machine",
          "start_at": "invoice",
          "tasks": [{ "name": "invoice", "end": true }]
        }
      ]
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn test_compile_provisions_each_leaf_once() {
    let compiler = StandardCompiler::new(RecordingFactory::default());

    let compiled = compiler.compile(&manifest(), "Orders").await.unwrap();

    assert_eq!(compiled.name(), "Orders");
    assert_eq!(
      *compiler.factory().calls.lock().unwrap(),
      vec!["sf-handler-Orders-charge", "sf-handler-Orders-ship"]
    );
    assert_eq!(compiled.functions.len(), 2);
    assert_eq!(compiled.functions[0].handler, "orders.charge");

    let definition = compiled.definition();
    assert_eq!(definition["StartAt"], "task-charge");
    assert_eq!(
      definition["States"]["task-charge"]["Parameters"]["FunctionName"],
      "sf-handler-Orders-charge"
    );
    assert_eq!(definition["States"]["task-charge"]["Next"], "task-ship");
  }

  #[tokio::test]
  async fn test_compile_all() {
    let compiler = StandardCompiler::new(LocalComputeFactory::new());

    let compiled = compiler.compile_all(&manifest()).await.unwrap();

    let names: Vec<&str> = compiled.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Orders", "Billing"]);
    assert_eq!(compiler.factory().len().await, 3);
  }

  #[tokio::test]
  async fn test_custom_prefix() {
    let config = CompilerConfig {
      handler_prefix: "jobs".to_string(),
      ..CompilerConfig::default()
    };
    let compiler = StandardCompiler::with_config(LocalComputeFactory::new(), config);

    let compiled = compiler.compile(&manifest(), "Billing").await.unwrap();

    assert_eq!(compiled.functions[0].function_name, "jobs-Billing-invoice");
  }

  #[test]
  fn test_check_does_not_provision() {
    let compiler = StandardCompiler::new(RecordingFactory::default());

    let plan = compiler.check(&manifest(), "Orders").unwrap();

    assert_eq!(plan.len(), 2);
    assert!(compiler.factory().calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_resource_not_found() {
    let compiler = StandardCompiler::new(LocalComputeFactory::new());

    let result = compiler.compile(&manifest(), "Shipping").await;

    assert!(matches!(
      result,
      Err(CompileError::ResourceNotFound { resource }) if resource == "Shipping"
    ));
  }

  #[tokio::test]
  async fn test_duplicate_resource_names_are_rejected() {
    let manifest: Manifest = serde_json::from_value(json!({
      "resources": [
        {
          "name": "Orders",
          "source": { "folder": "dist/orders", "file": "orders" },
          "type": "state_machine",
          "start_at": "charge",
          "tasks": [{ "name": "charge", "end": true }]
        },
        {
          "name": "Orders",
          "source": { "folder": "dist/legacy", "file": "orders" },
          "type": "state_machine",
          "start_at": "refund",
          "tasks": [{ "name": "refund", "end": true }]
        }
      ]
    }))
    .unwrap();
    let compiler = StandardCompiler::new(RecordingFactory::default());

    let result = compiler.compile_all(&manifest).await;

    assert!(matches!(
      result,
      Err(CompileError::DuplicateResource { resource }) if resource == "Orders"
    ));
    assert!(matches!(
      compiler.check(&manifest, "Orders"),
      Err(CompileError::DuplicateResource { .. })
    ));
    assert!(compiler.factory().calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_compute_error_propagates() {
    let mut manifest = manifest();
    manifest.resources[1].tasks[0].function.env =
      vec![stepflow_config::EnvVar::Named("API_KEY".to_string())];
    let compiler = StandardCompiler::new(LocalComputeFactory::new());

    let result = compiler.compile(&manifest, "Billing").await;

    assert!(matches!(
      result,
      Err(CompileError::Compute(ComputeError::MissingEnvVar { name, .. })) if name == "API_KEY"
    ));
  }
}
