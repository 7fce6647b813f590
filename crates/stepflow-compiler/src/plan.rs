use std::collections::HashSet;

use stepflow_compute::ComputeRequest;
use stepflow_config::{LeafTaskDef, ResourceDef};

use crate::compiler::UnitSource;
use crate::config::CompilerConfig;

/// The compute units a resource needs, collected by a dry compilation.
///
/// Planning hands the compiler the name each unit will get without
/// provisioning anything, so every configuration error surfaces before the
/// first call into a compute factory.
#[derive(Debug, Clone)]
pub struct Plan {
  prefix: String,
  exclusions: Vec<String>,
  requests: Vec<ComputeRequest>,
  seen: HashSet<(String, String)>,
}

impl Plan {
  pub fn new(config: &CompilerConfig) -> Self {
    Self {
      prefix: config.handler_prefix.clone(),
      exclusions: config.exclusions.clone(),
      requests: Vec::new(),
      seen: HashSet::new(),
    }
  }

  /// One request per distinct leaf, in the order the compiler reached them.
  pub fn requests(&self) -> &[ComputeRequest] {
    &self.requests
  }

  pub fn len(&self) -> usize {
    self.requests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.requests.is_empty()
  }
}

impl UnitSource for Plan {
  fn function_name(&mut self, resource: &ResourceDef, task: &LeafTaskDef) -> Option<String> {
    let request = ComputeRequest {
      resource: resource.name.clone(),
      source: resource.source.clone(),
      handler: task.name.clone(),
      function: task.function.clone(),
      prefix: self.prefix.clone(),
      exclusions: self.exclusions.clone(),
    };
    let function_name = request.function_name();

    if self.seen.insert((resource.name.clone(), task.name.clone())) {
      self.requests.push(request);
    }
    Some(function_name)
  }
}
