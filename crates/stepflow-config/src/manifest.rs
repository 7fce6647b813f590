use serde::{Deserialize, Serialize};

use crate::resource::ResourceDef;

/// Every declared resource of an application, keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub resources: Vec<ResourceDef>,
}

impl Manifest {
  /// Parse a manifest from its JSON form.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// Register a resource, returning the one it replaces.
  pub fn register(&mut self, resource: ResourceDef) -> Option<ResourceDef> {
    match self.resources.iter_mut().find(|r| r.name == resource.name) {
      Some(existing) => Some(std::mem::replace(existing, resource)),
      None => {
        self.resources.push(resource);
        None
      }
    }
  }

  /// Get a resource by name.
  pub fn resource(&self, name: &str) -> Option<&ResourceDef> {
    self.resources.iter().find(|r| r.name == name)
  }

  /// Resources that compile into top-level state machines.
  pub fn state_machines(&self) -> impl Iterator<Item = &ResourceDef> {
    self.resources.iter().filter(|r| r.is_state_machine())
  }
}
