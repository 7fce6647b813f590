/// Settings shared by every compilation of a [`crate::StandardCompiler`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
  /// Prefix of generated compute unit names.
  pub handler_prefix: String,
  /// Handler file kinds excluded from compute unit bundles.
  pub exclusions: Vec<String>,
  /// Where invoke states place their result in the state data.
  pub result_path: String,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    Self {
      handler_prefix: "sf-handler".to_string(),
      exclusions: vec!["api".to_string(), "event".to_string()],
      result_path: "$".to_string(),
    }
  }
}
