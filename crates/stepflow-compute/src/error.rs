use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComputeError {
  #[error("environment variable '{name}' required by function '{function}' is not set")]
  MissingEnvVar { function: String, name: String },
}
