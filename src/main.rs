mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use stepflow_compiler::{CompiledMachine, Compiler, CompilerConfig, StandardCompiler};
use stepflow_compute::LocalComputeFactory;
use stepflow_config::Manifest;

/// Stepflow - compiles declarative task graphs into state machine definitions
#[derive(Parser)]
#[command(name = "stepflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Prefix of generated compute unit names (default: sf-handler)
  #[arg(long, global = true)]
  handler_prefix: Option<String>,

  /// Emit logs as JSON
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile state machines into engine definitions
  Compile {
    /// Path to the manifest file (JSON)
    manifest_file: PathBuf,

    /// State machine to compile; repeatable (default: all)
    #[arg(long = "resource")]
    resources: Vec<String>,

    /// Write `<name>.asl.json` and `<name>.functions.json` here instead of stdout
    #[arg(long)]
    out_dir: Option<PathBuf>,
  },

  /// Check every state machine of a manifest without provisioning
  Check {
    /// Path to the manifest file (JSON)
    manifest_file: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init(cli.log_json);

  let mut config = CompilerConfig::default();
  if let Some(prefix) = cli.handler_prefix {
    config.handler_prefix = prefix;
  }

  match cli.command {
    Commands::Compile {
      manifest_file,
      resources,
      out_dir,
    } => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { compile(manifest_file, resources, out_dir, config).await })
    }
    Commands::Check { manifest_file } => check(&manifest_file, config),
  }
}

fn read_manifest(manifest_file: &Path) -> Result<Manifest> {
  let content = std::fs::read_to_string(manifest_file)
    .with_context(|| format!("failed to read manifest file: {}", manifest_file.display()))?;
  Manifest::from_json(&content)
    .with_context(|| format!("failed to parse manifest file: {}", manifest_file.display()))
}

async fn compile(
  manifest_file: PathBuf,
  resources: Vec<String>,
  out_dir: Option<PathBuf>,
  config: CompilerConfig,
) -> Result<()> {
  let manifest = read_manifest(&manifest_file)?;
  info!(
    resources = manifest.resources.len(),
    "loaded manifest {}",
    manifest_file.display()
  );

  let factory = LocalComputeFactory::with_env(std::env::vars());
  let compiler = StandardCompiler::with_config(factory, config);

  let compiled = if resources.is_empty() {
    compiler
      .compile_all(&manifest)
      .await
      .context("failed to compile manifest")?
  } else {
    let mut compiled = Vec::with_capacity(resources.len());
    for resource in &resources {
      let machine = compiler
        .compile(&manifest, resource)
        .await
        .with_context(|| format!("failed to compile '{}'", resource))?;
      compiled.push(machine);
    }
    compiled
  };

  match out_dir {
    Some(out_dir) => write_outputs(&out_dir, &compiled).await?,
    None => {
      let mut output = serde_json::Map::new();
      for machine in &compiled {
        output.insert(
          machine.name().to_string(),
          serde_json::json!({
            "definition": machine.definition(),
            "functions": machine.functions,
          }),
        );
      }
      println!("{}", serde_json::to_string_pretty(&output)?);
    }
  }

  let units = compiler.factory().units().await;
  for unit in &units {
    debug!(function = %unit.function_name, code = %unit.code_path, "provisioned unit");
  }
  info!(
    machines = compiled.len(),
    functions = units.len(),
    "compilation finished"
  );
  Ok(())
}

async fn write_outputs(out_dir: &Path, compiled: &[CompiledMachine]) -> Result<()> {
  tokio::fs::create_dir_all(out_dir)
    .await
    .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

  for machine in compiled {
    let definition_path = out_dir.join(format!("{}.asl.json", machine.name()));
    let definition = serde_json::to_string_pretty(&machine.definition())?;
    tokio::fs::write(&definition_path, definition)
      .await
      .with_context(|| format!("failed to write {}", definition_path.display()))?;

    let functions_path = out_dir.join(format!("{}.functions.json", machine.name()));
    let functions = serde_json::to_string_pretty(&machine.functions)?;
    tokio::fs::write(&functions_path, functions)
      .await
      .with_context(|| format!("failed to write {}", functions_path.display()))?;

    info!(machine = machine.name(), "wrote {}", definition_path.display());
  }
  Ok(())
}

fn check(manifest_file: &Path, config: CompilerConfig) -> Result<()> {
  let manifest = read_manifest(manifest_file)?;
  let compiler = StandardCompiler::with_config(LocalComputeFactory::new(), config);

  for resource in manifest.state_machines() {
    let plan = compiler
      .check(&manifest, &resource.name)
      .with_context(|| format!("'{}' failed to compile", resource.name))?;
    println!("ok  {} ({} compute units)", resource.name, plan.len());
  }
  Ok(())
}
