//! Implementation of the `ktjar steps` command.
//!
//! Generates the step sequence for one compilation unit and prints it together
//! with its hash, so two generations can be compared at a glance.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::debug;

use ktjar_lib::dep_files::CompilerKind;
use ktjar_lib::util::hash::Hashable;
use ktjar_lib::util::path::normalize;
use ktjar_lib::{BuildPaths, CompileMode, JavacStepFactory, KotlinStepFactory, Step, StepContext, ToolchainConfig};

use super::load_unit;
use crate::output::{OutputFormat, print_json, print_stat, print_success, symbols};

#[derive(Serialize)]
struct StepsOutput<'a> {
  target: String,
  mode: CompileMode,
  hash: String,
  steps: &'a [Step],
  dep_files: Vec<(CompilerKind, &'a Path)>,
}

pub fn cmd_steps(
  unit_path: &Path,
  config: Option<&Path>,
  root: &Path,
  ignored: &[PathBuf],
  verbose: bool,
  output: OutputFormat,
) -> Result<()> {
  let unit = load_unit(unit_path)?;
  let toolchain = match config {
    Some(path) => ToolchainConfig::load(path).context("Failed to load toolchain config")?,
    None => ToolchainConfig::default(),
  };
  let root = absolute_root(root)?;
  debug!(root = %root.display(), "resolved project root");

  let ctx = StepContext::new(root, BuildPaths::current()).with_ignored_paths(ignored.iter().cloned());
  let plan = KotlinStepFactory::new(toolchain)
    .create_compile_steps(&ctx, &unit, &JavacStepFactory::new())
    .with_context(|| format!("Failed to generate steps for {}", unit.target))?;
  let hash = plan.steps.compute_hash().context("Failed to compute step hash")?;

  if output.is_json() {
    return print_json(&StepsOutput {
      target: unit.target.to_string(),
      mode: plan.mode,
      hash: hash.0,
      steps: plan.steps.steps(),
      dep_files: plan.dep_files.iter().collect(),
    });
  }

  print_success(&format!("{} ({:?})", unit.target, plan.mode));
  print_stat("Hash", &hash.0);
  print_stat("Steps", &plan.steps.len().to_string());
  println!();
  for (index, step) in plan.steps.iter().enumerate() {
    println!(
      "  {:>2}. {}",
      index + 1,
      step.if_supports_color(Stream::Stdout, |s| s.cyan())
    );
    if !verbose {
      continue;
    }
    if let Step::Kotlinc(kotlinc) = step {
      for arg in &kotlinc.extra_arguments {
        println!(
          "      {} {}",
          symbols::ARROW,
          arg.if_supports_color(Stream::Stdout, |s| s.dimmed())
        );
      }
    }
  }

  println!();
  println!("Dependency files:");
  for (kind, path) in plan.dep_files.iter() {
    println!("  {} {:?}: {}", symbols::INFO, kind, path.display());
  }

  Ok(())
}

fn absolute_root(root: &Path) -> Result<PathBuf> {
  if root.is_absolute() {
    return Ok(normalize(root));
  }
  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  Ok(normalize(&cwd.join(root)))
}
