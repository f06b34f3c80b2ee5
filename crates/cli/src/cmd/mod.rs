mod dep_files;
mod options;
mod stats;
mod steps;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ktjar_lib::CompilationUnit;

pub use dep_files::cmd_dep_files;
pub use options::cmd_options;
pub use stats::cmd_stats;
pub use steps::cmd_steps;

/// Read a compilation unit description.
fn load_unit(path: &Path) -> Result<CompilationUnit> {
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read unit description: {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse unit description: {}", path.display()))
}
