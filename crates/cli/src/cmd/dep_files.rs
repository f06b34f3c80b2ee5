use std::path::Path;

use anyhow::Result;

use ktjar_lib::dep_files::DependencyFileSet;

use super::load_unit;
use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_dep_files(unit_path: &Path, output: OutputFormat) -> Result<()> {
  let unit = load_unit(unit_path)?;
  let files = DependencyFileSet::for_unit(&unit);

  if output.is_json() {
    return print_json(&files);
  }

  for (kind, path) in files.iter() {
    print_info(&format!("{:?}: {}", kind, path.display()));
  }
  Ok(())
}
