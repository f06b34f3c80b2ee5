//! Output tree layout.
//!
//! All paths produced here are relative to the project root and are pure
//! functions of the output root and a [`TargetId`]. Nothing is created on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{
  ANNOTATION_DIR, ANNOTATION_GEN_DIR_NAME, DEFAULT_OUT_DIR, GEN_DIR, JAVA_DEP_FILE, KOTLIN_DEP_FILE, OUT_DIR_ENV,
  SCRATCH_DIR, suffix,
};
use crate::error::StepError;
use crate::target::TargetId;

/// Roots of the generated output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPaths {
  pub gen_dir: PathBuf,
  pub annotation_dir: PathBuf,
  pub scratch_dir: PathBuf,
}

impl BuildPaths {
  pub fn new(out_dir: impl AsRef<Path>) -> Self {
    let out_dir = out_dir.as_ref();
    Self {
      gen_dir: out_dir.join(GEN_DIR),
      annotation_dir: out_dir.join(ANNOTATION_DIR),
      scratch_dir: out_dir.join(SCRATCH_DIR),
    }
  }

  /// Output roots for the current process, honoring `KTJAR_OUT_DIR`.
  pub fn current() -> Self {
    if let Ok(path) = std::env::var(OUT_DIR_ENV) {
      return Self::new(path);
    }

    Self::default_paths()
  }

  pub fn default_paths() -> Self {
    Self::new(DEFAULT_OUT_DIR)
  }

  /// `gen/<base>/<format>` for the target.
  pub fn gen_path(&self, target: &TargetId, format: &str) -> Result<PathBuf, StepError> {
    relative_path(&self.gen_dir, target, format)
  }

  /// `annotation/<base>/<format>` for the target.
  pub fn annotation_path(&self, target: &TargetId, format: &str) -> Result<PathBuf, StepError> {
    relative_path(&self.annotation_dir, target, format)
  }

  /// `bin/<base>/<format>` for the target.
  pub fn scratch_path(&self, target: &TargetId, format: &str) -> Result<PathBuf, StepError> {
    relative_path(&self.scratch_dir, target, format)
  }

  /// Root into which kapt output is merged before it is zipped.
  pub fn kapt_annotation_gen_path(&self, target: &TargetId) -> Result<PathBuf, StepError> {
    let format = if target.is_flavored() {
      suffix::FLAVORED_ANNOTATION_GEN
    } else {
      suffix::UNFLAVORED_ANNOTATION_GEN
    };
    Ok(self.gen_path(target, format)?.join(ANNOTATION_GEN_DIR_NAME))
  }
}

impl Default for BuildPaths {
  fn default() -> Self {
    Self::default_paths()
  }
}

fn relative_path(root: &Path, target: &TargetId, format: &str) -> Result<PathBuf, StepError> {
  Ok(root.join(target.base_path()).join(target.format_last_segment(format)?))
}

/// Where the compilers of one unit write their results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilerOutputPaths {
  pub classes_dir: PathBuf,
  pub output_jar_dir: PathBuf,
  pub path_to_sources_list: PathBuf,
  pub working_directory: PathBuf,
}

impl CompilerOutputPaths {
  pub fn of(target: &TargetId, paths: &BuildPaths) -> Result<Self, StepError> {
    Ok(Self {
      classes_dir: paths.scratch_path(target, suffix::CLASSES)?,
      output_jar_dir: paths.gen_path(target, suffix::OUTPUT_JAR_DIR)?,
      path_to_sources_list: paths.gen_path(target, suffix::SOURCES_LIST)?,
      working_directory: paths.gen_path(target, suffix::WORKING_DIRECTORY)?,
    })
  }

  /// Used-classes record written by javac.
  pub fn java_dep_file(&self) -> PathBuf {
    self.output_jar_dir.join(JAVA_DEP_FILE)
  }

  /// Used-classes record written by kotlinc.
  pub fn kotlin_dep_file(&self) -> PathBuf {
    self.output_jar_dir.join(KOTLIN_DEP_FILE)
  }
}
