//! Dependency files for the incremental engine.
//!
//! Each compiler that runs records the classpath members it actually used.
//! The incremental engine reads these records after a successful build to
//! decide what must be recompiled next time; their contents are opaque here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::step::{Step, StepSequence};
use crate::unit::CompilationUnit;

/// Which compiler wrote a dependency file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompilerKind {
  /// javac, the primary compiler.
  Java,
  /// kotlinc, the secondary compiler.
  Kotlin,
}

/// Receiver of build artifacts, e.g. the incremental engine's artifact list.
pub trait ArtifactRecorder {
  fn record_artifact(&mut self, path: &Path);
}

/// Dependency-file paths for one build invocation.
///
/// Write-once: built from a unit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFileSet {
  files: BTreeMap<CompilerKind, PathBuf>,
}

impl DependencyFileSet {
  /// The javac record always; the kotlinc record when the unit has Kotlin
  /// input. Use [`DependencyFileSet::for_steps`] for what a plan records.
  pub fn for_unit(unit: &CompilationUnit) -> Self {
    let mut files = BTreeMap::new();
    files.insert(CompilerKind::Java, unit.output_paths.java_dep_file());
    if unit.has_kotlin_input() {
      files.insert(CompilerKind::Kotlin, unit.output_paths.kotlin_dep_file());
    }
    Self { files }
  }

  /// The records of the compilers `steps` actually invoke.
  ///
  /// This is the set to register after generation: a primary factory may emit
  /// no javac step at all, and its record must then stay unregistered.
  pub fn for_steps(unit: &CompilationUnit, steps: &StepSequence) -> Self {
    let mut files = BTreeMap::new();
    for step in steps {
      match step {
        Step::Javac(_) => {
          files.insert(CompilerKind::Java, unit.output_paths.java_dep_file());
        }
        Step::Kotlinc(_) => {
          files.insert(CompilerKind::Kotlin, unit.output_paths.kotlin_dep_file());
        }
        _ => {}
      }
    }
    Self { files }
  }

  pub fn get(&self, kind: CompilerKind) -> Option<&Path> {
    self.files.get(&kind).map(PathBuf::as_path)
  }

  pub fn iter(&self) -> impl Iterator<Item = (CompilerKind, &Path)> {
    self.files.iter().map(|(kind, path)| (*kind, path.as_path()))
  }

  pub fn paths(&self) -> Vec<PathBuf> {
    self.files.values().cloned().collect()
  }

  /// Register the files with `recorder` when the unit tracks class usage.
  ///
  /// Only call this with a set returned alongside a successfully generated
  /// step sequence; a path for a compiler that never runs must not be recorded.
  pub fn record(&self, unit: &CompilationUnit, recorder: &mut dyn ArtifactRecorder) {
    if !unit.track_class_usage {
      return;
    }
    for (kind, path) in self.iter() {
      debug!(target = %unit.target, compiler = ?kind, path = %path.display(), "recording dep file");
      recorder.record_artifact(path);
    }
  }
}

/// Ordered dependency-file paths for `unit`.
pub fn dep_file_paths(unit: &CompilationUnit) -> Vec<PathBuf> {
  DependencyFileSet::for_unit(unit).paths()
}
