use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::paths::{BuildPaths, CompilerOutputPaths};
use crate::target::TargetId;
use crate::util::path::{is_kotlin_source, is_source_archive};

/// One library or test target's sources and outputs.
///
/// Owned by the caller and read-only for the duration of one step generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
  pub target: TargetId,
  /// Root-relative source files, including pre-bundled `.src.zip` archives.
  pub sources: BTreeSet<PathBuf>,
  pub output_paths: CompilerOutputPaths,
  /// Root-relative classpath declared by the rule.
  #[serde(default)]
  pub classpath: BTreeSet<PathBuf>,
  #[serde(default)]
  pub track_class_usage: bool,
}

impl CompilationUnit {
  /// A unit with no sources whose outputs follow the standard layout.
  pub fn new(target: TargetId, paths: &BuildPaths) -> Result<Self, StepError> {
    let output_paths = CompilerOutputPaths::of(&target, paths)?;
    Ok(Self {
      target,
      sources: BTreeSet::new(),
      output_paths,
      classpath: BTreeSet::new(),
      track_class_usage: false,
    })
  }

  pub fn with_sources<I, P>(mut self, sources: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.sources.extend(sources.into_iter().map(Into::into));
    self
  }

  pub fn with_classpath<I, P>(mut self, classpath: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.classpath.extend(classpath.into_iter().map(Into::into));
    self
  }

  pub fn tracking_class_usage(mut self) -> Self {
    self.track_class_usage = true;
    self
  }

  /// `true` when kotlinc has something to compile.
  pub fn has_kotlin_input(&self) -> bool {
    self
      .sources
      .iter()
      .any(|source| is_kotlin_source(source) || is_source_archive(source))
  }
}
