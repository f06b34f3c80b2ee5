use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::CompilerOutputPaths;
use crate::target::TargetId;
use crate::util::hash::Hashable;

/// How a [`Step::Copy`] treats its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopySourceMode {
  /// Copy a single file.
  File,
  /// Copy the directory itself into the destination.
  Directory,
  /// Copy only the directory's children, so the destination does not gain
  /// an extra nesting level.
  DirectoryContentsOnly,
}

/// One kotlinc invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KotlincStep {
  pub target: TargetId,
  /// The kotlinc command (binary path or launcher).
  pub kotlinc: Vec<String>,
  pub output_dir: PathBuf,
  pub sources: Vec<PathBuf>,
  pub path_to_sources_list: PathBuf,
  /// Absolute, sorted, de-duplicated classpath.
  pub classpath: Vec<PathBuf>,
  /// Arguments in the exact order they are passed.
  pub extra_arguments: Vec<String>,
  pub verbose_flags: Vec<String>,
  pub output_paths: CompilerOutputPaths,
  /// Where kotlinc records used classes, when class usage is tracked.
  pub dep_file: Option<PathBuf>,
  /// Directories compiler plugins (kapt included) generate into.
  pub generated_dirs: Vec<PathBuf>,
}

/// One javac invocation emitted by the default primary step factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JavacStep {
  pub target: TargetId,
  pub output_dir: PathBuf,
  pub sources: Vec<PathBuf>,
  pub path_to_sources_list: PathBuf,
  pub classpath: Vec<PathBuf>,
  pub arguments: Vec<String>,
  pub dep_file: Option<PathBuf>,
}

/// A single build step.
///
/// Steps are pure descriptions: generating them never touches the filesystem.
/// The execution engine runs a [`StepSequence`] in order and stops at the first
/// failing step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
  /// Remove `path` if present and recreate it empty.
  MakeCleanDir { path: PathBuf },
  /// Create `path` (and parents) if missing.
  Mkdir { path: PathBuf },
  Copy {
    source: PathBuf,
    destination: PathBuf,
    mode: CopySourceMode,
  },
  /// Archive `source_dir` into `output`, with entries relative to `source_dir`.
  /// Root-relative paths in `ignored` (and everything below them) are left out.
  Zip {
    root: PathBuf,
    output: PathBuf,
    source_dir: PathBuf,
    ignored: BTreeSet<PathBuf>,
  },
  Kotlinc(KotlincStep),
  /// Read a kapt timing report and forward it to the build-event stream.
  ParseProcessorStats { report: PathBuf, target: TargetId },
  Javac(JavacStep),
}

impl Step {
  /// Short, stable name of the step kind.
  pub fn short_name(&self) -> &'static str {
    match self {
      Step::MakeCleanDir { .. } => "make_clean_dir",
      Step::Mkdir { .. } => "mkdir",
      Step::Copy { .. } => "copy",
      Step::Zip { .. } => "zip",
      Step::Kotlinc(_) => "kotlinc",
      Step::ParseProcessorStats { .. } => "kapt_stats",
      Step::Javac(_) => "javac",
    }
  }

  /// Directory this step prepares, if any.
  pub fn prepared_dir(&self) -> Option<&Path> {
    match self {
      Step::MakeCleanDir { path } | Step::Mkdir { path } => Some(path.as_path()),
      _ => None,
    }
  }

  /// Paths this step writes into.
  pub fn written_paths(&self) -> Vec<&Path> {
    match self {
      Step::MakeCleanDir { .. } | Step::Mkdir { .. } | Step::ParseProcessorStats { .. } => Vec::new(),
      Step::Copy { destination, .. } => vec![destination.as_path()],
      Step::Zip { output, .. } => vec![output.as_path()],
      Step::Kotlinc(step) => {
        let mut paths = vec![step.output_dir.as_path(), step.path_to_sources_list.as_path()];
        paths.extend(step.dep_file.as_deref());
        paths.extend(step.generated_dirs.iter().map(PathBuf::as_path));
        paths
      }
      Step::Javac(step) => {
        let mut paths = vec![step.output_dir.as_path(), step.path_to_sources_list.as_path()];
        paths.extend(step.dep_file.as_deref());
        paths
      }
    }
  }
}

impl std::fmt::Display for Step {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Step::MakeCleanDir { path } => write!(f, "rm -rf {0} && mkdir -p {0}", path.display()),
      Step::Mkdir { path } => write!(f, "mkdir -p {}", path.display()),
      Step::Copy {
        source,
        destination,
        mode,
      } => match mode {
        CopySourceMode::File => write!(f, "cp {} {}", source.display(), destination.display()),
        CopySourceMode::Directory => write!(f, "cp -R {} {}", source.display(), destination.display()),
        CopySourceMode::DirectoryContentsOnly => {
          write!(f, "cp -R {}/. {}", source.display(), destination.display())
        }
      },
      Step::Zip { output, source_dir, .. } => {
        write!(f, "zip {} {}", output.display(), source_dir.display())
      }
      Step::Kotlinc(step) => write!(f, "kotlinc {} ({} sources)", step.target, step.sources.len()),
      Step::ParseProcessorStats { report, .. } => write!(f, "kapt_stats {}", report.display()),
      Step::Javac(step) => write!(f, "javac {} ({} sources)", step.target, step.sources.len()),
    }
  }
}

/// The ordered steps that build one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSequence {
  steps: Vec<Step>,
}

impl Hashable for StepSequence {}

impl StepSequence {
  pub fn new() -> Self {
    Self { steps: Vec::new() }
  }

  pub fn push(&mut self, step: Step) {
    self.steps.push(step);
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Step> {
    self.steps.iter()
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn into_steps(self) -> Vec<Step> {
    self.steps
  }

  /// Index of the first step matching `predicate`.
  pub fn position(&self, predicate: impl Fn(&Step) -> bool) -> Option<usize> {
    self.steps.iter().position(predicate)
  }

  /// Find the first step that writes into a directory the sequence prepares
  /// only at a later index.
  ///
  /// Returns `None` when every write happens after its directory has been
  /// created. Writes into directories the sequence never prepares are not
  /// checked; those belong to someone else.
  pub fn first_unprepared_write(&self) -> Option<(usize, PathBuf)> {
    let prepared: Vec<(usize, &Path)> = self
      .steps
      .iter()
      .enumerate()
      .filter_map(|(index, step)| step.prepared_dir().map(|dir| (index, dir)))
      .collect();

    for (index, step) in self.steps.iter().enumerate() {
      for written in step.written_paths() {
        let owners = prepared.iter().filter(|(_, dir)| written.starts_with(dir));
        let mut ready = false;
        let mut later = false;
        for (prepared_at, _) in owners {
          if *prepared_at < index {
            ready = true;
          } else {
            later = true;
          }
        }
        if later && !ready {
          return Some((index, written.to_path_buf()));
        }
      }
    }
    None
  }
}

impl Extend<Step> for StepSequence {
  fn extend<T: IntoIterator<Item = Step>>(&mut self, iter: T) {
    self.steps.extend(iter);
  }
}

impl From<Vec<Step>> for StepSequence {
  fn from(steps: Vec<Step>) -> Self {
    Self { steps }
  }
}

impl<'a> IntoIterator for &'a StepSequence {
  type Item = &'a Step;
  type IntoIter = std::slice::Iter<'a, Step>;

  fn into_iter(self) -> Self::IntoIter {
    self.steps.iter()
  }
}
