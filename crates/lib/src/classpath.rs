//! Deterministic classpath composition.
//!
//! The composed classpath feeds straight into the kotlinc argument list, which
//! is part of the cache key. It is therefore a totally ordered, duplicate-free
//! set: the same logical inputs always produce the same bytes, no matter which
//! group an entry came from or in what order the groups were listed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::friend_paths::RemapTable;
use crate::util::path::absolutize;

/// An absolute, normalized directory or archive contributing classes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClasspathEntry(PathBuf);

impl ClasspathEntry {
  /// Resolve `path` against `root` and normalize it.
  pub fn resolve(root: &Path, path: &Path) -> Self {
    Self(absolutize(root, path))
  }

  pub fn path(&self) -> &Path {
    &self.0
  }

  pub fn into_path(self) -> PathBuf {
    self.0
  }
}

impl AsRef<Path> for ClasspathEntry {
  fn as_ref(&self) -> &Path {
    &self.0
  }
}

/// The three input groups of a compile classpath.
#[derive(Debug, Clone, Copy)]
pub struct ClasspathGroups<'a> {
  /// Injected classpath (e.g. bootclasspath extensions), usually absolute.
  pub extra: &'a [PathBuf],
  /// Classpath declared by the rule, usually root-relative.
  pub declared: &'a BTreeSet<PathBuf>,
  /// Language runtime support libraries.
  pub runtime: &'a BTreeSet<PathBuf>,
}

/// Merge all groups into one ordered set, applying friend-path remaps.
pub fn compose(root: &Path, groups: ClasspathGroups<'_>, remap: &RemapTable) -> BTreeSet<ClasspathEntry> {
  groups
    .extra
    .iter()
    .chain(groups.declared.iter())
    .chain(groups.runtime.iter())
    .map(|path| {
      let entry = ClasspathEntry::resolve(root, path);
      match remap.get(entry.path()) {
        Some(staged) => ClasspathEntry(staged.clone()),
        None => entry,
      }
    })
    .collect()
}

/// Flatten a composed classpath into the form a step carries.
pub fn to_paths(classpath: &BTreeSet<ClasspathEntry>) -> Vec<PathBuf> {
  classpath.iter().map(|entry| entry.path().to_path_buf()).collect()
}
