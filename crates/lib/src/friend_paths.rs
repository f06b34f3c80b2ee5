//! Friend-path sanitizing.
//!
//! kotlinc receives friend paths as one `-Xfriend-paths=` argument joined by
//! `,`, and cannot parse a path that itself contains a comma. Such paths are
//! copied to a comma-free location under the unit's scratch space, and the
//! origin → staged mapping is recorded so the general classpath points at the
//! same staged copy.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{FRIEND_PATH_SEPARATOR, FRIEND_PATH_SEPARATOR_REPLACEMENT, flag};
use crate::step::{CopySourceMode, Step};
use crate::util::path::{absolutize, arg};

/// Origin path → staged copy, scoped to one invocation.
pub type RemapTable = BTreeMap<PathBuf, PathBuf>;

/// Result of [`sanitize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedFriendPaths {
  /// Absolute friend paths, none containing the separator.
  pub paths: BTreeSet<PathBuf>,
  pub remap: RemapTable,
  /// `Mkdir` + `Copy` steps staging the remapped paths. Empty when nothing
  /// needed remapping.
  pub steps: Vec<Step>,
}

/// Replace every separator in `name` so it can be joined safely.
pub fn strip_separator(name: &str) -> String {
  name.replace(FRIEND_PATH_SEPARATOR, FRIEND_PATH_SEPARATOR_REPLACEMENT)
}

/// Scratch directory with the separator removed from its last segment.
pub fn sanitized_scratch_dir(scratch_dir: &Path) -> PathBuf {
  match (scratch_dir.parent(), scratch_dir.file_name()) {
    (Some(parent), Some(name)) => parent.join(strip_separator(&name.to_string_lossy())),
    _ => scratch_dir.to_path_buf(),
  }
}

/// Stage every friend path containing the separator into `scratch_dir`.
///
/// `scratch_dir` is root-relative; staged copies are absolute. The scratch
/// directory is only created when at least one path is remapped, so units
/// without problematic paths never see it appear or disappear.
pub fn sanitize(root: &Path, friend_paths: &[PathBuf], scratch_dir: &Path) -> SanitizedFriendPaths {
  let scratch_dir = root.join(sanitized_scratch_dir(scratch_dir));
  let mut result = SanitizedFriendPaths::default();
  let mut staged_names = BTreeSet::new();

  for friend_path in friend_paths {
    let origin = absolutize(root, friend_path);
    if !origin.to_string_lossy().contains(FRIEND_PATH_SEPARATOR) {
      result.paths.insert(origin);
      continue;
    }
    if let Some(staged) = result.remap.get(&origin) {
      result.paths.insert(staged.clone());
      continue;
    }

    if result.remap.is_empty() {
      result.steps.push(Step::Mkdir {
        path: scratch_dir.clone(),
      });
    }

    let file_name = origin
      .file_name()
      .map(|name| strip_separator(&name.to_string_lossy()))
      .unwrap_or_default();
    let staged_name = unique_name(&mut staged_names, file_name);
    let staged = scratch_dir.join(staged_name);

    debug!(origin = %origin.display(), staged = %staged.display(), "staging friend path");
    result.steps.push(Step::Copy {
      source: origin.clone(),
      destination: staged.clone(),
      mode: CopySourceMode::File,
    });
    result.paths.insert(staged.clone());
    result.remap.insert(origin, staged);
  }

  result
}

/// Claim `name` in `taken`, prefixing `<n>_` until it is unused.
fn unique_name(taken: &mut BTreeSet<String>, name: String) -> String {
  if taken.insert(name.clone()) {
    return name;
  }
  let mut n = 1;
  loop {
    let candidate = format!("{n}_{name}");
    if taken.insert(candidate.clone()) {
      return candidate;
    }
    n += 1;
  }
}

/// `-Xfriend-paths=<a>,<b>` with paths sorted, or `""` when there are none.
///
/// The empty string is still passed so the argument list keeps its shape.
pub fn friend_paths_argument(paths: &BTreeSet<PathBuf>) -> String {
  if paths.is_empty() {
    return String::new();
  }
  let joined: BTreeSet<String> = paths.iter().map(|p| arg(p)).collect();
  let joined: Vec<String> = joined.into_iter().collect();
  format!("{}{}", flag::FRIEND_PATHS, joined.join(","))
}
