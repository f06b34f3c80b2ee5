//! Lexical path helpers.
//!
//! Nothing in here touches the filesystem: step generation must stay free of
//! side effects, so paths are normalized by their components alone.

use std::path::{Component, Path, PathBuf};

use crate::consts::{KOTLIN_EXTENSION, SOURCE_ARCHIVE_SUFFIX};

/// Normalize a path by resolving `.` and `..` components.
///
/// A `..` that would climb above the root (or above the start of a relative
/// path) is kept as-is.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => normalized.push(".."),
      },
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Resolve `path` against `root` unless it is already absolute, then normalize.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    normalize(path)
  } else {
    normalize(&root.join(path))
  }
}

/// Make `path` relative to `root` when it lives under it.
///
/// Paths outside the root are returned unchanged.
pub fn relativize(root: &Path, path: &Path) -> PathBuf {
  match path.strip_prefix(root) {
    Ok(rel) => rel.to_path_buf(),
    Err(_) => path.to_path_buf(),
  }
}

/// Render a path the way it appears in a compiler argument.
pub fn arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

/// `true` for Kotlin source files (`*.kt`).
pub fn is_kotlin_source(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext == KOTLIN_EXTENSION)
}

/// `true` for pre-bundled source archives (`*.src.zip`).
pub fn is_source_archive(path: &Path) -> bool {
  path
    .file_name()
    .is_some_and(|name| name.to_string_lossy().ends_with(SOURCE_ARCHIVE_SUFFIX))
}
