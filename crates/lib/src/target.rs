//! Compilation unit identity.
//!
//! Every staged directory a unit touches is derived from its [`TargetId`], so
//! two units never share scratch space and regenerating steps for the same
//! unit always lands on the same paths.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StepError;

/// Identity of a buildable library or test target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId {
  /// Directory of the build file, relative to the cell root (e.g. `java/com/foo`).
  pub cell_relative_base_path: String,
  /// Target name within its package (e.g. `lib`).
  pub short_name: String,
  /// Flavors applied to the target.
  #[serde(default)]
  pub flavors: BTreeSet<String>,
}

impl TargetId {
  pub fn new(base_path: impl Into<String>, short_name: impl Into<String>) -> Self {
    Self {
      cell_relative_base_path: base_path.into(),
      short_name: short_name.into(),
      flavors: BTreeSet::new(),
    }
  }

  pub fn with_flavor(mut self, flavor: impl Into<String>) -> Self {
    self.flavors.insert(flavor.into());
    self
  }

  pub fn is_flavored(&self) -> bool {
    !self.flavors.is_empty()
  }

  /// `name` for plain targets, `name#f1,f2` for flavored ones.
  pub fn short_name_and_flavor_postfix(&self) -> String {
    if self.flavors.is_empty() {
      return self.short_name.clone();
    }
    let flavors: Vec<&str> = self.flavors.iter().map(String::as_str).collect();
    format!("{}#{}", self.short_name, flavors.join(","))
  }

  /// Kotlin module name: base path with `/` turned into `.`, then the short name.
  pub fn module_name(&self) -> String {
    let base = self.cell_relative_base_path.trim_matches('/');
    if base.is_empty() {
      return self.short_name.clone();
    }
    format!("{}.{}", base.replace('/', "."), self.short_name)
  }

  /// Base path as a relative filesystem path.
  pub fn base_path(&self) -> PathBuf {
    PathBuf::from(self.cell_relative_base_path.trim_matches('/'))
  }

  /// Apply `format` to the last path segment, substituting `%s` with the
  /// short name and flavor postfix.
  pub fn format_last_segment(&self, format: &str) -> Result<String, StepError> {
    if format.starts_with('/') {
      return Err(StepError::InvalidPathFormat(format.to_string()));
    }
    Ok(format.replace("%s", &self.short_name_and_flavor_postfix()))
  }
}

impl std::fmt::Display for TargetId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "//{}:{}",
      self.cell_relative_base_path.trim_matches('/'),
      self.short_name_and_flavor_postfix()
    )
  }
}
