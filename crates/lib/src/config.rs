//! Toolchain configuration.
//!
//! Everything here is part of the cache key of every unit compiled with it:
//! it is plain data, loaded once from JSON and never mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primary::JavacOptions;

/// Which tool runs annotation processors for units with Kotlin sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationProcessingTool {
  /// kotlinc's kapt plugin. Falls back to javac when kotlinc does not run.
  #[default]
  Kapt,
  /// javac, during the delegated Java pass.
  Javac,
}

/// Kotlin toolchain and rule-level compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  /// kotlinc command line prefix.
  pub kotlinc: Vec<String>,
  /// Runtime libraries added to every Kotlin classpath.
  pub kotlin_home_libraries: BTreeSet<PathBuf>,
  pub standard_library_classpath: Option<PathBuf>,
  /// The kapt plugin jar.
  pub annotation_processing_classpath: Option<PathBuf>,
  /// Appended after every generated argument.
  pub extra_kotlinc_arguments: Vec<String>,
  /// Compiler plugin jar → plugin options.
  pub kotlin_compiler_plugins: BTreeMap<PathBuf, BTreeMap<String, String>>,
  pub friend_paths: Vec<PathBuf>,
  pub annotation_processing_tool: AnnotationProcessingTool,
  pub jvm_target: Option<String>,
  /// Injected classpath, e.g. bootclasspath extensions.
  pub extra_classpath: Vec<PathBuf>,
  pub javac_options: JavacOptions,
  pub generate_annotation_processing_stats: bool,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      kotlinc: vec!["kotlinc".to_string()],
      kotlin_home_libraries: BTreeSet::new(),
      standard_library_classpath: None,
      annotation_processing_classpath: None,
      extra_kotlinc_arguments: Vec::new(),
      kotlin_compiler_plugins: BTreeMap::new(),
      friend_paths: Vec::new(),
      annotation_processing_tool: AnnotationProcessingTool::default(),
      jvm_target: None,
      extra_classpath: Vec::new(),
      javac_options: JavacOptions::default(),
      generate_annotation_processing_stats: false,
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid config {path}: {message}")]
  Invalid { path: PathBuf, message: String },
}

impl ToolchainConfig {
  /// Load a JSON config file. Missing fields take their defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate().map_err(|message| ConfigError::Invalid {
      path: path.to_path_buf(),
      message,
    })?;
    Ok(config)
  }

  fn validate(&self) -> Result<(), String> {
    if self.kotlinc.is_empty() {
      return Err("kotlinc command must not be empty".to_string());
    }
    if self.jvm_target.as_deref().is_some_and(str::is_empty) {
      return Err("jvm_target must not be empty when set".to_string());
    }
    Ok(())
  }
}
