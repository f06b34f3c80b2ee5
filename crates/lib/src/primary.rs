//! The primary-language (javac) collaborator.
//!
//! Kotlin compilation delegates every residual source to a
//! [`PrimaryStepFactory`]. The factory only sees [`CompilerParameters`]; it
//! does not need to know a Kotlin pass ran before it.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::paths::CompilerOutputPaths;
use crate::step::{JavacStep, Step};
use crate::target::TargetId;
use crate::util::path::arg;

/// One annotation processor plugin: the processors it provides and the
/// classpath needed to load them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProcessorPlugin {
  pub processor_names: BTreeSet<String>,
  /// Root-relative or absolute jars.
  pub classpath: Vec<PathBuf>,
}

/// Annotation processing requested for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AnnotationProcessorParams {
  #[serde(default)]
  pub plugins: Vec<ProcessorPlugin>,
  /// Processor options as `key=value` strings.
  #[serde(default)]
  pub parameters: BTreeSet<String>,
}

impl AnnotationProcessorParams {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.plugins.is_empty()
  }

  /// All processor names across plugins, in plugin order.
  pub fn processor_names(&self) -> impl Iterator<Item = &str> {
    self
      .plugins
      .iter()
      .flat_map(|plugin| plugin.processor_names.iter().map(String::as_str))
  }
}

/// javac configuration that travels with a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct JavacOptions {
  #[serde(default)]
  pub source_level: Option<String>,
  #[serde(default)]
  pub target_level: Option<String>,
  #[serde(default)]
  pub annotation_processors: AnnotationProcessorParams,
  #[serde(default)]
  pub extra_arguments: Vec<String>,
}

impl JavacOptions {
  pub fn has_annotation_processing(&self) -> bool {
    !self.annotation_processors.is_empty()
  }

  /// Same options with annotation processing replaced.
  pub fn with_annotation_processors(&self, params: AnnotationProcessorParams) -> Self {
    Self {
      annotation_processors: params,
      ..self.clone()
    }
  }
}

/// What the primary compiler is asked to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerParameters {
  /// Root-relative sources, in compile order.
  pub sources: Vec<PathBuf>,
  /// Classpath, in lookup order.
  pub classpath: Vec<PathBuf>,
  pub output_paths: CompilerOutputPaths,
  pub track_class_usage: bool,
}

/// Step factory for the host language.
pub trait PrimaryStepFactory {
  /// Produce the ordered steps compiling `params`.
  fn create_compile_steps(
    &self,
    target: &TargetId,
    options: &JavacOptions,
    params: &CompilerParameters,
  ) -> Result<Vec<Step>, StepError>;
}

/// Default primary factory: one javac invocation over all sources.
///
/// The unit's classes directory is prepared by the enclosing rule, so no
/// directory steps are emitted here.
#[derive(Debug, Clone, Default)]
pub struct JavacStepFactory;

impl JavacStepFactory {
  pub fn new() -> Self {
    Self
  }

  fn arguments(options: &JavacOptions) -> Result<Vec<String>, StepError> {
    let mut args = Vec::new();
    if let Some(source) = &options.source_level {
      args.extend(["-source".to_string(), source.clone()]);
    }
    if let Some(target) = &options.target_level {
      args.extend(["-target".to_string(), target.clone()]);
    }

    let processors = &options.annotation_processors;
    if processors.is_empty() {
      args.push("-proc:none".to_string());
    } else {
      let processorpath: Vec<String> = processors
        .plugins
        .iter()
        .flat_map(|plugin| plugin.classpath.iter().map(|p| arg(p)))
        .collect();
      args.extend(["-processorpath".to_string(), processorpath.join(":")]);
      let names: Vec<&str> = processors.processor_names().collect();
      args.extend(["-processor".to_string(), names.join(",")]);
      for parameter in &processors.parameters {
        if !parameter.contains('=') {
          return Err(StepError::MalformedProcessorParameter(parameter.clone()));
        }
        args.push(format!("-A{parameter}"));
      }
    }

    args.extend(options.extra_arguments.iter().cloned());
    Ok(args)
  }
}

impl PrimaryStepFactory for JavacStepFactory {
  fn create_compile_steps(
    &self,
    target: &TargetId,
    options: &JavacOptions,
    params: &CompilerParameters,
  ) -> Result<Vec<Step>, StepError> {
    if params.sources.is_empty() {
      return Ok(Vec::new());
    }

    Ok(vec![Step::Javac(JavacStep {
      target: target.clone(),
      output_dir: params.output_paths.classes_dir.clone(),
      sources: params.sources.clone(),
      path_to_sources_list: params.output_paths.path_to_sources_list.clone(),
      classpath: params.classpath.clone(),
      arguments: Self::arguments(options)?,
      dep_file: params
        .track_class_usage
        .then(|| params.output_paths.java_dep_file()),
    })])
  }
}
