//! Annotation processing through the kapt compiler plugin.
//!
//! Only used when a unit has Kotlin input and Java annotation processors are
//! configured with the kapt tool. The pipeline has three parts:
//!
//! 1. [`KaptDirs::preparation_steps`] - clean every staged directory up front
//! 2. [`AnnotationProcessingConfig::plugin_arguments`] - kotlinc arguments
//!    enabling the plugin
//! 3. [`AnnotationProcessingConfig::post_compile_steps`] - merge, archive and
//!    copy the generated output once kotlinc has finished
//!
//! The generated-source archive is handed to the javac pass as an extra source.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ToolchainConfig;
use crate::consts::{AP_STATS_REPORT_FILE, GENERATED_SOURCE_ZIP, flag, kapt, suffix};
use crate::error::StepError;
use crate::options::encode_options;
use crate::paths::BuildPaths;
use crate::primary::AnnotationProcessorParams;
use crate::step::{CopySourceMode, Step};
use crate::target::TargetId;
use crate::util::path::{absolutize, arg};

/// Root-relative directories staged for one kapt run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaptDirs {
  pub stubs: PathBuf,
  pub classes: PathBuf,
  pub sources: PathBuf,
  pub kapt_generated: PathBuf,
  pub reports: PathBuf,
  /// Canonical root all generated output is merged into.
  pub annotation_gen: PathBuf,
  pub gen_output_folder: PathBuf,
  /// `generated.src.zip` inside `gen_output_folder`.
  pub gen_output: PathBuf,
}

impl KaptDirs {
  pub fn for_target(paths: &BuildPaths, target: &TargetId) -> Result<Self, StepError> {
    let gen_output_folder = paths.gen_path(target, suffix::GEN_SOURCES)?;
    Ok(Self {
      stubs: paths.annotation_path(target, suffix::KAPT_STUBS)?,
      classes: paths.annotation_path(target, suffix::KAPT_CLASSES)?,
      sources: paths.annotation_path(target, suffix::KAPT_SOURCES)?,
      kapt_generated: paths.annotation_path(target, suffix::KAPT_GENERATED)?,
      reports: paths.annotation_path(target, suffix::KAPT_REPORTS)?,
      annotation_gen: paths.kapt_annotation_gen_path(target)?,
      gen_output: gen_output_folder.join(GENERATED_SOURCE_ZIP),
      gen_output_folder,
    })
  }

  /// Clean every staged directory. Must run before kotlinc starts.
  pub fn preparation_steps(&self) -> Vec<Step> {
    [
      &self.stubs,
      &self.classes,
      &self.kapt_generated,
      &self.sources,
      &self.annotation_gen,
      &self.gen_output_folder,
      &self.reports,
    ]
    .into_iter()
    .map(|path| Step::MakeCleanDir { path: path.clone() })
    .collect()
  }

  pub fn stats_report(&self) -> PathBuf {
    self.reports.join(AP_STATS_REPORT_FILE)
  }
}

/// Everything kapt needs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationProcessingConfig {
  /// Absolute path of the kapt plugin jar.
  pub plugin_jar: PathBuf,
  /// Absolute processor classpath: plugin jar, stdlib, then processor jars.
  pub processor_classpath: Vec<PathBuf>,
  pub processor_names: Vec<String>,
  /// Processor options, seeded with the generated-sources key.
  pub options: BTreeMap<String, String>,
  /// `-source`/`-target` for kapt's embedded javac.
  pub javac_arguments: BTreeMap<String, String>,
  pub dirs: KaptDirs,
  pub report_stats: bool,
}

impl AnnotationProcessingConfig {
  /// Assemble the configuration, failing before any step exists when the
  /// toolchain is missing a required jar or an option is malformed.
  pub fn new(
    root: &Path,
    target: &TargetId,
    dirs: KaptDirs,
    params: &AnnotationProcessorParams,
    toolchain: &ToolchainConfig,
  ) -> Result<Self, StepError> {
    let plugin_jar = toolchain
      .annotation_processing_classpath
      .as_deref()
      .map(|p| absolutize(root, p))
      .ok_or_else(|| StepError::MissingAnnotationProcessingClasspath {
        target: target.to_string(),
      })?;
    let stdlib = toolchain
      .standard_library_classpath
      .as_deref()
      .map(|p| absolutize(root, p))
      .ok_or_else(|| StepError::MissingStandardLibrary {
        target: target.to_string(),
      })?;

    let mut processor_classpath = vec![plugin_jar.clone(), stdlib];
    processor_classpath.extend(
      params
        .plugins
        .iter()
        .flat_map(|plugin| plugin.classpath.iter().map(|p| absolutize(root, p))),
    );

    let mut options = BTreeMap::new();
    options.insert(
      kapt::KOTLIN_GENERATED_KEY.to_string(),
      arg(&root.join(&dirs.kapt_generated)),
    );
    options.extend(parse_parameters(params)?);

    let mut javac_arguments = BTreeMap::new();
    if let Some(jvm_target) = &toolchain.jvm_target {
      javac_arguments.insert("-source".to_string(), jvm_target.clone());
      javac_arguments.insert("-target".to_string(), jvm_target.clone());
    }

    Ok(Self {
      plugin_jar,
      processor_classpath,
      processor_names: params.processor_names().map(str::to_string).collect(),
      options,
      javac_arguments,
      dirs,
      report_stats: toolchain.generate_annotation_processing_stats,
    })
  }

  /// kotlinc arguments loading and configuring the kapt plugin.
  pub fn plugin_arguments(&self, root: &Path) -> Result<Vec<String>, StepError> {
    let mut plugin_options = Vec::new();
    for path in &self.processor_classpath {
      plugin_options.push(plugin_option(kapt::AP_CLASSPATH, &arg(path)));
    }
    for name in &self.processor_names {
      plugin_options.push(plugin_option(kapt::PROCESSORS, name));
    }
    plugin_options.push(plugin_option(kapt::SOURCES, &arg(&root.join(&self.dirs.sources))));
    plugin_options.push(plugin_option(kapt::CLASSES, &arg(&root.join(&self.dirs.classes))));
    plugin_options.push(plugin_option(kapt::STUBS, &arg(&root.join(&self.dirs.stubs))));
    plugin_options.push(plugin_option(kapt::AP_OPTIONS, &encode_options(&self.options)?));
    plugin_options.push(plugin_option(
      kapt::JAVAC_ARGUMENTS,
      &encode_options(&self.javac_arguments)?,
    ));
    // Generated code may reference types that are not compiled yet.
    plugin_options.push(plugin_option(kapt::LIGHT_ANALYSIS, "true"));
    plugin_options.push(plugin_option(kapt::CORRECT_ERROR_TYPES, "true"));
    if self.report_stats {
      plugin_options.push(plugin_option(
        kapt::DUMP_PROCESSOR_TIMINGS,
        &arg(&root.join(self.dirs.stats_report())),
      ));
    }

    debug!(count = plugin_options.len(), "built kapt plugin options");

    Ok(vec![
      format!("{}{}", flag::X_PLUGIN, arg(&self.plugin_jar)),
      flag::PLUGIN.to_string(),
      format!(
        "{}{}{},{}",
        kapt::PLUGIN_PREFIX,
        kapt::APT_MODE,
        kapt::APT_MODE_COMPILE,
        plugin_options.join(",")
      ),
    ])
  }

  /// Directories kotlinc writes into while the plugin runs.
  pub fn kotlinc_outputs(&self) -> Vec<PathBuf> {
    let dirs = &self.dirs;
    let mut outputs = vec![
      dirs.stubs.clone(),
      dirs.classes.clone(),
      dirs.sources.clone(),
      dirs.kapt_generated.clone(),
    ];
    if self.report_stats {
      outputs.push(dirs.reports.clone());
    }
    outputs
  }

  /// Steps that run strictly after kotlinc.
  ///
  /// `ignored` paths are kept out of the generated-source archive.
  pub fn post_compile_steps(
    &self,
    root: &Path,
    target: &TargetId,
    classes_dir: &Path,
    ignored: &BTreeSet<PathBuf>,
  ) -> Vec<Step> {
    let dirs = &self.dirs;
    let mut steps: Vec<Step> = [&dirs.sources, &dirs.classes, &dirs.kapt_generated]
      .into_iter()
      .map(|source| Step::Copy {
        source: source.clone(),
        destination: dirs.annotation_gen.clone(),
        mode: CopySourceMode::DirectoryContentsOnly,
      })
      .collect();

    if self.report_stats {
      steps.push(Step::ParseProcessorStats {
        report: root.join(dirs.stats_report()),
        target: target.clone(),
      });
    }

    steps.push(Step::Zip {
      root: root.to_path_buf(),
      output: dirs.gen_output.clone(),
      source_dir: dirs.annotation_gen.clone(),
      ignored: ignored.clone(),
    });

    // Generated classes (including META-INF resources) belong in the jar.
    steps.push(Step::Copy {
      source: dirs.classes.clone(),
      destination: classes_dir.to_path_buf(),
      mode: CopySourceMode::DirectoryContentsOnly,
    });

    steps
  }

  /// The source archive the javac pass must compile.
  pub fn generated_sources(&self) -> &Path {
    &self.dirs.gen_output
  }
}

/// `plugin:org.jetbrains.kotlin.kapt3:<name><value>`
fn plugin_option(name: &str, value: &str) -> String {
  format!("{}{}{}", kapt::PLUGIN_PREFIX, name, value)
}

/// Split `key=value` processor parameters. Both halves must be non-empty.
fn parse_parameters(params: &AnnotationProcessorParams) -> Result<BTreeMap<String, String>, StepError> {
  let mut parsed = BTreeMap::new();
  for parameter in &params.parameters {
    match parameter.split_once('=') {
      Some((key, value)) if !key.is_empty() && !value.is_empty() && !value.contains('=') => {
        parsed.insert(key.to_string(), value.to_string());
      }
      _ => return Err(StepError::MalformedProcessorParameter(parameter.clone())),
    }
  }
  Ok(parsed)
}
