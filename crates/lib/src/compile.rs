//! Kotlin compile-to-jar step generation.
//!
//! [`KotlinStepFactory::create_compile_steps`] turns a [`CompilationUnit`] into
//! the ordered [`StepSequence`] that compiles it. The first decision is the
//! [`CompileMode`]; every later choice follows from it:
//!
//! | Mode                | kapt dirs | kotlinc | kapt post-steps | javac processors |
//! |---------------------|-----------|---------|-----------------|------------------|
//! | `JavaOnly`          | no        | no      | no              | kept             |
//! | `KotlinWithKapt`    | yes       | yes     | yes             | cleared          |
//! | `KotlinWithoutKapt` | no        | yes     | no              | kept             |
//!
//! Step generation is pure. The same unit and toolchain always produce the same
//! sequence, byte for byte, which is what keeps cache keys stable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classpath::{self, ClasspathGroups};
use crate::config::{AnnotationProcessingTool, ToolchainConfig};
use crate::consts::{CODEGEN_DIR_PLACEHOLDER, flag, suffix};
use crate::dep_files::DependencyFileSet;
use crate::error::StepError;
use crate::friend_paths::{self, SanitizedFriendPaths};
use crate::kapt::{AnnotationProcessingConfig, KaptDirs};
use crate::paths::BuildPaths;
use crate::primary::{AnnotationProcessorParams, CompilerParameters, JavacOptions, PrimaryStepFactory};
use crate::step::{KotlincStep, Step, StepSequence};
use crate::unit::CompilationUnit;
use crate::util::path::{absolutize, arg, is_kotlin_source, is_source_archive, normalize, relativize};

/// How a unit is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileMode {
  /// No Kotlin input: the whole unit goes to the primary factory.
  JavaOnly,
  /// kotlinc runs with the kapt plugin processing annotations.
  KotlinWithKapt,
  /// kotlinc runs; annotation processing, if any, is left to javac.
  KotlinWithoutKapt,
}

impl CompileMode {
  pub fn decide(unit: &CompilationUnit, toolchain: &ToolchainConfig) -> Self {
    if !unit.has_kotlin_input() {
      return CompileMode::JavaOnly;
    }
    let wants_kapt = toolchain.javac_options.has_annotation_processing()
      && toolchain.annotation_processing_tool == AnnotationProcessingTool::Kapt;
    if wants_kapt {
      CompileMode::KotlinWithKapt
    } else {
      CompileMode::KotlinWithoutKapt
    }
  }

  pub fn runs_kotlinc(self) -> bool {
    !matches!(self, CompileMode::JavaOnly)
  }
}

/// Where step generation happens.
#[derive(Debug, Clone)]
pub struct StepContext {
  /// Absolute project root.
  pub root: PathBuf,
  pub paths: BuildPaths,
  /// Root-relative paths the project ignores; never archived.
  pub ignored_paths: BTreeSet<PathBuf>,
}

impl StepContext {
  pub fn new(root: impl Into<PathBuf>, paths: BuildPaths) -> Self {
    Self {
      root: root.into(),
      paths,
      ignored_paths: BTreeSet::new(),
    }
  }

  pub fn with_ignored_paths<I, P>(mut self, paths: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.ignored_paths.extend(paths.into_iter().map(Into::into));
    self
  }
}

/// Result of a successful step generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilePlan {
  pub mode: CompileMode,
  pub steps: StepSequence,
  /// Dependency files the executed steps will produce.
  pub dep_files: DependencyFileSet,
}

/// Creates the steps compiling Kotlin (and residual Java) into class files.
#[derive(Debug, Clone)]
pub struct KotlinStepFactory {
  toolchain: ToolchainConfig,
}

impl KotlinStepFactory {
  pub fn new(toolchain: ToolchainConfig) -> Self {
    Self { toolchain }
  }

  pub fn toolchain(&self) -> &ToolchainConfig {
    &self.toolchain
  }

  /// Generate the full step sequence for `unit`.
  ///
  /// Either the complete sequence is returned or an error; configuration and
  /// encoding failures surface before anything is emitted.
  pub fn create_compile_steps(
    &self,
    ctx: &StepContext,
    unit: &CompilationUnit,
    primary: &dyn PrimaryStepFactory,
  ) -> Result<CompilePlan, StepError> {
    let mode = CompileMode::decide(unit, &self.toolchain);
    info!(target = %unit.target, mode = ?mode, "creating compile steps");

    let mut steps = StepSequence::new();
    let javac_options = self.toolchain.javac_options.for_mode(mode);
    if !mode.runs_kotlinc() {
      debug!(target = %unit.target, "no kotlin sources, delegating to javac");
      let params = CompilerParameters {
        sources: unit.sources.iter().cloned().collect(),
        classpath: unit.classpath.iter().cloned().collect(),
        output_paths: unit.output_paths.clone(),
        track_class_usage: unit.track_class_usage,
      };
      steps.extend(primary.create_compile_steps(&unit.target, &javac_options, &params)?);
      return Ok(self.finish(unit, mode, steps));
    }

    let kapt = match mode {
      CompileMode::KotlinWithKapt => Some(AnnotationProcessingConfig::new(
        &ctx.root,
        &unit.target,
        KaptDirs::for_target(&ctx.paths, &unit.target)?,
        &self.toolchain.javac_options.annotation_processors,
        &self.toolchain,
      )?),
      _ => None,
    };

    let plugin_generated = ctx
      .paths
      .annotation_path(&unit.target, suffix::KOTLINC_PLUGIN_GENERATED)?;
    let friend_scratch = ctx.paths.scratch_path(&unit.target, suffix::FRIEND_PATH_JARS)?;
    let friends = friend_paths::sanitize(&ctx.root, &self.toolchain.friend_paths, &friend_scratch);

    let kotlinc = self.kotlinc_step(ctx, unit, kapt.as_ref(), &friends, &plugin_generated)?;

    if let Some(kapt) = &kapt {
      steps.extend(kapt.dirs.preparation_steps());
    }
    steps.push(Step::MakeCleanDir {
      path: plugin_generated,
    });
    steps.extend(friends.steps);
    steps.push(Step::Kotlinc(kotlinc));
    if let Some(kapt) = &kapt {
      steps.extend(kapt.post_compile_steps(
        &ctx.root,
        &unit.target,
        &unit.output_paths.classes_dir,
        &ctx.ignored_paths,
      ));
    }
    // Only our own steps are checked; the primary factory owns its directories.
    check_ordering(unit, &steps)?;

    let params = self.primary_parameters(ctx, unit, kapt.as_ref());
    debug!(
      target = %unit.target,
      sources = params.sources.len(),
      "delegating residual sources to javac"
    );
    steps.extend(primary.create_compile_steps(&unit.target, &javac_options, &params)?);

    Ok(self.finish(unit, mode, steps))
  }

  fn finish(&self, unit: &CompilationUnit, mode: CompileMode, steps: StepSequence) -> CompilePlan {
    CompilePlan {
      mode,
      dep_files: DependencyFileSet::for_steps(unit, &steps),
      steps,
    }
  }

  fn kotlinc_step(
    &self,
    ctx: &StepContext,
    unit: &CompilationUnit,
    kapt: Option<&AnnotationProcessingConfig>,
    friends: &SanitizedFriendPaths,
    plugin_generated: &Path,
  ) -> Result<KotlincStep, StepError> {
    let classpath = classpath::compose(
      &ctx.root,
      ClasspathGroups {
        extra: &self.toolchain.extra_classpath,
        declared: &unit.classpath,
        runtime: &self.toolchain.kotlin_home_libraries,
      },
      &friends.remap,
    );

    let mut args = vec![friend_paths::friend_paths_argument(&friends.paths)];
    args.extend(self.compiler_plugin_arguments(&ctx.root, &ctx.root.join(plugin_generated)));
    if let Some(kapt) = kapt {
      args.extend(kapt.plugin_arguments(&ctx.root)?);
    }
    args.extend([
      flag::MODULE_NAME.to_string(),
      unit.target.module_name(),
      flag::NO_STDLIB.to_string(),
      flag::NO_REFLECT.to_string(),
    ]);
    if let Some(jvm_target) = &self.toolchain.jvm_target {
      args.extend([flag::JVM_TARGET.to_string(), jvm_target.clone()]);
    }
    // User arguments go last so they override anything generated.
    args.extend(self.toolchain.extra_kotlinc_arguments.iter().cloned());

    let mut generated_dirs = vec![plugin_generated.to_path_buf()];
    if let Some(kapt) = kapt {
      generated_dirs.extend(kapt.kotlinc_outputs());
    }

    Ok(KotlincStep {
      target: unit.target.clone(),
      kotlinc: self.toolchain.kotlinc.clone(),
      output_dir: unit.output_paths.classes_dir.clone(),
      sources: unit.sources.iter().cloned().collect(),
      path_to_sources_list: unit.output_paths.path_to_sources_list.clone(),
      classpath: classpath::to_paths(&classpath),
      extra_arguments: args,
      verbose_flags: vec![flag::VERBOSE.to_string()],
      output_paths: unit.output_paths.clone(),
      dep_file: unit
        .track_class_usage
        .then(|| unit.output_paths.kotlin_dep_file()),
      generated_dirs,
    })
  }

  /// `-Xplugin=<jar>` per compiler plugin, followed by `-P k=v,...` when the
  /// plugin has options.
  fn compiler_plugin_arguments(&self, root: &Path, output_dir: &Path) -> Vec<String> {
    let mut args = Vec::new();
    for (plugin, options) in &self.toolchain.kotlin_compiler_plugins {
      args.push(format!("{}{}", flag::X_PLUGIN, arg(&absolutize(root, plugin))));
      if options.is_empty() {
        continue;
      }
      let rendered: Vec<String> = options
        .iter()
        .map(|(key, value)| {
          let value = if value == CODEGEN_DIR_PLACEHOLDER {
            arg(output_dir)
          } else {
            value.clone()
          };
          format!("{key}={value}")
        })
        .collect();
      args.push(flag::PLUGIN.to_string());
      args.push(rendered.join(","));
    }
    args
  }

  /// Input for the javac pass that follows kotlinc.
  fn primary_parameters(
    &self,
    ctx: &StepContext,
    unit: &CompilationUnit,
    kapt: Option<&AnnotationProcessingConfig>,
  ) -> CompilerParameters {
    let mut sources: BTreeSet<PathBuf> = unit
      .sources
      .iter()
      .filter(|source| !is_kotlin_source(source) && !is_source_archive(source))
      .cloned()
      .collect();
    if let Some(kapt) = kapt {
      sources.insert(kapt.generated_sources().to_path_buf());
    }

    let classes_dir = &unit.output_paths.classes_dir;
    let rest: BTreeSet<PathBuf> = self
      .toolchain
      .extra_classpath
      .iter()
      .map(|path| relativize(&ctx.root, &normalize(path)))
      .chain(unit.classpath.iter().map(|path| normalize(path)))
      .filter(|path| path != classes_dir)
      .collect();
    let mut classpath = vec![classes_dir.clone()];
    classpath.extend(rest);

    CompilerParameters {
      sources: sources.into_iter().collect(),
      classpath,
      output_paths: unit.output_paths.clone(),
      track_class_usage: unit.track_class_usage,
    }
  }
}

fn check_ordering(unit: &CompilationUnit, steps: &StepSequence) -> Result<(), StepError> {
  match steps.first_unprepared_write() {
    Some((index, path)) => Err(StepError::UnpreparedWrite {
      target: unit.target.to_string(),
      index,
      path,
    }),
    None => Ok(()),
  }
}

impl JavacOptions {
  /// Options the javac pass receives in `mode`.
  pub fn for_mode(&self, mode: CompileMode) -> Self {
    match mode {
      CompileMode::KotlinWithKapt => self.with_annotation_processors(AnnotationProcessorParams::empty()),
      CompileMode::JavaOnly | CompileMode::KotlinWithoutKapt => self.clone(),
    }
  }
}
