//! Shared fixtures for step-generation tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use ktjar_lib::config::AnnotationProcessingTool;
use ktjar_lib::primary::{
  AnnotationProcessorParams, CompilerParameters, JavacOptions, JavacStepFactory, PrimaryStepFactory, ProcessorPlugin,
};
use ktjar_lib::{BuildPaths, CompilationUnit, CompilePlan, KotlinStepFactory, Step, StepContext, StepError, TargetId};
use ktjar_lib::ToolchainConfig;

pub const ROOT: &str = "/repo";

/// A friend path whose directory contains the friend-path separator.
pub const COMMA_FRIEND: &str = "buck-out/gen/java/com/bar/lib#abi,src/lib.jar";
pub const PLAIN_FRIEND: &str = "third-party/core.jar";

pub fn target() -> TargetId {
  TargetId::new("java/com/foo", "lib")
}

pub fn ctx() -> StepContext {
  StepContext::new(ROOT, BuildPaths::default())
}

pub fn unit(sources: &[&str]) -> CompilationUnit {
  CompilationUnit::new(target(), &BuildPaths::default())
    .unwrap()
    .with_sources(sources.iter().copied())
    .with_classpath([PLAIN_FRIEND, COMMA_FRIEND, "third-party/guava.jar"])
}

pub fn processors() -> AnnotationProcessorParams {
  AnnotationProcessorParams {
    plugins: vec![ProcessorPlugin {
      processor_names: BTreeSet::from(["dagger.internal.codegen.ComponentProcessor".to_string()]),
      classpath: vec![PathBuf::from("third-party/dagger-compiler.jar")],
    }],
    parameters: BTreeSet::from(["dagger.fastInit=enabled".to_string()]),
  }
}

/// Kotlin toolchain with processors configured for kapt.
pub fn kapt_toolchain() -> ToolchainConfig {
  ToolchainConfig {
    kotlin_home_libraries: BTreeSet::from([PathBuf::from("/kotlin/lib/kotlin-stdlib.jar")]),
    standard_library_classpath: Some(PathBuf::from("/kotlin/lib/kotlin-stdlib.jar")),
    annotation_processing_classpath: Some(PathBuf::from("/kotlin/lib/kotlin-annotation-processing.jar")),
    extra_kotlinc_arguments: vec!["-Xjsr305=strict".to_string()],
    friend_paths: vec![PathBuf::from(PLAIN_FRIEND), PathBuf::from(COMMA_FRIEND)],
    annotation_processing_tool: AnnotationProcessingTool::Kapt,
    jvm_target: Some("11".to_string()),
    extra_classpath: vec![PathBuf::from("/repo/buck-out/gen/android/android.jar")],
    javac_options: JavacOptions::default().with_annotation_processors(processors()),
    ..ToolchainConfig::default()
  }
}

pub fn plan(toolchain: ToolchainConfig, unit: &CompilationUnit) -> Result<CompilePlan, StepError> {
  KotlinStepFactory::new(toolchain).create_compile_steps(&ctx(), unit, &JavacStepFactory::new())
}

/// Primary factory that remembers what it was asked to compile.
#[derive(Default)]
pub struct RecordingPrimary {
  pub calls: RefCell<Vec<(JavacOptions, CompilerParameters)>>,
}

impl PrimaryStepFactory for RecordingPrimary {
  fn create_compile_steps(
    &self,
    target: &TargetId,
    options: &JavacOptions,
    params: &CompilerParameters,
  ) -> Result<Vec<Step>, StepError> {
    self.calls.borrow_mut().push((options.clone(), params.clone()));
    JavacStepFactory::new().create_compile_steps(target, options, params)
  }
}

pub fn kotlinc(plan: &CompilePlan) -> &ktjar_lib::step::KotlincStep {
  plan
    .steps
    .iter()
    .find_map(|step| match step {
      Step::Kotlinc(step) => Some(step),
      _ => None,
    })
    .unwrap_or_else(|| panic!("Expected a kotlinc step in {:?}", plan.steps))
}

/// Primary factory that cleans the classes dir itself before running javac.
pub struct CleaningPrimary;

impl PrimaryStepFactory for CleaningPrimary {
  fn create_compile_steps(
    &self,
    target: &TargetId,
    options: &JavacOptions,
    params: &CompilerParameters,
  ) -> Result<Vec<Step>, StepError> {
    let mut steps = vec![Step::MakeCleanDir {
      path: params.output_paths.classes_dir.clone(),
    }];
    steps.extend(JavacStepFactory::new().create_compile_steps(target, options, params)?);
    Ok(steps)
  }
}
