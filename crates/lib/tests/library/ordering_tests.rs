//! Every compile mode must prepare a directory before anything writes into it,
//! and must run kotlinc, kapt post-processing and javac in that order.

use std::collections::BTreeSet;
use std::path::PathBuf;

use ktjar_lib::config::AnnotationProcessingTool;
use ktjar_lib::step::CopySourceMode;
use ktjar_lib::{CompileMode, CompilePlan, Step, ToolchainConfig};

use super::common::*;

fn variants() -> Vec<(CompileMode, CompilePlan)> {
  let stats = ToolchainConfig {
    generate_annotation_processing_stats: true,
    ..kapt_toolchain()
  };
  let javac_tool = ToolchainConfig {
    annotation_processing_tool: AnnotationProcessingTool::Javac,
    ..kapt_toolchain()
  };
  let sources = ["A.kt", "B.java", "bundle.src.zip"];

  vec![
    (CompileMode::JavaOnly, plan(kapt_toolchain(), &unit(&["B.java"])).unwrap()),
    (CompileMode::KotlinWithKapt, plan(kapt_toolchain(), &unit(&sources)).unwrap()),
    (CompileMode::KotlinWithKapt, plan(stats, &unit(&sources)).unwrap()),
    (CompileMode::KotlinWithoutKapt, plan(javac_tool, &unit(&sources)).unwrap()),
    (
      CompileMode::KotlinWithoutKapt,
      plan(ToolchainConfig::default(), &unit(&sources)).unwrap(),
    ),
  ]
}

fn is_post_processing(step: &Step) -> bool {
  matches!(
    step,
    Step::Zip { .. }
      | Step::ParseProcessorStats { .. }
      | Step::Copy {
        mode: CopySourceMode::DirectoryContentsOnly,
        ..
      }
  )
}

#[test]
fn directories_are_prepared_before_writes() {
  for (mode, plan) in variants() {
    assert_eq!(plan.mode, mode);
    assert_eq!(
      plan.steps.first_unprepared_write(),
      None,
      "{mode:?} writes before preparing: {:?}",
      plan.steps
    );
  }
}

#[test]
fn kotlinc_precedes_post_processing_which_precedes_javac() {
  for (mode, plan) in variants() {
    let steps = plan.steps.steps();
    let kotlinc = steps.iter().position(|s| matches!(s, Step::Kotlinc(_)));
    let first_post = steps.iter().position(is_post_processing);
    let last_post = steps.iter().rposition(is_post_processing);
    let javac = steps.iter().position(|s| matches!(s, Step::Javac(_)));

    match mode {
      CompileMode::JavaOnly => {
        assert_eq!(kotlinc, None);
        assert_eq!(first_post, None);
      }
      CompileMode::KotlinWithKapt => {
        let kotlinc = kotlinc.unwrap();
        assert!(kotlinc < first_post.unwrap());
        assert!(last_post.unwrap() < javac.unwrap());
        assert_eq!(javac, Some(steps.len() - 1));
      }
      CompileMode::KotlinWithoutKapt => {
        assert_eq!(first_post, None);
        assert!(kotlinc.unwrap() < javac.unwrap());
      }
    }
  }
}

#[test]
fn kapt_dirs_are_prepared_before_kotlinc() {
  let plan = plan(kapt_toolchain(), &unit(&["A.kt"])).unwrap();
  let kotlinc = plan.steps.position(|s| matches!(s, Step::Kotlinc(_))).unwrap();

  let prepared: Vec<PathBuf> = plan.steps.steps()[..kotlinc]
    .iter()
    .filter_map(|s| s.prepared_dir().map(PathBuf::from))
    .collect();
  for suffix in ["__lib_stubs__", "__lib_classes__", "__lib_sources__", "__lib_kapt_generated__"] {
    assert!(
      prepared.iter().any(|dir| dir.ends_with(suffix)),
      "{suffix} not prepared before kotlinc: {prepared:?}"
    );
  }
}

#[test]
fn classpath_ignores_spelling_and_group_of_an_entry() {
  let toolchain = ToolchainConfig {
    extra_classpath: vec![
      PathBuf::from("/repo/third-party/guava.jar"),
      PathBuf::from("/repo/third-party/./core.jar"),
    ],
    kotlin_home_libraries: BTreeSet::from([PathBuf::from("third-party/tools/../guava.jar")]),
    ..ToolchainConfig::default()
  };
  let plan = plan(toolchain, &unit(&["A.kt"])).unwrap();

  assert_eq!(
    kotlinc(&plan).classpath,
    vec![
      PathBuf::from("/repo").join(COMMA_FRIEND),
      PathBuf::from("/repo/third-party/core.jar"),
      PathBuf::from("/repo/third-party/guava.jar"),
    ]
  );
}
