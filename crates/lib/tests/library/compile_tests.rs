use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ktjar_lib::config::AnnotationProcessingTool;
use ktjar_lib::dep_files::{ArtifactRecorder, CompilerKind, dep_file_paths};
use ktjar_lib::step::CopySourceMode;
use ktjar_lib::util::hash::Hashable;
use ktjar_lib::{BuildPaths, CompileMode, KotlinStepFactory, Step, StepContext, StepError, ToolchainConfig};

use super::common::*;

const CLASSES_DIR: &str = "buck-out/bin/java/com/foo/lib__lib__classes";
const STAGED_FRIEND: &str = "/repo/buck-out/bin/java/com/foo/__lib_friend_path_jars__/lib.jar";
const GENERATED_ZIP: &str = "buck-out/gen/java/com/foo/__lib_gen_sources__/generated.src.zip";

// =============================================================================
// Java-only units
// =============================================================================

#[test]
fn java_only_unit_is_delegated_unchanged() {
  let unit = unit(&["A.java", "B.java"]);
  let primary = RecordingPrimary::default();

  let plan = KotlinStepFactory::new(kapt_toolchain())
    .create_compile_steps(&ctx(), &unit, &primary)
    .unwrap();

  assert_eq!(plan.mode, CompileMode::JavaOnly);
  let kinds: Vec<&str> = plan.steps.iter().map(Step::short_name).collect();
  assert_eq!(kinds, vec!["javac"]);

  let calls = primary.calls.borrow();
  assert_eq!(calls.len(), 1);
  let (options, params) = &calls[0];
  assert_eq!(params.sources, vec![PathBuf::from("A.java"), PathBuf::from("B.java")]);
  assert_eq!(params.classpath, unit.classpath.iter().cloned().collect::<Vec<_>>());
  // kapt never ran, so javac keeps the processors.
  assert!(options.has_annotation_processing());
}

#[test]
fn java_only_unit_creates_no_kotlin_dirs() {
  let plan = plan(kapt_toolchain(), &unit(&["A.java"])).unwrap();

  assert!(plan.steps.iter().all(|step| step.prepared_dir().is_none()));
  let Step::Javac(javac) = &plan.steps.steps()[0] else {
    panic!("Expected javac step, got {:?}", plan.steps);
  };
  assert!(javac.arguments.contains(&"-processor".to_string()));
}

// =============================================================================
// Kotlin with kapt
// =============================================================================

#[test]
fn comma_friend_path_is_staged_once() {
  let plan = plan(kapt_toolchain(), &unit(&["A.kt", "B.java"])).unwrap();

  let staged: Vec<&Step> = plan
    .steps
    .iter()
    .filter(|step| matches!(step, Step::Copy { mode: CopySourceMode::File, .. }))
    .collect();
  assert_eq!(
    staged,
    vec![&Step::Copy {
      source: Path::new(ROOT).join(COMMA_FRIEND),
      destination: PathBuf::from(STAGED_FRIEND),
      mode: CopySourceMode::File,
    }]
  );

  let kotlinc = kotlinc(&plan);
  assert_eq!(
    kotlinc.extra_arguments[0],
    format!("-Xfriend-paths={STAGED_FRIEND},/repo/third-party/core.jar")
  );
  assert!(!kotlinc.extra_arguments[0].contains(COMMA_FRIEND));
}

#[test]
fn kotlinc_classpath_uses_staged_friend_copy() {
  let plan = plan(kapt_toolchain(), &unit(&["A.kt"])).unwrap();

  assert_eq!(
    kotlinc(&plan).classpath,
    vec![
      PathBuf::from("/kotlin/lib/kotlin-stdlib.jar"),
      PathBuf::from(STAGED_FRIEND),
      PathBuf::from("/repo/buck-out/gen/android/android.jar"),
      PathBuf::from("/repo/third-party/core.jar"),
      PathBuf::from("/repo/third-party/guava.jar"),
    ]
  );
}

#[test]
fn kotlinc_arguments_keep_their_order() {
  let plan = plan(kapt_toolchain(), &unit(&["A.kt"])).unwrap();
  let args = &kotlinc(&plan).extra_arguments;

  assert_eq!(args[1], "-Xplugin=/kotlin/lib/kotlin-annotation-processing.jar");
  assert_eq!(args[2], "-P");
  assert!(args[3].starts_with("plugin:org.jetbrains.kotlin.kapt3:aptMode=compile,"));
  assert_eq!(
    &args[4..],
    &["-module-name", "java.com.foo.lib", "-no-stdlib", "-no-reflect", "-jvm-target", "11", "-Xjsr305=strict"]
  );
  assert_eq!(kotlinc(&plan).verbose_flags, vec!["-verbose".to_string()]);
}

#[test]
fn kapt_hands_generated_sources_to_javac() {
  let unit = unit(&["A.kt", "B.java", "bundle.src.zip"]);
  let primary = RecordingPrimary::default();

  let plan = KotlinStepFactory::new(kapt_toolchain())
    .create_compile_steps(&ctx(), &unit, &primary)
    .unwrap();
  assert_eq!(plan.mode, CompileMode::KotlinWithKapt);

  let calls = primary.calls.borrow();
  let (options, params) = &calls[0];
  assert!(!options.has_annotation_processing());
  assert_eq!(params.sources, vec![PathBuf::from("B.java"), PathBuf::from(GENERATED_ZIP)]);
  assert_eq!(
    params.classpath,
    vec![
      PathBuf::from(CLASSES_DIR),
      PathBuf::from("buck-out/gen/android/android.jar"),
      PathBuf::from(COMMA_FRIEND),
      PathBuf::from(PLAIN_FRIEND),
      PathBuf::from("third-party/guava.jar"),
    ]
  );
}

#[test]
fn javac_classpath_collapses_spellings_of_one_jar() {
  let toolchain = ToolchainConfig {
    extra_classpath: vec![PathBuf::from("/repo/third-party/tools/../guava.jar")],
    ..kapt_toolchain()
  };
  let primary = RecordingPrimary::default();

  KotlinStepFactory::new(toolchain)
    .create_compile_steps(&ctx(), &unit(&["A.kt", "B.java"]), &primary)
    .unwrap();

  let calls = primary.calls.borrow();
  let guava: Vec<&PathBuf> = calls[0]
    .1
    .classpath
    .iter()
    .filter(|p| p.ends_with("guava.jar"))
    .collect();
  assert_eq!(guava, vec![&PathBuf::from("third-party/guava.jar")]);
}

#[test]
fn stats_report_is_parsed_between_kotlinc_and_zip() {
  let toolchain = ToolchainConfig {
    generate_annotation_processing_stats: true,
    ..kapt_toolchain()
  };
  let plan = plan(toolchain, &unit(&["A.kt"])).unwrap();

  let kotlinc = plan.steps.position(|s| matches!(s, Step::Kotlinc(_))).unwrap();
  let stats = plan
    .steps
    .position(|s| matches!(s, Step::ParseProcessorStats { .. }))
    .unwrap();
  let zip = plan.steps.position(|s| matches!(s, Step::Zip { .. })).unwrap();
  assert!(kotlinc < stats);
  assert!(stats < zip);
}

#[test]
fn generated_source_archive_skips_ignored_paths() {
  let ignored = "buck-out/annotation/java/com/foo/.idea";
  let ctx = StepContext::new(ROOT, BuildPaths::default()).with_ignored_paths([ignored]);

  let plan = KotlinStepFactory::new(kapt_toolchain())
    .create_compile_steps(&ctx, &unit(&["A.kt"]), &RecordingPrimary::default())
    .unwrap();

  let zip_ignored = plan
    .steps
    .iter()
    .find_map(|s| match s {
      Step::Zip { ignored, .. } => Some(ignored.clone()),
      _ => None,
    })
    .unwrap();
  assert_eq!(zip_ignored, BTreeSet::from([PathBuf::from(ignored)]));
}

#[test]
fn kotlinc_declares_kapt_and_plugin_outputs() {
  let plan = plan(kapt_toolchain(), &unit(&["A.kt"])).unwrap();
  let kotlinc = Step::Kotlinc(kotlinc(&plan).clone());
  let written = kotlinc.written_paths();

  for dir in [
    "buck-out/annotation/java/com/foo/__lib_kotlinc_plugin_generated__",
    "buck-out/annotation/java/com/foo/__lib_stubs__",
    "buck-out/annotation/java/com/foo/__lib_kapt_generated__",
  ] {
    assert!(written.contains(&Path::new(dir)), "kotlinc should declare {dir}");
  }
}

#[test]
fn primary_may_clean_its_own_classes_dir() {
  let plan = KotlinStepFactory::new(kapt_toolchain())
    .create_compile_steps(&ctx(), &unit(&["A.kt", "B.java"]), &CleaningPrimary)
    .unwrap();

  let kinds: Vec<&str> = plan.steps.iter().map(Step::short_name).collect();
  assert_eq!(kinds[kinds.len() - 2..], ["make_clean_dir", "javac"]);
}

#[test]
fn missing_kapt_jar_emits_nothing() {
  let toolchain = ToolchainConfig {
    annotation_processing_classpath: None,
    ..kapt_toolchain()
  };

  assert!(matches!(
    plan(toolchain, &unit(&["A.kt"])),
    Err(StepError::MissingAnnotationProcessingClasspath { target }) if target == "//java/com/foo:lib"
  ));
}

// =============================================================================
// Kotlin without kapt
// =============================================================================

#[test]
fn javac_tool_leaves_processing_to_javac() {
  let toolchain = ToolchainConfig {
    annotation_processing_tool: AnnotationProcessingTool::Javac,
    ..kapt_toolchain()
  };
  let unit = unit(&["A.kt", "B.java", "bundle.src.zip"]);
  let primary = RecordingPrimary::default();

  let plan = KotlinStepFactory::new(toolchain)
    .create_compile_steps(&ctx(), &unit, &primary)
    .unwrap();

  assert_eq!(plan.mode, CompileMode::KotlinWithoutKapt);
  assert!(!plan.steps.iter().any(|s| matches!(s, Step::Zip { .. })));
  assert!(
    !kotlinc(&plan)
      .extra_arguments
      .iter()
      .any(|a| a.contains("kapt3"))
  );

  let calls = primary.calls.borrow();
  let (options, params) = &calls[0];
  assert!(options.has_annotation_processing());
  assert_eq!(params.sources, vec![PathBuf::from("B.java")]);
}

#[test]
fn no_friend_paths_still_passes_empty_argument() {
  let toolchain = ToolchainConfig {
    friend_paths: Vec::new(),
    ..ToolchainConfig::default()
  };
  let plan = plan(toolchain, &unit(&["A.kt"])).unwrap();

  let kotlinc = kotlinc(&plan);
  assert_eq!(kotlinc.extra_arguments[0], "");
  assert_eq!(
    &kotlinc.extra_arguments[1..],
    &["-module-name", "java.com.foo.lib", "-no-stdlib", "-no-reflect"]
  );
  assert!(!plan.steps.iter().any(|s| matches!(s, Step::Mkdir { .. })));
}

#[test]
fn kotlin_only_unit_emits_no_javac_step() {
  let toolchain = ToolchainConfig::default();
  let plan = plan(toolchain, &unit(&["A.kt"])).unwrap();

  let kinds: Vec<&str> = plan.steps.iter().map(Step::short_name).collect();
  assert_eq!(kinds, vec!["make_clean_dir", "kotlinc"]);
}

// =============================================================================
// Determinism & dep files
// =============================================================================

#[test]
fn generation_is_deterministic() {
  let unit = unit(&["A.kt", "B.java", "bundle.src.zip"]);
  let first = plan(kapt_toolchain(), &unit).unwrap();
  let second = plan(kapt_toolchain(), &unit).unwrap();

  assert_eq!(
    serde_json::to_string(&first.steps).unwrap(),
    serde_json::to_string(&second.steps).unwrap()
  );
  assert_eq!(first.steps.compute_hash().unwrap(), second.steps.compute_hash().unwrap());
}

#[test]
fn different_units_hash_differently() {
  let first = plan(kapt_toolchain(), &unit(&["A.kt"])).unwrap();
  let second = plan(kapt_toolchain(), &unit(&["A.kt", "B.kt"])).unwrap();

  assert_ne!(first.steps.compute_hash().unwrap(), second.steps.compute_hash().unwrap());
}

#[test]
fn dep_files_follow_the_compilers_that_ran() {
  let java = unit(&["A.java"]);
  let java_plan = plan(kapt_toolchain(), &java).unwrap();
  assert_eq!(java_plan.dep_files.paths(), vec![java.output_paths.java_dep_file()]);
  assert_eq!(dep_file_paths(&java), java_plan.dep_files.paths());

  let kotlin = unit(&["A.kt", "B.java"]);
  let kotlin_plan = plan(kapt_toolchain(), &kotlin).unwrap();
  assert_eq!(
    kotlin_plan.dep_files.get(CompilerKind::Kotlin),
    Some(kotlin.output_paths.kotlin_dep_file().as_path())
  );
  assert_eq!(kotlin_plan.dep_files.paths().len(), 2);
}

#[derive(Default)]
struct Recorded(Vec<PathBuf>);

impl ArtifactRecorder for Recorded {
  fn record_artifact(&mut self, path: &Path) {
    self.0.push(path.to_path_buf());
  }
}

#[test]
fn kotlin_only_unit_records_no_javac_dep_file() {
  let unit = unit(&["A.kt"]).tracking_class_usage();
  let plan = plan(ToolchainConfig::default(), &unit).unwrap();
  assert!(!plan.steps.iter().any(|s| matches!(s, Step::Javac(_))));

  let mut recorded = Recorded::default();
  plan.dep_files.record(&unit, &mut recorded);
  assert_eq!(recorded.0, vec![unit.output_paths.kotlin_dep_file()]);
}

#[test]
fn tracked_units_point_compilers_at_dep_files() {
  let unit = unit(&["A.kt", "B.java"]).tracking_class_usage();
  let plan = plan(kapt_toolchain(), &unit).unwrap();

  assert_eq!(kotlinc(&plan).dep_file, Some(unit.output_paths.kotlin_dep_file()));
  let javac = plan
    .steps
    .iter()
    .find_map(|s| match s {
      Step::Javac(javac) => Some(javac),
      _ => None,
    })
    .unwrap();
  assert_eq!(javac.dep_file, Some(unit.output_paths.java_dep_file()));
}
