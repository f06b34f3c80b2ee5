//! Fixed names shared across step generation.
//!
//! The kapt option keys and flag spellings are part of the kotlinc command-line
//! protocol; the receiving plugin parses them by exact name.

/// Length of the truncated hash used for `ObjectHash`.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Environment variable overriding the output root.
pub const OUT_DIR_ENV: &str = "KTJAR_OUT_DIR";

/// Default output root, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "buck-out";

pub const GEN_DIR: &str = "gen";
pub const ANNOTATION_DIR: &str = "annotation";
pub const SCRATCH_DIR: &str = "bin";

pub const KOTLIN_EXTENSION: &str = "kt";
pub const SOURCE_ARCHIVE_SUFFIX: &str = ".src.zip";

/// Character kotlinc uses to join several friend paths into one argument.
pub const FRIEND_PATH_SEPARATOR: char = ',';
/// Replacement for [`FRIEND_PATH_SEPARATOR`] in staged names.
pub const FRIEND_PATH_SEPARATOR_REPLACEMENT: &str = "__";

/// Per-target directory name formats. `%s` is the short name plus flavor postfix.
pub mod suffix {
  pub const KAPT_STUBS: &str = "__%s_stubs__";
  pub const KAPT_SOURCES: &str = "__%s_sources__";
  pub const KAPT_CLASSES: &str = "__%s_classes__";
  pub const KAPT_REPORTS: &str = "__%s_reports__";
  pub const KAPT_GENERATED: &str = "__%s_kapt_generated__";
  pub const KOTLINC_PLUGIN_GENERATED: &str = "__%s_kotlinc_plugin_generated__";
  pub const GEN_SOURCES: &str = "__%s_gen_sources__";
  pub const FRIEND_PATH_JARS: &str = "__%s_friend_path_jars__";
  pub const CLASSES: &str = "lib__%s__classes";
  pub const OUTPUT_JAR_DIR: &str = "lib__%s__output";
  pub const SOURCES_LIST: &str = "__%s__srcs";
  pub const WORKING_DIRECTORY: &str = "lib__%s__working_directory";
  pub const FLAVORED_ANNOTATION_GEN: &str = "%s";
  pub const UNFLAVORED_ANNOTATION_GEN: &str = "%s__";
}

pub const ANNOTATION_GEN_DIR_NAME: &str = "__generated__";
pub const GENERATED_SOURCE_ZIP: &str = "generated.src.zip";
pub const AP_STATS_REPORT_FILE: &str = "ap_stats.report";
pub const JAVA_DEP_FILE: &str = "used-classes.json";
pub const KOTLIN_DEP_FILE: &str = "kotlin-used-classes.json";

/// kotlinc flags.
pub mod flag {
  pub const PLUGIN: &str = "-P";
  pub const X_PLUGIN: &str = "-Xplugin=";
  pub const FRIEND_PATHS: &str = "-Xfriend-paths=";
  pub const MODULE_NAME: &str = "-module-name";
  pub const NO_STDLIB: &str = "-no-stdlib";
  pub const NO_REFLECT: &str = "-no-reflect";
  pub const JVM_TARGET: &str = "-jvm-target";
  pub const VERBOSE: &str = "-verbose";
}

/// kapt3 plugin option names.
pub mod kapt {
  pub const PLUGIN_PREFIX: &str = "plugin:org.jetbrains.kotlin.kapt3:";
  pub const APT_MODE: &str = "aptMode=";
  pub const APT_MODE_COMPILE: &str = "compile";
  pub const AP_CLASSPATH: &str = "apclasspath=";
  pub const PROCESSORS: &str = "processors=";
  pub const SOURCES: &str = "sources=";
  pub const CLASSES: &str = "classes=";
  pub const STUBS: &str = "stubs=";
  pub const AP_OPTIONS: &str = "apoptions=";
  pub const JAVAC_ARGUMENTS: &str = "javacArguments=";
  pub const LIGHT_ANALYSIS: &str = "useLightAnalysis=";
  pub const CORRECT_ERROR_TYPES: &str = "correctErrorTypes=";
  pub const DUMP_PROCESSOR_TIMINGS: &str = "dumpProcessorTimings=";
  /// Seeded ap-option key carrying the Kotlin generated-sources directory.
  pub const KOTLIN_GENERATED_KEY: &str = "kapt.kotlin.generated";
}

/// Placeholder value in compiler-plugin options replaced by the plugin output dir.
pub const CODEGEN_DIR_PLACEHOLDER: &str = "__codegen_dir__";
