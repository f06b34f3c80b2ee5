//! ktjar-lib: build-step generation for Kotlin libraries
//!
//! This crate turns a compilation unit into the ordered steps that compile it
//! into class files:
//! - `CompilationUnit`: sources, classpath and output layout of one target
//! - `KotlinStepFactory`: decides the compile mode and emits the steps
//! - `Step`/`StepSequence`: pure, hashable descriptions of the work to do
//! - `PrimaryStepFactory`: the javac collaborator residual sources go to
//!
//! Nothing here runs a compiler or touches the filesystem while generating
//! steps; an execution engine runs the resulting sequence.

pub mod classpath;
pub mod compile;
pub mod config;
pub mod consts;
pub mod dep_files;
pub mod error;
pub mod friend_paths;
pub mod kapt;
pub mod options;
pub mod paths;
pub mod primary;
pub mod stats;
pub mod step;
pub mod target;
pub mod unit;
pub mod util;

pub use compile::{CompileMode, CompilePlan, KotlinStepFactory, StepContext};
pub use config::ToolchainConfig;
pub use error::StepError;
pub use paths::BuildPaths;
pub use primary::{JavacStepFactory, PrimaryStepFactory};
pub use step::{Step, StepSequence};
pub use target::TargetId;
pub use unit::CompilationUnit;
