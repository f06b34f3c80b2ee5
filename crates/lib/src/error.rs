//! Errors raised while generating a step sequence.

use thiserror::Error;

use crate::options::EncodeError;

/// Errors that abort step generation for a compilation unit.
///
/// Every variant is fatal to the invocation: no partial sequence is ever
/// returned, so the caller either gets the complete ordered steps or nothing.
#[derive(Debug, Error)]
pub enum StepError {
  /// Annotation processing was requested but no processor jar is configured.
  #[error("annotation processing for {target} requires an annotation processing classpath")]
  MissingAnnotationProcessingClasspath { target: String },

  /// Annotation processing was requested but no Kotlin stdlib is configured.
  #[error("annotation processing for {target} requires a standard library classpath")]
  MissingStandardLibrary { target: String },

  /// A processor parameter did not have the `key=value` shape.
  #[error("malformed annotation processor parameter '{0}': expected key=value")]
  MalformedProcessorParameter(String),

  /// A path format string was rejected.
  #[error("invalid path format '{0}': format must not start with '/'")]
  InvalidPathFormat(String),

  /// A generated step writes into a directory that is only prepared later.
  #[error("step {index} for {target} writes into {path} before it is prepared")]
  UnpreparedWrite {
    target: String,
    index: usize,
    path: std::path::PathBuf,
  },

  /// Any other invalid configuration.
  #[error("invalid configuration: {0}")]
  Config(String),

  /// Serializing compiler options failed. This is an internal error.
  #[error("failed to encode compiler options: {0}")]
  Encoding(#[from] EncodeError),

  /// The primary-language step factory rejected its input.
  #[error("primary compiler step generation failed: {0}")]
  Primary(String),
}
