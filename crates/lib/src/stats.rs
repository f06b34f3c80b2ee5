//! Annotation-processing timing reports.
//!
//! With `dumpProcessorTimings` enabled kapt writes a plain-text report:
//!
//! ```text
//! Kapt Annotation Processing performance report:
//! dagger.internal.codegen.ComponentProcessor: total: 133 ms, init: 36 ms, 2 round(s): 97 ms, 0 ms
//! ```
//!
//! [`forward_report`] is what a [`Step::ParseProcessorStats`] does when it runs:
//! parse the report and post one event per unit to the build-event stream.
//!
//! [`Step::ParseProcessorStats`]: crate::step::Step::ParseProcessorStats

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::target::TargetId;

/// Timings for one annotation processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorTiming {
  pub processor: String,
  pub total_ms: u64,
  pub init_ms: u64,
  /// Time spent in each processing round.
  pub rounds_ms: Vec<u64>,
}

/// A structured record sent to the build-event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildEvent {
  AnnotationProcessingTimings {
    target: TargetId,
    report: PathBuf,
    timings: Vec<ProcessorTiming>,
  },
}

/// Receiver of build events.
pub trait EventSink {
  fn post(&self, event: BuildEvent);
}

#[derive(Debug, Error)]
pub enum StatsError {
  #[error("failed to read report {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed report line {line}: {content}")]
  Malformed { line: usize, content: String },
}

/// Parse a kapt timing report. Header and blank lines are skipped.
pub fn parse_report(text: &str) -> Result<Vec<ProcessorTiming>, StatsError> {
  let mut timings = Vec::new();
  for (index, line) in text.lines().enumerate() {
    let line = line.trim();
    let Some((processor, rest)) = line.split_once(": total: ") else {
      continue;
    };
    let malformed = || StatsError::Malformed {
      line: index + 1,
      content: line.to_string(),
    };
    timings.push(parse_timing(processor, rest).ok_or_else(malformed)?);
  }
  Ok(timings)
}

/// `133 ms, init: 36 ms, 2 round(s): 97 ms, 0 ms`
fn parse_timing(processor: &str, rest: &str) -> Option<ProcessorTiming> {
  let mut parts = rest.split(", ");
  let total_ms = parse_ms(parts.next()?)?;
  let init_ms = parse_ms(parts.next()?.strip_prefix("init: ")?)?;

  let mut rounds_ms = Vec::new();
  if let Some(first) = parts.next() {
    let (count, first_round) = first.split_once(" round(s): ")?;
    let count: usize = count.trim().parse().ok()?;
    rounds_ms.push(parse_ms(first_round)?);
    for round in parts {
      rounds_ms.push(parse_ms(round)?);
    }
    if rounds_ms.len() != count {
      return None;
    }
  }

  Some(ProcessorTiming {
    processor: processor.trim().to_string(),
    total_ms,
    init_ms,
    rounds_ms,
  })
}

fn parse_ms(value: &str) -> Option<u64> {
  value.trim().strip_suffix("ms")?.trim().parse().ok()
}

/// Read the report at `report` and post its timings for `target`.
///
/// A missing report means kapt ran no processors; nothing is posted.
pub fn forward_report(report: &Path, target: &TargetId, sink: &dyn EventSink) -> Result<(), StatsError> {
  let text = match fs::read_to_string(report) {
    Ok(text) => text,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      warn!(report = %report.display(), "annotation processing report not found");
      return Ok(());
    }
    Err(source) => {
      return Err(StatsError::Read {
        path: report.to_path_buf(),
        source,
      });
    }
  };

  let timings = parse_report(&text)?;
  debug!(target = %target, processors = timings.len(), "forwarding annotation processing timings");
  sink.post(BuildEvent::AnnotationProcessingTimings {
    target: target.clone(),
    report: report.to_path_buf(),
    timings,
  });
  Ok(())
}
