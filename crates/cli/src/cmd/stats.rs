use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use ktjar_lib::stats::parse_report;

use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, print_warning};

pub fn cmd_stats(report: &Path, output: OutputFormat) -> Result<()> {
  let text = fs::read_to_string(report).with_context(|| format!("Failed to read report: {}", report.display()))?;
  let timings = parse_report(&text).with_context(|| format!("Failed to parse report: {}", report.display()))?;

  if output.is_json() {
    return print_json(&timings);
  }

  if timings.is_empty() {
    print_warning("Report lists no annotation processors");
    return Ok(());
  }

  let total: u64 = timings.iter().map(|t| t.total_ms).sum();
  print_success(&format!(
    "{} processor(s), {}",
    timings.len(),
    format_duration(Duration::from_millis(total))
  ));
  for timing in &timings {
    print_stat(
      &timing.processor,
      &format!(
        "{} (init {}, {} round(s))",
        format_duration(Duration::from_millis(timing.total_ms)),
        format_duration(Duration::from_millis(timing.init_ms)),
        timing.rounds_ms.len()
      ),
    );
  }
  Ok(())
}
