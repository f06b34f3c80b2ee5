//! Implementation of the `ktjar options` command.
//!
//! Decodes an `apoptions` or `javacArguments` token from a kotlinc command
//! line back into its key/value pairs.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use ktjar_lib::options::decode_options;

use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_options(token: &str, output: OutputFormat) -> Result<()> {
  let options = decode_options(token).context("Failed to decode option token")?;

  if output.is_json() {
    return print_json(&options);
  }

  if options.is_empty() {
    print_info("No options in token");
    return Ok(());
  }
  for (key, value) in &options {
    println!("{} = {}", key.if_supports_color(Stream::Stdout, |s| s.bold()), value);
  }
  Ok(())
}
