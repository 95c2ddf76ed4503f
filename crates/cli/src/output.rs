//! Terminal rendering for build reports, plans and environments.
//!
//! Status lines go through [`report`]; the command modules only pick the
//! [`Status`] and the text. `--output json` bypasses all of this.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use modforge_lib::codegen::CodegenOutcome;
use modforge_lib::pch::PchDecision;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Kind of a status line. Failures and warnings go to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Built,
  Failed,
  Warning,
  Note,
}

impl Status {
  fn marker(self) -> &'static str {
    match self {
      Status::Built => "✓",
      Status::Failed => "✗",
      Status::Warning => "⚠",
      Status::Note => "•",
    }
  }

  fn stream(self) -> Stream {
    match self {
      Status::Built | Status::Note => Stream::Stdout,
      Status::Failed | Status::Warning => Stream::Stderr,
    }
  }
}

pub fn report(status: Status, message: &str) {
  let stream = status.stream();
  let marker_text = status.marker();
  let marker = marker_text.if_supports_color(stream, |s| match status {
    Status::Built => s.green().to_string(),
    Status::Failed => s.red().to_string(),
    Status::Warning => s.yellow().to_string(),
    Status::Note => s.blue().to_string(),
  });
  match status {
    Status::Built | Status::Note => println!("{} {}", marker, message),
    Status::Failed => eprintln!("{} {}", marker, message.if_supports_color(stream, |s| s.red())),
    Status::Warning => eprintln!("{} {}", marker, message.if_supports_color(stream, |s| s.yellow())),
  }
}

/// Indented `label: value` line under a status line.
pub fn print_field(label: &str, value: impl Display) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

/// Bulleted entries such as action descriptions or module names.
pub fn print_items<T: Display>(items: impl IntoIterator<Item = T>) {
  for item in items {
    println!("  → {}", item);
  }
}

/// A labelled block of paths or definitions, one per line.
pub fn print_block<T: Display>(label: &str, entries: impl IntoIterator<Item = T>) {
  println!("  {}:", label.if_supports_color(Stream::Stdout, |s| s.dimmed()));
  for entry in entries {
    println!("    {}", entry);
  }
}

/// Section title separating the parts of `plan` and `env`.
pub fn print_section(title: &str) {
  println!();
  println!("{}", title.if_supports_color(Stream::Stdout, |s| s.bold()));
}

/// Elapsed build time rounded to milliseconds, e.g. `1s 500ms`.
pub fn format_duration(duration: Duration) -> String {
  let rounded = Duration::from_millis(duration.as_millis() as u64);
  humantime::format_duration(rounded).to_string()
}

pub fn codegen_label(outcome: CodegenOutcome) -> &'static str {
  match outcome {
    CodegenOutcome::NotRequired => "not required",
    CodegenOutcome::UpToDate => "up to date",
    CodegenOutcome::Generated => "generated",
  }
}

pub fn pch_label(decision: &PchDecision) -> String {
  match decision {
    PchDecision::None => "no pch".to_string(),
    PchDecision::Unique { header } => format!("unique pch {}", header.display()),
    PchDecision::Shared { header, .. } => format!("shared pch {}", header.display()),
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
