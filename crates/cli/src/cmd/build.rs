//! Implementation of the `modforge build` command.
//!
//! Plans the target, runs the header generator when generated code is stale,
//! then executes every action that is not already up to date.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use modforge_lib::execute::SystemRunner;
use modforge_lib::target::BuildOptions;

use crate::output::{OutputFormat, Status, codegen_label, format_duration, print_field, print_items, print_json, report};

pub fn cmd_build(file: &Path, force_headers: bool, dry_run: bool, output: OutputFormat) -> Result<()> {
  let mut build = super::prepare(file)?;
  let options = BuildOptions {
    force_header_generation: force_headers,
    dry_run,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let summary = rt
    .block_on(build.build(&options, &SystemRunner))
    .with_context(|| format!("Build of {} failed", build.target().name))?;

  if output.is_json() {
    return print_json(&summary);
  }

  if dry_run {
    report(Status::Note, "Dry run - no tools were run");
    print_items(&summary.planned);
  } else {
    report(Status::Built, &format!("Built {}", summary.target));
    if let Some(codegen) = summary.codegen {
      print_field("Generated code", codegen_label(codegen));
    }
    print_field("Actions executed", summary.executed.len());
    print_field("Actions up to date", summary.skipped.len());
  }
  for binary in &summary.binaries {
    print_field("Binary", binary.display());
  }
  print_field("Duration", format_duration(summary.duration));

  info!(target_name = %summary.target, "build finished");
  Ok(())
}
