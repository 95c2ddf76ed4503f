//! Implementation of the `modforge plan` command.
//!
//! Binds the target and selects precompiled headers, then prints the binaries,
//! per-module PCH decisions and the actions a build would run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{OutputFormat, Status, pch_label, print_field, print_items, print_json, print_section, report};

pub fn cmd_plan(file: &Path, output: OutputFormat) -> Result<()> {
  let mut build = super::prepare(file)?;
  let plan = build.plan().context("Failed to plan build")?;

  if output.is_json() {
    return print_json(&plan);
  }

  report(Status::Note, &format!("Plan for {}", plan.target));
  print_section("Binaries");
  print_items(plan.binaries.iter().map(|binary| {
    format!(
      "{} ({:?}) [{}]",
      binary.path.display(),
      binary.binary_type,
      binary.modules.join(", ")
    )
  }));

  print_section("Modules");
  print_items(plan.modules.iter().map(|module| {
    format!(
      "{} [{} file(s), {}]",
      module.name,
      module.pch.files.len(),
      pch_label(&module.pch.decision)
    )
  }));

  println!();
  print_field("Reflected modules", plan.reflected.len());
  print_field("Shared PCHs", plan.shared_pchs.len());
  print_field("Actions", plan.actions.len());

  Ok(())
}
