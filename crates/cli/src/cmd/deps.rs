use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::output::{OutputFormat, Status, print_items, print_json, report};

/// Print `module`'s transitive dependencies in the order they are processed.
pub fn cmd_deps(file: &Path, module: &str, dynamic: bool, force_circular: bool, output: OutputFormat) -> Result<()> {
  let mut build = super::prepare(file)?;
  let closure = build
    .dependency_closure(module, dynamic, force_circular)
    .with_context(|| format!("Failed to resolve dependencies of {}", module))?;

  if output.is_json() {
    return print_json(&json!({
      "module": module,
      "dependencies": closure,
    }));
  }

  report(Status::Note, &format!("{} depends on {} module(s)", module, closure.len()));
  print_items(&closure);
  Ok(())
}
