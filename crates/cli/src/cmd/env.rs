//! Implementation of the `modforge env` command.
//!
//! Shows the compile environment a module's sources see and, when the module
//! is bound, the link environment of the binary it lives in.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::output::{OutputFormat, Status, print_block, print_field, print_json, print_section, report};

pub fn cmd_env(file: &Path, module: &str, output: OutputFormat) -> Result<()> {
  let mut build = super::prepare(file)?;
  let compile = build
    .compile_environment(module)
    .with_context(|| format!("Failed to build compile environment of {}", module))?;

  let binary = build.binaries().for_module(module);
  let link = match binary {
    Some(id) => Some(
      build
        .link_environment(id)
        .with_context(|| format!("Failed to build link environment of {}", module))?,
    ),
    None => None,
  };
  let binary_path = binary.map(|id| build.binaries().get(id).output_path.clone());

  if output.is_json() {
    return print_json(&json!({
      "module": module,
      "binary": binary_path,
      "compile": compile,
      "link": link,
    }));
  }

  report(Status::Note, &format!("Compile environment of {}", module));
  print_field("Configuration", format!("{:?}", compile.configuration));
  print_field("Output directory", compile.output_directory.display());
  print_block("Definitions", &compile.definitions);
  print_block("Include paths", compile.include_paths.iter().map(|p| p.display()));
  if !compile.system_include_paths.is_empty() {
    print_block(
      "System include paths",
      compile.system_include_paths.iter().map(|p| p.display()),
    );
  }

  let (Some(binary_path), Some(link)) = (binary_path, link) else {
    report(Status::Warning, &format!("{} is not bound to any binary of {}", module, build.target().name));
    return Ok(());
  };

  print_section(&format!("Link environment of {}", binary_path.display()));
  print_field("Libraries", link.additional_libraries.join(", "));
  print_field("Library paths", link.library_paths.len());
  print_block(
    "Binary dependencies",
    link
      .binary_dependencies
      .iter()
      .map(|dependency| build.binaries().get(*dependency).output_path.display()),
  );
  Ok(())
}
