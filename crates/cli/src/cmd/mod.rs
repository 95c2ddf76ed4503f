mod build;
mod deps;
mod env;
mod plan;

use std::path::Path;

use anyhow::{Context, Result};

use modforge_lib::target::{TargetBuild, TargetDescription};

pub use build::cmd_build;
pub use deps::cmd_deps;
pub use env::cmd_env;
pub use plan::cmd_plan;

/// Load a target description, apply environment overrides and bind the target.
fn prepare(path: &Path) -> Result<TargetBuild> {
  let mut description = TargetDescription::load(path)
    .with_context(|| format!("Failed to load target description: {}", path.display()))?;
  description.config = description.config.with_env();
  let name = description.target.name.clone();
  TargetBuild::prepare(description).with_context(|| format!("Failed to bind target {}", name))
}
