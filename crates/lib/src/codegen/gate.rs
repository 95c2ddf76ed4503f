use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::codegen::CompilationResult;
use crate::codegen::manifest::Manifest;
use crate::codegen::marker::{marker_path, read_marker, write_marker};
use crate::codegen::reflect::ReflectedModule;
use crate::codegen::tool::{EmbeddedVersionProbe, HeaderTool, Stamp, VersionProbe};
use crate::config::BuildConfiguration;
use crate::consts::INTERMEDIATE_DIR;
use crate::error::BuildError;
use crate::execute::{ToolInvocation, ToolRunner};
use crate::target::TargetRules;
use crate::util::fs::{is_under_ignore_case, modified};

const LOG_COMMANDS: &str = "-LogCmds=\"loginit warning, logexit warning, logdatabase error\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodegenOutcome {
  /// Nothing to generate: no reflected modules, or the target is the generator itself.
  NotRequired,
  /// Generated code was current; the generator did not run.
  UpToDate,
  /// The generator ran successfully.
  Generated,
}

/// Decides whether the header generator must run for a target, and runs it.
pub struct CodegenGate<'a, P = EmbeddedVersionProbe> {
  target: &'a TargetRules,
  config: &'a BuildConfiguration,
  probe: P,
}

impl<'a> CodegenGate<'a> {
  pub fn new(target: &'a TargetRules, config: &'a BuildConfiguration) -> Self {
    Self {
      target,
      config,
      probe: EmbeddedVersionProbe,
    }
  }
}

impl<'a, P: VersionProbe> CodegenGate<'a, P> {
  pub fn with_probe<Q: VersionProbe>(self, probe: Q) -> CodegenGate<'a, Q> {
    CodegenGate {
      target: self.target,
      config: self.config,
      probe,
    }
  }

  /// Whether the target being built is the header generator.
  pub fn is_building_generator(&self) -> bool {
    self.target.name.eq_ignore_ascii_case(&self.config.header_tool_name)
  }

  /// Whether any reflected module needs its code regenerated.
  ///
  /// Checking stops at the first stale module. Mismatched generator
  /// libraries are deleted along the way.
  pub fn is_out_of_date(&self, modules: &[ReflectedModule]) -> Result<bool, BuildError> {
    let tool = HeaderTool::locate(self.target, self.config)?;
    self.check_modules(modules, &tool)
  }

  fn check_modules(&self, modules: &[ReflectedModule], tool: &HeaderTool) -> Result<bool, BuildError> {
    let tool_stamp = tool.stamp(&self.probe)?;
    let baseline_stamp = self.baseline_stamp(modules)?;

    for module in modules {
      if self.is_skipped_when_installed(module) {
        continue;
      }
      if self.is_stale(module, tool_stamp, baseline_stamp)? {
        return Ok(true);
      }
    }
    Ok(false)
  }

  fn baseline_stamp(&self, modules: &[ReflectedModule]) -> Result<Stamp, BuildError> {
    let Some(baseline) = &self.config.baseline_module else {
      return Ok(Stamp::Min);
    };
    let module = modules
      .iter()
      .find(|m| m.name.eq_ignore_ascii_case(baseline))
      .ok_or_else(|| BuildError::BaselineModuleMissing(baseline.clone()))?;
    if self.config.installed_engine {
      return Ok(Stamp::Min);
    }
    Ok(modified(&module.generated_cpp()).map(Stamp::At).unwrap_or(Stamp::Max))
  }

  /// Modules outside the project are owned by an installed engine.
  fn is_skipped_when_installed(&self, module: &ReflectedModule) -> bool {
    self.config.installed_engine
      && !self
        .target
        .project_dir
        .as_deref()
        .is_some_and(|project| is_under_ignore_case(&module.directory, project))
  }

  fn is_stale(&self, module: &ReflectedModule, tool_stamp: Stamp, baseline_stamp: Stamp) -> Result<bool, BuildError> {
    let name = &module.name;
    if !module.generated_dir.is_dir() {
      debug!(module = %name, "header tool needs to run because no generated code directory was found");
      return Ok(true);
    }
    let (Some(marker_time), Some(recorded)) = (
      modified(&marker_path(&module.generated_dir)),
      read_marker(&module.generated_dir)?,
    ) else {
      debug!(module = %name, "header tool needs to run because the timestamp marker does not exist");
      return Ok(true);
    };

    let marker_stamp = Stamp::At(marker_time);
    if marker_stamp <= tool_stamp || marker_stamp <= baseline_stamp {
      debug!(module = %name, "header tool needs to run because the tool or the baseline module is newer than the marker");
      return Ok(true);
    }

    let headers: Vec<_> = module.headers().collect();
    if headers.len() != recorded.len() {
      debug!(module = %name, "header tool needs to run because the number of reflected headers changed");
      return Ok(true);
    }
    let same_set = headers
      .iter()
      .zip(&recorded)
      .all(|(header, line)| header.to_string_lossy().eq_ignore_ascii_case(line));
    if !same_set {
      debug!(module = %name, "header tool needs to run because the set of reflected headers changed");
      return Ok(true);
    }

    for header in headers {
      if modified(header).is_some_and(|time| time > marker_time) {
        debug!(module = %name, header = %header.display(), "header tool needs to run because a header is newer than the marker");
        return Ok(true);
      }
    }
    Ok(false)
  }

  /// Rewrite the marker of every module whose generated-code directory exists.
  pub fn update_markers(&self, modules: &[ReflectedModule]) -> Result<(), BuildError> {
    let engine_build = self.target.engine_dir.join(INTERMEDIATE_DIR).join("Build");
    for module in modules {
      if !module.generated_dir.is_dir() {
        continue;
      }
      if self.config.installed_engine
        && (module.generated_dir.starts_with(&engine_build) || self.is_skipped_when_installed(module))
      {
        continue;
      }
      write_marker(&module.generated_dir, module.headers())?;
    }
    Ok(())
  }

  fn invocation(&self, tool: &HeaderTool, manifest_path: &std::path::Path) -> ToolInvocation {
    let invocation = ToolInvocation::new(&tool.executable);
    let invocation = match &self.target.project_file {
      Some(project) => invocation.path_arg(project),
      None => invocation.arg(&self.target.name),
    };
    let mut invocation = invocation.path_arg(manifest_path).arg(LOG_COMMANDS);
    if self.config.installed_engine {
      invocation = invocation.arg("-installed");
    }
    if self.config.fail_if_generated_code_changes {
      invocation = invocation.arg("-FailIfGeneratedCodeChanges");
    }
    invocation
  }

  /// Run the generator once for all `modules` if any of them is stale.
  pub async fn run<R: ToolRunner>(&self, modules: &[ReflectedModule], runner: &R) -> Result<CodegenOutcome, BuildError> {
    if modules.is_empty() || self.is_building_generator() {
      debug!(target_name = %self.target.name, "no reflection code to generate");
      return Ok(CodegenOutcome::NotRequired);
    }

    let tool = HeaderTool::locate(self.target, self.config)?;
    let needs_run = self.config.force_header_generation || self.check_modules(modules, &tool)?;
    if !needs_run {
      info!(target_name = %self.target.name, "generated code is up to date");
      self.update_markers(modules)?;
      return Ok(CodegenOutcome::UpToDate);
    }

    if !tool.exists() {
      return Err(BuildError::GeneratorNotFound(tool.executable));
    }

    let manifest_path = self.target.manifest_path();
    Manifest::new(self.target, self.config.installed_engine, modules).write(&manifest_path)?;

    info!(target_name = %self.target.name, modules = modules.len(), "parsing headers");
    let started = Instant::now();
    let output = runner.run(&self.invocation(&tool, &manifest_path)).await?;
    if !output.success() {
      return Err(BuildError::ToolFailed {
        target: self.target.name.clone(),
        result: CompilationResult::from_code(output.exit_code),
      });
    }
    info!(
      target_name = %self.target.name,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "reflection code generated"
    );

    self.update_markers(modules)?;
    Ok(CodegenOutcome::Generated)
  }
}

/// Run the header generator for `modules` if their generated code is stale.
pub async fn execute_header_tool_if_necessary<R: ToolRunner>(
  target: &TargetRules,
  config: &BuildConfiguration,
  modules: &[ReflectedModule],
  runner: &R,
) -> Result<CodegenOutcome, BuildError> {
  CodegenGate::new(target, config).run(modules, runner).await
}
