use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::trace;

use crate::binary::{BinaryId, BinarySet, BinaryType};
use crate::error::BuildError;
use crate::module::{CodeOptimization, DependencyKind, Framework, ModuleId, ModuleRegistry};
use crate::platform::{CompileConfiguration, TargetConfiguration};
use crate::target::TargetRules;

/// Whether a translation unit creates, includes, or ignores a precompiled header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PchAction {
  #[default]
  None,
  Include,
  Create,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PchSettings {
  pub action: PchAction,
  /// Absolute path of the header the PCH is built from.
  pub header: Option<PathBuf>,
  /// The header as spelled in source, before resolution.
  pub header_name_in_code: Option<String>,
}

/// Everything the compiler needs to know besides the source file itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompileEnvironment {
  pub include_paths: Vec<PathBuf>,
  pub system_include_paths: Vec<PathBuf>,
  pub definitions: Vec<String>,
  pub additional_frameworks: Vec<Framework>,
  pub configuration: CompileConfiguration,
  pub optimize_code: CodeOptimization,
  pub use_clr: bool,
  pub output_directory: PathBuf,
  pub pch: PchSettings,
}

impl CompileEnvironment {
  /// Target-wide settings every module starts from.
  pub fn base(target: &TargetRules) -> Self {
    let platform = target.platform;
    Self {
      definitions: vec![
        format!("DLLEXPORT={}", platform.dll_export()),
        format!("DLLIMPORT={}", platform.dll_import()),
        format!("IS_MONOLITHIC={}", u8::from(target.should_compile_monolithic())),
      ],
      configuration: target.configuration.compile_configuration(),
      output_directory: target.intermediate_dir(),
      ..Default::default()
    }
  }
}

/// Derives environments from the bound module graph.
pub struct EnvironmentBuilder<'a> {
  pub(crate) registry: &'a mut ModuleRegistry,
  pub(crate) binaries: &'a BinarySet,
  pub(crate) target: &'a TargetRules,
}

impl<'a> EnvironmentBuilder<'a> {
  pub fn new(registry: &'a mut ModuleRegistry, binaries: &'a BinarySet, target: &'a TargetRules) -> Self {
    Self {
      registry,
      binaries,
      target,
    }
  }

  /// Add what a module including `module`'s public headers needs.
  ///
  /// `source_binary` is the binary being compiled and decides the value of
  /// the module's `<NAME>_API` macro. With `include_paths_only` the module's
  /// headers are exposed without importing it, and its public dependencies
  /// are not followed.
  pub fn setup_public_compile_environment(
    &mut self,
    module: ModuleId,
    source_binary: Option<BinaryId>,
    include_paths_only: bool,
    env: &mut CompileEnvironment,
    visited: &mut HashSet<ModuleId>,
  ) -> Result<(), BuildError> {
    if !visited.insert(module) {
      return Ok(());
    }

    let m = self.registry.get(module);
    env.include_paths.extend(m.public_include_paths.iter().cloned());
    env.system_include_paths.extend(m.public_system_include_paths.iter().cloned());
    env.definitions.extend(m.public_definitions.iter().cloned());
    if let Some(definition) = self.api_definition(module, source_binary, include_paths_only) {
      env.definitions.push(definition);
    }

    if !include_paths_only {
      for dependency in self.registry.dependencies(module, DependencyKind::Public)? {
        self.setup_public_compile_environment(dependency, source_binary, false, env, visited)?;
      }
    }
    for dependency in self.registry.dependencies(module, DependencyKind::PublicIncludePath)? {
      self.setup_public_compile_environment(dependency, source_binary, true, env, visited)?;
    }

    let m = self.registry.get(module);
    env.include_paths.push(m.directory.clone());
    env.additional_frameworks.extend(m.public_additional_frameworks.iter().cloned());
    Ok(())
  }

  /// The `<NAME>_API=` definition `module` contributes when seen from `source_binary`.
  ///
  /// Modules without a binary contribute none.
  fn api_definition(&self, module: ModuleId, source_binary: Option<BinaryId>, include_paths_only: bool) -> Option<String> {
    let m = self.registry.get(module);
    let binary = self.binaries.get(m.binary?);
    let api = m.api_macro();
    let source = source_binary.map(|b| self.binaries.get(b).file_stem()).unwrap_or_default();

    let value = if binary.binary_type == BinaryType::StaticLibrary {
      ""
    } else if Some(binary.id) == source_binary {
      if binary.allow_exports {
        trace!(binary = %source, module = %m.name, "exporting");
        "DLLEXPORT"
      } else {
        ""
      }
    } else if include_paths_only {
      trace!(binary = %source, module = %m.name, from = %binary.file_stem(), "include paths only");
      ""
    } else if binary.allow_exports {
      trace!(binary = %source, module = %m.name, from = %binary.file_stem(), "importing");
      "DLLIMPORT"
    } else {
      ""
    };
    Some(format!("{}={}", api, value))
  }

  /// Add what compiling `module`'s own sources needs on top of its public environment.
  pub fn setup_private_compile_environment(
    &mut self,
    module: ModuleId,
    env: &mut CompileEnvironment,
  ) -> Result<(), BuildError> {
    let mut visited = HashSet::new();
    let binary = self.registry.get(module).binary;

    env
      .include_paths
      .extend(self.registry.get(module).private_include_paths.iter().cloned());
    self.setup_public_compile_environment(module, binary, false, env, &mut visited)?;
    for dependency in self.registry.dependencies(module, DependencyKind::Private)? {
      self.setup_public_compile_environment(dependency, binary, false, env, &mut visited)?;
    }
    for dependency in self.registry.dependencies(module, DependencyKind::PrivateIncludePath)? {
      self.setup_public_compile_environment(dependency, binary, true, env, &mut visited)?;
    }
    Ok(())
  }

  /// The full environment `module`'s sources compile with.
  pub fn create_module_compile_environment(
    &mut self,
    module: ModuleId,
    base: &CompileEnvironment,
  ) -> Result<CompileEnvironment, BuildError> {
    let m = self.registry.get(module);
    let binary = m.binary.ok_or_else(|| BuildError::ModuleNotBound(m.name.clone()))?;

    let mut env = base.clone();
    env.optimize_code = m.optimize_code;
    env.use_clr = m.use_clr;
    env.output_directory = self.binaries.get(binary).intermediate_directory.join(&m.name);

    if self.target.configuration == TargetConfiguration::DebugGame && !self.target.is_under_engine(&m.directory) {
      env.configuration = CompileConfiguration::Debug;
      env.definitions.push("UE_BUILD_DEVELOPMENT_WITH_DEBUGGAME=1".to_string());
    }
    env.definitions.extend(m.private_definitions.iter().cloned());

    self.setup_private_compile_environment(module, &mut env)?;
    Ok(env)
  }
}
