use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::binary::{BinaryId, BinaryType};
use crate::environment::compile::EnvironmentBuilder;
use crate::error::BuildError;
use crate::module::{DependencyKind, Framework, ModuleId};

/// Libraries and binaries one binary links against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkEnvironment {
  pub library_paths: Vec<PathBuf>,
  pub additional_libraries: Vec<String>,
  pub frameworks: Vec<String>,
  pub weak_frameworks: Vec<String>,
  pub additional_frameworks: Vec<Framework>,
  pub delay_load_dlls: Vec<String>,
  /// Other binaries of the target this one depends on.
  pub binary_dependencies: Vec<BinaryId>,
}

impl EnvironmentBuilder<'_> {
  /// Add what a binary linking against `module` needs.
  ///
  /// Modules that live in a static library pull in the link settings of their
  /// external and statically linked dependencies too, since the library does
  /// not carry them.
  pub fn setup_public_link_environment(
    &mut self,
    module: ModuleId,
    source_binary: Option<BinaryId>,
    env: &mut LinkEnvironment,
    visited: &mut HashSet<ModuleId>,
  ) -> Result<(), BuildError> {
    if !visited.insert(module) {
      return Ok(());
    }
    let m = self.registry.get(module);
    if !m.included_in_target {
      return Ok(());
    }

    let binary = m.binary;
    if let Some(binary) = binary {
      if Some(binary) != source_binary && !env.binary_dependencies.contains(&binary) {
        env.binary_dependencies.push(binary);
      }
    }

    let is_static = |b: Option<BinaryId>| b.is_some_and(|b| self.binaries.get(b).binary_type == BinaryType::StaticLibrary);
    if !is_static(source_binary) && is_static(binary) {
      let dependencies = self
        .registry
        .dependencies_of(module, &[DependencyKind::Private, DependencyKind::Public])?;
      for dependency in dependencies {
        let dep = self.registry.get(dependency);
        let is_static = dep
          .binary
          .is_some_and(|b| self.binaries.get(b).binary_type == BinaryType::StaticLibrary);
        if dep.module_type.is_external() || is_static {
          self.setup_public_link_environment(dependency, source_binary, env, visited)?;
        }
      }
    }

    let m = self.registry.get(module);
    env.library_paths.extend(m.public_library_paths.iter().cloned());
    env.additional_libraries.extend(m.public_additional_libraries.iter().cloned());
    env.frameworks.extend(m.public_frameworks.iter().cloned());
    env.weak_frameworks.extend(m.public_weak_frameworks.iter().cloned());
    env.additional_frameworks.extend(m.public_additional_frameworks.iter().cloned());
    env.delay_load_dlls.extend(m.public_delay_load_dlls.iter().cloned());
    Ok(())
  }

  /// Add what linking `module`'s own objects needs.
  pub fn setup_private_link_environment(
    &mut self,
    module: ModuleId,
    env: &mut LinkEnvironment,
    visited: &mut HashSet<ModuleId>,
  ) -> Result<(), BuildError> {
    let binary = self.registry.get(module).binary;
    self.setup_public_link_environment(module, binary, env, visited)?;

    let dependencies = self
      .registry
      .dependencies_of(module, &[DependencyKind::Private, DependencyKind::Public])?;
    for dependency in dependencies {
      self.setup_public_link_environment(dependency, binary, env, visited)?;
    }
    Ok(())
  }

  /// Link environment of a whole binary, gathered over every module it contains.
  pub fn create_binary_link_environment(&mut self, binary: BinaryId) -> Result<LinkEnvironment, BuildError> {
    let mut env = LinkEnvironment::default();
    let mut visited = HashSet::new();
    for module in self.binaries.get(binary).modules.clone() {
      self.setup_private_link_environment(module, &mut env, &mut visited)?;
    }
    Ok(env)
  }
}
