//! Directory layout of a target build.
//!
//! ```text
//! <root>/Binaries/<Platform>/<App>[-<Module>][-<Platform>-<Config>]<ext>
//! <root>/Intermediate/Build/<Platform>/<Target>/<Config>/        per-target objects
//! <root>/Intermediate/Build/<Platform>/<Target>/<Target>.uhtmanifest
//! <root>/Intermediate/Build/<Platform>/<Target>/Inc/<Module>/    generated code (monolithic, programs)
//! <root>/Intermediate/Build/<Platform>/Inc/<Module>/             generated code (modular)
//! ```
//!
//! `<root>` is the project directory for project-owned files and the engine
//! directory otherwise.

use std::path::{Path, PathBuf};

use crate::binary::BinaryType;
use crate::consts::{BINARIES_DIR, INTERMEDIATE_DIR, MANIFEST_EXTENSION};
use crate::platform::TargetConfiguration;
use crate::target::types::{TargetRules, TargetType};

impl TargetRules {
  /// Project directory, or the engine directory for engine-only targets.
  pub fn root_dir(&self) -> &Path {
    self.project_dir.as_deref().unwrap_or(&self.engine_dir)
  }

  pub fn is_under_project(&self, path: &Path) -> bool {
    self.project_dir.as_deref().is_some_and(|p| path.starts_with(p))
  }

  pub fn is_under_engine(&self, path: &Path) -> bool {
    path.starts_with(&self.engine_dir)
  }

  fn platform_intermediate(&self, root: &Path) -> PathBuf {
    root
      .join(INTERMEDIATE_DIR)
      .join("Build")
      .join(self.platform.as_str())
  }

  /// Intermediate directory for this target's own objects.
  pub fn intermediate_dir(&self) -> PathBuf {
    self
      .platform_intermediate(self.root_dir())
      .join(&self.name)
      .join(self.configuration.as_str())
  }

  /// Intermediate directory for engine modules built by this target.
  pub fn engine_intermediate_dir(&self) -> PathBuf {
    self
      .platform_intermediate(&self.engine_dir)
      .join(self.app_name())
      .join(self.configuration.as_str())
  }

  /// Manifest handed to the header generator.
  pub fn manifest_path(&self) -> PathBuf {
    self
      .platform_intermediate(self.root_dir())
      .join(&self.name)
      .join(format!("{}.{}", self.name, MANIFEST_EXTENSION))
  }

  /// Where generated reflection code for a module is written.
  pub fn generated_code_dir(&self, module_dir: &Path, module_name: &str) -> PathBuf {
    let base = if self.should_compile_monolithic() || self.target_type == TargetType::Program {
      self.platform_intermediate(self.root_dir()).join(&self.name).join("Inc")
    } else if self.is_under_project(module_dir) {
      self.platform_intermediate(self.root_dir()).join("Inc")
    } else {
      self.platform_intermediate(&self.engine_dir).join("Inc")
    };
    base.join(module_name)
  }

  /// Output path for a binary named `base_name`.
  ///
  /// `owner_dir` is the directory of the module owning the binary; binaries of
  /// modules outside the project land in the engine tree.
  pub fn binary_path(&self, base_name: &str, binary_type: BinaryType, owner_dir: Option<&Path>) -> PathBuf {
    let root = match owner_dir {
      Some(dir) if !self.is_under_project(dir) => &self.engine_dir,
      _ => self.root_dir(),
    };
    let suffix = match self.configuration {
      TargetConfiguration::Development => String::new(),
      config => format!("-{}-{}", self.platform, config),
    };
    root
      .join(BINARIES_DIR)
      .join(self.platform.as_str())
      .join(format!("{}{}{}", base_name, suffix, binary_type.extension(self.platform)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::TargetPlatform;
  use crate::target::types::LinkType;

  fn target() -> TargetRules {
    let mut t = TargetRules::new("Shooter", TargetPlatform::Linux, "Shooter", "/e");
    t.project_dir = Some(PathBuf::from("/p"));
    t
  }

  #[test]
  fn binary_names_carry_configuration_suffix() {
    let mut t = target();
    assert_eq!(
      t.binary_path("Shooter", BinaryType::Executable, None),
      PathBuf::from("/p/Binaries/Linux/Shooter")
    );

    t.configuration = TargetConfiguration::Shipping;
    assert_eq!(
      t.binary_path("Shooter-Core", BinaryType::DynamicLinkLibrary, Some(Path::new("/e/Source/Runtime/Core"))),
      PathBuf::from("/e/Binaries/Linux/Shooter-Core-Linux-Shipping.so")
    );
  }

  #[test]
  fn generated_code_dir_depends_on_linkage() {
    let mut t = target();
    assert_eq!(
      t.generated_code_dir(Path::new("/e/Source/Runtime/Engine"), "Engine"),
      PathBuf::from("/p/Intermediate/Build/Linux/Shooter/Inc/Engine")
    );

    t.link_type = Some(LinkType::Modular);
    assert_eq!(
      t.generated_code_dir(Path::new("/p/Source/Shooter"), "Shooter"),
      PathBuf::from("/p/Intermediate/Build/Linux/Inc/Shooter")
    );
    assert_eq!(
      t.generated_code_dir(Path::new("/e/Source/Runtime/Engine"), "Engine"),
      PathBuf::from("/e/Intermediate/Build/Linux/Inc/Engine")
    );
  }

  #[test]
  fn intermediate_dirs() {
    let t = target();
    assert_eq!(t.intermediate_dir(), PathBuf::from("/p/Intermediate/Build/Linux/Shooter/Development"));
    assert_eq!(
      t.engine_intermediate_dir(),
      PathBuf::from("/e/Intermediate/Build/Linux/Shooter/Development")
    );
    assert_eq!(
      t.manifest_path(),
      PathBuf::from("/p/Intermediate/Build/Linux/Shooter/Shooter.uhtmanifest")
    );
  }
}
