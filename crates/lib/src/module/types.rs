use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::binary::BinaryId;
use crate::module::rules::{ModuleRules, PlatformOverride};
use crate::platform::{CompileConfiguration, TargetPlatform};

/// Stable index of a module in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleType {
  #[default]
  Unknown,
  Runtime,
  Developer,
  Editor,
  ThirdParty,
  Program,
  Game,
}

impl ModuleType {
  /// Everything but game code belongs to the engine.
  pub fn is_engine_module(&self) -> bool {
    !matches!(self, ModuleType::Game)
  }

  /// External modules group include paths and libraries and are never compiled.
  pub fn is_external(&self) -> bool {
    matches!(self, ModuleType::ThirdParty)
  }

  /// Infer a type from the module's location.
  ///
  /// The innermost recognised segment wins. Modules outside the engine tree are game modules.
  pub fn infer(directory: &Path, engine_dir: &Path) -> ModuleType {
    if !directory.starts_with(engine_dir) {
      return ModuleType::Game;
    }
    directory
      .components()
      .rev()
      .find_map(|c| match c.as_os_str().to_str()? {
        "ThirdParty" => Some(ModuleType::ThirdParty),
        "Runtime" => Some(ModuleType::Runtime),
        "Developer" => Some(ModuleType::Developer),
        "Editor" => Some(ModuleType::Editor),
        "Programs" => Some(ModuleType::Program),
        _ => None,
      })
      .unwrap_or(ModuleType::Runtime)
  }
}

impl fmt::Display for ModuleType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// How aggressively a module's code is optimized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeOptimization {
  Never,
  InNonDebugBuilds,
  InShippingBuildsOnly,
  Always,
  #[default]
  Default,
}

impl CodeOptimization {
  /// Resolve `InNonDebugBuilds` against the configuration being compiled.
  ///
  /// Outside debug builds it is indistinguishable from `Always`.
  pub fn normalized(self, configuration: CompileConfiguration) -> CodeOptimization {
    match self {
      CodeOptimization::InNonDebugBuilds if configuration != CompileConfiguration::Debug => CodeOptimization::Always,
      other => other,
    }
  }
}

/// Whether a module may take part in shared precompiled headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PchUsage {
  #[default]
  UseSharedPchs,
  NoSharedPchs,
}

/// A framework shipped alongside a module, optionally as a zip to unpack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Framework {
  pub name: String,
  #[serde(default)]
  pub zip_path: Option<PathBuf>,
}

/// The named edge lists a module declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
  Public,
  Private,
  DynamicallyLoaded,
  PlatformSpecificDynamicallyLoaded,
  PublicIncludePath,
  PrivateIncludePath,
}

/// A materialized module.
///
/// Created by the registry from a [`ModuleRules`] record, with platform
/// overrides merged and relative paths made absolute. Binding state is set
/// once by the binary binder and left alone afterwards.
#[derive(Debug, Clone)]
pub struct Module {
  pub id: ModuleId,
  pub name: String,
  pub module_type: ModuleType,
  pub directory: PathBuf,
  pub output_directory: Option<PathBuf>,
  redistributable_override: Option<bool>,

  pub public_include_paths: Vec<PathBuf>,
  pub private_include_paths: Vec<PathBuf>,
  pub public_system_include_paths: Vec<PathBuf>,
  pub public_definitions: Vec<String>,
  pub private_definitions: Vec<String>,
  pub public_library_paths: Vec<PathBuf>,
  pub public_additional_libraries: Vec<String>,
  pub public_frameworks: Vec<String>,
  pub public_weak_frameworks: Vec<String>,
  pub public_additional_frameworks: Vec<Framework>,
  pub public_delay_load_dlls: Vec<String>,

  pub source_files: Vec<PathBuf>,
  pub optimize_code: CodeOptimization,
  pub use_clr: bool,
  pub pch_usage: PchUsage,
  pub shared_pch_header_file: Option<PathBuf>,
  pub min_files_using_pch_override: Option<usize>,

  dependency_names: HashMap<DependencyKind, Vec<String>>,
  circular_names: HashSet<String>,
  pub(crate) resolved: HashMap<DependencyKind, Vec<ModuleId>>,
  pub(crate) circular: HashSet<ModuleId>,

  /// Binary this module links into. `None` for external modules.
  pub binary: Option<BinaryId>,
  /// Whether the binder has claimed this module for the current target.
  pub included_in_target: bool,
}

impl Module {
  pub(crate) fn from_rules(id: ModuleId, rules: &ModuleRules, module_type: ModuleType, platform: TargetPlatform) -> Self {
    let dir = rules.directory.clone();
    let abs = |paths: &[PathBuf]| paths.iter().map(|p| dir.join(p)).collect::<Vec<_>>();

    let mut dependency_names = HashMap::new();
    dependency_names.insert(DependencyKind::Public, rules.public_dependency_module_names.clone());
    dependency_names.insert(DependencyKind::Private, rules.private_dependency_module_names.clone());
    dependency_names.insert(DependencyKind::DynamicallyLoaded, rules.dynamically_loaded_module_names.clone());
    dependency_names.insert(
      DependencyKind::PlatformSpecificDynamicallyLoaded,
      rules.platform_specific_dynamically_loaded_module_names.clone(),
    );
    dependency_names.insert(DependencyKind::PublicIncludePath, rules.public_include_path_module_names.clone());
    dependency_names.insert(DependencyKind::PrivateIncludePath, rules.private_include_path_module_names.clone());

    let mut module = Self {
      id,
      name: rules.name.clone(),
      module_type,
      directory: dir.clone(),
      output_directory: rules.output_directory.as_ref().map(|p| dir.join(p)),
      redistributable_override: rules.redistributable,
      public_include_paths: abs(&rules.public_include_paths),
      private_include_paths: abs(&rules.private_include_paths),
      public_system_include_paths: abs(&rules.public_system_include_paths),
      public_definitions: rules.public_definitions.clone(),
      private_definitions: rules.private_definitions.clone(),
      public_library_paths: abs(&rules.public_library_paths),
      public_additional_libraries: rules.public_additional_libraries.clone(),
      public_frameworks: rules.public_frameworks.clone(),
      public_weak_frameworks: rules.public_weak_frameworks.clone(),
      public_additional_frameworks: rules.public_additional_frameworks.clone(),
      public_delay_load_dlls: rules.public_delay_load_dlls.clone(),
      source_files: abs(&rules.source_files),
      optimize_code: rules.optimize_code,
      use_clr: rules.use_clr,
      pch_usage: rules.pch_usage,
      shared_pch_header_file: rules.shared_pch_header_file.as_ref().map(|p| dir.join(p)),
      min_files_using_pch_override: rules.min_files_using_pch_override.filter(|n| *n > 0),
      dependency_names,
      circular_names: rules.circularly_referenced_dependent_modules.iter().cloned().collect(),
      resolved: HashMap::new(),
      circular: HashSet::new(),
      binary: None,
      included_in_target: false,
    };

    if let Some(overrides) = rules.platform_overrides.get(&platform) {
      module.apply_platform_override(overrides);
    }
    module
  }

  fn apply_platform_override(&mut self, overrides: &PlatformOverride) {
    if overrides.clear_public_include_paths {
      self.clear_public_include_paths();
    }
    if overrides.clear_public_library_paths {
      self.clear_public_library_paths();
    }
    if overrides.clear_public_additional_libraries {
      self.clear_public_additional_libraries();
    }
    for definition in &overrides.remove_public_definitions {
      self.remove_public_definition(definition);
    }
    for library in &overrides.remove_public_additional_libraries {
      self.remove_public_additional_library(library);
    }

    let dir = self.directory.clone();
    self
      .public_include_paths
      .extend(overrides.public_include_paths.iter().map(|p| dir.join(p)));
    self
      .public_library_paths
      .extend(overrides.public_library_paths.iter().map(|p| dir.join(p)));
    self.public_definitions.extend(overrides.public_definitions.iter().cloned());
    self
      .public_additional_libraries
      .extend(overrides.public_additional_libraries.iter().cloned());
    self.public_frameworks.extend(overrides.public_frameworks.iter().cloned());
    self
      .public_additional_frameworks
      .extend(overrides.public_additional_frameworks.iter().cloned());
    if let Some(names) = self.dependency_names.get_mut(&DependencyKind::DynamicallyLoaded) {
      names.extend(overrides.dynamically_loaded_module_names.iter().cloned());
    }
  }

  pub fn clear_public_include_paths(&mut self) {
    self.public_include_paths.clear();
  }

  pub fn clear_public_library_paths(&mut self) {
    self.public_library_paths.clear();
  }

  pub fn clear_public_additional_libraries(&mut self) {
    self.public_additional_libraries.clear();
  }

  pub fn remove_public_additional_library(&mut self, library: &str) {
    self.public_additional_libraries.retain(|l| l != library);
  }

  pub fn remove_public_definition(&mut self, definition: &str) {
    self.public_definitions.retain(|d| d != definition);
  }

  /// Declared dependency names of the given kind.
  pub fn dependency_names(&self, kind: DependencyKind) -> &[String] {
    self.dependency_names.get(&kind).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Whether `name` is declared as a legal circular back-reference.
  pub fn declares_circular(&self, name: &str) -> bool {
    self.circular_names.contains(name)
  }

  /// Whether the already-materialized dependency `dependency` is a circular back-reference.
  pub fn is_circular(&self, dependency: ModuleId) -> bool {
    self.circular.contains(&dependency)
  }

  pub fn is_redistributable(&self) -> bool {
    self
      .redistributable_override
      .unwrap_or(!matches!(self.module_type, ModuleType::Developer | ModuleType::Editor))
  }

  /// Macro used to decorate this module's exported API.
  pub fn api_macro(&self) -> String {
    format!("{}_API", self.name.to_uppercase())
  }

  /// Rewrite a binary path so it is rooted at this module's output directory.
  ///
  /// Everything from the last `Binaries` segment on is kept, since it already
  /// carries the platform.
  pub fn fixup_output_path(&self, path: &Path) -> PathBuf {
    let Some(output_dir) = &self.output_directory else {
      return path.to_path_buf();
    };
    let components: Vec<_> = path.components().collect();
    let Some(index) = components
      .iter()
      .rposition(|c| c.as_os_str() == crate::consts::BINARIES_DIR)
    else {
      return path.to_path_buf();
    };
    components[index..]
      .iter()
      .fold(output_dir.clone(), |acc, c| acc.join(c.as_os_str()))
  }
}
