//! Module rule records.
//!
//! A [`ModuleRules`] is the declarative description of one module handed to the
//! core by the external rules loader. Relative paths are relative to the
//! module's directory. Per-platform adjustments live in
//! [`ModuleRules::platform_overrides`] and are merged when the module is
//! materialized.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::module::types::{CodeOptimization, Framework, ModuleType, PchUsage};
use crate::platform::TargetPlatform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleRules {
  pub name: String,
  #[serde(rename = "type")]
  pub module_type: ModuleType,
  pub directory: PathBuf,
  pub output_directory: Option<PathBuf>,
  pub redistributable: Option<bool>,

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

  pub public_dependency_module_names: Vec<String>,
  pub private_dependency_module_names: Vec<String>,
  pub public_include_path_module_names: Vec<String>,
  pub private_include_path_module_names: Vec<String>,
  pub dynamically_loaded_module_names: Vec<String>,
  pub platform_specific_dynamically_loaded_module_names: Vec<String>,
  pub circularly_referenced_dependent_modules: Vec<String>,

  /// Source files to compile. When empty, the module directory is scanned.
  pub source_files: Vec<PathBuf>,
  pub optimize_code: CodeOptimization,
  pub use_clr: bool,
  pub pch_usage: PchUsage,
  /// Header offered to other modules as a shared precompiled header tier.
  pub shared_pch_header_file: Option<PathBuf>,
  pub min_files_using_pch_override: Option<usize>,

  pub platform_overrides: BTreeMap<TargetPlatform, PlatformOverride>,
}

/// Adjustments applied to a module's public lists for one platform.
///
/// Clears run first, then removals, then additions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOverride {
  pub clear_public_include_paths: bool,
  pub clear_public_library_paths: bool,
  pub clear_public_additional_libraries: bool,
  pub remove_public_definitions: Vec<String>,
  pub remove_public_additional_libraries: Vec<String>,
  pub public_include_paths: Vec<PathBuf>,
  pub public_definitions: Vec<String>,
  pub public_library_paths: Vec<PathBuf>,
  pub public_additional_libraries: Vec<String>,
  pub public_frameworks: Vec<String>,
  pub public_additional_frameworks: Vec<Framework>,
  pub dynamically_loaded_module_names: Vec<String>,
}

impl ModuleRules {
  /// Rules for a module with the given name, type and directory and nothing else.
  pub fn new(name: impl Into<String>, module_type: ModuleType, directory: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      module_type,
      directory: directory.into(),
      ..Default::default()
    }
  }
}
