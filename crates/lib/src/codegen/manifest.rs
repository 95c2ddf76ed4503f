use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codegen::reflect::ReflectedModule;
use crate::error::BuildError;
use crate::target::TargetRules;

/// Input file handed to the header generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
  pub is_game_target: bool,
  /// Directory containing the engine tree on this machine.
  pub root_local_path: String,
  /// The same directory as seen by the machine doing the build.
  pub root_build_path: String,
  pub target_name: String,
  pub modules: Vec<ManifestModule>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestModule {
  pub name: String,
  pub module_type: String,
  pub base_directory: PathBuf,
  /// Generated includes are relative to this directory.
  pub include_base: PathBuf,
  pub output_directory: PathBuf,
  pub classes_headers: Vec<PathBuf>,
  pub public_headers: Vec<PathBuf>,
  pub private_headers: Vec<PathBuf>,
  #[serde(rename = "PCH")]
  pub pch: String,
  #[serde(rename = "GeneratedCPPFilenameBase")]
  pub generated_cpp_filename_base: PathBuf,
  pub save_exported_headers: bool,
}

impl Manifest {
  pub fn new(target: &TargetRules, installed_engine: bool, modules: &[ReflectedModule]) -> Self {
    let root = target.engine_dir.parent().unwrap_or(&target.engine_dir);
    let root_local_path = root.display().to_string();
    let root_build_path = format!("{}{}", root_local_path, std::path::MAIN_SEPARATOR);

    let modules = modules
      .iter()
      .map(|module| ManifestModule {
        name: module.name.clone(),
        module_type: module.module_type.to_string(),
        base_directory: module.directory.clone(),
        include_base: module.directory.clone(),
        output_directory: module.generated_dir.clone(),
        classes_headers: module.classes_headers.clone(),
        public_headers: module.public_headers.clone(),
        private_headers: module.private_headers.clone(),
        pch: module
          .pch
          .as_ref()
          .map(|p| p.display().to_string())
          .unwrap_or_default(),
        generated_cpp_filename_base: module.generated_cpp_base(),
        save_exported_headers: !installed_engine || !target.is_under_engine(&module.directory),
      })
      .collect();

    Self {
      is_game_target: target.target_type.is_game_type(),
      root_local_path,
      root_build_path,
      target_name: target.name.clone(),
      modules,
    }
  }

  /// Write the manifest as JSON, creating its directory.
  pub fn write(&self, path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(self)?;
    fs::write(path, content).map_err(|e| BuildError::io(path, e))
  }
}
