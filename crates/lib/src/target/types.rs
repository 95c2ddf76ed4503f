//! Target rules and the target description input.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BuildConfiguration;
use crate::error::BuildError;
use crate::module::ModuleRules;
use crate::platform::{TargetConfiguration, TargetPlatform};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
  #[default]
  Game,
  Editor,
  Client,
  Server,
  Program,
}

impl TargetType {
  pub fn is_game_type(&self) -> bool {
    matches!(self, TargetType::Game | TargetType::Client | TargetType::Server)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
  Monolithic,
  Modular,
}

/// What to build: one target for one platform and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRules {
  pub name: String,
  #[serde(default)]
  pub app_name: Option<String>,
  #[serde(rename = "type", default)]
  pub target_type: TargetType,
  pub platform: TargetPlatform,
  #[serde(default)]
  pub configuration: TargetConfiguration,
  /// Defaults to modular for editors, monolithic otherwise.
  #[serde(default)]
  pub link_type: Option<LinkType>,
  /// Produce a static library instead of an executable.
  #[serde(default)]
  pub build_library: bool,
  pub launch_module: String,
  #[serde(default)]
  pub extra_modules: Vec<String>,
  pub engine_dir: PathBuf,
  #[serde(default)]
  pub project_dir: Option<PathBuf>,
  #[serde(default)]
  pub project_file: Option<PathBuf>,
}

impl TargetRules {
  pub fn new(name: impl Into<String>, platform: TargetPlatform, launch_module: impl Into<String>, engine_dir: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      app_name: None,
      target_type: TargetType::Game,
      platform,
      configuration: TargetConfiguration::Development,
      link_type: None,
      build_library: false,
      launch_module: launch_module.into(),
      extra_modules: Vec::new(),
      engine_dir: engine_dir.into(),
      project_dir: None,
      project_file: None,
    }
  }

  pub fn app_name(&self) -> &str {
    self.app_name.as_deref().unwrap_or(&self.name)
  }

  pub fn link_type(&self) -> LinkType {
    self.link_type.unwrap_or(match self.target_type {
      TargetType::Editor => LinkType::Modular,
      _ => LinkType::Monolithic,
    })
  }

  pub fn should_compile_monolithic(&self) -> bool {
    self.link_type() == LinkType::Monolithic
  }
}

/// Everything the core needs to build one target, as handed over by the rules loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDescription {
  pub target: TargetRules,
  #[serde(default)]
  pub modules: Vec<ModuleRules>,
  #[serde(default)]
  pub config: BuildConfiguration,
  /// Directory relative paths are resolved against.
  #[serde(default)]
  pub source_root: Option<PathBuf>,
}

impl TargetDescription {
  /// Load a description from a JSON file.
  ///
  /// Relative paths resolve against `source_root`, itself relative to the
  /// file's directory, defaulting to that directory.
  pub fn load(path: &Path) -> Result<Self, BuildError> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let mut description: TargetDescription =
      serde_json::from_str(&content).map_err(|e| BuildError::InvalidDescription {
        path: path.to_path_buf(),
        message: e.to_string(),
      })?;

    let base = path
      .parent()
      .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
      .unwrap_or(Path::new("."));
    let base = dunce::canonicalize(base).map_err(|e| BuildError::io(base, e))?;
    let root = match &description.source_root {
      Some(root) => base.join(root),
      None => base,
    };
    description.resolve_paths(&root);
    debug!(
      target_name = %description.target.name,
      modules = description.modules.len(),
      root = %root.display(),
      "loaded target description"
    );
    Ok(description)
  }

  /// Make every relative path in the description absolute under `root`.
  pub fn resolve_paths(&mut self, root: &Path) {
    let target = &mut self.target;
    target.engine_dir = root.join(&target.engine_dir);
    target.project_dir = target.project_dir.as_ref().map(|p| root.join(p));
    target.project_file = target.project_file.as_ref().map(|p| root.join(p));

    for module in &mut self.modules {
      module.directory = root.join(&module.directory);
      module.output_directory = module.output_directory.as_ref().map(|p| root.join(p));
    }

    let config = &mut self.config;
    config.header_tool_dir = config.header_tool_dir.as_ref().map(|p| root.join(p));
    config.plugins_dir = config.plugins_dir.as_ref().map(|p| root.join(p));
    self.source_root = Some(root.to_path_buf());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn link_type_defaults_by_target_type() {
    let mut rules = TargetRules::new("Game", TargetPlatform::Linux, "Game", "/e");
    assert!(rules.should_compile_monolithic());

    rules.target_type = TargetType::Editor;
    assert!(!rules.should_compile_monolithic());

    rules.link_type = Some(LinkType::Monolithic);
    assert!(rules.should_compile_monolithic());
  }

  #[test]
  fn load_resolves_relative_paths() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("target.json");
    fs::write(
      &path,
      r#"{
        "target": {
          "name": "Shooter",
          "platform": "Linux",
          "launch_module": "Shooter",
          "engine_dir": "Engine",
          "project_dir": "Shooter"
        },
        "modules": [
          { "name": "Shooter", "type": "Game", "directory": "Shooter/Source/Shooter" }
        ],
        "config": { "header_tool_dir": "Engine/Binaries/Linux" }
      }"#,
    )
    .unwrap();

    let description = TargetDescription::load(&path).unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    assert_eq!(description.target.engine_dir, root.join("Engine"));
    assert_eq!(description.target.project_dir, Some(root.join("Shooter")));
    assert_eq!(description.modules[0].directory, root.join("Shooter/Source/Shooter"));
    assert_eq!(description.config.header_tool_dir, Some(root.join("Engine/Binaries/Linux")));
    assert_eq!(description.target.app_name(), "Shooter");
  }

  #[test]
  fn malformed_description_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("target.json");
    fs::write(&path, r#"{ "target": { "name": "X" } }"#).unwrap();

    let err = TargetDescription::load(&path).unwrap_err();
    assert!(matches!(err, BuildError::InvalidDescription { .. }));
  }
}
