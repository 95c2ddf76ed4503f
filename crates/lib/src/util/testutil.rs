//! Test fixtures: an on-disk engine/project tree and a recording tool runner.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tempfile::TempDir;

use crate::binary::{BinarySet, bind_target};
use crate::error::BuildError;
use crate::execute::{ToolInvocation, ToolOutput, ToolRunner};
use crate::module::{ModuleRegistry, ModuleRules, ModuleType};
use crate::platform::TargetPlatform;
use crate::target::{LinkType, TargetRules};

/// Returns an invocation running `script` through the platform shell.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> ToolInvocation {
  ToolInvocation::new("/bin/sh").args(["-c", script])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> ToolInvocation {
  ToolInvocation::new("cmd.exe").args(["/C", script])
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
  fs::File::options()
    .write(true)
    .open(path)
    .and_then(|f| f.set_modified(time))
    .unwrap();
}

/// A temporary tree with `Engine/` and `Game/` roots.
pub struct Workspace {
  _temp: TempDir,
  pub root: PathBuf,
  pub engine: PathBuf,
  pub project: PathBuf,
}

impl Workspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    let engine = root.join("Engine");
    let project = root.join("Game");
    fs::create_dir_all(&engine).unwrap();
    fs::create_dir_all(&project).unwrap();
    Self {
      _temp: temp,
      root,
      engine,
      project,
    }
  }

  /// Write `content` to `path` (relative to the workspace root), creating parents.
  pub fn write(&self, path: impl AsRef<Path>, content: &str) -> PathBuf {
    let path = self.root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
  }

  /// Rules for a runtime module at `Engine/Source/Runtime/<name>` with a `Public` include dir.
  pub fn engine_module(&self, name: &str, public_deps: &[&str]) -> ModuleRules {
    let dir = self.engine.join("Source/Runtime").join(name);
    fs::create_dir_all(dir.join("Public")).unwrap();
    let mut rules = ModuleRules::new(name, ModuleType::Runtime, dir);
    rules.public_include_paths = vec![PathBuf::from("Public")];
    rules.public_dependency_module_names = public_deps.iter().map(|d| d.to_string()).collect();
    rules
  }

  /// Rules for a game module at `Game/Source/<name>`.
  pub fn game_module(&self, name: &str, public_deps: &[&str]) -> ModuleRules {
    let dir = self.project.join("Source").join(name);
    fs::create_dir_all(&dir).unwrap();
    let mut rules = ModuleRules::new(name, ModuleType::Game, dir);
    rules.public_dependency_module_names = public_deps.iter().map(|d| d.to_string()).collect();
    rules
  }

  pub fn target(&self, launch_module: &str, link_type: LinkType) -> TargetRules {
    let mut target = TargetRules::new("Game", TargetPlatform::Linux, launch_module, &self.engine);
    target.project_dir = Some(self.project.clone());
    target.link_type = Some(link_type);
    target
  }

  /// Register `rules` and bind `target`.
  pub fn bind(&self, target: &TargetRules, rules: Vec<ModuleRules>) -> (ModuleRegistry, BinarySet) {
    let mut registry = ModuleRegistry::new(target.platform, &self.engine).with_rules(rules);
    let binaries = bind_target(&mut registry, target).unwrap();
    (registry, binaries)
  }
}

/// A [`ToolRunner`] that records invocations instead of spawning processes.
///
/// Every invocation succeeds unless its program's file name matches one
/// registered with [`RecordingRunner::fail_with`].
#[derive(Default)]
pub struct RecordingRunner {
  invocations: Mutex<Vec<ToolInvocation>>,
  failures: Vec<(String, i32)>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_with(mut self, program: &str, exit_code: i32) -> Self {
    self.failures.push((program.to_string(), exit_code));
    self
  }

  pub fn invocations(&self) -> Vec<ToolInvocation> {
    self.invocations.lock().unwrap().clone()
  }

  /// File names of the programs run so far.
  pub fn programs(&self) -> Vec<String> {
    self
      .invocations()
      .iter()
      .map(|i| {
        i.program
          .file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_default()
      })
      .collect()
  }
}

impl ToolRunner for RecordingRunner {
  async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, BuildError> {
    self.invocations.lock().unwrap().push(invocation.clone());
    let name = invocation
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let exit_code = self
      .failures
      .iter()
      .find(|(program, _)| *program == name)
      .map(|(_, code)| *code)
      .unwrap_or(0);
    Ok(ToolOutput {
      exit_code,
      ..Default::default()
    })
  }
}
