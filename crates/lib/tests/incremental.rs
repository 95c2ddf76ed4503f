//! End-to-end builds through the public API with a runner that fakes tool outputs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use modforge_lib::codegen::CodegenOutcome;
use modforge_lib::error::BuildError;
use modforge_lib::execute::{ToolInvocation, ToolOutput, ToolRunner};
use modforge_lib::target::{BuildOptions, TargetBuild, TargetDescription};

/// Writes the file named after `-o` (or after `rcs` for the archiver) instead of running anything.
#[derive(Default)]
struct TouchRunner {
  runs: Mutex<Vec<String>>,
}

impl TouchRunner {
  fn runs(&self) -> Vec<String> {
    self.runs.lock().unwrap().clone()
  }
}

impl ToolRunner for TouchRunner {
  async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, BuildError> {
    let args = &invocation.args;
    if let Some(output) = args
      .iter()
      .position(|a| a == "-o" || a == "rcs")
      .and_then(|i| args.get(i + 1))
    {
      let output = Path::new(output);
      if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).unwrap();
      }
      fs::write(output, "").unwrap();
    }
    self.runs.lock().unwrap().push(invocation.command_line());
    Ok(ToolOutput::default())
  }
}

const DESCRIPTION: &str = r#"{
  "target": {
    "name": "Game",
    "platform": "Linux",
    "launch_module": "Shooter",
    "link_type": "Modular",
    "engine_dir": "Engine",
    "project_dir": "Game"
  },
  "modules": [
    {
      "name": "Core",
      "type": "Runtime",
      "directory": "Engine/Source/Runtime/Core",
      "public_include_paths": ["Public"]
    },
    {
      "name": "Shooter",
      "type": "Game",
      "directory": "Game/Source/Shooter",
      "public_dependency_module_names": ["Core"]
    }
  ],
  "config": { "baseline_module": null }
}"#;

fn write(root: &Path, path: &str, content: &str) -> PathBuf {
  let path = root.join(path);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(&path, content).unwrap();
  path
}

fn fixture() -> TempDir {
  let temp = TempDir::new().unwrap();
  let root = temp.path();
  write(root, "target.json", DESCRIPTION);
  write(root, "Engine/Source/Runtime/Core/Public/CoreMinimal.h", "#pragma once\n");
  write(
    root,
    "Engine/Source/Runtime/Core/Private/Core.cpp",
    "#include \"CoreMinimal.h\"\n",
  );
  write(root, "Game/Source/Shooter/Shooter.h", "#include \"CoreMinimal.h\"\n");
  write(root, "Game/Source/Shooter/Shooter.cpp", "#include \"Shooter.h\"\n");
  temp
}

fn prepare(temp: &TempDir) -> TargetBuild {
  let description = TargetDescription::load(&temp.path().join("target.json")).unwrap();
  TargetBuild::prepare(description).unwrap()
}

#[tokio::test]
async fn second_build_only_reruns_what_changed() {
  let temp = fixture();
  let runner = TouchRunner::default();

  let first = prepare(&temp).build(&BuildOptions::default(), &runner).await.unwrap();
  assert_eq!(first.codegen, Some(CodegenOutcome::NotRequired));
  assert!(first.skipped.is_empty());
  assert!(first.binaries.iter().all(|b| b.is_file()));
  let first_runs = runner.runs().len();
  assert_eq!(first_runs, first.executed.len());

  let untouched = prepare(&temp).build(&BuildOptions::default(), &runner).await.unwrap();
  assert!(untouched.executed.is_empty());
  assert_eq!(untouched.skipped.len(), first.executed.len());
  assert_eq!(runner.runs().len(), first_runs);

  let source = temp.path().join("Game/Source/Shooter/Shooter.cpp");
  fs::File::options()
    .write(true)
    .open(&source)
    .unwrap()
    .set_modified(SystemTime::now() + Duration::from_secs(60))
    .unwrap();

  let edited = prepare(&temp).build(&BuildOptions::default(), &runner).await.unwrap();
  assert!(edited.executed.contains(&"Compile Shooter.cpp".to_string()));
  assert!(edited.executed.contains(&"Link Game".to_string()));
  assert!(edited.skipped.contains(&"Compile Core.cpp".to_string()));
  assert!(edited.skipped.contains(&"Link Game-Core.so".to_string()));
}

#[tokio::test]
async fn dry_run_reports_plan_without_running_tools() {
  let temp = fixture();
  let runner = TouchRunner::default();
  let options = BuildOptions {
    dry_run: true,
    ..Default::default()
  };

  let report = prepare(&temp).build(&options, &runner).await.unwrap();
  assert!(report.codegen.is_none());
  assert!(runner.runs().is_empty());
  assert!(report.planned.contains(&"Compile Core.cpp".to_string()));
  assert!(report.binaries.iter().all(|b| !b.exists()));
}
