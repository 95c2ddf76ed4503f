//! CLI smoke tests for modforge.
//!
//! These tests run every subcommand against a small on-disk engine and game
//! tree and check exit codes and the shape of the output.

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the modforge binary.
fn modforge_cmd() -> Command {
  cargo_bin_cmd!("modforge")
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
  "config": {
    "baseline_module": null
  }
}"#;

fn write(root: &Path, path: &str, content: &str) {
  let path = root.join(path);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

/// A temp directory holding `target.json` and the sources it describes.
fn fixture() -> TempDir {
  let temp = TempDir::new().unwrap();
  let root = temp.path();
  write(root, "target.json", DESCRIPTION);
  write(root, "Engine/Source/Runtime/Core/Public/CoreMinimal.h", "#pragma once\n");
  write(
    root,
    "Engine/Source/Runtime/Core/Private/Core.cpp",
    "#include \"CoreMinimal.h\"\nint core() { return 0; }\n",
  );
  write(root, "Game/Source/Shooter/Shooter.h", "#include \"CoreMinimal.h\"\n");
  write(root, "Game/Source/Shooter/Shooter.cpp", "#include \"Shooter.h\"\n");
  temp
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
  let output = cmd.output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  modforge_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  modforge_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("modforge"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "plan", "deps", "env"] {
    modforge_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Plan
// =============================================================================

#[test]
fn plan_lists_binaries_and_actions() {
  let temp = fixture();
  modforge_cmd()
    .arg("plan")
    .arg(temp.path().join("target.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Game-Core.so"))
    .stdout(predicate::str::contains("Shooter"))
    .stdout(predicate::str::contains("Actions"));
}

#[test]
fn plan_json_is_machine_readable() {
  let temp = fixture();
  let plan = json_stdout(
    modforge_cmd()
      .args(["plan", "--output", "json"])
      .arg(temp.path().join("target.json")),
  );

  assert_eq!(plan["target"], "Game");
  assert_eq!(plan["binaries"].as_array().unwrap().len(), 2);
  assert_eq!(plan["binaries"][0]["modules"][0], "Shooter");
}

#[test]
fn environment_override_disables_precompiled_headers() {
  let temp = fixture();
  let plan = json_stdout(
    modforge_cmd()
      .env("MODFORGE_USE_PCH", "0")
      .args(["plan", "--output", "json"])
      .arg(temp.path().join("target.json")),
  );

  for module in plan["modules"].as_array().unwrap() {
    assert_eq!(module["pch"]["decision"], "None");
  }
}

#[test]
fn missing_description_fails() {
  let temp = TempDir::new().unwrap();
  modforge_cmd()
    .arg("plan")
    .arg(temp.path().join("nope.json"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load target description"));
}

#[test]
fn malformed_description_fails() {
  let temp = TempDir::new().unwrap();
  write(temp.path(), "target.json", "{ \"target\": 3 }");
  modforge_cmd()
    .arg("plan")
    .arg(temp.path().join("target.json"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid target description"));
}

// =============================================================================
// Deps & Env
// =============================================================================

#[test]
fn deps_prints_closure() {
  let temp = fixture();
  modforge_cmd()
    .arg("deps")
    .arg(temp.path().join("target.json"))
    .arg("Shooter")
    .assert()
    .success()
    .stdout(predicate::str::contains("Core"));
}

#[test]
fn deps_of_unknown_module_fails_with_build_exit_code() {
  let temp = fixture();
  modforge_cmd()
    .arg("deps")
    .arg(temp.path().join("target.json"))
    .arg("Missing")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("unable to find module 'Missing'"));
}

#[test]
fn env_json_has_compile_and_link_sections() {
  let temp = fixture();
  let env = json_stdout(
    modforge_cmd()
      .args(["env", "--output", "json"])
      .arg(temp.path().join("target.json"))
      .arg("Shooter"),
  );

  let definitions = env["compile"]["definitions"].as_array().unwrap();
  assert!(definitions.iter().any(|d| d.as_str().unwrap().starts_with("CORE_API=")));
  assert!(env["link"].is_object());
  assert_eq!(env["link"]["binary_dependencies"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Build
// =============================================================================

#[test]
fn dry_run_build_lists_planned_actions() {
  let temp = fixture();
  modforge_cmd()
    .args(["build", "--dry-run"])
    .arg(temp.path().join("target.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("Link Game"));

  assert!(!temp.path().join("Game/Intermediate").join("Build").exists());
}
