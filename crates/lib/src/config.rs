//! Build configuration.
//!
//! [`BuildConfiguration`] carries the global switches that steer precompiled
//! header selection, code generation and tool discovery. It deserializes from
//! the `config` object of a target description with every field optional, and
//! a handful of switches can be overridden from the environment:
//!
//! | Variable                             | Field                     |
//! |--------------------------------------|---------------------------|
//! | `MODFORGE_FORCE_HEADER_GENERATION`   | `force_header_generation` |
//! | `MODFORGE_USE_PCH`                   | `use_pch`                 |
//! | `MODFORGE_USE_SHARED_PCHS`           | `use_shared_pchs`         |
//! | `MODFORGE_MIN_FILES_USING_PCH`       | `min_files_using_pch`     |
//! | `MODFORGE_INSTALLED_ENGINE`          | `installed_engine`        |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{DEFAULT_BASELINE_MODULE, DEFAULT_HEADER_TOOL, ENV_PREFIX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfiguration {
  /// Use precompiled headers at all.
  pub use_pch: bool,

  /// Allow modules to share precompiled headers through shared PCH tiers.
  pub use_shared_pchs: bool,

  /// Minimum number of source files before a module gets its own precompiled header.
  pub min_files_using_pch: usize,

  /// Always give game modules a precompiled header, however few files they have.
  pub force_pch_for_game_modules: bool,

  /// Run the header generator even when nothing is stale.
  pub force_header_generation: bool,

  /// Pass `-FailIfGeneratedCodeChanges` to the header generator.
  pub fail_if_generated_code_changes: bool,

  /// Building against a fixed, prebuilt engine distribution.
  ///
  /// Engine modules are neither checked for staleness nor have their markers rewritten.
  pub installed_engine: bool,

  /// Module whose generated code timestamp gates every other reflected module.
  pub baseline_module: Option<String>,

  /// Name of the header generator executable, without extension.
  pub header_tool_name: String,

  /// Directory containing the header generator. Defaults to `<engine>/Binaries/<host>`.
  pub header_tool_dir: Option<PathBuf>,

  /// Root of the generator plugin tree. Defaults to `<engine>/Plugins`.
  pub plugins_dir: Option<PathBuf>,

  /// C++ compiler driver used for compile, precompiled header and link actions.
  pub compiler: PathBuf,

  /// Archiver used for static libraries.
  pub archiver: PathBuf,
}

impl Default for BuildConfiguration {
  fn default() -> Self {
    Self {
      use_pch: true,
      use_shared_pchs: true,
      min_files_using_pch: 6,
      force_pch_for_game_modules: true,
      force_header_generation: false,
      fail_if_generated_code_changes: false,
      installed_engine: false,
      baseline_module: Some(DEFAULT_BASELINE_MODULE.to_string()),
      header_tool_name: DEFAULT_HEADER_TOOL.to_string(),
      header_tool_dir: None,
      plugins_dir: None,
      compiler: PathBuf::from("clang++"),
      archiver: PathBuf::from("ar"),
    }
  }
}

impl BuildConfiguration {
  /// Apply `MODFORGE_*` environment overrides on top of this configuration.
  pub fn apply_env(&mut self) {
    if let Some(value) = env_bool("FORCE_HEADER_GENERATION") {
      self.force_header_generation = value;
    }
    if let Some(value) = env_bool("USE_PCH") {
      self.use_pch = value;
    }
    if let Some(value) = env_bool("USE_SHARED_PCHS") {
      self.use_shared_pchs = value;
    }
    if let Some(value) = env_bool("INSTALLED_ENGINE") {
      self.installed_engine = value;
    }
    if let Some(raw) = env_var("MIN_FILES_USING_PCH") {
      match raw.trim().parse::<usize>() {
        Ok(value) => self.min_files_using_pch = value,
        Err(_) => warn!(value = %raw, "ignoring invalid {}MIN_FILES_USING_PCH", ENV_PREFIX),
      }
    }
  }

  /// Configuration with environment overrides applied.
  pub fn with_env(mut self) -> Self {
    self.apply_env();
    self
  }
}

fn env_var(suffix: &str) -> Option<String> {
  let name = format!("{}{}", ENV_PREFIX, suffix);
  let value = std::env::var(&name).ok()?;
  debug!(var = %name, value = %value, "configuration override from environment");
  Some(value)
}

fn env_bool(suffix: &str) -> Option<bool> {
  let raw = env_var(suffix)?;
  match raw.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => {
      warn!(value = %raw, "ignoring invalid boolean {}{}", ENV_PREFIX, suffix);
      None
    }
  }
}
