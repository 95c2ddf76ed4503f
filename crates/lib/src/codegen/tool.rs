use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::BuildConfiguration;
use crate::consts::{API_VERSION_MARKER, INTERMEDIATE_DIR};
use crate::error::BuildError;
use crate::platform::TargetPlatform;
use crate::target::TargetRules;
use crate::util::fs::{find_files, modified};

/// A point in time that can also be older or newer than any real file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stamp {
  Min,
  At(SystemTime),
  /// Newer than everything; forces regeneration.
  Max,
}

/// Reads the API version a generator library was built against.
pub trait VersionProbe {
  /// `None` when the binary carries no version.
  fn api_version(&self, binary: &Path) -> Result<Option<u32>, BuildError>;
}

/// Looks for `MODFORGE_API_VERSION=<n>` embedded in the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedVersionProbe;

impl VersionProbe for EmbeddedVersionProbe {
  fn api_version(&self, binary: &Path) -> Result<Option<u32>, BuildError> {
    let bytes = fs::read(binary).map_err(|e| BuildError::io(binary, e))?;
    let Some(start) = bytes
      .windows(API_VERSION_MARKER.len())
      .position(|w| w == API_VERSION_MARKER)
    else {
      return Ok(None);
    };
    let digits: String = bytes[start + API_VERSION_MARKER.len()..]
      .iter()
      .take_while(|b| b.is_ascii_digit())
      .map(|b| *b as char)
      .collect();
    Ok(digits.parse().ok())
  }
}

/// The header generator executable and the libraries it loads.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderTool {
  pub executable: PathBuf,
  /// `<name>-*` libraries next to the executable and under the plugin tree.
  pub libraries: Vec<PathBuf>,
}

impl HeaderTool {
  /// Find the generator for the build host.
  ///
  /// Libraries are only collected when the executable exists.
  pub fn locate(target: &TargetRules, config: &BuildConfiguration) -> Result<Self, BuildError> {
    let host = TargetPlatform::host().unwrap_or(target.platform);
    let tool_dir = config
      .header_tool_dir
      .clone()
      .unwrap_or_else(|| target.engine_dir.join("Binaries").join(host.as_str()));
    let executable = tool_dir.join(format!("{}{}", config.header_tool_name, host.executable_extension()));

    let mut libraries = Vec::new();
    if executable.is_file() {
      let prefix = format!("{}-", config.header_tool_name);
      let extension = host.dynamic_library_extension().trim_start_matches('.');
      let is_library = |path: &Path| {
        path
          .file_name()
          .and_then(|n| n.to_str())
          .is_some_and(|n| n.starts_with(&prefix))
      };

      let entries = fs::read_dir(&tool_dir).map_err(|e| BuildError::io(&tool_dir, e))?;
      let mut siblings = Vec::new();
      for entry in entries {
        let path = entry.map_err(|e| BuildError::io(&tool_dir, e))?.path();
        let matches_extension = path
          .extension()
          .and_then(|e| e.to_str())
          .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if path.is_file() && matches_extension && is_library(&path) {
          siblings.push(path);
        }
      }
      siblings.sort();
      libraries.extend(siblings);

      let plugins_dir = config
        .plugins_dir
        .clone()
        .unwrap_or_else(|| target.engine_dir.join("Plugins"));
      for plugin in find_files(&plugins_dir, &[extension], &[INTERMEDIATE_DIR])? {
        if is_library(&plugin) && plugin.to_string_lossy().contains(host.as_str()) {
          libraries.push(plugin);
        }
      }
    }

    Ok(Self { executable, libraries })
  }

  pub fn exists(&self) -> bool {
    self.executable.is_file()
  }

  /// Latest write time across the generator binaries.
  ///
  /// Libraries whose API version differs from the lowest version found are
  /// deleted, and the result becomes [`Stamp::Max`]. A missing executable is
  /// also [`Stamp::Max`].
  pub fn stamp(&self, probe: &impl VersionProbe) -> Result<Stamp, BuildError> {
    if !self.exists() {
      debug!(path = %self.executable.display(), "header tool not found");
      return Ok(Stamp::Max);
    }

    let mut latest = modified(&self.executable);
    let mut versions = Vec::with_capacity(self.libraries.len());
    for library in &self.libraries {
      let Some(time) = modified(library) else {
        continue;
      };
      latest = latest.max(Some(time));
      if let Some(version) = probe.api_version(library)? {
        versions.push((library, version));
      }
    }

    let mut mismatched = false;
    if let Some(min_version) = versions.iter().map(|(_, v)| *v).min() {
      for (library, version) in versions.iter().filter(|(_, v)| *v != min_version) {
        fs::remove_file(library).map_err(|e| BuildError::io(library, e))?;
        warn!(
          binary = %library.display(),
          version,
          expected = min_version,
          "detected mismatched version in header tool binary"
        );
        mismatched = true;
      }
    }

    if mismatched {
      return Ok(Stamp::Max);
    }
    Ok(latest.map(Stamp::At).unwrap_or(Stamp::Max))
  }
}
