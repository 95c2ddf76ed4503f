use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platforms a target can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetPlatform {
  Win64,
  Linux,
  Mac,
  Android,
  #[serde(rename = "IOS")]
  Ios,
}

#[derive(Debug, Error)]
#[error("unknown target platform: {0}")]
pub struct UnknownPlatform(pub String);

impl TargetPlatform {
  pub const ALL: [TargetPlatform; 5] = [Self::Win64, Self::Linux, Self::Mac, Self::Android, Self::Ios];

  /// The platform the build itself runs on.
  ///
  /// Returns `None` on hosts that cannot run the build tools.
  pub fn host() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Mac),
      "windows" => Some(Self::Win64),
      _ => None,
    }
  }

  /// Name used in directory layouts and binary suffixes.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Win64 => "Win64",
      Self::Linux => "Linux",
      Self::Mac => "Mac",
      Self::Android => "Android",
      Self::Ios => "IOS",
    }
  }

  pub fn executable_extension(&self) -> &'static str {
    match self {
      Self::Win64 => ".exe",
      Self::Ios => ".app",
      Self::Linux | Self::Mac | Self::Android => "",
    }
  }

  pub fn dynamic_library_extension(&self) -> &'static str {
    match self {
      Self::Win64 => ".dll",
      Self::Mac | Self::Ios => ".dylib",
      Self::Linux | Self::Android => ".so",
    }
  }

  pub fn static_library_extension(&self) -> &'static str {
    match self {
      Self::Win64 => ".lib",
      _ => ".a",
    }
  }

  pub fn object_extension(&self) -> &'static str {
    match self {
      Self::Win64 => ".obj",
      _ => ".o",
    }
  }

  /// Import libraries only exist where dynamic libraries export through a stub.
  pub fn import_library_extension(&self) -> Option<&'static str> {
    match self {
      Self::Win64 => Some(".lib"),
      _ => None,
    }
  }

  /// Whether frameworks are a link concept on this platform.
  pub fn supports_frameworks(&self) -> bool {
    matches!(self, Self::Mac | Self::Ios)
  }

  /// Definition value for exported symbols.
  pub fn dll_export(&self) -> &'static str {
    match self {
      Self::Win64 => "__declspec(dllexport)",
      _ => "__attribute__((visibility(\"default\")))",
    }
  }

  /// Definition value for imported symbols.
  pub fn dll_import(&self) -> &'static str {
    match self {
      Self::Win64 => "__declspec(dllimport)",
      _ => "",
    }
  }
}

impl fmt::Display for TargetPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for TargetPlatform {
  type Err = UnknownPlatform;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|p| p.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| UnknownPlatform(s.to_string()))
  }
}
