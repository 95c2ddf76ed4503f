//! Reflection code generation.
//!
//! Modules that declare reflected types get their glue code from an external
//! header generator. The generator processes every reflected module of a
//! target in one invocation, so the gate decides once per build whether it
//! needs to run at all:
//!
//! - the generator binaries are newer than a module's marker, or were healed
//!   after a version mismatch;
//! - the baseline module's generated code is newer than a module's marker;
//! - the set of reflected headers recorded in a marker differs from the
//!   current set, or one of them is newer than the marker.
//!
//! After a successful run (or when everything is current) each module's
//! `Timestamp` marker is rewritten with its header list.

mod gate;
mod manifest;
mod marker;
mod reflect;
mod tool;

use std::fmt;

use serde::Serialize;

pub use gate::{CodegenGate, CodegenOutcome, execute_header_tool_if_necessary};
pub use manifest::{Manifest, ManifestModule};
pub use marker::{marker_path, read_marker, write_marker};
pub use reflect::{ReflectedModule, contains_reflected_types, find_reflected_headers, reflected_module};
pub use tool::{EmbeddedVersionProbe, HeaderTool, Stamp, VersionProbe};

/// Result codes shared with the header generator and reported as the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompilationResult {
  /// Everything was already up to date.
  UpToDate,
  Canceled,
  Succeeded,
  /// Generated code changed while changes were not allowed.
  FailedDueToHeaderChange,
  OtherCompilationError,
  /// The process crashed or asserted.
  CrashOrAssert,
  Unsupported,
  Unknown,
}

impl CompilationResult {
  pub fn code(&self) -> i32 {
    match self {
      CompilationResult::UpToDate => -2,
      CompilationResult::Canceled => -1,
      CompilationResult::Succeeded => 0,
      CompilationResult::FailedDueToHeaderChange => 1,
      CompilationResult::OtherCompilationError => 2,
      CompilationResult::CrashOrAssert => 3,
      CompilationResult::Unsupported => 4,
      CompilationResult::Unknown => 5,
    }
  }

  /// Map a process exit code. Codes outside the known range are `Unknown`.
  pub fn from_code(code: i32) -> Self {
    match code {
      -2 => CompilationResult::UpToDate,
      -1 => CompilationResult::Canceled,
      0 => CompilationResult::Succeeded,
      1 => CompilationResult::FailedDueToHeaderChange,
      2 => CompilationResult::OtherCompilationError,
      3 => CompilationResult::CrashOrAssert,
      4 => CompilationResult::Unsupported,
      _ => CompilationResult::Unknown,
    }
  }

  pub fn succeeded(&self) -> bool {
    matches!(self, CompilationResult::Succeeded | CompilationResult::UpToDate)
  }
}

impl fmt::Display for CompilationResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}
