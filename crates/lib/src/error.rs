//! The build error type.
//!
//! Every fatal condition raised by the core is a [`BuildError`]. Errors carry a
//! formatted message and, where one is known, the name of the module whose
//! processing failed (see [`BuildError::module`]). Staleness and generator
//! version drift are not errors; they are handled as ordinary cache misses.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codegen::CompilationResult;

/// Fatal errors raised while resolving, binding, planning or executing a target.
#[derive(Debug, Error)]
pub enum BuildError {
  /// A module name could not be found among the known module rules.
  #[error("unable to find module '{name}'{}", referenced_by_suffix(.referenced_by))]
  UnknownModule {
    name: String,
    referenced_by: Option<String>,
  },

  /// A module was expected to be bound to a binary but was not.
  #[error("module '{0}' should already have been bound to a binary")]
  ModuleNotBound(String),

  /// A module lists source files that do not exist.
  #[error(
    "module '{module}' references non-existent files:\n{}",
    join_paths(.files)
  )]
  MissingSourceFiles { module: String, files: Vec<PathBuf> },

  /// A source file has no include directive to derive a precompiled header from.
  #[error("no precompiled header usage for file '{}' in module '{module}': missing #include?", .file.display())]
  NoFirstInclude { module: String, file: PathBuf },

  /// The first include of a source file could not be located on disk.
  #[error(
    "the first include statement in source file '{}' is trying to include '{include}' as the precompiled header for module '{module}', but that file could not be located in any of the module's include search paths",
    .file.display()
  )]
  UnresolvedFirstInclude {
    module: String,
    file: PathBuf,
    include: String,
  },

  /// Source files of one module do not agree on their first include.
  #[error(
    "all source files in module '{module}' must include the same precompiled header first. Currently '{}' is included by most of the source files, such as '{}'. The following source files are not including it as their first include:\n{}",
    .most_used.display(),
    .most_used_by.display(),
    format_offenders(.offenders)
  )]
  ConflictingPch {
    module: String,
    most_used: PathBuf,
    most_used_by: PathBuf,
    offenders: Vec<(PathBuf, PathBuf)>,
  },

  /// The configured baseline module is not among the reflected modules.
  #[error("could not find baseline module '{0}' in the list of reflected modules")]
  BaselineModuleMissing(String),

  /// The header generator executable does not exist.
  #[error("unable to generate headers because the header tool binary was not found ({})", .0.display())]
  GeneratorNotFound(PathBuf),

  /// The header generator returned a failure code.
  #[error("failed to generate code for {target} - error code: {} ({})", .result, .result.code())]
  ToolFailed {
    target: String,
    result: CompilationResult,
  },

  /// A compiler, archiver or linker invocation failed.
  #[error("{action} failed with exit code {exit_code}")]
  ActionFailed { action: String, exit_code: i32 },

  /// The action graph contains a cycle.
  #[error("dependency cycle detected between build actions")]
  ActionCycle,

  /// Failure raised while binding a module's dependencies, attributed to that module.
  #[error("error processing module '{module}': {source}")]
  ModuleProcessing {
    module: String,
    #[source]
    source: Box<BuildError>,
  },

  /// The target description could not be loaded.
  #[error("invalid target description {}: {message}", .path.display())]
  InvalidDescription { path: PathBuf, message: String },

  /// Filesystem failure.
  #[error("io error at {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Serialization failure.
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl BuildError {
  /// Build an [`BuildError::Io`] for the given path.
  pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
    BuildError::Io {
      path: path.as_ref().to_path_buf(),
      source,
    }
  }

  /// Wrap an error raised while processing `module`.
  pub fn processing(module: impl Into<String>, source: BuildError) -> Self {
    BuildError::ModuleProcessing {
      module: module.into(),
      source: Box::new(source),
    }
  }

  /// Name of the module this error is attributed to, if any.
  pub fn module(&self) -> Option<&str> {
    match self {
      BuildError::UnknownModule { referenced_by, .. } => referenced_by.as_deref(),
      BuildError::ModuleNotBound(module)
      | BuildError::MissingSourceFiles { module, .. }
      | BuildError::NoFirstInclude { module, .. }
      | BuildError::UnresolvedFirstInclude { module, .. }
      | BuildError::ConflictingPch { module, .. }
      | BuildError::ModuleProcessing { module, .. } => Some(module),
      BuildError::BaselineModuleMissing(module) => Some(module),
      _ => None,
    }
  }

  /// Exit code to report for this error.
  ///
  /// Generator failures surface the generator's own result code.
  pub fn exit_code(&self) -> i32 {
    match self {
      BuildError::ToolFailed { result, .. } => result.code(),
      BuildError::ModuleProcessing { source, .. } => source.exit_code(),
      _ => CompilationResult::OtherCompilationError.code(),
    }
  }
}

fn referenced_by_suffix(referenced_by: &Option<String>) -> String {
  match referenced_by {
    Some(module) => format!(" (referenced by '{}')", module),
    None => String::new(),
  }
}

fn format_offenders(offenders: &[(PathBuf, PathBuf)]) -> String {
  offenders
    .iter()
    .map(|(file, header)| format!("{} (including {})", file.display(), header.display()))
    .collect::<Vec<_>>()
    .join("\n")
}

fn join_paths(paths: &[PathBuf]) -> String {
  paths
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn processing_error_names_module_and_cause() {
    let inner = BuildError::UnknownModule {
      name: "Missing".to_string(),
      referenced_by: Some("Engine".to_string()),
    };
    let err = BuildError::processing("Engine", inner);

    assert_eq!(err.module(), Some("Engine"));
    let msg = err.to_string();
    assert!(msg.contains("error processing module 'Engine'"));
    assert!(msg.contains("unable to find module 'Missing'"));
  }

  #[test]
  fn conflicting_pch_lists_every_offender() {
    let err = BuildError::ConflictingPch {
      module: "Core".to_string(),
      most_used: PathBuf::from("/src/CorePrivate.h"),
      most_used_by: PathBuf::from("/src/core.cpp"),
      offenders: vec![
        (PathBuf::from("/src/a.cpp"), PathBuf::from("/src/Other.h")),
        (PathBuf::from("/src/b.cpp"), PathBuf::from("/src/Third.h")),
      ],
    };

    let msg = err.to_string();
    assert!(msg.contains("/src/a.cpp (including /src/Other.h)"));
    assert!(msg.contains("/src/b.cpp (including /src/Third.h)"));
    assert!(msg.contains("/src/CorePrivate.h"));
    assert!(msg.contains("/src/core.cpp"));
  }

  #[test]
  fn tool_failure_surfaces_generator_code() {
    let err = BuildError::ToolFailed {
      target: "Game".to_string(),
      result: CompilationResult::CrashOrAssert,
    };
    assert_eq!(err.exit_code(), 3);

    let wrapped = BuildError::processing("Game", err);
    assert_eq!(wrapped.exit_code(), 3);
  }
}
