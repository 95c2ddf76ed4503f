//! Include directive scanning.
//!
//! Only `#include` lines are read; no preprocessing happens, so conditionally
//! compiled includes are always followed. Results are cached for the duration
//! of one build.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::environment::CompileEnvironment;
use crate::error::BuildError;
use crate::util::fs::read_source;

static INCLUDE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*#[ \t]*include[ \t]*[<"]([^>"\r\n]+)[>"]"#).expect("include pattern is valid"));

/// Caches direct and transitive includes of source and header files.
#[derive(Debug, Default)]
pub struct IncludeScanner {
  direct: HashMap<PathBuf, Vec<String>>,
  transitive: HashMap<PathBuf, Vec<PathBuf>>,
}

impl IncludeScanner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Include texts of `file` in order of appearance.
  pub fn direct_includes(&mut self, file: &Path) -> Result<&[String], BuildError> {
    if !self.direct.contains_key(file) {
      let content = read_source(file)?;
      let includes: Vec<String> = INCLUDE_RE
        .captures_iter(&content)
        .map(|c| c[1].trim().to_string())
        .collect();
      trace!(file = %file.display(), count = includes.len(), "scanned includes");
      self.direct.insert(file.to_path_buf(), includes);
    }
    Ok(self.direct.get(file).map(Vec::as_slice).unwrap_or(&[]))
  }

  /// The first include of `file` as written in the source.
  pub fn first_include(&mut self, file: &Path) -> Result<Option<String>, BuildError> {
    Ok(self.direct_includes(file)?.first().cloned())
  }

  /// Resolve an include text to an absolute path.
  ///
  /// The including file's directory is searched first, then the
  /// environment's include paths, then its system include paths.
  pub fn resolve(&self, from: &Path, include: &str, env: &CompileEnvironment) -> Option<PathBuf> {
    let local = from.parent().map(Path::to_path_buf);
    local
      .iter()
      .chain(env.include_paths.iter())
      .chain(env.system_include_paths.iter())
      .map(|dir| dir.join(include))
      .find(|candidate| candidate.is_file())
      .map(|found| dunce::canonicalize(&found).unwrap_or(found))
  }

  /// Every file `file` includes, directly or not, that resolves on disk.
  ///
  /// Unresolvable includes such as system headers are skipped.
  pub fn include_dependencies(&mut self, file: &Path, env: &CompileEnvironment) -> Result<Vec<PathBuf>, BuildError> {
    if let Some(cached) = self.transitive.get(file) {
      return Ok(cached.clone());
    }

    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack = vec![file.to_path_buf()];
    while let Some(current) = stack.pop() {
      let includes = self.direct_includes(&current)?.to_vec();
      for include in includes.iter().rev() {
        if let Some(resolved) = self.resolve(&current, include, env) {
          if seen.insert(resolved.clone()) {
            ordered.push(resolved.clone());
            stack.push(resolved);
          }
        }
      }
    }

    self.transitive.insert(file.to_path_buf(), ordered.clone());
    Ok(ordered)
  }
}
