//! Filesystem helpers shared by source discovery and the code generation gate.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::BuildError;

/// Recursively collect files under `root` whose extension is one of `extensions`.
///
/// Results are sorted by path. A missing `root` yields no files. Directories
/// named in `skip_dirs` are not descended into.
pub fn find_files(root: &Path, extensions: &[&str], skip_dirs: &[&str]) -> Result<Vec<PathBuf>, BuildError> {
  if !root.is_dir() {
    return Ok(Vec::new());
  }

  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    !e.file_type().is_dir()
      || e
        .file_name()
        .to_str()
        .map(|name| !skip_dirs.contains(&name))
        .unwrap_or(true)
  });

  let mut files = Vec::new();
  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
      BuildError::io(path, io::Error::other(e.to_string()))
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let matches = entry
      .path()
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)));
    if matches {
      files.push(entry.into_path());
    }
  }
  files.sort();
  Ok(files)
}

/// Last write time of `path`, or `None` if it does not exist.
pub fn modified(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Text of a source or header file. Bytes that are not UTF-8 are replaced.
pub fn read_source(path: &Path) -> Result<String, BuildError> {
  let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Whether `path` lies under `dir`, comparing whole components and ignoring ASCII case.
pub fn is_under_ignore_case(path: &Path, dir: &Path) -> bool {
  let mut path = path.components();
  dir.components().all(|wanted| {
    path
      .next()
      .is_some_and(|c| c.as_os_str().eq_ignore_ascii_case(wanted.as_os_str()))
  })
}
