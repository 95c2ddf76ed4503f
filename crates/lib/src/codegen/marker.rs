//! The `Timestamp` marker left in each generated-code directory.
//!
//! Its write time records when the generator last succeeded for the module,
//! and its content lists the reflected headers it was run over, one per line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::TIMESTAMP_FILENAME;
use crate::error::BuildError;

pub fn marker_path(generated_dir: &Path) -> PathBuf {
  generated_dir.join(TIMESTAMP_FILENAME)
}

/// Header list recorded in the marker, or `None` if there is no marker.
pub fn read_marker(generated_dir: &Path) -> Result<Option<Vec<String>>, BuildError> {
  let path = marker_path(generated_dir);
  match fs::read_to_string(&path) {
    Ok(content) => Ok(Some(content.lines().map(str::to_string).collect())),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(BuildError::io(&path, e)),
  }
}

/// Record `headers` in the marker, touching its write time.
///
/// Written to a temporary file first and renamed into place.
pub fn write_marker<'a>(generated_dir: &Path, headers: impl IntoIterator<Item = &'a PathBuf>) -> Result<(), BuildError> {
  fs::create_dir_all(generated_dir).map_err(|e| BuildError::io(generated_dir, e))?;

  let mut content = String::new();
  for header in headers {
    content.push_str(&header.display().to_string());
    content.push('\n');
  }

  let path = marker_path(generated_dir);
  let temp_path = generated_dir.join(format!("{}.tmp", TIMESTAMP_FILENAME));
  fs::write(&temp_path, content).map_err(|e| BuildError::io(&temp_path, e))?;
  fs::rename(&temp_path, &path).map_err(|e| BuildError::io(&path, e))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn missing_marker_reads_as_none() {
    let temp = TempDir::new().unwrap();
    assert_eq!(read_marker(temp.path()).unwrap(), None);
  }

  #[test]
  fn marker_round_trips_header_list() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Inc/Core");
    let headers = vec![PathBuf::from("/e/Core/Public/A.h"), PathBuf::from("/e/Core/Private/B.h")];

    write_marker(&dir, &headers).unwrap();

    assert_eq!(
      read_marker(&dir).unwrap(),
      Some(vec!["/e/Core/Public/A.h".to_string(), "/e/Core/Private/B.h".to_string()])
    );
    assert!(!dir.join("Timestamp.tmp").exists());
  }
}
