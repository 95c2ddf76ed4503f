use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::consts::{GENERATED_CPP_SUFFIX, INTERMEDIATE_DIR};
use crate::error::BuildError;
use crate::module::{Module, ModuleType};
use crate::target::TargetRules;
use crate::util::fs::{find_files, read_source};

static REFLECTION_MACRO: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^\s*U(CLASS|STRUCT|ENUM|INTERFACE|DELEGATE)\b").expect("reflection pattern is valid"));

/// A module whose headers declare reflected types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectedModule {
  pub name: String,
  pub module_type: ModuleType,
  pub directory: PathBuf,
  /// Directory the generator writes this module's code to.
  pub generated_dir: PathBuf,
  /// Headers under `Classes/`.
  pub classes_headers: Vec<PathBuf>,
  /// Headers under `Public/`.
  pub public_headers: Vec<PathBuf>,
  pub private_headers: Vec<PathBuf>,
  /// The module's own precompiled header, injected into generated sources.
  pub pch: Option<PathBuf>,
}

impl ReflectedModule {
  /// Every reflected header, classes first, then public, then private.
  pub fn headers(&self) -> impl Iterator<Item = &PathBuf> {
    self
      .classes_headers
      .iter()
      .chain(&self.public_headers)
      .chain(&self.private_headers)
  }

  /// Extensionless path of the generated files.
  pub fn generated_cpp_base(&self) -> PathBuf {
    self.generated_dir.join(format!("{}.generated", self.name))
  }

  /// The generated translation unit compiled into the module.
  pub fn generated_cpp(&self) -> PathBuf {
    self.generated_dir.join(format!("{}{}", self.name, GENERATED_CPP_SUFFIX))
  }
}

/// Whether `source` declares a reflected type.
pub fn contains_reflected_types(source: &str) -> bool {
  REFLECTION_MACRO.is_match(source)
}

/// Headers under `directory` that declare reflected types, sorted by path.
pub fn find_reflected_headers(directory: &Path) -> Result<Vec<PathBuf>, BuildError> {
  let mut headers = Vec::new();
  for header in find_files(directory, &["h"], &[INTERMEDIATE_DIR])? {
    let source = read_source(&header)?;
    if contains_reflected_types(&source) {
      headers.push(header);
    }
  }
  Ok(headers)
}

/// Describe `module` for the generator, or `None` if it has nothing to reflect.
pub fn reflected_module(
  module: &Module,
  target: &TargetRules,
  pch: Option<&Path>,
) -> Result<Option<ReflectedModule>, BuildError> {
  if module.module_type.is_external() {
    return Ok(None);
  }
  let headers = find_reflected_headers(&module.directory)?;
  if headers.is_empty() {
    return Ok(None);
  }

  let classes_dir = module.directory.join("Classes");
  let public_dir = module.directory.join("Public");
  let mut reflected = ReflectedModule {
    name: module.name.clone(),
    module_type: module.module_type,
    directory: module.directory.clone(),
    generated_dir: target.generated_code_dir(&module.directory, &module.name),
    classes_headers: Vec::new(),
    public_headers: Vec::new(),
    private_headers: Vec::new(),
    pch: pch.map(Path::to_path_buf),
  };
  for header in headers {
    if header.starts_with(&classes_dir) {
      reflected.classes_headers.push(header);
    } else if header.starts_with(&public_dir) {
      reflected.public_headers.push(header);
    } else {
      reflected.private_headers.push(header);
    }
  }
  Ok(Some(reflected))
}
