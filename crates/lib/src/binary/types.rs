use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::module::ModuleId;
use crate::platform::{TargetConfiguration, TargetPlatform};

/// Index of a binary within its [`BinarySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BinaryId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryType {
  Executable,
  DynamicLinkLibrary,
  StaticLibrary,
}

impl BinaryType {
  pub fn extension(&self, platform: TargetPlatform) -> &'static str {
    match self {
      BinaryType::Executable => platform.executable_extension(),
      BinaryType::DynamicLinkLibrary => platform.dynamic_library_extension(),
      BinaryType::StaticLibrary => platform.static_library_extension(),
    }
  }
}

/// One output artifact and the modules linked into it.
#[derive(Debug, Clone, Serialize)]
pub struct Binary {
  pub id: BinaryId,
  pub binary_type: BinaryType,
  pub output_path: PathBuf,
  pub intermediate_directory: PathBuf,
  pub allow_exports: bool,
  pub compile_monolithic: bool,
  pub configuration: TargetConfiguration,
  pub target_name: String,
  pub modules: Vec<ModuleId>,
  /// Emit the import library in its own action so mutually dependent
  /// libraries can link against each other.
  pub create_import_library_separately: bool,
}

impl Binary {
  pub fn file_name(&self) -> String {
    self
      .output_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  pub fn file_stem(&self) -> String {
    self
      .output_path
      .file_stem()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Path of the import library other binaries link against, where the platform has one.
  pub fn import_library_path(&self, platform: TargetPlatform) -> Option<PathBuf> {
    if self.binary_type != BinaryType::DynamicLinkLibrary {
      return None;
    }
    let ext = platform.import_library_extension()?;
    Some(self.intermediate_directory.join(format!("{}{}", self.file_stem(), ext)))
  }

  /// File other binaries link against to resolve this binary's symbols.
  pub fn link_input(&self, platform: TargetPlatform) -> PathBuf {
    self
      .import_library_path(platform)
      .unwrap_or_else(|| self.output_path.clone())
  }

  pub fn contains(&self, module: ModuleId) -> bool {
    self.modules.contains(&module)
  }
}

/// All binaries of one target, with the module-name index the binder uses.
#[derive(Debug, Default, Clone)]
pub struct BinarySet {
  binaries: Vec<Binary>,
  by_module: HashMap<String, BinaryId>,
}

impl BinarySet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a binary, assigning its id.
  pub fn add(&mut self, mut binary: Binary) -> BinaryId {
    let id = BinaryId(self.binaries.len());
    binary.id = id;
    self.binaries.push(binary);
    id
  }

  pub fn get(&self, id: BinaryId) -> &Binary {
    &self.binaries[id.0]
  }

  pub fn get_mut(&mut self, id: BinaryId) -> &mut Binary {
    &mut self.binaries[id.0]
  }

  /// Binary registered for a module name, if any.
  pub fn for_module(&self, name: &str) -> Option<BinaryId> {
    self.by_module.get(name).copied()
  }

  /// Record that `module` links into `binary`.
  pub fn assign(&mut self, name: &str, module: ModuleId, binary: BinaryId) {
    self.by_module.insert(name.to_string(), binary);
    let modules = &mut self.binaries[binary.0].modules;
    if !modules.contains(&module) {
      modules.push(module);
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &Binary> {
    self.binaries.iter()
  }

  pub fn len(&self) -> usize {
    self.binaries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.binaries.is_empty()
  }
}
