//! The module arena.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::BuildError;
use crate::module::rules::ModuleRules;
use crate::module::types::{DependencyKind, Module, ModuleId, ModuleType};
use crate::platform::TargetPlatform;

/// All modules known to one target build.
///
/// Rule records are registered up front; [`Module`]s are materialized from
/// them on first reference and never removed.
#[derive(Debug)]
pub struct ModuleRegistry {
  platform: TargetPlatform,
  engine_dir: PathBuf,
  rules: HashMap<String, ModuleRules>,
  modules: Vec<Module>,
  by_name: HashMap<String, ModuleId>,
}

impl ModuleRegistry {
  pub fn new(platform: TargetPlatform, engine_dir: impl Into<PathBuf>) -> Self {
    Self {
      platform,
      engine_dir: engine_dir.into(),
      rules: HashMap::new(),
      modules: Vec::new(),
      by_name: HashMap::new(),
    }
  }

  /// Register a rule record. A later record for the same name replaces an
  /// earlier one as long as the module has not been materialized yet.
  pub fn add_rules(&mut self, rules: ModuleRules) {
    self.rules.insert(rules.name.clone(), rules);
  }

  pub fn with_rules(mut self, rules: impl IntoIterator<Item = ModuleRules>) -> Self {
    for r in rules {
      self.add_rules(r);
    }
    self
  }

  pub fn platform(&self) -> TargetPlatform {
    self.platform
  }

  pub fn engine_dir(&self) -> &Path {
    &self.engine_dir
  }

  /// Id of an already-materialized module.
  pub fn find(&self, name: &str) -> Option<ModuleId> {
    self.by_name.get(name).copied()
  }

  /// Id of the named module, materializing it from its rules if needed.
  pub fn find_or_create(&mut self, name: &str) -> Result<ModuleId, BuildError> {
    if let Some(id) = self.find(name) {
      return Ok(id);
    }

    let Some(rules) = self.rules.get(name) else {
      return Err(BuildError::UnknownModule {
        name: name.to_string(),
        referenced_by: None,
      });
    };

    let id = ModuleId(self.modules.len());
    let module_type = match rules.module_type {
      ModuleType::Unknown => ModuleType::infer(&rules.directory, &self.engine_dir),
      declared => declared,
    };
    let module = Module::from_rules(id, rules, module_type, self.platform);
    debug!(module = %name, id = id.0, module_type = %module_type, "materialized module");

    self.modules.push(module);
    self.by_name.insert(name.to_string(), id);
    Ok(id)
  }

  pub fn get(&self, id: ModuleId) -> &Module {
    &self.modules[id.0]
  }

  pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
    &mut self.modules[id.0]
  }

  pub fn name(&self, id: ModuleId) -> &str {
    &self.modules[id.0].name
  }

  /// Materialized modules in creation order.
  pub fn modules(&self) -> impl Iterator<Item = &Module> {
    self.modules.iter()
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  /// Resolved dependency ids of one kind, materializing the edge list on first use.
  ///
  /// Fails with [`BuildError::UnknownModule`] naming `id` as the referrer if any
  /// declared name has no rules.
  pub fn dependencies(&mut self, id: ModuleId, kind: DependencyKind) -> Result<Vec<ModuleId>, BuildError> {
    if let Some(ids) = self.modules[id.0].resolved.get(&kind) {
      return Ok(ids.clone());
    }

    let names = self.modules[id.0].dependency_names(kind).to_vec();
    let mut ids = Vec::with_capacity(names.len());
    for name in &names {
      let dep = self.find_or_create(name).map_err(|e| match e {
        BuildError::UnknownModule { name, .. } => BuildError::UnknownModule {
          name,
          referenced_by: Some(self.modules[id.0].name.clone()),
        },
        other => other,
      })?;
      ids.push(dep);
    }

    let module = &mut self.modules[id.0];
    for (name, dep) in names.iter().zip(&ids) {
      if module.declares_circular(name) {
        module.circular.insert(*dep);
      }
    }
    trace!(module = %module.name, ?kind, count = ids.len(), "materialized dependency edges");
    module.resolved.insert(kind, ids.clone());
    Ok(ids)
  }

  /// Concatenated dependency ids of several kinds, in the order given.
  pub fn dependencies_of(&mut self, id: ModuleId, kinds: &[DependencyKind]) -> Result<Vec<ModuleId>, BuildError> {
    let mut all = Vec::new();
    for kind in kinds {
      all.extend(self.dependencies(id, *kind)?);
    }
    Ok(all)
  }
}
