//! Post-ordered dependency closures.
//!
//! [`DependencyWalk::visit`] walks a module's private, public and optionally
//! dynamically loaded dependencies depth first, appending each dependency after
//! its own dependencies. The result lists dependencies before dependents, which
//! is the order static libraries must be linked in.
//!
//! Declared circular back-references are skipped unless the walk is forced to
//! follow them; the `referenced` set guarantees termination either way.

use std::collections::HashSet;

use tracing::trace;

use crate::error::BuildError;
use crate::module::{DependencyKind, ModuleId, ModuleRegistry};

const LINK_KINDS: [DependencyKind; 2] = [DependencyKind::Private, DependencyKind::Public];
const DYNAMIC_KINDS: [DependencyKind; 2] = [
  DependencyKind::DynamicallyLoaded,
  DependencyKind::PlatformSpecificDynamicallyLoaded,
];

/// State of one dependency walk, shareable across several roots.
#[derive(Debug, Default)]
pub struct DependencyWalk {
  /// Modules already reached by this walk.
  pub referenced: HashSet<ModuleId>,
  /// Reached modules, dependencies before dependents.
  pub ordered: Vec<ModuleId>,
  pub include_dynamic: bool,
  pub force_circular: bool,
}

impl DependencyWalk {
  pub fn new(include_dynamic: bool, force_circular: bool) -> Self {
    Self {
      include_dynamic,
      force_circular,
      ..Default::default()
    }
  }

  /// Append the dependency closure of `module` to this walk.
  ///
  /// The root itself is not added.
  pub fn visit(&mut self, registry: &mut ModuleRegistry, module: ModuleId) -> Result<(), BuildError> {
    let mut dependencies = registry.dependencies_of(module, &LINK_KINDS)?;
    if self.include_dynamic {
      dependencies.extend(registry.dependencies_of(module, &DYNAMIC_KINDS)?);
    }

    for dependency in dependencies {
      if self.referenced.contains(&dependency) {
        continue;
      }
      if !self.force_circular && registry.get(module).is_circular(dependency) {
        trace!(
          module = %registry.name(module),
          dependency = %registry.name(dependency),
          "not following circular back-reference"
        );
        continue;
      }

      self.referenced.insert(dependency);
      self.visit(registry, dependency)?;
      self.ordered.push(dependency);
    }
    Ok(())
  }
}

/// Ordered dependency closure of a single module.
pub fn all_dependency_modules(
  registry: &mut ModuleRegistry,
  module: ModuleId,
  include_dynamic: bool,
  force_circular: bool,
) -> Result<Vec<ModuleId>, BuildError> {
  let mut walk = DependencyWalk::new(include_dynamic, force_circular);
  walk.visit(registry, module)?;
  Ok(walk.ordered)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::module::{ModuleRules, ModuleType};
  use crate::platform::TargetPlatform;

  fn rules(name: &str, public: &[&str], private: &[&str]) -> ModuleRules {
    let mut r = ModuleRules::new(name, ModuleType::Runtime, format!("/engine/Source/Runtime/{}", name));
    r.public_dependency_module_names = public.iter().map(|s| s.to_string()).collect();
    r.private_dependency_module_names = private.iter().map(|s| s.to_string()).collect();
    r
  }

  fn names(reg: &ModuleRegistry, ids: &[ModuleId]) -> Vec<String> {
    ids.iter().map(|id| reg.name(*id).to_string()).collect()
  }

  fn registry(rules: Vec<ModuleRules>) -> ModuleRegistry {
    ModuleRegistry::new(TargetPlatform::Linux, "/engine").with_rules(rules)
  }

  #[test]
  fn dependencies_precede_dependents() {
    let mut reg = registry(vec![
      rules("A", &["B"], &[]),
      rules("B", &["C"], &[]),
      rules("C", &[], &[]),
    ]);
    let a = reg.find_or_create("A").unwrap();

    let ordered = all_dependency_modules(&mut reg, a, false, false).unwrap();
    assert_eq!(names(&reg, &ordered), vec!["C", "B"]);
  }

  #[test]
  fn diamond_is_visited_once_private_first() {
    let mut reg = registry(vec![
      rules("Top", &["Left"], &["Right"]),
      rules("Left", &["Base"], &[]),
      rules("Right", &["Base"], &[]),
      rules("Base", &[], &[]),
    ]);
    let top = reg.find_or_create("Top").unwrap();

    let ordered = all_dependency_modules(&mut reg, top, false, false).unwrap();
    assert_eq!(names(&reg, &ordered), vec!["Base", "Right", "Left"]);
  }

  #[test]
  fn declared_cycle_is_skipped_unless_forced() {
    let mut a = rules("A", &["B"], &[]);
    a.circularly_referenced_dependent_modules = vec!["B".to_string()];
    let mut b = rules("B", &["A"], &[]);
    b.circularly_referenced_dependent_modules = vec!["A".to_string()];
    let mut reg = registry(vec![a, b]);
    let a = reg.find_or_create("A").unwrap();

    let plain = all_dependency_modules(&mut reg, a, false, false).unwrap();
    assert!(plain.is_empty());

    let forced = all_dependency_modules(&mut reg, a, false, true).unwrap();
    assert_eq!(names(&reg, &forced), vec!["A", "B"]);
  }

  #[test]
  fn dynamic_modules_only_when_requested() {
    let mut launcher = rules("Launch", &[], &[]);
    launcher.dynamically_loaded_module_names = vec!["Plugin".to_string()];
    let mut reg = registry(vec![launcher, rules("Plugin", &["Core"], &[]), rules("Core", &[], &[])]);
    let launch = reg.find_or_create("Launch").unwrap();

    assert!(all_dependency_modules(&mut reg, launch, false, false).unwrap().is_empty());
    let with_dynamic = all_dependency_modules(&mut reg, launch, true, false).unwrap();
    assert_eq!(names(&reg, &with_dynamic), vec!["Core", "Plugin"]);
  }

  #[test]
  fn unknown_module_is_fatal() {
    let mut reg = registry(vec![rules("A", &["Ghost"], &[])]);
    let a = reg.find_or_create("A").unwrap();

    let err = all_dependency_modules(&mut reg, a, false, false).unwrap_err();
    assert!(err.to_string().contains("Ghost"));
  }

  #[test]
  fn shared_walk_spans_several_roots() {
    let mut reg = registry(vec![
      rules("A", &["Core"], &[]),
      rules("B", &["Core"], &[]),
      rules("Core", &[], &[]),
    ]);
    let a = reg.find_or_create("A").unwrap();
    let b = reg.find_or_create("B").unwrap();

    let mut walk = DependencyWalk::new(false, false);
    walk.visit(&mut reg, a).unwrap();
    walk.visit(&mut reg, b).unwrap();
    assert_eq!(names(&reg, &walk.ordered), vec!["Core"]);
  }
}
