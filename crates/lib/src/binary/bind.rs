//! Binding modules to binaries.
//!
//! Starting from the target's root modules, every module reachable through
//! link or dynamic-load edges is assigned the binary it will be linked into.
//! Monolithic targets put everything in the main binary; modular targets give
//! each newly reached module its own dynamic library. External modules are
//! marked as part of the target but never receive a binary.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::binary::types::{Binary, BinaryId, BinarySet, BinaryType};
use crate::error::BuildError;
use crate::module::{DependencyKind, ModuleId, ModuleRegistry};
use crate::target::TargetRules;

const BIND_KINDS: [DependencyKind; 4] = [
  DependencyKind::Private,
  DependencyKind::Public,
  DependencyKind::DynamicallyLoaded,
  DependencyKind::PlatformSpecificDynamicallyLoaded,
];

/// Walks the module graph and assigns modules to binaries.
pub struct Binder<'a> {
  registry: &'a mut ModuleRegistry,
  binaries: &'a mut BinarySet,
  target: &'a TargetRules,
  executable: BinaryId,
  include_path_modules: HashSet<ModuleId>,
}

impl<'a> Binder<'a> {
  pub fn new(
    registry: &'a mut ModuleRegistry,
    binaries: &'a mut BinarySet,
    target: &'a TargetRules,
    executable: BinaryId,
  ) -> Self {
    Self {
      registry,
      binaries,
      target,
      executable,
      include_path_modules: HashSet::new(),
    }
  }

  /// Bind `module` to `binary` without walking its dependencies.
  pub fn bind(&mut self, module: ModuleId, binary: Option<BinaryId>) {
    let name = self.registry.name(module).to_string();
    if let Some(binary) = binary {
      self.binaries.assign(&name, module, binary);
    }
    let m = self.registry.get_mut(module);
    m.binary = binary;
    m.included_in_target = true;
  }

  /// Bind every unbound module reachable from the already bound `module`.
  ///
  /// Failures are attributed to the module whose dependencies were being
  /// processed when they occurred.
  pub fn process_unbound_modules(&mut self, module: ModuleId) -> Result<(), BuildError> {
    self.bind_dependencies(module).map_err(|e| match e {
      BuildError::ModuleProcessing { .. } => e,
      other => BuildError::processing(self.registry.name(module), other),
    })
  }

  fn bind_dependencies(&mut self, module: ModuleId) -> Result<(), BuildError> {
    if !self.registry.get(module).included_in_target {
      return Err(BuildError::ModuleNotBound(self.registry.name(module).to_string()));
    }

    let monolithic = self.target.should_compile_monolithic();
    let dependencies = self.registry.dependencies_of(module, &BIND_KINDS)?;
    for dependency in dependencies {
      let dep = self.registry.get(dependency);
      if !dep.included_in_target && self.binaries.for_module(&dep.name).is_none() {
        let binary = if dep.module_type.is_external() {
          None
        } else if monolithic {
          Some(self.executable)
        } else {
          Some(self.create_module_library(module, dependency))
        };
        trace!(
          module = %self.registry.name(module),
          dependency = %self.registry.name(dependency),
          ?binary,
          "binding dependency"
        );
        self.bind(dependency, binary);
        self.process_unbound_modules(dependency)?;
      }

      if !monolithic && self.registry.get(module).is_circular(dependency) {
        if let Some(binary) = self.registry.get(dependency).binary {
          self.binaries.get_mut(binary).create_import_library_separately = true;
        }
      }
    }

    self.add_include_path_modules(module, false)
  }

  /// Materialize include-path modules so their include paths can be found later.
  ///
  /// These are never bound unless something links against them.
  fn add_include_path_modules(&mut self, module: ModuleId, public_only: bool) -> Result<(), BuildError> {
    let mut names = self.registry.dependencies(module, DependencyKind::PublicIncludePath)?;
    if !public_only {
      names.extend(self.registry.dependencies(module, DependencyKind::PrivateIncludePath)?);
    }
    for include_module in names {
      if self.include_path_modules.insert(include_module) {
        self.add_include_path_modules(include_module, true)?;
      }
    }
    Ok(())
  }

  /// A dynamic library holding only `dependency`, referenced from `referencer`.
  fn create_module_library(&mut self, referencer: ModuleId, dependency: ModuleId) -> BinaryId {
    let target = self.target;
    let dep = self.registry.get(dependency);

    let base_name = format!("{}-{}", target.app_name(), dep.name);
    let path = target.binary_path(&base_name, BinaryType::DynamicLinkLibrary, Some(&dep.directory));
    let output_path = dep.fixup_output_path(&path);

    let referencer_binary = self.registry.get(referencer).binary.unwrap_or(self.executable);
    let mut intermediate_directory = self.binaries.get(referencer_binary).intermediate_directory.clone();
    let engine_intermediate = target.engine_intermediate_dir();
    if intermediate_directory != engine_intermediate && target.is_under_engine(&dep.directory) {
      intermediate_directory = engine_intermediate;
    }

    debug!(module = %dep.name, path = %output_path.display(), "creating module library");
    self.binaries.add(Binary {
      id: BinaryId(0),
      binary_type: BinaryType::DynamicLinkLibrary,
      output_path,
      intermediate_directory,
      allow_exports: true,
      compile_monolithic: false,
      configuration: target.configuration,
      target_name: target.app_name().to_string(),
      modules: Vec::new(),
      create_import_library_separately: false,
    })
  }
}

/// Create the target's binaries and bind every module it reaches.
///
/// The launch module goes into the main binary. Extra modules join it when
/// linking monolithically and get libraries of their own otherwise.
pub fn bind_target(registry: &mut ModuleRegistry, target: &TargetRules) -> Result<BinarySet, BuildError> {
  let monolithic = target.should_compile_monolithic();
  let binary_type = if target.build_library {
    BinaryType::StaticLibrary
  } else {
    BinaryType::Executable
  };

  let mut binaries = BinarySet::new();
  let executable = binaries.add(Binary {
    id: BinaryId(0),
    binary_type,
    output_path: target.binary_path(target.app_name(), binary_type, None),
    intermediate_directory: target.intermediate_dir(),
    allow_exports: !monolithic,
    compile_monolithic: monolithic,
    configuration: target.configuration,
    target_name: target.app_name().to_string(),
    modules: Vec::new(),
    create_import_library_separately: false,
  });

  let launch = registry.find_or_create(&target.launch_module)?;
  let mut roots = vec![launch];

  let mut binder = Binder::new(registry, &mut binaries, target, executable);
  binder.bind(launch, Some(executable));
  for name in &target.extra_modules {
    let module = binder.registry.find_or_create(name)?;
    if binder.registry.get(module).included_in_target {
      continue;
    }
    let binary = if monolithic {
      executable
    } else {
      binder.create_module_library(launch, module)
    };
    binder.bind(module, Some(binary));
    roots.push(module);
  }

  for root in roots {
    binder.process_unbound_modules(root)?;
  }

  debug!(
    target_name = %target.name,
    binaries = binaries.len(),
    modules = binaries.iter().map(|b| b.modules.len()).sum::<usize>(),
    "bound target"
  );
  Ok(binaries)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::module::{ModuleRules, ModuleType};
  use crate::platform::TargetPlatform;
  use crate::target::LinkType;
  use std::path::PathBuf;

  fn rules(name: &str, deps: &[&str]) -> ModuleRules {
    let mut r = ModuleRules::new(name, ModuleType::Runtime, format!("/e/Source/Runtime/{}", name));
    r.public_dependency_module_names = deps.iter().map(|d| d.to_string()).collect();
    r
  }

  fn target(link_type: LinkType) -> TargetRules {
    let mut t = TargetRules::new("Game", TargetPlatform::Linux, "A", "/e");
    t.link_type = Some(link_type);
    t
  }

  fn registry(rules: Vec<ModuleRules>) -> ModuleRegistry {
    ModuleRegistry::new(TargetPlatform::Linux, "/e").with_rules(rules)
  }

  #[test]
  fn monolithic_binds_everything_into_executable() {
    let mut reg = registry(vec![rules("A", &["B"]), rules("B", &["C"]), rules("C", &[])]);
    let binaries = bind_target(&mut reg, &target(LinkType::Monolithic)).unwrap();

    assert_eq!(binaries.len(), 1);
    let exe = binaries.iter().next().unwrap();
    assert_eq!(exe.binary_type, BinaryType::Executable);
    assert!(!exe.allow_exports);
    for name in ["A", "B", "C"] {
      let id = reg.find(name).unwrap();
      assert_eq!(reg.get(id).binary, Some(exe.id));
      assert!(reg.get(id).included_in_target);
    }
    let order: Vec<_> = exe.modules.iter().map(|m| reg.name(*m).to_string()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
  }

  #[test]
  fn modular_gives_each_module_its_own_library() {
    let mut reg = registry(vec![rules("A", &["B"]), rules("B", &["C"]), rules("C", &[])]);
    let binaries = bind_target(&mut reg, &target(LinkType::Modular)).unwrap();

    assert_eq!(binaries.len(), 3);
    let names = |id: BinaryId| -> Vec<String> {
      binaries.get(id).modules.iter().map(|m| reg.name(*m).to_string()).collect()
    };

    let a = reg.get(reg.find("A").unwrap()).binary.unwrap();
    let exe = binaries.get(a);
    assert_eq!(exe.binary_type, BinaryType::Executable);
    assert!(exe.allow_exports);
    assert_eq!(names(a), vec!["A"]);

    let b = reg.get(reg.find("B").unwrap()).binary.unwrap();
    assert_eq!(binaries.get(b).binary_type, BinaryType::DynamicLinkLibrary);
    assert_eq!(names(b), vec!["B"]);
    assert_eq!(binaries.get(b).output_path, PathBuf::from("/e/Binaries/Linux/Game-B.so"));

    let c = reg.find("C").unwrap();
    assert_eq!(names(reg.get(c).binary.unwrap()), vec!["C"]);
    let ids: Vec<BinaryId> = binaries.iter().map(|bin| bin.id).collect();
    assert_eq!(ids, vec![a, b, reg.get(c).binary.unwrap()]);
    let lib = binaries.get(reg.get(c).binary.unwrap());
    assert_eq!(lib.binary_type, BinaryType::DynamicLinkLibrary);
    assert!(lib.allow_exports);
    assert_eq!(lib.output_path, PathBuf::from("/e/Binaries/Linux/Game-C.so"));
    assert_eq!(
      lib.intermediate_directory,
      PathBuf::from("/e/Intermediate/Build/Linux/Game/Development")
    );
  }

  #[test]
  fn external_modules_are_included_without_binary() {
    let mut zlib = ModuleRules::new("zlib", ModuleType::ThirdParty, "/e/Source/ThirdParty/zlib");
    zlib.public_additional_libraries = vec!["z".to_string()];
    let mut reg = registry(vec![rules("A", &["zlib"]), zlib]);
    let binaries = bind_target(&mut reg, &target(LinkType::Modular)).unwrap();

    let zlib = reg.find("zlib").unwrap();
    assert!(reg.get(zlib).included_in_target);
    assert_eq!(reg.get(zlib).binary, None);
    assert_eq!(binaries.len(), 1);
  }

  #[test]
  fn circular_reference_splits_import_library() {
    let mut a = rules("A", &["B"]);
    a.circularly_referenced_dependent_modules = vec!["B".to_string()];
    let mut reg = registry(vec![a, rules("B", &["A"])]);
    let binaries = bind_target(&mut reg, &target(LinkType::Modular)).unwrap();

    let b = reg.find("B").unwrap();
    assert!(binaries.get(reg.get(b).binary.unwrap()).create_import_library_separately);
    let a = reg.find("A").unwrap();
    assert!(!binaries.get(reg.get(a).binary.unwrap()).create_import_library_separately);
  }

  #[test]
  fn unknown_dependency_is_attributed_to_referrer() {
    let mut reg = registry(vec![rules("A", &["B"]), rules("B", &["Missing"])]);
    let err = bind_target(&mut reg, &target(LinkType::Monolithic)).unwrap_err();

    assert_eq!(err.module(), Some("B"));
    assert!(err.to_string().contains("unable to find module 'Missing'"));
  }

  #[test]
  fn include_path_modules_are_materialized_but_not_bound() {
    let mut a = rules("A", &[]);
    a.private_include_path_module_names = vec!["Headers".to_string()];
    let mut headers = rules("Headers", &[]);
    headers.public_include_path_module_names = vec!["MoreHeaders".to_string()];
    let mut reg = registry(vec![a, headers, rules("MoreHeaders", &[])]);
    bind_target(&mut reg, &target(LinkType::Monolithic)).unwrap();

    for name in ["Headers", "MoreHeaders"] {
      let id = reg.find(name).unwrap();
      assert!(!reg.get(id).included_in_target);
      assert_eq!(reg.get(id).binary, None);
    }
  }

  #[test]
  fn extra_modules_get_libraries_when_modular() {
    let mut t = target(LinkType::Modular);
    t.extra_modules = vec!["Tools".to_string()];
    let mut reg = registry(vec![rules("A", &[]), rules("Tools", &["C"]), rules("C", &[])]);
    let binaries = bind_target(&mut reg, &t).unwrap();

    assert_eq!(binaries.len(), 3);
    let tools = reg.find("Tools").unwrap();
    assert_eq!(
      binaries.get(reg.get(tools).binary.unwrap()).file_name(),
      "Game-Tools.so"
    );
  }

  #[test]
  fn library_target_builds_static_library() {
    let mut t = target(LinkType::Monolithic);
    t.build_library = true;
    let mut reg = registry(vec![rules("A", &[])]);
    let binaries = bind_target(&mut reg, &t).unwrap();
    assert_eq!(binaries.iter().next().unwrap().binary_type, BinaryType::StaticLibrary);
  }
}
