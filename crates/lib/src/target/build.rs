//! The target build pipeline.
//!
//! 1. Register module rules and bind every reachable module to a binary
//! 2. Find reflected modules and expose their generated code directories
//! 3. Derive compile environments and select precompiled headers
//! 4. Render compile, PCH, archive and link actions
//! 5. Run the header generator if generated code is stale
//! 6. Execute the actions, skipping those already up to date

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::binary::{BinaryId, BinarySet, BinaryType, bind_target};
use crate::codegen::{CodegenGate, CodegenOutcome, ReflectedModule, reflected_module};
use crate::config::BuildConfiguration;
use crate::consts::{INTERMEDIATE_DIR, SHARED_PCH_MODULE_NAME};
use crate::environment::{CompileEnvironment, EnvironmentBuilder, LinkEnvironment};
use crate::error::BuildError;
use crate::execute::{ToolRunner, execute_actions};
use crate::module::{Module, ModuleId, ModuleRegistry};
use crate::pch::{ModulePch, PchDecision, PchSelector, SharedPchEnvironment, collect_tiers};
use crate::resolve::all_dependency_modules;
use crate::target::types::{TargetDescription, TargetRules};
use crate::toolchain::{Action, Toolchain};
use crate::util::fs::find_files;

const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "c"];

/// Options for [`TargetBuild::build`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
  /// Run the header generator even if generated code is current.
  pub force_header_generation: bool,

  /// Plan only; run neither the generator nor any action.
  pub dry_run: bool,
}

/// One binary of the plan.
#[derive(Debug, Clone, Serialize)]
pub struct BinaryPlan {
  pub path: PathBuf,
  pub binary_type: BinaryType,
  pub modules: Vec<String>,
}

/// One compiled module of the plan.
#[derive(Debug, Clone, Serialize)]
pub struct ModulePlan {
  pub name: String,
  pub binary: PathBuf,
  pub pch: ModulePch,
  pub environment: CompileEnvironment,
}

/// Everything a build would do, without having done any of it.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub target: String,
  pub binaries: Vec<BinaryPlan>,
  pub modules: Vec<ModulePlan>,
  pub shared_pchs: Vec<SharedPchEnvironment>,
  pub reflected: Vec<ReflectedModule>,
  pub actions: Vec<Action>,
}

/// Outcome of [`TargetBuild::build`].
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub target: String,
  pub binaries: Vec<PathBuf>,
  /// `None` on a dry run.
  pub codegen: Option<CodegenOutcome>,
  pub executed: Vec<String>,
  pub skipped: Vec<String>,
  /// Actions a dry run would have considered.
  pub planned: Vec<String>,
  pub duration: Duration,
}

/// A target with its modules bound to binaries.
#[derive(Debug)]
pub struct TargetBuild {
  target: TargetRules,
  config: BuildConfiguration,
  registry: ModuleRegistry,
  binaries: BinarySet,
}

impl TargetBuild {
  /// Register the description's modules and bind the target.
  pub fn prepare(description: TargetDescription) -> Result<Self, BuildError> {
    let TargetDescription {
      target,
      modules,
      config,
      ..
    } = description;
    let mut registry = ModuleRegistry::new(target.platform, &target.engine_dir).with_rules(modules);
    let binaries = bind_target(&mut registry, &target)?;
    info!(
      target_name = %target.name,
      binaries = binaries.len(),
      monolithic = target.should_compile_monolithic(),
      "bound target"
    );
    Ok(Self {
      target,
      config,
      registry,
      binaries,
    })
  }

  pub fn target(&self) -> &TargetRules {
    &self.target
  }

  pub fn config(&self) -> &BuildConfiguration {
    &self.config
  }

  pub fn registry(&self) -> &ModuleRegistry {
    &self.registry
  }

  pub fn binaries(&self) -> &BinarySet {
    &self.binaries
  }

  fn module_id(&self, name: &str) -> Result<ModuleId, BuildError> {
    self.registry.find(name).ok_or_else(|| BuildError::UnknownModule {
      name: name.to_string(),
      referenced_by: None,
    })
  }

  /// Names of `module`'s dependency closure, dependencies first.
  pub fn dependency_closure(
    &mut self,
    module: &str,
    include_dynamic: bool,
    force_circular: bool,
  ) -> Result<Vec<String>, BuildError> {
    let id = self.registry.find_or_create(module)?;
    let closure = all_dependency_modules(&mut self.registry, id, include_dynamic, force_circular)?;
    Ok(closure.into_iter().map(|m| self.registry.name(m).to_string()).collect())
  }

  /// The environment `module`'s sources compile with.
  pub fn compile_environment(&mut self, module: &str) -> Result<CompileEnvironment, BuildError> {
    let id = self.module_id(module)?;
    let base = CompileEnvironment::base(&self.target);
    EnvironmentBuilder::new(&mut self.registry, &self.binaries, &self.target).create_module_compile_environment(id, &base)
  }

  /// The libraries and binaries `binary` links against.
  pub fn link_environment(&mut self, binary: BinaryId) -> Result<LinkEnvironment, BuildError> {
    EnvironmentBuilder::new(&mut self.registry, &self.binaries, &self.target).create_binary_link_environment(binary)
  }

  /// Modules compiled into the target's binaries, binary by binary.
  fn compiled_modules(&self) -> Vec<ModuleId> {
    self
      .binaries
      .iter()
      .flat_map(|b| b.modules.iter().copied())
      .filter(|m| !self.registry.get(*m).module_type.is_external())
      .collect()
  }

  /// Plan the build: environments, PCH choices and actions.
  pub fn plan(&mut self) -> Result<BuildPlan, BuildError> {
    let modules = self.compiled_modules();
    let base = CompileEnvironment::base(&self.target);

    // Generated headers are included like any other public header.
    let mut reflected = Vec::new();
    for &id in &modules {
      if let Some(module) = reflected_module(self.registry.get(id), &self.target, None)? {
        let paths = &mut self.registry.get_mut(id).public_include_paths;
        if !paths.contains(&module.generated_dir) {
          paths.push(module.generated_dir.clone());
        }
        reflected.push(module);
      }
    }
    debug!(count = reflected.len(), "reflected modules");

    let tiers = collect_tiers(&mut self.registry)?;
    let mut selector = PchSelector::new(&self.config, tiers);
    let mut planned = Vec::with_capacity(modules.len());
    for &id in &modules {
      let env = EnvironmentBuilder::new(&mut self.registry, &self.binaries, &self.target)
        .create_module_compile_environment(id, &base)?;
      let files = source_files(self.registry.get(id))?;
      let pch = selector.select(self.registry.get(id), &env, &files, &self.target)?;
      planned.push((id, env, pch));
    }

    for (id, _, pch) in &planned {
      if let PchDecision::Unique { header, .. } = &pch.decision {
        let name = self.registry.name(*id);
        if let Some(module) = reflected.iter_mut().find(|r| r.name == name) {
          module.pch = Some(header.clone());
        }
      }
    }

    let toolchain = Toolchain::new(&self.config, self.target.platform);
    let mut actions = Vec::new();

    for shared in selector.shared_environments().to_vec() {
      let mut env = EnvironmentBuilder::new(&mut self.registry, &self.binaries, &self.target)
        .create_module_compile_environment(shared.owner, &base)?;
      env.output_directory = shared.output_directory.clone();
      let includes = selector.scanner_mut().include_dependencies(&shared.header, &env)?;
      let pch_file = toolchain.pch_file(&env, SHARED_PCH_MODULE_NAME, &shared.header);
      actions.push(toolchain.create_pch(&env, &shared.header, &pch_file, includes));
    }

    let mut objects: HashMap<BinaryId, Vec<PathBuf>> = HashMap::new();
    let mut module_plans = Vec::with_capacity(planned.len());
    for (id, mut env, pch) in planned {
      let module = self.registry.get(id);
      let Some(binary) = module.binary else {
        return Err(BuildError::ModuleNotBound(module.name.clone()));
      };
      pch.apply(&mut env);

      let pch_file = match &pch.decision {
        PchDecision::None => None,
        PchDecision::Unique { header, .. } => {
          let pch_file = toolchain.pch_file(&env, &module.name, header);
          let includes = selector.scanner_mut().include_dependencies(header, &env)?;
          actions.push(toolchain.create_pch(&env, header, &pch_file, includes));
          Some(pch_file)
        }
        PchDecision::Shared { environment, .. } => Some(selector.shared_environments()[*environment].pch_file()),
      };

      let binary_objects = objects.entry(binary).or_default();
      for file in &pch.files {
        let includes = selector.scanner_mut().include_dependencies(&file.path, &env)?;
        let action = toolchain.compile(&env, &file.path, pch_file.as_deref(), includes);
        binary_objects.extend(action.produced.iter().cloned());
        actions.push(action);
      }
      if let Some(generated) = reflected.iter().find(|r| r.name == module.name) {
        let action = toolchain.compile(&env, &generated.generated_cpp(), pch_file.as_deref(), Vec::new());
        binary_objects.extend(action.produced.iter().cloned());
        actions.push(action);
      }

      module_plans.push(ModulePlan {
        name: module.name.clone(),
        binary: self.binaries.get(binary).output_path.clone(),
        pch,
        environment: env,
      });
    }

    let binary_ids: Vec<BinaryId> = self.binaries.iter().map(|b| b.id).collect();
    for id in binary_ids {
      let binary_objects = objects.remove(&id).unwrap_or_default();
      let binary = self.binaries.get(id).clone();
      if binary.binary_type == BinaryType::StaticLibrary {
        actions.push(toolchain.archive(&binary, &binary_objects));
        continue;
      }

      let link_env = self.link_environment(id)?;
      let dependencies: Vec<PathBuf> = link_env
        .binary_dependencies
        .iter()
        .map(|d| toolchain.link_input(self.binaries.get(*d)))
        .collect();
      if binary.create_import_library_separately {
        actions.push(toolchain.import_library(&binary, &binary_objects));
      }
      actions.push(toolchain.link(&binary, &binary_objects, &link_env, &dependencies));
    }

    let binaries = self
      .binaries
      .iter()
      .map(|b| BinaryPlan {
        path: b.output_path.clone(),
        binary_type: b.binary_type,
        modules: b.modules.iter().map(|m| self.registry.name(*m).to_string()).collect(),
      })
      .collect();

    info!(
      target_name = %self.target.name,
      modules = module_plans.len(),
      reflected = reflected.len(),
      actions = actions.len(),
      "planned build"
    );
    Ok(BuildPlan {
      target: self.target.name.clone(),
      binaries,
      modules: module_plans,
      shared_pchs: selector.shared_environments().to_vec(),
      reflected,
      actions,
    })
  }

  /// Plan, generate code and execute.
  pub async fn build<R: ToolRunner>(&mut self, options: &BuildOptions, runner: &R) -> Result<BuildReport, BuildError> {
    let started = Instant::now();
    if options.force_header_generation {
      self.config.force_header_generation = true;
    }

    let plan = self.plan()?;
    let binaries: Vec<PathBuf> = plan.binaries.iter().map(|b| b.path.clone()).collect();

    if options.dry_run {
      info!("dry run - not generating code or running actions");
      return Ok(BuildReport {
        target: plan.target,
        binaries,
        codegen: None,
        executed: Vec::new(),
        skipped: Vec::new(),
        planned: plan.actions.iter().map(|a| a.description.clone()).collect(),
        duration: started.elapsed(),
      });
    }

    let codegen = CodegenGate::new(&self.target, &self.config)
      .run(&plan.reflected, runner)
      .await?;
    let summary = execute_actions(&plan.actions, runner).await?;

    Ok(BuildReport {
      target: plan.target,
      binaries,
      codegen: Some(codegen),
      executed: summary.executed,
      skipped: summary.skipped,
      planned: Vec::new(),
      duration: started.elapsed(),
    })
  }
}

/// Source files of `module`: the listed ones, or every C/C++ source under its directory.
fn source_files(module: &Module) -> Result<Vec<PathBuf>, BuildError> {
  if module.source_files.is_empty() {
    return find_files(&module.directory, SOURCE_EXTENSIONS, &[INTERMEDIATE_DIR]);
  }
  let missing: Vec<PathBuf> = module
    .source_files
    .iter()
    .filter(|f| !f.is_file())
    .cloned()
    .collect();
  if !missing.is_empty() {
    return Err(BuildError::MissingSourceFiles {
      module: module.name.clone(),
      files: missing,
    });
  }
  Ok(module.source_files.clone())
}
