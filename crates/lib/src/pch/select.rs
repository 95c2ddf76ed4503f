//! Per-module precompiled header selection.
//!
//! Every source file of a module must start by including the same header.
//! That header either becomes the module's own ("unique") PCH, or, when it
//! transitively reaches a shared tier header with compatible settings, the
//! module compiles against that tier's shared PCH instead.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::BuildConfiguration;
use crate::consts::{SHARED_PCH_DIRECTORY, SHARED_PCH_MODULE_NAME};
use crate::environment::{CompileEnvironment, PchAction, PchSettings};
use crate::error::BuildError;
use crate::module::{CodeOptimization, Module, ModuleId, ModuleRegistry, PchUsage};
use crate::pch::includes::IncludeScanner;
use crate::resolve::all_dependency_modules;
use crate::target::TargetRules;

/// A header one module offers to others as a shared PCH.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedPchTier {
  pub module: ModuleId,
  pub module_name: String,
  pub header: PathBuf,
}

/// A shared PCH instance and the settings every consumer must match.
#[derive(Debug, Clone, Serialize)]
pub struct SharedPchEnvironment {
  pub header: PathBuf,
  /// Module owning the tier header.
  pub owner: ModuleId,
  pub owner_name: String,
  pub use_clr: bool,
  pub optimize_code: CodeOptimization,
  pub output_directory: PathBuf,
  pub consumers: Vec<ModuleId>,
}

impl SharedPchEnvironment {
  pub fn pch_file(&self) -> PathBuf {
    self
      .output_directory
      .join(pch_file_name(SHARED_PCH_MODULE_NAME, &self.header))
  }
}

/// A source file and the header it compiles against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFile {
  pub path: PathBuf,
  /// First include as written in the source.
  pub first_include: String,
  pub resolved_first_include: PathBuf,
  /// Absolute PCH header this file is compiled with, once one is chosen.
  pub pch_include: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PchDecision {
  /// Files compile without a precompiled header.
  None,
  /// The module builds its own PCH.
  Unique { header: PathBuf },
  /// The module uses a shared PCH.
  Shared { environment: usize, header: PathBuf },
}

/// Outcome of PCH selection for one module.
#[derive(Debug, Clone, Serialize)]
pub struct ModulePch {
  pub module: ModuleId,
  pub decision: PchDecision,
  pub files: Vec<SourceFile>,
}

impl ModulePch {
  /// Point `env` at the chosen header.
  pub fn apply(&self, env: &mut CompileEnvironment) {
    env.pch = match &self.decision {
      PchDecision::None => PchSettings::default(),
      PchDecision::Unique { header } | PchDecision::Shared { header, .. } => PchSettings {
        action: PchAction::Include,
        header: Some(header.clone()),
        header_name_in_code: Some(header.display().to_string()),
      },
    };
  }
}

/// File name of a compiled PCH for `header` built by `module_name`.
pub fn pch_file_name(module_name: &str, header: &Path) -> String {
  let header_name = header
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  format!("PCH.{}.{}.pch", module_name, header_name)
}

fn same_path(a: &Path, b: &Path) -> bool {
  a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy())
}

/// Shared PCH tiers of the bound modules, least complex first.
///
/// Complexity is the size of a module's dependency closure; ties break by name.
pub fn collect_tiers(registry: &mut ModuleRegistry) -> Result<Vec<SharedPchTier>, BuildError> {
  let candidates: Vec<(ModuleId, String, PathBuf)> = registry
    .modules()
    .filter(|m| m.included_in_target)
    .filter_map(|m| {
      let header = m.shared_pch_header_file.as_ref()?;
      let header = dunce::canonicalize(header).unwrap_or_else(|_| header.clone());
      Some((m.id, m.name.clone(), header))
    })
    .collect();

  let mut ranked = Vec::with_capacity(candidates.len());
  for (module, module_name, header) in candidates {
    let complexity = all_dependency_modules(registry, module, false, false)?.len();
    ranked.push((complexity, SharedPchTier { module, module_name, header }));
  }
  ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.module_name.cmp(&b.1.module_name)));

  let tiers: Vec<_> = ranked.into_iter().map(|(_, tier)| tier).collect();
  debug!(tiers = ?tiers.iter().map(|t| t.module_name.as_str()).collect::<Vec<_>>(), "shared pch tiers");
  Ok(tiers)
}

/// Chooses precompiled headers for the modules of one target.
#[derive(Debug)]
pub struct PchSelector {
  config: BuildConfiguration,
  tiers: Vec<SharedPchTier>,
  shared: Vec<SharedPchEnvironment>,
  scanner: IncludeScanner,
}

impl PchSelector {
  pub fn new(config: &BuildConfiguration, tiers: Vec<SharedPchTier>) -> Self {
    Self {
      config: config.clone(),
      tiers,
      shared: Vec::new(),
      scanner: IncludeScanner::new(),
    }
  }

  pub fn tiers(&self) -> &[SharedPchTier] {
    &self.tiers
  }

  /// Shared PCH environments created so far.
  pub fn shared_environments(&self) -> &[SharedPchEnvironment] {
    &self.shared
  }

  pub fn scanner_mut(&mut self) -> &mut IncludeScanner {
    &mut self.scanner
  }

  /// Minimum number of source files before a module gets its own PCH.
  pub fn min_files_using_pch(&self, module: &Module, target: &TargetRules) -> usize {
    if let Some(count) = module.min_files_using_pch_override {
      count
    } else if self.config.force_pch_for_game_modules && !target.is_under_engine(&module.directory) {
      1
    } else {
      self.config.min_files_using_pch
    }
  }

  /// Select the PCH for `module`, compiled with `env`, from its `files`.
  pub fn select(
    &mut self,
    module: &Module,
    env: &CompileEnvironment,
    files: &[PathBuf],
    target: &TargetRules,
  ) -> Result<ModulePch, BuildError> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
      let first_include = self
        .scanner
        .first_include(file)?
        .ok_or_else(|| BuildError::NoFirstInclude {
          module: module.name.clone(),
          file: file.clone(),
        })?;
      let resolved = self
        .scanner
        .resolve(file, &first_include, env)
        .ok_or_else(|| BuildError::UnresolvedFirstInclude {
          module: module.name.clone(),
          file: file.clone(),
          include: first_include.clone(),
        })?;
      sources.push(SourceFile {
        path: file.clone(),
        first_include,
        resolved_first_include: resolved,
        pch_include: None,
      });
    }

    if !self.config.use_pch || sources.is_empty() {
      return Ok(ModulePch {
        module: module.id,
        decision: PchDecision::None,
        files: sources,
      });
    }

    let monolithic = target.should_compile_monolithic();
    let disable_shared = monolithic && target.build_library;
    if self.config.use_shared_pchs && disable_shared {
      trace!(module = %module.name, "shared pchs disabled when building a monolithic library");
    }
    let use_shared = self.config.use_shared_pchs && !disable_shared;
    let own_tier = self.tiers.iter().find(|t| use_shared && t.module == module.id).cloned();
    let allow_shared = module.pch_usage == PchUsage::UseSharedPchs;

    let mut shared_tier: Option<usize> = None;
    if use_shared {
      for source in &sources {
        let can_use_own = allow_shared
          && monolithic
          && own_tier
            .as_ref()
            .is_some_and(|t| same_path(&source.resolved_first_include, &t.header));
        if !allow_shared || (own_tier.is_some() && !can_use_own) {
          trace!(file = %source.path.display(), module = %module.name, "module needs its own private pch");
          continue;
        }

        let Some(largest) = self.largest_included_tier(&source.path, env)? else {
          trace!(file = %source.path.display(), "file does not reach a shared pch");
          continue;
        };
        match shared_tier {
          None => shared_tier = Some(largest),
          Some(current) if self.tiers[current].header != self.tiers[largest].header => {
            warn!(
              file = %source.path.display(),
              using = %self.tiers[current].header.display(),
              reaches = %self.tiers[largest].header.display(),
              "file doesn't use the same shared precompiled header as other files in this module; include the largest shared header in the module's private pch"
            );
          }
          Some(_) => {}
        }
      }
    }

    check_single_pch(module, &sources)?;

    let min_files = self.min_files_using_pch(module, target);
    let mut decision = PchDecision::None;
    if shared_tier.is_some() || sources.len() >= min_files {
      if let Some(tier) = shared_tier {
        if let Some(environment) = self.apply_shared(tier, module, target) {
          decision = PchDecision::Shared {
            environment,
            header: self.shared[environment].header.clone(),
          };
        }
      }
      if decision == PchDecision::None && sources.len() >= min_files {
        decision = PchDecision::Unique {
          header: sources[0].resolved_first_include.clone(),
        };
      }
    }

    let header = match &decision {
      PchDecision::None => None,
      PchDecision::Unique { header, .. } | PchDecision::Shared { header, .. } => Some(header.clone()),
    };
    for source in &mut sources {
      source.pch_include = header.clone();
    }

    debug!(
      module = %module.name,
      files = sources.len(),
      min_files,
      decision = ?decision,
      "selected precompiled header"
    );
    Ok(ModulePch {
      module: module.id,
      decision,
      files: sources,
    })
  }

  /// Index of the most complex tier `file` reaches through its includes.
  ///
  /// Tiers are searched from the most complex down, stopping early once the
  /// most complex one is found.
  fn largest_included_tier(&mut self, file: &Path, env: &CompileEnvironment) -> Result<Option<usize>, BuildError> {
    let Some(top) = self.tiers.len().checked_sub(1) else {
      return Ok(None);
    };
    let includes = self.scanner.include_dependencies(file, env)?;

    let mut largest: Option<usize> = None;
    for included in &includes {
      let floor = largest.map(|l| l + 1).unwrap_or(0);
      if let Some(index) = (floor..=top).rev().find(|i| same_path(included, &self.tiers[*i].header)) {
        largest = Some(index);
      }
      if largest == Some(top) {
        break;
      }
    }
    Ok(largest)
  }

  /// Join the shared environment for `tier`, creating it on first use.
  ///
  /// Returns `None` if the module's CLR mode or optimization level is
  /// incompatible with the existing environment.
  fn apply_shared(
    &mut self,
    tier: usize,
    module: &Module,
    target: &TargetRules,
  ) -> Option<usize> {
    let tier = &self.tiers[tier];
    let existing = self.shared.iter().position(|s| same_path(&s.header, &tier.header));

    let index = match existing {
      Some(index) => {
        let shared = &self.shared[index];
        if shared.use_clr != module.use_clr {
          debug!(module = %module.name, header = %shared.header.display(), "clr mode differs from shared pch; using a private pch");
          return None;
        }
        let configuration = target.configuration.compile_configuration();
        if shared.optimize_code.normalized(configuration) != module.optimize_code.normalized(configuration) {
          debug!(module = %module.name, header = %shared.header.display(), "optimization differs from shared pch; using a private pch");
          return None;
        }
        index
      }
      None => {
        debug!(module = %module.name, header = %tier.header.display(), "creating shared pch environment");
        self.shared.push(SharedPchEnvironment {
          header: tier.header.clone(),
          owner: tier.module,
          owner_name: tier.module_name.clone(),
          use_clr: module.use_clr,
          optimize_code: module.optimize_code,
          output_directory: target.intermediate_dir().join(SHARED_PCH_DIRECTORY),
          consumers: Vec::new(),
        });
        self.shared.len() - 1
      }
    };

    self.shared[index].consumers.push(module.id);
    Some(index)
  }
}

/// Fail unless every file resolves the same first include.
fn check_single_pch(module: &Module, sources: &[SourceFile]) -> Result<(), BuildError> {
  let mut usage: Vec<(&Path, usize)> = Vec::new();
  for source in sources {
    match usage
      .iter_mut()
      .find(|(header, _)| same_path(header, &source.resolved_first_include))
    {
      Some((_, count)) => *count += 1,
      None => usage.push((source.resolved_first_include.as_path(), 1)),
    }
  }
  if usage.len() <= 1 {
    return Ok(());
  }

  let mut most_used = usage[0];
  for entry in &usage[1..] {
    if entry.1 > most_used.1 {
      most_used = *entry;
    }
  }
  let (conforming, offending): (Vec<_>, Vec<_>) = sources
    .iter()
    .partition(|s| same_path(&s.resolved_first_include, most_used.0));
  debug!(module = %module.name, headers = usage.len(), "conflicting precompiled headers");

  Err(BuildError::ConflictingPch {
    module: module.name.clone(),
    most_used: most_used.0.to_path_buf(),
    most_used_by: conforming.first().map(|s| s.path.clone()).unwrap_or_default(),
    offenders: offending
      .into_iter()
      .map(|s| (s.path.clone(), s.resolved_first_include.clone()))
      .collect(),
  })
}
