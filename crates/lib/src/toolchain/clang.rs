use std::path::{Path, PathBuf};

use crate::binary::{Binary, BinaryType};
use crate::config::BuildConfiguration;
use crate::environment::{CompileEnvironment, LinkEnvironment};
use crate::execute::ToolInvocation;
use crate::module::CodeOptimization;
use crate::pch::pch_file_name;
use crate::platform::{CompileConfiguration, TargetPlatform};
use crate::toolchain::action::{Action, ActionKind};

/// Builds actions for a clang-compatible compiler driver and an `ar`-style archiver.
#[derive(Debug, Clone)]
pub struct Toolchain {
  compiler: PathBuf,
  archiver: PathBuf,
  platform: TargetPlatform,
}

impl Toolchain {
  pub fn new(config: &BuildConfiguration, platform: TargetPlatform) -> Self {
    Self {
      compiler: config.compiler.clone(),
      archiver: config.archiver.clone(),
      platform,
    }
  }

  pub fn platform(&self) -> TargetPlatform {
    self.platform
  }

  /// Object file `source` compiles to under `env`.
  pub fn object_file(&self, env: &CompileEnvironment, source: &Path) -> PathBuf {
    let name = source
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    env
      .output_directory
      .join(format!("{}{}", name, self.platform.object_extension()))
  }

  /// Compiled PCH for `header`, built by `module_name` into `env`'s output directory.
  pub fn pch_file(&self, env: &CompileEnvironment, module_name: &str, header: &Path) -> PathBuf {
    env.output_directory.join(pch_file_name(module_name, header))
  }

  fn compile_flags(&self, env: &CompileEnvironment) -> Vec<String> {
    let mut flags = vec![optimization_flag(env).to_string()];
    if env.configuration != CompileConfiguration::Shipping {
      flags.push("-g".to_string());
    }
    flags.extend(env.include_paths.iter().map(|p| format!("-I{}", p.display())));
    for path in &env.system_include_paths {
      flags.push("-isystem".to_string());
      flags.push(path.display().to_string());
    }
    flags.extend(env.definitions.iter().map(|d| format!("-D{}", d)));
    flags
  }

  /// Compile `header` into the precompiled header `pch_file`.
  pub fn create_pch(&self, env: &CompileEnvironment, header: &Path, pch_file: &Path, includes: Vec<PathBuf>) -> Action {
    let invocation = ToolInvocation::new(&self.compiler)
      .args(["-x", "c++-header"])
      .args(self.compile_flags(env))
      .path_arg(header)
      .arg("-o")
      .path_arg(pch_file);

    let mut prerequisites = vec![header.to_path_buf()];
    prerequisites.extend(includes);
    Action {
      kind: ActionKind::CreatePch,
      description: format!("Create PCH {}", file_name(header)),
      invocation,
      prerequisites,
      produced: vec![pch_file.to_path_buf()],
    }
  }

  /// Compile `source`, optionally against the precompiled header `pch_file`.
  pub fn compile(&self, env: &CompileEnvironment, source: &Path, pch_file: Option<&Path>, includes: Vec<PathBuf>) -> Action {
    let object = self.object_file(env, source);
    let mut invocation = ToolInvocation::new(&self.compiler)
      .args(["-c", "-x", "c++"])
      .args(self.compile_flags(env));
    if let Some(pch) = pch_file {
      invocation = invocation.arg("-include-pch").path_arg(pch);
    }
    let invocation = invocation.path_arg(source).arg("-o").path_arg(&object);

    let mut prerequisites = vec![source.to_path_buf()];
    prerequisites.extend(includes);
    prerequisites.extend(pch_file.map(Path::to_path_buf));
    Action {
      kind: ActionKind::Compile,
      description: format!("Compile {}", file_name(source)),
      invocation,
      prerequisites,
      produced: vec![object],
    }
  }

  /// Bundle `objects` into the static library `binary`.
  pub fn archive(&self, binary: &Binary, objects: &[PathBuf]) -> Action {
    let invocation = ToolInvocation::new(&self.archiver)
      .arg("rcs")
      .path_arg(&binary.output_path);
    let invocation = objects.iter().fold(invocation, |inv, o| inv.path_arg(o));
    Action {
      kind: ActionKind::Archive,
      description: format!("Archive {}", binary.file_name()),
      invocation,
      prerequisites: objects.to_vec(),
      produced: vec![binary.output_path.clone()],
    }
  }

  /// Where the separately created import library of `binary` is written.
  ///
  /// Platforms without import libraries get a stub shared library with
  /// unresolved symbols allowed instead.
  pub fn separate_import_library(&self, binary: &Binary) -> PathBuf {
    binary.import_library_path(self.platform).unwrap_or_else(|| {
      binary.intermediate_directory.join(format!(
        "{}.stub{}",
        binary.file_stem(),
        self.platform.dynamic_library_extension()
      ))
    })
  }

  /// File dependents link against to resolve `binary`'s symbols.
  pub fn link_input(&self, binary: &Binary) -> PathBuf {
    if binary.create_import_library_separately {
      self.separate_import_library(binary)
    } else {
      binary.link_input(self.platform)
    }
  }

  /// Produce `binary`'s import library from its objects alone, so binaries
  /// that depend on each other can link.
  pub fn import_library(&self, binary: &Binary, objects: &[PathBuf]) -> Action {
    let output = self.separate_import_library(binary);
    let invocation = ToolInvocation::new(&self.compiler).arg("-shared");
    let invocation = objects.iter().fold(invocation, |inv, o| inv.path_arg(o));
    let invocation = if self.platform == TargetPlatform::Win64 {
      let stub = binary
        .intermediate_directory
        .join(format!("{}.stub{}", binary.file_stem(), self.platform.dynamic_library_extension()));
      invocation
        .arg("-Wl,/FORCE:UNRESOLVED")
        .arg(format!("-Wl,/IMPLIB:{}", output.display()))
        .arg("-o")
        .path_arg(&stub)
    } else {
      invocation
        .arg("-Wl,--unresolved-symbols=ignore-all")
        .arg("-o")
        .path_arg(&output)
    };
    Action {
      kind: ActionKind::ImportLibrary,
      description: format!("Import library {}", binary.file_name()),
      invocation,
      prerequisites: objects.to_vec(),
      produced: vec![output],
    }
  }

  /// Link `objects` into `binary`, against `dependencies` (link inputs of other binaries).
  pub fn link(&self, binary: &Binary, objects: &[PathBuf], env: &LinkEnvironment, dependencies: &[PathBuf]) -> Action {
    let mut invocation = ToolInvocation::new(&self.compiler);
    if binary.binary_type == BinaryType::DynamicLinkLibrary {
      invocation = invocation.arg("-shared");
    }
    invocation = objects.iter().fold(invocation, |inv, o| inv.path_arg(o));
    invocation = dependencies.iter().fold(invocation, |inv, d| inv.path_arg(d));
    invocation = invocation.args(env.library_paths.iter().map(|p| format!("-L{}", p.display())));
    invocation = invocation.args(env.additional_libraries.iter().map(|l| format!("-l{}", l)));
    if self.platform.supports_frameworks() {
      for framework in env
        .frameworks
        .iter()
        .chain(env.additional_frameworks.iter().map(|f| &f.name))
      {
        invocation = invocation.arg("-framework").arg(framework);
      }
      for framework in &env.weak_frameworks {
        invocation = invocation.arg("-weak_framework").arg(framework);
      }
    }
    if self.platform == TargetPlatform::Win64 {
      invocation = invocation.args(env.delay_load_dlls.iter().map(|d| format!("-Wl,/DELAYLOAD:{}", d)));
    }
    invocation = invocation.arg("-o").path_arg(&binary.output_path);

    let mut produced = vec![binary.output_path.clone()];
    if !binary.create_import_library_separately {
      produced.extend(binary.import_library_path(self.platform));
    }
    let mut prerequisites = objects.to_vec();
    prerequisites.extend(dependencies.iter().cloned());
    Action {
      kind: ActionKind::Link,
      description: format!("Link {}", binary.file_name()),
      invocation,
      prerequisites,
      produced,
    }
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn optimization_flag(env: &CompileEnvironment) -> &'static str {
  let debug = env.configuration == CompileConfiguration::Debug;
  match env.optimize_code.normalized(env.configuration) {
    CodeOptimization::Never => "-O0",
    CodeOptimization::Always => "-O2",
    CodeOptimization::InShippingBuildsOnly if env.configuration == CompileConfiguration::Shipping => "-O2",
    CodeOptimization::InShippingBuildsOnly | CodeOptimization::InNonDebugBuilds => "-O0",
    CodeOptimization::Default if debug => "-O0",
    CodeOptimization::Default => "-O2",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::binary::BinaryId;
  use crate::platform::TargetConfiguration;

  fn binary(binary_type: BinaryType, output: &str) -> Binary {
    Binary {
      id: BinaryId(0),
      binary_type,
      output_path: PathBuf::from(output),
      intermediate_directory: PathBuf::from("/p/Intermediate/Build/Linux/Game/Development"),
      allow_exports: true,
      compile_monolithic: false,
      configuration: TargetConfiguration::Development,
      target_name: "Game".to_string(),
      modules: vec![],
      create_import_library_separately: false,
    }
  }

  fn env() -> CompileEnvironment {
    CompileEnvironment {
      include_paths: vec![PathBuf::from("/e/Core/Public")],
      system_include_paths: vec![PathBuf::from("/e/ThirdParty/zlib")],
      definitions: vec!["CORE_API=DLLEXPORT".to_string()],
      output_directory: PathBuf::from("/i/Core"),
      ..Default::default()
    }
  }

  fn toolchain(platform: TargetPlatform) -> Toolchain {
    Toolchain::new(&BuildConfiguration::default(), platform)
  }

  #[test]
  fn compile_uses_clang_style_flags() {
    let tc = toolchain(TargetPlatform::Linux);
    let pch = PathBuf::from("/i/Core/PCH.Core.CorePch.h.pch");
    let action = tc.compile(&env(), Path::new("/e/Core/Private/Core.cpp"), Some(&pch), vec![]);

    assert_eq!(action.kind, ActionKind::Compile);
    assert_eq!(action.produced, vec![PathBuf::from("/i/Core/Core.cpp.o")]);
    let args = &action.invocation.args;
    for expected in [
      "-c",
      "-O2",
      "-I/e/Core/Public",
      "-isystem",
      "-DCORE_API=DLLEXPORT",
      "-include-pch",
    ] {
      assert!(args.iter().any(|a| a == expected), "missing {expected} in {args:?}");
    }
    assert_eq!(args[args.len() - 2], "-o");
    assert!(action.prerequisites.contains(&pch));
  }

  #[test]
  fn debug_code_is_not_optimized() {
    let mut env = env();
    env.configuration = CompileConfiguration::Debug;
    env.optimize_code = CodeOptimization::InNonDebugBuilds;
    assert_eq!(optimization_flag(&env), "-O0");

    env.configuration = CompileConfiguration::Development;
    assert_eq!(optimization_flag(&env), "-O2");

    env.optimize_code = CodeOptimization::InShippingBuildsOnly;
    assert_eq!(optimization_flag(&env), "-O0");
  }

  #[test]
  fn create_pch_compiles_header_as_cxx_header() {
    let tc = toolchain(TargetPlatform::Linux);
    let header = Path::new("/e/Core/Public/CorePch.h");
    let pch = tc.pch_file(&env(), "Core", header);
    let action = tc.create_pch(&env(), header, &pch, vec![PathBuf::from("/e/Core/Public/Types.h")]);

    assert_eq!(pch, PathBuf::from("/i/Core/PCH.Core.CorePch.h.pch"));
    assert_eq!(&action.invocation.args[..2], &["-x".to_string(), "c++-header".to_string()]);
    assert_eq!(action.prerequisites.len(), 2);
    assert_eq!(action.produced, vec![pch]);
  }

  #[test]
  fn dll_link_names_dependencies_and_frameworks() {
    let tc = toolchain(TargetPlatform::Mac);
    let dll = binary(BinaryType::DynamicLinkLibrary, "/p/Binaries/Mac/Game-Core.dylib");
    let env = LinkEnvironment {
      library_paths: vec![PathBuf::from("/e/ThirdParty/zlib/lib")],
      additional_libraries: vec!["z".to_string()],
      frameworks: vec!["Cocoa".to_string()],
      weak_frameworks: vec!["Metal".to_string()],
      ..Default::default()
    };
    let objects = vec![PathBuf::from("/i/Core/Core.cpp.o")];
    let deps = vec![PathBuf::from("/p/Binaries/Mac/Game-Base.dylib")];
    let action = tc.link(&dll, &objects, &env, &deps);

    let line = action.invocation.command_line();
    assert!(line.starts_with("clang++ -shared /i/Core/Core.cpp.o /p/Binaries/Mac/Game-Base.dylib"));
    assert!(line.contains("-L/e/ThirdParty/zlib/lib -lz -framework Cocoa -weak_framework Metal"));
    assert!(line.ends_with("-o /p/Binaries/Mac/Game-Core.dylib"));
    assert_eq!(action.prerequisites, vec![objects[0].clone(), deps[0].clone()]);
  }

  #[test]
  fn separate_import_library_is_what_dependents_link() {
    let tc = toolchain(TargetPlatform::Linux);
    let mut dll = binary(BinaryType::DynamicLinkLibrary, "/p/Binaries/Linux/Game-Core.so");
    assert_eq!(tc.link_input(&dll), dll.output_path);

    dll.create_import_library_separately = true;
    let stub = PathBuf::from("/p/Intermediate/Build/Linux/Game/Development/Game-Core.stub.so");
    assert_eq!(tc.link_input(&dll), stub);

    let action = tc.import_library(&dll, &[PathBuf::from("/i/Core/Core.cpp.o")]);
    assert_eq!(action.kind, ActionKind::ImportLibrary);
    assert_eq!(action.produced, vec![stub]);
  }

  #[test]
  fn windows_dll_link_also_produces_its_import_library() {
    let tc = toolchain(TargetPlatform::Win64);
    let dll = binary(BinaryType::DynamicLinkLibrary, "/p/Binaries/Win64/Game-Core.dll");
    let action = tc.link(&dll, &[], &LinkEnvironment::default(), &[]);
    assert_eq!(
      action.produced,
      vec![
        PathBuf::from("/p/Binaries/Win64/Game-Core.dll"),
        PathBuf::from("/p/Intermediate/Build/Linux/Game/Development/Game-Core.lib"),
      ]
    );
  }

  #[test]
  fn static_libraries_are_archived() {
    let tc = toolchain(TargetPlatform::Linux);
    let lib = binary(BinaryType::StaticLibrary, "/p/Binaries/Linux/Game.a");
    let action = tc.archive(&lib, &[PathBuf::from("/i/a.o"), PathBuf::from("/i/b.o")]);
    assert_eq!(action.invocation.command_line(), "ar rcs /p/Binaries/Linux/Game.a /i/a.o /i/b.o");
  }
}
