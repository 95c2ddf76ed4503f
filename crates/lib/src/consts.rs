//! Shared names and file-layout constants.

/// Prefix for environment overrides of the build configuration.
pub const ENV_PREFIX: &str = "MODFORGE_";

/// Marker file left in every generated-code directory after a successful generator run.
pub const TIMESTAMP_FILENAME: &str = "Timestamp";

/// Extension of the manifest handed to the header generator.
pub const MANIFEST_EXTENSION: &str = "uhtmanifest";

/// Subdirectory of the target intermediate directory holding shared precompiled headers.
pub const SHARED_PCH_DIRECTORY: &str = "SharedPCHs";

/// Module name used when emitting shared precompiled headers.
pub const SHARED_PCH_MODULE_NAME: &str = "Shared";

/// Byte marker embedded in generator libraries, followed by the decimal API version.
pub const API_VERSION_MARKER: &[u8] = b"MODFORGE_API_VERSION=";

/// Default name of the header generator executable.
pub const DEFAULT_HEADER_TOOL: &str = "UnrealHeaderTool";

/// Default baseline module whose generated code gates every other module.
pub const DEFAULT_BASELINE_MODULE: &str = "CoreUObject";

/// Suffix of the generated translation unit emitted per reflected module.
pub const GENERATED_CPP_SUFFIX: &str = ".generated.cpp";

/// Directory segment identifying a binaries tree.
pub const BINARIES_DIR: &str = "Binaries";

/// Directory segment identifying an intermediate tree.
pub const INTERMEDIATE_DIR: &str = "Intermediate";
