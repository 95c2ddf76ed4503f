//! Compile and link environments.
//!
//! Environments are derived, never stored on modules: each one is recomputed
//! from a module's dependency closure with a visited set owned by the top-level
//! call, so diamonds contribute once and legal cycles terminate.
//!
//! # Submodules
//!
//! - [`compile`]: include paths, definitions and PCH settings for one module
//! - [`link`]: libraries, frameworks and dependent binaries for one binary

pub mod compile;
pub mod link;

pub use compile::{CompileEnvironment, EnvironmentBuilder, PchAction, PchSettings};
pub use link::LinkEnvironment;
