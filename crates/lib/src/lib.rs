//! modforge-lib: build orchestration for modular C++ codebases
//!
//! This crate turns a target description (module rules plus target settings)
//! into a set of binaries and the actions that build them:
//! - `module`: module records, materialized lazily into an arena
//! - `resolve`: ordered transitive dependency closures
//! - `binary`: assigns every reachable module to exactly one binary
//! - `environment`: compile and link environments derived from the graph
//! - `pch`: unique and shared precompiled header selection
//! - `codegen`: the reflection code generator and its staleness gate
//! - `toolchain` / `execute`: rendering and running compiler invocations
//! - `target`: the end-to-end pipeline

pub mod binary;
pub mod codegen;
pub mod config;
pub mod consts;
pub mod environment;
pub mod error;
pub mod execute;
pub mod module;
pub mod pch;
pub mod platform;
pub mod resolve;
pub mod target;
pub mod toolchain;
pub mod util;
