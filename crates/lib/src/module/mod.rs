//! Module records and the registry that owns them.
//!
//! Modules are created lazily from their rule records the first time a name is
//! referenced, and live in an arena indexed by [`ModuleId`]. Dependency edges
//! are kept as names until first traversed, then materialized into id lists.
//!
//! # Submodules
//!
//! - [`rules`]: declarative module rule records, as produced by the rules loader
//! - [`types`]: the materialized [`Module`] and its supporting enums
//! - [`registry`]: the arena, name lookup and lazy edge materialization

pub mod registry;
pub mod rules;
pub mod types;

pub use registry::ModuleRegistry;
pub use rules::{ModuleRules, PlatformOverride};
pub use types::{CodeOptimization, DependencyKind, Framework, Module, ModuleId, ModuleType, PchUsage};
