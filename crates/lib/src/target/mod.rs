//! Targets: what gets built, where it goes, and the pipeline that builds it.
//!
//! # Submodules
//!
//! - [`types`]: [`TargetRules`] and the [`TargetDescription`] input file
//! - [`paths`]: output and intermediate directory layout
//! - [`build`]: the prepare, plan, generate and execute pipeline

pub mod build;
pub mod paths;
pub mod types;

pub use build::{BinaryPlan, BuildOptions, BuildPlan, BuildReport, ModulePlan, TargetBuild};
pub use types::{LinkType, TargetDescription, TargetRules, TargetType};
