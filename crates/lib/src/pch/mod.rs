//! Precompiled header selection.
//!
//! # Submodules
//!
//! - [`includes`]: include directive scanning and resolution
//! - [`select`]: unique and shared PCH selection per module

pub mod includes;
pub mod select;

pub use includes::IncludeScanner;
pub use select::{
  ModulePch, PchDecision, PchSelector, SharedPchEnvironment, SharedPchTier, SourceFile, collect_tiers, pch_file_name,
};
