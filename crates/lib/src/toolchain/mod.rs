//! Rendering build steps into tool invocations.
//!
//! # Submodules
//!
//! - [`action`]: the [`Action`] record executed by [`crate::execute`]
//! - [`clang`]: clang-style command lines for compiling, archiving and linking

pub mod action;
pub mod clang;

pub use action::{Action, ActionKind};
pub use clang::Toolchain;
