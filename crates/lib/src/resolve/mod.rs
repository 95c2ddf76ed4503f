//! Transitive dependency resolution.

pub mod dependencies;

pub use dependencies::{DependencyWalk, all_dependency_modules};
