//! Target platforms and build configurations.
//!
//! # Submodules
//!
//! - [`target`]: platforms a target can be built for, with their binary naming rules
//! - [`configuration`]: target configurations and the compile configuration they map to

pub mod configuration;
pub mod target;

pub use configuration::{CompileConfiguration, TargetConfiguration};
pub use target::{TargetPlatform, UnknownPlatform};
