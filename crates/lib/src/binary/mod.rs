//! Binaries and the binder that assigns modules to them.
//!
//! # Submodules
//!
//! - [`types`]: [`Binary`] records and the [`BinarySet`] that owns them
//! - [`bind`]: walks the module graph and binds every reachable module

pub mod bind;
pub mod types;

pub use bind::{Binder, bind_target};
pub use types::{Binary, BinaryId, BinarySet, BinaryType};
