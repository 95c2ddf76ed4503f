//! Running the planned actions.
//!
//! # Submodules
//!
//! - [`runner`]: the [`ToolRunner`] capability and its process-backed implementation
//! - [`graph`]: dependency ordering between actions
//! - [`executor`]: sequential, incremental execution

pub mod executor;
pub mod graph;
pub mod runner;

pub use executor::{ExecutionSummary, execute_actions, is_up_to_date};
pub use graph::ActionGraph;
pub use runner::{SystemRunner, ToolInvocation, ToolOutput, ToolRunner};
