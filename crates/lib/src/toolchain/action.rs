use std::path::PathBuf;

use serde::Serialize;

use crate::execute::ToolInvocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
  CreatePch,
  Compile,
  Archive,
  ImportLibrary,
  Link,
}

/// One tool invocation and the files it reads and writes.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
  pub kind: ActionKind,
  /// Short human readable summary, e.g. `Compile Engine.cpp`.
  pub description: String,
  pub invocation: ToolInvocation,
  pub prerequisites: Vec<PathBuf>,
  pub produced: Vec<PathBuf>,
}
