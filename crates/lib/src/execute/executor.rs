//! Sequential, incremental execution of build actions.

use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::BuildError;
use crate::execute::graph::ActionGraph;
use crate::execute::runner::ToolRunner;
use crate::toolchain::Action;
use crate::util::fs::modified;

/// What happened to each action, by description.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSummary {
  pub executed: Vec<String>,
  pub skipped: Vec<String>,
}

/// Whether every produced file exists and is no older than every prerequisite.
pub fn is_up_to_date(action: &Action) -> bool {
  if action.produced.is_empty() {
    return false;
  }
  let Some(oldest_output) = action
    .produced
    .iter()
    .map(|p| modified(p))
    .collect::<Option<Vec<SystemTime>>>()
    .and_then(|times| times.into_iter().min())
  else {
    return false;
  };

  action.prerequisites.iter().all(|p| match modified(p) {
    Some(time) => time <= oldest_output,
    None => false,
  })
}

fn ensure_parent_dirs(paths: &[impl AsRef<Path>]) -> Result<(), BuildError> {
  for path in paths {
    if let Some(parent) = path.as_ref().parent() {
      std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
  }
  Ok(())
}

/// Run `actions` in dependency order, skipping those already up to date.
///
/// An action is re-run whenever one of its dependencies ran. The first
/// failing action aborts execution.
pub async fn execute_actions<R: ToolRunner>(actions: &[Action], runner: &R) -> Result<ExecutionSummary, BuildError> {
  let graph = ActionGraph::new(actions)?;
  let order = graph.order()?;
  info!(actions = actions.len(), "executing actions");

  let mut ran = vec![false; actions.len()];
  let mut summary = ExecutionSummary::default();
  for index in order {
    let action = &actions[index];
    let dependency_ran = graph.dependencies(index).into_iter().any(|d| ran[d]);
    if !dependency_ran && is_up_to_date(action) {
      debug!(action = %action.description, "up to date");
      summary.skipped.push(action.description.clone());
      continue;
    }

    ensure_parent_dirs(&action.produced)?;
    info!(action = %action.description, "running");
    let output = runner.run(&action.invocation).await?;
    if !output.success() {
      error!(
        action = %action.description,
        exit_code = output.exit_code,
        stderr = %output.stderr,
        "action failed"
      );
      return Err(BuildError::ActionFailed {
        action: action.description.clone(),
        exit_code: output.exit_code,
      });
    }
    ran[index] = true;
    summary.executed.push(action.description.clone());
  }

  info!(
    executed = summary.executed.len(),
    skipped = summary.skipped.len(),
    "execution finished"
  );
  Ok(summary)
}
