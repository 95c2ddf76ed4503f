//! External process invocation.
//!
//! Everything the core runs (header generator, compiler, archiver, linker)
//! goes through a [`ToolRunner`], so planning and gating logic can be tested
//! without spawning processes.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::BuildError;

/// A program, its arguments and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
  pub program: PathBuf,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl ToolInvocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn path_arg(self, path: &Path) -> Self {
    self.arg(path.display().to_string())
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Program and arguments joined for display.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.display().to_string())
      .chain(self.args.iter().cloned())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Exit status and captured output of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }
}

/// Runs external tools to completion.
pub trait ToolRunner {
  fn run(&self, invocation: &ToolInvocation) -> impl Future<Output = Result<ToolOutput, BuildError>> + Send;
}

/// Runs tools as child processes and waits for them to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
  async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, BuildError> {
    info!(cmd = %invocation.command_line(), "running tool");

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args);
    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }

    let output = command
      .output()
      .await
      .map_err(|e| BuildError::io(&invocation.program, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "tool stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "tool stdout");
    }

    // Killed by a signal: no code to report.
    let exit_code = output.status.code().unwrap_or(-1);
    Ok(ToolOutput {
      exit_code,
      stdout,
      stderr,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::shell_cmd;
  use tempfile::TempDir;

  #[tokio::test]
  async fn captures_output_and_exit_code() {
    let ok = SystemRunner.run(&shell_cmd("echo hello")).await.unwrap();
    assert!(ok.success());
    assert_eq!(ok.stdout, "hello");

    let failed = SystemRunner.run(&shell_cmd("exit 3")).await.unwrap();
    assert_eq!(failed.exit_code, 3);
  }

  #[tokio::test]
  async fn runs_in_working_directory() {
    let temp = TempDir::new().unwrap();
    let dir = dunce::canonicalize(temp.path()).unwrap();
    #[cfg(unix)]
    let invocation = shell_cmd("pwd").current_dir(&dir);
    #[cfg(windows)]
    let invocation = shell_cmd("cd").current_dir(&dir);

    let out = SystemRunner.run(&invocation).await.unwrap();
    assert_eq!(dunce::canonicalize(out.stdout.trim()).unwrap(), dir);
  }

  #[tokio::test]
  async fn missing_program_is_io_error() {
    let err = SystemRunner
      .run(&ToolInvocation::new("/definitely/not/a/tool"))
      .await
      .unwrap_err();
    assert!(matches!(err, BuildError::Io { .. }));
  }

  #[test]
  fn command_line_joins_arguments() {
    let invocation = ToolInvocation::new("clang++").args(["-c", "a.cpp"]).arg("-o");
    assert_eq!(invocation.command_line(), "clang++ -c a.cpp -o");
  }
}
