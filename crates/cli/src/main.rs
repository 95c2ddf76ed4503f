use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modforge_lib::error::BuildError;

mod cmd;
mod output;

use output::{OutputFormat, Status, report};

/// modforge - build orchestration for modular C++ targets
#[derive(Parser)]
#[command(name = "modforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate code and build a target
  Build {
    /// Path to the target description (JSON)
    description: PathBuf,

    /// Run the header generator even if generated code is current
    #[arg(long)]
    force_headers: bool,

    /// Plan the build without running any tool
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show binaries, precompiled headers and actions without building
  Plan {
    /// Path to the target description (JSON)
    description: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print a module's dependency closure, dependencies first
  Deps {
    /// Path to the target description (JSON)
    description: PathBuf,

    /// Module to resolve
    module: String,

    /// Include dynamically loaded modules
    #[arg(long)]
    dynamic: bool,

    /// Follow dependencies declared as circular
    #[arg(long)]
    force_circular: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print the compile and link environment of a module
  Env {
    /// Path to the target description (JSON)
    description: PathBuf,

    /// Module to inspect
    module: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("modforge=debug,modforge_lib=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      description,
      force_headers,
      dry_run,
      output,
    } => cmd::cmd_build(&description, force_headers, dry_run, output),
    Commands::Plan { description, output } => cmd::cmd_plan(&description, output),
    Commands::Deps {
      description,
      module,
      dynamic,
      force_circular,
      output,
    } => cmd::cmd_deps(&description, &module, dynamic, force_circular, output),
    Commands::Env {
      description,
      module,
      output,
    } => cmd::cmd_env(&description, &module, output),
  };

  if let Err(err) = result {
    report(Status::Failed, &format!("{:#}", err));
    std::process::exit(exit_code(&err));
  }
}

/// Build errors carry their own exit code; anything else is a plain failure.
fn exit_code(err: &anyhow::Error) -> i32 {
  err
    .chain()
    .find_map(|cause| cause.downcast_ref::<BuildError>())
    .map(BuildError::exit_code)
    .unwrap_or(1)
}
