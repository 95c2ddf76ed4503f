use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration a target is built in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetConfiguration {
  Debug,
  DebugGame,
  #[default]
  Development,
  Test,
  Shipping,
}

/// Configuration the compiler sees for one translation unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileConfiguration {
  Debug,
  #[default]
  Development,
  Shipping,
}

impl TargetConfiguration {
  pub const ALL: [TargetConfiguration; 5] = [
    Self::Debug,
    Self::DebugGame,
    Self::Development,
    Self::Test,
    Self::Shipping,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "Debug",
      Self::DebugGame => "DebugGame",
      Self::Development => "Development",
      Self::Test => "Test",
      Self::Shipping => "Shipping",
    }
  }

  /// Compile configuration used for engine code.
  ///
  /// Game modules in `DebugGame` are switched to `Debug` separately.
  pub fn compile_configuration(&self) -> CompileConfiguration {
    match self {
      Self::Debug => CompileConfiguration::Debug,
      Self::DebugGame | Self::Development => CompileConfiguration::Development,
      Self::Test | Self::Shipping => CompileConfiguration::Shipping,
    }
  }
}

impl fmt::Display for TargetConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for TargetConfiguration {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown configuration: {}", s))
  }
}

impl fmt::Display for CompileConfiguration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Debug => "Debug",
      Self::Development => "Development",
      Self::Shipping => "Shipping",
    };
    write!(f, "{}", s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_game_compiles_engine_code_as_development() {
    assert_eq!(
      TargetConfiguration::DebugGame.compile_configuration(),
      CompileConfiguration::Development
    );
    assert_eq!(
      TargetConfiguration::Test.compile_configuration(),
      CompileConfiguration::Shipping
    );
  }

  #[test]
  fn parses_configuration_names() {
    assert_eq!(
      "debuggame".parse::<TargetConfiguration>().unwrap(),
      TargetConfiguration::DebugGame
    );
    assert!("Profile".parse::<TargetConfiguration>().is_err());
  }
}
