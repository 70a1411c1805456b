use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which entry function bare top-level statements are collected into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryRole {
  /// `func main()` of an executable package.
  #[default]
  Executable,
  /// `func init()` of a library package.
  LibraryInit,
}

impl EntryRole {
  pub fn function_name(&self) -> &'static str {
    match self {
      EntryRole::Executable => "main",
      EntryRole::LibraryInit => "init",
    }
  }
}

/// What happens after a top-level declaration fails to lower.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
  /// Keep lowering the remaining declarations to collect every diagnostic.
  #[default]
  Batch,
  /// Stop at the first failing declaration.
  HaltOnFirst,
}

/// Options recognized by the lowering engine.
///
/// Expected format in a `kestrel.toml`:
/// ```toml
/// suppressPositionMarkers = false
/// suppressAutoEntry = true
/// relativeBasePath = "/work/project"
/// entryRole = "library-init"
/// errorPolicy = "halt-on-first"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LowerOptions {
  /// Emit no `//line` markers at all.
  pub suppress_position_markers: bool,
  /// Do not synthesize an empty entry function when there are no bare statements.
  pub suppress_auto_entry: bool,
  /// Rewrite marker paths relative to this directory.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub relative_base_path: Option<String>,
  pub entry_role: EntryRole,
  pub error_policy: ErrorPolicy,
}

impl LowerOptions {
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    Self::from_toml_str(&text)
  }

  pub fn to_toml_string(&self) -> Result<String, ConfigError> {
    toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  Io { path: String, message: String },
  Parse(String),
  Serialize(String),
}

impl std::fmt::Display for ConfigError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      ConfigError::Io { path, message } => write!(f, "cannot read config '{}': {}", path, message),
      ConfigError::Parse(message) => write!(f, "invalid config: {}", message),
      ConfigError::Serialize(message) => write!(f, "cannot serialize config: {}", message),
    }
  }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DumpKind {
  /// Rendered host source.
  Host,
  /// Declaration records in canonical order.
  Decls,
  /// Generated node to source position table.
  LineMap,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugTrace {
  Collector,
  Literal,
  Dispatch,
  Desugar,
  LineMap,
  Oracle,
  Driver,
}

/// Controls the verbosity level of progress output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OutputLevel {
  Quiet,
  #[default]
  Detailed,
  Verbose,
}

#[derive(Debug, Clone, Default)]
pub struct KestrelConfig {
  pub lower: LowerOptions,
  pub dump: Vec<DumpKind>,
  /// Dumps go to files here instead of stdout.
  pub dump_dir: Option<String>,
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub quiet: bool,
  pub verbose: u8,
  pub output_level: OutputLevel,
}

impl KestrelConfig {
  pub fn new_basic(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
  ) -> Self {
    let output_level = if quiet {
      OutputLevel::Quiet
    } else if verbose > 0 {
      OutputLevel::Verbose
    } else {
      OutputLevel::Detailed
    };

    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      output_level,
      ..Self::default()
    }
  }

  pub fn with_lower(
    mut self,
    lower: LowerOptions,
  ) -> Self {
    self.lower = lower;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_camel_case_options() {
    let options = LowerOptions::from_toml_str(
      r#"
suppressPositionMarkers = true
relativeBasePath = "/foo/root"
entryRole = "library-init"
"#,
    )
    .unwrap();

    assert!(options.suppress_position_markers);
    assert!(!options.suppress_auto_entry);
    assert_eq!(options.relative_base_path.as_deref(), Some("/foo/root"));
    assert_eq!(options.entry_role, EntryRole::LibraryInit);
    assert_eq!(options.error_policy, ErrorPolicy::Batch);
  }

  #[test]
  fn rejects_unknown_roles() {
    let err = LowerOptions::from_toml_str("entryRole = \"plugin\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }

  #[test]
  fn options_survive_serialization() {
    let options = LowerOptions {
      suppress_auto_entry: true,
      error_policy: ErrorPolicy::HaltOnFirst,
      ..LowerOptions::default()
    };
    let text = options.to_toml_string().unwrap();

    assert!(text.contains("errorPolicy = \"halt-on-first\""));
    assert_eq!(LowerOptions::from_toml_str(&text).unwrap(), options);
  }

  #[test]
  fn quiet_wins_over_verbose() {
    let config = KestrelConfig::new_basic(false, Vec::new(), true, 3);
    assert_eq!(config.output_level, OutputLevel::Quiet);
    assert_eq!(EntryRole::LibraryInit.function_name(), "init");
  }
}
