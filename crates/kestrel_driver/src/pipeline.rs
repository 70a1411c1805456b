use std::path::Path;

use kestrel_ast::SourceUnit;
use kestrel_config::{ConfigError, DebugTrace, DumpKind, KestrelConfig};
use kestrel_diagnostics::{
  diagnostic_report::Severity,
  record::{to_records, DiagnosticRecord},
};
use kestrel_host::display::HostPrinter;
use kestrel_log::{log_dbg, phase_log, phase_ok, phase_warn, trace_dbg};
use kestrel_lower::{lower_unit, DeclRecord};
use kestrel_type::{file::SourceMap, oracle::TypeOracle, types::TypeStore};

use crate::dump::{decl_summaries, format_line_map, write_dump_output};

/// A unit lowered and rendered to host source.
#[derive(Debug)]
pub struct LoweredUnit {
  pub source: String,
  pub declarations: Vec<DeclRecord>,
  pub warnings: Vec<DiagnosticRecord>,
}

#[derive(Debug)]
pub enum DriverError {
  Config(ConfigError),
  Io { path: String, message: String },
  /// Lowering failed; every diagnostic of the unit, errors first.
  Lowering(Vec<DiagnosticRecord>),
  Dump(String),
}

impl std::fmt::Display for DriverError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      DriverError::Config(err) => write!(f, "{}", err),
      DriverError::Io { path, message } => write!(f, "cannot write '{}': {}", path, message),
      DriverError::Lowering(records) => {
        let errors = records.iter().filter(|r| r.severity == Severity::Error).count();
        write!(f, "lowering failed with {} error(s)", errors)
      },
      DriverError::Dump(message) => write!(f, "{}", message),
    }
  }
}

impl std::error::Error for DriverError {}

impl From<ConfigError> for DriverError {
  fn from(err: ConfigError) -> Self {
    DriverError::Config(err)
  }
}

fn dump_requested(
  config: &KestrelConfig,
  kind: DumpKind,
) -> bool {
  config.dump.contains(&kind)
}

/// Lower `unit`, render it and write the requested dumps.
///
/// Diagnostics are printed to stderr unless `quiet` is set and are also
/// returned as records.
pub fn lower_source_unit(
  config: &KestrelConfig,
  unit: &SourceUnit,
  sources: &SourceMap,
  oracle: &dyn TypeOracle,
  types: &TypeStore,
) -> Result<LoweredUnit, DriverError> {
  let path = if sources.contains(&unit.file) {
    sources.get(&unit.file).path.display().to_string()
  } else {
    String::from("<unit>")
  };
  phase_log!(config, "Lowering... {}", path);
  trace_dbg!(config, DebugTrace::Driver, "{} root(s) in package {}", unit.roots.len(), unit.package);

  let output = match lower_unit(unit, sources, oracle, types, config) {
    Ok(output) => output,
    Err(diagnostics) => {
      if !config.quiet {
        kestrel_diagnostics::render_batch(&diagnostics, sources);
      }
      let records = to_records(&diagnostics, sources);
      phase_warn!(config, "{} failed", path);
      return Err(DriverError::Lowering(records));
    },
  };

  if !config.quiet {
    kestrel_diagnostics::render_batch(&output.warnings, sources);
  }

  let source = HostPrinter::new(&output.file).print();
  log_dbg!(config, "rendered {} bytes of host source", source.len());

  if dump_requested(config, DumpKind::Host) {
    write_dump_output(config, "dump-host.go", &source).map_err(DriverError::Dump)?;
  }

  if dump_requested(config, DumpKind::Decls) {
    let summaries = decl_summaries(&output.declarations, sources);
    let json = serde_json::to_string_pretty(&summaries).map_err(|e| DriverError::Dump(e.to_string()))?;
    write_dump_output(config, "dump-decls.json", &json).map_err(DriverError::Dump)?;
  }

  if dump_requested(config, DumpKind::LineMap) {
    write_dump_output(config, "dump-linemap.txt", &format_line_map(&output.file)).map_err(DriverError::Dump)?;
  }

  phase_ok!(config, "Lowered {} declaration(s)", output.declarations.len());

  Ok(LoweredUnit {
    source,
    declarations: output.declarations,
    warnings: to_records(&output.warnings, sources),
  })
}

/// Write rendered host source, creating parent directories.
pub fn write_output(
  path: &Path,
  source: &str,
) -> Result<(), DriverError> {
  let io_error = |e: std::io::Error| DriverError::Io {
    path: path.display().to_string(),
    message: e.to_string(),
  };

  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).map_err(io_error)?;
  }
  std::fs::write(path, source).map_err(io_error)
}
