//! Progress and debug output for the lowering pipeline.
//!
//! - `phase_log!`, `phase_ok!`, `phase_warn!`: arrows for pipeline phases
//! - `trace_dbg!`: per-component traces, enabled by `debug` or `debug_trace`
//! - `log_dbg!`, `log_trc!`: verbosity-gated messages
//!
//! Everything is written to stderr so rendered host code on stdout stays clean.

use kestrel_config::{DebugTrace, KestrelConfig};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Phase,
  Info,
  Debug,
  Trace,
}

pub fn effective_verbose(config: &KestrelConfig) -> u8 {
  if config.quiet {
    return 0;
  }

  if config.debug && config.verbose < 2 {
    return 2;
  }

  config.verbose
}

pub fn enabled(
  config: &KestrelConfig,
  level: Level,
) -> bool {
  match level {
    Level::Phase => !config.quiet,
    Level::Info => effective_verbose(config) >= 1,
    Level::Debug => effective_verbose(config) >= 2,
    Level::Trace => effective_verbose(config) >= 3,
  }
}

pub fn debug_trace_enabled(
  config: &KestrelConfig,
  trace: DebugTrace,
) -> bool {
  !config.quiet && (config.debug || config.debug_trace.contains(&trace))
}

pub fn trace_name(trace: DebugTrace) -> &'static str {
  match trace {
    DebugTrace::Collector => "collector",
    DebugTrace::Literal => "literal",
    DebugTrace::Dispatch => "dispatch",
    DebugTrace::Desugar => "desugar",
    DebugTrace::LineMap => "linemap",
    DebugTrace::Oracle => "oracle",
    DebugTrace::Driver => "driver",
  }
}

/// Parse a `--trace` style category name.
pub fn parse_trace(name: &str) -> Option<DebugTrace> {
  match name {
    "collector" => Some(DebugTrace::Collector),
    "literal" => Some(DebugTrace::Literal),
    "dispatch" => Some(DebugTrace::Dispatch),
    "desugar" => Some(DebugTrace::Desugar),
    "linemap" => Some(DebugTrace::LineMap),
    "oracle" => Some(DebugTrace::Oracle),
    "driver" => Some(DebugTrace::Driver),
    _ => None,
  }
}

/// Phase message with a green arrow.
///
/// ```ignore
/// phase_log!(&config, "Lowering {}", path);
/// phase_log!(&config, indent = 8, "collected {} declarations", n);
/// ```
#[macro_export]
macro_rules! phase_log {
  ($config:expr, indent = $indent:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::enabled($config, $crate::Level::Phase) {
      use colored::Colorize;
      eprintln!(
        "{:indent$}{} {}",
        "",
        "-->".bright_green().bold(),
        format!($fmt $(, $arg)*),
        indent = $indent
      );
    }
  }};

  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    $crate::phase_log!($config, indent = 4, $fmt $(, $arg)*);
  }};
}

/// Phase completion, no indent.
#[macro_export]
macro_rules! phase_ok {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::enabled($config, $crate::Level::Phase) {
      use colored::Colorize;
      eprintln!("{} {}", "-->".bright_green().bold(), format!($fmt $(, $arg)*));
    }
  }};
}

/// Phase warning with a yellow arrow.
#[macro_export]
macro_rules! phase_warn {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::enabled($config, $crate::Level::Phase) {
      use colored::Colorize;
      eprintln!("{} {}", "-->".bright_yellow().bold(), format!($fmt $(, $arg)*));
    }
  }};
}

/// Component trace, printed as `debug[component]: message`.
///
/// ```ignore
/// trace_dbg!(&config, DebugTrace::Dispatch, "{} lowered to {}", op, method);
/// ```
#[macro_export]
macro_rules! trace_dbg {
  ($config:expr, $trace:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::debug_trace_enabled($config, $trace) {
      eprintln!(
        "debug[{}]: {}",
        $crate::trace_name($trace),
        format!($fmt $(, $arg)*)
      );
    }
  }};
}

/// Verbose message (verbosity >= 2).
#[macro_export]
macro_rules! log_dbg {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::enabled($config, $crate::Level::Debug) {
      eprintln!("debug: {}", format!($fmt $(, $arg)*));
    }
  }};
}

/// Trace message (verbosity >= 3).
#[macro_export]
macro_rules! log_trc {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::enabled($config, $crate::Level::Trace) {
      eprintln!("trace: {}", format!($fmt $(, $arg)*));
    }
  }};
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_implies_debug_level() {
    let config = KestrelConfig::new_basic(true, Vec::new(), false, 0);
    assert!(enabled(&config, Level::Debug));
    assert!(!enabled(&config, Level::Trace));
    assert!(debug_trace_enabled(&config, DebugTrace::Dispatch));
  }

  #[test]
  fn quiet_silences_everything() {
    let config = KestrelConfig::new_basic(true, vec![DebugTrace::Literal], true, 3);
    assert!(!enabled(&config, Level::Phase));
    assert!(!debug_trace_enabled(&config, DebugTrace::Literal));
  }

  #[test]
  fn trace_names_round_trip() {
    for trace in [DebugTrace::Collector, DebugTrace::LineMap, DebugTrace::Driver] {
      assert_eq!(parse_trace(trace_name(trace)), Some(trace));
    }
  }
}
