use kestrel_type::file::SourceMap;
use serde::Serialize;

use crate::diagnostic_report::{Category, Diagnostic, Severity};

/// Flat, position-resolved form of a [`Diagnostic`] for tools and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
  pub severity: Severity,
  pub category: Category,
  pub code: String,
  pub file: String,
  pub line: u32,
  pub column: u32,
  pub message: String,
  /// The original source text the diagnostic points at.
  pub source_text: String,
}

impl DiagnosticRecord {
  pub fn from_diagnostic(
    diag: &Diagnostic,
    sm: &SourceMap,
  ) -> Self {
    let span = &diag.primary_span;
    let (file, line, column) = if sm.contains(&span.file) {
      let (line, column) = sm.line_col(&span.file, span.start);
      (sm.get(&span.file).path.display().to_string(), line, column)
    } else {
      (String::new(), 0, 0)
    };

    Self {
      severity: diag.severity,
      category: diag.category,
      code: diag.error_code.clone(),
      file,
      line,
      column,
      message: diag.message.clone(),
      source_text: sm.slice(span).to_string(),
    }
  }
}

impl std::fmt::Display for DiagnosticRecord {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    let severity = match self.severity {
      Severity::Info => "info",
      Severity::Warning => "warning",
      Severity::Error => "error",
      Severity::Hint => "hint",
    };
    write!(f, "{}:{}:{}: {}[{}]: {}", self.file, self.line, self.column, severity, self.code, self.message)
  }
}

pub fn to_records(
  diagnostics: &[Diagnostic],
  sm: &SourceMap,
) -> Vec<DiagnosticRecord> {
  diagnostics
    .iter()
    .map(|d| DiagnosticRecord::from_diagnostic(d, sm))
    .collect()
}

pub fn to_json(records: &[DiagnosticRecord]) -> serde_json::Result<String> {
  serde_json::to_string_pretty(records)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::DiagnosticMessage;
  use kestrel_type::{BytePosition, span::Span};

  #[test]
  fn records_resolve_line_and_text() {
    let mut sm = SourceMap::new();
    let file = sm.add_file("/foo/bar.gop", "println []\n".to_string());
    let diag = DiagnosticMessage::EmptyLiteralWithoutContext {
      span: Span::new(file, BytePosition(8), BytePosition(10)),
    }
    .report();

    let record = DiagnosticRecord::from_diagnostic(&diag, &sm);
    assert_eq!((record.line, record.column), (1, 9));
    assert_eq!(record.source_text, "[]");
    assert_eq!(record.to_string(), format!("/foo/bar.gop:1:9: error[K0201]: {}", diag.message));

    let json = to_json(&[record]).unwrap();
    assert!(json.contains("\"category\": \"AmbiguousInference\""));
    assert!(json.contains("\"severity\": \"error\""));
  }
}
