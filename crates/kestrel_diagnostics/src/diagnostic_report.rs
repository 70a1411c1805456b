use kestrel_type::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Warning,
  Error,
  Hint,
}

/// Failure classes every diagnostic falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
  UnresolvedReference,
  TypeMismatch,
  AmbiguousInference,
  UnsupportedConstruct,
  RedeclarationConflict,
  /// Accepted input with documented, non-fatal caveats.
  Limitation,
}

#[derive(Debug, Clone)]
pub struct Label {
  pub span: Span,
  pub message: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub severity: Severity,
  pub category: Category,
  pub message: String,
  pub error_code: String,
  pub primary_span: Span,
  pub labels: Vec<Label>,
  pub notes: Vec<String>,
}

impl Diagnostic {
  pub fn new(
    severity: Severity,
    category: Category,
    message: String,
    error_code: String,
    primary_span: Span,
  ) -> Self {
    Self {
      severity,
      category,
      message,
      error_code,
      primary_span,
      labels: Vec::new(),
      notes: Vec::new(),
    }
  }

  pub fn with_label(
    mut self,
    span: Span,
    message: String,
  ) -> Self {
    self.labels.push(Label { span, message });
    self
  }

  pub fn with_note(
    mut self,
    note: String,
  ) -> Self {
    self.notes.push(note);
    self
  }

  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}
