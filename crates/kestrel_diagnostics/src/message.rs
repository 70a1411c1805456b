use std::fmt;

use kestrel_type::span::Span;

use super::diagnostic_report::{Category, Diagnostic, Severity};

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticMessage {
  // #region UnresolvedReference
  UndeclaredName {
    name: String,
    span: Span,
  },
  UnknownMember {
    owner: String,
    name: String,
    span: Span,
  },
  // #endregion UnresolvedReference
  // #region TypeMismatch
  TypeMismatch {
    expected: String,
    got: String,
    span: Span,
  },
  LiteralClassConflict {
    shape: String,
    element: String,
    span: Span,
  },
  ArgumentCountMismatch {
    expected: usize,
    got: usize,
    span: Span,
  },
  AssignmentCountMismatch {
    left: usize,
    right: usize,
    span: Span,
  },
  LambdaArityMismatch {
    expected: usize,
    got: usize,
    span: Span,
  },
  ResultCountMismatch {
    expected: usize,
    got: usize,
    span: Span,
  },
  NotCallable {
    text: String,
    span: Span,
  },
  MissingErrorResult {
    text: String,
    span: Span,
  },
  ReturnWrapOutsideErrorFunction {
    span: Span,
  },
  NotAType {
    name: String,
    span: Span,
  },
  NotAValue {
    name: String,
    span: Span,
  },
  ConstantOverflow {
    text: String,
    span: Span,
  },
  InvalidOperation {
    op: String,
    ty: String,
    span: Span,
  },
  NoNewVariables {
    span: Span,
  },
  // #endregion TypeMismatch
  // #region AmbiguousInference
  LambdaWithoutContext {
    span: Span,
  },
  EmptyLiteralWithoutContext {
    span: Span,
  },
  UntypedNil {
    span: Span,
  },
  // #endregion AmbiguousInference
  // #region UnsupportedConstruct
  NotEnumerable {
    ty: String,
    span: Span,
  },
  UnsupportedConstruct {
    what: String,
    span: Span,
  },
  YieldOverPushIterator {
    span: Span,
  },
  RangeAssignOverIterator {
    span: Span,
  },
  // #endregion UnsupportedConstruct
  // #region RedeclarationConflict
  Redeclared {
    name: String,
    span: Span,
    previous_span: Span,
  },
  DuplicateEntry {
    name: String,
    span: Span,
    previous_span: Span,
  },
  StatementsWithExplicitEntry {
    name: String,
    span: Span,
    entry_span: Span,
  },
  InitializationCycle {
    name: String,
    span: Span,
  },
  // #endregion RedeclarationConflict
  // #region Limitations
  LoopControlInCallback {
    keyword: String,
    span: Span,
  },
  // #endregion Limitations
}

impl fmt::Display for DiagnosticMessage {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      DiagnosticMessage::UndeclaredName { name, .. } => write!(f, "undefined: {}", name),
      DiagnosticMessage::UnknownMember { owner, name, .. } => {
        write!(f, "{}.{} undefined (no field, method or accessor named {})", owner, name, name)
      },
      DiagnosticMessage::TypeMismatch { expected, got, .. } => {
        write!(f, "cannot use value of type {} as {}", got, expected)
      },
      DiagnosticMessage::LiteralClassConflict { shape, element, .. } => {
        write!(f, "literal element of type {} does not fit {}", element, shape)
      },
      DiagnosticMessage::ArgumentCountMismatch { expected, got, .. } => {
        write!(f, "wrong argument count: expected {}, got {}", expected, got)
      },
      DiagnosticMessage::AssignmentCountMismatch { left, right, .. } => {
        write!(f, "assignment mismatch: {} variables but {} values", left, right)
      },
      DiagnosticMessage::LambdaArityMismatch { expected, got, .. } => {
        write!(f, "lambda has {} parameters, its expected type takes {}", got, expected)
      },
      DiagnosticMessage::ResultCountMismatch { expected, got, .. } => {
        write!(f, "expected {} results, got {}", expected, got)
      },
      DiagnosticMessage::NotCallable { text, .. } => write!(f, "{} is not callable", text),
      DiagnosticMessage::MissingErrorResult { text, .. } => {
        write!(f, "{} does not return an error as its last result", text)
      },
      DiagnosticMessage::ReturnWrapOutsideErrorFunction { .. } => {
        write!(f, "'?' used in a function whose last result is not error")
      },
      DiagnosticMessage::NotAType { name, .. } => write!(f, "{} is not a type", name),
      DiagnosticMessage::NotAValue { name, .. } => write!(f, "{} is not a value", name),
      DiagnosticMessage::ConstantOverflow { text, .. } => write!(f, "constant {} overflows", text),
      DiagnosticMessage::InvalidOperation { op, ty, .. } => {
        write!(f, "invalid operation: operator {} not defined on {}", op, ty)
      },
      DiagnosticMessage::NoNewVariables { .. } => write!(f, "no new variables on left side of :="),
      DiagnosticMessage::LambdaWithoutContext { .. } => {
        write!(f, "cannot infer lambda type without an expected function type")
      },
      DiagnosticMessage::EmptyLiteralWithoutContext { .. } => {
        write!(f, "cannot infer the type of an empty literal without context")
      },
      DiagnosticMessage::UntypedNil { .. } => write!(f, "use of untyped nil"),
      DiagnosticMessage::NotEnumerable { ty, .. } => write!(f, "cannot range over value of type {}", ty),
      DiagnosticMessage::UnsupportedConstruct { what, .. } => write!(f, "unsupported construct: {}", what),
      DiagnosticMessage::YieldOverPushIterator { .. } => {
        write!(f, "exists/select comprehension over a callback-style iterator")
      },
      DiagnosticMessage::RangeAssignOverIterator { .. } => {
        write!(f, "range with '=' over a user-defined iterator")
      },
      DiagnosticMessage::Redeclared { name, .. } => write!(f, "{} redeclared in this block", name),
      DiagnosticMessage::DuplicateEntry { name, .. } => write!(f, "func {} declared more than once", name),
      DiagnosticMessage::StatementsWithExplicitEntry { name, .. } => {
        write!(f, "top-level statements conflict with the declared func {}", name)
      },
      DiagnosticMessage::InitializationCycle { name, .. } => write!(f, "initialization cycle for {}", name),
      DiagnosticMessage::LoopControlInCallback { keyword, .. } => {
        write!(f, "{} inside a callback-style iteration body does not affect the loop", keyword)
      },
    }
  }
}

impl DiagnosticMessage {
  pub fn primary_span(&self) -> Span {
    match self {
      DiagnosticMessage::UndeclaredName { span, .. }
      | DiagnosticMessage::UnknownMember { span, .. }
      | DiagnosticMessage::TypeMismatch { span, .. }
      | DiagnosticMessage::LiteralClassConflict { span, .. }
      | DiagnosticMessage::ArgumentCountMismatch { span, .. }
      | DiagnosticMessage::AssignmentCountMismatch { span, .. }
      | DiagnosticMessage::LambdaArityMismatch { span, .. }
      | DiagnosticMessage::ResultCountMismatch { span, .. }
      | DiagnosticMessage::NotCallable { span, .. }
      | DiagnosticMessage::MissingErrorResult { span, .. }
      | DiagnosticMessage::ReturnWrapOutsideErrorFunction { span }
      | DiagnosticMessage::NotAType { span, .. }
      | DiagnosticMessage::NotAValue { span, .. }
      | DiagnosticMessage::ConstantOverflow { span, .. }
      | DiagnosticMessage::InvalidOperation { span, .. }
      | DiagnosticMessage::NoNewVariables { span }
      | DiagnosticMessage::LambdaWithoutContext { span }
      | DiagnosticMessage::EmptyLiteralWithoutContext { span }
      | DiagnosticMessage::UntypedNil { span }
      | DiagnosticMessage::NotEnumerable { span, .. }
      | DiagnosticMessage::UnsupportedConstruct { span, .. }
      | DiagnosticMessage::YieldOverPushIterator { span }
      | DiagnosticMessage::RangeAssignOverIterator { span }
      | DiagnosticMessage::Redeclared { span, .. }
      | DiagnosticMessage::DuplicateEntry { span, .. }
      | DiagnosticMessage::StatementsWithExplicitEntry { span, .. }
      | DiagnosticMessage::InitializationCycle { span, .. }
      | DiagnosticMessage::LoopControlInCallback { span, .. } => span.clone(),
    }
  }

  pub fn code(&self) -> String {
    match self {
      DiagnosticMessage::UndeclaredName { .. } => "K0001",
      DiagnosticMessage::UnknownMember { .. } => "K0002",
      DiagnosticMessage::TypeMismatch { .. } => "K0100",
      DiagnosticMessage::LiteralClassConflict { .. } => "K0101",
      DiagnosticMessage::ArgumentCountMismatch { .. } => "K0102",
      DiagnosticMessage::AssignmentCountMismatch { .. } => "K0103",
      DiagnosticMessage::LambdaArityMismatch { .. } => "K0104",
      DiagnosticMessage::ResultCountMismatch { .. } => "K0105",
      DiagnosticMessage::NotCallable { .. } => "K0106",
      DiagnosticMessage::MissingErrorResult { .. } => "K0107",
      DiagnosticMessage::ReturnWrapOutsideErrorFunction { .. } => "K0108",
      DiagnosticMessage::NotAType { .. } => "K0109",
      DiagnosticMessage::NotAValue { .. } => "K0110",
      DiagnosticMessage::ConstantOverflow { .. } => "K0111",
      DiagnosticMessage::InvalidOperation { .. } => "K0112",
      DiagnosticMessage::NoNewVariables { .. } => "K0113",
      DiagnosticMessage::LambdaWithoutContext { .. } => "K0200",
      DiagnosticMessage::EmptyLiteralWithoutContext { .. } => "K0201",
      DiagnosticMessage::UntypedNil { .. } => "K0202",
      DiagnosticMessage::NotEnumerable { .. } => "K0300",
      DiagnosticMessage::UnsupportedConstruct { .. } => "K0301",
      DiagnosticMessage::YieldOverPushIterator { .. } => "K0302",
      DiagnosticMessage::RangeAssignOverIterator { .. } => "K0303",
      DiagnosticMessage::Redeclared { .. } => "K0400",
      DiagnosticMessage::DuplicateEntry { .. } => "K0401",
      DiagnosticMessage::StatementsWithExplicitEntry { .. } => "K0402",
      DiagnosticMessage::InitializationCycle { .. } => "K0403",
      DiagnosticMessage::LoopControlInCallback { .. } => "K0900",
    }
    .to_string()
  }

  pub fn category(&self) -> Category {
    match self {
      DiagnosticMessage::UndeclaredName { .. } | DiagnosticMessage::UnknownMember { .. } => {
        Category::UnresolvedReference
      },
      DiagnosticMessage::LambdaWithoutContext { .. }
      | DiagnosticMessage::EmptyLiteralWithoutContext { .. }
      | DiagnosticMessage::UntypedNil { .. } => Category::AmbiguousInference,
      DiagnosticMessage::NotEnumerable { .. }
      | DiagnosticMessage::UnsupportedConstruct { .. }
      | DiagnosticMessage::YieldOverPushIterator { .. }
      | DiagnosticMessage::RangeAssignOverIterator { .. } => Category::UnsupportedConstruct,
      DiagnosticMessage::Redeclared { .. }
      | DiagnosticMessage::DuplicateEntry { .. }
      | DiagnosticMessage::StatementsWithExplicitEntry { .. }
      | DiagnosticMessage::InitializationCycle { .. } => Category::RedeclarationConflict,
      DiagnosticMessage::LoopControlInCallback { .. } => Category::Limitation,
      _ => Category::TypeMismatch,
    }
  }

  pub fn level(&self) -> Severity {
    match self {
      DiagnosticMessage::LoopControlInCallback { .. } => Severity::Warning,
      _ => Severity::Error,
    }
  }

  fn secondary_labels(&self) -> Vec<(Span, String)> {
    match self {
      DiagnosticMessage::Redeclared { previous_span, .. } | DiagnosticMessage::DuplicateEntry { previous_span, .. } => {
        vec![(previous_span.clone(), "previous declaration here".to_string())]
      },
      DiagnosticMessage::StatementsWithExplicitEntry { entry_span, .. } => {
        vec![(entry_span.clone(), "entry function declared here".to_string())]
      },
      _ => vec![],
    }
  }

  fn notes(&self) -> Vec<String> {
    match self {
      DiagnosticMessage::NotEnumerable { .. } => vec![
        "a user type is enumerable through Gop_Enum(func(...)) or Gop_Enum() returning a cursor with Next()".to_string(),
      ],
      DiagnosticMessage::LoopControlInCallback { .. } => {
        vec!["the loop body runs as a callback; return from it to skip an element".to_string()]
      },
      _ => vec![],
    }
  }

  pub fn report(&self) -> Diagnostic {
    let mut diagnostic = Diagnostic::new(
      self.level(),
      self.category(),
      self.to_string(),
      self.code(),
      self.primary_span(),
    );
    for (span, message) in self.secondary_labels() {
      diagnostic = diagnostic.with_label(span, message);
    }
    for note in self.notes() {
      diagnostic = diagnostic.with_note(note);
    }
    diagnostic
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reports_carry_code_and_category() {
    let message = DiagnosticMessage::UndeclaredName {
      name: "foo".to_string(),
      span: Span::synthetic(),
    };
    let report = message.report();

    assert_eq!(report.error_code, "K0001");
    assert_eq!(report.category, Category::UnresolvedReference);
    assert_eq!(report.message, "undefined: foo");
    assert!(report.is_error());
  }

  #[test]
  fn redeclarations_point_at_previous_site() {
    let report = DiagnosticMessage::DuplicateEntry {
      name: "main".to_string(),
      span: Span::synthetic(),
      previous_span: Span::synthetic(),
    }
    .report();

    assert_eq!(report.category, Category::RedeclarationConflict);
    assert_eq!(report.labels.len(), 1);
  }

  #[test]
  fn loop_control_is_only_a_warning() {
    let report = DiagnosticMessage::LoopControlInCallback {
      keyword: "break".to_string(),
      span: Span::synthetic(),
    }
    .report();

    assert_eq!(report.severity, Severity::Warning);
    assert!(!report.notes.is_empty());
  }
}
