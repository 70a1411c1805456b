pub mod diagnostic_report;
pub mod message;
pub mod record;

use std::fmt::Write;

use colored::*;
use diagnostic_report::{Diagnostic, Severity};
use kestrel_type::file::SourceMap;

/// Print a diagnostic to stderr.
pub fn render(
  diag: &Diagnostic,
  sm: &SourceMap,
) {
  eprint!("{}", render_to_string(diag, sm));
}

pub fn render_batch(
  diagnostics: &[Diagnostic],
  sm: &SourceMap,
) {
  for diag in diagnostics {
    render(diag, sm);
  }
}

/// Colored multi-line report: header, location, source excerpt, labels, notes.
pub fn render_to_string(
  diag: &Diagnostic,
  sm: &SourceMap,
) -> String {
  let mut out = String::new();
  write_header(&mut out, diag);
  write_body(&mut out, diag, sm);

  for note in &diag.notes {
    let _ = writeln!(out, "  {} {}", "note:".cyan().bold(), note);
  }

  out.push('\n');
  out
}

fn write_header(
  out: &mut String,
  diag: &Diagnostic,
) {
  let message = diag.message.bold();
  let code = diag.error_code.bold();

  let _ = match diag.severity {
    Severity::Info => writeln!(out, "{}[{}]: {}", "Info".blue().bold(), code.blue(), message),
    Severity::Warning => writeln!(out, "{}[{}]: {}", "Warning".yellow().bold(), code.yellow(), message),
    Severity::Error => writeln!(out, "{}[{}]: {}", "Error".red().bold(), code.red().bold(), message),
    Severity::Hint => writeln!(out, "{}[{}]: {}", "Hint".cyan().bold(), code.cyan(), message),
  };
}

fn write_body(
  out: &mut String,
  diag: &Diagnostic,
  sm: &SourceMap,
) {
  let span = &diag.primary_span;
  if !sm.contains(&span.file) {
    return;
  }

  let file = sm.get(&span.file);
  let (line, col) = sm.line_col(&span.file, span.start);
  let (end_line, end_col) = sm.line_col(&span.file, span.end);

  let _ = writeln!(
    out,
    "{:2}{} {}:{}:{}",
    "",
    "-->".blue().bold(),
    file.path.display().to_string().bold(),
    line.to_string().bold(),
    col.to_string().bold(),
  );

  let pipe = "|".blue().bold();
  let lines: Vec<&str> = file.text.lines().collect();
  let line_idx = (line as usize).saturating_sub(1);

  let _ = writeln!(out, "{:3}{:3}", "", pipe);
  if let Some(error_line) = lines.get(line_idx) {
    let _ = writeln!(out, "{:3}{:3}{}", line.to_string().blue().bold(), pipe, error_line);

    let span_len = if line == end_line {
      (end_col.saturating_sub(col)).max(1) as usize
    } else {
      error_line.len().saturating_sub(col as usize).max(1)
    };

    let caret = "^".repeat(span_len).red().bold();
    let _ = writeln!(out, "{:3}{:3}{}{}", "", pipe, " ".repeat((col as usize).saturating_sub(1)), caret);
  }

  for label in &diag.labels {
    if !sm.contains(&label.span.file) {
      continue;
    }
    let (label_line, label_col) = sm.line_col(&label.span.file, label.span.start);
    let _ = writeln!(out, "  {} {}", "label:".yellow().bold(), label.message);

    if let Some(label_text) = lines.get((label_line as usize).saturating_sub(1)) {
      let _ = writeln!(out, "{:3}{:3}{}", label_line.to_string().blue().bold(), pipe, label_text);
      let _ = writeln!(
        out,
        "{:3}{:3}{}{}",
        "",
        pipe,
        " ".repeat((label_col as usize).saturating_sub(1)),
        "^".yellow().bold()
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kestrel_type::{BytePosition, span::Span};
  use message::DiagnosticMessage;

  #[test]
  fn report_names_file_and_position() {
    colored::control::set_override(false);
    let mut sm = SourceMap::new();
    let file = sm.add_file("/foo/bar.gop", "x := 1\ny := foo\n".to_string());
    let diag = DiagnosticMessage::UndeclaredName {
      name: "foo".to_string(),
      span: Span::new(file, BytePosition(12), BytePosition(15)),
    }
    .report();

    let text = render_to_string(&diag, &sm);
    assert!(text.contains("Error[K0001]: undefined: foo"));
    assert!(text.contains("/foo/bar.gop:2:6"));
    assert!(text.contains("^^^"));
  }
}
