use kestrel_ast::builder::SurfaceBuilder;
use kestrel_config::{KestrelConfig, LowerOptions};
use kestrel_diagnostics::diagnostic_report::{Diagnostic, Severity};
use kestrel_host::display::HostPrinter;
use kestrel_lower::{lower_unit, LowerOutput};
use kestrel_type::{file::SourceMap, oracle::prelude::prelude, types::TypeStore};

pub const PATH: &str = "/foo/bar.gop";

/// Build a unit over `text` with `build` and lower it against the prelude.
pub fn lower_with(
  text: &str,
  options: LowerOptions,
  build: impl FnOnce(&mut SurfaceBuilder),
) -> Result<LowerOutput, Vec<Diagnostic>> {
  let mut sources = SourceMap::new();
  let mut builder = SurfaceBuilder::new(&mut sources, PATH, text, "main");
  build(&mut builder);
  let unit = builder.finish();

  let mut types = TypeStore::new();
  let oracle = prelude(&mut types);
  let config = KestrelConfig::default().with_lower(options);

  lower_unit(&unit, &sources, &oracle, &types, &config)
}

pub fn lower(
  text: &str,
  build: impl FnOnce(&mut SurfaceBuilder),
) -> Result<LowerOutput, Vec<Diagnostic>> {
  lower_with(text, LowerOptions::default(), build)
}

pub fn render(output: &LowerOutput) -> String {
  HostPrinter::new(&output.file).print()
}

/// Lower and render, failing the test on any error.
#[allow(dead_code)]
pub fn lower_ok(
  text: &str,
  build: impl FnOnce(&mut SurfaceBuilder),
) -> String {
  match lower(text, build) {
    Ok(output) => render(&output),
    Err(diagnostics) => panic!("Expected no errors, got: {}", format_diagnostics(&diagnostics)),
  }
}

#[allow(dead_code)]
pub fn lower_ok_with(
  text: &str,
  options: LowerOptions,
  build: impl FnOnce(&mut SurfaceBuilder),
) -> String {
  match lower_with(text, options, build) {
    Ok(output) => render(&output),
    Err(diagnostics) => panic!("Expected no errors, got: {}", format_diagnostics(&diagnostics)),
  }
}

/// Error codes of a unit expected to fail.
#[allow(dead_code)]
pub fn lower_err(
  text: &str,
  build: impl FnOnce(&mut SurfaceBuilder),
) -> Vec<String> {
  match lower(text, build) {
    Ok(output) => panic!("Expected errors, got:\n{}", render(&output)),
    Err(diagnostics) => diagnostics
      .iter()
      .filter(|d| matches!(d.severity, Severity::Error))
      .map(|d| d.error_code.clone())
      .collect(),
  }
}

/// Assert the unit fails with every code of `expected`.
#[allow(dead_code)]
pub fn assert_err(
  text: &str,
  expected: &[&str],
  build: impl FnOnce(&mut SurfaceBuilder),
) {
  let actual = lower_err(text, build);
  for code in expected {
    assert!(
      actual.iter().any(|c| c == code),
      "Expected error code {} not found. Got: {:?}",
      code,
      actual
    );
  }
}

pub fn format_diagnostics(diags: &[Diagnostic]) -> String {
  if diags.is_empty() {
    return "(no diagnostics)".to_string();
  }

  let mut output = String::new();
  for diag in diags {
    let severity = match diag.severity {
      Severity::Error => "ERROR",
      Severity::Warning => "WARN",
      Severity::Info => "INFO",
      Severity::Hint => "HINT",
    };
    output.push_str(&format!("{} {}: {}\n", severity, diag.error_code, diag.message));
  }
  output
}
