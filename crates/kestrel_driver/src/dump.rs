use std::path::Path;

use colored::*;
use kestrel_config::KestrelConfig;
use kestrel_host::HostFile;
use kestrel_lower::{DeclKind, DeclRecord};
use kestrel_type::file::SourceMap;
use serde::Serialize;

/// Serializable form of a [`DeclRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclSummary {
  pub name: String,
  pub kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub receiver: Option<String>,
  pub line: u32,
  pub synthesized: bool,
}

fn kind_name(kind: &DeclKind) -> &'static str {
  match kind {
    DeclKind::Type => "type",
    DeclKind::Const => "const",
    DeclKind::Var => "var",
    DeclKind::Func => "func",
    DeclKind::Method => "method",
    DeclKind::Entry => "entry",
  }
}

pub fn decl_summaries(
  records: &[DeclRecord],
  sm: &SourceMap,
) -> Vec<DeclSummary> {
  records
    .iter()
    .map(|record| {
      let line = if !record.span.is_synthetic() && sm.contains(&record.span.file) {
        sm.line_col(&record.span.file, record.span.start).0
      } else {
        0
      };
      DeclSummary {
        name: record.name.clone(),
        kind: kind_name(&record.kind),
        receiver: record.receiver.clone(),
        line,
        synthesized: record.synthesized,
      }
    })
    .collect()
}

/// One `node -> marker` line per marked node, in node order.
pub fn format_line_map(file: &HostFile) -> String {
  let mut markers: Vec<_> = file.markers.iter().collect();
  markers.sort_by_key(|(id, _)| id.index());

  let mut output = String::new();
  for (id, marker) in markers {
    output.push_str(&format!("{:>6} {}\n", id.index(), marker));
  }
  output
}

/// Write a dump into the configured directory, or to stdout without one.
pub(crate) fn write_dump_output(
  config: &KestrelConfig,
  file_name: &str,
  content: &str,
) -> Result<(), String> {
  let Some(dump_dir) = &config.dump_dir else {
    println!("\n{}", content);
    return Ok(());
  };

  let output_dir = Path::new(dump_dir);
  std::fs::create_dir_all(output_dir)
    .map_err(|e| format!("Failed to create dump directory '{}': {}", output_dir.display(), e))?;

  let output_path = output_dir.join(file_name);
  std::fs::write(&output_path, content)
    .map_err(|e| format!("Failed to write dump file '{}': {}", output_path.display(), e))?;

  if !config.quiet {
    eprintln!("{:indent$}{} {}", "", "dump".dimmed(), output_path.display(), indent = 8);
  }
  Ok(())
}
