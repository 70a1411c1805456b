mod common;

use std::fs;

use insta::assert_snapshot;
use kestrel_config::{DumpKind, EntryRole, ErrorPolicy, LowerOptions};
use kestrel_diagnostics::diagnostic_report::Severity;
use kestrel_driver::{find_config_root, load_options, write_output, DriverError, CONFIG_FILE};
use tempfile::TempDir;

#[test]
fn lowers_and_renders() {
  let mut config = common::quiet();
  config.lower.suppress_position_markers = true;

  let unit = match common::run(&config, "/work/hello.gop", "true") {
    Ok(unit) => unit,
    Err(err) => panic!("{}", err),
  };

  assert_snapshot!(unit.source, @r#"
package main

import "fmt"

func main() {
	fmt.Println(true)
}
"#);
  assert!(unit.warnings.is_empty());
  assert_eq!(unit.declarations.len(), 1);
}

#[test]
fn failures_come_back_as_records() {
  let err = match common::run(&common::quiet(), "/work/broken.gop", "missing") {
    Ok(unit) => panic!("expected a failure, got:\n{}", unit.source),
    Err(err) => err,
  };

  let records = match err {
    DriverError::Lowering(records) => records,
    other => panic!("unexpected error: {}", other),
  };
  assert_eq!(records.len(), 1);
  let record = &records[0];
  assert_eq!(record.severity, Severity::Error);
  assert_eq!(record.code, "K0001");
  assert_eq!(record.file, "/work/broken.gop");
  assert_eq!((record.line, record.column), (1, 9));
  assert_eq!(record.source_text, "missing");
}

#[test]
fn finds_the_nearest_config() {
  let dir = TempDir::new().unwrap();
  let nested = dir.path().join("src").join("pkg");
  fs::create_dir_all(&nested).unwrap();
  fs::write(
    dir.path().join(CONFIG_FILE),
    r#"
suppressAutoEntry = true
entryRole = "library-init"
errorPolicy = "halt-on-first"
"#,
  )
  .unwrap();

  assert_eq!(find_config_root(&nested), Some(dir.path().to_path_buf()));

  let options = load_options(&nested).unwrap();
  assert!(options.suppress_auto_entry);
  assert_eq!(options.entry_role, EntryRole::LibraryInit);
  assert_eq!(options.error_policy, ErrorPolicy::HaltOnFirst);
}

#[test]
fn missing_config_means_defaults() {
  let dir = TempDir::new().unwrap();
  // A parent of the temp dir could hold a config; only check when none does.
  if find_config_root(dir.path()).is_none() {
    assert_eq!(load_options(dir.path()).unwrap(), LowerOptions::default());
  }
}

#[test]
fn invalid_config_is_reported() {
  let dir = TempDir::new().unwrap();
  fs::write(dir.path().join(CONFIG_FILE), "entryRole = 3\n").unwrap();

  let err = load_options(dir.path()).unwrap_err();
  assert!(err.to_string().starts_with("invalid config"));
}

#[test]
fn dumps_go_to_the_dump_dir() {
  let dir = TempDir::new().unwrap();
  let mut config = common::quiet();
  config.dump = vec![DumpKind::Host, DumpKind::Decls, DumpKind::LineMap];
  config.dump_dir = Some(dir.path().display().to_string());

  let unit = common::run(&config, "/work/hello.gop", "true").unwrap();

  let host = fs::read_to_string(dir.path().join("dump-host.go")).unwrap();
  assert_eq!(host, unit.source);

  let decls = fs::read_to_string(dir.path().join("dump-decls.json")).unwrap();
  let decls: serde_json::Value = serde_json::from_str(&decls).unwrap();
  assert_eq!(decls[0]["name"], "main");
  assert_eq!(decls[0]["kind"], "entry");
  assert_eq!(decls[0]["synthesized"], true);

  let line_map = fs::read_to_string(dir.path().join("dump-linemap.txt")).unwrap();
  assert!(line_map.contains("//line /work/hello.gop:1\n"));
  assert!(line_map.contains("//line /work/hello.gop:1:1\n"));
}

#[test]
fn writes_output_files() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("out").join("main.go");

  write_output(&path, "package main\n").unwrap();
  assert_eq!(fs::read_to_string(&path).unwrap(), "package main\n");
}
