use kestrel_ast::builder::SurfaceBuilder;
use kestrel_config::KestrelConfig;
use kestrel_driver::{lower_source_unit, DriverError, LoweredUnit};
use kestrel_type::{file::SourceMap, oracle::prelude::prelude, types::TypeStore};

/// `println <value>` on line 1 of a unit at `path`.
pub fn hello_unit(
  sources: &mut SourceMap,
  path: &str,
  value: &str,
) -> kestrel_ast::SourceUnit {
  let text = format!("println {}\n", value);
  let mut b = SurfaceBuilder::new(sources, path, &text, "main");
  b.line(1);
  let head = b.ident("println");
  b.at(value);
  let arg = b.ident(value);
  b.line(1);
  let command = b.command(head, vec![arg]);
  let statement = b.expr_stmt(command);
  b.root(statement);
  b.finish()
}

pub fn run(
  config: &KestrelConfig,
  path: &str,
  value: &str,
) -> Result<LoweredUnit, DriverError> {
  let mut sources = SourceMap::new();
  let unit = hello_unit(&mut sources, path, value);
  let mut types = TypeStore::new();
  let oracle = prelude(&mut types);
  lower_source_unit(config, &unit, &sources, &oracle, &types)
}

pub fn quiet() -> KestrelConfig {
  KestrelConfig::new_basic(false, Vec::new(), true, 0)
}
