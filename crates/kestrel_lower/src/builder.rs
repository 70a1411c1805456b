//! Declaration records and the output buckets they are emitted into.
//!
//! Slots are reserved while the unit is collected, so emission order is
//! first appearance within each kind no matter in which order the
//! declarations are lowered afterwards.

use std::collections::HashMap;

use indexmap::IndexMap;
use kestrel_ast::NodeId;
use kestrel_host::{HostFile, HostId};
use kestrel_type::span::Span;

use crate::naming::BLANK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
  Type,
  Const,
  Var,
  Func,
  Method,
  /// The synthesized entry function.
  Entry,
}

impl DeclKind {
  fn bucket(&self) -> usize {
    match self {
      DeclKind::Type => 0,
      DeclKind::Const | DeclKind::Var => 1,
      DeclKind::Func | DeclKind::Method => 2,
      DeclKind::Entry => 3,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclRecord {
  pub name: String,
  pub kind: DeclKind,
  /// Receiver type name of a method.
  pub receiver: Option<String>,
  pub span: Span,
  pub synthesized: bool,
}

impl DeclRecord {
  pub fn new(
    name: &str,
    kind: DeclKind,
    span: Span,
  ) -> Self {
    Self {
      name: name.to_string(),
      kind,
      receiver: None,
      span,
      synthesized: false,
    }
  }

  pub fn method(
    receiver: &str,
    name: &str,
    span: Span,
  ) -> Self {
    Self {
      name: name.to_string(),
      kind: DeclKind::Method,
      receiver: Some(receiver.to_string()),
      span,
      synthesized: false,
    }
  }

  /// `_` and plain `init` functions may appear any number of times.
  fn is_exempt(&self) -> bool {
    self.name == BLANK || (self.kind == DeclKind::Func && self.name == "init")
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DeclKey {
  receiver: Option<String>,
  name: String,
}

#[derive(Debug, Default)]
pub struct UnitBuilder {
  records: Vec<DeclRecord>,
  keys: HashMap<DeclKey, usize>,
  types: IndexMap<NodeId, Vec<HostId>>,
  values: IndexMap<NodeId, Vec<HostId>>,
  functions: IndexMap<NodeId, Vec<HostId>>,
  entry_statements: Vec<NodeId>,
  entry: Option<HostId>,
}

impl UnitBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a top-level declaration, or hand back the one it conflicts with.
  pub fn declare(
    &mut self,
    record: DeclRecord,
  ) -> Result<(), DeclRecord> {
    if !record.is_exempt() {
      let key = DeclKey {
        receiver: record.receiver.clone(),
        name: record.name.clone(),
      };
      if let Some(&previous) = self.keys.get(&key) {
        return Err(self.records[previous].clone());
      }
      self.keys.insert(key, self.records.len());
    }

    self.records.push(record);
    Ok(())
  }

  pub fn lookup(
    &self,
    receiver: Option<&str>,
    name: &str,
  ) -> Option<&DeclRecord> {
    let key = DeclKey {
      receiver: receiver.map(str::to_string),
      name: name.to_string(),
    };
    self.keys.get(&key).map(|&index| &self.records[index])
  }

  fn bucket(
    &mut self,
    kind: DeclKind,
  ) -> &mut IndexMap<NodeId, Vec<HostId>> {
    match kind.bucket() {
      0 => &mut self.types,
      1 => &mut self.values,
      _ => &mut self.functions,
    }
  }

  /// Reserve the output position of the declaration at `slot`.
  pub fn reserve(
    &mut self,
    kind: DeclKind,
    slot: NodeId,
  ) {
    self.bucket(kind).entry(slot).or_default();
  }

  pub fn fill(
    &mut self,
    kind: DeclKind,
    slot: NodeId,
    host: HostId,
  ) {
    self.bucket(kind).entry(slot).or_default().push(host);
  }

  pub fn push_entry_statement(
    &mut self,
    statement: NodeId,
  ) {
    self.entry_statements.push(statement);
  }

  pub fn entry_statements(&self) -> &[NodeId] {
    &self.entry_statements
  }

  pub fn set_entry(
    &mut self,
    record: DeclRecord,
    host: HostId,
  ) {
    self.records.push(record);
    self.entry = Some(host);
  }

  pub fn entry(&self) -> Option<HostId> {
    self.entry
  }

  /// Records in canonical emission order.
  pub fn records(&self) -> Vec<DeclRecord> {
    let mut records = self.records.clone();
    records.sort_by_key(|record| record.kind.bucket());
    records
  }

  /// Move the filled buckets into `file`: types, values, functions, entry.
  pub fn finish(
    self,
    file: &mut HostFile,
  ) {
    file.type_decls.extend(self.types.into_values().flatten());
    file.value_decls.extend(self.values.into_values().flatten());
    file.function_decls.extend(self.functions.into_values().flatten());
    file.function_decls.extend(self.entry);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kestrel_type::types::TypeStore;

  #[test]
  fn blank_and_init_never_conflict() {
    let mut builder = UnitBuilder::new();
    for _ in 0..2 {
      builder.declare(DeclRecord::new("_", DeclKind::Var, Span::synthetic())).unwrap();
      builder.declare(DeclRecord::new("init", DeclKind::Func, Span::synthetic())).unwrap();
    }

    builder.declare(DeclRecord::new("x", DeclKind::Var, Span::synthetic())).unwrap();
    let previous = builder
      .declare(DeclRecord::new("x", DeclKind::Type, Span::synthetic()))
      .unwrap_err();
    assert_eq!(previous.kind, DeclKind::Var);
  }

  #[test]
  fn methods_are_keyed_by_receiver() {
    let mut builder = UnitBuilder::new();
    builder.declare(DeclRecord::new("String", DeclKind::Func, Span::synthetic())).unwrap();
    builder.declare(DeclRecord::method("T", "String", Span::synthetic())).unwrap();
    builder.declare(DeclRecord::method("U", "String", Span::synthetic())).unwrap();

    assert!(builder.declare(DeclRecord::method("T", "String", Span::synthetic())).is_err());
    assert!(builder.lookup(Some("U"), "String").is_some());
  }

  #[test]
  fn buckets_keep_reservation_order() {
    let mut file = HostFile::new("main", TypeStore::new());
    let mut builder = UnitBuilder::new();
    let (a, b) = (NodeId::new(1), NodeId::new(2));
    builder.reserve(DeclKind::Var, a);
    builder.reserve(DeclKind::Var, b);

    let second = file.tree.ident("second");
    let first = file.tree.ident("first");
    builder.fill(DeclKind::Var, b, second);
    builder.fill(DeclKind::Var, a, first);
    builder.finish(&mut file);

    assert_eq!(file.value_decls, vec![first, second]);
  }
}
