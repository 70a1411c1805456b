//! Type oracle: the symbol-table collaborator the lowering engine consults
//! for everything the unit itself does not declare.
//!
//! Implementations must be pure and idempotent. Type ids handed out by an
//! oracle are ids in the [`TypeStore`] it was built against; the lowering
//! engine works on a clone of that store.

pub mod prelude;

use std::collections::HashMap;

use crate::types::{Type, TypeId, TypeStore};
use crate::value::ConstValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
  Append,
  Cap,
  Close,
  Complex,
  Copy,
  Delete,
  Imag,
  Len,
  Make,
  New,
  Panic,
  Real,
  Recover,
}

impl Builtin {
  pub fn name(&self) -> &'static str {
    match self {
      Builtin::Append => "append",
      Builtin::Cap => "cap",
      Builtin::Close => "close",
      Builtin::Complex => "complex",
      Builtin::Copy => "copy",
      Builtin::Delete => "delete",
      Builtin::Imag => "imag",
      Builtin::Len => "len",
      Builtin::Make => "make",
      Builtin::New => "new",
      Builtin::Panic => "panic",
      Builtin::Real => "real",
      Builtin::Recover => "recover",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
  /// A function or variable. `package` is the import path it is spelled with,
  /// so `println` can resolve to `fmt.Println`.
  Value {
    package: Option<String>,
    name: String,
    ty: TypeId,
  },
  Const {
    value: ConstValue,
    ty: TypeId,
  },
  Nil,
  Type(TypeId),
  /// An importable package, by import path.
  Package(String),
  Builtin(Builtin),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
  /// Exact host spelling of the method.
  pub name: String,
  /// Signature without the receiver.
  pub sig: TypeId,
  pub pointer_receiver: bool,
}

pub trait TypeOracle {
  /// Resolve a bare identifier not declared by the unit.
  fn resolve(
    &self,
    name: &str,
  ) -> Option<Resolution>;

  /// Resolve `package.name` where `package` is an import path.
  fn resolve_member(
    &self,
    package: &str,
    name: &str,
  ) -> Option<Resolution>;

  /// Method `name` in the method set of `receiver` (or `*receiver`).
  fn lookup_method(
    &self,
    types: &TypeStore,
    receiver: TypeId,
    name: &str,
  ) -> Option<MethodInfo>;

  fn assignable(
    &self,
    types: &TypeStore,
    from: TypeId,
    to: TypeId,
  ) -> bool {
    types.assignable(from, to, &|ty, name| self.lookup_method(types, ty, name).is_some())
  }
}

/// Table-driven oracle: every answer is a lookup in maps filled up front.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
  universe: HashMap<String, Resolution>,
  packages: HashMap<String, HashMap<String, Resolution>>,
  methods: HashMap<TypeId, Vec<MethodInfo>>,
}

impl TableOracle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn define(
    &mut self,
    name: &str,
    resolution: Resolution,
  ) {
    self.universe.insert(name.to_string(), resolution);
  }

  pub fn define_package(
    &mut self,
    path: &str,
  ) {
    self.packages.entry(path.to_string()).or_default();
  }

  pub fn define_member(
    &mut self,
    package: &str,
    name: &str,
    resolution: Resolution,
  ) {
    self
      .packages
      .entry(package.to_string())
      .or_default()
      .insert(name.to_string(), resolution);
  }

  /// Declare a function `package.name` of type `ty`.
  pub fn define_func(
    &mut self,
    package: &str,
    name: &str,
    ty: TypeId,
  ) {
    self.define_member(
      package,
      name,
      Resolution::Value {
        package: Some(package.to_string()),
        name: name.to_string(),
        ty,
      },
    );
  }

  /// Attach a method to a named type.
  pub fn define_method(
    &mut self,
    receiver: TypeId,
    name: &str,
    sig: TypeId,
    pointer_receiver: bool,
  ) {
    self.methods.entry(receiver).or_default().push(MethodInfo {
      name: name.to_string(),
      sig,
      pointer_receiver,
    });
  }

  pub fn has_package(
    &self,
    path: &str,
  ) -> bool {
    self.packages.contains_key(path)
  }
}

impl TypeOracle for TableOracle {
  fn resolve(
    &self,
    name: &str,
  ) -> Option<Resolution> {
    if let Some(resolution) = self.universe.get(name) {
      return Some(resolution.clone());
    }

    // Standard library packages are resolvable by their last segment when unambiguous.
    let mut candidates = self
      .packages
      .keys()
      .filter(|path| crate::types::package_name(path) == name);
    match (candidates.next(), candidates.next()) {
      (Some(path), None) => Some(Resolution::Package(path.clone())),
      _ => None,
    }
  }

  fn resolve_member(
    &self,
    package: &str,
    name: &str,
  ) -> Option<Resolution> {
    self.packages.get(package)?.get(name).cloned()
  }

  fn lookup_method(
    &self,
    types: &TypeStore,
    receiver: TypeId,
    name: &str,
  ) -> Option<MethodInfo> {
    let base = match types.get(&receiver) {
      Type::Pointer(inner) => *inner,
      _ => receiver,
    };

    if let Some(found) = self
      .methods
      .get(&base)
      .and_then(|methods| methods.iter().find(|m| m.name == name))
    {
      return Some(found.clone());
    }

    match types.get(&types.underlying(base)) {
      Type::Interface(methods) => methods.iter().find(|m| m.name == name).map(|m| MethodInfo {
        name: m.name.clone(),
        sig: m.sig,
        pointer_receiver: false,
      }),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn packages_resolve_by_last_segment() {
    let mut oracle = TableOracle::new();
    oracle.define_package("strconv");
    oracle.define_package("math/big");

    assert_eq!(oracle.resolve("big"), Some(Resolution::Package("math/big".to_string())));
    assert_eq!(oracle.resolve("nope"), None);
  }

  #[test]
  fn methods_are_found_through_pointers_and_interfaces() {
    let mut types = TypeStore::new();
    let mut oracle = TableOracle::new();
    let foo = types.declare_named(Some("example.com/foo"), "Foo");
    let empty = types.structure(Vec::new());
    types.set_underlying(foo, empty);
    let string = types.string();
    let sig = types.func(Vec::new(), vec![string], false);
    oracle.define_method(foo, "Name", sig, true);
    let ptr = types.pointer(foo);

    assert!(oracle.lookup_method(&types, ptr, "Name").is_some());
    assert!(oracle.lookup_method(&types, types.error(), "Error").is_some());
    assert!(oracle.assignable(&types, ptr, types.any()));
  }
}
