use std::collections::{BTreeSet, HashMap};

use crate::{Id, Store};

pub type TypeId = Id<Type>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicKind {
  Bool,
  Int,
  Int8,
  Int16,
  Int32,
  Int64,
  Uint,
  Uint8,
  Uint16,
  Uint32,
  Uint64,
  Uintptr,
  Float32,
  Float64,
  Complex64,
  Complex128,
  String,
  UnsafePointer,

  UntypedBool,
  UntypedInt,
  UntypedRune,
  UntypedFloat,
  UntypedComplex,
  UntypedString,
  UntypedNil,
  UntypedBigInt,
  UntypedBigRat,
}

impl BasicKind {
  pub fn name(&self) -> &'static str {
    match self {
      BasicKind::Bool => "bool",
      BasicKind::Int => "int",
      BasicKind::Int8 => "int8",
      BasicKind::Int16 => "int16",
      BasicKind::Int32 => "int32",
      BasicKind::Int64 => "int64",
      BasicKind::Uint => "uint",
      BasicKind::Uint8 => "uint8",
      BasicKind::Uint16 => "uint16",
      BasicKind::Uint32 => "uint32",
      BasicKind::Uint64 => "uint64",
      BasicKind::Uintptr => "uintptr",
      BasicKind::Float32 => "float32",
      BasicKind::Float64 => "float64",
      BasicKind::Complex64 => "complex64",
      BasicKind::Complex128 => "complex128",
      BasicKind::String => "string",
      BasicKind::UnsafePointer => "unsafe.Pointer",
      BasicKind::UntypedBool => "untyped bool",
      BasicKind::UntypedInt => "untyped int",
      BasicKind::UntypedRune => "untyped rune",
      BasicKind::UntypedFloat => "untyped float",
      BasicKind::UntypedComplex => "untyped complex",
      BasicKind::UntypedString => "untyped string",
      BasicKind::UntypedNil => "untyped nil",
      BasicKind::UntypedBigInt => "untyped bigint",
      BasicKind::UntypedBigRat => "untyped bigrat",
    }
  }

  pub fn is_untyped(&self) -> bool {
    matches!(
      self,
      BasicKind::UntypedBool
        | BasicKind::UntypedInt
        | BasicKind::UntypedRune
        | BasicKind::UntypedFloat
        | BasicKind::UntypedComplex
        | BasicKind::UntypedString
        | BasicKind::UntypedNil
        | BasicKind::UntypedBigInt
        | BasicKind::UntypedBigRat
    )
  }

  pub fn is_integer(&self) -> bool {
    matches!(
      self,
      BasicKind::Int
        | BasicKind::Int8
        | BasicKind::Int16
        | BasicKind::Int32
        | BasicKind::Int64
        | BasicKind::Uint
        | BasicKind::Uint8
        | BasicKind::Uint16
        | BasicKind::Uint32
        | BasicKind::Uint64
        | BasicKind::Uintptr
        | BasicKind::UntypedInt
        | BasicKind::UntypedRune
    )
  }

  pub fn is_unsigned(&self) -> bool {
    matches!(
      self,
      BasicKind::Uint
        | BasicKind::Uint8
        | BasicKind::Uint16
        | BasicKind::Uint32
        | BasicKind::Uint64
        | BasicKind::Uintptr
    )
  }

  pub fn is_float(&self) -> bool {
    matches!(self, BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat)
  }

  pub fn is_complex(&self) -> bool {
    matches!(self, BasicKind::Complex64 | BasicKind::Complex128 | BasicKind::UntypedComplex)
  }

  pub fn is_numeric(&self) -> bool {
    self.is_integer() || self.is_float() || self.is_complex()
  }

  /// Bit width of a sized integer kind; `int`/`uint` are taken as 64-bit.
  pub fn integer_bits(&self) -> Option<u32> {
    match self {
      BasicKind::Int8 | BasicKind::Uint8 => Some(8),
      BasicKind::Int16 | BasicKind::Uint16 => Some(16),
      BasicKind::Int32 | BasicKind::Uint32 => Some(32),
      BasicKind::Int | BasicKind::Int64 | BasicKind::Uint | BasicKind::Uint64 | BasicKind::Uintptr => Some(64),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
  Both,
  Send,
  Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
  pub params: Vec<TypeId>,
  pub results: Vec<TypeId>,
  /// The last parameter is a slice `[]T` received as `...T`.
  pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
  pub name: String,
  pub ty: TypeId,
  pub embedded: bool,
  pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceMethod {
  pub name: String,
  pub sig: TypeId,
}

/// A nominal type. `package` is the import path, `None` for the unit being lowered
/// and for predeclared names such as `error`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
  pub package: Option<String>,
  pub name: String,
  pub underlying: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
  Basic(BasicKind),
  Named(NamedType),
  Pointer(TypeId),
  Slice(TypeId),
  Array {
    element: TypeId,
    len: u64,
  },
  Map {
    key: TypeId,
    value: TypeId,
  },
  Chan {
    element: TypeId,
    dir: ChanDir,
  },
  Func(Signature),
  Struct(Vec<Field>),
  Interface(Vec<InterfaceMethod>),
  Tuple(Vec<TypeId>),
  Invalid,
}

#[derive(Debug, Clone)]
pub struct TypeStore {
  types: Store<Type>,
  basics: HashMap<BasicKind, TypeId>,
  structural: HashMap<Type, TypeId>,
  named: HashMap<(Option<String>, String), TypeId>,
  invalid: TypeId,
  empty_interface: TypeId,
  error: TypeId,
}

impl Default for TypeStore {
  fn default() -> Self {
    Self::new()
  }
}

impl TypeStore {
  pub fn new() -> Self {
    let mut types = Store::new();
    let invalid = types.alloc(Type::Invalid);
    let mut store = Self {
      types,
      basics: HashMap::new(),
      structural: HashMap::new(),
      named: HashMap::new(),
      invalid,
      empty_interface: invalid,
      error: invalid,
    };
    store.init_predeclared();
    store
  }

  fn init_predeclared(&mut self) {
    let basics = [
      BasicKind::Bool,
      BasicKind::Int,
      BasicKind::Int8,
      BasicKind::Int16,
      BasicKind::Int32,
      BasicKind::Int64,
      BasicKind::Uint,
      BasicKind::Uint8,
      BasicKind::Uint16,
      BasicKind::Uint32,
      BasicKind::Uint64,
      BasicKind::Uintptr,
      BasicKind::Float32,
      BasicKind::Float64,
      BasicKind::Complex64,
      BasicKind::Complex128,
      BasicKind::String,
      BasicKind::UnsafePointer,
      BasicKind::UntypedBool,
      BasicKind::UntypedInt,
      BasicKind::UntypedRune,
      BasicKind::UntypedFloat,
      BasicKind::UntypedComplex,
      BasicKind::UntypedString,
      BasicKind::UntypedNil,
      BasicKind::UntypedBigInt,
      BasicKind::UntypedBigRat,
    ];

    for kind in basics {
      let id = self.types.alloc(Type::Basic(kind));
      self.basics.insert(kind, id);
    }

    self.empty_interface = self.interface(Vec::new());

    let string = self.basic(BasicKind::String);
    let error_sig = self.func(Vec::new(), vec![string], false);
    let error_iface = self.interface(vec![InterfaceMethod {
      name: "Error".to_string(),
      sig: error_sig,
    }]);
    let error = self.declare_named(None, "error");
    self.set_underlying(error, error_iface);
    self.error = error;
  }

  fn intern(
    &mut self,
    ty: Type,
  ) -> TypeId {
    if let Some(&id) = self.structural.get(&ty) {
      return id;
    }
    let id = self.types.alloc(ty.clone());
    self.structural.insert(ty, id);
    id
  }

  pub fn get(
    &self,
    id: &TypeId,
  ) -> &Type {
    self.types.get(id)
  }

  pub fn basic(
    &self,
    kind: BasicKind,
  ) -> TypeId {
    self.basics[&kind]
  }

  pub fn invalid(&self) -> TypeId {
    self.invalid
  }

  pub fn bool(&self) -> TypeId {
    self.basic(BasicKind::Bool)
  }

  pub fn int(&self) -> TypeId {
    self.basic(BasicKind::Int)
  }

  pub fn int32(&self) -> TypeId {
    self.basic(BasicKind::Int32)
  }

  pub fn float64(&self) -> TypeId {
    self.basic(BasicKind::Float64)
  }

  pub fn string(&self) -> TypeId {
    self.basic(BasicKind::String)
  }

  pub fn error(&self) -> TypeId {
    self.error
  }

  /// `interface{}`.
  pub fn any(&self) -> TypeId {
    self.empty_interface
  }

  pub fn untyped_nil(&self) -> TypeId {
    self.basic(BasicKind::UntypedNil)
  }

  pub fn pointer(
    &mut self,
    inner: TypeId,
  ) -> TypeId {
    self.intern(Type::Pointer(inner))
  }

  pub fn slice(
    &mut self,
    element: TypeId,
  ) -> TypeId {
    self.intern(Type::Slice(element))
  }

  pub fn array(
    &mut self,
    element: TypeId,
    len: u64,
  ) -> TypeId {
    self.intern(Type::Array { element, len })
  }

  pub fn map(
    &mut self,
    key: TypeId,
    value: TypeId,
  ) -> TypeId {
    self.intern(Type::Map { key, value })
  }

  pub fn chan(
    &mut self,
    element: TypeId,
    dir: ChanDir,
  ) -> TypeId {
    self.intern(Type::Chan { element, dir })
  }

  pub fn func(
    &mut self,
    params: Vec<TypeId>,
    results: Vec<TypeId>,
    variadic: bool,
  ) -> TypeId {
    self.intern(Type::Func(Signature {
      params,
      results,
      variadic,
    }))
  }

  pub fn structure(
    &mut self,
    fields: Vec<Field>,
  ) -> TypeId {
    self.intern(Type::Struct(fields))
  }

  pub fn interface(
    &mut self,
    mut methods: Vec<InterfaceMethod>,
  ) -> TypeId {
    methods.sort_by(|a, b| a.name.cmp(&b.name));
    self.intern(Type::Interface(methods))
  }

  pub fn tuple(
    &mut self,
    elements: Vec<TypeId>,
  ) -> TypeId {
    self.intern(Type::Tuple(elements))
  }

  /// Create (or return the existing) nominal type `package.name`.
  pub fn declare_named(
    &mut self,
    package: Option<&str>,
    name: &str,
  ) -> TypeId {
    let key = (package.map(str::to_string), name.to_string());
    if let Some(&id) = self.named.get(&key) {
      return id;
    }

    let id = self.types.alloc(Type::Named(NamedType {
      package: key.0.clone(),
      name: key.1.clone(),
      underlying: None,
    }));
    self.named.insert(key, id);
    id
  }

  pub fn lookup_named(
    &self,
    package: Option<&str>,
    name: &str,
  ) -> Option<TypeId> {
    self
      .named
      .get(&(package.map(str::to_string), name.to_string()))
      .copied()
  }

  /// `underlying` may itself be named; lookups follow the chain, so a
  /// definition can name a type whose own definition is not resolved yet.
  pub fn set_underlying(
    &mut self,
    named: TypeId,
    underlying: TypeId,
  ) {
    if let Type::Named(n) = self.types.get_mut(named) {
      n.underlying = Some(underlying);
    }
  }

  /// Follow named types down to their structural definition.
  pub fn underlying(
    &self,
    id: TypeId,
  ) -> TypeId {
    let mut current = id;
    for _ in 0..64 {
      match self.get(&current) {
        Type::Named(named) => match named.underlying {
          Some(next) => current = next,
          None => return self.invalid,
        },
        _ => return current,
      }
    }
    self.invalid
  }

  pub fn signature(
    &self,
    id: TypeId,
  ) -> Option<&Signature> {
    match self.get(&self.underlying(id)) {
      Type::Func(sig) => Some(sig),
      _ => None,
    }
  }

  pub fn basic_kind(
    &self,
    id: TypeId,
  ) -> Option<BasicKind> {
    match self.get(&self.underlying(id)) {
      Type::Basic(kind) => Some(*kind),
      _ => None,
    }
  }

  pub fn is_invalid(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(self.get(&id), Type::Invalid)
  }

  pub fn is_untyped(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(self.get(&id), Type::Basic(kind) if kind.is_untyped())
  }

  pub fn is_named(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(self.get(&id), Type::Named(_))
  }

  pub fn is_interface(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(self.get(&self.underlying(id)), Type::Interface(_))
  }

  pub fn is_empty_interface(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(self.get(&self.underlying(id)), Type::Interface(methods) if methods.is_empty())
  }

  pub fn is_error(
    &self,
    id: TypeId,
  ) -> bool {
    id == self.error
  }

  /// Types whose zero value is `nil`.
  pub fn is_nilable(
    &self,
    id: TypeId,
  ) -> bool {
    match self.get(&self.underlying(id)) {
      Type::Pointer(_)
      | Type::Slice(_)
      | Type::Map { .. }
      | Type::Chan { .. }
      | Type::Func(_)
      | Type::Interface(_)
      | Type::Basic(BasicKind::UnsafePointer)
      | Type::Basic(BasicKind::UntypedNil) => true,
      _ => false,
    }
  }

  /// Result list of a call: tuples expand, anything else is a single value.
  pub fn results_of(
    &self,
    id: TypeId,
  ) -> Vec<TypeId> {
    match self.get(&id) {
      Type::Tuple(elements) => elements.clone(),
      _ => vec![id],
    }
  }

  /// The type an untyped constant takes when nothing else constrains it.
  ///
  /// Big-number kinds have no host default; callers resolve them through the
  /// registered extended-numeric types.
  pub fn default_type(
    &self,
    id: TypeId,
  ) -> TypeId {
    match self.get(&id) {
      Type::Basic(BasicKind::UntypedBool) => self.bool(),
      Type::Basic(BasicKind::UntypedInt) => self.int(),
      Type::Basic(BasicKind::UntypedRune) => self.int32(),
      Type::Basic(BasicKind::UntypedFloat) => self.float64(),
      Type::Basic(BasicKind::UntypedComplex) => self.basic(BasicKind::Complex128),
      Type::Basic(BasicKind::UntypedString) => self.string(),
      _ => id,
    }
  }

  /// Element type produced by ranging over `id`, as (key, value).
  pub fn range_types(
    &self,
    id: TypeId,
  ) -> Option<(TypeId, Option<TypeId>)> {
    let underlying = self.underlying(id);
    match self.get(&underlying) {
      Type::Slice(element) | Type::Array { element, .. } => Some((self.int(), Some(*element))),
      Type::Pointer(inner) => match self.get(&self.underlying(*inner)) {
        Type::Array { element, .. } => Some((self.int(), Some(*element))),
        _ => None,
      },
      Type::Map { key, value } => Some((*key, Some(*value))),
      Type::Chan { element, .. } => Some((*element, None)),
      Type::Basic(kind) if matches!(kind, BasicKind::String | BasicKind::UntypedString) => {
        Some((self.int(), Some(self.int32())))
      },
      Type::Basic(kind) if kind.is_integer() => Some((self.default_type(underlying), None)),
      _ => None,
    }
  }

  /// Go assignability for non-constant values.
  ///
  /// `has_method(ty, name)` answers method-set queries for interface targets;
  /// the type store alone does not know the methods declared on named types.
  pub fn assignable(
    &self,
    from: TypeId,
    to: TypeId,
    has_method: &dyn Fn(TypeId, &str) -> bool,
  ) -> bool {
    if from == to || self.is_invalid(from) || self.is_invalid(to) {
      return true;
    }

    let from_u = self.underlying(from);
    let to_u = self.underlying(to);

    if let Type::Basic(kind) = self.get(&from) {
      if kind.is_untyped() {
        return self.untyped_assignable(*kind, to);
      }
    }

    if let Type::Interface(methods) = self.get(&to_u) {
      return methods.iter().all(|m| has_method(from, &m.name));
    }

    let one_unnamed = !self.is_named(from) || !self.is_named(to);
    if one_unnamed && from_u == to_u {
      return true;
    }

    if let (Type::Chan { element: a, dir: ChanDir::Both }, Type::Chan { element: b, .. }) =
      (self.get(&from_u), self.get(&to_u))
    {
      return a == b && one_unnamed;
    }

    false
  }

  fn untyped_assignable(
    &self,
    kind: BasicKind,
    to: TypeId,
  ) -> bool {
    if self.is_interface(to) {
      return kind != BasicKind::UntypedNil || self.is_nilable(to);
    }

    let target = match self.get(&self.underlying(to)) {
      Type::Basic(target) => *target,
      _ => return kind == BasicKind::UntypedNil && self.is_nilable(to),
    };

    match kind {
      BasicKind::UntypedBool => target == BasicKind::Bool,
      BasicKind::UntypedString => target == BasicKind::String,
      BasicKind::UntypedNil => target == BasicKind::UnsafePointer,
      BasicKind::UntypedInt | BasicKind::UntypedRune => target.is_numeric(),
      BasicKind::UntypedFloat => target.is_float() || target.is_complex() || target.is_integer(),
      BasicKind::UntypedComplex => target.is_numeric(),
      _ => false,
    }
  }

  /// Go source spelling of a type, packages shown by their last path segment.
  pub fn format(
    &self,
    id: TypeId,
  ) -> String {
    let mut out = String::new();
    self.write_type(id, &mut out);
    out
  }

  fn write_type(
    &self,
    id: TypeId,
    out: &mut String,
  ) {
    match self.get(&id) {
      Type::Basic(kind) => out.push_str(kind.name()),
      Type::Named(named) => {
        if let Some(package) = &named.package {
          out.push_str(package_name(package));
          out.push('.');
        }
        out.push_str(&named.name);
      },
      Type::Pointer(inner) => {
        out.push('*');
        self.write_type(*inner, out);
      },
      Type::Slice(element) => {
        out.push_str("[]");
        self.write_type(*element, out);
      },
      Type::Array { element, len } => {
        out.push_str(&format!("[{}]", len));
        self.write_type(*element, out);
      },
      Type::Map { key, value } => {
        out.push_str("map[");
        self.write_type(*key, out);
        out.push(']');
        self.write_type(*value, out);
      },
      Type::Chan { element, dir } => {
        match dir {
          ChanDir::Both => out.push_str("chan "),
          ChanDir::Send => out.push_str("chan<- "),
          ChanDir::Recv => out.push_str("<-chan "),
        }
        self.write_type(*element, out);
      },
      Type::Func(sig) => {
        out.push_str("func");
        self.write_signature(sig, out);
      },
      Type::Struct(fields) => {
        if fields.is_empty() {
          out.push_str("struct{}");
          return;
        }
        out.push_str("struct{ ");
        for (i, field) in fields.iter().enumerate() {
          if i > 0 {
            out.push_str("; ");
          }
          if !field.embedded {
            out.push_str(&field.name);
            out.push(' ');
          }
          self.write_type(field.ty, out);
          if let Some(tag) = &field.tag {
            out.push_str(&format!(" `{}`", tag));
          }
        }
        out.push_str(" }");
      },
      Type::Interface(methods) => {
        if methods.is_empty() {
          out.push_str("interface{}");
          return;
        }
        out.push_str("interface{ ");
        for (i, method) in methods.iter().enumerate() {
          if i > 0 {
            out.push_str("; ");
          }
          out.push_str(&method.name);
          if let Some(sig) = self.signature(method.sig) {
            self.write_signature(sig, out);
          }
        }
        out.push_str(" }");
      },
      Type::Tuple(elements) => {
        out.push('(');
        for (i, element) in elements.iter().enumerate() {
          if i > 0 {
            out.push_str(", ");
          }
          self.write_type(*element, out);
        }
        out.push(')');
      },
      Type::Invalid => out.push_str("invalid type"),
    }
  }

  /// Writes `(params) results` without the `func` keyword.
  pub fn write_signature(
    &self,
    sig: &Signature,
    out: &mut String,
  ) {
    out.push('(');
    for (i, param) in sig.params.iter().enumerate() {
      if i > 0 {
        out.push_str(", ");
      }
      let last = i + 1 == sig.params.len();
      match self.get(param) {
        Type::Slice(element) if last && sig.variadic => {
          out.push_str("...");
          self.write_type(*element, out);
        },
        _ => self.write_type(*param, out),
      }
    }
    out.push(')');

    match sig.results.len() {
      0 => {},
      1 => {
        out.push(' ');
        self.write_type(sig.results[0], out);
      },
      _ => {
        out.push_str(" (");
        for (i, result) in sig.results.iter().enumerate() {
          if i > 0 {
            out.push_str(", ");
          }
          self.write_type(*result, out);
        }
        out.push(')');
      },
    }
  }

  /// Import paths mentioned anywhere inside `id`.
  pub fn collect_packages(
    &self,
    id: TypeId,
    out: &mut BTreeSet<String>,
  ) {
    let mut visiting = Vec::new();
    self.collect_packages_inner(id, out, &mut visiting);
  }

  fn collect_packages_inner(
    &self,
    id: TypeId,
    out: &mut BTreeSet<String>,
    visiting: &mut Vec<TypeId>,
  ) {
    if visiting.contains(&id) {
      return;
    }
    visiting.push(id);

    match self.get(&id) {
      Type::Named(named) => {
        if let Some(package) = &named.package {
          out.insert(package.clone());
        }
      },
      Type::Pointer(inner) | Type::Slice(inner) => self.collect_packages_inner(*inner, out, visiting),
      Type::Array { element, .. } | Type::Chan { element, .. } => self.collect_packages_inner(*element, out, visiting),
      Type::Map { key, value } => {
        self.collect_packages_inner(*key, out, visiting);
        self.collect_packages_inner(*value, out, visiting);
      },
      Type::Func(sig) => {
        for ty in sig.params.iter().chain(sig.results.iter()) {
          self.collect_packages_inner(*ty, out, visiting);
        }
      },
      Type::Struct(fields) => {
        for field in fields {
          self.collect_packages_inner(field.ty, out, visiting);
        }
      },
      Type::Interface(methods) => {
        for method in methods {
          self.collect_packages_inner(method.sig, out, visiting);
        }
      },
      Type::Tuple(elements) => {
        for element in elements {
          self.collect_packages_inner(*element, out, visiting);
        }
      },
      Type::Basic(BasicKind::UnsafePointer) => {
        out.insert("unsafe".to_string());
      },
      Type::Basic(_) | Type::Invalid => {},
    }

    visiting.pop();
  }
}

/// Identifier a package is referred to by: the last segment of its import path.
pub fn package_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn no_methods(
    _: TypeId,
    _: &str,
  ) -> bool {
    false
  }

  #[test]
  fn structural_types_are_interned() {
    let mut types = TypeStore::new();
    let int = types.int();
    let a = types.slice(int);
    let b = types.slice(int);

    assert_eq!(a, b);
    assert_eq!(types.format(a), "[]int");
  }

  #[test]
  fn formats_go_spelling() {
    let mut types = TypeStore::new();
    let string = types.string();
    let float = types.float64();
    let map = types.map(string, float);
    let bigint = types.declare_named(Some("github.com/qiniu/x/gop/ng"), "Bigint");
    let ptr = types.pointer(bigint);
    let any = types.any();
    let variadic = types.slice(any);
    let error = types.error();
    let int = types.int();
    let println = types.func(vec![variadic], vec![int, error], true);

    assert_eq!(types.format(map), "map[string]float64");
    assert_eq!(types.format(ptr), "*ng.Bigint");
    assert_eq!(types.format(println), "func(...interface{}) (int, error)");
  }

  #[test]
  fn untyped_constants_follow_target_class() {
    let types = TypeStore::new();
    let untyped_float = types.basic(BasicKind::UntypedFloat);
    let untyped_string = types.basic(BasicKind::UntypedString);

    assert!(types.assignable(untyped_float, types.float64(), &no_methods));
    assert!(!types.assignable(untyped_string, types.int(), &no_methods));
    assert!(types.assignable(untyped_string, types.any(), &no_methods));
  }

  #[test]
  fn named_and_unnamed_share_underlying() {
    let mut types = TypeStore::new();
    let float = types.float64();
    let slice = types.slice(float);
    let vector = types.declare_named(None, "vector");
    types.set_underlying(vector, slice);

    assert!(types.assignable(slice, vector, &no_methods));
    assert_eq!(types.underlying(vector), slice);
  }

  #[test]
  fn interface_targets_ask_for_methods() {
    let types = TypeStore::new();
    let error = types.error();
    let int = types.int();

    assert!(!types.assignable(int, error, &no_methods));
    assert!(types.assignable(int, error, &|_, name| name == "Error"));
  }

  #[test]
  fn error_is_predeclared_interface() {
    let types = TypeStore::new();
    assert!(types.is_interface(types.error()));
    assert_eq!(types.format(types.error()), "error");
  }
}
