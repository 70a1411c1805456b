//! Semantic analysis and lowering of one surface unit into a host file.
//!
//! All per-unit state lives in a [`Lowerer`]; its phases are spread over the
//! modules of this crate as `impl Lowerer` blocks, the same way desugarers
//! are dispatched by node kind from the expression and statement walkers.

mod autoprop;
pub mod builder;
mod call;
mod coerce;
mod collector;
mod comprehension;
mod composite;
pub mod const_eval;
pub mod dispatch;
mod errwrap;
mod expr;
mod iterator;
mod lambda;
pub mod line_map;
mod literal;
pub mod naming;
pub mod scope;
mod stmt;
mod type_expr;

use std::collections::{HashMap, HashSet};

use kestrel_ast::{NodeId, SourceUnit};
use kestrel_config::{ErrorPolicy, KestrelConfig};
use kestrel_diagnostics::{diagnostic_report::Diagnostic, message::DiagnosticMessage};
use kestrel_host::{HostFile, HostId, HostKind, HostTree};
use kestrel_log::{log_dbg, trace_dbg};
use kestrel_type::{
  file::SourceMap,
  oracle::{Builtin, MethodInfo, TypeOracle},
  span::Span,
  types::{BasicKind, Type, TypeId, TypeStore},
  value::ConstValue,
};

pub use builder::{DeclKind, DeclRecord, UnitBuilder};
pub use dispatch::{OverloadRegistry, RegisteredType};
pub use line_map::LineMapper;

use collector::{Global, ValueState};
use kestrel_config::DebugTrace;
use scope::ScopeTree;

pub type LowerResult<T> = Result<T, DiagnosticMessage>;

/// A successfully lowered unit.
#[derive(Debug)]
pub struct LowerOutput {
  pub file: HostFile,
  /// Top-level declarations in canonical emission order.
  pub declarations: Vec<DeclRecord>,
  pub warnings: Vec<Diagnostic>,
}

/// Lower `unit` against the standard extended-numeric registry.
///
/// `types` must be the store `oracle` was built against. Any error is fatal
/// for the unit: every error diagnostic is returned and no file is produced.
pub fn lower_unit(
  unit: &SourceUnit,
  sources: &SourceMap,
  oracle: &dyn TypeOracle,
  types: &TypeStore,
  config: &KestrelConfig,
) -> Result<LowerOutput, Vec<Diagnostic>> {
  let registry = OverloadRegistry::standard(types);
  lower_unit_with(unit, sources, oracle, types, config, registry)
}

pub fn lower_unit_with(
  unit: &SourceUnit,
  sources: &SourceMap,
  oracle: &dyn TypeOracle,
  types: &TypeStore,
  config: &KestrelConfig,
  registry: OverloadRegistry,
) -> Result<LowerOutput, Vec<Diagnostic>> {
  let mut lowerer = Lowerer::new(unit, sources, oracle, types, config, registry);
  lowerer.run();
  lowerer.finish()
}

// #region Operands
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OperandMode {
  Value,
  /// A call without results.
  NoValue,
  Nil,
  Type,
  Package(String),
  Builtin(Builtin),
}

/// A lowered expression together with what the walker knows about it.
#[derive(Debug, Clone)]
pub(crate) struct Operand {
  pub id: HostId,
  /// Static type; a `Tuple` for calls with several results.
  pub ty: TypeId,
  pub mode: OperandMode,
  pub constant: Option<ConstValue>,
  pub span: Span,
  /// Map index, type assertion or receive: may produce a second `bool`.
  pub comma_ok: bool,
}

impl Operand {
  pub fn value(
    id: HostId,
    ty: TypeId,
    span: Span,
  ) -> Self {
    Self {
      id,
      ty,
      mode: OperandMode::Value,
      constant: None,
      span,
      comma_ok: false,
    }
  }

  pub fn constant(
    id: HostId,
    ty: TypeId,
    value: Option<ConstValue>,
    span: Span,
  ) -> Self {
    Self {
      constant: value,
      ..Self::value(id, ty, span)
    }
  }

  pub fn with_mode(
    mut self,
    mode: OperandMode,
  ) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_comma_ok(mut self) -> Self {
    self.comma_ok = true;
    self
  }

  pub fn is_value(&self) -> bool {
    matches!(self.mode, OperandMode::Value | OperandMode::Nil)
  }
}

/// What the surrounding construct expects from an expression.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InferContext {
  pub expected: Option<TypeId>,
  /// Number of values the context consumes: 2 for `v, ok := ...`.
  pub results: usize,
  /// The expression is the callee of a call: no auto-property call insertion.
  pub callee: bool,
}

impl InferContext {
  pub fn none() -> Self {
    Self {
      expected: None,
      results: 1,
      callee: false,
    }
  }

  pub fn expecting(ty: TypeId) -> Self {
    Self {
      expected: Some(ty),
      ..Self::none()
    }
  }

  pub fn maybe(ty: Option<TypeId>) -> Self {
    Self {
      expected: ty,
      ..Self::none()
    }
  }

  pub fn results(
    mut self,
    results: usize,
  ) -> Self {
    self.results = results;
    self
  }

  pub fn callee() -> Self {
    Self {
      callee: true,
      ..Self::none()
    }
  }
}

/// The function whose body is being lowered.
#[derive(Debug, Clone)]
pub(crate) struct FuncContext {
  pub results: Vec<TypeId>,
}
// #endregion Operands

pub struct Lowerer<'a> {
  unit: &'a SourceUnit,
  sources: &'a SourceMap,
  oracle: &'a dyn TypeOracle,
  config: &'a KestrelConfig,
  types: TypeStore,
  tree: HostTree,
  scopes: ScopeTree,
  builder: UnitBuilder,
  registry: OverloadRegistry,
  /// Local package name to import path.
  imports: HashMap<String, String>,
  globals: HashMap<String, Global>,
  value_states: HashMap<NodeId, ValueState>,
  resolving_aliases: HashSet<String>,
  /// Methods declared by the unit, by receiver base type.
  methods: HashMap<TypeId, Vec<MethodInfo>>,
  func: Option<FuncContext>,
  /// `<package>.<declaration>` of the enclosing top-level declaration.
  frame_name: String,
  /// Statements to emit before the statement being lowered.
  hoisted: Vec<HostId>,
  /// The unit declares its own entry function.
  explicit_entry: bool,
  temp_counter: u32,
  diagnostics: Vec<Diagnostic>,
  warnings: Vec<Diagnostic>,
  halted: bool,
}

impl<'a> Lowerer<'a> {
  pub fn new(
    unit: &'a SourceUnit,
    sources: &'a SourceMap,
    oracle: &'a dyn TypeOracle,
    types: &TypeStore,
    config: &'a KestrelConfig,
    registry: OverloadRegistry,
  ) -> Self {
    Self {
      unit,
      sources,
      oracle,
      config,
      types: types.clone(),
      tree: HostTree::new(),
      scopes: ScopeTree::new(),
      builder: UnitBuilder::new(),
      registry,
      imports: HashMap::new(),
      globals: HashMap::new(),
      value_states: HashMap::new(),
      resolving_aliases: HashSet::new(),
      methods: HashMap::new(),
      func: None,
      frame_name: format!("{}.main", unit.package),
      hoisted: Vec::new(),
      explicit_entry: false,
      temp_counter: 0,
      diagnostics: Vec::new(),
      warnings: Vec::new(),
      halted: false,
    }
  }

  fn finish(self) -> Result<LowerOutput, Vec<Diagnostic>> {
    if !self.diagnostics.is_empty() {
      let mut diagnostics = self.diagnostics;
      diagnostics.extend(self.warnings);
      return Err(diagnostics);
    }

    let entry = self.builder.entry();
    let declarations = self.builder.records();
    let mut file = HostFile::new(&self.unit.package, self.types);
    file.tree = self.tree;
    self.builder.finish(&mut file);

    if !self.config.lower.suppress_position_markers {
      let mut mapper = LineMapper::new(self.sources, &self.config.lower);
      mapper.annotate(&mut file, entry);
      trace_dbg!(self.config, DebugTrace::LineMap, "{} line markers", file.markers.len());
    }

    log_dbg!(self.config, "lowered {} declarations", declarations.len());

    Ok(LowerOutput {
      file,
      declarations,
      warnings: self.warnings,
    })
  }

  // #region Diagnostics
  /// Report a failed declaration; under `HaltOnFirst` nothing else is lowered.
  fn record_failure(
    &mut self,
    message: DiagnosticMessage,
  ) {
    trace_dbg!(self.config, DebugTrace::Collector, "declaration failed: {}", message);
    self.diagnostics.push(message.report());
    if self.config.lower.error_policy == ErrorPolicy::HaltOnFirst {
      self.halted = true;
    }
  }

  fn warn(
    &mut self,
    message: DiagnosticMessage,
  ) {
    self.warnings.push(message.report());
  }
  // #endregion Diagnostics

  // #region Helpers
  fn span(
    &self,
    id: &NodeId,
  ) -> Span {
    self.unit.span(id)
  }

  /// Original source text of a surface node.
  fn source_text(
    &self,
    id: &NodeId,
  ) -> String {
    self.sources.slice(&self.unit.span(id)).to_string()
  }

  fn source_text_at(
    &self,
    span: &Span,
  ) -> String {
    self.sources.slice(span).to_string()
  }

  /// Allocate a host node lowered from source at `span`.
  fn alloc(
    &mut self,
    kind: HostKind,
    span: &Span,
  ) -> HostId {
    let origin = if span.is_synthetic() { None } else { Some(span.clone()) };
    self.tree.alloc(kind, origin)
  }

  /// Allocate generated scaffolding with no source counterpart.
  fn scaffold(
    &mut self,
    kind: HostKind,
  ) -> HostId {
    self.tree.alloc(kind, None)
  }

  fn type_node(
    &mut self,
    ty: TypeId,
  ) -> HostId {
    self.scaffold(HostKind::TypeExpression(ty))
  }

  /// `_autoGo_1`, `_autoGo_2`, ...
  fn fresh_temp(&mut self) -> String {
    self.temp_counter += 1;
    format!("{}{}", naming::TEMP_PREFIX, self.temp_counter)
  }

  fn type_name(
    &self,
    ty: TypeId,
  ) -> String {
    self.types.format(ty)
  }

  fn is_invalid(
    &self,
    ty: TypeId,
  ) -> bool {
    self.types.is_invalid(ty)
  }

  fn is_untyped_big(
    &self,
    ty: TypeId,
  ) -> bool {
    matches!(
      self.types.get(&ty),
      Type::Basic(BasicKind::UntypedBigInt) | Type::Basic(BasicKind::UntypedBigRat)
    )
  }

  /// Method `name` of `receiver`: the unit's own methods first, then the oracle.
  fn lookup_method(
    &self,
    receiver: TypeId,
    name: &str,
  ) -> Option<MethodInfo> {
    let base = match self.types.get(&receiver) {
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

    self.oracle.lookup_method(&self.types, receiver, name)
  }

  fn assignable(
    &self,
    from: TypeId,
    to: TypeId,
  ) -> bool {
    self
      .types
      .assignable(from, to, &|ty, name| self.lookup_method(ty, name).is_some())
  }

  /// Results of the enclosing function, when its last result is `error`.
  fn error_results(&self) -> Option<Vec<TypeId>> {
    let func = self.func.as_ref()?;
    match func.results.last() {
      Some(last) if self.types.is_error(*last) => Some(func.results.clone()),
      _ => None,
    }
  }

  /// Go spelling of the zero value of `ty`.
  fn zero_value(
    &mut self,
    ty: TypeId,
  ) -> HostId {
    let underlying = self.types.underlying(ty);
    let text = match self.types.get(&underlying) {
      Type::Basic(kind) if kind.is_numeric() => "0",
      Type::Basic(BasicKind::Bool) | Type::Basic(BasicKind::UntypedBool) => "false",
      Type::Basic(BasicKind::String) | Type::Basic(BasicKind::UntypedString) => "\"\"",
      Type::Struct(_) | Type::Array { .. } => {
        return self.scaffold(HostKind::Composite {
          ty: Some(ty),
          elements: Vec::new(),
        });
      },
      _ => "nil",
    };
    self.tree.literal(text)
  }
  // #endregion Helpers
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contexts_default_to_one_result() {
    let ctx = InferContext::none();
    assert_eq!(ctx.results, 1);
    assert!(!ctx.callee);
    assert_eq!(InferContext::none().results(2).results, 2);
  }
}
