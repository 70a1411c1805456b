pub mod display;
pub mod imports;
pub mod operation;

use std::collections::HashMap;

use kestrel_type::{span::Span, types::TypeId, types::TypeStore, Id, Store};

pub type HostId = Id<HostNode>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostParam {
  pub name: Option<String>,
  pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HostSignature {
  pub params: Vec<HostParam>,
  pub results: Vec<HostParam>,
  pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostReceiver {
  pub name: Option<String>,
  /// `T` or `*T`.
  pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostElement {
  pub key: Option<HostId>,
  pub value: HostId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostCaseClause {
  /// `None` for `default:`.
  pub values: Option<Vec<HostId>>,
  pub body: Vec<HostId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTypeCaseClause {
  /// `None` for `default:`; a `None` entry is the `nil` case.
  pub types: Option<Vec<Option<TypeId>>>,
  pub body: Vec<HostId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostSelectClause {
  pub comm: Option<HostId>,
  pub body: Vec<HostId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostBranch {
  Break,
  Continue,
  Goto,
  Fallthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostFunction {
  pub receiver: Option<HostReceiver>,
  pub name: String,
  pub signature: HostSignature,
  pub body: HostId,
  pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKind {
  // Expression
  Identifier(String),
  /// `pkg.Name`, by import path.
  Qualified {
    package: String,
    name: String,
  },
  /// Go spelling of a constant.
  Literal(String),
  /// `T{...}`; an elided type (`None`) only appears nested in another composite.
  Composite {
    ty: Option<TypeId>,
    elements: Vec<HostElement>,
  },
  FunctionLiteral {
    signature: HostSignature,
    body: HostId,
  },
  Call {
    callee: HostId,
    args: Vec<HostId>,
    spread: bool,
  },
  Selector {
    object: HostId,
    name: String,
  },
  Index {
    object: HostId,
    index: HostId,
  },
  SliceExpr {
    object: HostId,
    low: Option<HostId>,
    high: Option<HostId>,
    max: Option<HostId>,
  },
  TypeAssert {
    object: HostId,
    /// `None` for `.(type)`.
    ty: Option<TypeId>,
  },
  Dereference(HostId),
  Unary {
    operation: operation::UnaryOperation,
    operand: HostId,
  },
  Binary {
    operation: operation::BinaryOperation,
    left: HostId,
    right: HostId,
  },
  Paren(HostId),
  /// A type in expression position: conversions, `make`, `new`, static method receivers.
  TypeExpression(TypeId),

  // Statement
  ExpressionStatement(HostId),
  Assign {
    lhs: Vec<HostId>,
    rhs: Vec<HostId>,
    define: bool,
    operation: Option<operation::BinaryOperation>,
  },
  IncDec {
    target: HostId,
    increment: bool,
  },
  Send {
    channel: HostId,
    value: HostId,
  },
  VarDecl {
    names: Vec<String>,
    ty: Option<TypeId>,
    values: Vec<HostId>,
    doc: Option<String>,
  },
  ConstDecl {
    names: Vec<String>,
    ty: Option<TypeId>,
    values: Vec<HostId>,
    doc: Option<String>,
  },
  /// `type name definition`; `definition` is the type as written, not the named type.
  TypeDecl {
    name: String,
    definition: TypeId,
    alias: bool,
    doc: Option<String>,
  },
  Block(Vec<HostId>),
  If {
    init: Option<HostId>,
    condition: HostId,
    then_branch: HostId,
    else_branch: Option<HostId>,
  },
  For {
    init: Option<HostId>,
    condition: Option<HostId>,
    post: Option<HostId>,
    body: HostId,
  },
  Range {
    key: Option<HostId>,
    value: Option<HostId>,
    define: bool,
    source: HostId,
    body: HostId,
  },
  Switch {
    init: Option<HostId>,
    tag: Option<HostId>,
    clauses: Vec<HostCaseClause>,
  },
  TypeSwitch {
    init: Option<HostId>,
    binding: Option<String>,
    subject: HostId,
    clauses: Vec<HostTypeCaseClause>,
  },
  Select(Vec<HostSelectClause>),
  Go(HostId),
  Defer(HostId),
  Return(Vec<HostId>),
  Branch {
    kind: HostBranch,
    label: Option<String>,
  },
  /// `label:` followed by a statement, or by nothing at the end of a block.
  Labeled {
    label: String,
    body: Option<HostId>,
  },

  // Declaration
  FunctionDecl(HostFunction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNode {
  pub kind: HostKind,
  /// Source construct this node was lowered from; `None` for scaffolding.
  pub origin: Option<Span>,
}

#[derive(Debug, Clone, Default)]
pub struct HostTree {
  pub nodes: Store<HostNode>,
}

impl HostTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc(
    &mut self,
    kind: HostKind,
    origin: Option<Span>,
  ) -> HostId {
    self.nodes.alloc(HostNode { kind, origin })
  }

  pub fn get(
    &self,
    id: HostId,
  ) -> &HostNode {
    self.nodes.get(&id)
  }

  pub fn get_mut(
    &mut self,
    id: HostId,
  ) -> &mut HostNode {
    self.nodes.get_mut(id)
  }

  pub fn ident(
    &mut self,
    name: &str,
  ) -> HostId {
    self.alloc(HostKind::Identifier(name.to_string()), None)
  }

  pub fn qualified(
    &mut self,
    package: &str,
    name: &str,
  ) -> HostId {
    self.alloc(
      HostKind::Qualified {
        package: package.to_string(),
        name: name.to_string(),
      },
      None,
    )
  }

  pub fn literal(
    &mut self,
    text: &str,
  ) -> HostId {
    self.alloc(HostKind::Literal(text.to_string()), None)
  }

  pub fn call(
    &mut self,
    callee: HostId,
    args: Vec<HostId>,
  ) -> HostId {
    self.alloc(
      HostKind::Call {
        callee,
        args,
        spread: false,
      },
      None,
    )
  }

  pub fn selector(
    &mut self,
    object: HostId,
    name: &str,
  ) -> HostId {
    self.alloc(
      HostKind::Selector {
        object,
        name: name.to_string(),
      },
      None,
    )
  }

  pub fn binary(
    &mut self,
    operation: operation::BinaryOperation,
    left: HostId,
    right: HostId,
  ) -> HostId {
    self.alloc(HostKind::Binary { operation, left, right }, None)
  }

  pub fn unary(
    &mut self,
    operation: operation::UnaryOperation,
    operand: HostId,
  ) -> HostId {
    self.alloc(HostKind::Unary { operation, operand }, None)
  }

  pub fn expr_stmt(
    &mut self,
    expr: HostId,
  ) -> HostId {
    self.alloc(HostKind::ExpressionStatement(expr), None)
  }

  pub fn assign(
    &mut self,
    lhs: Vec<HostId>,
    rhs: Vec<HostId>,
  ) -> HostId {
    self.alloc(
      HostKind::Assign {
        lhs,
        rhs,
        define: false,
        operation: None,
      },
      None,
    )
  }

  pub fn block(
    &mut self,
    statements: Vec<HostId>,
  ) -> HostId {
    self.alloc(HostKind::Block(statements), None)
  }

  pub fn ret(
    &mut self,
    values: Vec<HostId>,
  ) -> HostId {
    self.alloc(HostKind::Return(values), None)
  }

  /// Statements of a block node, or the node itself.
  pub fn statements(
    &self,
    id: HostId,
  ) -> Vec<HostId> {
    match &self.get(id).kind {
      HostKind::Block(statements) => statements.clone(),
      _ => vec![id],
    }
  }
}

/// `//line path:line[:column]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineMarker {
  pub path: String,
  pub line: u32,
  pub column: Option<u32>,
}

impl std::fmt::Display for LineMarker {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self.column {
      Some(column) => write!(f, "//line {}:{}:{}", self.path, self.line, column),
      None => write!(f, "//line {}:{}", self.path, self.line),
    }
  }
}

/// A lowered unit, ready for a renderer.
///
/// Declarations are kept in emission order: `types`, then `values`, then
/// `functions` (the synthesized entry last). Imports are not stored; they are
/// computed from what the tree references, see [`imports::collect_imports`].
#[derive(Debug, Clone)]
pub struct HostFile {
  pub package: String,
  pub tree: HostTree,
  pub types: TypeStore,
  pub type_decls: Vec<HostId>,
  pub value_decls: Vec<HostId>,
  pub function_decls: Vec<HostId>,
  pub markers: HashMap<HostId, LineMarker>,
}

impl HostFile {
  pub fn new(
    package: &str,
    types: TypeStore,
  ) -> Self {
    Self {
      package: package.to_string(),
      tree: HostTree::new(),
      types,
      type_decls: Vec::new(),
      value_decls: Vec::new(),
      function_decls: Vec::new(),
      markers: HashMap::new(),
    }
  }

  /// All top-level declarations in emission order.
  pub fn declarations(&self) -> impl Iterator<Item = HostId> + '_ {
    self
      .type_decls
      .iter()
      .chain(self.value_decls.iter())
      .chain(self.function_decls.iter())
      .copied()
  }

  pub fn imports(&self) -> Vec<String> {
    imports::collect_imports(self)
  }

  /// Name of each top-level declaration, in emission order.
  pub fn declaration_names(&self) -> Vec<String> {
    self
      .declarations()
      .flat_map(|id| match &self.tree.get(id).kind {
        HostKind::TypeDecl { name, .. } => vec![name.clone()],
        HostKind::VarDecl { names, .. } | HostKind::ConstDecl { names, .. } => names.clone(),
        HostKind::FunctionDecl(function) => vec![function.name.clone()],
        _ => vec![],
      })
      .collect()
  }
}
