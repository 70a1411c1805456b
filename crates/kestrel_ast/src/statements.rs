use crate::expressions::{ASTBinaryOperator, ForClause};
use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOperator {
  /// `:=`
  Define,
  /// `=`
  Assign,
  /// `+=`, `-=`, ...
  Compound(ASTBinaryOperator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
  Break,
  Continue,
  Goto,
  Fallthrough,
}

impl BranchKind {
  pub fn keyword(&self) -> &'static str {
    match self {
      BranchKind::Break => "break",
      BranchKind::Continue => "continue",
      BranchKind::Goto => "goto",
      BranchKind::Fallthrough => "fallthrough",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTValueSpec {
  pub names: Vec<String>,
  pub ty: Option<NodeId>,
  pub values: Vec<NodeId>,
  pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTReceiver {
  pub name: Option<String>,
  /// Type name of the receiver, without the `*`.
  pub ty: NodeId,
  pub pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTFunction {
  pub receiver: Option<ASTReceiver>,
  pub name: String,
  /// A `ASTType::Function` node.
  pub signature: NodeId,
  pub body: Option<NodeId>,
  pub doc: Option<String>,
}

/// `case a, b:` or `default:` (empty `values`, `is_default` set).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTCaseClause {
  pub values: Vec<NodeId>,
  pub is_default: bool,
  pub body: Vec<NodeId>,
}

/// `case T1, T2:` in a type switch; `nil` is spelled as the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTTypeCaseClause {
  pub types: Vec<NodeId>,
  pub is_default: bool,
  pub body: Vec<NodeId>,
}

/// `case comm:` or `default:` (no `comm`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTSelectClause {
  pub comm: Option<NodeId>,
  pub body: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ASTStatement {
  Expression(NodeId),
  Assign {
    lhs: Vec<NodeId>,
    operator: AssignOperator,
    rhs: Vec<NodeId>,
  },
  IncDec {
    target: NodeId,
    increment: bool,
  },
  Send {
    channel: NodeId,
    value: NodeId,
  },
  Variable(ASTValueSpec),
  Constant(ASTValueSpec),
  TypeDecl {
    name: String,
    ty: NodeId,
    alias: bool,
    doc: Option<String>,
  },
  Function(ASTFunction),
  Import {
    path: String,
    alias: Option<String>,
  },
  Block(Vec<NodeId>),
  If {
    init: Option<NodeId>,
    condition: NodeId,
    then_block: NodeId,
    /// Another `If` or a `Block`.
    else_branch: Option<NodeId>,
  },
  For {
    init: Option<NodeId>,
    condition: Option<NodeId>,
    post: Option<NodeId>,
    body: NodeId,
  },
  Range {
    key: Option<NodeId>,
    value: Option<NodeId>,
    define: bool,
    source: NodeId,
    body: NodeId,
  },
  /// `for k, v <- source, guard { body }`
  ForPhrase {
    clause: ForClause,
    body: NodeId,
  },
  Switch {
    init: Option<NodeId>,
    tag: Option<NodeId>,
    clauses: Vec<ASTCaseClause>,
  },
  TypeSwitch {
    init: Option<NodeId>,
    binding: Option<String>,
    subject: NodeId,
    clauses: Vec<ASTTypeCaseClause>,
  },
  Select(Vec<ASTSelectClause>),
  Go(NodeId),
  Defer(NodeId),
  Return(Vec<NodeId>),
  Branch {
    kind: BranchKind,
    label: Option<String>,
  },
  Labeled {
    label: String,
    body: NodeId,
  },
}

impl ASTStatement {
  /// Top-level declarations; everything else at top level is executable.
  pub fn is_declaration(&self) -> bool {
    matches!(
      self,
      ASTStatement::Variable(_)
        | ASTStatement::Constant(_)
        | ASTStatement::TypeDecl { .. }
        | ASTStatement::Function(_)
        | ASTStatement::Import { .. }
    )
  }
}
