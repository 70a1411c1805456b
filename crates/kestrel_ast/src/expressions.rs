use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ASTBinaryOperator {
  Add,
  Subtract,
  Multiply,
  Divide,
  Modulo,
  BitAnd,
  BitOr,
  BitXor,
  BitClear,
  ShiftLeft,
  ShiftRight,
  And,
  Or,
  Equal,
  NotEqual,
  LessThan,
  LessThanOrEqual,
  GreaterThan,
  GreaterThanOrEqual,
}

impl ASTBinaryOperator {
  pub fn symbol(&self) -> &'static str {
    match self {
      ASTBinaryOperator::Add => "+",
      ASTBinaryOperator::Subtract => "-",
      ASTBinaryOperator::Multiply => "*",
      ASTBinaryOperator::Divide => "/",
      ASTBinaryOperator::Modulo => "%",
      ASTBinaryOperator::BitAnd => "&",
      ASTBinaryOperator::BitOr => "|",
      ASTBinaryOperator::BitXor => "^",
      ASTBinaryOperator::BitClear => "&^",
      ASTBinaryOperator::ShiftLeft => "<<",
      ASTBinaryOperator::ShiftRight => ">>",
      ASTBinaryOperator::And => "&&",
      ASTBinaryOperator::Or => "||",
      ASTBinaryOperator::Equal => "==",
      ASTBinaryOperator::NotEqual => "!=",
      ASTBinaryOperator::LessThan => "<",
      ASTBinaryOperator::LessThanOrEqual => "<=",
      ASTBinaryOperator::GreaterThan => ">",
      ASTBinaryOperator::GreaterThanOrEqual => ">=",
    }
  }

  pub fn is_comparison(&self) -> bool {
    matches!(
      self,
      ASTBinaryOperator::Equal
        | ASTBinaryOperator::NotEqual
        | ASTBinaryOperator::LessThan
        | ASTBinaryOperator::LessThanOrEqual
        | ASTBinaryOperator::GreaterThan
        | ASTBinaryOperator::GreaterThanOrEqual
    )
  }

  pub fn is_logical(&self) -> bool {
    matches!(self, ASTBinaryOperator::And | ASTBinaryOperator::Or)
  }

  pub fn is_shift(&self) -> bool {
    matches!(self, ASTBinaryOperator::ShiftLeft | ASTBinaryOperator::ShiftRight)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ASTUnaryOperator {
  Not,
  Negate,
  Plus,
  BitNot,
  AddressOf,
  Receive,
}

impl ASTUnaryOperator {
  pub fn symbol(&self) -> &'static str {
    match self {
      ASTUnaryOperator::Not => "!",
      ASTUnaryOperator::Negate => "-",
      ASTUnaryOperator::Plus => "+",
      ASTUnaryOperator::BitNot => "^",
      ASTUnaryOperator::AddressOf => "&",
      ASTUnaryOperator::Receive => "<-",
    }
  }

  /// The binary operator spelled the same way, if any: `a -b` can mean `a - b`.
  pub fn as_binary(&self) -> Option<ASTBinaryOperator> {
    match self {
      ASTUnaryOperator::Negate => Some(ASTBinaryOperator::Subtract),
      ASTUnaryOperator::Plus => Some(ASTBinaryOperator::Add),
      ASTUnaryOperator::BitNot => Some(ASTBinaryOperator::BitXor),
      ASTUnaryOperator::AddressOf => Some(ASTBinaryOperator::BitAnd),
      ASTUnaryOperator::Not | ASTUnaryOperator::Receive => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
  Int,
  Float,
  Imaginary,
  Rune,
  String,
  /// `1r`: an untyped big-integer literal.
  BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTLiteral {
  pub kind: LiteralKind,
  /// Source spelling without the `r` suffix; string literals keep their quotes.
  pub raw: String,
}

/// One element of a composite or slice literal; `key` is a field name, map key or sparse index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTElement {
  pub key: Option<NodeId>,
  pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LambdaBody {
  /// `x => expr` or `x => (a, b)`.
  Expressions(Vec<NodeId>),
  Block(NodeId),
}

/// One `key, value <- source, guard` clause of a for-phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForClause {
  pub key: Option<String>,
  pub value: Option<String>,
  pub source: NodeId,
  /// Simple statement run before the guard: `t := v; t > 3`.
  pub init: Option<NodeId>,
  pub guard: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComprehensionYield {
  List(NodeId),
  Map {
    key: NodeId,
    value: NodeId,
  },
  Exists,
  Select(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorWrapPolicy {
  /// `expr!`
  Panic,
  /// `expr?`
  Return,
  /// `expr?:default`; no default means the zero value.
  Default(Option<NodeId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ASTExpression {
  Identifier(String),
  Literal(ASTLiteral),
  /// `T{...}`, or `{...}` when `ty` is `None`.
  CompositeLiteral {
    ty: Option<NodeId>,
    elements: Vec<ASTElement>,
  },
  /// Untyped `[a, b, c]`.
  SliceLiteral {
    elements: Vec<ASTElement>,
  },
  Grouping(NodeId),
  MemberAccess {
    object: NodeId,
    member: String,
  },
  Index {
    object: NodeId,
    index: NodeId,
  },
  SliceExpr {
    object: NodeId,
    low: Option<NodeId>,
    high: Option<NodeId>,
    max: Option<NodeId>,
  },
  TypeAssertion {
    object: NodeId,
    /// `None` for `x.(type)` in a type switch.
    ty: Option<NodeId>,
  },
  Call {
    callee: NodeId,
    args: Vec<NodeId>,
    spread: bool,
  },
  /// `head arg, arg`: a call written without parentheses.
  Command {
    head: NodeId,
    args: Vec<NodeId>,
  },
  /// `head <op>operand`: a command argument or a binary expression.
  AmbiguousCommand {
    head: NodeId,
    operator: ASTUnaryOperator,
    operand: NodeId,
  },
  Dereference(NodeId),
  Unary {
    operator: ASTUnaryOperator,
    operand: NodeId,
  },
  Binary {
    operator: ASTBinaryOperator,
    left: NodeId,
    right: NodeId,
  },
  FunctionLiteral {
    signature: NodeId,
    body: NodeId,
  },
  Lambda {
    params: Vec<String>,
    body: LambdaBody,
  },
  Comprehension {
    yields: ComprehensionYield,
    clauses: Vec<ForClause>,
  },
  ErrorWrap {
    expr: NodeId,
    policy: ErrorWrapPolicy,
  },
}
