#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
  // Arithmetic
  Add,
  Sub,
  Mul,
  Div,
  Mod,

  // Logical
  And,
  Or,

  // Comparison
  Equal,
  NotEqual,
  LessThan,
  LessEqual,
  GreaterThan,
  GreaterEqual,

  // Bitwise
  BitAnd,
  BitOr,
  BitXor,
  BitClear,
  BitShiftLeft,
  BitShiftRight,
}

impl BinaryOperation {
  pub fn symbol(&self) -> &'static str {
    match self {
      BinaryOperation::Add => "+",
      BinaryOperation::Sub => "-",
      BinaryOperation::Mul => "*",
      BinaryOperation::Div => "/",
      BinaryOperation::Mod => "%",
      BinaryOperation::And => "&&",
      BinaryOperation::Or => "||",
      BinaryOperation::Equal => "==",
      BinaryOperation::NotEqual => "!=",
      BinaryOperation::LessThan => "<",
      BinaryOperation::LessEqual => "<=",
      BinaryOperation::GreaterThan => ">",
      BinaryOperation::GreaterEqual => ">=",
      BinaryOperation::BitAnd => "&",
      BinaryOperation::BitOr => "|",
      BinaryOperation::BitXor => "^",
      BinaryOperation::BitClear => "&^",
      BinaryOperation::BitShiftLeft => "<<",
      BinaryOperation::BitShiftRight => ">>",
    }
  }

  /// Go operator precedence, 5 binds tightest.
  pub fn precedence(&self) -> u8 {
    match self {
      BinaryOperation::Mul
      | BinaryOperation::Div
      | BinaryOperation::Mod
      | BinaryOperation::BitShiftLeft
      | BinaryOperation::BitShiftRight
      | BinaryOperation::BitAnd
      | BinaryOperation::BitClear => 5,
      BinaryOperation::Add | BinaryOperation::Sub | BinaryOperation::BitOr | BinaryOperation::BitXor => 4,
      BinaryOperation::Equal
      | BinaryOperation::NotEqual
      | BinaryOperation::LessThan
      | BinaryOperation::LessEqual
      | BinaryOperation::GreaterThan
      | BinaryOperation::GreaterEqual => 3,
      BinaryOperation::And => 2,
      BinaryOperation::Or => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperation {
  Not,
  Neg,
  Plus,
  BitNot,
  AddressOf,
  Receive,
}

impl UnaryOperation {
  pub fn symbol(&self) -> &'static str {
    match self {
      UnaryOperation::Not => "!",
      UnaryOperation::Neg => "-",
      UnaryOperation::Plus => "+",
      UnaryOperation::BitNot => "^",
      UnaryOperation::AddressOf => "&",
      UnaryOperation::Receive => "<-",
    }
  }
}
