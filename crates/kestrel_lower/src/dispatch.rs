//! Operator dispatch for extended-numeric types.
//!
//! Operators on a registered type lower to calls of its operator methods,
//! `(ng.Bigint).Gop_Add(x, y)`; untyped constants flowing into one are built
//! with the type's initializer functions.

use kestrel_ast::expressions::{ASTBinaryOperator, ASTUnaryOperator};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostId, HostKind, HostParam, HostSignature};
use kestrel_log::trace_dbg;
use kestrel_type::{
  oracle::prelude::{BIG_PATH, NG_PATH},
  span::Span,
  types::{BasicKind, TypeId, TypeStore},
  value::ConstValue,
};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{LowerResult, Lowerer, Operand};

/// A type whose operators are method calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredType {
  pub ty: TypeId,
  /// Import path of the package declaring the type and its initializers.
  pub package: String,
  pub name: String,
  /// Appended to binary operator method names: `Gop_Add__1`.
  pub binary_suffix: String,
  /// `T_Init__0(int)`.
  pub init_int: Option<String>,
  /// `T_Init__1(*big.Int)`.
  pub init_big: Option<String>,
  /// `T_Init__2(*big.Rat)`.
  pub init_rat: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OverloadRegistry {
  entries: Vec<RegisteredType>,
  big_int: Option<TypeId>,
  big_rat: Option<TypeId>,
}

impl OverloadRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The `ng` package's `Bigint`, `Bigrat`, `Int128` and `Uint128`, with
  /// `Bigint`/`Bigrat` as the defaults of untyped big constants.
  pub fn standard(types: &TypeStore) -> Self {
    let mut registry = Self::new();

    let specs = [
      ("Bigint", "", true, true, false),
      ("Bigrat", "", true, true, true),
      ("Int128", "__1", true, true, false),
      ("Uint128", "__1", true, true, false),
    ];
    for (name, suffix, int, big, rat) in specs {
      let Some(ty) = types.lookup_named(Some(NG_PATH), name) else {
        continue;
      };
      let init = |enabled: bool, index: u8| enabled.then(|| format!("{}_Init__{}", name, index));
      registry.register(RegisteredType {
        ty,
        package: NG_PATH.to_string(),
        name: name.to_string(),
        binary_suffix: suffix.to_string(),
        init_int: init(int, 0),
        init_big: init(big, 1),
        init_rat: init(rat, 2),
      });
    }

    registry.big_int = types.lookup_named(Some(NG_PATH), "Bigint");
    registry.big_rat = types.lookup_named(Some(NG_PATH), "Bigrat");
    registry
  }

  pub fn register(
    &mut self,
    entry: RegisteredType,
  ) {
    self.entries.retain(|existing| existing.ty != entry.ty);
    self.entries.push(entry);
  }

  pub fn set_defaults(
    &mut self,
    big_int: TypeId,
    big_rat: TypeId,
  ) {
    self.big_int = Some(big_int);
    self.big_rat = Some(big_rat);
  }

  pub fn get(
    &self,
    ty: TypeId,
  ) -> Option<&RegisteredType> {
    self.entries.iter().find(|entry| entry.ty == ty)
  }

  /// Registered type an untyped big constant of `kind` defaults to.
  pub fn default_for(
    &self,
    kind: BasicKind,
  ) -> Option<&RegisteredType> {
    let ty = match kind {
      BasicKind::UntypedBigInt => self.big_int?,
      BasicKind::UntypedBigRat => self.big_rat?,
      _ => return None,
    };
    self.get(ty)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

pub fn binary_method(operator: ASTBinaryOperator) -> Option<&'static str> {
  use ASTBinaryOperator as Op;

  Some(match operator {
    Op::Add => "Gop_Add",
    Op::Subtract => "Gop_Sub",
    Op::Multiply => "Gop_Mul",
    Op::Divide => "Gop_Quo",
    Op::Modulo => "Gop_Rem",
    Op::BitAnd => "Gop_And",
    Op::BitOr => "Gop_Or",
    Op::BitXor => "Gop_Xor",
    Op::BitClear => "Gop_AndNot",
    Op::ShiftLeft => "Gop_Lsh",
    Op::ShiftRight => "Gop_Rsh",
    Op::LessThan => "Gop_LT",
    Op::LessThanOrEqual => "Gop_LE",
    Op::GreaterThan => "Gop_GT",
    Op::GreaterThanOrEqual => "Gop_GE",
    Op::Equal => "Gop_EQ",
    Op::NotEqual => "Gop_NE",
    Op::And | Op::Or => return None,
  })
}

/// `x op= y` spelled as a method: `Gop_AddAssign`.
pub fn assign_method(operator: ASTBinaryOperator) -> Option<String> {
  if operator.is_comparison() {
    return None;
  }
  binary_method(operator).map(|method| format!("{}Assign", method))
}

pub fn unary_method(operator: ASTUnaryOperator) -> Option<&'static str> {
  match operator {
    ASTUnaryOperator::Negate => Some("Gop_Neg"),
    ASTUnaryOperator::Plus => Some("Gop_Dup"),
    ASTUnaryOperator::BitNot => Some("Gop_Not"),
    _ => None,
  }
}

impl<'a> Lowerer<'a> {
  /// Registered type a binary operation on these operands dispatches to.
  pub(crate) fn dispatch_target(
    &self,
    left: &Operand,
    right: &Operand,
  ) -> Option<TypeId> {
    for operand in [left, right] {
      if let Some(entry) = self.registry.get(operand.ty) {
        return Some(entry.ty);
      }
    }

    // A big constant meeting a non-constant operand.
    for (big, other) in [(left, right), (right, left)] {
      if self.is_untyped_big(big.ty) && other.constant.is_none() {
        let kind = self.types.basic_kind(big.ty)?;
        return self.registry.default_for(kind).map(|entry| entry.ty);
      }
    }

    None
  }

  pub(crate) fn lower_registered_binary(
    &mut self,
    operator: ASTBinaryOperator,
    target: TypeId,
    left: Operand,
    right: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    let Some(entry) = self.registry.get(target).cloned() else {
      return Err(self.invalid_operation(operator.symbol(), target, span));
    };
    let Some(method) = binary_method(operator) else {
      return Err(self.invalid_operation(operator.symbol(), target, span));
    };

    let left = self.coerce(left, target)?;
    let right = if operator.is_shift() {
      self.value_of(right)?.0
    } else {
      self.coerce(right, target)?
    };

    let name = format!("{}{}", method, entry.binary_suffix);
    trace_dbg!(
      self.config,
      DebugTrace::Dispatch,
      "{} on {} lowered to {}",
      operator.symbol(),
      self.type_name(target),
      name
    );

    let receiver = self.type_node(target);
    let receiver = self.scaffold(HostKind::Paren(receiver));
    let callee = self.tree.selector(receiver, &name);
    let call = self.alloc(
      HostKind::Call {
        callee,
        args: vec![left, right],
        spread: false,
      },
      span,
    );

    let ty = if operator.is_comparison() { self.types.bool() } else { target };
    Ok(Operand::value(call, ty, span.clone()))
  }

  /// `x op= y` on a registered `x`: `x.Gop_AddAssign(y)`.
  pub(crate) fn lower_registered_assign(
    &mut self,
    operator: ASTBinaryOperator,
    target: Operand,
    value: Operand,
    span: &Span,
  ) -> LowerResult<HostId> {
    let Some(method) = assign_method(operator) else {
      return Err(self.invalid_operation(&format!("{}=", operator.symbol()), target.ty, span));
    };

    let argument = if operator.is_shift() {
      self.value_of(value)?.0
    } else {
      self.coerce(value, target.ty)?
    };

    trace_dbg!(self.config, DebugTrace::Dispatch, "{}= lowered to {}", operator.symbol(), method);
    let callee = self.tree.selector(target.id, &method);
    let call = self.tree.call(callee, vec![argument]);
    Ok(self.alloc(HostKind::ExpressionStatement(call), span))
  }

  /// `x++` on a registered `x`: `x.Gop_Inc()`.
  pub(crate) fn lower_registered_inc_dec(
    &mut self,
    target: Operand,
    increment: bool,
    span: &Span,
  ) -> HostId {
    let method = if increment { "Gop_Inc" } else { "Gop_Dec" };
    let callee = self.tree.selector(target.id, method);
    let call = self.tree.call(callee, Vec::new());
    self.alloc(HostKind::ExpressionStatement(call), span)
  }

  pub(crate) fn lower_registered_unary(
    &mut self,
    operator: ASTUnaryOperator,
    operand: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    let Some(method) = unary_method(operator) else {
      return Err(self.invalid_operation(operator.symbol(), operand.ty, span));
    };

    let callee = self.tree.selector(operand.id, method);
    let call = self.alloc(
      HostKind::Call {
        callee,
        args: Vec::new(),
        spread: false,
      },
      span,
    );
    Ok(Operand::value(call, operand.ty, span.clone()))
  }

  /// Build an untyped numeric constant as a value of the registered `target`.
  pub(crate) fn materialize(
    &mut self,
    operand: &Operand,
    target: TypeId,
  ) -> LowerResult<HostId> {
    let mismatch = DiagnosticMessage::TypeMismatch {
      expected: self.type_name(target),
      got: self.type_name(operand.ty),
      span: operand.span.clone(),
    };

    let Some(entry) = self.registry.get(target).cloned() else {
      return Err(mismatch);
    };
    let big = self.is_untyped_big(operand.ty);

    trace_dbg!(
      self.config,
      DebugTrace::Literal,
      "materialize {} as {}",
      self.source_text_at(&operand.span),
      entry.name
    );

    match &operand.constant {
      Some(ConstValue::Int(n)) => {
        let small = n.to_i64().is_some();
        if let (false, true, Some(init)) = (big, small, &entry.init_int) {
          return Ok(self.initializer(&entry.package, init, operand.id, &operand.span));
        }
        if let Some(init) = &entry.init_big {
          let value = self.big_int_value(n);
          return Ok(self.initializer(&entry.package, init, value, &operand.span));
        }
        Err(mismatch)
      },
      Some(ConstValue::Rat(r)) => {
        let Some(init) = &entry.init_rat else {
          return Err(mismatch);
        };
        let value = match (r.numer().to_i64(), r.denom().to_i64()) {
          (Some(num), Some(den)) => {
            let new_rat = self.tree.qualified(BIG_PATH, "NewRat");
            let num = self.tree.literal(&num.to_string());
            let den = self.tree.literal(&den.to_string());
            self.tree.call(new_rat, vec![num, den])
          },
          _ => self.big_set_string("Rat", &r.to_string(), None),
        };
        Ok(self.initializer(&entry.package, init, value, &operand.span))
      },
      _ => Err(mismatch),
    }
  }

  fn initializer(
    &mut self,
    package: &str,
    init: &str,
    value: HostId,
    span: &Span,
  ) -> HostId {
    let callee = self.tree.qualified(package, init);
    self.alloc(
      HostKind::Call {
        callee,
        args: vec![value],
        spread: false,
      },
      span,
    )
  }

  /// `big.NewInt(n)`, or a `SetString` parse for values past 64 bits.
  fn big_int_value(
    &mut self,
    n: &BigInt,
  ) -> HostId {
    if n.to_i64().is_some() {
      let new_int = self.tree.qualified(BIG_PATH, "NewInt");
      let literal = self.tree.literal(&n.to_string());
      return self.tree.call(new_int, vec![literal]);
    }

    let base = self.tree.literal("10");
    self.big_set_string("Int", &n.to_string(), Some(base))
  }

  /// `func() *big.T { v, _ := new(big.T).SetString("text"); return v }()`
  fn big_set_string(
    &mut self,
    type_name: &str,
    text: &str,
    base: Option<HostId>,
  ) -> HostId {
    let big_type = self.types.declare_named(Some(BIG_PATH), type_name);
    let pointer = self.types.pointer(big_type);
    let new = self.tree.ident("new");
    let ty = self.type_node(big_type);
    let fresh = self.tree.call(new, vec![ty]);
    let set_string = self.tree.selector(fresh, "SetString");
    let digits = self.tree.literal(&format!("\"{}\"", text));
    let mut args = vec![digits];
    args.extend(base);
    let parse = self.tree.call(set_string, args);
    let value = self.tree.ident("v");
    let blank = self.tree.ident("_");
    let define = self.scaffold(HostKind::Assign {
      lhs: vec![value, blank],
      rhs: vec![parse],
      define: true,
      operation: None,
    });
    let value = self.tree.ident("v");
    let ret = self.tree.ret(vec![value]);
    let body = self.tree.block(vec![define, ret]);
    let literal = self.scaffold(HostKind::FunctionLiteral {
      signature: HostSignature {
        params: Vec::new(),
        results: vec![HostParam { name: None, ty: pointer }],
        variadic: false,
      },
      body,
    });
    self.tree.call(literal, Vec::new())
  }

  pub(crate) fn invalid_operation(
    &self,
    op: &str,
    ty: TypeId,
    span: &Span,
  ) -> DiagnosticMessage {
    DiagnosticMessage::InvalidOperation {
      op: op.to_string(),
      ty: self.type_name(ty),
      span: span.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kestrel_type::oracle::prelude::prelude;

  #[test]
  fn standard_registry_knows_ng_types() {
    let mut types = TypeStore::new();
    prelude(&mut types);
    let registry = OverloadRegistry::standard(&types);

    assert_eq!(registry.len(), 4);
    let uint128 = types.lookup_named(Some(NG_PATH), "Uint128").unwrap();
    let entry = registry.get(uint128).unwrap();
    assert_eq!(entry.binary_suffix, "__1");
    assert_eq!(entry.init_int.as_deref(), Some("Uint128_Init__0"));
    assert_eq!(entry.init_rat, None);

    let bigrat = registry.default_for(BasicKind::UntypedBigRat).unwrap();
    assert_eq!(bigrat.init_rat.as_deref(), Some("Bigrat_Init__2"));
  }

  #[test]
  fn operator_method_names() {
    assert_eq!(binary_method(ASTBinaryOperator::Divide), Some("Gop_Quo"));
    assert_eq!(binary_method(ASTBinaryOperator::And), None);
    assert_eq!(assign_method(ASTBinaryOperator::Multiply).as_deref(), Some("Gop_MulAssign"));
    assert_eq!(assign_method(ASTBinaryOperator::Equal), None);
    assert_eq!(unary_method(ASTUnaryOperator::Negate), Some("Gop_Neg"));
  }

  #[test]
  fn empty_registry_has_no_defaults() {
    let registry = OverloadRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.default_for(BasicKind::UntypedBigInt).is_none());
  }
}
