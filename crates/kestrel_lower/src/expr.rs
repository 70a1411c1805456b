//! The expression walker: resolves names, checks operators and routes every
//! sugared expression kind to its desugarer.

use kestrel_ast::{
  expressions::{ASTBinaryOperator, ASTExpression, ASTUnaryOperator},
  NodeId,
};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{
  operation::{BinaryOperation, UnaryOperation},
  HostId, HostKind,
};
use kestrel_log::trace_dbg;
use kestrel_type::{
  oracle::Resolution,
  span::Span,
  types::{BasicKind, ChanDir, Type, TypeId},
  value::ConstValue,
};

use crate::{
  collector::Global,
  const_eval::{self, FoldError},
  naming::{capitalize, is_exported, BLANK},
  scope::{Symbol, SymbolKind},
  InferContext, LowerResult, Lowerer, Operand, OperandMode,
};

pub(crate) fn binary_operation(operator: ASTBinaryOperator) -> BinaryOperation {
  use ASTBinaryOperator as Op;

  match operator {
    Op::Add => BinaryOperation::Add,
    Op::Subtract => BinaryOperation::Sub,
    Op::Multiply => BinaryOperation::Mul,
    Op::Divide => BinaryOperation::Div,
    Op::Modulo => BinaryOperation::Mod,
    Op::BitAnd => BinaryOperation::BitAnd,
    Op::BitOr => BinaryOperation::BitOr,
    Op::BitXor => BinaryOperation::BitXor,
    Op::BitClear => BinaryOperation::BitClear,
    Op::ShiftLeft => BinaryOperation::BitShiftLeft,
    Op::ShiftRight => BinaryOperation::BitShiftRight,
    Op::And => BinaryOperation::And,
    Op::Or => BinaryOperation::Or,
    Op::Equal => BinaryOperation::Equal,
    Op::NotEqual => BinaryOperation::NotEqual,
    Op::LessThan => BinaryOperation::LessThan,
    Op::LessThanOrEqual => BinaryOperation::LessEqual,
    Op::GreaterThan => BinaryOperation::GreaterThan,
    Op::GreaterThanOrEqual => BinaryOperation::GreaterEqual,
  }
}

fn unary_operation(operator: ASTUnaryOperator) -> UnaryOperation {
  match operator {
    ASTUnaryOperator::Not => UnaryOperation::Not,
    ASTUnaryOperator::Negate => UnaryOperation::Neg,
    ASTUnaryOperator::Plus => UnaryOperation::Plus,
    ASTUnaryOperator::BitNot => UnaryOperation::BitNot,
    ASTUnaryOperator::AddressOf => UnaryOperation::AddressOf,
    ASTUnaryOperator::Receive => UnaryOperation::Receive,
  }
}

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_expr(
    &mut self,
    id: &NodeId,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let span = self.span(id);
    let Some(expression) = self.unit.expression(id).cloned() else {
      let ty = self.resolve_type(id)?;
      let node = self.alloc(HostKind::TypeExpression(ty), &span);
      return Ok(Operand::value(node, ty, span).with_mode(OperandMode::Type));
    };

    match expression {
      ASTExpression::Identifier(name) => self.lower_identifier(&name, &span),
      ASTExpression::Literal(literal) => self.lower_literal(&literal, &span),
      ASTExpression::CompositeLiteral { ty, elements } => self.lower_composite_literal(ty, &elements, &span, ctx),
      ASTExpression::SliceLiteral { elements } => self.lower_slice_literal(&elements, &span, ctx),
      ASTExpression::Grouping(inner) => {
        let operand = self.lower_expr(&inner, ctx)?;
        if !operand.is_value() || self.types.is_invalid(operand.ty) {
          return Ok(operand);
        }
        let id = self.alloc(HostKind::Paren(operand.id), &span);
        Ok(Operand { id, span, ..operand })
      },
      ASTExpression::MemberAccess { object, member } => self.lower_member_access(&object, &member, &span, ctx),
      ASTExpression::Index { object, index } => self.lower_index(&object, &index, &span),
      ASTExpression::SliceExpr { object, low, high, max } => self.lower_slice_expr(&object, low, high, max, &span),
      ASTExpression::TypeAssertion { object, ty } => self.lower_type_assertion(&object, ty, &span),
      ASTExpression::Call { callee, args, spread } => self.lower_call(&callee, &args, spread, &span, ctx),
      ASTExpression::Command { head, args } => self.lower_command(&head, &args, &span, ctx),
      ASTExpression::AmbiguousCommand { head, operator, operand } => {
        self.lower_ambiguous_command(&head, operator, &operand, &span, ctx)
      },
      ASTExpression::Dereference(inner) => self.lower_dereference(&inner, &span),
      ASTExpression::Unary { operator, operand } => self.lower_unary(operator, &operand, &span, ctx),
      ASTExpression::Binary { operator, left, right } => {
        let left = self.lower_expr(&left, InferContext::none())?;
        let right = self.lower_expr(&right, InferContext::none())?;
        self.lower_binary(operator, left, right, &span)
      },
      ASTExpression::FunctionLiteral { signature, body } => self.lower_function_literal(&signature, &body, &span),
      ASTExpression::Lambda { params, body } => self.lower_lambda(&params, &body, &span, ctx),
      ASTExpression::Comprehension { yields, clauses } => self.lower_comprehension(&yields, &clauses, &span, ctx),
      ASTExpression::ErrorWrap { expr, policy } => self.lower_error_wrap(&expr, &policy, &span, ctx),
    }
  }

  /// Lower `id` where a value of type `target` is required.
  pub(crate) fn lower_into(
    &mut self,
    id: &NodeId,
    target: TypeId,
  ) -> LowerResult<HostId> {
    let operand = self.lower_expr(id, InferContext::expecting(target))?;
    self.coerce(operand, target)
  }

  /// Lower `id` as a standalone value of its default type.
  pub(crate) fn lower_default(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<(HostId, TypeId)> {
    let operand = self.lower_expr(id, InferContext::none())?;
    self.value_of(operand)
  }

  /// A condition: an expression of boolean type.
  pub(crate) fn lower_condition(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<HostId> {
    let operand = self.lower_expr(id, InferContext::none())?;
    if !self.is_boolean(operand.ty) {
      return Err(DiagnosticMessage::TypeMismatch {
        expected: "bool".to_string(),
        got: self.type_name(operand.ty),
        span: operand.span,
      });
    }
    Ok(self.value_of(operand)?.0)
  }

  // #region Names
  pub(crate) fn lower_identifier(
    &mut self,
    name: &str,
    span: &Span,
  ) -> LowerResult<Operand> {
    if name == BLANK {
      return Err(DiagnosticMessage::NotAValue {
        name: name.to_string(),
        span: span.clone(),
      });
    }

    if let Some(symbol) = self.scopes.lookup(name).cloned() {
      return Ok(self.symbol_operand(name, &symbol, span));
    }

    if let Some(operand) = self.lower_global_name(name, span)? {
      return Ok(operand);
    }

    // `bar` falls back to the exported `Bar`.
    if !is_exported(name) {
      let exported = capitalize(name);
      if exported != name {
        if let Some(symbol) = self.scopes.lookup(&exported).cloned() {
          return Ok(self.symbol_operand(&exported, &symbol, span));
        }
        if let Some(operand) = self.lower_global_name(&exported, span)? {
          trace_dbg!(self.config, DebugTrace::Desugar, "{} resolved as {}", name, exported);
          return Ok(operand);
        }
      }
    }

    Err(DiagnosticMessage::UndeclaredName {
      name: name.to_string(),
      span: span.clone(),
    })
  }

  fn symbol_operand(
    &mut self,
    name: &str,
    symbol: &Symbol,
    span: &Span,
  ) -> Operand {
    match symbol.kind {
      SymbolKind::Type => {
        let id = self.alloc(HostKind::TypeExpression(symbol.ty), span);
        Operand::value(id, symbol.ty, span.clone()).with_mode(OperandMode::Type)
      },
      SymbolKind::Variable => {
        let id = self.alloc(HostKind::Identifier(name.to_string()), span);
        Operand::value(id, symbol.ty, span.clone())
      },
      SymbolKind::Constant => {
        let id = self.alloc(HostKind::Identifier(name.to_string()), span);
        Operand::constant(id, symbol.ty, symbol.constant.clone(), span.clone())
      },
    }
  }

  /// Unit-level declarations, imports and the oracle, in that order.
  fn lower_global_name(
    &mut self,
    name: &str,
    span: &Span,
  ) -> LowerResult<Option<Operand>> {
    match self.globals.get(name).cloned() {
      Some(Global::Value { root }) => {
        self.ensure_value(root, name, span)?;
        let operand = match self.scopes.lookup(name).cloned() {
          Some(symbol) => self.symbol_operand(name, &symbol, span),
          // The declaration failed and was reported on its own.
          None => {
            let invalid = self.types.invalid();
            let id = self.alloc(HostKind::Identifier(name.to_string()), span);
            Operand::value(id, invalid, span.clone())
          },
        };
        return Ok(Some(operand));
      },
      Some(Global::Func { ty, .. }) => {
        let ty = ty.unwrap_or_else(|| self.types.invalid());
        let id = self.alloc(HostKind::Identifier(name.to_string()), span);
        return Ok(Some(Operand::value(id, ty, span.clone())));
      },
      Some(Global::Type { .. }) => {
        let ty = self.resolve_type_name(name, span)?;
        let id = self.alloc(HostKind::TypeExpression(ty), span);
        return Ok(Some(Operand::value(id, ty, span.clone()).with_mode(OperandMode::Type)));
      },
      None => {},
    }

    if let Some(path) = self.imports.get(name).cloned() {
      let id = self.alloc(HostKind::Identifier(name.to_string()), span);
      let invalid = self.types.invalid();
      return Ok(Some(Operand::value(id, invalid, span.clone()).with_mode(OperandMode::Package(path))));
    }

    trace_dbg!(self.config, DebugTrace::Oracle, "resolve {}", name);
    let Some(resolution) = self.oracle.resolve(name) else {
      return Ok(None);
    };
    Ok(Some(self.resolution_operand(resolution, None, name, span)))
  }

  /// Operand for an oracle answer; `package` is the import path of a member lookup.
  pub(crate) fn resolution_operand(
    &mut self,
    resolution: Resolution,
    package: Option<&str>,
    name: &str,
    span: &Span,
  ) -> Operand {
    match resolution {
      Resolution::Value {
        package: spelled,
        name: host_name,
        ty,
      } => {
        let kind = match spelled.as_deref().or(package) {
          Some(path) => HostKind::Qualified {
            package: path.to_string(),
            name: host_name,
          },
          None => HostKind::Identifier(host_name),
        };
        let id = self.alloc(kind, span);
        Operand::value(id, ty, span.clone())
      },
      Resolution::Const { value, ty } => {
        let kind = match package {
          Some(path) => HostKind::Qualified {
            package: path.to_string(),
            name: name.to_string(),
          },
          None => HostKind::Identifier(name.to_string()),
        };
        let id = self.alloc(kind, span);
        Operand::constant(id, ty, Some(value), span.clone())
      },
      Resolution::Nil => {
        let id = self.alloc(HostKind::Identifier("nil".to_string()), span);
        let ty = self.types.untyped_nil();
        Operand::value(id, ty, span.clone()).with_mode(OperandMode::Nil)
      },
      Resolution::Type(ty) => {
        let id = self.alloc(HostKind::TypeExpression(ty), span);
        Operand::value(id, ty, span.clone()).with_mode(OperandMode::Type)
      },
      Resolution::Package(path) => {
        let id = self.alloc(HostKind::Identifier(name.to_string()), span);
        let invalid = self.types.invalid();
        Operand::value(id, invalid, span.clone()).with_mode(OperandMode::Package(path))
      },
      Resolution::Builtin(builtin) => {
        let id = self.alloc(HostKind::Identifier(builtin.name().to_string()), span);
        let invalid = self.types.invalid();
        Operand::value(id, invalid, span.clone()).with_mode(OperandMode::Builtin(builtin))
      },
    }
  }
  // #endregion Names

  // #region Operators
  pub(crate) fn lower_binary(
    &mut self,
    operator: ASTBinaryOperator,
    left: Operand,
    right: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    self.check_value(&left)?;
    self.check_value(&right)?;

    if self.is_invalid(left.ty) || self.is_invalid(right.ty) {
      let id = self.tree.binary(binary_operation(operator), left.id, right.id);
      return Ok(Operand::value(id, left.ty, span.clone()));
    }

    let untyped = |lowerer: &Self, operand: &Operand| {
      operand.constant.is_some() && operand.mode == OperandMode::Value && lowerer.types.is_untyped(operand.ty)
    };
    if untyped(self, &left) && untyped(self, &right) {
      if let Some(folded) = self.fold_binary(operator, &left, &right, span)? {
        return Ok(folded);
      }
    }

    if let Some(target) = self.dispatch_target(&left, &right) {
      return self.lower_registered_binary(operator, target, left, right, span);
    }

    self.lower_native_binary(operator, left, right, span)
  }

  /// Fold two untyped constants; `None` when the operands do not fold (strings).
  fn fold_binary(
    &mut self,
    operator: ASTBinaryOperator,
    left: &Operand,
    right: &Operand,
    span: &Span,
  ) -> LowerResult<Option<Operand>> {
    let (Some(a), Some(b)) = (&left.constant, &right.constant) else {
      return Ok(None);
    };
    let (Some(left_kind), Some(right_kind)) = (self.types.basic_kind(left.ty), self.types.basic_kind(right.ty)) else {
      return Ok(None);
    };
    if matches!(a, ConstValue::String(_)) || matches!(b, ConstValue::String(_)) {
      return Ok(None);
    }

    let big = |kind: BasicKind| matches!(kind, BasicKind::UntypedBigInt | BasicKind::UntypedBigRat);
    let exact = big(left_kind) || big(right_kind);
    let value = match const_eval::fold_binary(operator, a, b, exact) {
      Ok(value) => value,
      Err(FoldError::DivisionByZero) => {
        return Err(DiagnosticMessage::InvalidOperation {
          op: operator.symbol().to_string(),
          ty: "division by zero".to_string(),
          span: span.clone(),
        });
      },
      Err(FoldError::Overflow) => {
        let operands = if left.span.file == right.span.file {
          Span::merge(&left.span, &right.span)
        } else {
          span.clone()
        };
        return Err(DiagnosticMessage::ConstantOverflow {
          text: self.source_text_at(&operands),
          span: operands,
        });
      },
      Err(FoldError::Invalid) => return Err(self.invalid_operation(operator.symbol(), left.ty, span)),
    };

    let kind = const_eval::promote(left_kind, right_kind, &value);
    let ty = self.types.basic(kind);
    trace_dbg!(self.config, DebugTrace::Dispatch, "folded {} to {:?}", self.source_text_at(span), value);

    // Big results are rebuilt from the value when materialized.
    let id = if big(kind) {
      self.alloc(HostKind::Literal(self.source_text_at(span)), span)
    } else {
      let left = self.fold_operand_node(left);
      let right = self.fold_operand_node(right);
      self.alloc(
        HostKind::Binary {
          operation: binary_operation(operator),
          left,
          right,
        },
        span,
      )
    };

    Ok(Some(Operand::constant(id, ty, Some(value), span.clone())))
  }

  /// Host node standing for a folded operand: big operands are spelled by value.
  fn fold_operand_node(
    &mut self,
    operand: &Operand,
  ) -> HostId {
    match (&operand.constant, self.is_untyped_big(operand.ty)) {
      (Some(ConstValue::Int(n)), true) => self.tree.literal(&n.to_string()),
      _ => operand.id,
    }
  }

  fn lower_native_binary(
    &mut self,
    operator: ASTBinaryOperator,
    left: Operand,
    right: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    let operation = binary_operation(operator);

    if operator.is_shift() {
      let shifted = left.ty;
      let kind = self.types.basic_kind(shifted);
      if !kind.is_some_and(|kind| kind.is_integer() || kind == BasicKind::UntypedFloat) {
        return Err(self.invalid_operation(operator.symbol(), shifted, span));
      }
      let (amount, amount_ty) = self.value_of(right)?;
      if !self.types.basic_kind(amount_ty).is_some_and(|kind| kind.is_integer()) {
        return Err(self.invalid_operation(operator.symbol(), amount_ty, span));
      }
      let (value, ty) = self.value_of(left)?;
      let id = self.alloc(
        HostKind::Binary {
          operation,
          left: value,
          right: amount,
        },
        span,
      );
      return Ok(Operand::value(id, ty, span.clone()));
    }

    if operator.is_comparison() {
      return self.lower_comparison(operator, left, right, span);
    }

    let (left_id, right_id, ty) = self.unify_operands(left, right, span)?;

    let valid = if operator.is_logical() {
      self.is_boolean(ty)
    } else {
      let kind = self.types.basic_kind(ty);
      match operator {
        ASTBinaryOperator::Add => kind.is_some_and(|k| k.is_numeric() || matches!(k, BasicKind::String | BasicKind::UntypedString)),
        ASTBinaryOperator::Subtract | ASTBinaryOperator::Multiply | ASTBinaryOperator::Divide => {
          kind.is_some_and(|k| k.is_numeric())
        },
        _ => kind.is_some_and(|k| k.is_integer()),
      }
    };
    if !valid {
      return Err(self.invalid_operation(operator.symbol(), ty, span));
    }

    let id = self.alloc(
      HostKind::Binary {
        operation,
        left: left_id,
        right: right_id,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }

  fn lower_comparison(
    &mut self,
    operator: ASTBinaryOperator,
    left: Operand,
    right: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    let operation = binary_operation(operator);
    let result = self.types.basic(BasicKind::UntypedBool);

    let nil = (left.mode == OperandMode::Nil, right.mode == OperandMode::Nil);
    let (left_id, right_id) = match nil {
      (true, true) => return Err(DiagnosticMessage::UntypedNil { span: span.clone() }),
      (true, false) => {
        let target = right.ty;
        let left_id = self.coerce(left, target)?;
        (left_id, right.id)
      },
      (false, true) => {
        let target = left.ty;
        let right_id = self.coerce(right, target)?;
        (left.id, right_id)
      },
      _ => {
        let (left_id, right_id, ty) = self.unify_operands(left, right, span)?;
        let ordered = !matches!(operator, ASTBinaryOperator::Equal | ASTBinaryOperator::NotEqual);
        let kind = self.types.basic_kind(ty);
        if ordered && !kind.is_some_and(|k| (k.is_numeric() && !k.is_complex()) || matches!(k, BasicKind::String | BasicKind::UntypedString)) {
          return Err(self.invalid_operation(operator.symbol(), ty, span));
        }
        (left_id, right_id)
      },
    };

    let id = self.alloc(
      HostKind::Binary {
        operation,
        left: left_id,
        right: right_id,
      },
      span,
    );
    Ok(Operand::value(id, result, span.clone()))
  }

  /// Bring both operands to one type: an untyped side takes the other's type.
  fn unify_operands(
    &mut self,
    left: Operand,
    right: Operand,
    span: &Span,
  ) -> LowerResult<(HostId, HostId, TypeId)> {
    let left_untyped = self.types.is_untyped(left.ty);
    let right_untyped = self.types.is_untyped(right.ty);

    match (left_untyped, right_untyped) {
      (true, false) => {
        let ty = right.ty;
        Ok((self.coerce(left, ty)?, right.id, ty))
      },
      (false, true) => {
        let ty = left.ty;
        Ok((left.id, self.coerce(right, ty)?, ty))
      },
      (true, true) => {
        let (Some(left_kind), Some(right_kind)) = (self.types.basic_kind(left.ty), self.types.basic_kind(right.ty))
        else {
          return Err(self.mismatch(&right, left.ty));
        };
        let kind = const_eval::promote(left_kind, right_kind, &ConstValue::int(0));
        let ty = self.types.basic(kind);
        Ok((left.id, right.id, ty))
      },
      (false, false) => {
        if left.ty == right.ty || self.assignable(right.ty, left.ty) && self.assignable(left.ty, right.ty) {
          return Ok((left.id, right.id, left.ty));
        }
        // Interfaces compare against any value that implements them.
        if self.types.is_interface(left.ty) && self.assignable(right.ty, left.ty) {
          return Ok((left.id, right.id, left.ty));
        }
        if self.types.is_interface(right.ty) && self.assignable(left.ty, right.ty) {
          return Ok((left.id, right.id, right.ty));
        }
        Err(DiagnosticMessage::TypeMismatch {
          expected: self.type_name(left.ty),
          got: self.type_name(right.ty),
          span: span.clone(),
        })
      },
    }
  }

  pub(crate) fn is_boolean(
    &self,
    ty: TypeId,
  ) -> bool {
    matches!(
      self.types.basic_kind(ty),
      Some(BasicKind::Bool) | Some(BasicKind::UntypedBool)
    ) || self.types.is_invalid(ty)
  }

  pub(crate) fn lower_unary(
    &mut self,
    operator: ASTUnaryOperator,
    operand: &NodeId,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    match operator {
      ASTUnaryOperator::AddressOf => {
        let pointee = ctx.expected.and_then(|expected| match self.types.get(&self.types.underlying(expected)) {
          Type::Pointer(inner) => Some(*inner),
          _ => None,
        });
        let inner = self.lower_expr(operand, InferContext::maybe(pointee))?;
        self.check_value(&inner)?;
        let ty = self.types.pointer(inner.ty);
        let id = self.alloc(
          HostKind::Unary {
            operation: UnaryOperation::AddressOf,
            operand: inner.id,
          },
          span,
        );
        Ok(Operand::value(id, ty, span.clone()))
      },
      ASTUnaryOperator::Receive => {
        let channel = self.lower_expr(operand, InferContext::none())?;
        self.check_value(&channel)?;
        let element = match self.types.get(&self.types.underlying(channel.ty)) {
          Type::Chan { element, dir } if *dir != ChanDir::Send => *element,
          _ => return Err(self.invalid_operation("<-", channel.ty, span)),
        };
        let id = self.alloc(
          HostKind::Unary {
            operation: UnaryOperation::Receive,
            operand: channel.id,
          },
          span,
        );
        Ok(Operand::value(id, element, span.clone()).with_comma_ok())
      },
      _ => {
        let inner = self.lower_expr(operand, InferContext::none())?;
        self.lower_unary_operand(operator, inner, span)
      },
    }
  }

  pub(crate) fn lower_unary_operand(
    &mut self,
    operator: ASTUnaryOperator,
    inner: Operand,
    span: &Span,
  ) -> LowerResult<Operand> {
    self.check_value(&inner)?;

    if let (Some(value), true) = (&inner.constant, self.types.is_untyped(inner.ty)) {
      let folded = const_eval::fold_unary(operator, value)
        .map_err(|_| self.invalid_operation(operator.symbol(), inner.ty, span))?;
      let id = match &folded {
        // `!true` prints as `false`.
        ConstValue::Bool(b) => self.alloc(HostKind::Literal(b.to_string()), span),
        _ if self.is_untyped_big(inner.ty) => self.alloc(HostKind::Literal(self.source_text_at(span)), span),
        _ => self.alloc(
          HostKind::Unary {
            operation: unary_operation(operator),
            operand: inner.id,
          },
          span,
        ),
      };
      return Ok(Operand::constant(id, inner.ty, Some(folded), span.clone()));
    }

    if self.registry.get(inner.ty).is_some() {
      return self.lower_registered_unary(operator, inner, span);
    }

    let kind = self.types.basic_kind(inner.ty);
    let valid = self.types.is_invalid(inner.ty)
      || match operator {
        ASTUnaryOperator::Not => self.is_boolean(inner.ty),
        ASTUnaryOperator::Negate | ASTUnaryOperator::Plus => kind.is_some_and(|k| k.is_numeric()),
        ASTUnaryOperator::BitNot => kind.is_some_and(|k| k.is_integer()),
        _ => false,
      };
    if !valid {
      return Err(self.invalid_operation(operator.symbol(), inner.ty, span));
    }

    let id = self.alloc(
      HostKind::Unary {
        operation: unary_operation(operator),
        operand: inner.id,
      },
      span,
    );
    Ok(Operand::value(id, inner.ty, span.clone()))
  }

  fn lower_dereference(
    &mut self,
    inner: &NodeId,
    span: &Span,
  ) -> LowerResult<Operand> {
    let operand = self.lower_expr(inner, InferContext::none())?;
    if operand.mode == OperandMode::Type {
      let ty = self.types.pointer(operand.ty);
      let id = self.alloc(HostKind::TypeExpression(ty), span);
      return Ok(Operand::value(id, ty, span.clone()).with_mode(OperandMode::Type));
    }

    self.check_value(&operand)?;
    let pointee = match self.types.get(&self.types.underlying(operand.ty)) {
      Type::Pointer(inner) => *inner,
      Type::Invalid => operand.ty,
      _ => return Err(self.invalid_operation("*", operand.ty, span)),
    };
    let id = self.alloc(HostKind::Dereference(operand.id), span);
    Ok(Operand::value(id, pointee, span.clone()))
  }
  // #endregion Operators

  // #region Postfix
  fn lower_index(
    &mut self,
    object: &NodeId,
    index: &NodeId,
    span: &Span,
  ) -> LowerResult<Operand> {
    let object = self.lower_expr(object, InferContext::none())?;
    self.check_value(&object)?;

    let container = match self.types.get(&self.types.underlying(object.ty)) {
      Type::Pointer(inner) => self.types.underlying(*inner),
      _ => self.types.underlying(object.ty),
    };

    let (index, element, comma_ok) = match self.types.get(&container).clone() {
      Type::Map { key, value } => (self.lower_into(index, key)?, value, true),
      Type::Slice(element) | Type::Array { element, .. } => (self.lower_int_index(index)?, element, false),
      Type::Basic(kind) if matches!(kind, BasicKind::String | BasicKind::UntypedString) => {
        (self.lower_int_index(index)?, self.types.basic(BasicKind::Uint8), false)
      },
      Type::Invalid => (self.lower_default(index)?.0, container, false),
      _ => return Err(self.invalid_operation("[]", object.ty, span)),
    };

    let (object_id, _) = self.value_of(object)?;
    let id = self.alloc(HostKind::Index { object: object_id, index }, span);
    let operand = Operand::value(id, element, span.clone());
    Ok(if comma_ok { operand.with_comma_ok() } else { operand })
  }

  fn lower_int_index(
    &mut self,
    index: &NodeId,
  ) -> LowerResult<HostId> {
    let operand = self.lower_expr(index, InferContext::none())?;
    let span = operand.span.clone();
    let (id, ty) = self.value_of(operand)?;
    if !self.types.basic_kind(ty).is_some_and(|kind| kind.is_integer()) && !self.is_invalid(ty) {
      return Err(DiagnosticMessage::TypeMismatch {
        expected: "integer index".to_string(),
        got: self.type_name(ty),
        span,
      });
    }
    Ok(id)
  }

  fn lower_slice_expr(
    &mut self,
    object: &NodeId,
    low: Option<NodeId>,
    high: Option<NodeId>,
    max: Option<NodeId>,
    span: &Span,
  ) -> LowerResult<Operand> {
    let object = self.lower_expr(object, InferContext::none())?;
    self.check_value(&object)?;

    let ty = match self.types.get(&self.types.underlying(object.ty)).clone() {
      Type::Slice(_) => object.ty,
      Type::Array { element, .. } => self.types.slice(element),
      Type::Pointer(inner) => match self.types.get(&self.types.underlying(inner)).clone() {
        Type::Array { element, .. } => self.types.slice(element),
        _ => return Err(self.invalid_operation("[:]", object.ty, span)),
      },
      Type::Basic(kind) if matches!(kind, BasicKind::String | BasicKind::UntypedString) => self.types.string(),
      Type::Invalid => object.ty,
      _ => return Err(self.invalid_operation("[:]", object.ty, span)),
    };

    let mut bounds = [None, None, None];
    for (slot, bound) in bounds.iter_mut().zip([low, high, max]) {
      if let Some(bound) = bound {
        *slot = Some(self.lower_int_index(&bound)?);
      }
    }

    let [low, high, max] = bounds;
    let (object_id, _) = self.value_of(object)?;
    let id = self.alloc(
      HostKind::SliceExpr {
        object: object_id,
        low,
        high,
        max,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }

  fn lower_type_assertion(
    &mut self,
    object: &NodeId,
    ty: Option<NodeId>,
    span: &Span,
  ) -> LowerResult<Operand> {
    let Some(ty) = ty else {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: ".(type) outside a type switch".to_string(),
        span: span.clone(),
      });
    };

    let object = self.lower_expr(object, InferContext::none())?;
    self.check_value(&object)?;
    if !self.types.is_interface(object.ty) && !self.is_invalid(object.ty) {
      return Err(DiagnosticMessage::TypeMismatch {
        expected: "interface".to_string(),
        got: self.type_name(object.ty),
        span: object.span,
      });
    }

    let target = self.resolve_type(&ty)?;
    let id = self.alloc(
      HostKind::TypeAssert {
        object: object.id,
        ty: Some(target),
      },
      span,
    );
    Ok(Operand::value(id, target, span.clone()).with_comma_ok())
  }
  // #endregion Postfix
}
