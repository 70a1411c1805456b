//! Calls, conversions and builtins.

use kestrel_ast::{
  expressions::{ASTExpression, ASTUnaryOperator},
  NodeId,
};
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostId, HostKind};
use kestrel_type::{
  oracle::Builtin,
  span::Span,
  types::{BasicKind, ChanDir, Signature, Type, TypeId},
};

use crate::{const_eval::representable, InferContext, LowerResult, Lowerer, Operand, OperandMode};

/// One argument of a call as written.
#[derive(Debug, Clone)]
pub(crate) enum Argument {
  Node(NodeId),
  /// The operand of an ambiguous command, `f -x`.
  Unary(ASTUnaryOperator, NodeId, Span),
}

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_call(
    &mut self,
    callee: &NodeId,
    args: &[NodeId],
    spread: bool,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let callee = self.lower_expr(callee, InferContext::callee())?;
    let args = args.iter().map(|arg| Argument::Node(*arg)).collect();
    self.lower_call_operand(callee, args, spread, span, ctx)
  }

  pub(crate) fn lower_call_operand(
    &mut self,
    callee: Operand,
    args: Vec<Argument>,
    spread: bool,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    match callee.mode.clone() {
      OperandMode::Type => self.lower_conversion(callee, args, span),
      OperandMode::Builtin(builtin) => self.lower_builtin(builtin, callee, args, spread, span, ctx),
      OperandMode::Value => {
        if self.is_invalid(callee.ty) {
          let mut lowered = Vec::with_capacity(args.len());
          for arg in &args {
            let operand = self.lower_argument(arg, InferContext::none())?;
            lowered.push(operand.id);
          }
          let id = self.call_node(callee.id, lowered, spread, span);
          return Ok(Operand::value(id, callee.ty, span.clone()));
        }

        let Some(signature) = self.types.signature(callee.ty).cloned() else {
          return Err(DiagnosticMessage::NotCallable {
            text: self.source_text_at(&callee.span),
            span: callee.span,
          });
        };
        let args = self.lower_arguments(&signature, &args, spread, span)?;
        let id = self.call_node(callee.id, args, spread, span);
        Ok(self.result_operand(id, &signature.results, span))
      },
      OperandMode::Package(_) | OperandMode::NoValue | OperandMode::Nil => Err(DiagnosticMessage::NotCallable {
        text: self.source_text_at(&callee.span),
        span: callee.span,
      }),
    }
  }

  pub(crate) fn lower_argument(
    &mut self,
    arg: &Argument,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    match arg {
      Argument::Node(id) => self.lower_expr(id, ctx),
      Argument::Unary(operator, operand, span) => self.lower_unary(*operator, operand, span, ctx),
    }
  }

  /// Arguments checked and converted against `signature`.
  fn lower_arguments(
    &mut self,
    signature: &Signature,
    args: &[Argument],
    spread: bool,
    span: &Span,
  ) -> LowerResult<Vec<HostId>> {
    let params = &signature.params;
    let variadic = signature.variadic && !params.is_empty();

    // f(g()) where g returns several values.
    if let [single] = args {
      if !spread && (params.len() > 1 || variadic) {
        let first = self.param_type(signature, 0, false);
        let operand = self.lower_argument(single, InferContext::expecting(first))?;
        if let Type::Tuple(results) = self.types.get(&operand.ty).clone() {
          let fits = if variadic {
            results.len() + 1 >= params.len()
          } else {
            results.len() == params.len()
          };
          if !fits {
            return Err(DiagnosticMessage::ArgumentCountMismatch {
              expected: params.len(),
              got: results.len(),
              span: span.clone(),
            });
          }
          for (i, result) in results.iter().enumerate() {
            let param = self.param_type(signature, i, false);
            if !self.assignable(*result, param) {
              return Err(DiagnosticMessage::TypeMismatch {
                expected: self.type_name(param),
                got: self.type_name(*result),
                span: operand.span,
              });
            }
          }
          return Ok(vec![operand.id]);
        }
        if variadic && params.len() <= 2 {
          return Ok(vec![self.coerce(operand, first)?]);
        }
        return Err(DiagnosticMessage::ArgumentCountMismatch {
          expected: params.len(),
          got: 1,
          span: span.clone(),
        });
      }
    }

    let count_ok = match (variadic, spread) {
      (true, false) => args.len() + 1 >= params.len(),
      _ => args.len() == params.len(),
    };
    if !count_ok || (spread && !variadic) {
      return Err(DiagnosticMessage::ArgumentCountMismatch {
        expected: params.len(),
        got: args.len(),
        span: span.clone(),
      });
    }

    let mut lowered = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
      let expected = self.param_type(signature, i, spread);
      let operand = self.lower_argument(arg, InferContext::expecting(expected))?;
      lowered.push(self.coerce(operand, expected)?);
    }
    Ok(lowered)
  }

  /// Type the `index`th argument must have; the variadic tail takes the
  /// element type unless the slice is spread.
  fn param_type(
    &self,
    signature: &Signature,
    index: usize,
    spread: bool,
  ) -> TypeId {
    let last = signature.params.len().saturating_sub(1);
    if signature.variadic && index >= last {
      let tail = signature.params[last];
      if spread {
        return tail;
      }
      return match self.types.get(&tail) {
        Type::Slice(element) => *element,
        _ => tail,
      };
    }
    signature.params.get(index).copied().unwrap_or_else(|| self.types.invalid())
  }

  fn call_node(
    &mut self,
    callee: HostId,
    args: Vec<HostId>,
    spread: bool,
    span: &Span,
  ) -> HostId {
    self.alloc(HostKind::Call { callee, args, spread }, span)
  }

  /// Operand for a call producing `results`.
  pub(crate) fn result_operand(
    &mut self,
    id: HostId,
    results: &[TypeId],
    span: &Span,
  ) -> Operand {
    match results {
      [] => {
        let ty = self.types.tuple(Vec::new());
        Operand::value(id, ty, span.clone()).with_mode(OperandMode::NoValue)
      },
      [single] => Operand::value(id, *single, span.clone()),
      _ => {
        let ty = self.types.tuple(results.to_vec());
        Operand::value(id, ty, span.clone())
      },
    }
  }

  // #region Conversions
  fn lower_conversion(
    &mut self,
    callee: Operand,
    args: Vec<Argument>,
    span: &Span,
  ) -> LowerResult<Operand> {
    let target = callee.ty;
    let [arg] = args.as_slice() else {
      return Err(DiagnosticMessage::ArgumentCountMismatch {
        expected: 1,
        got: args.len(),
        span: span.clone(),
      });
    };

    // T([1, 2]) and T({"a": 1}) build the composite directly.
    if let Argument::Node(node) = arg {
      let elements = match self.unit.expression(node) {
        Some(ASTExpression::SliceLiteral { elements }) => Some(elements.clone()),
        Some(ASTExpression::CompositeLiteral { ty: None, elements }) => Some(elements.clone()),
        _ => None,
      };
      if let (Some(elements), true) = (elements, self.is_composite(target)) {
        return self.complete_composite(target, &elements, span);
      }
    }

    let operand = self.lower_argument(arg, InferContext::none())?;
    self.check_value(&operand)?;
    let untyped_constant = operand.constant.is_some() && self.types.is_untyped(operand.ty);

    if untyped_constant && self.registry.get(target).is_some() {
      let id = self.materialize(&operand, target)?;
      return Ok(Operand::value(id, target, span.clone()));
    }

    let value = if untyped_constant {
      match self.types.basic_kind(target) {
        Some(kind) if kind.is_numeric() => {
          if let Some(value) = &operand.constant {
            if !representable(value, kind) {
              return Err(DiagnosticMessage::ConstantOverflow {
                text: self.source_text_at(&operand.span),
                span: operand.span.clone(),
              });
            }
          }
          operand.constant.clone()
        },
        Some(BasicKind::String) | Some(BasicKind::Bool) => operand.constant.clone(),
        _ => None,
      }
    } else {
      None
    };

    let argument = if self.is_untyped_big(operand.ty) {
      self.value_of(operand)?.0
    } else {
      operand.id
    };

    let id = self.call_node(callee.id, vec![argument], false, span);
    Ok(Operand::constant(id, target, value, span.clone()))
  }
  // #endregion Conversions

  // #region Builtins
  fn lower_builtin(
    &mut self,
    builtin: Builtin,
    callee: Operand,
    args: Vec<Argument>,
    spread: bool,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let arity = |expected: usize| -> LowerResult<()> {
      if args.len() == expected {
        Ok(())
      } else {
        Err(DiagnosticMessage::ArgumentCountMismatch {
          expected,
          got: args.len(),
          span: span.clone(),
        })
      }
    };

    let int = self.types.int();
    let (host_args, result): (Vec<HostId>, Vec<TypeId>) = match builtin {
      Builtin::Len | Builtin::Cap => {
        arity(1)?;
        let (id, ty) = self.builtin_value(&args[0])?;
        let valid = match self.types.get(&self.types.underlying(ty)) {
          Type::Slice(_) | Type::Array { .. } | Type::Chan { .. } | Type::Invalid => true,
          Type::Map { .. } | Type::Basic(BasicKind::String) => builtin == Builtin::Len,
          Type::Pointer(inner) => matches!(self.types.get(&self.types.underlying(*inner)), Type::Array { .. }),
          _ => false,
        };
        if !valid {
          return Err(self.invalid_operation(builtin.name(), ty, span));
        }
        (vec![id], vec![int])
      },
      Builtin::Append => {
        if args.is_empty() {
          return Err(DiagnosticMessage::ArgumentCountMismatch {
            expected: 1,
            got: 0,
            span: span.clone(),
          });
        }
        let slice = match ctx.expected {
          Some(expected) => self.lower_argument(&args[0], InferContext::expecting(expected))?,
          None => self.lower_argument(&args[0], InferContext::none())?,
        };
        let slice_ty = slice.ty;
        let Type::Slice(element) = self.types.get(&self.types.underlying(slice_ty)).clone() else {
          return Err(self.invalid_operation("append", slice_ty, span));
        };
        let mut ids = vec![self.coerce(slice, slice_ty)?];
        let rest = &args[1..];
        if spread && rest.len() != 1 {
          return Err(DiagnosticMessage::ArgumentCountMismatch {
            expected: 2,
            got: args.len(),
            span: span.clone(),
          });
        }
        let target = if spread { slice_ty } else { element };
        for arg in rest {
          let operand = self.lower_argument(arg, InferContext::expecting(target))?;
          ids.push(self.coerce(operand, target)?);
        }
        (ids, vec![slice_ty])
      },
      Builtin::Make => {
        if args.is_empty() || args.len() > 3 {
          return Err(DiagnosticMessage::ArgumentCountMismatch {
            expected: 1,
            got: args.len(),
            span: span.clone(),
          });
        }
        let ty = self.builtin_type(&args[0])?;
        if !matches!(
          self.types.get(&self.types.underlying(ty)),
          Type::Slice(_) | Type::Map { .. } | Type::Chan { .. }
        ) {
          return Err(self.invalid_operation("make", ty, span));
        }
        let mut ids = vec![self.type_node(ty)];
        for arg in &args[1..] {
          let operand = self.lower_argument(arg, InferContext::expecting(int))?;
          ids.push(self.coerce(operand, int)?);
        }
        (ids, vec![ty])
      },
      Builtin::New => {
        arity(1)?;
        let ty = self.builtin_type(&args[0])?;
        let pointer = self.types.pointer(ty);
        (vec![self.type_node(ty)], vec![pointer])
      },
      Builtin::Delete => {
        arity(2)?;
        let (map, map_ty) = self.builtin_value(&args[0])?;
        let Type::Map { key, .. } = self.types.get(&self.types.underlying(map_ty)).clone() else {
          return Err(self.invalid_operation("delete", map_ty, span));
        };
        let operand = self.lower_argument(&args[1], InferContext::expecting(key))?;
        let key = self.coerce(operand, key)?;
        (vec![map, key], vec![])
      },
      Builtin::Close => {
        arity(1)?;
        let (chan, ty) = self.builtin_value(&args[0])?;
        if !matches!(
          self.types.get(&self.types.underlying(ty)),
          Type::Chan { dir, .. } if *dir != ChanDir::Recv
        ) {
          return Err(self.invalid_operation("close", ty, span));
        }
        (vec![chan], vec![])
      },
      Builtin::Copy => {
        arity(2)?;
        let (dst, _) = self.builtin_value(&args[0])?;
        let (src, _) = self.builtin_value(&args[1])?;
        (vec![dst, src], vec![int])
      },
      Builtin::Panic => {
        arity(1)?;
        let any = self.types.any();
        let operand = self.lower_argument(&args[0], InferContext::expecting(any))?;
        (vec![self.coerce(operand, any)?], vec![])
      },
      Builtin::Recover => {
        arity(0)?;
        (vec![], vec![self.types.any()])
      },
      Builtin::Complex => {
        arity(2)?;
        let (real, real_ty) = self.builtin_value(&args[0])?;
        let (imag, _) = self.builtin_value(&args[1])?;
        let kind = match self.types.basic_kind(real_ty) {
          Some(BasicKind::Float32) => BasicKind::Complex64,
          _ => BasicKind::Complex128,
        };
        (vec![real, imag], vec![self.types.basic(kind)])
      },
      Builtin::Real | Builtin::Imag => {
        arity(1)?;
        let (value, ty) = self.builtin_value(&args[0])?;
        let kind = match self.types.basic_kind(ty) {
          Some(BasicKind::Complex64) => BasicKind::Float32,
          Some(kind) if kind.is_complex() => BasicKind::Float64,
          _ => return Err(self.invalid_operation(builtin.name(), ty, span)),
        };
        (vec![value], vec![self.types.basic(kind)])
      },
    };

    let spread = spread && builtin == Builtin::Append;
    let id = self.call_node(callee.id, host_args, spread, span);
    Ok(self.result_operand(id, &result, span))
  }

  fn builtin_value(
    &mut self,
    arg: &Argument,
  ) -> LowerResult<(HostId, TypeId)> {
    let operand = self.lower_argument(arg, InferContext::none())?;
    self.value_of(operand)
  }

  fn builtin_type(
    &mut self,
    arg: &Argument,
  ) -> LowerResult<TypeId> {
    let operand = self.lower_argument(arg, InferContext::none())?;
    if operand.mode != OperandMode::Type {
      return Err(DiagnosticMessage::NotAType {
        name: self.source_text_at(&operand.span),
        span: operand.span,
      });
    }
    Ok(operand.ty)
  }
  // #endregion Builtins
}
