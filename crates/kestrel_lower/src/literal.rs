//! Basic literals and the literal class resolver for untyped `[...]` and
//! `{...}` literals.

use kestrel_ast::expressions::{ASTElement, ASTLiteral, LiteralKind};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostElement, HostKind};
use kestrel_log::trace_dbg;
use kestrel_type::{
  span::Span,
  types::{BasicKind, Type, TypeId},
  value::ConstValue,
};
use num_traits::Signed;
use ordered_float::OrderedFloat;

use crate::{const_eval, InferContext, LowerResult, Lowerer, Operand, OperandMode};

/// Numeric classes an element can contribute, widest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NumericClass {
  Int,
  Rune,
  Float,
  Complex,
}

/// Running unification of the element types of one literal.
#[derive(Debug, Default)]
struct ClassAccumulator {
  numeric: Option<NumericClass>,
  big_int: bool,
  big_rat: bool,
  strings: bool,
  bools: bool,
  typed: Option<TypeId>,
  /// Untyped constants that must be representable in `typed`.
  untyped: Vec<Operand>,
  top: bool,
}

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_literal(
    &mut self,
    literal: &ASTLiteral,
    span: &Span,
  ) -> LowerResult<Operand> {
    let overflow = || DiagnosticMessage::ConstantOverflow {
      text: literal.raw.clone(),
      span: span.clone(),
    };

    let (kind, value) = match literal.kind {
      LiteralKind::Int => (BasicKind::UntypedInt, ConstValue::parse_int(&literal.raw).ok_or_else(overflow)?),
      LiteralKind::Float => (BasicKind::UntypedFloat, ConstValue::parse_float(&literal.raw).ok_or_else(overflow)?),
      LiteralKind::Rune => (BasicKind::UntypedRune, ConstValue::parse_rune(&literal.raw).ok_or_else(overflow)?),
      LiteralKind::String => (BasicKind::UntypedString, ConstValue::String(literal.raw.clone())),
      LiteralKind::Imaginary => {
        let digits = literal.raw.trim_end_matches('i');
        let imaginary = ConstValue::parse_float(digits)
          .and_then(|value| value.as_f64())
          .ok_or_else(overflow)?;
        (
          BasicKind::UntypedComplex,
          ConstValue::Complex(OrderedFloat(0.0), OrderedFloat(imaginary)),
        )
      },
      LiteralKind::BigInt => {
        let value = ConstValue::parse_int(&literal.raw)
          .or_else(|| ConstValue::parse_float(&literal.raw))
          .ok_or_else(overflow)?;
        match value {
          ConstValue::Int(_) => (BasicKind::UntypedBigInt, value),
          ConstValue::Rat(_) => (BasicKind::UntypedBigRat, value),
          _ => return Err(overflow()),
        }
      },
    };

    let id = self.alloc(HostKind::Literal(literal.raw.clone()), span);
    let ty = self.types.basic(kind);
    Ok(Operand::constant(id, ty, Some(value), span.clone()))
  }

  /// Untyped `[a, b, c]`.
  pub(crate) fn lower_slice_literal(
    &mut self,
    elements: &[ASTElement],
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    if let Some(expected) = ctx.expected {
      let underlying = self.types.underlying(expected);
      if matches!(self.types.get(&underlying), Type::Slice(_) | Type::Array { .. }) {
        return self.complete_composite(expected, elements, span);
      }
      if self.types.is_interface(expected) && elements.is_empty() {
        let any = self.types.any();
        let ty = self.types.slice(any);
        return self.complete_composite(ty, elements, span);
      }
    }

    if elements.is_empty() {
      return Err(DiagnosticMessage::EmptyLiteralWithoutContext { span: span.clone() });
    }

    let mut lowered = Vec::with_capacity(elements.len());
    for element in elements {
      let key = match &element.key {
        Some(key) => Some(self.lower_index_key(key)?),
        None => None,
      };
      let value = self.lower_expr(&element.value, InferContext::none())?;
      lowered.push((key, value));
    }

    let values: Vec<Operand> = lowered.iter().map(|(_, value)| value.clone()).collect();
    let element = self.unify_class(&values, span)?;
    let ty = self.types.slice(element);
    trace_dbg!(self.config, DebugTrace::Literal, "slice literal class {}", self.type_name(ty));

    let mut host = Vec::with_capacity(lowered.len());
    for (key, value) in lowered {
      let value = self.coerce(value, element)?;
      host.push(HostElement { key, value });
    }

    let id = self.alloc(
      HostKind::Composite {
        ty: Some(ty),
        elements: host,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }

  /// A sparse index of an array-style literal: a non-negative constant.
  pub(crate) fn lower_index_key(
    &mut self,
    key: &kestrel_ast::NodeId,
  ) -> LowerResult<kestrel_host::HostId> {
    let operand = self.lower_expr(key, InferContext::none())?;
    match &operand.constant {
      Some(ConstValue::Int(n)) if !n.is_negative() => Ok(operand.id),
      _ => Err(DiagnosticMessage::TypeMismatch {
        expected: "constant index".to_string(),
        got: self.type_name(operand.ty),
        span: operand.span,
      }),
    }
  }

  /// The most specific type every operand is assignable to.
  pub(crate) fn unify_class(
    &mut self,
    operands: &[Operand],
    span: &Span,
  ) -> LowerResult<TypeId> {
    let mut acc = ClassAccumulator::default();

    for operand in operands {
      self.check_value(operand)?;
      if operand.mode == OperandMode::Nil {
        acc.top = true;
        continue;
      }

      match self.types.get(&operand.ty).clone() {
        Type::Basic(kind) if kind.is_untyped() => {
          acc.untyped.push(operand.clone());
          match kind {
            BasicKind::UntypedInt => acc.widen(NumericClass::Int),
            BasicKind::UntypedRune => acc.widen(NumericClass::Rune),
            BasicKind::UntypedFloat => acc.widen(NumericClass::Float),
            BasicKind::UntypedComplex => acc.widen(NumericClass::Complex),
            BasicKind::UntypedBigInt => acc.big_int = true,
            BasicKind::UntypedBigRat => acc.big_rat = true,
            BasicKind::UntypedString => acc.strings = true,
            BasicKind::UntypedBool => acc.bools = true,
            _ => acc.top = true,
          }
        },
        _ => match acc.typed {
          None => acc.typed = Some(operand.ty),
          Some(existing) if existing == operand.ty => {},
          Some(_) => acc.top = true,
        },
      }
    }

    if acc.top {
      return Ok(self.types.any());
    }

    if let Some(typed) = acc.typed {
      let fits = acc.untyped.iter().all(|operand| self.untyped_fits(operand, typed));
      return Ok(if fits { typed } else { self.types.any() });
    }

    let families = [
      acc.numeric.is_some() || acc.big_int || acc.big_rat,
      acc.strings,
      acc.bools,
    ];
    if families.iter().filter(|family| **family).count() != 1 {
      return Ok(self.types.any());
    }

    if acc.big_int || acc.big_rat {
      let rational = acc.big_rat || matches!(acc.numeric, Some(NumericClass::Float));
      if matches!(acc.numeric, Some(NumericClass::Complex)) {
        return Err(DiagnosticMessage::LiteralClassConflict {
          shape: "big number".to_string(),
          element: "complex".to_string(),
          span: span.clone(),
        });
      }
      let kind = if rational {
        BasicKind::UntypedBigRat
      } else {
        BasicKind::UntypedBigInt
      };
      return match self.registry.default_for(kind) {
        Some(entry) => Ok(entry.ty),
        None => Ok(self.types.any()),
      };
    }

    let ty = match acc.numeric {
      Some(NumericClass::Int) => self.types.int(),
      Some(NumericClass::Rune) => self.types.int32(),
      Some(NumericClass::Float) => self.types.float64(),
      Some(NumericClass::Complex) => self.types.basic(BasicKind::Complex128),
      None if acc.strings => self.types.string(),
      None => self.types.bool(),
    };
    Ok(ty)
  }

  fn untyped_fits(
    &self,
    operand: &Operand,
    target: TypeId,
  ) -> bool {
    if self.registry.get(target).is_some() {
      return operand.constant.is_some();
    }
    if !self.assignable(operand.ty, target) {
      return false;
    }
    match (&operand.constant, self.types.basic_kind(target)) {
      (Some(value), Some(kind)) if kind.is_numeric() => const_eval::representable(value, kind),
      _ => true,
    }
  }
}

impl ClassAccumulator {
  fn widen(
    &mut self,
    class: NumericClass,
  ) {
    self.numeric = Some(self.numeric.map_or(class, |current| current.max(class)));
  }
}
