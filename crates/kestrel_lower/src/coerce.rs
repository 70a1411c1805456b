//! Conversions applied where a value flows into a typed slot.

use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::HostId;
use kestrel_type::types::{Type, TypeId};

use crate::{const_eval::representable, LowerResult, Lowerer, Operand, OperandMode};

impl<'a> Lowerer<'a> {
  /// Reject operands that are not single values.
  pub(crate) fn check_value(
    &self,
    operand: &Operand,
  ) -> LowerResult<()> {
    match &operand.mode {
      OperandMode::Value | OperandMode::Nil => {},
      OperandMode::NoValue => {
        return Err(DiagnosticMessage::ResultCountMismatch {
          expected: 1,
          got: 0,
          span: operand.span.clone(),
        });
      },
      OperandMode::Type | OperandMode::Package(_) | OperandMode::Builtin(_) => {
        return Err(DiagnosticMessage::NotAValue {
          name: self.source_text_at(&operand.span),
          span: operand.span.clone(),
        });
      },
    }

    if let Type::Tuple(elements) = self.types.get(&operand.ty) {
      return Err(DiagnosticMessage::ResultCountMismatch {
        expected: 1,
        got: elements.len(),
        span: operand.span.clone(),
      });
    }

    Ok(())
  }

  /// Use `operand` where a value of type `target` is required.
  pub(crate) fn coerce(
    &mut self,
    operand: Operand,
    target: TypeId,
  ) -> LowerResult<HostId> {
    self.check_value(&operand)?;
    if self.is_invalid(operand.ty) || self.is_invalid(target) {
      return Ok(operand.id);
    }

    if operand.mode == OperandMode::Nil {
      if self.types.is_nilable(target) {
        return Ok(operand.id);
      }
      return Err(self.mismatch(&operand, target));
    }

    let untyped = self.types.is_untyped(operand.ty);
    if untyped && operand.constant.is_some() && self.registry.get(target).is_some() {
      return self.materialize(&operand, target);
    }

    if self.is_untyped_big(operand.ty) {
      if self.types.is_interface(target) {
        return Ok(self.value_of(operand)?.0);
      }
      return Err(self.mismatch(&operand, target));
    }

    if untyped {
      if let (Some(value), Some(kind)) = (&operand.constant, self.types.basic_kind(target)) {
        if kind.is_numeric() && !representable(value, kind) {
          return Err(DiagnosticMessage::ConstantOverflow {
            text: self.source_text_at(&operand.span),
            span: operand.span.clone(),
          });
        }
      }
    }

    if !self.assignable(operand.ty, target) {
      return Err(self.mismatch(&operand, target));
    }

    Ok(operand.id)
  }

  /// The operand as a value of its default type; untyped big constants
  /// become the registered big-number types.
  pub(crate) fn value_of(
    &mut self,
    operand: Operand,
  ) -> LowerResult<(HostId, TypeId)> {
    self.check_value(&operand)?;
    if operand.mode == OperandMode::Nil {
      return Err(DiagnosticMessage::UntypedNil { span: operand.span });
    }

    if self.is_untyped_big(operand.ty) {
      let default = self
        .types
        .basic_kind(operand.ty)
        .and_then(|kind| self.registry.default_for(kind))
        .map(|entry| entry.ty);
      let Some(default) = default else {
        return Err(DiagnosticMessage::UnsupportedConstruct {
          what: "big-number constant without a registered big-number type".to_string(),
          span: operand.span,
        });
      };
      let id = self.materialize(&operand, default)?;
      return Ok((id, default));
    }

    if self.types.is_untyped(operand.ty) {
      let ty = self.types.default_type(operand.ty);
      if let (Some(value), Some(kind)) = (&operand.constant, self.types.basic_kind(ty)) {
        if kind.is_integer() && !representable(value, kind) {
          return Err(DiagnosticMessage::ConstantOverflow {
            text: self.source_text_at(&operand.span),
            span: operand.span,
          });
        }
      }
      return Ok((operand.id, ty));
    }

    Ok((operand.id, operand.ty))
  }

  /// Coerce when a type is expected, default otherwise.
  pub(crate) fn coerce_or_default(
    &mut self,
    operand: Operand,
    target: Option<TypeId>,
  ) -> LowerResult<(HostId, TypeId)> {
    match target {
      Some(target) => Ok((self.coerce(operand, target)?, target)),
      None => self.value_of(operand),
    }
  }

  pub(crate) fn mismatch(
    &self,
    operand: &Operand,
    target: TypeId,
  ) -> DiagnosticMessage {
    let got = match operand.mode {
      OperandMode::Nil => "nil".to_string(),
      _ => self.type_name(operand.ty),
    };
    DiagnosticMessage::TypeMismatch {
      expected: self.type_name(target),
      got,
      span: operand.span.clone(),
    }
  }
}
