//! `T{...}` and untyped `{...}` literals.

use kestrel_ast::{expressions::ASTElement, type_::ASTType, NodeId};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{operation::UnaryOperation, HostElement, HostKind};
use kestrel_log::trace_dbg;
use kestrel_type::{
  span::Span,
  types::{Field, Type, TypeId},
  value::ConstValue,
};
use num_traits::ToPrimitive;

use crate::{InferContext, LowerResult, Lowerer, Operand};

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_composite_literal(
    &mut self,
    ty: Option<NodeId>,
    elements: &[ASTElement],
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    if let Some(ty) = ty {
      // `[...]T{...}` takes its length from the elements.
      if let Some(ASTType::Array { len: None, element }) = self.unit.type_expr(&ty).cloned() {
        let element = self.resolve_type(&element)?;
        let (host, len) = self.lower_indexed_elements(element, elements)?;
        let ty = self.types.array(element, len);
        let id = self.alloc(
          HostKind::Composite {
            ty: Some(ty),
            elements: host,
          },
          span,
        );
        return Ok(Operand::value(id, ty, span.clone()));
      }

      let ty = self.resolve_type(&ty)?;
      return self.complete_composite(ty, elements, span);
    }

    if let Some(expected) = ctx.expected {
      if !self.types.is_interface(expected) {
        return self.complete_composite(expected, elements, span);
      }
      if elements.is_empty() {
        let string = self.types.string();
        let any = self.types.any();
        let ty = self.types.map(string, any);
        return self.complete_composite(ty, elements, span);
      }
    }

    if elements.is_empty() {
      return Err(DiagnosticMessage::EmptyLiteralWithoutContext { span: span.clone() });
    }
    if elements.iter().any(|element| element.key.is_none()) {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: "untyped {...} literal without keys".to_string(),
        span: span.clone(),
      });
    }

    self.infer_map_literal(elements, span)
  }

  /// `{"a": 1, "b": 2}` with nothing to complete it: a map whose key and
  /// value types are unified separately.
  fn infer_map_literal(
    &mut self,
    elements: &[ASTElement],
    span: &Span,
  ) -> LowerResult<Operand> {
    let mut keys = Vec::with_capacity(elements.len());
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
      let Some(key) = &element.key else {
        continue;
      };
      keys.push(self.lower_expr(key, InferContext::none())?);
      values.push(self.lower_expr(&element.value, InferContext::none())?);
    }

    let key_ty = self.unify_class(&keys, span)?;
    let value_ty = self.unify_class(&values, span)?;
    let ty = self.types.map(key_ty, value_ty);
    trace_dbg!(self.config, DebugTrace::Literal, "map literal class {}", self.type_name(ty));

    let mut host = Vec::with_capacity(keys.len());
    for (key, value) in keys.into_iter().zip(values) {
      let key = self.coerce(key, key_ty)?;
      let value = self.coerce(value, value_ty)?;
      host.push(HostElement { key: Some(key), value });
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

  /// Build `ty{elements}`, lowering every element against the type.
  pub(crate) fn complete_composite(
    &mut self,
    ty: TypeId,
    elements: &[ASTElement],
    span: &Span,
  ) -> LowerResult<Operand> {
    let underlying = self.types.underlying(ty);

    let host = match self.types.get(&underlying).clone() {
      Type::Struct(fields) => self.lower_struct_elements(ty, &fields, elements, span)?,
      Type::Slice(element) => self.lower_indexed_elements(element, elements)?.0,
      Type::Array { element, len } => {
        let (host, used) = self.lower_indexed_elements(element, elements)?;
        if used > len {
          return Err(DiagnosticMessage::ConstantOverflow {
            text: format!("index {} out of bounds [0:{}]", used - 1, len),
            span: span.clone(),
          });
        }
        host
      },
      Type::Map { key, value } => self.lower_keyed_elements(key, value, elements, span)?,
      Type::Pointer(inner) if self.is_composite(inner) => {
        let inner = self.complete_composite(inner, elements, span)?;
        let id = self.alloc(
          HostKind::Unary {
            operation: UnaryOperation::AddressOf,
            operand: inner.id,
          },
          span,
        );
        return Ok(Operand::value(id, ty, span.clone()));
      },
      Type::Invalid => Vec::new(),
      _ => {
        return Err(DiagnosticMessage::TypeMismatch {
          expected: self.type_name(ty),
          got: "composite literal".to_string(),
          span: span.clone(),
        });
      },
    };

    let id = self.alloc(
      HostKind::Composite {
        ty: Some(ty),
        elements: host,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }

  pub(crate) fn is_composite(
    &self,
    ty: TypeId,
  ) -> bool {
    matches!(
      self.types.get(&self.types.underlying(ty)),
      Type::Struct(_) | Type::Slice(_) | Type::Array { .. } | Type::Map { .. }
    )
  }

  fn lower_struct_elements(
    &mut self,
    ty: TypeId,
    fields: &[Field],
    elements: &[ASTElement],
    span: &Span,
  ) -> LowerResult<Vec<HostElement>> {
    let keyed = elements.iter().filter(|element| element.key.is_some()).count();
    let mut host = Vec::with_capacity(elements.len());

    if keyed == 0 {
      if !elements.is_empty() && elements.len() != fields.len() {
        return Err(DiagnosticMessage::ArgumentCountMismatch {
          expected: fields.len(),
          got: elements.len(),
          span: span.clone(),
        });
      }
      for (element, field) in elements.iter().zip(fields) {
        let value = self.lower_into(&element.value, field.ty)?;
        host.push(HostElement { key: None, value });
      }
      return Ok(host);
    }

    if keyed != elements.len() {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: "mixture of field:value and value elements".to_string(),
        span: span.clone(),
      });
    }

    for element in elements {
      let Some(key) = &element.key else {
        continue;
      };
      let key_span = self.span(key);
      let Some(name) = self.unit.identifier(key).map(str::to_string) else {
        return Err(DiagnosticMessage::TypeMismatch {
          expected: "field name".to_string(),
          got: self.source_text(key),
          span: key_span,
        });
      };
      let Some(field) = fields.iter().find(|field| field.name == name) else {
        return Err(DiagnosticMessage::UnknownMember {
          owner: self.type_name(ty),
          name,
          span: key_span,
        });
      };
      let field_ty = field.ty;
      let key = self.alloc(HostKind::Identifier(name), &key_span);
      let value = self.lower_into(&element.value, field_ty)?;
      host.push(HostElement { key: Some(key), value });
    }

    Ok(host)
  }

  /// Slice and array elements; returns the elements and the length they span.
  fn lower_indexed_elements(
    &mut self,
    element_ty: TypeId,
    elements: &[ASTElement],
  ) -> LowerResult<(Vec<HostElement>, u64)> {
    let mut host = Vec::with_capacity(elements.len());
    let mut next: u64 = 0;
    let mut len: u64 = 0;

    for element in elements {
      let key = match &element.key {
        Some(key) => {
          let operand = self.lower_expr(key, InferContext::none())?;
          let index = match &operand.constant {
            Some(ConstValue::Int(n)) => n.to_u64(),
            _ => None,
          };
          let Some(index) = index else {
            return Err(DiagnosticMessage::TypeMismatch {
              expected: "constant index".to_string(),
              got: self.type_name(operand.ty),
              span: operand.span,
            });
          };
          next = index;
          Some(operand.id)
        },
        None => None,
      };

      let value = self.lower_into(&element.value, element_ty)?;
      host.push(HostElement { key, value });
      next += 1;
      len = len.max(next);
    }

    Ok((host, len))
  }

  fn lower_keyed_elements(
    &mut self,
    key_ty: TypeId,
    value_ty: TypeId,
    elements: &[ASTElement],
    span: &Span,
  ) -> LowerResult<Vec<HostElement>> {
    let mut host = Vec::with_capacity(elements.len());
    for element in elements {
      let Some(key) = &element.key else {
        return Err(DiagnosticMessage::UnsupportedConstruct {
          what: "map literal element without a key".to_string(),
          span: span.clone(),
        });
      };
      let key = self.lower_into(key, key_ty)?;
      let value = self.lower_into(&element.value, value_ty)?;
      host.push(HostElement { key: Some(key), value });
    }
    Ok(host)
  }
}
