//! Member access, auto-properties and command-style calls.
//!
//! `a.name` is looked up as a field, then as a method, then as one of the
//! auto-property spellings `Name`, `name__0` and `Name__0`. A method found
//! that way is called with no arguments unless the access is itself a callee.

use kestrel_ast::{expressions::ASTUnaryOperator, NodeId};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::HostKind;
use kestrel_log::trace_dbg;
use kestrel_type::{
  oracle::MethodInfo,
  span::Span,
  types::{package_name, Type, TypeId},
};

use crate::{call::Argument, naming::capitalize, InferContext, LowerResult, Lowerer, Operand, OperandMode};

/// Embedded fields are searched this deep.
const MAX_EMBEDDING: usize = 8;

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_member_access(
    &mut self,
    object: &NodeId,
    member: &str,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let object = self.lower_expr(object, InferContext::none())?;

    match object.mode.clone() {
      OperandMode::Package(path) => self.lower_package_member(&path, member, span),
      OperandMode::Type => self.lower_method_expression(object, member, span),
      _ => self.lower_value_member(object, member, span, ctx),
    }
  }

  fn lower_package_member(
    &mut self,
    path: &str,
    member: &str,
    span: &Span,
  ) -> LowerResult<Operand> {
    trace_dbg!(self.config, DebugTrace::Oracle, "member {}.{}", path, member);
    for name in [member.to_string(), capitalize(member)] {
      if let Some(resolution) = self.oracle.resolve_member(path, &name) {
        return Ok(self.resolution_operand(resolution, Some(path), &name, span));
      }
    }

    Err(DiagnosticMessage::UnknownMember {
      owner: package_name(path).to_string(),
      name: member.to_string(),
      span: span.clone(),
    })
  }

  /// `T.Method`: a function taking the receiver first.
  fn lower_method_expression(
    &mut self,
    object: Operand,
    member: &str,
    span: &Span,
  ) -> LowerResult<Operand> {
    let Some(method) = self.lookup_method(object.ty, member) else {
      return Err(DiagnosticMessage::UnknownMember {
        owner: self.type_name(object.ty),
        name: member.to_string(),
        span: span.clone(),
      });
    };
    let Some(signature) = self.types.signature(method.sig).cloned() else {
      return Err(self.invalid_operation(".", object.ty, span));
    };

    let mut params = vec![object.ty];
    params.extend(signature.params);
    let ty = self.types.func(params, signature.results, signature.variadic);

    let receiver = match self.types.get(&object.ty) {
      Type::Pointer(_) => self.scaffold(HostKind::Paren(object.id)),
      _ => object.id,
    };
    let id = self.alloc(
      HostKind::Selector {
        object: receiver,
        name: method.name,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }

  fn lower_value_member(
    &mut self,
    object: Operand,
    member: &str,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    self.check_value(&object)?;
    let (object_id, object_ty) = self.value_of(object)?;

    if self.is_invalid(object_ty) {
      let id = self.alloc(
        HostKind::Selector {
          object: object_id,
          name: member.to_string(),
        },
        span,
      );
      return Ok(Operand::value(id, object_ty, span.clone()));
    }

    if let Some(field) = self.find_field(object_ty, member, 0) {
      let id = self.alloc(
        HostKind::Selector {
          object: object_id,
          name: member.to_string(),
        },
        span,
      );
      return Ok(Operand::value(id, field, span.clone()));
    }

    if let Some(method) = self.lookup_method(object_ty, member) {
      let id = self.alloc(
        HostKind::Selector {
          object: object_id,
          name: method.name,
        },
        span,
      );
      return Ok(Operand::value(id, method.sig, span.clone()));
    }

    let exported = capitalize(member);
    let candidates = [
      exported.clone(),
      format!("{}__0", member),
      format!("{}__0", exported),
    ];
    for candidate in candidates {
      let Some(method) = self.lookup_method(object_ty, &candidate) else {
        continue;
      };
      trace_dbg!(self.config, DebugTrace::Desugar, "{} is the auto-property {}", member, candidate);
      return Ok(self.auto_property(object_id, method, span, ctx));
    }

    Err(DiagnosticMessage::UnknownMember {
      owner: self.type_name(object_ty),
      name: member.to_string(),
      span: span.clone(),
    })
  }

  fn auto_property(
    &mut self,
    object: kestrel_host::HostId,
    method: MethodInfo,
    span: &Span,
    ctx: InferContext,
  ) -> Operand {
    let selector = self.alloc(
      HostKind::Selector {
        object,
        name: method.name,
      },
      span,
    );

    let signature = self.types.signature(method.sig).cloned();
    match signature {
      Some(signature) if !ctx.callee && signature.params.is_empty() => {
        let call = self.alloc(
          HostKind::Call {
            callee: selector,
            args: Vec::new(),
            spread: false,
          },
          span,
        );
        self.result_operand(call, &signature.results, span)
      },
      _ => Operand::value(selector, method.sig, span.clone()),
    }
  }

  /// Type of field `name` of a struct (or pointer to struct), including fields
  /// promoted from embedded types.
  fn find_field(
    &self,
    ty: TypeId,
    name: &str,
    depth: usize,
  ) -> Option<TypeId> {
    if depth > MAX_EMBEDDING {
      return None;
    }

    let base = match self.types.get(&self.types.underlying(ty)) {
      Type::Pointer(inner) => self.types.underlying(*inner),
      _ => self.types.underlying(ty),
    };
    let Type::Struct(fields) = self.types.get(&base) else {
      return None;
    };

    if let Some(field) = fields.iter().find(|field| field.name == name) {
      return Some(field.ty);
    }

    fields
      .iter()
      .filter(|field| field.embedded)
      .find_map(|field| self.find_field(field.ty, name, depth + 1))
  }

  // #region Commands
  /// `println "hi", x`
  pub(crate) fn lower_command(
    &mut self,
    head: &NodeId,
    args: &[NodeId],
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    self.lower_call(head, args, false, span, ctx)
  }

  /// `f -x`: a call when `f` is callable, otherwise the binary `f - x`.
  pub(crate) fn lower_ambiguous_command(
    &mut self,
    head: &NodeId,
    operator: ASTUnaryOperator,
    operand: &NodeId,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let head = self.lower_expr(head, InferContext::callee())?;

    if self.is_callable(&head) {
      let operand_span = self.span(operand);
      let args = vec![Argument::Unary(operator, *operand, operand_span)];
      return self.lower_call_operand(head, args, false, span, ctx);
    }

    let Some(binary) = operator.as_binary() else {
      return Err(DiagnosticMessage::NotCallable {
        text: self.source_text_at(&head.span),
        span: head.span,
      });
    };
    let right = self.lower_expr(operand, InferContext::none())?;
    self.lower_binary(binary, head, right, span)
  }

  fn is_callable(
    &self,
    operand: &Operand,
  ) -> bool {
    match operand.mode {
      OperandMode::Builtin(_) => true,
      OperandMode::Value => self.types.signature(operand.ty).is_some(),
      _ => false,
    }
  }
  // #endregion Commands
}
