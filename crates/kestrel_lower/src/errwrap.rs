//! Error-wrapping expressions: `f()!`, `f()?` and `f()?:default`.
//!
//! The wrapped call must return `error` last. `!` panics with a frame
//! recording where the error passed through, `?` returns it from the
//! enclosing function, `?:` swallows it and yields the default.

use kestrel_ast::{
  expressions::{ASTExpression, ErrorWrapPolicy},
  NodeId,
};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{operation::BinaryOperation, HostId, HostKind, HostParam, HostSignature};
use kestrel_log::trace_dbg;
use kestrel_type::{oracle::prelude::FRAME_ERRORS_PATH, span::Span, types::TypeId};

use crate::{
  line_map::display_path,
  naming::{result_name, ERR},
  InferContext, LowerResult, Lowerer, Operand, OperandMode,
};

/// Go string literal for `text`.
pub(crate) fn go_quote(text: &str) -> String {
  let mut quoted = String::with_capacity(text.len() + 2);
  quoted.push('"');
  for c in text.chars() {
    match c {
      '\\' => quoted.push_str("\\\\"),
      '"' => quoted.push_str("\\\""),
      '\n' => quoted.push_str("\\n"),
      '\t' => quoted.push_str("\\t"),
      '\r' => quoted.push_str("\\r"),
      _ => quoted.push(c),
    }
  }
  quoted.push('"');
  quoted
}

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_error_wrap(
    &mut self,
    expr: &NodeId,
    policy: &ErrorWrapPolicy,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let call = self.lower_wrapped_call(expr)?;
    let text = self.source_text(expr);

    let results = self.types.results_of(call.ty);
    let values = match results.split_last() {
      Some((last, values)) if self.types.is_error(*last) => values.to_vec(),
      _ => {
        return Err(DiagnosticMessage::MissingErrorResult {
          text,
          span: call.span,
        });
      },
    };

    trace_dbg!(
      self.config,
      DebugTrace::Desugar,
      "{} wrapped with {:?}, {} value(s)",
      text,
      policy,
      values.len()
    );

    match policy {
      ErrorWrapPolicy::Panic => Ok(self.wrap_panic(call.id, &values, &text, span)),
      ErrorWrapPolicy::Default(default) => self.wrap_default(call.id, &values, default.as_ref(), span, ctx),
      ErrorWrapPolicy::Return => self.wrap_return(call.id, &values, &text, span),
    }
  }

  /// The wrapped expression as a call; a bare function value taking no
  /// arguments is called, so `foo!` means `foo()!`.
  fn lower_wrapped_call(
    &mut self,
    expr: &NodeId,
  ) -> LowerResult<Operand> {
    let is_call = matches!(
      self.unit.expression(expr),
      Some(ASTExpression::Call { .. } | ASTExpression::Command { .. } | ASTExpression::AmbiguousCommand { .. })
    );
    if is_call {
      return self.lower_expr(expr, InferContext::none());
    }

    let operand = self.lower_expr(expr, InferContext::callee())?;
    if operand.mode != OperandMode::Value {
      return Ok(operand);
    }
    match self.types.signature(operand.ty).cloned() {
      Some(signature) if signature.params.is_empty() => {
        let call = self.alloc(
          HostKind::Call {
            callee: operand.id,
            args: Vec::new(),
            spread: false,
          },
          &operand.span,
        );
        Ok(self.result_operand(call, &signature.results, &operand.span))
      },
      _ => Ok(operand),
    }
  }

  // #region Scaffolding
  /// `var _gop_err error`
  fn declare_err(
    &mut self,
    span: &Span,
  ) -> HostId {
    let error = self.types.error();
    self.alloc(
      HostKind::VarDecl {
        names: vec![ERR.to_string()],
        ty: Some(error),
        values: Vec::new(),
        doc: None,
      },
      span,
    )
  }

  /// `targets..., _gop_err = call`
  fn assign_results(
    &mut self,
    targets: &[String],
    call: HostId,
    span: &Span,
  ) -> HostId {
    let mut lhs: Vec<HostId> = targets.iter().map(|name| self.tree.ident(name)).collect();
    lhs.push(self.tree.ident(ERR));
    self.alloc(
      HostKind::Assign {
        lhs,
        rhs: vec![call],
        define: false,
        operation: None,
      },
      span,
    )
  }

  /// `_gop_err = errors.NewFrame(_gop_err, "<text>", "<path>", <line>, "<frame>")`
  fn frame(
    &mut self,
    text: &str,
    span: &Span,
  ) -> HostId {
    let path = display_path(self.sources, &self.config.lower, &span.file);
    let (line, _) = self.sources.line_col(&span.file, span.start);

    let new_frame = self.tree.qualified(FRAME_ERRORS_PATH, "NewFrame");
    let err = self.tree.ident(ERR);
    let text = self.tree.literal(&go_quote(text));
    let path = self.tree.literal(&go_quote(&path));
    let line = self.tree.literal(&line.to_string());
    let frame_name = go_quote(&self.frame_name);
    let frame_name = self.tree.literal(&frame_name);
    let call = self.tree.call(new_frame, vec![err, text, path, line, frame_name]);

    let target = self.tree.ident(ERR);
    self.alloc(
      HostKind::Assign {
        lhs: vec![target],
        rhs: vec![call],
        define: false,
        operation: None,
      },
      span,
    )
  }

  /// `if _gop_err != nil { handler... }`
  fn on_error(
    &mut self,
    handler: Vec<HostId>,
    span: &Span,
  ) -> HostId {
    let err = self.tree.ident(ERR);
    let nil = self.tree.ident("nil");
    let condition = self.tree.binary(BinaryOperation::NotEqual, err, nil);
    let then_branch = self.tree.block(handler);
    self.alloc(
      HostKind::If {
        init: None,
        condition,
        then_branch,
        else_branch: None,
      },
      span,
    )
  }

  /// `func() (_gop_ret T) { body }()`
  fn immediate_call(
    &mut self,
    values: &[TypeId],
    body: Vec<HostId>,
    span: &Span,
  ) -> Operand {
    let signature = HostSignature {
      params: Vec::new(),
      results: values
        .iter()
        .enumerate()
        .map(|(i, ty)| HostParam {
          name: Some(result_name(i)),
          ty: *ty,
        })
        .collect(),
      variadic: false,
    };
    let body = self.scaffold(HostKind::Block(body));
    let literal = self.alloc(HostKind::FunctionLiteral { signature, body }, span);
    let call = self.alloc(
      HostKind::Call {
        callee: literal,
        args: Vec::new(),
        spread: false,
      },
      span,
    );
    self.result_operand(call, values, span)
  }
  // #endregion Scaffolding

  fn wrap_panic(
    &mut self,
    call: HostId,
    values: &[TypeId],
    text: &str,
    span: &Span,
  ) -> Operand {
    let targets: Vec<String> = (0..values.len()).map(result_name).collect();

    let declare = self.declare_err(span);
    let assign = self.assign_results(&targets, call, span);
    let frame = self.frame(text, span);
    let panic = self.tree.ident("panic");
    let err = self.tree.ident(ERR);
    let panic = self.tree.call(panic, vec![err]);
    let panic = self.alloc(HostKind::ExpressionStatement(panic), span);
    let check = self.on_error(vec![frame, panic], span);
    let done = self.alloc(HostKind::Return(Vec::new()), span);

    self.immediate_call(values, vec![declare, assign, check, done], span)
  }

  fn wrap_default(
    &mut self,
    call: HostId,
    values: &[TypeId],
    default: Option<&NodeId>,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let [value] = values else {
      return Err(DiagnosticMessage::ResultCountMismatch {
        expected: 1,
        got: values.len(),
        span: span.clone(),
      });
    };
    let value = *value;

    let fallback = match default {
      Some(default) => self.lower_into(default, value)?,
      None => self.zero_value(value),
    };

    let declare = self.declare_err(span);
    let assign = self.assign_results(&[result_name(0)], call, span);
    let fallback = self.alloc(HostKind::Return(vec![fallback]), span);
    let check = self.on_error(vec![fallback], span);
    let done = self.alloc(HostKind::Return(Vec::new()), span);

    let operand = self.immediate_call(&[value], vec![declare, assign, check, done], span);
    // An untyped context may want the value with its own type.
    let _ = ctx;
    Ok(operand)
  }

  /// Hoist the call into the enclosing statement list and yield a temporary.
  fn wrap_return(
    &mut self,
    call: HostId,
    values: &[TypeId],
    text: &str,
    span: &Span,
  ) -> LowerResult<Operand> {
    let Some(results) = self.error_results() else {
      return Err(DiagnosticMessage::ReturnWrapOutsideErrorFunction { span: span.clone() });
    };
    if values.len() > 1 {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: "multi-value ? wrap used as an expression".to_string(),
        span: span.clone(),
      });
    }

    let temps: Vec<String> = values.iter().map(|_| self.fresh_temp()).collect();
    for (name, ty) in temps.iter().zip(values) {
      let declare = self.alloc(
        HostKind::VarDecl {
          names: vec![name.clone()],
          ty: Some(*ty),
          values: Vec::new(),
          doc: None,
        },
        span,
      );
      self.hoisted.push(declare);
    }
    let label = self.fresh_temp();

    let declare = self.declare_err(span);
    let assign = self.assign_results(&temps, call, span);
    let frame = self.frame(text, span);
    let mut returned: Vec<HostId> = Vec::with_capacity(results.len());
    for ty in &results[..results.len() - 1] {
      returned.push(self.zero_value(*ty));
    }
    returned.push(self.tree.ident(ERR));
    let propagate = self.alloc(HostKind::Return(returned), span);
    let check = self.on_error(vec![frame, propagate], span);
    let jump = self.alloc(
      HostKind::Branch {
        kind: kestrel_host::HostBranch::Goto,
        label: Some(label.clone()),
      },
      span,
    );
    let landing = self.alloc(HostKind::Labeled { label, body: None }, span);
    let block = self.alloc(HostKind::Block(vec![declare, assign, check, jump, landing]), span);

    match temps.first() {
      Some(temp) => {
        self.hoisted.push(block);
        let id = self.alloc(HostKind::Identifier(temp.clone()), span);
        Ok(Operand::value(id, values[0], span.clone()))
      },
      None => {
        let ty = self.types.tuple(Vec::new());
        Ok(Operand::value(block, ty, span.clone()).with_mode(OperandMode::NoValue))
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quotes_like_go() {
    assert_eq!(go_quote("foo"), "\"foo\"");
    assert_eq!(go_quote("say(\"hi\")\n"), "\"say(\\\"hi\\\")\\n\"");
    assert_eq!(go_quote("C:\\x"), "\"C:\\\\x\"");
  }
}
