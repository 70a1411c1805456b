//! Lambdas and function literals.
//!
//! A lambda `(x, y) => x + y` has no types of its own: the function type it
//! flows into supplies the parameter and result types.

use kestrel_ast::{expressions::LambdaBody, NodeId};
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostId, HostKind, HostParam, HostSignature};
use kestrel_type::{span::Span, types::Type};

use crate::{
  scope::{ScopeKind, Symbol},
  FuncContext, InferContext, LowerResult, Lowerer, Operand,
};

impl<'a> Lowerer<'a> {
  /// Run `lower` inside a fresh function-like scope whose results are `results`.
  ///
  /// Statements hoisted by the body stay inside it.
  pub(crate) fn in_function_scope<T>(
    &mut self,
    kind: ScopeKind,
    results: Vec<kestrel_type::types::TypeId>,
    lower: impl FnOnce(&mut Self) -> LowerResult<T>,
  ) -> LowerResult<T> {
    let scope = self.scopes.current();
    self.scopes.push(kind);
    let func = self.func.replace(FuncContext { results });
    let hoisted = std::mem::take(&mut self.hoisted);

    let lowered = lower(self);

    self.hoisted = hoisted;
    self.func = func;
    self.scopes.set_current(scope);
    lowered
  }

  /// Bind the named entries of `params` in the current scope.
  pub(crate) fn define_params(
    &mut self,
    params: &[HostParam],
  ) {
    for param in params {
      if let Some(name) = &param.name {
        // Duplicate parameter names surface as Go compile errors downstream.
        let _ = self.scopes.define(name, Symbol::variable(param.ty));
      }
    }
  }

  pub(crate) fn lower_lambda(
    &mut self,
    params: &[String],
    body: &LambdaBody,
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let Some(expected) = ctx.expected else {
      return Err(DiagnosticMessage::LambdaWithoutContext { span: span.clone() });
    };
    let Some(signature) = self.types.signature(expected).cloned() else {
      return Err(DiagnosticMessage::TypeMismatch {
        expected: self.type_name(expected),
        got: "lambda".to_string(),
        span: span.clone(),
      });
    };
    if params.len() != signature.params.len() {
      return Err(DiagnosticMessage::LambdaArityMismatch {
        expected: signature.params.len(),
        got: params.len(),
        span: span.clone(),
      });
    }

    let host_signature = HostSignature {
      params: params
        .iter()
        .zip(&signature.params)
        .map(|(name, ty)| HostParam {
          name: Some(name.clone()),
          ty: *ty,
        })
        .collect(),
      results: signature
        .results
        .iter()
        .map(|ty| HostParam { name: None, ty: *ty })
        .collect(),
      variadic: signature.variadic,
    };

    let results = signature.results.clone();
    let body = self.in_function_scope(ScopeKind::Closure, results.clone(), |lowerer| {
      lowerer.define_params(&host_signature.params);
      match body {
        LambdaBody::Block(block) => lowerer.lower_block(block, ScopeKind::Block),
        LambdaBody::Expressions(expressions) => lowerer.lower_lambda_expressions(expressions, &results, span),
      }
    })?;

    let id = self.alloc(
      HostKind::FunctionLiteral {
        signature: host_signature,
        body,
      },
      span,
    );
    Ok(Operand::value(id, expected, span.clone()))
  }

  /// `=> a, b` as the statements of a body returning `results`.
  fn lower_lambda_expressions(
    &mut self,
    expressions: &[NodeId],
    results: &[kestrel_type::types::TypeId],
    span: &Span,
  ) -> LowerResult<HostId> {
    let mut statements = Vec::new();

    if results.is_empty() {
      for expression in expressions {
        let operand = self.lower_expr(expression, InferContext::none())?;
        statements.append(&mut self.hoisted);
        statements.push(self.expression_statement(operand)?);
      }
      return Ok(self.scaffold(HostKind::Block(statements)));
    }

    let values = match expressions {
      [single] if results.len() > 1 => {
        let operand = self.lower_expr(single, InferContext::none())?;
        let got = match self.types.get(&operand.ty) {
          Type::Tuple(elements) => elements.clone(),
          _ => vec![operand.ty],
        };
        if got.len() != results.len() || got.iter().zip(results).any(|(g, r)| !self.assignable(*g, *r)) {
          return Err(DiagnosticMessage::ResultCountMismatch {
            expected: results.len(),
            got: got.len(),
            span: operand.span,
          });
        }
        vec![operand.id]
      },
      _ if expressions.len() == results.len() => {
        let mut values = Vec::with_capacity(expressions.len());
        for (expression, result) in expressions.iter().zip(results) {
          values.push(self.lower_into(expression, *result)?);
        }
        values
      },
      _ => {
        return Err(DiagnosticMessage::ResultCountMismatch {
          expected: results.len(),
          got: expressions.len(),
          span: span.clone(),
        });
      },
    };

    statements.append(&mut self.hoisted);
    let return_span = match (expressions.first(), expressions.last()) {
      (Some(first), Some(last)) => Span::merge(&self.span(first), &self.span(last)),
      _ => span.clone(),
    };
    statements.push(self.alloc(HostKind::Return(values), &return_span));
    Ok(self.scaffold(HostKind::Block(statements)))
  }

  /// `func(x int) int { ... }`
  pub(crate) fn lower_function_literal(
    &mut self,
    signature: &NodeId,
    body: &NodeId,
    span: &Span,
  ) -> LowerResult<Operand> {
    let (host_signature, ty) = self.resolve_signature(signature)?;
    let results = host_signature.results.iter().map(|result| result.ty).collect();

    let body = self.in_function_scope(ScopeKind::Closure, results, |lowerer| {
      lowerer.define_params(&host_signature.params);
      lowerer.define_params(&host_signature.results);
      lowerer.lower_block(body, ScopeKind::Block)
    })?;

    let id = self.alloc(
      HostKind::FunctionLiteral {
        signature: host_signature,
        body,
      },
      span,
    );
    Ok(Operand::value(id, ty, span.clone()))
  }
}
