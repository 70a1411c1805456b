//! List, map, existence and selection comprehensions.
//!
//! Every comprehension becomes an immediately invoked function literal whose
//! body nests one loop per clause, outermost clause first:
//!
//! ```text
//! [x * x for x <- xs, x > 0]
//! func() (_gop_ret []int) { for _, x := range xs { if x > 0 { _gop_ret = append(_gop_ret, x*x) } }; return }()
//! ```

use kestrel_ast::expressions::{ComprehensionYield, ForClause};
use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostId, HostKind, HostParam, HostSignature};
use kestrel_log::trace_dbg;
use kestrel_type::{
  span::Span,
  types::{Type, TypeId},
};

use crate::{
  iterator::RangePlan,
  naming::{OK, RET},
  scope::ScopeKind,
  InferContext, LowerResult, Lowerer, Operand,
};

/// Types learned while lowering the yield expressions.
#[derive(Debug, Default)]
struct Yielded {
  key: Option<TypeId>,
  value: Option<TypeId>,
}

impl<'a> Lowerer<'a> {
  pub(crate) fn lower_comprehension(
    &mut self,
    yields: &ComprehensionYield,
    clauses: &[ForClause],
    span: &Span,
    ctx: InferContext,
  ) -> LowerResult<Operand> {
    let with_ok = matches!(yields, ComprehensionYield::Select(_)) && ctx.results == 2;
    let mut yielded = Yielded::default();

    let loops = self.in_function_scope(ScopeKind::Closure, Vec::new(), |lowerer| {
      lowerer.lower_clauses(yields, clauses, 0, &mut yielded, span, ctx, with_ok)
    })?;

    let bool_ty = self.types.bool();
    let results: Vec<(String, TypeId)> = match yields {
      ComprehensionYield::List(_) => {
        let element = yielded.value.unwrap_or_else(|| self.types.invalid());
        vec![(RET.to_string(), self.types.slice(element))]
      },
      ComprehensionYield::Map { .. } => {
        let key = yielded.key.unwrap_or_else(|| self.types.invalid());
        let value = yielded.value.unwrap_or_else(|| self.types.invalid());
        vec![(RET.to_string(), self.types.map(key, value))]
      },
      ComprehensionYield::Exists => vec![(OK.to_string(), bool_ty)],
      ComprehensionYield::Select(_) => {
        let value = yielded.value.unwrap_or_else(|| self.types.invalid());
        let mut results = vec![(RET.to_string(), value)];
        if with_ok {
          results.push((OK.to_string(), bool_ty));
        }
        results
      },
    };

    let mut statements = Vec::with_capacity(loops.len() + 2);
    if let ComprehensionYield::Map { .. } = yields {
      // _gop_ret = map[K]V{}
      let ty = results[0].1;
      let target = self.tree.ident(RET);
      let empty = self.scaffold(HostKind::Composite {
        ty: Some(ty),
        elements: Vec::new(),
      });
      statements.push(self.tree.assign(vec![target], vec![empty]));
    }
    statements.extend(loops);
    statements.push(self.tree.ret(Vec::new()));

    trace_dbg!(
      self.config,
      DebugTrace::Desugar,
      "comprehension with {} clause(s) yields {}",
      clauses.len(),
      results.iter().map(|(_, ty)| self.type_name(*ty)).collect::<Vec<_>>().join(", ")
    );

    let result_types: Vec<TypeId> = results.iter().map(|(_, ty)| *ty).collect();
    let signature = HostSignature {
      params: Vec::new(),
      results: results
        .into_iter()
        .map(|(name, ty)| HostParam { name: Some(name), ty })
        .collect(),
      variadic: false,
    };
    let body = self.scaffold(HostKind::Block(statements));
    let literal = self.alloc(HostKind::FunctionLiteral { signature, body }, span);
    let call = self.alloc(
      HostKind::Call {
        callee: literal,
        args: Vec::new(),
        spread: false,
      },
      span,
    );

    Ok(self.result_operand(call, &result_types, span))
  }

  /// Loops for `clauses[index..]`, with the yield statements innermost.
  #[allow(clippy::too_many_arguments)]
  fn lower_clauses(
    &mut self,
    yields: &ComprehensionYield,
    clauses: &[ForClause],
    index: usize,
    yielded: &mut Yielded,
    span: &Span,
    ctx: InferContext,
    with_ok: bool,
  ) -> LowerResult<Vec<HostId>> {
    let Some(clause) = clauses.get(index) else {
      return self.lower_yield(yields, yielded, ctx, with_ok);
    };

    let source = self.lower_expr(&clause.source, InferContext::none())?;
    let source_span = source.span.clone();
    let (source, source_ty) = self.value_of(source)?;
    let plan = self.range_plan(source_ty, &source_span)?;
    if plan.is_push() && matches!(yields, ComprehensionYield::Exists | ComprehensionYield::Select(_)) {
      return Err(DiagnosticMessage::YieldOverPushIterator { span: source_span });
    }

    let mut statements = std::mem::take(&mut self.hoisted);
    let scope = self.scopes.current();
    self.scopes.push(if plan.is_push() { ScopeKind::Callback } else { ScopeKind::Range });

    let inner = self.lower_phrase_clause_body(&plan, clause, yields, clauses, index, yielded, span, ctx, with_ok);
    self.scopes.set_current(scope);
    let inner = inner?;

    let key = clause.key.as_deref();
    let value = clause.value.as_deref();
    statements.push(self.emit_range(&plan, source, key, value, inner, span));
    Ok(statements)
  }

  #[allow(clippy::too_many_arguments)]
  fn lower_phrase_clause_body(
    &mut self,
    plan: &RangePlan,
    clause: &ForClause,
    yields: &ComprehensionYield,
    clauses: &[ForClause],
    index: usize,
    yielded: &mut Yielded,
    span: &Span,
    ctx: InferContext,
    with_ok: bool,
  ) -> LowerResult<Vec<HostId>> {
    self.bind_range_vars(plan, clause.key.as_deref(), clause.value.as_deref());

    let init = match &clause.init {
      Some(init) => self.lower_simple_statement(init)?,
      None => None,
    };
    let guard = match &clause.guard {
      Some(guard) => Some(self.lower_condition(guard)?),
      None => None,
    };

    let mut hoisted = std::mem::take(&mut self.hoisted);
    let inner = self.lower_clauses(yields, clauses, index + 1, yielded, span, ctx, with_ok)?;

    let Some(condition) = guard else {
      hoisted.extend(init);
      hoisted.extend(inner);
      return Ok(hoisted);
    };

    let then_branch = self.tree.block(inner);
    let guarded = self.scaffold(HostKind::If {
      init,
      condition,
      then_branch,
      else_branch: None,
    });
    hoisted.push(guarded);
    Ok(hoisted)
  }

  fn lower_yield(
    &mut self,
    yields: &ComprehensionYield,
    yielded: &mut Yielded,
    ctx: InferContext,
    with_ok: bool,
  ) -> LowerResult<Vec<HostId>> {
    let expected = ctx.expected.map(|ty| self.types.get(&self.types.underlying(ty)).clone());

    let mut statements = Vec::new();
    let statement = match yields {
      ComprehensionYield::List(value) => {
        let element = match expected {
          Some(Type::Slice(element)) => Some(element),
          _ => None,
        };
        let operand = self.lower_expr(value, InferContext::maybe(element))?;
        let (value, ty) = self.coerce_or_default(operand, element)?;
        yielded.value = Some(ty);

        // _gop_ret = append(_gop_ret, v)
        let append = self.tree.ident("append");
        let ret = self.tree.ident(RET);
        let call = self.tree.call(append, vec![ret, value]);
        let target = self.tree.ident(RET);
        self.tree.assign(vec![target], vec![call])
      },
      ComprehensionYield::Map { key, value } => {
        let (key_ty, value_ty) = match expected {
          Some(Type::Map { key, value }) => (Some(key), Some(value)),
          _ => (None, None),
        };
        let key = self.lower_expr(key, InferContext::maybe(key_ty))?;
        let (key, key_ty) = self.coerce_or_default(key, key_ty)?;
        let value = self.lower_expr(value, InferContext::maybe(value_ty))?;
        let (value, value_ty) = self.coerce_or_default(value, value_ty)?;
        yielded.key = Some(key_ty);
        yielded.value = Some(value_ty);

        // _gop_ret[k] = v
        let ret = self.tree.ident(RET);
        let slot = self.scaffold(HostKind::Index { object: ret, index: key });
        self.tree.assign(vec![slot], vec![value])
      },
      ComprehensionYield::Exists => {
        let found = self.tree.literal("true");
        self.tree.ret(vec![found])
      },
      ComprehensionYield::Select(value) => {
        let operand = self.lower_expr(value, InferContext::maybe(ctx.expected))?;
        let (value, ty) = self.coerce_or_default(operand, ctx.expected)?;
        yielded.value = Some(ty);

        let mut values = vec![value];
        if with_ok {
          values.push(self.tree.literal("true"));
        }
        self.tree.ret(values)
      },
    };

    statements.append(&mut self.hoisted);
    statements.push(statement);
    Ok(statements)
  }
}
