//! The statement walker.
//!
//! Statements hoisted by expression desugarers (the `?` wrap) are emitted
//! right before the statement that produced them.

use kestrel_ast::{
  expressions::{ASTBinaryOperator, ForClause},
  statements::{
    ASTCaseClause, ASTSelectClause, ASTStatement, ASTTypeCaseClause, ASTValueSpec, AssignOperator, BranchKind,
  },
  NodeId,
};
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostBranch, HostCaseClause, HostId, HostKind, HostSelectClause, HostTypeCaseClause};
use kestrel_type::{
  span::Span,
  types::{Type, TypeId},
};

use crate::{
  expr::binary_operation,
  naming::BLANK,
  scope::{BranchTarget, ScopeKind, Symbol},
  InferContext, LowerResult, Lowerer, Operand, OperandMode,
};

fn host_branch(kind: BranchKind) -> HostBranch {
  match kind {
    BranchKind::Break => HostBranch::Break,
    BranchKind::Continue => HostBranch::Continue,
    BranchKind::Goto => HostBranch::Goto,
    BranchKind::Fallthrough => HostBranch::Fallthrough,
  }
}

impl<'a> Lowerer<'a> {
  // #region Walkers
  /// Lower one statement together with everything it hoisted.
  pub(crate) fn lower_statement(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<Vec<HostId>> {
    let outer = std::mem::take(&mut self.hoisted);
    let lowered = self.lower_simple_statement(id);
    let mut statements = std::mem::replace(&mut self.hoisted, outer);
    statements.extend(lowered?);
    Ok(statements)
  }

  pub(crate) fn lower_statements(
    &mut self,
    ids: &[NodeId],
  ) -> LowerResult<Vec<HostId>> {
    let mut statements = Vec::with_capacity(ids.len());
    for id in ids {
      statements.extend(self.lower_statement(id)?);
    }
    Ok(statements)
  }

  /// Statements of a block in a scope of its own.
  pub(crate) fn lower_block_statements(
    &mut self,
    id: &NodeId,
    kind: ScopeKind,
  ) -> LowerResult<Vec<HostId>> {
    let statements = match self.unit.statement(id) {
      Some(ASTStatement::Block(statements)) => statements.clone(),
      _ => vec![*id],
    };

    let scope = self.scopes.current();
    self.scopes.push(kind);
    let lowered = self.lower_statements(&statements);
    self.scopes.set_current(scope);
    lowered
  }

  pub(crate) fn lower_block(
    &mut self,
    id: &NodeId,
    kind: ScopeKind,
  ) -> LowerResult<HostId> {
    let statements = self.lower_block_statements(id, kind)?;
    Ok(self.scaffold(HostKind::Block(statements)))
  }

  /// Lower a statement, leaving whatever it hoisted to the caller.
  ///
  /// Headers (`if` init, comprehension init) go through here directly.
  pub(crate) fn lower_simple_statement(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<Option<HostId>> {
    let span = self.span(id);
    let Some(statement) = self.unit.statement(id).cloned() else {
      let operand = self.lower_expr(id, InferContext::none())?;
      return self.expression_statement(operand).map(Some);
    };

    match statement {
      ASTStatement::Expression(expression) => {
        let operand = self.lower_expr(&expression, InferContext::none())?;
        let operand = Operand { span, ..operand };
        self.expression_statement(operand).map(Some)
      },
      ASTStatement::Assign { lhs, operator, rhs } => match operator {
        AssignOperator::Define => self.lower_define(&lhs, &rhs, &span).map(Some),
        AssignOperator::Assign => self.lower_assign(&lhs, &rhs, &span).map(Some),
        AssignOperator::Compound(operator) => self.lower_compound(operator, &lhs, &rhs, &span).map(Some),
      },
      ASTStatement::IncDec { target, increment } => self.lower_inc_dec(&target, increment, &span).map(Some),
      ASTStatement::Send { channel, value } => self.lower_send(&channel, &value, &span).map(Some),
      ASTStatement::Variable(spec) => self.lower_local_values(&spec, false, &span),
      ASTStatement::Constant(spec) => self.lower_local_values(&spec, true, &span),
      ASTStatement::TypeDecl { name, ty, alias, doc } => self.lower_local_type(&name, &ty, alias, doc, &span).map(Some),
      ASTStatement::Function(function) => Err(DiagnosticMessage::UnsupportedConstruct {
        what: format!("func {} declared inside a function body", function.name),
        span,
      }),
      ASTStatement::Import { path, .. } => Err(DiagnosticMessage::UnsupportedConstruct {
        what: format!("import \"{}\" inside a function body", path),
        span,
      }),
      ASTStatement::Block(statements) => {
        let scope = self.scopes.current();
        self.scopes.push(ScopeKind::Block);
        let lowered = self.lower_statements(&statements);
        self.scopes.set_current(scope);
        Ok(Some(self.alloc(HostKind::Block(lowered?), &span)))
      },
      ASTStatement::If {
        init,
        condition,
        then_block,
        else_branch,
      } => self.lower_if(init, &condition, &then_block, else_branch, &span).map(Some),
      ASTStatement::For {
        init,
        condition,
        post,
        body,
      } => self.lower_for(init, condition, post, &body, &span).map(Some),
      ASTStatement::Range {
        key,
        value,
        define,
        source,
        body,
      } => self.lower_range(key, value, define, &source, &body, &span).map(Some),
      ASTStatement::ForPhrase { clause, body } => self.lower_for_phrase(&clause, &body, &span).map(Some),
      ASTStatement::Switch { init, tag, clauses } => self.lower_switch(init, tag, &clauses, &span).map(Some),
      ASTStatement::TypeSwitch {
        init,
        binding,
        subject,
        clauses,
      } => self
        .lower_type_switch(init, binding, &subject, &clauses, &span)
        .map(Some),
      ASTStatement::Select(clauses) => self.lower_select(&clauses, &span).map(Some),
      ASTStatement::Go(call) => {
        let call = self.lower_deferred_call(&call, "go")?;
        Ok(Some(self.alloc(HostKind::Go(call), &span)))
      },
      ASTStatement::Defer(call) => {
        let call = self.lower_deferred_call(&call, "defer")?;
        Ok(Some(self.alloc(HostKind::Defer(call), &span)))
      },
      ASTStatement::Return(values) => self.lower_return(&values, &span).map(Some),
      ASTStatement::Branch { kind, label } => self.lower_branch(kind, label, &span).map(Some),
      ASTStatement::Labeled { label, body } => {
        let body = self.lower_simple_statement(&body)?;
        Ok(Some(self.alloc(HostKind::Labeled { label, body }, &span)))
      },
    }
  }

  /// An expression used as a statement; a bare function value is called.
  pub(crate) fn expression_statement(
    &mut self,
    operand: Operand,
  ) -> LowerResult<HostId> {
    let span = operand.span.clone();
    let is_call = matches!(self.tree.get(operand.id).kind, HostKind::Call { .. });

    let operand = match &operand.mode {
      // A `?` wrap of a call without values is already a statement.
      OperandMode::NoValue if matches!(self.tree.get(operand.id).kind, HostKind::Block(_)) => {
        return Ok(operand.id);
      },
      OperandMode::NoValue => operand,
      OperandMode::Builtin(_) => self.lower_call_operand(operand, Vec::new(), false, &span, InferContext::none())?,
      OperandMode::Value if !is_call && self.is_bare_callable(operand.ty) => {
        self.lower_call_operand(operand, Vec::new(), false, &span, InferContext::none())?
      },
      OperandMode::Value | OperandMode::Nil => operand,
      OperandMode::Type | OperandMode::Package(_) => {
        return Err(DiagnosticMessage::NotAValue {
          name: self.source_text_at(&span),
          span,
        });
      },
    };

    Ok(self.alloc(HostKind::ExpressionStatement(operand.id), &span))
  }

  /// A function value that can be called without arguments.
  fn is_bare_callable(
    &self,
    ty: TypeId,
  ) -> bool {
    self
      .types
      .signature(ty)
      .is_some_and(|signature| signature.params.is_empty() || (signature.variadic && signature.params.len() == 1))
  }
  // #endregion Walkers

  // #region Assignment
  /// Values for `count` slots: one expression per slot, or one expression
  /// producing all of them.
  fn lower_values(
    &mut self,
    values: &[NodeId],
    count: usize,
    ty: Option<TypeId>,
    span: &Span,
  ) -> LowerResult<(Vec<HostId>, Vec<TypeId>)> {
    if values.len() == count {
      let mut ids = Vec::with_capacity(count);
      let mut types = Vec::with_capacity(count);
      for value in values {
        let operand = self.lower_expr(value, InferContext::maybe(ty))?;
        let (id, ty) = self.coerce_or_default(operand, ty)?;
        ids.push(id);
        types.push(ty);
      }
      return Ok((ids, types));
    }

    let [value] = values else {
      return Err(DiagnosticMessage::AssignmentCountMismatch {
        left: count,
        right: values.len(),
        span: span.clone(),
      });
    };

    let operand = self.lower_expr(value, InferContext::maybe(ty).results(count))?;
    let types = self.spread_types(&operand, count)?;
    if let Some(ty) = ty {
      if let Some(bad) = types.iter().find(|got| !self.assignable(**got, ty)) {
        return Err(DiagnosticMessage::TypeMismatch {
          expected: self.type_name(ty),
          got: self.type_name(*bad),
          span: operand.span,
        });
      }
      return Ok((vec![operand.id], vec![ty; count]));
    }
    Ok((vec![operand.id], types))
  }

  /// Types of the `count` values one multi-valued operand produces.
  fn spread_types(
    &self,
    operand: &Operand,
    count: usize,
  ) -> LowerResult<Vec<TypeId>> {
    let types = match self.types.get(&operand.ty) {
      Type::Tuple(elements) => elements.clone(),
      _ if operand.comma_ok && count == 2 => vec![operand.ty, self.types.bool()],
      _ if operand.mode == OperandMode::NoValue => Vec::new(),
      _ => vec![operand.ty],
    };

    if types.len() != count {
      return Err(DiagnosticMessage::AssignmentCountMismatch {
        left: count,
        right: types.len(),
        span: operand.span.clone(),
      });
    }
    Ok(types)
  }

  /// `a, b := ...`
  fn lower_define(
    &mut self,
    lhs: &[NodeId],
    rhs: &[NodeId],
    span: &Span,
  ) -> LowerResult<HostId> {
    let mut names = Vec::with_capacity(lhs.len());
    for target in lhs {
      let Some(name) = self.unit.identifier(target) else {
        return Err(DiagnosticMessage::UnsupportedConstruct {
          what: format!("{} on the left side of :=", self.source_text(target)),
          span: self.span(target),
        });
      };
      names.push(name.to_string());
    }

    let (values, types) = self.lower_values(rhs, names.len(), None, span)?;

    if !names.iter().any(|name| name != BLANK && !self.scopes.is_local(name)) {
      return Err(DiagnosticMessage::NoNewVariables { span: span.clone() });
    }
    for (name, ty) in names.iter().zip(&types) {
      if !self.scopes.is_local(name) {
        let _ = self.scopes.define(name, Symbol::variable(*ty));
      }
    }

    let lhs = lhs
      .iter()
      .zip(&names)
      .map(|(target, name)| {
        let span = self.span(target);
        self.alloc(HostKind::Identifier(name.clone()), &span)
      })
      .collect();
    Ok(self.alloc(
      HostKind::Assign {
        lhs,
        rhs: values,
        define: true,
        operation: None,
      },
      span,
    ))
  }

  /// `a, b = ...`
  fn lower_assign(
    &mut self,
    lhs: &[NodeId],
    rhs: &[NodeId],
    span: &Span,
  ) -> LowerResult<HostId> {
    let mut targets = Vec::with_capacity(lhs.len());
    let mut slots = Vec::with_capacity(lhs.len());
    for target in lhs {
      if self.unit.identifier(target) == Some(BLANK) {
        let span = self.span(target);
        targets.push(self.alloc(HostKind::Identifier(BLANK.to_string()), &span));
        slots.push(None);
        continue;
      }
      let operand = self.lower_expr(target, InferContext::none())?;
      self.check_value(&operand)?;
      targets.push(operand.id);
      slots.push(Some(operand.ty));
    }

    let values = if rhs.len() == lhs.len() {
      let mut values = Vec::with_capacity(rhs.len());
      for (value, slot) in rhs.iter().zip(&slots) {
        let operand = self.lower_expr(value, InferContext::maybe(*slot))?;
        values.push(self.coerce_or_default(operand, *slot)?.0);
      }
      values
    } else {
      let [value] = rhs else {
        return Err(DiagnosticMessage::AssignmentCountMismatch {
          left: lhs.len(),
          right: rhs.len(),
          span: span.clone(),
        });
      };
      let operand = self.lower_expr(value, InferContext::none().results(lhs.len()))?;
      let types = self.spread_types(&operand, lhs.len())?;
      for (got, slot) in types.iter().zip(&slots) {
        if let Some(slot) = slot {
          if !self.assignable(*got, *slot) {
            return Err(DiagnosticMessage::TypeMismatch {
              expected: self.type_name(*slot),
              got: self.type_name(*got),
              span: operand.span,
            });
          }
        }
      }
      vec![operand.id]
    };

    Ok(self.alloc(
      HostKind::Assign {
        lhs: targets,
        rhs: values,
        define: false,
        operation: None,
      },
      span,
    ))
  }

  /// `x op= y`
  fn lower_compound(
    &mut self,
    operator: ASTBinaryOperator,
    lhs: &[NodeId],
    rhs: &[NodeId],
    span: &Span,
  ) -> LowerResult<HostId> {
    let ([target], [value]) = (lhs, rhs) else {
      return Err(DiagnosticMessage::AssignmentCountMismatch {
        left: lhs.len(),
        right: rhs.len(),
        span: span.clone(),
      });
    };

    let target = self.lower_expr(target, InferContext::none())?;
    self.check_value(&target)?;
    let expected = if operator.is_shift() { None } else { Some(target.ty) };
    let value = self.lower_expr(value, InferContext::maybe(expected))?;

    if self.registry.get(target.ty).is_some() {
      return self.lower_registered_assign(operator, target, value, span);
    }

    // Type-check `x op y`; only the operands are kept.
    self.lower_binary(operator, target.clone(), value.clone(), span)?;
    let value = match expected {
      Some(ty) => self.coerce(value, ty)?,
      None => self.value_of(value)?.0,
    };

    Ok(self.alloc(
      HostKind::Assign {
        lhs: vec![target.id],
        rhs: vec![value],
        define: false,
        operation: Some(binary_operation(operator)),
      },
      span,
    ))
  }

  fn lower_inc_dec(
    &mut self,
    target: &NodeId,
    increment: bool,
    span: &Span,
  ) -> LowerResult<HostId> {
    let target = self.lower_expr(target, InferContext::none())?;
    self.check_value(&target)?;

    if self.registry.get(target.ty).is_some() {
      return Ok(self.lower_registered_inc_dec(target, increment, span));
    }

    let numeric = self
      .types
      .basic_kind(self.types.underlying(target.ty))
      .is_some_and(|kind| kind.is_numeric());
    if !numeric && !self.is_invalid(target.ty) {
      let op = if increment { "++" } else { "--" };
      return Err(self.invalid_operation(op, target.ty, span));
    }

    Ok(self.alloc(
      HostKind::IncDec {
        target: target.id,
        increment,
      },
      span,
    ))
  }

  fn lower_send(
    &mut self,
    channel: &NodeId,
    value: &NodeId,
    span: &Span,
  ) -> LowerResult<HostId> {
    let (channel, channel_ty) = self.lower_default(channel)?;
    let element = match self.types.get(&self.types.underlying(channel_ty)) {
      Type::Chan { element, .. } => *element,
      _ if self.is_invalid(channel_ty) => channel_ty,
      _ => return Err(self.invalid_operation("<-", channel_ty, span)),
    };
    let value = self.lower_into(value, element)?;
    Ok(self.alloc(HostKind::Send { channel, value }, span))
  }
  // #endregion Assignment

  // #region Declarations
  /// A `var` or `const` spec and the symbols it introduces.
  ///
  /// Untyped big-number constants only live in scope: Go has no spelling
  /// for them, so they are folded into their uses instead of emitted.
  pub(crate) fn lower_value_spec(
    &mut self,
    spec: &ASTValueSpec,
    constant: bool,
    span: &Span,
  ) -> LowerResult<(Option<HostId>, Vec<(String, Symbol)>)> {
    let ty = match &spec.ty {
      Some(ty) => Some(self.resolve_type(ty)?),
      None => None,
    };

    if constant {
      return self.lower_const_spec(spec, ty, span);
    }

    let (values, symbols) = if spec.values.is_empty() {
      let Some(ty) = ty else {
        return Err(DiagnosticMessage::UnsupportedConstruct {
          what: "var without a type or a value".to_string(),
          span: span.clone(),
        });
      };
      let symbols = spec
        .names
        .iter()
        .map(|name| (name.clone(), Symbol::variable(ty)))
        .collect();
      (Vec::new(), symbols)
    } else {
      let (values, types) = self.lower_values(&spec.values, spec.names.len(), ty, span)?;
      let symbols = spec
        .names
        .iter()
        .zip(types)
        .map(|(name, ty)| (name.clone(), Symbol::variable(ty)))
        .collect();
      (values, symbols)
    };

    let decl = self.alloc(
      HostKind::VarDecl {
        names: spec.names.clone(),
        ty,
        values,
        doc: spec.doc.clone(),
      },
      span,
    );
    Ok((Some(decl), symbols))
  }

  fn lower_const_spec(
    &mut self,
    spec: &ASTValueSpec,
    ty: Option<TypeId>,
    span: &Span,
  ) -> LowerResult<(Option<HostId>, Vec<(String, Symbol)>)> {
    if spec.values.len() != spec.names.len() {
      return Err(DiagnosticMessage::AssignmentCountMismatch {
        left: spec.names.len(),
        right: spec.values.len(),
        span: span.clone(),
      });
    }

    let mut names = Vec::with_capacity(spec.names.len());
    let mut values = Vec::with_capacity(spec.values.len());
    let mut symbols = Vec::with_capacity(spec.names.len());
    for (name, value) in spec.names.iter().zip(&spec.values) {
      let operand = self.lower_expr(value, InferContext::maybe(ty))?;
      let Some(constant) = operand.constant.clone() else {
        return Err(DiagnosticMessage::TypeMismatch {
          expected: "constant".to_string(),
          got: self.source_text(value),
          span: operand.span,
        });
      };

      match ty {
        Some(ty) => {
          values.push(self.coerce(operand, ty)?);
          names.push(name.clone());
          symbols.push((name.clone(), Symbol::constant(ty, Some(constant))));
        },
        None if self.is_untyped_big(operand.ty) => {
          symbols.push((name.clone(), Symbol::constant(operand.ty, Some(constant))));
        },
        None => {
          let symbol_ty = operand.ty;
          values.push(operand.id);
          names.push(name.clone());
          symbols.push((name.clone(), Symbol::constant(symbol_ty, Some(constant))));
        },
      }
    }

    if names.is_empty() {
      return Ok((None, symbols));
    }
    let decl = self.alloc(
      HostKind::ConstDecl {
        names,
        ty,
        values,
        doc: spec.doc.clone(),
      },
      span,
    );
    Ok((Some(decl), symbols))
  }

  fn lower_local_values(
    &mut self,
    spec: &ASTValueSpec,
    constant: bool,
    span: &Span,
  ) -> LowerResult<Option<HostId>> {
    let (decl, symbols) = self.lower_value_spec(spec, constant, span)?;
    for (name, symbol) in symbols {
      if self.scopes.define(&name, symbol).is_err() {
        return Err(DiagnosticMessage::Redeclared {
          name,
          span: span.clone(),
          previous_span: span.clone(),
        });
      }
    }
    Ok(decl)
  }

  fn lower_local_type(
    &mut self,
    name: &str,
    ty: &NodeId,
    alias: bool,
    doc: Option<String>,
    span: &Span,
  ) -> LowerResult<HostId> {
    let definition = if alias {
      let resolved = self.resolve_type(ty)?;
      let _ = self.scopes.define(name, Symbol::type_name(resolved));
      resolved
    } else {
      // Bound before its definition so the type can refer to itself.
      let named = self.types.declare_named(None, name);
      let _ = self.scopes.define(name, Symbol::type_name(named));
      let definition = self.resolve_type(ty)?;
      self.types.set_underlying(named, definition);
      definition
    };

    Ok(self.alloc(
      HostKind::TypeDecl {
        name: name.to_string(),
        definition,
        alias,
        doc,
      },
      span,
    ))
  }
  // #endregion Declarations

  // #region Control flow
  fn lower_if(
    &mut self,
    init: Option<NodeId>,
    condition: &NodeId,
    then_block: &NodeId,
    else_branch: Option<NodeId>,
    span: &Span,
  ) -> LowerResult<HostId> {
    let scope = self.scopes.current();
    self.scopes.push(ScopeKind::Block);
    let lowered = self.lower_if_parts(init, condition, then_block, else_branch);
    self.scopes.set_current(scope);
    let (init, condition, then_branch, else_branch) = lowered?;

    Ok(self.alloc(
      HostKind::If {
        init,
        condition,
        then_branch,
        else_branch,
      },
      span,
    ))
  }

  #[allow(clippy::type_complexity)]
  fn lower_if_parts(
    &mut self,
    init: Option<NodeId>,
    condition: &NodeId,
    then_block: &NodeId,
    else_branch: Option<NodeId>,
  ) -> LowerResult<(Option<HostId>, HostId, HostId, Option<HostId>)> {
    let init = match init {
      Some(init) => self.lower_simple_statement(&init)?,
      None => None,
    };
    let condition = self.lower_condition(condition)?;
    let then_branch = self.lower_block(then_block, ScopeKind::Block)?;

    let else_branch = match else_branch {
      Some(branch) if matches!(self.unit.statement(&branch), Some(ASTStatement::If { .. })) => {
        // An `else if` condition that hoists needs a block of its own.
        let statements = self.lower_statement(&branch)?;
        match statements.as_slice() {
          [single] => Some(*single),
          _ => Some(self.scaffold(HostKind::Block(statements))),
        }
      },
      Some(branch) => Some(self.lower_block(&branch, ScopeKind::Block)?),
      None => None,
    };

    Ok((init, condition, then_branch, else_branch))
  }

  fn lower_for(
    &mut self,
    init: Option<NodeId>,
    condition: Option<NodeId>,
    post: Option<NodeId>,
    body: &NodeId,
    span: &Span,
  ) -> LowerResult<HostId> {
    let scope = self.scopes.current();
    self.scopes.push(ScopeKind::Loop);
    let lowered = self.lower_for_parts(init, condition, post, body, span);
    self.scopes.set_current(scope);
    let (init, condition, post, body) = lowered?;

    Ok(self.alloc(
      HostKind::For {
        init,
        condition,
        post,
        body,
      },
      span,
    ))
  }

  #[allow(clippy::type_complexity)]
  fn lower_for_parts(
    &mut self,
    init: Option<NodeId>,
    condition: Option<NodeId>,
    post: Option<NodeId>,
    body: &NodeId,
    span: &Span,
  ) -> LowerResult<(Option<HostId>, Option<HostId>, Option<HostId>, HostId)> {
    let init = match init {
      Some(init) => self.lower_simple_statement(&init)?,
      None => None,
    };

    // Condition and post run on every iteration: nothing may be hoisted out.
    let hoisted = self.hoisted.len();
    let condition = match condition {
      Some(condition) => Some(self.lower_condition(&condition)?),
      None => None,
    };
    let post = match post {
      Some(post) => self.lower_simple_statement(&post)?,
      None => None,
    };
    if self.hoisted.len() != hoisted {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: "? wrap in a loop condition or post statement".to_string(),
        span: span.clone(),
      });
    }

    let body = self.lower_block(body, ScopeKind::Block)?;
    Ok((init, condition, post, body))
  }

  fn lower_range(
    &mut self,
    key: Option<NodeId>,
    value: Option<NodeId>,
    define: bool,
    source: &NodeId,
    body: &NodeId,
    span: &Span,
  ) -> LowerResult<HostId> {
    let source = self.lower_expr(source, InferContext::none())?;
    let source_span = source.span.clone();
    let (source, source_ty) = self.value_of(source)?;
    let plan = self.range_plan(source_ty, &source_span)?;

    if !define && (key.is_some() || value.is_some()) {
      if plan.is_iterator() {
        return Err(DiagnosticMessage::RangeAssignOverIterator { span: span.clone() });
      }

      let key = match key {
        Some(key) => Some(self.lower_range_target(&key)?),
        None => None,
      };
      let value = match value {
        Some(value) => Some(self.lower_range_target(&value)?),
        None => None,
      };
      let body = self.lower_block(body, ScopeKind::Range)?;
      return Ok(self.alloc(
        HostKind::Range {
          key,
          value,
          define: false,
          source,
          body,
        },
        span,
      ));
    }

    let key = match key {
      Some(key) => Some(self.range_name(&key)?),
      None => None,
    };
    let value = match value {
      Some(value) => Some(self.range_name(&value)?),
      None => None,
    };

    let scope = self.scopes.current();
    self.scopes.push(if plan.is_push() { ScopeKind::Callback } else { ScopeKind::Range });
    self.bind_range_vars(&plan, key.as_deref(), value.as_deref());
    let lowered = self.lower_block_statements(body, ScopeKind::Block);
    self.scopes.set_current(scope);

    Ok(self.emit_range(&plan, source, key.as_deref(), value.as_deref(), lowered?, span))
  }

  fn range_name(
    &self,
    id: &NodeId,
  ) -> LowerResult<String> {
    match self.unit.identifier(id) {
      Some(name) => Ok(name.to_string()),
      None => Err(DiagnosticMessage::UnsupportedConstruct {
        what: format!("{} as a range variable", self.source_text(id)),
        span: self.span(id),
      }),
    }
  }

  fn lower_range_target(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<HostId> {
    if self.unit.identifier(id) == Some(BLANK) {
      let span = self.span(id);
      return Ok(self.alloc(HostKind::Identifier(BLANK.to_string()), &span));
    }
    let operand = self.lower_expr(id, InferContext::none())?;
    self.check_value(&operand)?;
    Ok(operand.id)
  }

  /// `for k, v <- source, guard { body }`
  fn lower_for_phrase(
    &mut self,
    clause: &ForClause,
    body: &NodeId,
    span: &Span,
  ) -> LowerResult<HostId> {
    let source = self.lower_expr(&clause.source, InferContext::none())?;
    let source_span = source.span.clone();
    let (source, source_ty) = self.value_of(source)?;
    let plan = self.range_plan(source_ty, &source_span)?;

    let scope = self.scopes.current();
    self.scopes.push(if plan.is_push() { ScopeKind::Callback } else { ScopeKind::Range });
    self.bind_range_vars(&plan, clause.key.as_deref(), clause.value.as_deref());
    let lowered = self.lower_for_phrase_body(clause, body);
    self.scopes.set_current(scope);
    let statements = lowered?;

    Ok(self.emit_range(
      &plan,
      source,
      clause.key.as_deref(),
      clause.value.as_deref(),
      statements,
      span,
    ))
  }

  fn lower_for_phrase_body(
    &mut self,
    clause: &ForClause,
    body: &NodeId,
  ) -> LowerResult<Vec<HostId>> {
    let outer = std::mem::take(&mut self.hoisted);
    let header = self.lower_for_phrase_header(clause);
    let mut statements = std::mem::replace(&mut self.hoisted, outer);
    let (init, guard) = header?;

    let Some(condition) = guard else {
      statements.extend(init);
      statements.extend(self.lower_block_statements(body, ScopeKind::Block)?);
      return Ok(statements);
    };

    let then_branch = self.lower_block(body, ScopeKind::Block)?;
    let span = self.span(clause.guard.as_ref().unwrap_or(body));
    statements.push(self.alloc(
      HostKind::If {
        init,
        condition,
        then_branch,
        else_branch: None,
      },
      &span,
    ));
    Ok(statements)
  }

  fn lower_for_phrase_header(
    &mut self,
    clause: &ForClause,
  ) -> LowerResult<(Option<HostId>, Option<HostId>)> {
    let init = match &clause.init {
      Some(init) => self.lower_simple_statement(init)?,
      None => None,
    };
    let guard = match &clause.guard {
      Some(guard) => Some(self.lower_condition(guard)?),
      None => None,
    };
    Ok((init, guard))
  }

  fn lower_switch(
    &mut self,
    init: Option<NodeId>,
    tag: Option<NodeId>,
    clauses: &[ASTCaseClause],
    span: &Span,
  ) -> LowerResult<HostId> {
    let scope = self.scopes.current();
    self.scopes.push(ScopeKind::Block);
    let lowered = self.lower_switch_parts(init, tag, clauses);
    self.scopes.set_current(scope);
    let (init, tag, clauses) = lowered?;

    Ok(self.alloc(HostKind::Switch { init, tag, clauses }, span))
  }

  #[allow(clippy::type_complexity)]
  fn lower_switch_parts(
    &mut self,
    init: Option<NodeId>,
    tag: Option<NodeId>,
    clauses: &[ASTCaseClause],
  ) -> LowerResult<(Option<HostId>, Option<HostId>, Vec<HostCaseClause>)> {
    let init = match init {
      Some(init) => self.lower_simple_statement(&init)?,
      None => None,
    };
    let (tag, tag_ty) = match tag {
      Some(tag) => {
        let (id, ty) = self.lower_default(&tag)?;
        (Some(id), Some(ty))
      },
      None => (None, None),
    };

    let mut lowered = Vec::with_capacity(clauses.len());
    for clause in clauses {
      let values = if clause.is_default {
        None
      } else {
        let mut values = Vec::with_capacity(clause.values.len());
        for value in &clause.values {
          values.push(match tag_ty {
            Some(ty) => self.lower_case_value(value, ty)?,
            None => self.lower_condition(value)?,
          });
        }
        Some(values)
      };
      let body = self.lower_clause_body(&clause.body, ScopeKind::SwitchCase)?;
      lowered.push(HostCaseClause { values, body });
    }

    Ok((init, tag, lowered))
  }

  /// A case value compared against a tag of type `tag`.
  fn lower_case_value(
    &mut self,
    value: &NodeId,
    tag: TypeId,
  ) -> LowerResult<HostId> {
    let operand = self.lower_expr(value, InferContext::expecting(tag))?;
    if self.types.is_interface(tag) || operand.mode == OperandMode::Nil {
      return Ok(self.value_of(operand)?.0);
    }
    self.coerce(operand, tag)
  }

  fn lower_clause_body(
    &mut self,
    body: &[NodeId],
    kind: ScopeKind,
  ) -> LowerResult<Vec<HostId>> {
    let scope = self.scopes.current();
    self.scopes.push(kind);
    let lowered = self.lower_statements(body);
    self.scopes.set_current(scope);
    lowered
  }

  fn lower_type_switch(
    &mut self,
    init: Option<NodeId>,
    binding: Option<String>,
    subject: &NodeId,
    clauses: &[ASTTypeCaseClause],
    span: &Span,
  ) -> LowerResult<HostId> {
    let scope = self.scopes.current();
    self.scopes.push(ScopeKind::Block);
    let lowered = self.lower_type_switch_parts(init, binding.as_deref(), subject, clauses);
    self.scopes.set_current(scope);
    let (init, subject, clauses) = lowered?;

    Ok(self.alloc(
      HostKind::TypeSwitch {
        init,
        binding,
        subject,
        clauses,
      },
      span,
    ))
  }

  #[allow(clippy::type_complexity)]
  fn lower_type_switch_parts(
    &mut self,
    init: Option<NodeId>,
    binding: Option<&str>,
    subject: &NodeId,
    clauses: &[ASTTypeCaseClause],
  ) -> LowerResult<(Option<HostId>, HostId, Vec<HostTypeCaseClause>)> {
    let init = match init {
      Some(init) => self.lower_simple_statement(&init)?,
      None => None,
    };
    let (subject, subject_ty) = self.lower_default(subject)?;
    if !self.types.is_interface(subject_ty) && !self.is_invalid(subject_ty) {
      return Err(DiagnosticMessage::TypeMismatch {
        expected: "interface".to_string(),
        got: self.type_name(subject_ty),
        span: self.tree.get(subject).origin.clone().unwrap_or_default(),
      });
    }

    let mut lowered = Vec::with_capacity(clauses.len());
    for clause in clauses {
      let types = if clause.is_default {
        None
      } else {
        let mut types = Vec::with_capacity(clause.types.len());
        for ty in &clause.types {
          types.push(match self.unit.identifier(ty) {
            Some("nil") => None,
            _ => Some(self.resolve_type(ty)?),
          });
        }
        Some(types)
      };

      let bound = match types.as_deref() {
        Some([Some(single)]) => *single,
        _ => subject_ty,
      };
      let scope = self.scopes.current();
      self.scopes.push(ScopeKind::TypeSwitchCase);
      if let Some(name) = binding {
        let _ = self.scopes.define(name, Symbol::variable(bound));
      }
      let body = self.lower_statements(&clause.body);
      self.scopes.set_current(scope);
      lowered.push(HostTypeCaseClause { types, body: body? });
    }

    Ok((init, subject, lowered))
  }

  fn lower_select(
    &mut self,
    clauses: &[ASTSelectClause],
    span: &Span,
  ) -> LowerResult<HostId> {
    let mut lowered = Vec::with_capacity(clauses.len());
    for clause in clauses {
      let scope = self.scopes.current();
      self.scopes.push(ScopeKind::SelectCase);
      let parts = self.lower_select_clause(clause);
      self.scopes.set_current(scope);
      let (comm, body) = parts?;
      lowered.push(HostSelectClause { comm, body });
    }
    Ok(self.alloc(HostKind::Select(lowered), span))
  }

  fn lower_select_clause(
    &mut self,
    clause: &ASTSelectClause,
  ) -> LowerResult<(Option<HostId>, Vec<HostId>)> {
    let comm = match &clause.comm {
      Some(comm) => self.lower_simple_statement(comm)?,
      None => None,
    };
    let body = self.lower_statements(&clause.body)?;
    Ok((comm, body))
  }

  /// The call of a `go` or `defer` statement.
  fn lower_deferred_call(
    &mut self,
    call: &NodeId,
    keyword: &str,
  ) -> LowerResult<HostId> {
    let operand = self.lower_expr(call, InferContext::none())?;
    if !matches!(self.tree.get(operand.id).kind, HostKind::Call { .. }) {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: format!("{} of {}: expression must be a function call", keyword, self.source_text(call)),
        span: operand.span,
      });
    }
    Ok(operand.id)
  }

  fn lower_return(
    &mut self,
    values: &[NodeId],
    span: &Span,
  ) -> LowerResult<HostId> {
    let results = self.func.as_ref().map(|func| func.results.clone()).unwrap_or_default();

    let lowered = if values.is_empty() {
      Vec::new()
    } else if values.len() == results.len() {
      let mut lowered = Vec::with_capacity(values.len());
      for (value, result) in values.iter().zip(&results) {
        lowered.push(self.lower_into(value, *result)?);
      }
      lowered
    } else if let ([value], true) = (values, results.len() > 1) {
      let operand = self.lower_expr(value, InferContext::none().results(results.len()))?;
      let got = self.types.results_of(operand.ty);
      if got.len() != results.len() || got.iter().zip(&results).any(|(g, r)| !self.assignable(*g, *r)) {
        return Err(DiagnosticMessage::ResultCountMismatch {
          expected: results.len(),
          got: got.len(),
          span: operand.span,
        });
      }
      vec![operand.id]
    } else {
      return Err(DiagnosticMessage::ResultCountMismatch {
        expected: results.len(),
        got: values.len(),
        span: span.clone(),
      });
    };

    Ok(self.alloc(HostKind::Return(lowered), span))
  }

  fn lower_branch(
    &mut self,
    kind: BranchKind,
    label: Option<String>,
    span: &Span,
  ) -> LowerResult<HostId> {
    let loop_control = matches!(kind, BranchKind::Break | BranchKind::Continue);
    if loop_control && label.is_none() {
      match self.scopes.branch_target(kind == BranchKind::Continue) {
        BranchTarget::Statement => {},
        BranchTarget::Callback => {
          // The loop body is a callback here: leaving it is all we can do.
          self.warn(DiagnosticMessage::LoopControlInCallback {
            keyword: kind.keyword().to_string(),
            span: span.clone(),
          });
          return Ok(self.alloc(HostKind::Return(Vec::new()), span));
        },
        BranchTarget::None => {
          return Err(DiagnosticMessage::UnsupportedConstruct {
            what: format!("{} outside a loop", kind.keyword()),
            span: span.clone(),
          });
        },
      }
    }

    Ok(self.alloc(
      HostKind::Branch {
        kind: host_branch(kind),
        label,
      },
      span,
    ))
  }
  // #endregion Control flow
}

