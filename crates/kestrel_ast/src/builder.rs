//! Programmatic construction of surface trees.
//!
//! The parser is an external collaborator, so tools and tests build trees
//! through [`SurfaceBuilder`]. Every node takes the builder's current cursor
//! span; move it with [`SurfaceBuilder::line`] and [`SurfaceBuilder::at`]
//! so positions, frame texts and line markers point at real source text.

use kestrel_type::{
  file::{FileId, SourceFile, SourceMap},
  span::Span,
  types::ChanDir,
  BytePosition, Store,
};

use crate::{
  expressions::{
    ASTBinaryOperator, ASTElement, ASTExpression, ASTLiteral, ASTUnaryOperator, ComprehensionYield, ErrorWrapPolicy,
    ForClause, LambdaBody, LiteralKind,
  },
  statements::{
    ASTCaseClause, ASTFunction, ASTReceiver, ASTSelectClause, ASTStatement, ASTTypeCaseClause, ASTValueSpec,
    AssignOperator, BranchKind,
  },
  type_::{ASTField, ASTInterfaceMethod, ASTParam, ASTType},
  ASTNode, ASTNodeKind, NodeId, SourceUnit,
};

pub struct SurfaceBuilder {
  nodes: Store<ASTNode>,
  roots: Vec<NodeId>,
  package: String,
  source: SourceFile,
  file: FileId,
  cursor: Span,
}

impl SurfaceBuilder {
  /// Register `text` under `path` in `sm` and start building its unit.
  pub fn new(
    sm: &mut SourceMap,
    path: &str,
    text: &str,
    package: &str,
  ) -> Self {
    let file = sm.add_file(path, text.to_string());
    let source = sm.get(&file).clone();

    Self {
      nodes: Store::new(),
      roots: Vec::new(),
      package: package.to_string(),
      source,
      file,
      cursor: Span::empty_at(file, BytePosition(0)),
    }
  }

  pub fn file(&self) -> FileId {
    self.file
  }

  pub fn cursor(&self) -> Span {
    self.cursor.clone()
  }

  /// Point the cursor at the 1-based `line`, without its indentation.
  pub fn line(
    &mut self,
    line: u32,
  ) -> &mut Self {
    if let Some((start, end)) = self.source.line_range(line) {
      let text = &self.source.text[start.0 as usize..end.0 as usize];
      let indent = (text.len() - text.trim_start().len()) as u32;
      self.cursor = Span::new(self.file, BytePosition(start.0 + indent), end);
    }
    self
  }

  /// Point the cursor at the first occurrence of `snippet` at or after the
  /// start of the current cursor.
  pub fn at(
    &mut self,
    snippet: &str,
  ) -> &mut Self {
    let from = self.cursor.start.0 as usize;
    let found = self.source.text[from..]
      .find(snippet)
      .map(|offset| from + offset)
      .or_else(|| self.source.text.find(snippet));

    if let Some(start) = found {
      let start = start as u32;
      self.cursor = Span::new(self.file, BytePosition(start), BytePosition(start + snippet.len() as u32));
    }
    self
  }

  pub fn node(
    &mut self,
    kind: ASTNodeKind,
  ) -> NodeId {
    self.nodes.alloc(ASTNode {
      kind,
      span: self.cursor.clone(),
    })
  }

  pub fn expression(
    &mut self,
    expression: ASTExpression,
  ) -> NodeId {
    self.node(ASTNodeKind::Expression(expression))
  }

  pub fn statement(
    &mut self,
    statement: ASTStatement,
  ) -> NodeId {
    self.node(ASTNodeKind::Statement(statement))
  }

  pub fn type_node(
    &mut self,
    ty: ASTType,
  ) -> NodeId {
    self.node(ASTNodeKind::Type(ty))
  }

  /// Append a top-level statement.
  pub fn root(
    &mut self,
    id: NodeId,
  ) -> NodeId {
    self.roots.push(id);
    id
  }

  pub fn finish(self) -> SourceUnit {
    SourceUnit {
      nodes: self.nodes,
      roots: self.roots,
      file: self.file,
      package: self.package,
    }
  }

  // #region Expressions
  pub fn ident(
    &mut self,
    name: &str,
  ) -> NodeId {
    self.expression(ASTExpression::Identifier(name.to_string()))
  }

  fn literal(
    &mut self,
    kind: LiteralKind,
    raw: &str,
  ) -> NodeId {
    self.expression(ASTExpression::Literal(ASTLiteral {
      kind,
      raw: raw.to_string(),
    }))
  }

  pub fn int(
    &mut self,
    raw: &str,
  ) -> NodeId {
    self.literal(LiteralKind::Int, raw)
  }

  pub fn float(
    &mut self,
    raw: &str,
  ) -> NodeId {
    self.literal(LiteralKind::Float, raw)
  }

  /// `raw` without the trailing `i`.
  pub fn imaginary(
    &mut self,
    raw: &str,
  ) -> NodeId {
    self.literal(LiteralKind::Imaginary, raw)
  }

  /// `raw` with its quotes, e.g. `'a'`.
  pub fn rune(
    &mut self,
    raw: &str,
  ) -> NodeId {
    self.literal(LiteralKind::Rune, raw)
  }

  /// A string literal with the given contents; quoting is added here.
  pub fn string(
    &mut self,
    value: &str,
  ) -> NodeId {
    let raw = format!("{:?}", value);
    self.literal(LiteralKind::String, &raw)
  }

  /// `1r`, given without the suffix.
  pub fn big_int(
    &mut self,
    raw: &str,
  ) -> NodeId {
    self.literal(LiteralKind::BigInt, raw)
  }

  pub fn element(
    &mut self,
    key: Option<NodeId>,
    value: NodeId,
  ) -> ASTElement {
    ASTElement { key, value }
  }

  pub fn composite(
    &mut self,
    ty: Option<NodeId>,
    elements: Vec<ASTElement>,
  ) -> NodeId {
    self.expression(ASTExpression::CompositeLiteral { ty, elements })
  }

  /// `[a, b, c]`
  pub fn slice_literal(
    &mut self,
    values: Vec<NodeId>,
  ) -> NodeId {
    let elements = values.into_iter().map(|value| ASTElement { key: None, value }).collect();
    self.expression(ASTExpression::SliceLiteral { elements })
  }

  /// `{k1: v1, k2: v2}`
  pub fn map_literal(
    &mut self,
    pairs: Vec<(NodeId, NodeId)>,
  ) -> NodeId {
    let elements = pairs
      .into_iter()
      .map(|(key, value)| ASTElement { key: Some(key), value })
      .collect();
    self.expression(ASTExpression::CompositeLiteral { ty: None, elements })
  }

  pub fn grouping(
    &mut self,
    inner: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Grouping(inner))
  }

  pub fn member(
    &mut self,
    object: NodeId,
    member: &str,
  ) -> NodeId {
    self.expression(ASTExpression::MemberAccess {
      object,
      member: member.to_string(),
    })
  }

  /// `a.b.c` from a dotted path.
  pub fn path(
    &mut self,
    dotted: &str,
  ) -> NodeId {
    let mut parts = dotted.split('.');
    let first = parts.next().unwrap_or_default();
    let mut current = self.ident(first);
    for part in parts {
      current = self.member(current, part);
    }
    current
  }

  pub fn index(
    &mut self,
    object: NodeId,
    index: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Index { object, index })
  }

  pub fn slice_expr(
    &mut self,
    object: NodeId,
    low: Option<NodeId>,
    high: Option<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::SliceExpr {
      object,
      low,
      high,
      max: None,
    })
  }

  pub fn type_assert(
    &mut self,
    object: NodeId,
    ty: Option<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::TypeAssertion { object, ty })
  }

  pub fn call(
    &mut self,
    callee: NodeId,
    args: Vec<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::Call {
      callee,
      args,
      spread: false,
    })
  }

  /// `f(args...)`
  pub fn call_spread(
    &mut self,
    callee: NodeId,
    args: Vec<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::Call {
      callee,
      args,
      spread: true,
    })
  }

  pub fn command(
    &mut self,
    head: NodeId,
    args: Vec<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::Command { head, args })
  }

  pub fn ambiguous_command(
    &mut self,
    head: NodeId,
    operator: ASTUnaryOperator,
    operand: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::AmbiguousCommand { head, operator, operand })
  }

  pub fn deref(
    &mut self,
    inner: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Dereference(inner))
  }

  pub fn unary(
    &mut self,
    operator: ASTUnaryOperator,
    operand: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Unary { operator, operand })
  }

  pub fn binary(
    &mut self,
    operator: ASTBinaryOperator,
    left: NodeId,
    right: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Binary { operator, left, right })
  }

  pub fn func_literal(
    &mut self,
    signature: NodeId,
    body: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::FunctionLiteral { signature, body })
  }

  pub fn lambda(
    &mut self,
    params: &[&str],
    body: Vec<NodeId>,
  ) -> NodeId {
    self.expression(ASTExpression::Lambda {
      params: params.iter().map(|p| p.to_string()).collect(),
      body: LambdaBody::Expressions(body),
    })
  }

  pub fn lambda_block(
    &mut self,
    params: &[&str],
    block: NodeId,
  ) -> NodeId {
    self.expression(ASTExpression::Lambda {
      params: params.iter().map(|p| p.to_string()).collect(),
      body: LambdaBody::Block(block),
    })
  }

  /// A `key, value <- source, guard` clause.
  pub fn clause(
    &mut self,
    key: Option<&str>,
    value: Option<&str>,
    source: NodeId,
    guard: Option<NodeId>,
  ) -> ForClause {
    ForClause {
      key: key.map(str::to_string),
      value: value.map(str::to_string),
      source,
      init: None,
      guard,
    }
  }

  pub fn comprehension(
    &mut self,
    yields: ComprehensionYield,
    clauses: Vec<ForClause>,
  ) -> NodeId {
    self.expression(ASTExpression::Comprehension { yields, clauses })
  }

  pub fn error_wrap(
    &mut self,
    expr: NodeId,
    policy: ErrorWrapPolicy,
  ) -> NodeId {
    self.expression(ASTExpression::ErrorWrap { expr, policy })
  }
  // #endregion Expressions

  // #region Statements
  pub fn expr_stmt(
    &mut self,
    expr: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Expression(expr))
  }

  /// `a, b := values`
  pub fn define(
    &mut self,
    names: &[&str],
    values: Vec<NodeId>,
  ) -> NodeId {
    let lhs = names.iter().map(|name| self.ident(name)).collect();
    self.statement(ASTStatement::Assign {
      lhs,
      operator: AssignOperator::Define,
      rhs: values,
    })
  }

  pub fn assign(
    &mut self,
    lhs: Vec<NodeId>,
    rhs: Vec<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::Assign {
      lhs,
      operator: AssignOperator::Assign,
      rhs,
    })
  }

  pub fn compound_assign(
    &mut self,
    operator: ASTBinaryOperator,
    target: NodeId,
    value: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Assign {
      lhs: vec![target],
      operator: AssignOperator::Compound(operator),
      rhs: vec![value],
    })
  }

  pub fn inc_dec(
    &mut self,
    target: NodeId,
    increment: bool,
  ) -> NodeId {
    self.statement(ASTStatement::IncDec { target, increment })
  }

  pub fn send(
    &mut self,
    channel: NodeId,
    value: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Send { channel, value })
  }

  pub fn var_decl(
    &mut self,
    names: &[&str],
    ty: Option<NodeId>,
    values: Vec<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::Variable(ASTValueSpec {
      names: names.iter().map(|n| n.to_string()).collect(),
      ty,
      values,
      doc: None,
    }))
  }

  pub fn const_decl(
    &mut self,
    names: &[&str],
    ty: Option<NodeId>,
    values: Vec<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::Constant(ASTValueSpec {
      names: names.iter().map(|n| n.to_string()).collect(),
      ty,
      values,
      doc: None,
    }))
  }

  pub fn type_decl(
    &mut self,
    name: &str,
    ty: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::TypeDecl {
      name: name.to_string(),
      ty,
      alias: false,
      doc: None,
    })
  }

  pub fn func_decl(
    &mut self,
    name: &str,
    signature: NodeId,
    body: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Function(ASTFunction {
      receiver: None,
      name: name.to_string(),
      signature,
      body: Some(body),
      doc: None,
    }))
  }

  pub fn method_decl(
    &mut self,
    receiver: (&str, &str, bool),
    name: &str,
    signature: NodeId,
    body: NodeId,
  ) -> NodeId {
    let (recv_name, recv_type, pointer) = receiver;
    let ty = self.named_type(recv_type);
    self.statement(ASTStatement::Function(ASTFunction {
      receiver: Some(ASTReceiver {
        name: Some(recv_name.to_string()),
        ty,
        pointer,
      }),
      name: name.to_string(),
      signature,
      body: Some(body),
      doc: None,
    }))
  }

  /// Attach a doc comment to a declaration statement.
  pub fn with_doc(
    &mut self,
    id: NodeId,
    text: &str,
  ) -> NodeId {
    if let ASTNodeKind::Statement(statement) = &mut self.nodes.get_mut(id).kind {
      match statement {
        ASTStatement::Variable(spec) | ASTStatement::Constant(spec) => spec.doc = Some(text.to_string()),
        ASTStatement::TypeDecl { doc, .. } => *doc = Some(text.to_string()),
        ASTStatement::Function(function) => function.doc = Some(text.to_string()),
        _ => {},
      }
    }
    id
  }

  pub fn import(
    &mut self,
    path: &str,
  ) -> NodeId {
    self.statement(ASTStatement::Import {
      path: path.to_string(),
      alias: None,
    })
  }

  pub fn block(
    &mut self,
    statements: Vec<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::Block(statements))
  }

  pub fn if_stmt(
    &mut self,
    condition: NodeId,
    then_block: NodeId,
    else_branch: Option<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::If {
      init: None,
      condition,
      then_block,
      else_branch,
    })
  }

  pub fn for_stmt(
    &mut self,
    init: Option<NodeId>,
    condition: Option<NodeId>,
    post: Option<NodeId>,
    body: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::For {
      init,
      condition,
      post,
      body,
    })
  }

  /// `for k, v := range source`
  pub fn range_stmt(
    &mut self,
    key: Option<&str>,
    value: Option<&str>,
    source: NodeId,
    body: NodeId,
  ) -> NodeId {
    let key = key.map(|k| self.ident(k));
    let value = value.map(|v| self.ident(v));
    self.statement(ASTStatement::Range {
      key,
      value,
      define: true,
      source,
      body,
    })
  }

  pub fn for_phrase(
    &mut self,
    clause: ForClause,
    body: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::ForPhrase { clause, body })
  }

  pub fn switch_stmt(
    &mut self,
    tag: Option<NodeId>,
    clauses: Vec<ASTCaseClause>,
  ) -> NodeId {
    self.statement(ASTStatement::Switch {
      init: None,
      tag,
      clauses,
    })
  }

  pub fn case(
    &mut self,
    values: Vec<NodeId>,
    body: Vec<NodeId>,
  ) -> ASTCaseClause {
    ASTCaseClause {
      is_default: values.is_empty(),
      values,
      body,
    }
  }

  pub fn type_switch(
    &mut self,
    binding: Option<&str>,
    subject: NodeId,
    clauses: Vec<ASTTypeCaseClause>,
  ) -> NodeId {
    self.statement(ASTStatement::TypeSwitch {
      init: None,
      binding: binding.map(str::to_string),
      subject,
      clauses,
    })
  }

  pub fn type_case(
    &mut self,
    types: Vec<NodeId>,
    body: Vec<NodeId>,
  ) -> ASTTypeCaseClause {
    ASTTypeCaseClause {
      is_default: types.is_empty(),
      types,
      body,
    }
  }

  pub fn select_stmt(
    &mut self,
    clauses: Vec<ASTSelectClause>,
  ) -> NodeId {
    self.statement(ASTStatement::Select(clauses))
  }

  pub fn go_stmt(
    &mut self,
    call: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Go(call))
  }

  pub fn defer_stmt(
    &mut self,
    call: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Defer(call))
  }

  pub fn ret(
    &mut self,
    values: Vec<NodeId>,
  ) -> NodeId {
    self.statement(ASTStatement::Return(values))
  }

  pub fn branch(
    &mut self,
    kind: BranchKind,
    label: Option<&str>,
  ) -> NodeId {
    self.statement(ASTStatement::Branch {
      kind,
      label: label.map(str::to_string),
    })
  }

  pub fn labeled(
    &mut self,
    label: &str,
    body: NodeId,
  ) -> NodeId {
    self.statement(ASTStatement::Labeled {
      label: label.to_string(),
      body,
    })
  }
  // #endregion Statements

  // #region Types
  pub fn named_type(
    &mut self,
    name: &str,
  ) -> NodeId {
    self.type_node(ASTType::Named {
      package: None,
      name: name.to_string(),
    })
  }

  /// `pkg.Name`, where `package` is the name the package is referred to by.
  pub fn qualified_type(
    &mut self,
    package: &str,
    name: &str,
  ) -> NodeId {
    self.type_node(ASTType::Named {
      package: Some(package.to_string()),
      name: name.to_string(),
    })
  }

  pub fn pointer_type(
    &mut self,
    inner: NodeId,
  ) -> NodeId {
    self.type_node(ASTType::Pointer(inner))
  }

  pub fn slice_type(
    &mut self,
    element: NodeId,
  ) -> NodeId {
    self.type_node(ASTType::Slice(element))
  }

  pub fn array_type(
    &mut self,
    len: Option<NodeId>,
    element: NodeId,
  ) -> NodeId {
    self.type_node(ASTType::Array { len, element })
  }

  pub fn map_type(
    &mut self,
    key: NodeId,
    value: NodeId,
  ) -> NodeId {
    self.type_node(ASTType::Map { key, value })
  }

  pub fn chan_type(
    &mut self,
    element: NodeId,
  ) -> NodeId {
    self.type_node(ASTType::Chan {
      dir: ChanDir::Both,
      element,
    })
  }

  pub fn func_type(
    &mut self,
    params: Vec<(Option<&str>, NodeId)>,
    results: Vec<NodeId>,
    variadic: bool,
  ) -> NodeId {
    let params = params
      .into_iter()
      .map(|(name, ty)| ASTParam {
        name: name.map(str::to_string),
        ty,
      })
      .collect();
    let results = results.into_iter().map(|ty| ASTParam { name: None, ty }).collect();
    self.type_node(ASTType::Function {
      params,
      results,
      variadic,
    })
  }

  pub fn struct_type(
    &mut self,
    fields: Vec<(Option<&str>, NodeId)>,
  ) -> NodeId {
    let fields = fields
      .into_iter()
      .map(|(name, ty)| ASTField {
        name: name.map(str::to_string),
        ty,
        tag: None,
      })
      .collect();
    self.type_node(ASTType::Struct(fields))
  }

  pub fn interface_type(
    &mut self,
    methods: Vec<(&str, NodeId)>,
  ) -> NodeId {
    let methods = methods
      .into_iter()
      .map(|(name, signature)| ASTInterfaceMethod {
        name: name.to_string(),
        signature,
      })
      .collect();
    self.type_node(ASTType::Interface(methods))
  }
  // #endregion Types
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cursor_tracks_lines_and_snippets() {
    let mut sm = SourceMap::new();
    let mut b = SurfaceBuilder::new(&mut sm, "/foo/bar.gop", "x := 1\n\ty := foo(x)\n", "main");

    b.line(2);
    let stmt_span = b.cursor();
    assert_eq!(sm.slice(&stmt_span), "y := foo(x)");

    b.at("foo(x)");
    let call = b.ident("foo");
    let unit = b.finish();
    assert_eq!(sm.slice(&unit.span(&call)), "foo(x)");
    assert_eq!(sm.line_col(&unit.file, unit.span(&call).start), (2, 7));
  }

  #[test]
  fn roots_keep_source_order() {
    let mut sm = SourceMap::new();
    let mut b = SurfaceBuilder::new(&mut sm, "/foo/bar.gop", "a\nb\n", "main");
    let a = b.ident("a");
    let first = b.expr_stmt(a);
    b.root(first);
    let bb = b.ident("b");
    let second = b.expr_stmt(bb);
    b.root(second);

    let unit = b.finish();
    assert_eq!(unit.roots, vec![first, second]);
    assert_eq!(unit.identifier(&a), Some("a"));
    assert!(unit.statement(&second).is_some());
  }

  #[test]
  fn path_builds_member_chain() {
    let mut sm = SourceMap::new();
    let mut b = SurfaceBuilder::new(&mut sm, "/foo/bar.gop", "doc.any.name\n", "main");
    let id = b.path("doc.any.name");
    let unit = b.finish();

    match unit.expression(&id) {
      Some(ASTExpression::MemberAccess { member, object }) => {
        assert_eq!(member, "name");
        assert!(matches!(unit.expression(object), Some(ASTExpression::MemberAccess { .. })));
      },
      other => panic!("unexpected {:?}", other),
    }
  }
}
