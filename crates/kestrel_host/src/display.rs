//! Reference renderer: prints a [`HostFile`] as gofmt-shaped Go source.
//!
//! Line markers are printed flush left on their own line right before the
//! node they annotate; indentation uses tabs.

use std::cell::Cell;

use kestrel_type::types::{package_name, Type, TypeId};

use crate::{
  operation::BinaryOperation, HostBranch, HostElement, HostFile, HostFunction, HostId, HostKind, HostSignature,
};

pub struct HostPrinter<'a> {
  file: &'a HostFile,
  output: String,
  /// Set while printing an `if`/`for`/`switch` header, where `T{}` must be
  /// parenthesized to not read as the block.
  header: Cell<bool>,
}

impl<'a> HostPrinter<'a> {
  pub fn new(file: &'a HostFile) -> Self {
    Self {
      file,
      output: String::new(),
      header: Cell::new(false),
    }
  }

  pub fn print(mut self) -> String {
    self.line(0, &format!("package {}", self.file.package));
    self.output.push('\n');

    let imports = self.file.imports();
    match imports.len() {
      0 => {},
      1 => {
        self.line(0, &format!("import {:?}", imports[0]));
        self.output.push('\n');
      },
      _ => {
        self.line(0, "import (");
        for path in &imports {
          self.line(1, &format!("{:?}", path));
        }
        self.line(0, ")");
        self.output.push('\n');
      },
    }

    // One blank line between the type, value and function groups.
    let file = self.file;
    let groups = [&file.type_decls, &file.value_decls, &file.function_decls];
    let mut first = true;
    for group in groups.into_iter().filter(|group| !group.is_empty()) {
      if !first {
        self.output.push('\n');
      }
      first = false;
      for (i, id) in group.iter().enumerate() {
        let function = matches!(file.tree.get(*id).kind, HostKind::FunctionDecl(_));
        if i > 0 && function {
          self.output.push('\n');
        }
        self.statement(*id, 0);
      }
    }

    self.output
  }

  fn line(
    &mut self,
    indent: usize,
    text: &str,
  ) {
    for _ in 0..indent {
      self.output.push('\t');
    }
    self.output.push_str(text);
    self.output.push('\n');
  }

  fn marker(
    &mut self,
    id: HostId,
  ) {
    let file = self.file;
    if let Some(marker) = file.markers.get(&id) {
      let text = marker.to_string();
      self.line(0, &text);
    }
  }

  fn doc(
    &mut self,
    indent: usize,
    doc: &Option<String>,
  ) {
    if let Some(doc) = doc {
      for text in doc.lines() {
        self.line(indent, text);
      }
    }
  }

  fn ty(
    &self,
    ty: TypeId,
  ) -> String {
    self.file.types.format(ty)
  }

  fn body(
    &mut self,
    id: HostId,
    indent: usize,
  ) {
    for statement in self.file.tree.statements(id) {
      self.statement(statement, indent);
    }
  }

  fn statement(
    &mut self,
    id: HostId,
    indent: usize,
  ) {
    self.marker(id);
    let file = self.file;

    match &file.tree.get(id).kind {
      HostKind::VarDecl { doc, .. } | HostKind::ConstDecl { doc, .. } => {
        self.doc(indent, doc);
        let text = self.simple_statement(id, indent);
        self.line(indent, &text);
      },
      HostKind::TypeDecl {
        name,
        definition,
        alias,
        doc,
      } => {
        self.doc(indent, doc);
        self.type_decl(indent, name, *definition, *alias);
      },
      HostKind::FunctionDecl(function) => self.function_decl(function, indent),
      HostKind::Block(statements) => {
        self.line(indent, "{");
        for statement in statements {
          self.statement(*statement, indent + 1);
        }
        self.line(indent, "}");
      },
      HostKind::If { .. } => {
        let header = self.if_header(id, indent);
        self.if_chain(id, indent, header);
      },
      HostKind::For {
        init,
        condition,
        post,
        body,
      } => {
        let header = self.in_header(|printer| match (init, condition, post) {
          (None, None, None) => "for {".to_string(),
          (None, Some(condition), None) => format!("for {} {{", printer.expression(*condition, indent)),
          _ => {
            let init = init.map(|s| printer.simple_statement(s, indent)).unwrap_or_default();
            let condition = condition.map(|c| printer.expression(c, indent)).unwrap_or_default();
            match post {
              Some(post) => format!("for {}; {}; {} {{", init, condition, printer.simple_statement(*post, indent)),
              None => format!("for {}; {}; {{", init, condition),
            }
          },
        });
        self.line(indent, &header);
        self.body(*body, indent + 1);
        self.line(indent, "}");
      },
      HostKind::Range {
        key,
        value,
        define,
        source,
        body,
      } => {
        let source = self.in_header(|printer| printer.expression(*source, indent));
        let operator = if *define { ":=" } else { "=" };
        let header = match (key, value) {
          (None, None) => format!("for range {} {{", source),
          (Some(key), None) => format!("for {} {} range {} {{", self.expression(*key, indent), operator, source),
          (key, Some(value)) => {
            let key = key.map(|k| self.expression(k, indent)).unwrap_or_else(|| "_".to_string());
            format!("for {}, {} {} range {} {{", key, self.expression(*value, indent), operator, source)
          },
        };
        self.line(indent, &header);
        self.body(*body, indent + 1);
        self.line(indent, "}");
      },
      HostKind::Switch { init, tag, clauses } => {
        let mut header = "switch ".to_string();
        self.in_header(|printer| {
          if let Some(init) = init {
            header.push_str(&printer.simple_statement(*init, indent));
            header.push_str("; ");
          }
          if let Some(tag) = tag {
            header.push_str(&printer.expression(*tag, indent));
            header.push(' ');
          }
        });
        header.push('{');
        self.line(indent, &header);
        for clause in clauses {
          match &clause.values {
            Some(values) => {
              let values: Vec<String> = values.iter().map(|v| self.expression(*v, indent)).collect();
              self.line(indent, &format!("case {}:", values.join(", ")));
            },
            None => self.line(indent, "default:"),
          }
          for statement in &clause.body {
            self.statement(*statement, indent + 1);
          }
        }
        self.line(indent, "}");
      },
      HostKind::TypeSwitch {
        init,
        binding,
        subject,
        clauses,
      } => {
        let mut header = "switch ".to_string();
        self.in_header(|printer| {
          if let Some(init) = init {
            header.push_str(&printer.simple_statement(*init, indent));
            header.push_str("; ");
          }
          if let Some(binding) = binding {
            header.push_str(binding);
            header.push_str(" := ");
          }
          header.push_str(&printer.postfix_operand(*subject, indent));
        });
        header.push_str(".(type) {");
        self.line(indent, &header);
        for clause in clauses {
          match &clause.types {
            Some(types) => {
              let types: Vec<String> = types
                .iter()
                .map(|ty| ty.map(|ty| self.ty(ty)).unwrap_or_else(|| "nil".to_string()))
                .collect();
              self.line(indent, &format!("case {}:", types.join(", ")));
            },
            None => self.line(indent, "default:"),
          }
          for statement in &clause.body {
            self.statement(*statement, indent + 1);
          }
        }
        self.line(indent, "}");
      },
      HostKind::Select(clauses) => {
        self.line(indent, "select {");
        for clause in clauses {
          match clause.comm {
            Some(comm) => {
              let comm = self.simple_statement(comm, indent);
              self.line(indent, &format!("case {}:", comm));
            },
            None => self.line(indent, "default:"),
          }
          for statement in &clause.body {
            self.statement(*statement, indent + 1);
          }
        }
        self.line(indent, "}");
      },
      HostKind::Labeled { label, body } => {
        self.line(indent.saturating_sub(1), &format!("{}:", label));
        if let Some(body) = body {
          self.statement(*body, indent);
        }
      },
      _ => {
        let text = self.simple_statement(id, indent);
        self.line(indent, &text);
      },
    }
  }

  fn if_header(
    &self,
    id: HostId,
    indent: usize,
  ) -> String {
    match &self.file.tree.get(id).kind {
      HostKind::If { init, condition, .. } => self.in_header(|printer| {
        let condition = printer.expression(*condition, indent);
        match init {
          Some(init) => format!("if {}; {} {{", printer.simple_statement(*init, indent), condition),
          None => format!("if {} {{", condition),
        }
      }),
      _ => String::new(),
    }
  }

  /// Run `print` with header parenthesization on.
  fn in_header<T>(
    &self,
    print: impl FnOnce(&Self) -> T,
  ) -> T {
    let outer = self.header.replace(true);
    let result = print(self);
    self.header.set(outer);
    result
  }

  fn if_chain(
    &mut self,
    id: HostId,
    indent: usize,
    header: String,
  ) {
    let file = self.file;
    let HostKind::If {
      then_branch,
      else_branch,
      ..
    } = &file.tree.get(id).kind
    else {
      return;
    };

    self.line(indent, &header);
    self.body(*then_branch, indent + 1);

    match else_branch {
      None => self.line(indent, "}"),
      Some(else_id) => match &file.tree.get(*else_id).kind {
        HostKind::If { .. } => {
          let header = format!("}} else {}", self.if_header(*else_id, indent));
          self.if_chain(*else_id, indent, header);
        },
        _ => {
          self.line(indent, "} else {");
          self.body(*else_id, indent + 1);
          self.line(indent, "}");
        },
      },
    }
  }

  fn type_decl(
    &mut self,
    indent: usize,
    name: &str,
    definition: TypeId,
    alias: bool,
  ) {
    let file = self.file;
    let types = &file.types;
    let prefix = if alias {
      format!("type {} = ", name)
    } else {
      format!("type {} ", name)
    };

    match types.get(&definition) {
      Type::Struct(fields) if !fields.is_empty() => {
        let fields: Vec<String> = fields
          .iter()
          .map(|field| {
            let mut text = if field.embedded {
              self.ty(field.ty)
            } else {
              format!("{} {}", field.name, self.ty(field.ty))
            };
            if let Some(tag) = &field.tag {
              text.push_str(&format!(" `{}`", tag));
            }
            text
          })
          .collect();
        self.line(indent, &format!("{}struct {{", prefix));
        for field in fields {
          self.line(indent + 1, &field);
        }
        self.line(indent, "}");
      },
      Type::Interface(methods) if !methods.is_empty() => {
        let methods: Vec<String> = methods
          .iter()
          .map(|method| {
            let mut text = method.name.clone();
            if let Some(sig) = types.signature(method.sig) {
              types.write_signature(sig, &mut text);
            }
            text
          })
          .collect();
        self.line(indent, &format!("{}interface {{", prefix));
        for method in methods {
          self.line(indent + 1, &method);
        }
        self.line(indent, "}");
      },
      _ => {
        let text = format!("{}{}", prefix, self.ty(definition));
        self.line(indent, &text);
      },
    }
  }

  fn function_decl(
    &mut self,
    function: &HostFunction,
    indent: usize,
  ) {
    self.doc(indent, &function.doc);

    let mut header = "func ".to_string();
    if let Some(receiver) = &function.receiver {
      match &receiver.name {
        Some(name) => header.push_str(&format!("({} {}) ", name, self.ty(receiver.ty))),
        None => header.push_str(&format!("({}) ", self.ty(receiver.ty))),
      }
    }
    header.push_str(&function.name);
    header.push_str(&self.signature(&function.signature));
    header.push_str(" {");

    self.line(indent, &header);
    self.body(function.body, indent + 1);
    self.line(indent, "}");
  }

  /// `(params) results`, with parameter names when present.
  fn signature(
    &self,
    signature: &HostSignature,
  ) -> String {
    let params: Vec<String> = signature
      .params
      .iter()
      .enumerate()
      .map(|(i, param)| {
        let variadic = signature.variadic && i + 1 == signature.params.len();
        let ty = match (variadic, self.file.types.get(&param.ty)) {
          (true, Type::Slice(element)) => format!("...{}", self.ty(*element)),
          _ => self.ty(param.ty),
        };
        match &param.name {
          Some(name) => format!("{} {}", name, ty),
          None => ty,
        }
      })
      .collect();

    let mut text = format!("({})", params.join(", "));
    let named = signature.results.iter().any(|r| r.name.is_some());
    match signature.results.as_slice() {
      [] => {},
      [single] if !named => {
        text.push(' ');
        text.push_str(&self.ty(single.ty));
      },
      results => {
        let results: Vec<String> = results
          .iter()
          .map(|result| match &result.name {
            Some(name) => format!("{} {}", name, self.ty(result.ty)),
            None => self.ty(result.ty),
          })
          .collect();
        text.push_str(&format!(" ({})", results.join(", ")));
      },
    }
    text
  }

  /// Statements that fit on one line: also used in `if`/`for`/`switch` headers and select cases.
  fn simple_statement(
    &self,
    id: HostId,
    indent: usize,
  ) -> String {
    match &self.file.tree.get(id).kind {
      HostKind::ExpressionStatement(expr) => self.expression(*expr, indent),
      HostKind::Assign {
        lhs,
        rhs,
        define,
        operation,
      } => {
        let operator = match (define, operation) {
          (true, _) => ":=".to_string(),
          (false, Some(operation)) => format!("{}=", operation.symbol()),
          (false, None) => "=".to_string(),
        };
        format!("{} {} {}", self.list(lhs, indent), operator, self.list(rhs, indent))
      },
      HostKind::IncDec { target, increment } => {
        format!("{}{}", self.expression(*target, indent), if *increment { "++" } else { "--" })
      },
      HostKind::Send { channel, value } => {
        format!("{} <- {}", self.expression(*channel, indent), self.expression(*value, indent))
      },
      HostKind::VarDecl { names, ty, values, .. } => self.value_spec("var", names, ty, values, indent),
      HostKind::ConstDecl { names, ty, values, .. } => self.value_spec("const", names, ty, values, indent),
      HostKind::Go(call) => format!("go {}", self.expression(*call, indent)),
      HostKind::Defer(call) => format!("defer {}", self.expression(*call, indent)),
      HostKind::Return(values) if values.is_empty() => "return".to_string(),
      HostKind::Return(values) => format!("return {}", self.list(values, indent)),
      HostKind::Branch { kind, label } => {
        let keyword = match kind {
          HostBranch::Break => "break",
          HostBranch::Continue => "continue",
          HostBranch::Goto => "goto",
          HostBranch::Fallthrough => "fallthrough",
        };
        match label {
          Some(label) => format!("{} {}", keyword, label),
          None => keyword.to_string(),
        }
      },
      _ => self.expression(id, indent),
    }
  }

  fn value_spec(
    &self,
    keyword: &str,
    names: &[String],
    ty: &Option<TypeId>,
    values: &[HostId],
    indent: usize,
  ) -> String {
    let mut text = format!("{} {}", keyword, names.join(", "));
    if let Some(ty) = ty {
      text.push(' ');
      text.push_str(&self.ty(*ty));
    }
    if !values.is_empty() {
      text.push_str(" = ");
      text.push_str(&self.list(values, indent));
    }
    text
  }

  fn list(
    &self,
    ids: &[HostId],
    indent: usize,
  ) -> String {
    ids
      .iter()
      .map(|id| self.expression(*id, indent))
      .collect::<Vec<_>>()
      .join(", ")
  }

  fn elements(
    &self,
    elements: &[HostElement],
    indent: usize,
  ) -> String {
    elements
      .iter()
      .map(|element| match element.key {
        Some(key) => format!("{}: {}", self.expression(key, indent), self.expression(element.value, indent)),
        None => self.expression(element.value, indent),
      })
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Operand of a selector, index or call: anything that is not a primary
  /// expression gets parenthesized.
  fn postfix_operand(
    &self,
    id: HostId,
    indent: usize,
  ) -> String {
    let text = self.expression(id, indent);
    match &self.file.tree.get(id).kind {
      HostKind::Binary { .. } | HostKind::Unary { .. } | HostKind::Dereference(_) => format!("({})", text),
      HostKind::TypeExpression(_) if text.starts_with('*') || text.starts_with("func") || text.starts_with("<-") => {
        format!("({})", text)
      },
      _ => text,
    }
  }

  fn operand(
    &self,
    id: HostId,
    indent: usize,
    parent: BinaryOperation,
    right: bool,
  ) -> String {
    let text = self.expression(id, indent);
    match &self.file.tree.get(id).kind {
      HostKind::Binary { operation, .. } => {
        let (child, parent) = (operation.precedence(), parent.precedence());
        if child < parent || (right && child == parent) {
          format!("({})", text)
        } else {
          text
        }
      },
      _ => text,
    }
  }

  fn expression(
    &self,
    id: HostId,
    indent: usize,
  ) -> String {
    match &self.file.tree.get(id).kind {
      HostKind::Identifier(name) => name.clone(),
      HostKind::Qualified { package, name } => format!("{}.{}", package_name(package), name),
      HostKind::Literal(text) => text.clone(),
      HostKind::Composite { ty, elements } => {
        let named = ty.is_some_and(|ty| matches!(self.file.types.get(&ty), Type::Named(_)));
        let text = format!(
          "{}{{{}}}",
          ty.map(|ty| self.ty(ty)).unwrap_or_default(),
          self.elements(elements, indent)
        );
        if named && self.header.get() {
          format!("({})", text)
        } else {
          text
        }
      },
      HostKind::FunctionLiteral { signature, body } => {
        let mut printer = HostPrinter::new(self.file);
        printer.body(*body, indent + 1);
        let mut text = format!("func{} {{\n", self.signature(signature));
        text.push_str(&printer.output);
        for _ in 0..indent {
          text.push('\t');
        }
        text.push('}');
        text
      },
      HostKind::Call { callee, args, spread } => {
        let mut text = format!("{}({})", self.postfix_operand(*callee, indent), self.list(args, indent));
        if *spread {
          text.insert_str(text.len() - 1, "...");
        }
        text
      },
      HostKind::Selector { object, name } => format!("{}.{}", self.postfix_operand(*object, indent), name),
      HostKind::Index { object, index } => {
        format!("{}[{}]", self.postfix_operand(*object, indent), self.expression(*index, indent))
      },
      HostKind::SliceExpr { object, low, high, max } => {
        let part = |id: &Option<HostId>| id.map(|id| self.expression(id, indent)).unwrap_or_default();
        let mut text = format!("{}[{}:{}", self.postfix_operand(*object, indent), part(low), part(high));
        if max.is_some() {
          text.push(':');
          text.push_str(&part(max));
        }
        text.push(']');
        text
      },
      HostKind::TypeAssert { object, ty } => {
        let ty = ty.map(|ty| self.ty(ty)).unwrap_or_else(|| "type".to_string());
        format!("{}.({})", self.postfix_operand(*object, indent), ty)
      },
      HostKind::Dereference(inner) => format!("*{}", self.postfix_operand(*inner, indent)),
      HostKind::Unary { operation, operand } => {
        format!("{}{}", operation.symbol(), self.postfix_operand(*operand, indent))
      },
      HostKind::Binary { operation, left, right } => format!(
        "{} {} {}",
        self.operand(*left, indent, *operation, false),
        operation.symbol(),
        self.operand(*right, indent, *operation, true)
      ),
      HostKind::Paren(inner) => format!("({})", self.expression(*inner, indent)),
      HostKind::TypeExpression(ty) => self.ty(*ty),
      _ => self.simple_statement(id, indent),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{operation::BinaryOperation, HostParam, LineMarker};
  use kestrel_type::types::TypeStore;

  #[test]
  fn prints_function_with_marker_and_imports() {
    let types = TypeStore::new();
    let int = types.int();
    let mut file = HostFile::new("main", types);

    let x = file.tree.ident("x");
    let one = file.tree.literal("1");
    let sum = file.tree.binary(BinaryOperation::Add, x, one);
    let two = file.tree.literal("2");
    let product = file.tree.binary(BinaryOperation::Mul, sum, two);
    let println = file.tree.qualified("fmt", "Println");
    let call = file.tree.call(println, vec![product]);
    let stmt = file.tree.expr_stmt(call);
    let body = file.tree.block(vec![stmt]);
    let function = file.tree.alloc(
      HostKind::FunctionDecl(HostFunction {
        receiver: None,
        name: "show".to_string(),
        signature: HostSignature {
          params: vec![HostParam {
            name: Some("x".to_string()),
            ty: int,
          }],
          results: vec![],
          variadic: false,
        },
        body,
        doc: None,
      }),
      None,
    );
    file.function_decls.push(function);
    file.markers.insert(
      stmt,
      LineMarker {
        path: "/foo/bar.gop".to_string(),
        line: 3,
        column: Some(1),
      },
    );

    let text = HostPrinter::new(&file).print();
    insta::assert_snapshot!(text, @r###"
    package main

    import "fmt"

    func show(x int) {
    //line /foo/bar.gop:3:1
    	fmt.Println((x + 1) * 2)
    }
    "###);
  }

  #[test]
  fn function_literal_bodies_indent() {
    let types = TypeStore::new();
    let int = types.int();
    let mut file = HostFile::new("main", types);

    let zero = file.tree.literal("0");
    let ret = file.tree.ret(vec![zero]);
    let inner = file.tree.block(vec![ret]);
    let lit = file.tree.alloc(
      HostKind::FunctionLiteral {
        signature: HostSignature {
          params: vec![],
          results: vec![HostParam {
            name: Some("_gop_ret".to_string()),
            ty: int,
          }],
          variadic: false,
        },
        body: inner,
      },
      None,
    );
    let call = file.tree.call(lit, vec![]);
    let decl = file.tree.alloc(
      HostKind::VarDecl {
        names: vec!["v".to_string()],
        ty: Some(int),
        values: vec![call],
        doc: None,
      },
      None,
    );
    file.value_decls.push(decl);

    let text = HostPrinter::new(&file).print();
    assert!(text.contains("var v int = func() (_gop_ret int) {\n\treturn 0\n}()\n"), "{}", text);
  }

  #[test]
  fn declaration_groups_are_separated() {
    let mut types = TypeStore::new();
    let int = types.int();
    let named = types.declare_named(None, "T");
    types.set_underlying(named, int);
    let mut file = HostFile::new("main", types);

    let ty = file.tree.alloc(
      HostKind::TypeDecl {
        name: "T".to_string(),
        definition: int,
        alias: false,
        doc: None,
      },
      None,
    );
    file.type_decls.push(ty);
    for name in ["a", "b"] {
      let one = file.tree.literal("1");
      let decl = file.tree.alloc(
        HostKind::VarDecl {
          names: vec![name.to_string()],
          ty: None,
          values: vec![one],
          doc: None,
        },
        None,
      );
      file.value_decls.push(decl);
    }

    let text = HostPrinter::new(&file).print();
    assert_eq!(text, "package main\n\ntype T int\n\nvar a = 1\nvar b = 1\n");
  }

  fn function(
    file: &mut HostFile,
    name: &str,
    statements: Vec<HostId>,
  ) -> HostId {
    let body = file.tree.block(statements);
    file.tree.alloc(
      HostKind::FunctionDecl(HostFunction {
        receiver: None,
        name: name.to_string(),
        signature: HostSignature::default(),
        body,
        doc: None,
      }),
      None,
    )
  }

  #[test]
  fn named_composites_in_headers_are_parenthesized() {
    let mut types = TypeStore::new();
    let fields = types.structure(Vec::new());
    let src = types.declare_named(None, "Src");
    types.set_underlying(src, fields);
    let int = types.int();
    let ints = types.slice(int);
    let mut file = HostFile::new("main", types);

    // for it := Src{}.Gop_Enum(); ; {}
    let it = file.tree.ident("it");
    let composite = file.tree.alloc(
      HostKind::Composite {
        ty: Some(src),
        elements: Vec::new(),
      },
      None,
    );
    let method = file.tree.selector(composite, "Gop_Enum");
    let call = file.tree.call(method, Vec::new());
    let init = file.tree.alloc(
      HostKind::Assign {
        lhs: vec![it],
        rhs: vec![call],
        define: true,
        operation: None,
      },
      None,
    );
    let body = file.tree.block(Vec::new());
    let pull = file.tree.alloc(
      HostKind::For {
        init: Some(init),
        condition: None,
        post: None,
        body,
      },
      None,
    );

    // if x == Src{} {}
    let x = file.tree.ident("x");
    let empty = file.tree.alloc(
      HostKind::Composite {
        ty: Some(src),
        elements: Vec::new(),
      },
      None,
    );
    let condition = file.tree.binary(BinaryOperation::Equal, x, empty);
    let then_branch = file.tree.block(Vec::new());
    let check = file.tree.alloc(
      HostKind::If {
        init: None,
        condition,
        then_branch,
        else_branch: None,
      },
      None,
    );

    // Unnamed composite types need no parentheses; neither does a named one
    // outside a header.
    let one = file.tree.literal("1");
    let list = file.tree.alloc(
      HostKind::Composite {
        ty: Some(ints),
        elements: vec![HostElement { key: None, value: one }],
      },
      None,
    );
    let v = file.tree.ident("v");
    let body = file.tree.block(Vec::new());
    let range = file.tree.alloc(
      HostKind::Range {
        key: None,
        value: Some(v),
        define: true,
        source: list,
        body,
      },
      None,
    );
    let value = file.tree.alloc(
      HostKind::Composite {
        ty: Some(src),
        elements: Vec::new(),
      },
      None,
    );
    let y = file.tree.ident("y");
    let define = file.tree.alloc(
      HostKind::Assign {
        lhs: vec![y],
        rhs: vec![value],
        define: true,
        operation: None,
      },
      None,
    );

    let main = function(&mut file, "main", vec![pull, check, range, define]);
    file.function_decls.push(main);

    let text = HostPrinter::new(&file).print();
    insta::assert_snapshot!(text, @r###"
    package main

    func main() {
    	for it := (Src{}).Gop_Enum(); ; {
    	}
    	if x == (Src{}) {
    	}
    	for _, v := range []int{1} {
    	}
    	y := Src{}
    }
    "###);
  }

  #[test]
  fn functions_are_separated_by_a_blank_line() {
    let types = TypeStore::new();
    let mut file = HostFile::new("main", types);

    let helper = function(&mut file, "helper", Vec::new());
    let callee = file.tree.ident("helper");
    let call = file.tree.call(callee, Vec::new());
    let stmt = file.tree.expr_stmt(call);
    let main = function(&mut file, "main", vec![stmt]);
    file.function_decls.push(helper);
    file.function_decls.push(main);
    file.markers.insert(
      main,
      LineMarker {
        path: "/foo/bar.gop".to_string(),
        line: 4,
        column: Some(1),
      },
    );

    let text = HostPrinter::new(&file).print();
    assert_eq!(
      text,
      "package main\n\nfunc helper() {\n}\n\n//line /foo/bar.gop:4:1\nfunc main() {\n\thelper()\n}\n"
    );
  }
}
