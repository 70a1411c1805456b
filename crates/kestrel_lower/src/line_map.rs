//! `//line` markers tying emitted statements back to the source.
//!
//! Markers are attached in rendering order and a marker equal to the one
//! printed just before it is dropped. Declarations and statements carry
//! `path:line:1`; the synthesized entry function carries `path:line`.
//! Statement headers (`if` init, `for` post, ...) are never marked.

use std::{collections::HashMap, path::Path};

use kestrel_config::LowerOptions;
use kestrel_host::{HostFile, HostId, HostKind, HostTree, LineMarker};
use kestrel_type::file::{relative_to, FileId, SourceMap};

/// Path of `file` as written into markers and error frames.
pub fn display_path(
  sources: &SourceMap,
  options: &LowerOptions,
  file: &FileId,
) -> String {
  if !sources.contains(file) {
    return String::new();
  }

  let path = &sources.get(file).path;
  let shown = match &options.relative_base_path {
    Some(base) => relative_to(path, Path::new(base)).unwrap_or_else(|| path.clone()),
    None => path.clone(),
  };
  shown.to_string_lossy().replace('\\', "/")
}

pub struct LineMapper<'a> {
  sources: &'a SourceMap,
  options: &'a LowerOptions,
  last: Option<LineMarker>,
  markers: HashMap<HostId, LineMarker>,
}

impl<'a> LineMapper<'a> {
  pub fn new(
    sources: &'a SourceMap,
    options: &'a LowerOptions,
  ) -> Self {
    Self {
      sources,
      options,
      last: None,
      markers: HashMap::new(),
    }
  }

  /// Attach markers to every declaration and statement of `file`.
  pub fn annotate(
    &mut self,
    file: &mut HostFile,
    entry: Option<HostId>,
  ) {
    let declarations: Vec<HostId> = file.declarations().collect();
    for id in declarations {
      match &file.tree.get(id).kind {
        HostKind::FunctionDecl(function) => {
          let column = if Some(id) == entry { None } else { Some(1) };
          self.mark(&file.tree, id, column);
          self.walk_block(&file.tree, function.body);
        },
        // Closures in initializers get their bodies marked too.
        _ => {
          self.mark(&file.tree, id, Some(1));
          self.walk_expressions(&file.tree, id);
        },
      }
    }

    file.markers.extend(self.markers.drain());
  }

  fn mark(
    &mut self,
    tree: &HostTree,
    id: HostId,
    column: Option<u32>,
  ) {
    let Some(origin) = &tree.get(id).origin else {
      return;
    };
    if origin.is_synthetic() || !self.sources.contains(&origin.file) {
      return;
    }

    let (line, _) = self.sources.line_col(&origin.file, origin.start);
    let marker = LineMarker {
      path: display_path(self.sources, self.options, &origin.file),
      line,
      column,
    };
    if self.last.as_ref() == Some(&marker) {
      return;
    }

    self.last = Some(marker.clone());
    self.markers.insert(id, marker);
  }

  fn walk_block(
    &mut self,
    tree: &HostTree,
    block: HostId,
  ) {
    for statement in tree.statements(block) {
      self.walk_statement(tree, statement);
    }
  }

  fn walk_statement(
    &mut self,
    tree: &HostTree,
    id: HostId,
  ) {
    self.mark(tree, id, Some(1));

    match &tree.get(id).kind {
      HostKind::Block(statements) => {
        for statement in statements {
          self.walk_statement(tree, *statement);
        }
      },
      HostKind::If { .. } => self.walk_if(tree, id),
      HostKind::For {
        init,
        condition,
        post,
        body,
      } => {
        for header in [init, condition, post].into_iter().flatten() {
          self.walk_expressions(tree, *header);
        }
        self.walk_block(tree, *body);
      },
      HostKind::Range { source, body, .. } => {
        self.walk_expressions(tree, *source);
        self.walk_block(tree, *body);
      },
      HostKind::Switch { init, tag, clauses } => {
        for header in [init, tag].into_iter().flatten() {
          self.walk_expressions(tree, *header);
        }
        for clause in clauses {
          for value in clause.values.iter().flatten() {
            self.walk_expressions(tree, *value);
          }
          for statement in &clause.body {
            self.walk_statement(tree, *statement);
          }
        }
      },
      HostKind::TypeSwitch {
        init, subject, clauses, ..
      } => {
        if let Some(init) = init {
          self.walk_expressions(tree, *init);
        }
        self.walk_expressions(tree, *subject);
        for clause in clauses {
          for statement in &clause.body {
            self.walk_statement(tree, *statement);
          }
        }
      },
      HostKind::Select(clauses) => {
        for clause in clauses {
          if let Some(comm) = clause.comm {
            self.walk_expressions(tree, comm);
          }
          for statement in &clause.body {
            self.walk_statement(tree, *statement);
          }
        }
      },
      HostKind::Labeled { body: Some(body), .. } => self.walk_statement(tree, *body),
      _ => self.walk_expressions(tree, id),
    }
  }

  /// `if` and its `else if` chain; only the first `if` is a statement.
  fn walk_if(
    &mut self,
    tree: &HostTree,
    id: HostId,
  ) {
    let HostKind::If {
      init,
      condition,
      then_branch,
      else_branch,
    } = &tree.get(id).kind
    else {
      return;
    };

    if let Some(init) = init {
      self.walk_expressions(tree, *init);
    }
    self.walk_expressions(tree, *condition);
    self.walk_block(tree, *then_branch);

    match else_branch {
      Some(branch) if matches!(tree.get(*branch).kind, HostKind::If { .. }) => self.walk_if(tree, *branch),
      Some(branch) => self.walk_block(tree, *branch),
      None => {},
    }
  }

  /// Look for function literals below a simple statement or expression.
  fn walk_expressions(
    &mut self,
    tree: &HostTree,
    id: HostId,
  ) {
    let children: Vec<HostId> = match &tree.get(id).kind {
      HostKind::FunctionLiteral { body, .. } => {
        self.walk_block(tree, *body);
        return;
      },
      HostKind::Composite { elements, .. } => elements
        .iter()
        .flat_map(|element| element.key.into_iter().chain([element.value]))
        .collect(),
      HostKind::Call { callee, args, .. } => [*callee].into_iter().chain(args.iter().copied()).collect(),
      HostKind::Selector { object, .. } | HostKind::TypeAssert { object, .. } => vec![*object],
      HostKind::Index { object, index } => vec![*object, *index],
      HostKind::SliceExpr { object, low, high, max } => {
        [Some(*object), *low, *high, *max].into_iter().flatten().collect()
      },
      HostKind::Dereference(inner)
      | HostKind::Paren(inner)
      | HostKind::ExpressionStatement(inner)
      | HostKind::Go(inner)
      | HostKind::Defer(inner) => vec![*inner],
      HostKind::Unary { operand, .. } => vec![*operand],
      HostKind::Binary { left, right, .. } => vec![*left, *right],
      HostKind::Assign { lhs, rhs, .. } => lhs.iter().chain(rhs).copied().collect(),
      HostKind::IncDec { target, .. } => vec![*target],
      HostKind::Send { channel, value } => vec![*channel, *value],
      HostKind::VarDecl { values, .. } | HostKind::ConstDecl { values, .. } | HostKind::Return(values) => {
        values.clone()
      },
      _ => Vec::new(),
    };

    for child in children {
      self.walk_expressions(tree, child);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kestrel_type::{span::Span, types::TypeStore, BytePosition};

  fn sources() -> (SourceMap, FileId) {
    let mut sources = SourceMap::new();
    let file = sources.add_file("/foo/bar.gop", "a()\nb()\nc(); d()\n".to_string());
    (sources, file)
  }

  fn statement(
    file: &mut HostFile,
    source: FileId,
    start: u32,
  ) -> HostId {
    let callee = file.tree.ident("f");
    let call = file.tree.call(callee, Vec::new());
    let origin = Span::new(source, BytePosition(start), BytePosition(start + 3));
    file.tree.alloc(HostKind::ExpressionStatement(call), Some(origin))
  }

  #[test]
  fn repeated_lines_are_marked_once() {
    let (sources, source) = sources();
    let options = LowerOptions::default();
    let mut file = HostFile::new("main", TypeStore::new());

    let statements = vec![
      statement(&mut file, source, 0),
      statement(&mut file, source, 4),
      statement(&mut file, source, 8),
      statement(&mut file, source, 13),
    ];
    let body = file.tree.block(statements.clone());
    let entry = file.tree.alloc(
      HostKind::FunctionDecl(kestrel_host::HostFunction {
        receiver: None,
        name: "main".to_string(),
        signature: Default::default(),
        body,
        doc: None,
      }),
      Some(Span::new(source, BytePosition(0), BytePosition(3))),
    );
    file.function_decls.push(entry);

    LineMapper::new(&sources, &options).annotate(&mut file, Some(entry));

    assert_eq!(file.markers[&entry].to_string(), "//line /foo/bar.gop:1");
    assert_eq!(file.markers[&statements[0]].to_string(), "//line /foo/bar.gop:1:1");
    assert_eq!(file.markers[&statements[2]].to_string(), "//line /foo/bar.gop:3:1");
    assert!(!file.markers.contains_key(&statements[3]));
  }

  #[test]
  fn paths_are_relative_to_the_base() {
    let (sources, source) = sources();
    let options = LowerOptions {
      relative_base_path: Some("/foo/root".to_string()),
      ..LowerOptions::default()
    };
    assert_eq!(display_path(&sources, &options, &source), "../bar.gop");
    assert_eq!(display_path(&sources, &LowerOptions::default(), &source), "/foo/bar.gop");
  }

  #[test]
  fn top_level_values_are_marked_before_their_closures() {
    let (sources, source) = sources();
    let options = LowerOptions::default();
    let mut file = HostFile::new("main", TypeStore::new());

    // var v = func() { f(); f() }, spread over lines 2 and 3.
    let first = statement(&mut file, source, 4);
    let second = statement(&mut file, source, 8);
    let body = file.tree.block(vec![first, second]);
    let literal = file.tree.alloc(
      HostKind::FunctionLiteral {
        signature: Default::default(),
        body,
      },
      None,
    );
    let decl = file.tree.alloc(
      HostKind::VarDecl {
        names: vec!["v".to_string()],
        ty: None,
        values: vec![literal],
        doc: None,
      },
      Some(Span::new(source, BytePosition(4), BytePosition(7))),
    );
    file.value_decls.push(decl);

    LineMapper::new(&sources, &options).annotate(&mut file, None);

    assert_eq!(file.markers[&decl].to_string(), "//line /foo/bar.gop:2:1");
    assert!(!file.markers.contains_key(&first));
    assert_eq!(file.markers[&second].to_string(), "//line /foo/bar.gop:3:1");
  }
}
