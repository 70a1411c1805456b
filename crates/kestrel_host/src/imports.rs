//! Import computation: a lowered file imports exactly the packages its tree
//! mentions, through qualified identifiers or through types.

use std::collections::BTreeSet;

use kestrel_type::types::TypeId;

use crate::{HostFile, HostId, HostKind, HostSignature};

/// Import paths referenced by `file`, sorted.
pub fn collect_imports(file: &HostFile) -> Vec<String> {
  let mut collector = ImportCollector {
    file,
    packages: BTreeSet::new(),
  };

  for id in file.declarations() {
    collector.visit(id);
  }

  collector.packages.into_iter().collect()
}

struct ImportCollector<'a> {
  file: &'a HostFile,
  packages: BTreeSet<String>,
}

impl<'a> ImportCollector<'a> {
  fn ty(
    &mut self,
    ty: TypeId,
  ) {
    self.file.types.collect_packages(ty, &mut self.packages);
  }

  fn signature(
    &mut self,
    signature: &HostSignature,
  ) {
    for param in signature.params.iter().chain(signature.results.iter()) {
      self.ty(param.ty);
    }
  }

  fn all(
    &mut self,
    ids: &[HostId],
  ) {
    for id in ids {
      self.visit(*id);
    }
  }

  fn opt(
    &mut self,
    id: &Option<HostId>,
  ) {
    if let Some(id) = id {
      self.visit(*id);
    }
  }

  fn visit(
    &mut self,
    id: HostId,
  ) {
    let file = self.file;
    match &file.tree.get(id).kind {
      HostKind::Identifier(_) | HostKind::Literal(_) | HostKind::Branch { .. } => {},
      HostKind::Qualified { package, .. } => {
        self.packages.insert(package.clone());
      },
      HostKind::Composite { ty, elements } => {
        if let Some(ty) = ty {
          self.ty(*ty);
        }
        for element in elements {
          self.opt(&element.key);
          self.visit(element.value);
        }
      },
      HostKind::FunctionLiteral { signature, body } => {
        self.signature(signature);
        self.visit(*body);
      },
      HostKind::Call { callee, args, .. } => {
        self.visit(*callee);
        self.all(args);
      },
      HostKind::Selector { object, .. } => self.visit(*object),
      HostKind::Index { object, index } => {
        self.visit(*object);
        self.visit(*index);
      },
      HostKind::SliceExpr { object, low, high, max } => {
        self.visit(*object);
        self.opt(low);
        self.opt(high);
        self.opt(max);
      },
      HostKind::TypeAssert { object, ty } => {
        self.visit(*object);
        if let Some(ty) = ty {
          self.ty(*ty);
        }
      },
      HostKind::Dereference(inner)
      | HostKind::Paren(inner)
      | HostKind::ExpressionStatement(inner)
      | HostKind::Go(inner)
      | HostKind::Defer(inner) => self.visit(*inner),
      HostKind::Unary { operand, .. } => self.visit(*operand),
      HostKind::Binary { left, right, .. } => {
        self.visit(*left);
        self.visit(*right);
      },
      HostKind::TypeExpression(ty) => self.ty(*ty),
      HostKind::Assign { lhs, rhs, .. } => {
        self.all(lhs);
        self.all(rhs);
      },
      HostKind::IncDec { target, .. } => self.visit(*target),
      HostKind::Send { channel, value } => {
        self.visit(*channel);
        self.visit(*value);
      },
      HostKind::VarDecl { ty, values, .. } | HostKind::ConstDecl { ty, values, .. } => {
        if let Some(ty) = ty {
          self.ty(*ty);
        }
        self.all(values);
      },
      HostKind::TypeDecl { definition, .. } => self.ty(*definition),
      HostKind::Block(statements) | HostKind::Return(statements) => self.all(statements),
      HostKind::If {
        init,
        condition,
        then_branch,
        else_branch,
      } => {
        self.opt(init);
        self.visit(*condition);
        self.visit(*then_branch);
        self.opt(else_branch);
      },
      HostKind::For {
        init,
        condition,
        post,
        body,
      } => {
        self.opt(init);
        self.opt(condition);
        self.opt(post);
        self.visit(*body);
      },
      HostKind::Range {
        key,
        value,
        source,
        body,
        ..
      } => {
        self.opt(key);
        self.opt(value);
        self.visit(*source);
        self.visit(*body);
      },
      HostKind::Switch { init, tag, clauses } => {
        self.opt(init);
        self.opt(tag);
        for clause in clauses {
          if let Some(values) = &clause.values {
            self.all(values);
          }
          self.all(&clause.body);
        }
      },
      HostKind::TypeSwitch {
        init, subject, clauses, ..
      } => {
        self.opt(init);
        self.visit(*subject);
        for clause in clauses {
          for ty in clause.types.iter().flatten().flatten() {
            self.ty(*ty);
          }
          self.all(&clause.body);
        }
      },
      HostKind::Select(clauses) => {
        for clause in clauses {
          self.opt(&clause.comm);
          self.all(&clause.body);
        }
      },
      HostKind::Labeled { body, .. } => self.opt(body),
      HostKind::FunctionDecl(function) => {
        if let Some(receiver) = &function.receiver {
          self.ty(receiver.ty);
        }
        self.signature(&function.signature);
        self.visit(function.body);
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{HostFunction, HostParam};
  use kestrel_type::types::TypeStore;

  #[test]
  fn imports_come_from_calls_and_types() {
    let mut types = TypeStore::new();
    let big = types.declare_named(Some("math/big"), "Int");
    let big_ptr = types.pointer(big);
    let mut file = HostFile::new("main", types);

    let println = file.tree.qualified("fmt", "Println");
    let call = file.tree.call(println, vec![]);
    let stmt = file.tree.expr_stmt(call);
    let body = file.tree.block(vec![stmt]);
    let function = file.tree.alloc(
      HostKind::FunctionDecl(HostFunction {
        receiver: None,
        name: "main".to_string(),
        signature: HostSignature {
          params: vec![HostParam {
            name: Some("n".to_string()),
            ty: big_ptr,
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

    assert_eq!(file.imports(), vec!["fmt".to_string(), "math/big".to_string()]);
  }
}
