use kestrel_ast::{expressions::ASTExpression, type_::ASTType, NodeId};
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostParam, HostSignature};
use kestrel_log::trace_dbg;
use kestrel_config::DebugTrace;
use kestrel_type::{
  oracle::Resolution,
  span::Span,
  types::{Field, InterfaceMethod, Type, TypeId},
  value::ConstValue,
};
use num_traits::{Signed, ToPrimitive};

use crate::{collector::Global, scope::SymbolKind, InferContext, LowerResult, Lowerer, OperandMode};

impl<'a> Lowerer<'a> {
  /// Resolve a type written in the source.
  ///
  /// Accepts type nodes and the expression forms a type can take in
  /// expression position (`T`, `pkg.T`, `*T`, `(T)`).
  pub(crate) fn resolve_type(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<TypeId> {
    let span = self.span(id);
    let Some(ty) = self.unit.type_expr(id).cloned() else {
      return self.resolve_type_expression(id);
    };

    match ty {
      ASTType::Named { package: None, name } => self.resolve_type_name(&name, &span),
      ASTType::Named {
        package: Some(package),
        name,
      } => {
        let path = self.package_path(&package, &span)?;
        self.resolve_member_type(&path, &name, &span)
      },
      ASTType::Pointer(inner) => {
        let inner = self.resolve_type(&inner)?;
        Ok(self.types.pointer(inner))
      },
      ASTType::Slice(element) => {
        let element = self.resolve_type(&element)?;
        Ok(self.types.slice(element))
      },
      ASTType::Array { len: Some(len), element } => {
        let len = self.array_length(&len)?;
        let element = self.resolve_type(&element)?;
        Ok(self.types.array(element, len))
      },
      ASTType::Array { len: None, .. } => Err(DiagnosticMessage::UnsupportedConstruct {
        what: "[...] array type outside a composite literal".to_string(),
        span,
      }),
      ASTType::Map { key, value } => {
        let key = self.resolve_type(&key)?;
        let value = self.resolve_type(&value)?;
        Ok(self.types.map(key, value))
      },
      ASTType::Chan { dir, element } => {
        let element = self.resolve_type(&element)?;
        Ok(self.types.chan(element, dir))
      },
      ASTType::Function { .. } => Ok(self.resolve_signature(id)?.1),
      ASTType::Struct(fields) => {
        let mut resolved = Vec::with_capacity(fields.len());
        for field in fields {
          let ty = self.resolve_type(&field.ty)?;
          let (name, embedded) = match field.name {
            Some(name) => (name, false),
            None => (self.embedded_name(ty), true),
          };
          resolved.push(Field {
            name,
            ty,
            embedded,
            tag: field.tag,
          });
        }
        Ok(self.types.structure(resolved))
      },
      ASTType::Interface(methods) => {
        let mut resolved = Vec::with_capacity(methods.len());
        for method in methods {
          let (_, sig) = self.resolve_signature(&method.signature)?;
          resolved.push(InterfaceMethod { name: method.name, sig });
        }
        Ok(self.types.interface(resolved))
      },
    }
  }

  /// A `Function` type node as a host signature (names kept) and a type.
  pub(crate) fn resolve_signature(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<(HostSignature, TypeId)> {
    let Some(ASTType::Function {
      params,
      results,
      variadic,
    }) = self.unit.type_expr(id).cloned()
    else {
      return Err(DiagnosticMessage::NotAType {
        name: self.source_text(id),
        span: self.span(id),
      });
    };

    let mut signature = HostSignature {
      variadic,
      ..HostSignature::default()
    };

    let count = params.len();
    for (i, param) in params.into_iter().enumerate() {
      let mut ty = self.resolve_type(&param.ty)?;
      if variadic && i + 1 == count {
        ty = self.types.slice(ty);
      }
      signature.params.push(HostParam { name: param.name, ty });
    }

    for result in results {
      let ty = self.resolve_type(&result.ty)?;
      signature.results.push(HostParam { name: result.name, ty });
    }

    let ty = self.signature_type(&signature);
    Ok((signature, ty))
  }

  pub(crate) fn signature_type(
    &mut self,
    signature: &HostSignature,
  ) -> TypeId {
    let params = signature.params.iter().map(|p| p.ty).collect();
    let results = signature.results.iter().map(|r| r.ty).collect();
    self.types.func(params, results, signature.variadic)
  }

  pub(crate) fn resolve_type_name(
    &mut self,
    name: &str,
    span: &Span,
  ) -> LowerResult<TypeId> {
    if let Some(symbol) = self.scopes.lookup(name) {
      return match symbol.kind {
        SymbolKind::Type => Ok(symbol.ty),
        _ => Err(DiagnosticMessage::NotAType {
          name: name.to_string(),
          span: span.clone(),
        }),
      };
    }

    match self.globals.get(name).cloned() {
      Some(Global::Type { ty: Some(ty), .. }) => return Ok(ty),
      Some(Global::Type { root, ty: None }) => return self.resolve_alias(name, root, span),
      Some(_) => {
        return Err(DiagnosticMessage::NotAType {
          name: name.to_string(),
          span: span.clone(),
        });
      },
      None => {},
    }

    match self.oracle.resolve(name) {
      Some(Resolution::Type(ty)) => Ok(ty),
      Some(_) => Err(DiagnosticMessage::NotAType {
        name: name.to_string(),
        span: span.clone(),
      }),
      None => Err(DiagnosticMessage::UndeclaredName {
        name: name.to_string(),
        span: span.clone(),
      }),
    }
  }

  fn resolve_member_type(
    &mut self,
    path: &str,
    name: &str,
    span: &Span,
  ) -> LowerResult<TypeId> {
    trace_dbg!(self.config, DebugTrace::Oracle, "type {}.{}", path, name);
    match self.oracle.resolve_member(path, name) {
      Some(Resolution::Type(ty)) => Ok(ty),
      Some(_) => Err(DiagnosticMessage::NotAType {
        name: format!("{}.{}", kestrel_type::types::package_name(path), name),
        span: span.clone(),
      }),
      None => Err(DiagnosticMessage::UnknownMember {
        owner: kestrel_type::types::package_name(path).to_string(),
        name: name.to_string(),
        span: span.clone(),
      }),
    }
  }

  /// Resolve an alias declaration on first use; cycles are reported at the use.
  fn resolve_alias(
    &mut self,
    name: &str,
    root: NodeId,
    span: &Span,
  ) -> LowerResult<TypeId> {
    if !self.resolving_aliases.insert(name.to_string()) {
      return Err(DiagnosticMessage::InitializationCycle {
        name: name.to_string(),
        span: span.clone(),
      });
    }

    let target = match self.unit.statement(&root) {
      Some(kestrel_ast::statements::ASTStatement::TypeDecl { ty, .. }) => *ty,
      _ => {
        self.resolving_aliases.remove(name);
        return Err(DiagnosticMessage::NotAType {
          name: name.to_string(),
          span: span.clone(),
        });
      },
    };

    let resolved = self.resolve_type(&target);
    self.resolving_aliases.remove(name);
    let resolved = resolved?;

    if let Some(Global::Type { ty, .. }) = self.globals.get_mut(name) {
      *ty = Some(resolved);
    }
    Ok(resolved)
  }

  /// Types spelled with expression nodes: `T`, `pkg.T`, `*T`, `(T)`.
  fn resolve_type_expression(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<TypeId> {
    let span = self.span(id);
    match self.unit.expression(id).cloned() {
      Some(ASTExpression::Identifier(name)) => self.resolve_type_name(&name, &span),
      Some(ASTExpression::MemberAccess { object, member }) => {
        let Some(package) = self.unit.identifier(&object).map(str::to_string) else {
          return Err(DiagnosticMessage::NotAType {
            name: self.source_text(id),
            span,
          });
        };
        let path = self.package_path(&package, &span)?;
        self.resolve_member_type(&path, &member, &span)
      },
      Some(ASTExpression::Dereference(inner)) => {
        let inner = self.resolve_type(&inner)?;
        Ok(self.types.pointer(inner))
      },
      Some(ASTExpression::Grouping(inner)) => self.resolve_type(&inner),
      _ => Err(DiagnosticMessage::NotAType {
        name: self.source_text(id),
        span,
      }),
    }
  }

  /// Import path of a package referred to by its local name.
  pub(crate) fn package_path(
    &self,
    name: &str,
    span: &Span,
  ) -> LowerResult<String> {
    if let Some(path) = self.imports.get(name) {
      return Ok(path.clone());
    }

    match self.oracle.resolve(name) {
      Some(Resolution::Package(path)) => Ok(path),
      _ => Err(DiagnosticMessage::UndeclaredName {
        name: name.to_string(),
        span: span.clone(),
      }),
    }
  }

  fn array_length(
    &mut self,
    id: &NodeId,
  ) -> LowerResult<u64> {
    let operand = self.lower_expr(id, InferContext::none())?;
    match (&operand.mode, &operand.constant) {
      (OperandMode::Value, Some(ConstValue::Int(n))) if !n.is_negative() => {
        n.to_u64().ok_or_else(|| DiagnosticMessage::ConstantOverflow {
          text: n.to_string(),
          span: operand.span.clone(),
        })
      },
      _ => Err(DiagnosticMessage::TypeMismatch {
        expected: "constant array length".to_string(),
        got: self.source_text(id),
        span: operand.span,
      }),
    }
  }

  /// Field name an embedded type is reached by.
  fn embedded_name(
    &self,
    ty: TypeId,
  ) -> String {
    match self.types.get(&ty) {
      Type::Named(named) => named.name.clone(),
      Type::Pointer(inner) => self.embedded_name(*inner),
      _ => self.types.format(ty),
    }
  }
}
