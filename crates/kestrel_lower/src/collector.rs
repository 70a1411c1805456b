//! Top-level collection and the lowering phases of a unit.
//!
//! Declarations are classified and given an output slot first; types,
//! function signatures, package values and bodies are then lowered in that
//! order so that top-level declarations may refer to each other freely.
//! Package values are also lowered on demand when something earlier needs
//! them.

use std::collections::HashMap;

use kestrel_ast::{
  statements::{ASTFunction, ASTStatement},
  NodeId,
};
use kestrel_config::{DebugTrace, EntryRole};
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{HostFunction, HostId, HostKind, HostReceiver, HostSignature};
use kestrel_log::{log_dbg, trace_dbg};
use kestrel_type::{
  oracle::MethodInfo,
  span::Span,
  types::{package_name, TypeId},
};

use crate::{
  builder::{DeclKind, DeclRecord},
  naming::BLANK,
  scope::{ScopeKind, Symbol},
  LowerResult, Lowerer,
};

/// A top-level name of the unit.
#[derive(Debug, Clone)]
pub(crate) enum Global {
  /// `ty` is the named type; aliases stay `None` until first resolved.
  Type { root: NodeId, ty: Option<TypeId> },
  Func { root: NodeId, ty: Option<TypeId> },
  Value { root: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueState {
  InProgress,
  Done,
  /// Already reported.
  Failed,
}

/// Signature of a declared function, kept between phases.
struct Lowered {
  receiver: Option<HostReceiver>,
  signature: HostSignature,
  frame_name: String,
}

impl<'a> Lowerer<'a> {
  pub(crate) fn run(&mut self) {
    let roots = self.unit.roots.clone();

    self.collect_phase(&roots);
    if !self.halted {
      self.types_phase(&roots);
    }
    let mut signatures = HashMap::new();
    if !self.halted {
      self.signatures_phase(&roots, &mut signatures);
    }
    if !self.halted {
      self.values_phase(&roots);
    }
    if !self.halted {
      self.bodies_phase(&roots, &signatures);
    }
    if !self.halted {
      self.entry_phase();
    }

    log_dbg!(
      self.config,
      "{}: {} root(s), {} error(s)",
      self.unit.package,
      roots.len(),
      self.diagnostics.len()
    );
  }

  // #region Collect
  fn collect_phase(
    &mut self,
    roots: &[NodeId],
  ) {
    let role = self.config.lower.entry_role;
    let mut explicit_entry: Option<Span> = None;
    let mut first_statement: Option<Span> = None;

    for root in roots {
      if self.halted {
        return;
      }
      let span = self.span(root);
      let Some(statement) = self.unit.statement(root).cloned() else {
        first_statement.get_or_insert(span);
        self.builder.push_entry_statement(*root);
        continue;
      };

      match statement {
        ASTStatement::Import { path, alias } => {
          let local = alias.unwrap_or_else(|| package_name(&path).to_string());
          if local != BLANK && local != "." {
            self.imports.insert(local, path);
          }
        },
        ASTStatement::TypeDecl { name, alias, .. } => {
          if self.declare(DeclRecord::new(&name, DeclKind::Type, span)) {
            self.builder.reserve(DeclKind::Type, *root);
            let ty = if alias { None } else { Some(self.types.declare_named(None, &name)) };
            self.globals.insert(name, Global::Type { root: *root, ty });
          }
        },
        ASTStatement::Variable(spec) | ASTStatement::Constant(spec) => {
          let kind = if matches!(self.unit.statement(root), Some(ASTStatement::Constant(_))) {
            DeclKind::Const
          } else {
            DeclKind::Var
          };
          self.builder.reserve(kind, *root);
          for name in &spec.names {
            if self.declare(DeclRecord::new(name, kind, span.clone())) && name != BLANK {
              self.globals.insert(name.clone(), Global::Value { root: *root });
            }
          }
        },
        ASTStatement::Function(function) => {
          if function.receiver.is_none() && function.name == role.function_name() {
            if let Some(previous) = &explicit_entry {
              if role == EntryRole::Executable {
                self.record_failure(DiagnosticMessage::DuplicateEntry {
                  name: function.name.clone(),
                  span: span.clone(),
                  previous_span: previous.clone(),
                });
                continue;
              }
            }
            explicit_entry.get_or_insert(span.clone());
          }
          self.collect_function(root, &function, span);
        },
        _ => {
          first_statement.get_or_insert(span);
          self.builder.push_entry_statement(*root);
        },
      }
    }

    self.explicit_entry = explicit_entry.is_some();
    if let (Some(entry_span), Some(span)) = (explicit_entry, first_statement) {
      self.record_failure(DiagnosticMessage::StatementsWithExplicitEntry {
        name: role.function_name().to_string(),
        span,
        entry_span,
      });
    }

    trace_dbg!(
      self.config,
      DebugTrace::Collector,
      "{} global(s), {} import(s), {} entry statement(s)",
      self.globals.len(),
      self.imports.len(),
      self.builder.entry_statements().len()
    );
  }

  fn collect_function(
    &mut self,
    root: &NodeId,
    function: &ASTFunction,
    span: Span,
  ) {
    match &function.receiver {
      Some(receiver) => {
        let owner = self.source_text(&receiver.ty);
        if self.declare(DeclRecord::method(&owner, &function.name, span)) {
          self.builder.reserve(DeclKind::Method, *root);
        }
      },
      None => {
        if self.declare(DeclRecord::new(&function.name, DeclKind::Func, span)) {
          self.builder.reserve(DeclKind::Func, *root);
          if function.name != BLANK && function.name != "init" {
            self
              .globals
              .insert(function.name.clone(), Global::Func { root: *root, ty: None });
          }
        }
      },
    }
  }

  /// Record a declaration; a conflict is reported and `false` returned.
  fn declare(
    &mut self,
    record: DeclRecord,
  ) -> bool {
    let name = record.name.clone();
    let span = record.span.clone();
    match self.builder.declare(record) {
      Ok(()) => true,
      Err(previous) => {
        self.record_failure(DiagnosticMessage::Redeclared {
          name,
          span,
          previous_span: previous.span,
        });
        false
      },
    }
  }
  // #endregion Collect

  // #region Types
  fn types_phase(
    &mut self,
    roots: &[NodeId],
  ) {
    for root in roots {
      if self.halted {
        return;
      }
      let Some(ASTStatement::TypeDecl { name, ty, alias, doc }) = self.unit.statement(root).cloned() else {
        continue;
      };
      if !matches!(self.globals.get(&name), Some(Global::Type { root: owner, .. }) if owner == root) {
        continue;
      }

      let span = self.span(root);
      let lowered = self.lower_type_decl(&name, &ty, alias, &span);
      match lowered {
        Ok(definition) => {
          let decl = self.alloc(
            HostKind::TypeDecl {
              name,
              definition,
              alias,
              doc,
            },
            &span,
          );
          self.builder.fill(DeclKind::Type, *root, decl);
        },
        Err(message) => self.record_failure(message),
      }
    }
  }

  fn lower_type_decl(
    &mut self,
    name: &str,
    ty: &NodeId,
    alias: bool,
    span: &Span,
  ) -> LowerResult<TypeId> {
    if alias {
      return self.resolve_type_name(name, span);
    }

    let definition = self.resolve_type(ty)?;
    if let Some(Global::Type { ty: Some(named), .. }) = self.globals.get(name).cloned() {
      self.types.set_underlying(named, definition);
    }
    trace_dbg!(self.config, DebugTrace::Collector, "type {} = {}", name, self.type_name(definition));
    Ok(definition)
  }
  // #endregion Types

  // #region Signatures
  fn signatures_phase(
    &mut self,
    roots: &[NodeId],
    signatures: &mut HashMap<NodeId, Lowered>,
  ) {
    for root in roots {
      if self.halted {
        return;
      }
      let Some(ASTStatement::Function(function)) = self.unit.statement(root).cloned() else {
        continue;
      };

      match self.lower_signature(root, &function) {
        Ok(lowered) => {
          signatures.insert(*root, lowered);
        },
        Err(message) => self.record_failure(message),
      }
    }
  }

  fn lower_signature(
    &mut self,
    root: &NodeId,
    function: &ASTFunction,
  ) -> LowerResult<Lowered> {
    let (signature, ty) = self.resolve_signature(&function.signature)?;
    let package = self.unit.package.clone();

    let Some(receiver) = &function.receiver else {
      if let Some(Global::Func { root: owner, ty: slot }) = self.globals.get_mut(&function.name) {
        if owner == root {
          *slot = Some(ty);
        }
      }
      return Ok(Lowered {
        receiver: None,
        signature,
        frame_name: format!("{}.{}", package, function.name),
      });
    };

    let base = self.resolve_type(&receiver.ty)?;
    let owner = self.source_text(&receiver.ty);
    self.methods.entry(base).or_default().push(MethodInfo {
      name: function.name.clone(),
      sig: ty,
      pointer_receiver: receiver.pointer,
    });

    let (receiver_ty, frame_name) = if receiver.pointer {
      (self.types.pointer(base), format!("{}.(*{}).{}", package, owner, function.name))
    } else {
      (base, format!("{}.{}.{}", package, owner, function.name))
    };

    Ok(Lowered {
      receiver: Some(HostReceiver {
        name: receiver.name.clone(),
        ty: receiver_ty,
      }),
      signature,
      frame_name,
    })
  }
  // #endregion Signatures

  // #region Values
  fn values_phase(
    &mut self,
    roots: &[NodeId],
  ) {
    for root in roots {
      if self.halted {
        return;
      }
      let Some(ASTStatement::Variable(spec) | ASTStatement::Constant(spec)) = self.unit.statement(root) else {
        continue;
      };
      let Some(name) = spec.names.first().cloned() else {
        continue;
      };

      let span = self.span(root);
      if let Err(message) = self.ensure_value(*root, &name, &span) {
        self.record_failure(message);
      }
    }
  }

  /// Lower the package-level value declaration at `root` unless already done.
  ///
  /// `name` and `span` describe the reference that needs it; a reference
  /// reached while the declaration is still being lowered is a cycle.
  pub(crate) fn ensure_value(
    &mut self,
    root: NodeId,
    name: &str,
    span: &Span,
  ) -> LowerResult<()> {
    match self.value_states.get(&root) {
      Some(ValueState::Done | ValueState::Failed) => return Ok(()),
      Some(ValueState::InProgress) => {
        return Err(DiagnosticMessage::InitializationCycle {
          name: name.to_string(),
          span: span.clone(),
        });
      },
      None => {},
    }

    self.value_states.insert(root, ValueState::InProgress);
    let lowered = self.at_package_level(|lowerer| lowerer.lower_global_value(root));
    match lowered {
      Ok(()) => {
        self.value_states.insert(root, ValueState::Done);
      },
      Err(message) => {
        self.value_states.insert(root, ValueState::Failed);
        self.record_failure(message);
      },
    }
    Ok(())
  }

  fn lower_global_value(
    &mut self,
    root: NodeId,
  ) -> LowerResult<()> {
    let (spec, kind) = match self.unit.statement(&root).cloned() {
      Some(ASTStatement::Variable(spec)) => (spec, DeclKind::Var),
      Some(ASTStatement::Constant(spec)) => (spec, DeclKind::Const),
      _ => return Ok(()),
    };

    let span = self.span(&root);
    let (decl, symbols) = self.lower_value_spec(&spec, kind == DeclKind::Const, &span)?;
    for (name, symbol) in symbols {
      if name != BLANK {
        let _ = self.scopes.define(&name, symbol);
      }
    }
    if let Some(decl) = decl {
      self.builder.fill(kind, root, decl);
    }
    Ok(())
  }

  /// Run `lower` in the package scope, outside of any function.
  fn at_package_level<T>(
    &mut self,
    lower: impl FnOnce(&mut Self) -> LowerResult<T>,
  ) -> LowerResult<T> {
    let scope = self.scopes.current();
    self.scopes.set_current(self.scopes.package());
    let func = self.func.take();
    let hoisted = std::mem::take(&mut self.hoisted);
    let frame_name = std::mem::replace(&mut self.frame_name, format!("{}.main", self.unit.package));

    let lowered = lower(self);

    self.frame_name = frame_name;
    self.hoisted = hoisted;
    self.func = func;
    self.scopes.set_current(scope);
    lowered
  }
  // #endregion Values

  // #region Bodies
  fn bodies_phase(
    &mut self,
    roots: &[NodeId],
    signatures: &HashMap<NodeId, Lowered>,
  ) {
    for root in roots {
      if self.halted {
        return;
      }
      let Some(ASTStatement::Function(function)) = self.unit.statement(root).cloned() else {
        continue;
      };
      let Some(lowered) = signatures.get(root) else {
        continue;
      };

      let span = self.span(root);
      match self.lower_function_body(&function, lowered, &span) {
        Ok(body) => {
          let decl = self.alloc(
            HostKind::FunctionDecl(HostFunction {
              receiver: lowered.receiver.clone(),
              name: function.name.clone(),
              signature: lowered.signature.clone(),
              body,
              doc: function.doc.clone(),
            }),
            &span,
          );
          let kind = if function.receiver.is_some() { DeclKind::Method } else { DeclKind::Func };
          self.builder.fill(kind, *root, decl);
        },
        Err(message) => self.record_failure(message),
      }
    }
  }

  fn lower_function_body(
    &mut self,
    function: &ASTFunction,
    lowered: &Lowered,
    span: &Span,
  ) -> LowerResult<HostId> {
    let Some(body) = function.body else {
      return Err(DiagnosticMessage::UnsupportedConstruct {
        what: format!("func {} without a body", function.name),
        span: span.clone(),
      });
    };

    trace_dbg!(self.config, DebugTrace::Collector, "body of {}", lowered.frame_name);
    let frame_name = std::mem::replace(&mut self.frame_name, lowered.frame_name.clone());
    let results = lowered.signature.results.iter().map(|result| result.ty).collect();
    let receiver = lowered.receiver.clone();
    let signature = &lowered.signature;

    let body = self.in_function_scope(ScopeKind::Function, results, |lowerer| {
      if let Some(HostReceiver { name: Some(name), ty }) = &receiver {
        let _ = lowerer.scopes.define(name, Symbol::variable(*ty));
      }
      lowerer.define_params(&signature.params);
      lowerer.define_params(&signature.results);
      lowerer.lower_block(&body, ScopeKind::Block)
    });
    self.frame_name = frame_name;
    body
  }
  // #endregion Bodies

  // #region Entry
  /// Gather the bare top-level statements into the entry function.
  fn entry_phase(&mut self) {
    let statements = self.builder.entry_statements().to_vec();
    let role = self.config.lower.entry_role;
    let wanted = !statements.is_empty()
      || (role == EntryRole::Executable && !self.config.lower.suppress_auto_entry);
    if self.explicit_entry || !wanted {
      return;
    }

    let name = role.function_name();
    let origin = match statements.first() {
      Some(first) => self.span(first),
      None => Span::synthetic(),
    };

    let frame_name = std::mem::replace(&mut self.frame_name, format!("{}.{}", self.unit.package, name));
    let body = self.in_function_scope(ScopeKind::Function, Vec::new(), |lowerer| {
      lowerer.lower_statements(&statements)
    });
    self.frame_name = frame_name;

    let body = match body {
      Ok(body) => self.scaffold(HostKind::Block(body)),
      Err(message) => {
        self.record_failure(message);
        return;
      },
    };

    let entry = self.alloc(
      HostKind::FunctionDecl(HostFunction {
        receiver: None,
        name: name.to_string(),
        signature: HostSignature::default(),
        body,
        doc: None,
      }),
      &origin,
    );

    let mut record = DeclRecord::new(name, DeclKind::Entry, origin);
    record.synthesized = true;
    self.builder.set_entry(record, entry);
    trace_dbg!(self.config, DebugTrace::Collector, "synthesized func {} with {} statement(s)", name, statements.len());
  }
  // #endregion Entry
}
