use std::collections::HashMap;

use kestrel_type::{types::TypeId, value::ConstValue, Id, Store};

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
  Package,
  Function,
  Block,
  /// A `for` loop header and body.
  Loop,
  /// A `range` or for-phrase header and body.
  Range,
  SwitchCase,
  SelectCase,
  TypeSwitchCase,
  Closure,
  /// Body of a callback-style iteration: loop control does not reach the loop.
  Callback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
  Variable,
  Constant,
  Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
  pub kind: SymbolKind,
  pub ty: TypeId,
  pub constant: Option<ConstValue>,
}

impl Symbol {
  pub fn variable(ty: TypeId) -> Self {
    Self {
      kind: SymbolKind::Variable,
      ty,
      constant: None,
    }
  }

  pub fn constant(
    ty: TypeId,
    value: Option<ConstValue>,
  ) -> Self {
    Self {
      kind: SymbolKind::Constant,
      ty,
      constant: value,
    }
  }

  pub fn type_name(ty: TypeId) -> Self {
    Self {
      kind: SymbolKind::Type,
      ty,
      constant: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Scope {
  pub parent: Option<ScopeId>,
  pub kind: ScopeKind,
  pub symbols: HashMap<String, Symbol>,
}

/// Where a `break` or `continue` lands, seen from the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget {
  Statement,
  /// The innermost enclosing body is a callback-style iteration.
  Callback,
  None,
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
  scopes: Store<Scope>,
  current: ScopeId,
  package: ScopeId,
}

impl Default for ScopeTree {
  fn default() -> Self {
    Self::new()
  }
}

impl ScopeTree {
  pub fn new() -> Self {
    let mut scopes = Store::new();
    let package = scopes.alloc(Scope {
      parent: None,
      kind: ScopeKind::Package,
      symbols: HashMap::new(),
    });

    Self {
      scopes,
      current: package,
      package,
    }
  }

  pub fn push(
    &mut self,
    kind: ScopeKind,
  ) -> ScopeId {
    let new = self.scopes.alloc(Scope {
      parent: Some(self.current),
      kind,
      symbols: HashMap::new(),
    });

    self.current = new;

    new
  }

  pub fn pop(&mut self) {
    if let Some(parent) = self.scopes.get(&self.current).parent {
      self.current = parent;
    }
  }

  /// Bind `name` in the current scope; the existing symbol comes back when
  /// the name is already taken there. `_` never binds.
  pub fn define(
    &mut self,
    name: &str,
    symbol: Symbol,
  ) -> Result<(), Symbol> {
    if name == "_" {
      return Ok(());
    }

    let scope = self.scopes.get_mut(self.current);
    match scope.symbols.get(name) {
      Some(existing) => Err(existing.clone()),
      None => {
        scope.symbols.insert(name.to_string(), symbol);
        Ok(())
      },
    }
  }

  pub fn lookup(
    &self,
    name: &str,
  ) -> Option<&Symbol> {
    let mut current = &self.current;
    loop {
      let scope = self.scopes.get(current);
      if let Some(symbol) = scope.symbols.get(name) {
        return Some(symbol);
      }
      match &scope.parent {
        Some(parent) => current = parent,
        None => return None,
      }
    }
  }

  pub fn is_local(
    &self,
    name: &str,
  ) -> bool {
    self.scopes.get(&self.current).symbols.contains_key(name)
  }

  /// Resolve the target of `break` (`is_continue == false`) or `continue`.
  pub fn branch_target(
    &self,
    is_continue: bool,
  ) -> BranchTarget {
    let mut current = &self.current;
    loop {
      let scope = self.scopes.get(current);

      match scope.kind {
        ScopeKind::Loop | ScopeKind::Range => return BranchTarget::Statement,
        ScopeKind::SwitchCase | ScopeKind::SelectCase | ScopeKind::TypeSwitchCase if !is_continue => {
          return BranchTarget::Statement;
        },
        ScopeKind::Callback => return BranchTarget::Callback,
        ScopeKind::Function | ScopeKind::Closure | ScopeKind::Package => return BranchTarget::None,
        _ => {},
      }

      match &scope.parent {
        Some(parent) => current = parent,
        None => return BranchTarget::None,
      }
    }
  }

  pub fn current(&self) -> ScopeId {
    self.current
  }

  pub fn set_current(
    &mut self,
    scope: ScopeId,
  ) {
    self.current = scope;
  }

  pub fn package(&self) -> ScopeId {
    self.package
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kestrel_type::types::TypeStore;

  #[test]
  fn inner_scopes_shadow_outer() {
    let types = TypeStore::new();
    let mut scopes = ScopeTree::new();
    scopes.push(ScopeKind::Function);
    scopes.define("x", Symbol::variable(types.int())).unwrap();
    scopes.push(ScopeKind::Block);
    scopes.define("x", Symbol::variable(types.string())).unwrap();

    assert_eq!(scopes.lookup("x").map(|s| s.ty), Some(types.string()));
    scopes.pop();
    assert_eq!(scopes.lookup("x").map(|s| s.ty), Some(types.int()));
  }

  #[test]
  fn redefinition_in_same_scope_is_rejected() {
    let types = TypeStore::new();
    let mut scopes = ScopeTree::new();
    scopes.define("x", Symbol::variable(types.int())).unwrap();

    assert!(scopes.define("x", Symbol::variable(types.int())).is_err());
    assert!(scopes.define("_", Symbol::variable(types.int())).is_ok());
    assert!(scopes.define("_", Symbol::variable(types.int())).is_ok());
  }

  #[test]
  fn loop_control_inside_callback_is_detected() {
    let mut scopes = ScopeTree::new();
    scopes.push(ScopeKind::Function);
    scopes.push(ScopeKind::Callback);
    scopes.push(ScopeKind::Block);
    assert_eq!(scopes.branch_target(true), BranchTarget::Callback);

    scopes.push(ScopeKind::SwitchCase);
    assert_eq!(scopes.branch_target(false), BranchTarget::Statement);
    assert_eq!(scopes.branch_target(true), BranchTarget::Callback);
  }
}
