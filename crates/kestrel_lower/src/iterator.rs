//! Iteration over anything: native `range`, and the two iterator protocols
//! of user types.
//!
//! A type is pull-iterable when `Gop_Enum()` returns a cursor whose `Next()`
//! yields `(V, bool)` or `(K, V, bool)`, and push-iterable when `Gop_Enum`
//! takes a callback `func(V)` or `func(K, V)`. Pull wins when both exist.

use kestrel_config::DebugTrace;
use kestrel_diagnostics::message::DiagnosticMessage;
use kestrel_host::{operation::UnaryOperation, HostBranch, HostId, HostKind, HostParam, HostSignature};
use kestrel_log::trace_dbg;
use kestrel_type::{span::Span, types::TypeId};

use crate::{
  naming::{BLANK, ENUM, ITER, NEXT, OK},
  scope::Symbol,
  LowerResult, Lowerer,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RangePlan {
  Native {
    key: TypeId,
    value: Option<TypeId>,
  },
  Push {
    method: String,
    key: Option<TypeId>,
    value: TypeId,
  },
  Pull {
    method: String,
    key: Option<TypeId>,
    value: TypeId,
  },
}

impl RangePlan {
  pub fn is_iterator(&self) -> bool {
    !matches!(self, RangePlan::Native { .. })
  }

  pub fn is_push(&self) -> bool {
    matches!(self, RangePlan::Push { .. })
  }
}

impl<'a> Lowerer<'a> {
  /// How to iterate a value of type `ty`.
  pub(crate) fn range_plan(
    &self,
    ty: TypeId,
    span: &Span,
  ) -> LowerResult<RangePlan> {
    if let Some((key, value)) = self.types.range_types(ty) {
      return Ok(RangePlan::Native { key, value });
    }

    let candidates = [ENUM.to_string(), format!("{}__0", ENUM), format!("{}__1", ENUM)];
    let mut push = None;
    for candidate in candidates {
      let Some(method) = self.lookup_method(ty, &candidate) else {
        continue;
      };
      let Some(signature) = self.types.signature(method.sig) else {
        continue;
      };

      match (signature.params.as_slice(), signature.results.as_slice()) {
        ([], [cursor]) => {
          if let Some((key, value)) = self.pull_items(*cursor) {
            trace_dbg!(self.config, DebugTrace::Desugar, "pull iteration via {}", method.name);
            return Ok(RangePlan::Pull {
              method: method.name,
              key,
              value,
            });
          }
        },
        ([callback], []) if push.is_none() => {
          let Some(callback) = self.types.signature(*callback) else {
            continue;
          };
          if !callback.results.is_empty() {
            continue;
          }
          push = match callback.params.as_slice() {
            [value] => Some(RangePlan::Push {
              method: method.name.clone(),
              key: None,
              value: *value,
            }),
            [key, value] => Some(RangePlan::Push {
              method: method.name.clone(),
              key: Some(*key),
              value: *value,
            }),
            _ => None,
          };
        },
        _ => {},
      }
    }

    push.ok_or_else(|| DiagnosticMessage::NotEnumerable {
      ty: self.type_name(ty),
      span: span.clone(),
    })
  }

  /// Items yielded by the `Next()` of a pull cursor.
  fn pull_items(
    &self,
    cursor: TypeId,
  ) -> Option<(Option<TypeId>, TypeId)> {
    let next = self.lookup_method(cursor, NEXT)?;
    let signature = self.types.signature(next.sig)?;
    if !signature.params.is_empty() {
      return None;
    }

    let bool_ty = self.types.bool();
    match signature.results.as_slice() {
      [value, ok] if *ok == bool_ty => Some((None, *value)),
      [key, value, ok] if *ok == bool_ty => Some((Some(*key), *value)),
      _ => None,
    }
  }

  /// Bind the iteration variables of `plan` in the current scope.
  ///
  /// With a single name, native ranges bind the key and iterators the value.
  pub(crate) fn bind_range_vars(
    &mut self,
    plan: &RangePlan,
    key: Option<&str>,
    value: Option<&str>,
  ) {
    let (key_ty, value_ty) = match plan {
      RangePlan::Native { key, value } => (Some(*key), *value),
      RangePlan::Push { key, value, .. } | RangePlan::Pull { key, value, .. } => (*key, Some(*value)),
    };

    let (key, value) = match (plan.is_iterator(), key, value, key_ty) {
      // `for v <- it` over a value-only iterator.
      (true, Some(name), None, None) => (None, Some(name)),
      (_, key, value, _) => (key, value),
    };

    for (name, ty) in [(key, key_ty), (value, value_ty)] {
      if let (Some(name), Some(ty)) = (name, ty) {
        let _ = self.scopes.define(name, Symbol::variable(ty));
      }
    }
  }

  /// Emit the loop for `plan` over `source` with an already lowered body.
  pub(crate) fn emit_range(
    &mut self,
    plan: &RangePlan,
    source: HostId,
    key: Option<&str>,
    value: Option<&str>,
    body: Vec<HostId>,
    span: &Span,
  ) -> HostId {
    match plan {
      RangePlan::Native { .. } => {
        let key = key.map(|name| self.tree.ident(name));
        let value = value.map(|name| self.tree.ident(name));
        let key = match (key, value) {
          (None, Some(_)) => Some(self.tree.ident(BLANK)),
          (key, _) => key,
        };
        let body = self.scaffold(HostKind::Block(body));
        self.alloc(
          HostKind::Range {
            key,
            value,
            define: true,
            source,
            body,
          },
          span,
        )
      },
      RangePlan::Push {
        method,
        key: key_ty,
        value: value_ty,
      } => {
        let (key, value) = match (key_ty, key, value) {
          (None, Some(name), None) => (None, Some(name)),
          (_, key, value) => (key, value),
        };

        let mut params = Vec::with_capacity(2);
        if let Some(ty) = key_ty {
          params.push(HostParam {
            name: Some(key.unwrap_or(BLANK).to_string()),
            ty: *ty,
          });
        }
        params.push(HostParam {
          name: Some(value.unwrap_or(BLANK).to_string()),
          ty: *value_ty,
        });

        let body = self.scaffold(HostKind::Block(body));
        let callback = self.scaffold(HostKind::FunctionLiteral {
          signature: HostSignature {
            params,
            results: Vec::new(),
            variadic: false,
          },
          body,
        });
        let callee = self.tree.selector(source, method);
        let call = self.tree.call(callee, vec![callback]);
        self.alloc(HostKind::ExpressionStatement(call), span)
      },
      RangePlan::Pull {
        method, key: key_ty, ..
      } => {
        let (key, value) = match (key_ty, key, value) {
          (None, Some(name), None) => (None, Some(name)),
          (_, key, value) => (key, value),
        };

        // for _gop_it := src.Gop_Enum(); ; { k, v, _gop_ok := _gop_it.Next(); if !_gop_ok { break }; ... }
        let iterator = self.tree.ident(ITER);
        let callee = self.tree.selector(source, method);
        let start = self.tree.call(callee, Vec::new());
        let init = self.scaffold(HostKind::Assign {
          lhs: vec![iterator],
          rhs: vec![start],
          define: true,
          operation: None,
        });

        let mut lhs = Vec::with_capacity(3);
        if key_ty.is_some() {
          lhs.push(self.tree.ident(key.unwrap_or(BLANK)));
        }
        lhs.push(self.tree.ident(value.unwrap_or(BLANK)));
        lhs.push(self.tree.ident(OK));
        let iterator = self.tree.ident(ITER);
        let next = self.tree.selector(iterator, NEXT);
        let next = self.tree.call(next, Vec::new());
        let fetch = self.alloc(
          HostKind::Assign {
            lhs,
            rhs: vec![next],
            define: true,
            operation: None,
          },
          span,
        );

        let ok = self.tree.ident(OK);
        let done = self.tree.unary(UnaryOperation::Not, ok);
        let stop = self.scaffold(HostKind::Branch {
          kind: HostBranch::Break,
          label: None,
        });
        let stop = self.tree.block(vec![stop]);
        let check = self.alloc(
          HostKind::If {
            init: None,
            condition: done,
            then_branch: stop,
            else_branch: None,
          },
          span,
        );

        let mut statements = vec![fetch, check];
        statements.extend(body);
        let body = self.scaffold(HostKind::Block(statements));
        self.alloc(
          HostKind::For {
            init: Some(init),
            condition: None,
            post: None,
            body,
          },
          span,
        )
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_iterators_are_flagged() {
    let types = kestrel_type::types::TypeStore::new();
    let native = RangePlan::Native {
      key: types.int(),
      value: None,
    };
    let push = RangePlan::Push {
      method: ENUM.to_string(),
      key: None,
      value: types.int(),
    };
    assert!(!native.is_iterator());
    assert!(push.is_iterator());
    assert!(push.is_push());
  }
}
