pub mod builder;
pub mod expressions;
pub mod statements;
pub mod type_;

use expressions::ASTExpression;
use kestrel_type::{file::FileId, span::Span, Id, Store};
use statements::ASTStatement;
use type_::ASTType;

pub type NodeId = Id<ASTNode>;

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum ASTNodeKind {
  Expression(ASTExpression),
  Statement(ASTStatement),
  Type(ASTType),
}

#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct ASTNode {
  pub kind: ASTNodeKind,
  pub span: Span,
}

impl ASTNode {
  pub fn span(&self) -> &Span {
    &self.span
  }
}

/// One parsed source file: the node arena plus its top-level statements in
/// source order.
#[derive(Debug, Clone)]
pub struct SourceUnit {
  pub nodes: Store<ASTNode>,
  pub roots: Vec<NodeId>,
  pub file: FileId,
  pub package: String,
}

impl SourceUnit {
  pub fn get(
    &self,
    id: &NodeId,
  ) -> &ASTNode {
    self.nodes.get(id)
  }

  pub fn span(
    &self,
    id: &NodeId,
  ) -> Span {
    self.nodes.get(id).span.clone()
  }

  pub fn expression(
    &self,
    id: &NodeId,
  ) -> Option<&ASTExpression> {
    match &self.nodes.get(id).kind {
      ASTNodeKind::Expression(expression) => Some(expression),
      _ => None,
    }
  }

  pub fn statement(
    &self,
    id: &NodeId,
  ) -> Option<&ASTStatement> {
    match &self.nodes.get(id).kind {
      ASTNodeKind::Statement(statement) => Some(statement),
      _ => None,
    }
  }

  pub fn type_expr(
    &self,
    id: &NodeId,
  ) -> Option<&ASTType> {
    match &self.nodes.get(id).kind {
      ASTNodeKind::Type(ty) => Some(ty),
      _ => None,
    }
  }

  /// Name of a bare identifier expression.
  pub fn identifier(
    &self,
    id: &NodeId,
  ) -> Option<&str> {
    match self.expression(id) {
      Some(ASTExpression::Identifier(name)) => Some(name),
      _ => None,
    }
  }
}
