use kestrel_type::types::ChanDir;

use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTParam {
  pub name: Option<String>,
  pub ty: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTField {
  /// `None` for an embedded field.
  pub name: Option<String>,
  pub ty: NodeId,
  pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ASTInterfaceMethod {
  pub name: String,
  pub signature: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ASTType {
  Named {
    package: Option<String>,
    name: String,
  },
  Pointer(NodeId),
  Slice(NodeId),
  /// `[N]T`, or `[...]T` when `len` is `None`.
  Array {
    len: Option<NodeId>,
    element: NodeId,
  },
  Map {
    key: NodeId,
    value: NodeId,
  },
  Chan {
    dir: ChanDir,
    element: NodeId,
  },
  /// The last parameter of a variadic function is written `...T`; its `ty` is `T`.
  Function {
    params: Vec<ASTParam>,
    results: Vec<ASTParam>,
    variadic: bool,
  },
  Struct(Vec<ASTField>),
  Interface(Vec<ASTInterfaceMethod>),
}
