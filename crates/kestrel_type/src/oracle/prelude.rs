//! Host environment shipped with the compiler: Go's universe scope, the
//! surface language's builtin spellings and the packages its lowering emits
//! calls into.

use crate::types::{BasicKind, Field, TypeId, TypeStore};
use crate::value::ConstValue;

use super::{Builtin, Resolution, TableOracle};

pub const NG_PATH: &str = "github.com/qiniu/x/gop/ng";
pub const BIG_PATH: &str = "math/big";
pub const FRAME_ERRORS_PATH: &str = "github.com/qiniu/x/errors";

/// Build the standard oracle against `types`.
pub fn prelude(types: &mut TypeStore) -> TableOracle {
  let mut oracle = TableOracle::new();

  define_universe(types, &mut oracle);
  define_fmt(types, &mut oracle);
  define_strconv(types, &mut oracle);
  define_strings(types, &mut oracle);
  define_os(types, &mut oracle);
  let (big_int, big_rat) = define_big(types, &mut oracle);
  define_ng(types, &mut oracle, big_int, big_rat);
  define_frame_errors(types, &mut oracle);

  oracle
}

fn define_universe(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let basics = [
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("rune", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("byte", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("complex64", BasicKind::Complex64),
    ("complex128", BasicKind::Complex128),
    ("string", BasicKind::String),
  ];

  for (name, kind) in basics {
    oracle.define(name, Resolution::Type(types.basic(kind)));
  }

  oracle.define("error", Resolution::Type(types.error()));
  oracle.define("any", Resolution::Type(types.any()));

  let untyped_bool = types.basic(BasicKind::UntypedBool);
  oracle.define(
    "true",
    Resolution::Const {
      value: ConstValue::Bool(true),
      ty: untyped_bool,
    },
  );
  oracle.define(
    "false",
    Resolution::Const {
      value: ConstValue::Bool(false),
      ty: untyped_bool,
    },
  );
  oracle.define("nil", Resolution::Nil);

  let builtins = [
    Builtin::Append,
    Builtin::Cap,
    Builtin::Close,
    Builtin::Complex,
    Builtin::Copy,
    Builtin::Delete,
    Builtin::Imag,
    Builtin::Len,
    Builtin::Make,
    Builtin::New,
    Builtin::Panic,
    Builtin::Real,
    Builtin::Recover,
  ];
  for builtin in builtins {
    oracle.define(builtin.name(), Resolution::Builtin(builtin));
  }

  let any = types.any();
  let any_slice = types.slice(any);
  let int = types.int();
  let error = types.error();
  let string = types.string();
  let println = types.func(vec![any_slice], vec![int, error], true);
  let printf = types.func(vec![string, any_slice], vec![int, error], true);

  for (alias, target, ty) in [
    ("println", "Println", println),
    ("echo", "Println", println),
    ("print", "Print", println),
    ("printf", "Printf", printf),
  ] {
    oracle.define(
      alias,
      Resolution::Value {
        package: Some("fmt".to_string()),
        name: target.to_string(),
        ty,
      },
    );
  }
}

fn define_fmt(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let any = types.any();
  let any_slice = types.slice(any);
  let int = types.int();
  let string = types.string();
  let error = types.error();

  let print = types.func(vec![any_slice], vec![int, error], true);
  let printf = types.func(vec![string, any_slice], vec![int, error], true);
  let sprint = types.func(vec![any_slice], vec![string], true);
  let sprintf = types.func(vec![string, any_slice], vec![string], true);
  let errorf = types.func(vec![string, any_slice], vec![error], true);

  oracle.define_func("fmt", "Println", print);
  oracle.define_func("fmt", "Print", print);
  oracle.define_func("fmt", "Printf", printf);
  oracle.define_func("fmt", "Sprint", sprint);
  oracle.define_func("fmt", "Sprintln", sprint);
  oracle.define_func("fmt", "Sprintf", sprintf);
  oracle.define_func("fmt", "Errorf", errorf);
}

fn define_strconv(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let int = types.int();
  let int64 = types.basic(BasicKind::Int64);
  let float64 = types.float64();
  let string = types.string();
  let error = types.error();

  let atoi = types.func(vec![string], vec![int, error], false);
  let itoa = types.func(vec![int], vec![string], false);
  let parse_int = types.func(vec![string, int, int], vec![int64, error], false);
  let parse_float = types.func(vec![string, int], vec![float64, error], false);
  let format_int = types.func(vec![int64, int], vec![string], false);

  oracle.define_func("strconv", "Atoi", atoi);
  oracle.define_func("strconv", "Itoa", itoa);
  oracle.define_func("strconv", "ParseInt", parse_int);
  oracle.define_func("strconv", "ParseFloat", parse_float);
  oracle.define_func("strconv", "FormatInt", format_int);
}

fn define_strings(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let string = types.string();
  let strings = types.slice(string);
  let bool = types.bool();

  let unary = types.func(vec![string], vec![string], false);
  let split = types.func(vec![string, string], vec![strings], false);
  let join = types.func(vec![strings, string], vec![string], false);
  let contains = types.func(vec![string, string], vec![bool], false);

  oracle.define_func("strings", "ToUpper", unary);
  oracle.define_func("strings", "ToLower", unary);
  oracle.define_func("strings", "TrimSpace", unary);
  oracle.define_func("strings", "Split", split);
  oracle.define_func("strings", "Join", join);
  oracle.define_func("strings", "Contains", contains);
}

fn define_os(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let int = types.int();
  let string = types.string();
  let strings = types.slice(string);
  let error = types.error();

  let exit = types.func(vec![int], Vec::new(), false);
  let getenv = types.func(vec![string], vec![string], false);
  let remove = types.func(vec![string], vec![error], false);

  oracle.define_func("os", "Exit", exit);
  oracle.define_func("os", "Getenv", getenv);
  oracle.define_func("os", "Remove", remove);
  oracle.define_member(
    "os",
    "Args",
    Resolution::Value {
      package: Some("os".to_string()),
      name: "Args".to_string(),
      ty: strings,
    },
  );
}

fn define_big(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) -> (TypeId, TypeId) {
  let int64 = types.basic(BasicKind::Int64);
  let int = types.int();
  let string = types.string();
  let bool = types.bool();
  let opaque = types.structure(Vec::new());

  let big_int = types.declare_named(Some(BIG_PATH), "Int");
  types.set_underlying(big_int, opaque);
  let big_rat = types.declare_named(Some(BIG_PATH), "Rat");
  types.set_underlying(big_rat, opaque);

  let int_ptr = types.pointer(big_int);
  let rat_ptr = types.pointer(big_rat);

  let new_int = types.func(vec![int64], vec![int_ptr], false);
  let new_rat = types.func(vec![int64, int64], vec![rat_ptr], false);
  let set_string = types.func(vec![string, int], vec![int_ptr, bool], false);
  let to_string = types.func(Vec::new(), vec![string], false);

  oracle.define_member(BIG_PATH, "Int", Resolution::Type(big_int));
  oracle.define_member(BIG_PATH, "Rat", Resolution::Type(big_rat));
  oracle.define_func(BIG_PATH, "NewInt", new_int);
  oracle.define_func(BIG_PATH, "NewRat", new_rat);
  oracle.define_method(big_int, "SetString", set_string, true);
  oracle.define_method(big_int, "String", to_string, true);
  oracle.define_method(big_rat, "String", to_string, true);

  (big_int, big_rat)
}

fn define_ng(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
  big_int: TypeId,
  big_rat: TypeId,
) {
  let int = types.int();
  let bool = types.bool();
  let int_ptr = types.pointer(big_int);
  let rat_ptr = types.pointer(big_rat);
  let string = types.string();

  let names = [("Bigint", "bigint", "Int", int_ptr), ("Bigrat", "bigrat", "Rat", rat_ptr)];
  for (name, alias, field, inner) in names {
    let ty = types.declare_named(Some(NG_PATH), name);
    let body = types.structure(vec![Field {
      name: field.to_string(),
      ty: inner,
      embedded: true,
      tag: None,
    }]);
    types.set_underlying(ty, body);
    oracle.define_member(NG_PATH, name, Resolution::Type(ty));
    oracle.define(alias, Resolution::Type(ty));
  }

  for (name, alias) in [("Int128", "int128"), ("Uint128", "uint128")] {
    let ty = types.declare_named(Some(NG_PATH), name);
    let uint64 = types.basic(BasicKind::Uint64);
    let body = types.structure(vec![
      Field {
        name: "hi".to_string(),
        ty: uint64,
        embedded: false,
        tag: None,
      },
      Field {
        name: "lo".to_string(),
        ty: uint64,
        embedded: false,
        tag: None,
      },
    ]);
    types.set_underlying(ty, body);
    oracle.define_member(NG_PATH, name, Resolution::Type(ty));
    oracle.define(alias, Resolution::Type(ty));
  }

  let initializers: [(&str, &str, TypeId); 9] = [
    ("Bigint", "Bigint_Init__0", int),
    ("Bigint", "Bigint_Init__1", int_ptr),
    ("Bigrat", "Bigrat_Init__0", int),
    ("Bigrat", "Bigrat_Init__1", int_ptr),
    ("Bigrat", "Bigrat_Init__2", rat_ptr),
    ("Int128", "Int128_Init__0", int),
    ("Int128", "Int128_Init__1", int_ptr),
    ("Uint128", "Uint128_Init__0", int),
    ("Uint128", "Uint128_Init__1", int_ptr),
  ];
  for (type_name, func, param) in initializers {
    if let Some(ty) = types.lookup_named(Some(NG_PATH), type_name) {
      let sig = types.func(vec![param], vec![ty], false);
      oracle.define_func(NG_PATH, func, sig);
    }
  }

  for type_name in ["Bigint", "Bigrat", "Int128", "Uint128"] {
    let Some(ty) = types.lookup_named(Some(NG_PATH), type_name) else {
      continue;
    };
    let to_string = types.func(Vec::new(), vec![string], false);
    let is_zero = types.func(Vec::new(), vec![bool], false);
    oracle.define_method(ty, "String", to_string, false);
    oracle.define_method(ty, "IsZero", is_zero, false);
  }
}

fn define_frame_errors(
  types: &mut TypeStore,
  oracle: &mut TableOracle,
) {
  let error = types.error();
  let string = types.string();
  let int = types.int();

  let new_frame = types.func(vec![error, string, string, int, string], vec![error], false);
  oracle.define_func(FRAME_ERRORS_PATH, "NewFrame", new_frame);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::oracle::TypeOracle;

  #[test]
  fn println_spells_as_fmt() {
    let mut types = TypeStore::new();
    let oracle = prelude(&mut types);

    match oracle.resolve("println") {
      Some(Resolution::Value { package, name, .. }) => {
        assert_eq!(package.as_deref(), Some("fmt"));
        assert_eq!(name, "Println");
      },
      other => panic!("unexpected resolution {:?}", other),
    }
  }

  #[test]
  fn extended_numeric_aliases_are_types() {
    let mut types = TypeStore::new();
    let oracle = prelude(&mut types);
    let bigint = types.lookup_named(Some(NG_PATH), "Bigint").unwrap();

    assert_eq!(oracle.resolve("bigint"), Some(Resolution::Type(bigint)));
    assert!(oracle.resolve_member(NG_PATH, "Bigint_Init__1").is_some());
  }
}
