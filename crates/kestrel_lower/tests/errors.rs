mod common;

use kestrel_ast::{
  builder::SurfaceBuilder,
  expressions::{ASTBinaryOperator, ErrorWrapPolicy},
  statements::BranchKind,
  NodeId,
};
use kestrel_config::{ErrorPolicy, LowerOptions};
use kestrel_diagnostics::diagnostic_report::Severity;

#[test]
fn undeclared_name() {
  common::assert_err("println y\n", &["K0001"], |b| {
    b.line(1);
    let head = b.ident("println");
    let y = b.ident("y");
    let command = b.command(head, vec![y]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });
}

#[test]
fn unknown_package_member() {
  common::assert_err("import \"strconv\"\nstrconv.Nope(1)\n", &["K0002"], |b| {
    let import = b.import("strconv");
    b.root(import);
    b.line(2);
    let callee = b.path("strconv.Nope");
    let one = b.int("1");
    let call = b.call(callee, vec![one]);
    let statement = b.expr_stmt(call);
    b.root(statement);
  });
}

#[test]
fn string_var_from_int() {
  common::assert_err("var s string = 1\n", &["K0100"], |b| {
    b.line(1);
    let string = b.named_type("string");
    let one = b.int("1");
    let var = b.var_decl(&["s"], Some(string), vec![one]);
    b.root(var);
  });
}

#[test]
fn too_many_arguments() {
  common::assert_err("import \"strconv\"\nprintln strconv.Itoa(1, 2)\n", &["K0102"], |b| {
    let import = b.import("strconv");
    b.root(import);
    b.line(2);
    let callee = b.path("strconv.Itoa");
    let one = b.int("1");
    let two = b.int("2");
    let call = b.call(callee, vec![one, two]);
    let statement = b.expr_stmt(call);
    b.root(statement);
  });
}

#[test]
fn define_without_new_names() {
  common::assert_err("x := 1\nx := 2\n", &["K0113"], |b| {
    b.line(1);
    let one = b.int("1");
    let first = b.define(&["x"], vec![one]);
    b.root(first);
    b.line(2);
    let two = b.int("2");
    let second = b.define(&["x"], vec![two]);
    b.root(second);
  });
}

#[test]
fn wrap_needs_an_error_result() {
  common::assert_err("import \"strconv\"\ns := strconv.Itoa(1)!\n", &["K0107"], |b| {
    let import = b.import("strconv");
    b.root(import);
    b.line(2).at("strconv.Itoa(1)");
    let callee = b.path("strconv.Itoa");
    let one = b.int("1");
    let call = b.call(callee, vec![one]);
    let wrapped = b.error_wrap(call, ErrorWrapPolicy::Panic);
    b.line(2);
    let define = b.define(&["s"], vec![wrapped]);
    b.root(define);
  });
}

#[test]
fn return_wrap_at_top_level() {
  common::assert_err("import \"strconv\"\nn := strconv.Atoi(\"1\")?\n", &["K0108"], |b| {
    let import = b.import("strconv");
    b.root(import);
    b.line(2).at("strconv.Atoi(\"1\")");
    let callee = b.path("strconv.Atoi");
    let one = b.string("1");
    let call = b.call(callee, vec![one]);
    let wrapped = b.error_wrap(call, ErrorWrapPolicy::Return);
    b.line(2);
    let define = b.define(&["n"], vec![wrapped]);
    b.root(define);
  });
}

#[test]
fn empty_literal_needs_context() {
  common::assert_err("x := []\n", &["K0201"], |b| {
    b.line(1);
    let empty = b.slice_literal(Vec::new());
    let define = b.define(&["x"], vec![empty]);
    b.root(define);
  });
}

#[test]
fn break_outside_a_loop() {
  common::assert_err("break\n", &["K0301"], |b| {
    b.line(1);
    let branch = b.branch(BranchKind::Break, None);
    b.root(branch);
  });
}

#[test]
fn redeclared_global() {
  common::assert_err("var a = 1\nvar a = 2\n", &["K0400"], |b| {
    b.line(1);
    let one = b.int("1");
    let first = b.var_decl(&["a"], None, vec![one]);
    b.root(first);
    b.line(2);
    let two = b.int("2");
    let second = b.var_decl(&["a"], None, vec![two]);
    b.root(second);
  });
}

fn empty_main(b: &mut SurfaceBuilder) -> NodeId {
  let signature = b.func_type(Vec::new(), Vec::new(), false);
  let body = b.block(Vec::new());
  b.func_decl("main", signature, body)
}

#[test]
fn two_main_functions() {
  common::assert_err("func main() {}\nfunc main() {}\n", &["K0401"], |b| {
    b.line(1);
    let first = empty_main(b);
    b.root(first);
    b.line(2);
    let second = empty_main(b);
    b.root(second);
  });
}

#[test]
fn statements_next_to_main() {
  common::assert_err("println 1\nfunc main() {}\n", &["K0402"], |b| {
    b.line(1);
    let head = b.ident("println");
    let one = b.int("1");
    let command = b.command(head, vec![one]);
    let statement = b.expr_stmt(command);
    b.root(statement);
    b.line(2);
    let main = empty_main(b);
    b.root(main);
  });
}

#[test]
fn initialization_cycle() {
  common::assert_err("var a = b\nvar b = a\n", &["K0403"], |b| {
    b.line(1);
    let value = b.ident("b");
    let first = b.var_decl(&["a"], None, vec![value]);
    b.root(first);
    b.line(2);
    let value = b.ident("a");
    let second = b.var_decl(&["b"], None, vec![value]);
    b.root(second);
  });
}

/// Two functions, each with an undeclared name in its body.
fn two_broken_functions(b: &mut SurfaceBuilder) {
  for (line, name) in [(1, "f"), (2, "g")] {
    b.line(line);
    let signature = b.func_type(Vec::new(), Vec::new(), false);
    let missing = b.ident("missing");
    let statement = b.expr_stmt(missing);
    let body = b.block(vec![statement]);
    let function = b.func_decl(name, signature, body);
    b.root(function);
  }
}

#[test]
fn batch_reports_every_declaration() {
  let text = "func f() { missing }\nfunc g() { missing }\n";
  let diagnostics = match common::lower(text, two_broken_functions) {
    Ok(_) => panic!("expected errors"),
    Err(diagnostics) => diagnostics,
  };
  let errors: Vec<_> = diagnostics.iter().filter(|d| d.error_code == "K0001").collect();
  assert_eq!(errors.len(), 2, "{}", common::format_diagnostics(&diagnostics));
}

#[test]
fn halt_on_first_stops_after_one() {
  let text = "func f() { missing }\nfunc g() { missing }\n";
  let options = LowerOptions {
    error_policy: ErrorPolicy::HaltOnFirst,
    ..LowerOptions::default()
  };
  let diagnostics = match common::lower_with(text, options, two_broken_functions) {
    Ok(_) => panic!("expected errors"),
    Err(diagnostics) => diagnostics,
  };
  assert_eq!(diagnostics.len(), 1, "{}", common::format_diagnostics(&diagnostics));
  assert!(matches!(diagnostics[0].severity, Severity::Error));
}

#[test]
fn errors_carry_their_position() {
  let diagnostics = match common::lower("x := 1\ny := z\n", |b| {
    b.line(1);
    let one = b.int("1");
    let first = b.define(&["x"], vec![one]);
    b.root(first);
    b.line(2).at("z");
    let z = b.ident("z");
    b.line(2);
    let second = b.define(&["y"], vec![z]);
    b.root(second);
  }) {
    Ok(_) => panic!("expected errors"),
    Err(diagnostics) => diagnostics,
  };

  let undeclared = diagnostics
    .iter()
    .find(|d| d.error_code == "K0001")
    .unwrap_or_else(|| panic!("{}", common::format_diagnostics(&diagnostics)));
  assert_eq!(undeclared.primary_span.start.0, 12);
}

#[test]
fn lambda_needs_a_function_type() {
  common::assert_err("f := (x) => x\n", &["K0200"], |b| {
    b.line(1).at("(x) => x");
    let x = b.ident("x");
    let lambda = b.lambda(&["x"], vec![x]);
    b.line(1);
    let define = b.define(&["f"], vec![lambda]);
    b.root(define);
  });
}

#[test]
fn wide_literal_overflows_int() {
  common::assert_err("n := 170141183460469231731687303715884105728\n", &["K0111"], |b| {
    b.line(1).at("170141183460469231731687303715884105728");
    let wide = b.int("170141183460469231731687303715884105728");
    b.line(1);
    let define = b.define(&["n"], vec![wide]);
    b.root(define);
  });
}

#[test]
fn overflow_quotes_only_the_operands() {
  let text = "x := 1r << 100000\n";
  let diagnostics = match common::lower(text, |b| {
    b.line(1).at("1r");
    let one = b.big_int("1");
    b.line(1).at("100000");
    let count = b.int("100000");
    b.line(1).at("1r << 100000");
    let shifted = b.binary(ASTBinaryOperator::ShiftLeft, one, count);
    b.line(1);
    let define = b.define(&["x"], vec![shifted]);
    b.root(define);
  }) {
    Ok(_) => panic!("expected errors"),
    Err(diagnostics) => diagnostics,
  };

  let overflow = diagnostics
    .iter()
    .find(|d| d.error_code == "K0111")
    .unwrap_or_else(|| panic!("{}", common::format_diagnostics(&diagnostics)));
  assert_eq!(overflow.message, "constant 1r << 100000 overflows");
  assert_eq!((overflow.primary_span.start.0, overflow.primary_span.end.0), (5, 17));
}
