mod common;

use insta::assert_snapshot;
use kestrel_ast::{
  builder::SurfaceBuilder,
  expressions::{ASTBinaryOperator, ASTUnaryOperator, ComprehensionYield, ErrorWrapPolicy},
  NodeId,
};
use kestrel_config::{EntryRole, LowerOptions};
use kestrel_lower::DeclKind;

/// `println args...` on the current line.
fn print_stmt(
  b: &mut SurfaceBuilder,
  args: Vec<NodeId>,
) -> NodeId {
  let head = b.ident("println");
  let command = b.command(head, args);
  b.expr_stmt(command)
}

#[test]
fn for_phrase_with_guard() {
  let text = "sum := 0\nfor x <- [1, 3, 5, 7, 11, 13, 17], x > 3 {\n\tsum = sum + x\n}\nprintln sum\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let zero = b.int("0");
    let define = b.define(&["sum"], vec![zero]);
    b.root(define);

    b.line(2);
    let values: Vec<_> = ["1", "3", "5", "7", "11", "13", "17"].iter().map(|raw| b.int(raw)).collect();
    let list = b.slice_literal(values);
    let x = b.ident("x");
    let three = b.int("3");
    let guard = b.binary(ASTBinaryOperator::GreaterThan, x, three);
    let clause = b.clause(None, Some("x"), list, Some(guard));

    b.line(3);
    let target = b.ident("sum");
    let left = b.ident("sum");
    let right = b.ident("x");
    let add = b.binary(ASTBinaryOperator::Add, left, right);
    let assign = b.assign(vec![target], vec![add]);
    let body = b.block(vec![assign]);

    b.line(2);
    let phrase = b.for_phrase(clause, body);
    b.root(phrase);

    b.line(5);
    let head = b.ident("println");
    let sum = b.ident("sum");
    let command = b.command(head, vec![sum]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert_snapshot!(output, @r#"
package main

import "fmt"

//line /foo/bar.gop:1
func main() {
//line /foo/bar.gop:1:1
	sum := 0
//line /foo/bar.gop:2:1
	for _, x := range []int{1, 3, 5, 7, 11, 13, 17} {
		if x > 3 {
//line /foo/bar.gop:3:1
			sum = sum + x
		}
	}
//line /foo/bar.gop:5:1
	fmt.Println(sum)
}
"#);
}

#[test]
fn panic_wrap_records_a_frame() {
  let text = "n := strconv.Atoi(\"12\")!\nprintln n\n";
  let output = common::lower_ok(text, |b| {
    let import = b.import("strconv");
    b.root(import);

    b.line(1).at("strconv.Atoi(\"12\")");
    let callee = b.path("strconv.Atoi");
    let arg = b.string("12");
    let call = b.call(callee, vec![arg]);
    let wrapped = b.error_wrap(call, ErrorWrapPolicy::Panic);
    b.line(1);
    let define = b.define(&["n"], vec![wrapped]);
    b.root(define);

    b.line(2);
    let head = b.ident("println");
    let n = b.ident("n");
    let command = b.command(head, vec![n]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert!(output.contains("import (\n\t\"fmt\"\n\t\"github.com/qiniu/x/errors\"\n\t\"strconv\"\n)\n"));
  assert!(output.contains("\tn := func() (_gop_ret int) {\n\t\tvar _gop_err error\n"));
  assert!(output.contains("\t\t_gop_ret, _gop_err = strconv.Atoi(\"12\")\n"));
  assert!(output.contains(
    "\t\t\t_gop_err = errors.NewFrame(_gop_err, \"strconv.Atoi(\\\"12\\\")\", \"/foo/bar.gop\", 1, \"main.main\")\n"
  ));
  assert!(output.contains("\t\t\tpanic(_gop_err)\n\t\t}\n\t\treturn\n\t}()\n"));
  // Everything inside the literal sits on line 1 already.
  assert_eq!(output.matches("//line /foo/bar.gop:1:1").count(), 1);
}

#[test]
fn return_wrap_hoists_a_binding() {
  let text = "func parse(s string) (int, error) {\n\tn := strconv.Atoi(s)?\n\treturn n, nil\n}\n";
  let output = common::lower_ok(text, |b| {
    let import = b.import("strconv");
    b.root(import);

    b.line(1);
    let string = b.named_type("string");
    let int = b.named_type("int");
    let error = b.named_type("error");
    let signature = b.func_type(vec![(Some("s"), string)], vec![int, error], false);

    b.line(2).at("strconv.Atoi(s)");
    let callee = b.path("strconv.Atoi");
    let s = b.ident("s");
    let call = b.call(callee, vec![s]);
    let wrapped = b.error_wrap(call, ErrorWrapPolicy::Return);
    b.line(2);
    let define = b.define(&["n"], vec![wrapped]);

    b.line(3);
    let n = b.ident("n");
    let nil = b.ident("nil");
    let ret = b.ret(vec![n, nil]);

    b.line(1);
    let body = b.block(vec![define, ret]);
    let function = b.func_decl("parse", signature, body);
    b.root(function);
  });

  assert!(output.contains("func parse(s string) (int, error) {\n"));
  assert!(output.contains("\tvar _autoGo_1 int\n"));
  assert!(output.contains("\t\t_autoGo_1, _gop_err = strconv.Atoi(s)\n"));
  assert!(output.contains("errors.NewFrame(_gop_err, \"strconv.Atoi(s)\", \"/foo/bar.gop\", 2, \"main.parse\")"));
  assert!(output.contains("\t\t\treturn 0, _gop_err\n"));
  assert!(output.contains("\t\tgoto _autoGo_2\n\t_autoGo_2:\n\t}\n"));
  assert!(output.contains("\tn := _autoGo_1\n"));
  // No statements at top level: nothing to run, but an executable still
  // gets an empty main.
  assert!(output.contains("func main() {\n}\n"));
}

#[test]
fn markers_use_the_relative_base() {
  let text = "println 1\n";
  let options = LowerOptions {
    relative_base_path: Some("/foo/root".to_string()),
    ..LowerOptions::default()
  };
  let output = common::lower_ok_with(text, options, |b| {
    b.line(1);
    let head = b.ident("println");
    let one = b.int("1");
    let command = b.command(head, vec![one]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert!(output.contains("//line ../bar.gop:1\nfunc main() {\n//line ../bar.gop:1:1\n\tfmt.Println(1)\n}\n"));
}

#[test]
fn markers_can_be_suppressed() {
  let options = LowerOptions {
    suppress_position_markers: true,
    ..LowerOptions::default()
  };
  let output = common::lower_ok_with("println 1\n", options, |b| {
    b.line(1);
    let head = b.ident("println");
    let one = b.int("1");
    let command = b.command(head, vec![one]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert!(!output.contains("//line"));
  assert!(output.ends_with("func main() {\n\tfmt.Println(1)\n}\n"));
}

#[test]
fn library_units_get_an_init() {
  let options = LowerOptions {
    entry_role: EntryRole::LibraryInit,
    suppress_position_markers: true,
    ..LowerOptions::default()
  };
  let output = common::lower_ok_with("println 1\n", options, |b| {
    b.line(1);
    let head = b.ident("println");
    let one = b.int("1");
    let command = b.command(head, vec![one]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert!(output.contains("func init() {\n\tfmt.Println(1)\n}\n"));
  assert!(!output.contains("func main()"));
}

#[test]
fn no_entry_without_statements_when_suppressed() {
  let options = LowerOptions {
    suppress_auto_entry: true,
    suppress_position_markers: true,
    ..LowerOptions::default()
  };
  let output = common::lower_ok_with("var x = 1\n", options, |b| {
    b.line(1);
    let one = b.int("1");
    let var = b.var_decl(&["x"], None, vec![one]);
    b.root(var);
  });

  assert_eq!(output, "package main\n\nvar x = 1\n");
}

#[test]
fn declarations_are_grouped_by_kind() {
  let text = "func twice(n int) int {\n\treturn n * 2\n}\nvar total = twice(limit)\ntype Count int\nconst limit = 21\n";
  let result = common::lower(text, |b| {
    b.line(1);
    let int = b.named_type("int");
    let result = b.named_type("int");
    let signature = b.func_type(vec![(Some("n"), int)], vec![result], false);
    b.line(2);
    let n = b.ident("n");
    let two = b.int("2");
    let product = b.binary(ASTBinaryOperator::Multiply, n, two);
    let ret = b.ret(vec![product]);
    b.line(1);
    let body = b.block(vec![ret]);
    let function = b.func_decl("twice", signature, body);
    b.root(function);

    b.line(4);
    let callee = b.ident("twice");
    let limit = b.ident("limit");
    let call = b.call(callee, vec![limit]);
    let var = b.var_decl(&["total"], None, vec![call]);
    b.root(var);

    b.line(5);
    let int = b.named_type("int");
    let decl = b.type_decl("Count", int);
    b.root(decl);

    b.line(6);
    let value = b.int("21");
    let constant = b.const_decl(&["limit"], None, vec![value]);
    b.root(constant);
  });

  let output = match result {
    Ok(output) => output,
    Err(diagnostics) => panic!("{}", common::format_diagnostics(&diagnostics)),
  };
  let order: Vec<(&str, DeclKind)> = output
    .declarations
    .iter()
    .map(|record| (record.name.as_str(), record.kind.clone()))
    .collect();
  assert_eq!(
    order,
    vec![
      ("Count", DeclKind::Type),
      ("total", DeclKind::Var),
      ("limit", DeclKind::Const),
      ("twice", DeclKind::Func),
      ("main", DeclKind::Entry),
    ]
  );

  let rendered = common::render(&output);
  let position = |needle: &str| rendered.find(needle).unwrap_or(usize::MAX);
  // Source order is kept within a group.
  assert!(position("type Count int") < position("var total = twice(limit)"));
  assert!(position("var total = twice(limit)") < position("const limit = 21"));
  assert!(position("const limit = 21") < position("func twice(n int) int {"));
  assert!(rendered.contains("\treturn n * 2\n"));
}

#[test]
fn list_comprehension_becomes_a_closure() {
  let text = "squares := [x * x for x <- [1, 2, 3], x > 1]\nprintln squares\n";
  let output = common::lower_ok(text, |b| {
    b.line(1).at("[x * x");
    let left = b.ident("x");
    let right = b.ident("x");
    let square = b.binary(ASTBinaryOperator::Multiply, left, right);
    let values: Vec<_> = ["1", "2", "3"].iter().map(|raw| b.int(raw)).collect();
    let source = b.slice_literal(values);
    let x = b.ident("x");
    let one = b.int("1");
    let guard = b.binary(ASTBinaryOperator::GreaterThan, x, one);
    let clause = b.clause(None, Some("x"), source, Some(guard));
    let comprehension = b.comprehension(ComprehensionYield::List(square), vec![clause]);
    b.line(1);
    let define = b.define(&["squares"], vec![comprehension]);
    b.root(define);

    b.line(2);
    let head = b.ident("println");
    let squares = b.ident("squares");
    let command = b.command(head, vec![squares]);
    let statement = b.expr_stmt(command);
    b.root(statement);
  });

  assert!(output.contains("\tsquares := func() (_gop_ret []int) {\n"));
  assert!(output.contains("\t\tfor _, x := range []int{1, 2, 3} {\n"));
  assert!(output.contains("\t\t\tif x > 1 {\n"));
  assert!(output.contains("\t\t\t\t_gop_ret = append(_gop_ret, x * x)\n"));
  assert!(output.contains("\t\treturn\n\t}()\n"));
}

#[test]
fn explicit_main_is_kept_as_written() {
  let text = "func main() {\n\tprintln \"hi\"\n}\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let signature = b.func_type(Vec::new(), Vec::new(), false);
    b.line(2);
    let head = b.ident("println");
    let hi = b.string("hi");
    let command = b.command(head, vec![hi]);
    let statement = b.expr_stmt(command);
    b.line(1);
    let body = b.block(vec![statement]);
    let function = b.func_decl("main", signature, body);
    b.root(function);
  });

  assert_eq!(output.matches("func main()").count(), 1);
  assert!(output.contains("//line /foo/bar.gop:1:1\nfunc main() {\n//line /foo/bar.gop:2:1\n\tfmt.Println(\"hi\")\n}\n"));
}

#[test]
fn mixed_numbers_widen_to_float() {
  let output = common::lower_ok("xs := [1, 3.4, 5]\nprintln xs\n", |b| {
    b.line(1);
    let one = b.int("1");
    let fraction = b.float("3.4");
    let five = b.int("5");
    let list = b.slice_literal(vec![one, fraction, five]);
    let define = b.define(&["xs"], vec![list]);
    b.root(define);

    b.line(2);
    let xs = b.ident("xs");
    let statement = print_stmt(b, vec![xs]);
    b.root(statement);
  });

  assert_snapshot!(output, @r#"
package main

import "fmt"

//line /foo/bar.gop:1
func main() {
//line /foo/bar.gop:1:1
	xs := []float64{1, 3.4, 5}
//line /foo/bar.gop:2:1
	fmt.Println(xs)
}
"#);
}

#[test]
fn big_int_operators_become_method_calls() {
  let text = "var x, y bigint\nz := x + y\nx += y\nprintln z\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let bigint = b.named_type("bigint");
    let var = b.var_decl(&["x", "y"], Some(bigint), Vec::new());
    b.root(var);

    b.line(2).at("x + y");
    let x = b.ident("x");
    let y = b.ident("y");
    let sum = b.binary(ASTBinaryOperator::Add, x, y);
    b.line(2);
    let define = b.define(&["z"], vec![sum]);
    b.root(define);

    b.line(3);
    let x = b.ident("x");
    let y = b.ident("y");
    let add = b.compound_assign(ASTBinaryOperator::Add, x, y);
    b.root(add);

    b.line(4);
    let z = b.ident("z");
    let statement = print_stmt(b, vec![z]);
    b.root(statement);
  });

  assert_snapshot!(output, @r#"
package main

import (
	"fmt"
	"github.com/qiniu/x/gop/ng"
)

//line /foo/bar.gop:1:1
var x, y ng.Bigint

//line /foo/bar.gop:2
func main() {
//line /foo/bar.gop:2:1
	z := (ng.Bigint).Gop_Add(x, y)
//line /foo/bar.gop:3:1
	x.Gop_AddAssign(y)
//line /foo/bar.gop:4:1
	fmt.Println(z)
}
"#);
}

#[test]
fn big_constants_fold_exactly() {
  let text = "x := 1r + 2r\ny := 1r << 200\nw := 170141183460469231731687303715884105728r\nprintln x, y, w\n";
  let output = common::lower_ok(text, |b| {
    b.line(1).at("1r");
    let one = b.big_int("1");
    b.line(1).at("2r");
    let two = b.big_int("2");
    b.line(1).at("1r + 2r");
    let sum = b.binary(ASTBinaryOperator::Add, one, two);
    b.line(1);
    let define = b.define(&["x"], vec![sum]);
    b.root(define);

    b.line(2).at("1r");
    let one = b.big_int("1");
    b.line(2).at("200");
    let count = b.int("200");
    b.line(2).at("1r << 200");
    let shifted = b.binary(ASTBinaryOperator::ShiftLeft, one, count);
    b.line(2);
    let define = b.define(&["y"], vec![shifted]);
    b.root(define);

    b.line(3).at("170141183460469231731687303715884105728r");
    let wide = b.big_int("170141183460469231731687303715884105728");
    b.line(3);
    let define = b.define(&["w"], vec![wide]);
    b.root(define);

    b.line(4);
    let args = vec![b.ident("x"), b.ident("y"), b.ident("w")];
    let statement = print_stmt(b, args);
    b.root(statement);
  });

  assert!(output.contains("\t\"math/big\"\n"), "{}", output);
  assert!(output.contains("\tx := ng.Bigint_Init__1(big.NewInt(3))\n"), "{}", output);
  assert!(output.contains("\ty := ng.Bigint_Init__1(func() *big.Int {\n"), "{}", output);
  assert!(output.contains(
    "\t\tv, _ := new(big.Int).SetString(\"1606938044258990275541962092341162602522202993782792835301376\", 10)\n\t\treturn v\n\t}())\n"
  ));
  assert!(output.contains("new(big.Int).SetString(\"170141183460469231731687303715884105728\", 10)"));
}

#[test]
fn wide_integer_constants_fold_before_narrowing() {
  let text = "n := 170141183460469231731687303715884105728 >> 120\nprintln n\n";
  let output = common::lower_ok(text, |b| {
    b.line(1).at("170141183460469231731687303715884105728");
    let wide = b.int("170141183460469231731687303715884105728");
    b.line(1).at("120");
    let count = b.int("120");
    b.line(1).at("170141183460469231731687303715884105728 >> 120");
    let shifted = b.binary(ASTBinaryOperator::ShiftRight, wide, count);
    b.line(1);
    let define = b.define(&["n"], vec![shifted]);
    b.root(define);

    b.line(2);
    let n = b.ident("n");
    let statement = print_stmt(b, vec![n]);
    b.root(statement);
  });

  assert!(output.contains("\tn := 170141183460469231731687303715884105728 >> 120\n"), "{}", output);
}

#[test]
fn multi_value_call_feeds_println() {
  let text = "func pair(n int) (int, int) {\n\treturn n, n * 2\n}\nprintln pair(3)\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let int = b.named_type("int");
    let first = b.named_type("int");
    let second = b.named_type("int");
    let signature = b.func_type(vec![(Some("n"), int)], vec![first, second], false);
    b.line(2);
    let n = b.ident("n");
    let left = b.ident("n");
    let two = b.int("2");
    let double = b.binary(ASTBinaryOperator::Multiply, left, two);
    let ret = b.ret(vec![n, double]);
    b.line(1);
    let body = b.block(vec![ret]);
    let function = b.func_decl("pair", signature, body);
    b.root(function);

    b.line(4).at("pair(3)");
    let callee = b.ident("pair");
    let three = b.int("3");
    let call = b.call(callee, vec![three]);
    b.line(4);
    let statement = print_stmt(b, vec![call]);
    b.root(statement);
  });

  assert!(output.contains("\tfmt.Println(pair(3))\n"), "{}", output);
}

#[test]
fn exists_and_select_comprehensions() {
  let text = "xs := [1, 2, 3]\nfound := {for x <- xs, x > 2}\nfirst := {x for x <- xs, x > 1}\nv, ok := {x for x <- xs, x > 5}\nprintln found, first, v, ok\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let values: Vec<_> = ["1", "2", "3"].iter().map(|raw| b.int(raw)).collect();
    let list = b.slice_literal(values);
    let define = b.define(&["xs"], vec![list]);
    b.root(define);

    for (line, name, bound) in [(2, None, "2"), (3, Some(&["first"][..]), "1"), (4, Some(&["v", "ok"][..]), "5")] {
      b.line(line);
      let source = b.ident("xs");
      let x = b.ident("x");
      let limit = b.int(bound);
      let guard = b.binary(ASTBinaryOperator::GreaterThan, x, limit);
      let clause = b.clause(None, Some("x"), source, Some(guard));
      let (yields, names) = match name {
        None => (ComprehensionYield::Exists, &["found"][..]),
        Some(names) => (ComprehensionYield::Select(b.ident("x")), names),
      };
      let comprehension = b.comprehension(yields, vec![clause]);
      let define = b.define(names, vec![comprehension]);
      b.root(define);
    }

    b.line(5);
    let args = vec![b.ident("found"), b.ident("first"), b.ident("v"), b.ident("ok")];
    let statement = print_stmt(b, args);
    b.root(statement);
  });

  // No match leaves the named results at false and the zero value.
  assert!(output.contains("\tfound := func() (_gop_ok bool) {\n"), "{}", output);
  assert!(output.contains("\t\t\tif x > 2 {\n\t\t\t\treturn true\n\t\t\t}\n"), "{}", output);
  assert!(output.contains("\tfirst := func() (_gop_ret int) {\n"), "{}", output);
  assert!(output.contains("\t\t\tif x > 1 {\n\t\t\t\treturn x\n\t\t\t}\n"), "{}", output);
  assert!(output.contains("\tv, ok := func() (_gop_ret int, _gop_ok bool) {\n"), "{}", output);
  assert!(output.contains("\t\t\tif x > 5 {\n\t\t\t\treturn x, true\n\t\t\t}\n"), "{}", output);
  assert_eq!(output.matches("\t\treturn\n\t}()\n").count(), 3);
}

#[test]
fn clauses_nest_in_source_order() {
  let text = "a := [1, 2]\nb := [3, 4]\nsums := [x + y for x <- a, y <- b, x < y]\nprintln sums\n";
  let output = common::lower_ok(text, |b| {
    for (line, name, raws) in [(1, "a", ["1", "2"]), (2, "b", ["3", "4"])] {
      b.line(line);
      let values: Vec<_> = raws.iter().map(|raw| b.int(raw)).collect();
      let list = b.slice_literal(values);
      let define = b.define(&[name], vec![list]);
      b.root(define);
    }

    b.line(3);
    let x = b.ident("x");
    let y = b.ident("y");
    let sum = b.binary(ASTBinaryOperator::Add, x, y);
    let a = b.ident("a");
    let outer = b.clause(None, Some("x"), a, None);
    let source = b.ident("b");
    let x = b.ident("x");
    let y = b.ident("y");
    let guard = b.binary(ASTBinaryOperator::LessThan, x, y);
    let inner = b.clause(None, Some("y"), source, Some(guard));
    let comprehension = b.comprehension(ComprehensionYield::List(sum), vec![outer, inner]);
    let define = b.define(&["sums"], vec![comprehension]);
    b.root(define);

    b.line(4);
    let sums = b.ident("sums");
    let statement = print_stmt(b, vec![sums]);
    b.root(statement);
  });

  assert!(output.contains("\tsums := func() (_gop_ret []int) {\n"), "{}", output);
  assert!(output.contains("\t\tfor _, x := range a {\n"), "{}", output);
  assert!(output.contains("\t\t\tfor _, y := range b {\n"), "{}", output);
  assert!(output.contains("\t\t\t\tif x < y {\n\t\t\t\t\t_gop_ret = append(_gop_ret, x + y)\n"), "{}", output);
  let position = |needle: &str| output.find(needle).unwrap_or(usize::MAX);
  assert!(position("range a {") < position("range b {"));
}

/// `type Src struct{}` on line 1.
fn src_type(b: &mut SurfaceBuilder) {
  b.line(1);
  let fields = b.struct_type(Vec::new());
  let decl = b.type_decl("Src", fields);
  b.root(decl);
}

/// `for x <- Src{} { println x }` starting at `line`.
fn for_each_src(
  b: &mut SurfaceBuilder,
  line: u32,
) {
  b.line(line).at("Src{}");
  let ty = b.named_type("Src");
  let source = b.composite(Some(ty), Vec::new());
  let clause = b.clause(None, Some("x"), source, None);

  b.line(line + 1);
  let x = b.ident("x");
  let print = print_stmt(b, vec![x]);
  let body = b.block(vec![print]);

  b.line(line);
  let phrase = b.for_phrase(clause, body);
  b.root(phrase);
}

#[test]
fn pull_iterator_starts_once() {
  let text = "type Src struct{}\ntype Cursor struct{}\nfunc (c *Cursor) Next() (int, bool) {\n\treturn 0, false\n}\nfunc (s Src) Gop_Enum() *Cursor {\n\treturn {}\n}\nfor x <- Src{} {\n\tprintln x\n}\n";
  let output = common::lower_ok(text, |b| {
    src_type(b);

    b.line(2);
    let fields = b.struct_type(Vec::new());
    let decl = b.type_decl("Cursor", fields);
    b.root(decl);

    b.line(3);
    let int = b.named_type("int");
    let bool_ty = b.named_type("bool");
    let signature = b.func_type(Vec::new(), vec![int, bool_ty], false);
    b.line(4);
    let zero = b.int("0");
    let done = b.ident("false");
    let ret = b.ret(vec![zero, done]);
    b.line(3);
    let body = b.block(vec![ret]);
    let next = b.method_decl(("c", "Cursor", true), "Next", signature, body);
    b.root(next);

    b.line(6);
    let cursor = b.named_type("Cursor");
    let pointer = b.pointer_type(cursor);
    let signature = b.func_type(Vec::new(), vec![pointer], false);
    b.line(7);
    let empty = b.map_literal(Vec::new());
    let ret = b.ret(vec![empty]);
    b.line(6);
    let body = b.block(vec![ret]);
    let start = b.method_decl(("s", "Src", false), "Gop_Enum", signature, body);
    b.root(start);

    for_each_src(b, 9);
  });

  // The untyped `{}` completes to the pointer result.
  assert!(output.contains("\treturn &Cursor{}\n"), "{}", output);
  assert!(output.contains("\tfor _gop_it := (Src{}).Gop_Enum(); ; {\n"), "{}", output);
  assert_eq!(output.matches("Gop_Enum()").count(), 2, "{}", output);
  assert!(output.contains("\t\tx, _gop_ok := _gop_it.Next()\n"), "{}", output);
  assert!(output.contains("\t\tif !_gop_ok {\n\t\t\tbreak\n\t\t}\n"), "{}", output);
  assert!(output.contains("\t\tfmt.Println(x)\n"), "{}", output);
}

#[test]
fn push_iterator_takes_the_body_as_a_callback() {
  let text = "type Src struct{}\nfunc (s Src) Gop_Enum(f func(int)) {\n\tf(1)\n}\n\nfor x <- Src{} {\n\tprintln x\n}\n";
  let output = common::lower_ok(text, |b| {
    src_type(b);

    b.line(2);
    let int = b.named_type("int");
    let callback = b.func_type(vec![(None, int)], Vec::new(), false);
    let signature = b.func_type(vec![(Some("f"), callback)], Vec::new(), false);
    b.line(3);
    let f = b.ident("f");
    let one = b.int("1");
    let call = b.call(f, vec![one]);
    let statement = b.expr_stmt(call);
    b.line(2);
    let body = b.block(vec![statement]);
    let method = b.method_decl(("s", "Src", false), "Gop_Enum", signature, body);
    b.root(method);

    for_each_src(b, 6);
  });

  assert!(output.contains("func (s Src) Gop_Enum(f func(int)) {\n"), "{}", output);
  assert!(output.contains(".Gop_Enum(func(x int) {\n"), "{}", output);
  assert!(output.contains("\t\tfmt.Println(x)\n\t})\n"), "{}", output);
  assert!(!output.contains("_gop_it"));
}

#[test]
fn default_wrap_yields_the_fallback() {
  let text = "n := strconv.Atoi(\"x\")?:0\nprintln n\n";
  let output = common::lower_ok(text, |b| {
    let import = b.import("strconv");
    b.root(import);

    b.line(1).at("strconv.Atoi(\"x\")");
    let callee = b.path("strconv.Atoi");
    let arg = b.string("x");
    let call = b.call(callee, vec![arg]);
    b.line(1).at("0");
    let zero = b.int("0");
    b.line(1).at("strconv.Atoi(\"x\")?:0");
    let wrapped = b.error_wrap(call, ErrorWrapPolicy::Default(Some(zero)));
    b.line(1);
    let define = b.define(&["n"], vec![wrapped]);
    b.root(define);

    b.line(2);
    let n = b.ident("n");
    let statement = print_stmt(b, vec![n]);
    b.root(statement);
  });

  assert!(output.contains("\tn := func() (_gop_ret int) {\n"), "{}", output);
  assert!(output.contains("\t\tvar _gop_err error\n"), "{}", output);
  assert!(output.contains("\t\t_gop_ret, _gop_err = strconv.Atoi(\"x\")\n"), "{}", output);
  assert!(output.contains("\t\tif _gop_err != nil {\n\t\t\treturn 0\n\t\t}\n\t\treturn\n\t}()\n"), "{}", output);
  assert!(!output.contains("errors.NewFrame"));
}

#[test]
fn lambdas_take_their_types_from_the_parameter() {
  let text = "func apply(f func(int, int) int) int {\n\treturn f(1, 2)\n}\nfunc divmod(a int, b int) (int, int) {\n\treturn a / b, a % b\n}\nfunc both(f func() (int, int)) {\n\tprintln f()\n}\nprintln apply((x, y) => x + y)\nboth(() => divmod(7, 2))\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let left = b.named_type("int");
    let right = b.named_type("int");
    let result = b.named_type("int");
    let callback = b.func_type(vec![(None, left), (None, right)], vec![result], false);
    let result = b.named_type("int");
    let signature = b.func_type(vec![(Some("f"), callback)], vec![result], false);
    b.line(2);
    let f = b.ident("f");
    let args = vec![b.int("1"), b.int("2")];
    let call = b.call(f, args);
    let ret = b.ret(vec![call]);
    b.line(1);
    let body = b.block(vec![ret]);
    let apply = b.func_decl("apply", signature, body);
    b.root(apply);

    b.line(4);
    let a = b.named_type("int");
    let bt = b.named_type("int");
    let results = vec![b.named_type("int"), b.named_type("int")];
    let signature = b.func_type(vec![(Some("a"), a), (Some("b"), bt)], results, false);
    b.line(5);
    let quotient = {
      let a = b.ident("a");
      let bv = b.ident("b");
      b.binary(ASTBinaryOperator::Divide, a, bv)
    };
    let remainder = {
      let a = b.ident("a");
      let bv = b.ident("b");
      b.binary(ASTBinaryOperator::Modulo, a, bv)
    };
    let ret = b.ret(vec![quotient, remainder]);
    b.line(4);
    let body = b.block(vec![ret]);
    let divmod = b.func_decl("divmod", signature, body);
    b.root(divmod);

    b.line(7);
    let results = vec![b.named_type("int"), b.named_type("int")];
    let producer = b.func_type(Vec::new(), results, false);
    let signature = b.func_type(vec![(Some("f"), producer)], Vec::new(), false);
    b.line(8);
    let f = b.ident("f");
    let call = b.call(f, Vec::new());
    let print = print_stmt(b, vec![call]);
    b.line(7);
    let body = b.block(vec![print]);
    let both = b.func_decl("both", signature, body);
    b.root(both);

    b.line(10).at("(x, y) => x + y");
    let x = b.ident("x");
    let y = b.ident("y");
    let sum = b.binary(ASTBinaryOperator::Add, x, y);
    let lambda = b.lambda(&["x", "y"], vec![sum]);
    b.line(10).at("apply((x, y) => x + y)");
    let callee = b.ident("apply");
    let call = b.call(callee, vec![lambda]);
    b.line(10);
    let statement = print_stmt(b, vec![call]);
    b.root(statement);

    b.line(11).at("() => divmod(7, 2)");
    let callee = b.ident("divmod");
    let args = vec![b.int("7"), b.int("2")];
    let inner = b.call(callee, args);
    let lambda = b.lambda(&[], vec![inner]);
    b.line(11);
    let callee = b.ident("both");
    let call = b.call(callee, vec![lambda]);
    let statement = b.expr_stmt(call);
    b.root(statement);
  });

  assert!(output.contains("\tfmt.Println(apply(func(x int, y int) int {\n"), "{}", output);
  assert!(output.contains("\t\treturn x + y\n\t}))\n"), "{}", output);
  // One expression producing both results is returned as is.
  assert!(output.contains("\tboth(func() (int, int) {\n"), "{}", output);
  assert!(output.contains("\t\treturn divmod(7, 2)\n\t})\n"), "{}", output);
  assert!(output.contains("\tfmt.Println(f())\n"), "{}", output);
}

#[test]
fn auto_properties_chain_into_calls() {
  let text = "type Node struct{}\nfunc (n *Node) Parent() *Node {\n\treturn n\n}\nfunc (n *Node) Label() string {\n\treturn \"node\"\n}\nfunc root() *Node {\n\treturn {}\n}\nn := root()\nprintln n.parent.parent.label\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let fields = b.struct_type(Vec::new());
    let decl = b.type_decl("Node", fields);
    b.root(decl);

    b.line(2);
    let node = b.named_type("Node");
    let pointer = b.pointer_type(node);
    let signature = b.func_type(Vec::new(), vec![pointer], false);
    b.line(3);
    let n = b.ident("n");
    let ret = b.ret(vec![n]);
    b.line(2);
    let body = b.block(vec![ret]);
    let parent = b.method_decl(("n", "Node", true), "Parent", signature, body);
    b.root(parent);

    b.line(5);
    let string = b.named_type("string");
    let signature = b.func_type(Vec::new(), vec![string], false);
    b.line(6);
    let label = b.string("node");
    let ret = b.ret(vec![label]);
    b.line(5);
    let body = b.block(vec![ret]);
    let label = b.method_decl(("n", "Node", true), "Label", signature, body);
    b.root(label);

    b.line(8);
    let node = b.named_type("Node");
    let pointer = b.pointer_type(node);
    let signature = b.func_type(Vec::new(), vec![pointer], false);
    b.line(9);
    let empty = b.map_literal(Vec::new());
    let ret = b.ret(vec![empty]);
    b.line(8);
    let body = b.block(vec![ret]);
    let root = b.func_decl("root", signature, body);
    b.root(root);

    b.line(11);
    let callee = b.ident("root");
    let call = b.call(callee, Vec::new());
    let define = b.define(&["n"], vec![call]);
    b.root(define);

    b.line(12).at("n.parent.parent.label");
    let n = b.ident("n");
    let first = b.member(n, "parent");
    let second = b.member(first, "parent");
    let label = b.member(second, "label");
    b.line(12);
    let statement = print_stmt(b, vec![label]);
    b.root(statement);
  });

  assert!(output.contains("\treturn &Node{}\n"), "{}", output);
  assert!(output.contains("\tfmt.Println(n.Parent().Parent().Label())\n"), "{}", output);
}

#[test]
fn ambiguous_commands_follow_the_head() {
  let text = "func neg(n int) int {\n\treturn -n\n}\nx := 2\ny := neg -x\nz := y -x\nprintln y, z\n";
  let output = common::lower_ok(text, |b| {
    b.line(1);
    let int = b.named_type("int");
    let result = b.named_type("int");
    let signature = b.func_type(vec![(Some("n"), int)], vec![result], false);
    b.line(2);
    let n = b.ident("n");
    let negated = b.unary(ASTUnaryOperator::Negate, n);
    let ret = b.ret(vec![negated]);
    b.line(1);
    let body = b.block(vec![ret]);
    let function = b.func_decl("neg", signature, body);
    b.root(function);

    b.line(4);
    let two = b.int("2");
    let define = b.define(&["x"], vec![two]);
    b.root(define);

    for (line, name, head) in [(5, "y", "neg"), (6, "z", "y")] {
      b.line(line);
      let head = b.ident(head);
      let x = b.ident("x");
      let command = b.ambiguous_command(head, ASTUnaryOperator::Negate, x);
      let define = b.define(&[name], vec![command]);
      b.root(define);
    }

    b.line(7);
    let args = vec![b.ident("y"), b.ident("z")];
    let statement = print_stmt(b, args);
    b.root(statement);
  });

  // A callable head takes the operand as its argument; a value subtracts it.
  assert!(output.contains("\ty := neg(-x)\n"), "{}", output);
  assert!(output.contains("\tz := y - x\n"), "{}", output);
}

#[test]
fn return_wraps_get_distinct_temporaries() {
  let text = "func sum(a string, b string) (int, error) {\n\tn := strconv.Atoi(a)? + strconv.Atoi(b)?\n\treturn n, nil\n}\n";
  let output = common::lower_ok(text, |b| {
    let import = b.import("strconv");
    b.root(import);

    b.line(1);
    let string = b.named_type("string");
    let other = b.named_type("string");
    let int = b.named_type("int");
    let error = b.named_type("error");
    let signature = b.func_type(vec![(Some("a"), string), (Some("b"), other)], vec![int, error], false);

    let mut wraps = Vec::new();
    for name in ["a", "b"] {
      b.line(2).at(&format!("strconv.Atoi({})", name));
      let callee = b.path("strconv.Atoi");
      let arg = b.ident(name);
      let call = b.call(callee, vec![arg]);
      b.line(2).at(&format!("strconv.Atoi({})?", name));
      wraps.push(b.error_wrap(call, ErrorWrapPolicy::Return));
    }
    b.line(2).at("strconv.Atoi(a)? + strconv.Atoi(b)?");
    let sum = b.binary(ASTBinaryOperator::Add, wraps[0], wraps[1]);
    b.line(2);
    let define = b.define(&["n"], vec![sum]);

    b.line(3);
    let n = b.ident("n");
    let nil = b.ident("nil");
    let ret = b.ret(vec![n, nil]);

    b.line(1);
    let body = b.block(vec![define, ret]);
    let function = b.func_decl("sum", signature, body);
    b.root(function);
  });

  assert!(output.contains("\tvar _autoGo_1 int\n"), "{}", output);
  assert!(output.contains("\t\t_autoGo_1, _gop_err = strconv.Atoi(a)\n"), "{}", output);
  assert!(output.contains("\t\tgoto _autoGo_2\n\t_autoGo_2:\n"), "{}", output);
  assert!(output.contains("\tvar _autoGo_3 int\n"), "{}", output);
  assert!(output.contains("\t\t_autoGo_3, _gop_err = strconv.Atoi(b)\n"), "{}", output);
  assert!(output.contains("\t\tgoto _autoGo_4\n\t_autoGo_4:\n"), "{}", output);
  assert!(output.contains("\tn := _autoGo_1 + _autoGo_3\n"), "{}", output);
  let position = |needle: &str| output.find(needle).unwrap_or(usize::MAX);
  assert!(position("_autoGo_2:") < position("var _autoGo_3 int"));
}
