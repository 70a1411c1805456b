mod common;

use kestrel_ast::builder::SurfaceBuilder;
use kestrel_lower::DeclKind;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum TopLevel {
  Var(u32),
  Const(u32),
  Type,
  Func,
  Print(u32),
}

fn top_level() -> impl Strategy<Value = TopLevel> {
  prop_oneof![
    (0u32..1000).prop_map(TopLevel::Var),
    (0u32..1000).prop_map(TopLevel::Const),
    Just(TopLevel::Type),
    Just(TopLevel::Func),
    (0u32..1000).prop_map(TopLevel::Print),
  ]
}

/// Source text with one line per item; names are unique by line.
fn source(items: &[TopLevel]) -> String {
  let mut text = String::new();
  for (i, item) in items.iter().enumerate() {
    let line = match item {
      TopLevel::Var(value) => format!("var v{} = {}", i, value),
      TopLevel::Const(value) => format!("const c{} = {}", i, value),
      TopLevel::Type => format!("type T{} int", i),
      TopLevel::Func => format!("func f{}() {{}}", i),
      TopLevel::Print(value) => format!("println {}", value),
    };
    text.push_str(&line);
    text.push('\n');
  }
  text
}

fn build(
  b: &mut SurfaceBuilder,
  items: &[TopLevel],
) {
  for (i, item) in items.iter().enumerate() {
    b.line(i as u32 + 1);
    let root = match item {
      TopLevel::Var(value) => {
        let name = format!("v{}", i);
        let value = b.int(&value.to_string());
        b.var_decl(&[name.as_str()], None, vec![value])
      },
      TopLevel::Const(value) => {
        let name = format!("c{}", i);
        let value = b.int(&value.to_string());
        b.const_decl(&[name.as_str()], None, vec![value])
      },
      TopLevel::Type => {
        let int = b.named_type("int");
        b.type_decl(&format!("T{}", i), int)
      },
      TopLevel::Func => {
        let signature = b.func_type(Vec::new(), Vec::new(), false);
        let body = b.block(Vec::new());
        b.func_decl(&format!("f{}", i), signature, body)
      },
      TopLevel::Print(value) => {
        let head = b.ident("println");
        let value = b.int(&value.to_string());
        let command = b.command(head, vec![value]);
        b.expr_stmt(command)
      },
    };
    b.root(root);
  }
}

fn bucket(kind: &DeclKind) -> usize {
  match kind {
    DeclKind::Type => 0,
    DeclKind::Const | DeclKind::Var => 1,
    DeclKind::Func | DeclKind::Method => 2,
    DeclKind::Entry => 3,
  }
}

proptest! {
    /// Lowering the same unit twice renders the same file.
    #[test]
    fn output_is_deterministic(items in prop::collection::vec(top_level(), 0..12)) {
        let text = source(&items);
        let first = common::lower_ok(&text, |b| build(b, &items));
        let second = common::lower_ok(&text, |b| build(b, &items));
        prop_assert_eq!(first, second);
    }

    /// Declarations come out grouped by kind with source order kept inside a group.
    #[test]
    fn declarations_are_grouped(items in prop::collection::vec(top_level(), 0..12)) {
        let text = source(&items);
        let output = match common::lower(&text, |b| build(b, &items)) {
            Ok(output) => output,
            Err(diagnostics) => panic!("{}", common::format_diagnostics(&diagnostics)),
        };

        let buckets: Vec<usize> = output.declarations.iter().map(|record| bucket(&record.kind)).collect();
        prop_assert!(buckets.windows(2).all(|pair| pair[0] <= pair[1]));

        for pair in output.declarations.windows(2) {
            if bucket(&pair[0].kind) == bucket(&pair[1].kind) && !pair[1].synthesized {
                prop_assert!(pair[0].span.start <= pair[1].span.start);
            }
        }
    }

    /// Every statement line gets exactly one marker.
    #[test]
    fn one_marker_per_statement_line(values in prop::collection::vec(0u32..1000, 1..8)) {
        let items: Vec<TopLevel> = values.into_iter().map(TopLevel::Print).collect();
        let text = source(&items);
        let output = common::lower_ok(&text, |b| build(b, &items));

        for line in 1..=items.len() {
            let marker = format!("//line {}:{}:1\n", common::PATH, line);
            prop_assert_eq!(output.matches(&marker).count(), 1);
        }
    }
}
