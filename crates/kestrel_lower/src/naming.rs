//! Reserved spellings of generated code.

pub const RET: &str = "_gop_ret";
pub const ERR: &str = "_gop_err";
pub const OK: &str = "_gop_ok";
pub const ITER: &str = "_gop_it";
pub const TEMP_PREFIX: &str = "_autoGo_";

pub const ENUM: &str = "Gop_Enum";
pub const NEXT: &str = "Next";

pub const BLANK: &str = "_";

/// `_gop_ret`, `_gop_ret2`, `_gop_ret3`, ...
pub fn result_name(index: usize) -> String {
  if index == 0 {
    RET.to_string()
  } else {
    format!("{}{}", RET, index + 1)
  }
}

pub fn capitalize(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

pub fn is_exported(name: &str) -> bool {
  name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn result_names_skip_one() {
    assert_eq!(result_name(0), "_gop_ret");
    assert_eq!(result_name(1), "_gop_ret2");
  }

  #[test]
  fn capitalizes_first_char() {
    assert_eq!(capitalize("funcDecl"), "FuncDecl");
    assert!(is_exported("Atoi"));
    assert!(!is_exported("atoi"));
  }
}
