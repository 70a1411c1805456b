use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use ordered_float::OrderedFloat;

/// Decimal exponents past this are kept as `f64` instead of exact rationals.
const MAX_EXACT_EXPONENT: u32 = 1024;

/// Value of a compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
  Bool(bool),
  String(String),
  Int(BigInt),
  /// Exact non-integer value; decimal float literals land here.
  Rat(BigRational),
  Float(OrderedFloat<f64>),
  Complex(OrderedFloat<f64>, OrderedFloat<f64>),
}

impl ConstValue {
  pub fn int(n: i64) -> Self {
    ConstValue::Int(BigInt::from(n))
  }

  /// Parse a Go integer literal: decimal, `0x`, `0o`, `0b`, legacy octal, `_` separators.
  pub fn parse_int(raw: &str) -> Option<Self> {
    let clean: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();

    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
      (hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
      (oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
      (bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
      (&lower[1..], 8)
    } else {
      (lower.as_str(), 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
      return None;
    }

    BigInt::parse_bytes(digits.as_bytes(), radix).map(ConstValue::Int)
  }

  /// Parse a decimal float literal exactly when it fits, else approximately.
  pub fn parse_float(raw: &str) -> Option<Self> {
    let clean: String = raw.chars().filter(|c| *c != '_').collect();
    if let Some(exact) = parse_decimal_exact(&clean) {
      return Some(Self::from_rational(exact));
    }

    clean.parse::<f64>().ok().map(|f| ConstValue::Float(OrderedFloat(f)))
  }

  /// Parse a rune literal body such as `'a'` or `'\n'`.
  pub fn parse_rune(raw: &str) -> Option<Self> {
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;

    let value = if first == '\\' {
      match chars.next()? {
        'n' => '\n' as u32,
        't' => '\t' as u32,
        'r' => '\r' as u32,
        '0' => 0,
        '\\' => '\\' as u32,
        '\'' => '\'' as u32,
        'a' => 7,
        'b' => 8,
        'f' => 12,
        'v' => 11,
        'x' | 'u' | 'U' => u32::from_str_radix(chars.as_str(), 16).ok()?,
        _ => return None,
      }
    } else {
      first as u32
    };

    Some(ConstValue::Int(BigInt::from(value)))
  }

  pub fn as_rational(&self) -> Option<BigRational> {
    match self {
      ConstValue::Int(n) => Some(BigRational::from_integer(n.clone())),
      ConstValue::Rat(r) => Some(r.clone()),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      ConstValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      ConstValue::Int(n) => n.to_f64(),
      ConstValue::Rat(r) => r.to_f64(),
      ConstValue::Float(f) => Some(f.0),
      _ => None,
    }
  }

  /// Normalize a rational result: integral rationals become `Int`.
  pub fn from_rational(r: BigRational) -> Self {
    if r.is_integer() {
      ConstValue::Int(r.to_integer())
    } else {
      ConstValue::Rat(r)
    }
  }

  /// Whether the value has a representation in an integer of `bits` bits.
  pub fn fits_integer(
    &self,
    bits: u32,
    unsigned: bool,
  ) -> bool {
    let n = match self {
      ConstValue::Int(n) => n.clone(),
      ConstValue::Rat(r) if r.is_integer() => r.to_integer(),
      ConstValue::Float(f) if f.0.fract() == 0.0 => match BigInt::from_f64(f.0) {
        Some(n) => n,
        None => return false,
      },
      _ => return false,
    };

    if unsigned {
      !n.is_negative() && n.bits() <= u64::from(bits)
    } else {
      let limit = BigInt::one() << (bits - 1) as usize;
      n >= -limit.clone() && n < limit
    }
  }
}

fn parse_decimal_exact(raw: &str) -> Option<BigRational> {
  let lower = raw.to_ascii_lowercase();
  if lower.starts_with("0x") {
    return None;
  }

  let (mantissa, exponent) = match lower.split_once('e') {
    Some((m, e)) => (m, e.parse::<i64>().ok()?),
    None => (lower.as_str(), 0),
  };

  let (int_part, frac_part) = match mantissa.split_once('.') {
    Some((i, f)) => (i, f),
    None => (mantissa, ""),
  };

  let digits = format!("{}{}", int_part, frac_part);
  let num = if digits.is_empty() {
    BigInt::zero()
  } else if digits.chars().all(|c| c.is_ascii_digit()) {
    BigInt::parse_bytes(digits.as_bytes(), 10)?
  } else {
    return None;
  };

  let scale = exponent.checked_sub(frac_part.len() as i64)?;
  let magnitude = u32::try_from(scale.unsigned_abs()).ok()?;
  if magnitude > MAX_EXACT_EXPONENT {
    return None;
  }

  let pow = num_traits::pow(BigInt::from(10), magnitude as usize);
  if scale >= 0 {
    Some(BigRational::from_integer(num * pow))
  } else {
    Some(BigRational::new(num, pow))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ratio(
    num: i64,
    den: i64,
  ) -> BigRational {
    BigRational::new(BigInt::from(num), BigInt::from(den))
  }

  #[test]
  fn rationals_reduce() {
    let r = ratio(6, -4);
    assert_eq!((r.numer().clone(), r.denom().clone()), (BigInt::from(-3), BigInt::from(2)));
  }

  #[test]
  fn three_plus_half_is_seven_halves() {
    let sum = BigRational::from_integer(BigInt::from(3)) + ratio(1, 2);
    assert_eq!(sum.to_string(), "7/2");
  }

  #[test]
  fn parses_literal_forms() {
    assert_eq!(ConstValue::parse_int("0x1F"), Some(ConstValue::int(31)));
    assert_eq!(ConstValue::parse_int("1_000"), Some(ConstValue::int(1000)));
    assert_eq!(ConstValue::parse_int("017"), Some(ConstValue::int(15)));
    assert_eq!(ConstValue::parse_int("0x"), None);
    assert_eq!(ConstValue::parse_float("3.4"), Some(ConstValue::Rat(ratio(17, 5))));
    assert_eq!(ConstValue::parse_float("2.0"), Some(ConstValue::int(2)));
    assert_eq!(ConstValue::parse_rune("'a'"), Some(ConstValue::int(97)));
  }

  #[test]
  fn literals_past_128_bits_stay_exact() {
    let Some(ConstValue::Int(n)) = ConstValue::parse_int("170141183460469231731687303715884105728") else {
      panic!("expected an integer");
    };
    assert_eq!(n, BigInt::one() << 127usize);

    let Some(ConstValue::Int(n)) = ConstValue::parse_float("1e40") else {
      panic!("expected an integer");
    };
    assert_eq!(n.to_string(), format!("1{}", "0".repeat(40)));
  }

  #[test]
  fn integer_ranges() {
    assert!(ConstValue::int(127).fits_integer(8, false));
    assert!(!ConstValue::int(128).fits_integer(8, false));
    assert!(ConstValue::int(-128).fits_integer(8, false));
    assert!(!ConstValue::int(-1).fits_integer(64, true));
    assert!(ConstValue::Int(BigInt::from(u64::MAX)).fits_integer(64, true));
    assert!(!ConstValue::Int(BigInt::one() << 64usize).fits_integer(64, true));
    assert!(!ConstValue::Rat(ratio(1, 2)).fits_integer(64, false));
  }
}
