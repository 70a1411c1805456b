//! Compile-time arithmetic on untyped constants.
//!
//! Integer and decimal constants are exact rationals; only values with no
//! exact representation fall back to `f64`. Division is exact whenever a
//! big-number operand takes part, so `1/2r` is one half.

use std::cmp::Ordering;

use kestrel_ast::expressions::{ASTBinaryOperator, ASTUnaryOperator};
use kestrel_type::{types::BasicKind, value::ConstValue};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use ordered_float::OrderedFloat;

/// Largest constant shift count; bigger shifts report an overflow.
const MAX_SHIFT: usize = 1 << 16;

/// Why a fold failed; callers turn this into a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
  DivisionByZero,
  Overflow,
  /// The operator does not apply to these constants.
  Invalid,
}

pub fn fold_binary(
  operator: ASTBinaryOperator,
  left: &ConstValue,
  right: &ConstValue,
  exact_division: bool,
) -> Result<ConstValue, FoldError> {
  use ASTBinaryOperator as Op;

  if let (ConstValue::Bool(a), ConstValue::Bool(b)) = (left, right) {
    return match operator {
      Op::And => Ok(ConstValue::Bool(*a && *b)),
      Op::Or => Ok(ConstValue::Bool(*a || *b)),
      Op::Equal => Ok(ConstValue::Bool(a == b)),
      Op::NotEqual => Ok(ConstValue::Bool(a != b)),
      _ => Err(FoldError::Invalid),
    };
  }

  if let (Some(a), Some(b)) = (left.as_rational(), right.as_rational()) {
    return fold_rational(operator, a, b, exact_division);
  }

  match (left.as_f64(), right.as_f64()) {
    (Some(a), Some(b)) => fold_float(operator, a, b),
    _ => Err(FoldError::Invalid),
  }
}

fn fold_rational(
  operator: ASTBinaryOperator,
  a: BigRational,
  b: BigRational,
  exact_division: bool,
) -> Result<ConstValue, FoldError> {
  use ASTBinaryOperator as Op;

  if operator.is_comparison() {
    return Ok(ConstValue::Bool(compare(operator, a.cmp(&b))));
  }

  let both_integers = a.is_integer() && b.is_integer();
  let result = match operator {
    Op::Add => a + b,
    Op::Subtract => a - b,
    Op::Multiply => a * b,
    Op::Divide => {
      if b.is_zero() {
        return Err(FoldError::DivisionByZero);
      }
      if both_integers && !exact_division {
        // Truncates toward zero, as Go does.
        BigRational::from_integer(a.to_integer() / b.to_integer())
      } else {
        a / b
      }
    },
    _ => {
      if !both_integers {
        return Err(FoldError::Invalid);
      }
      return fold_integer(operator, a.to_integer(), b.to_integer()).map(ConstValue::Int);
    },
  };

  Ok(ConstValue::from_rational(result))
}

fn fold_integer(
  operator: ASTBinaryOperator,
  a: BigInt,
  b: BigInt,
) -> Result<BigInt, FoldError> {
  use ASTBinaryOperator as Op;

  match operator {
    Op::Modulo if b.is_zero() => Err(FoldError::DivisionByZero),
    Op::Modulo => Ok(a % b),
    Op::BitAnd => Ok(a & b),
    Op::BitOr => Ok(a | b),
    Op::BitXor => Ok(a ^ b),
    Op::BitClear => Ok(a & !b),
    Op::ShiftLeft => Ok(a << shift_count(&b)?),
    Op::ShiftRight => Ok(a >> shift_count(&b)?),
    _ => Err(FoldError::Invalid),
  }
}

fn shift_count(count: &BigInt) -> Result<usize, FoldError> {
  if count.is_negative() {
    return Err(FoldError::Invalid);
  }
  match count.to_usize() {
    Some(shift) if shift <= MAX_SHIFT => Ok(shift),
    _ => Err(FoldError::Overflow),
  }
}

fn fold_float(
  operator: ASTBinaryOperator,
  a: f64,
  b: f64,
) -> Result<ConstValue, FoldError> {
  use ASTBinaryOperator as Op;

  if operator.is_comparison() {
    let ordering = a.partial_cmp(&b).ok_or(FoldError::Invalid)?;
    return Ok(ConstValue::Bool(compare(operator, ordering)));
  }

  let value = match operator {
    Op::Add => a + b,
    Op::Subtract => a - b,
    Op::Multiply => a * b,
    Op::Divide if b == 0.0 => return Err(FoldError::DivisionByZero),
    Op::Divide => a / b,
    _ => return Err(FoldError::Invalid),
  };

  if value.is_finite() {
    Ok(ConstValue::Float(OrderedFloat(value)))
  } else {
    Err(FoldError::Overflow)
  }
}

fn compare(
  operator: ASTBinaryOperator,
  ordering: Ordering,
) -> bool {
  use ASTBinaryOperator as Op;

  match operator {
    Op::Equal => ordering == Ordering::Equal,
    Op::NotEqual => ordering != Ordering::Equal,
    Op::LessThan => ordering == Ordering::Less,
    Op::LessThanOrEqual => ordering != Ordering::Greater,
    Op::GreaterThan => ordering == Ordering::Greater,
    Op::GreaterThanOrEqual => ordering != Ordering::Less,
    _ => false,
  }
}

pub fn fold_unary(
  operator: ASTUnaryOperator,
  operand: &ConstValue,
) -> Result<ConstValue, FoldError> {
  match (operator, operand) {
    (ASTUnaryOperator::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
    (ASTUnaryOperator::Plus, value) if value.as_f64().is_some() => Ok(value.clone()),
    (ASTUnaryOperator::Negate, ConstValue::Int(n)) => Ok(ConstValue::Int(-n.clone())),
    (ASTUnaryOperator::Negate, ConstValue::Rat(r)) => Ok(ConstValue::Rat(-r.clone())),
    (ASTUnaryOperator::Negate, ConstValue::Float(f)) => Ok(ConstValue::Float(OrderedFloat(-f.0))),
    (ASTUnaryOperator::BitNot, ConstValue::Int(n)) => Ok(ConstValue::Int(!n.clone())),
    _ => Err(FoldError::Invalid),
  }
}

/// Kind of the result of a binary operation on two untyped constants.
pub fn promote(
  left: BasicKind,
  right: BasicKind,
  value: &ConstValue,
) -> BasicKind {
  if matches!(value, ConstValue::Bool(_)) {
    return BasicKind::UntypedBool;
  }

  let big = |k: BasicKind| matches!(k, BasicKind::UntypedBigInt | BasicKind::UntypedBigRat);
  if big(left) || big(right) {
    let rational = left == BasicKind::UntypedBigRat
      || right == BasicKind::UntypedBigRat
      || left == BasicKind::UntypedFloat
      || right == BasicKind::UntypedFloat
      || matches!(value, ConstValue::Rat(_));
    return if rational {
      BasicKind::UntypedBigRat
    } else {
      BasicKind::UntypedBigInt
    };
  }

  if rank(left) >= rank(right) { left } else { right }
}

fn rank(kind: BasicKind) -> u8 {
  match kind {
    BasicKind::UntypedInt => 0,
    BasicKind::UntypedRune => 1,
    BasicKind::UntypedFloat => 2,
    BasicKind::UntypedComplex => 3,
    _ => 4,
  }
}

/// Whether `value` is representable in the basic type `kind`.
pub fn representable(
  value: &ConstValue,
  kind: BasicKind,
) -> bool {
  if let Some(bits) = kind.integer_bits() {
    return value.fits_integer(bits, kind.is_unsigned());
  }

  match kind {
    BasicKind::Float32 => value.as_f64().is_some_and(|f| f.abs() <= f32::MAX as f64),
    BasicKind::Float64 | BasicKind::Complex64 | BasicKind::Complex128 => {
      value.as_f64().is_some_and(f64::is_finite) || matches!(value, ConstValue::Complex(..))
    },
    BasicKind::Bool => matches!(value, ConstValue::Bool(_)),
    BasicKind::String => matches!(value, ConstValue::String(_)),
    _ => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn int(n: i64) -> ConstValue {
    ConstValue::int(n)
  }

  fn rat(
    num: i64,
    den: i64,
  ) -> ConstValue {
    ConstValue::Rat(BigRational::new(BigInt::from(num), BigInt::from(den)))
  }

  #[test]
  fn integer_division_truncates_unless_exact() {
    assert_eq!(fold_binary(ASTBinaryOperator::Divide, &int(7), &int(2), false), Ok(int(3)));
    assert_eq!(fold_binary(ASTBinaryOperator::Divide, &int(-7), &int(2), false), Ok(int(-3)));
    assert_eq!(fold_binary(ASTBinaryOperator::Divide, &int(1), &int(2), true), Ok(rat(1, 2)));
  }

  #[test]
  fn three_plus_half_promotes_to_bigrat() {
    let half = fold_binary(ASTBinaryOperator::Divide, &int(1), &int(2), true).unwrap();
    let kind = promote(BasicKind::UntypedInt, BasicKind::UntypedBigInt, &half);
    assert_eq!(kind, BasicKind::UntypedBigRat);

    let sum = fold_binary(ASTBinaryOperator::Add, &int(3), &half, true).unwrap();
    assert_eq!(sum, rat(7, 2));
  }

  #[test]
  fn division_by_zero_is_reported() {
    assert_eq!(
      fold_binary(ASTBinaryOperator::Divide, &int(1), &int(0), false),
      Err(FoldError::DivisionByZero)
    );
    assert_eq!(
      fold_binary(ASTBinaryOperator::Modulo, &int(1), &int(0), false),
      Err(FoldError::DivisionByZero)
    );
  }

  #[test]
  fn comparisons_fold_to_bool() {
    assert_eq!(
      fold_binary(ASTBinaryOperator::LessThan, &rat(1, 3), &rat(1, 2), false),
      Ok(ConstValue::Bool(true))
    );
    assert_eq!(
      promote(BasicKind::UntypedInt, BasicKind::UntypedInt, &ConstValue::Bool(true)),
      BasicKind::UntypedBool
    );
  }

  #[test]
  fn shifts_are_unbounded_up_to_the_count_limit() {
    assert_eq!(fold_binary(ASTBinaryOperator::ShiftLeft, &int(1), &int(10), false), Ok(int(1024)));

    let big = fold_binary(ASTBinaryOperator::ShiftLeft, &int(1), &int(200), false).unwrap();
    assert_eq!(big, ConstValue::Int(BigInt::from(1) << 200usize));
    assert_eq!(fold_binary(ASTBinaryOperator::ShiftRight, &big, &int(199), false), Ok(int(2)));

    assert_eq!(
      fold_binary(ASTBinaryOperator::ShiftLeft, &int(1), &int(1 << 20), false),
      Err(FoldError::Overflow)
    );
    assert_eq!(
      fold_binary(ASTBinaryOperator::ShiftLeft, &int(1), &int(-1), false),
      Err(FoldError::Invalid)
    );
  }

  #[test]
  fn wide_arithmetic_stays_exact() {
    let two_127 = ConstValue::Int(BigInt::from(1) << 127usize);
    let sum = fold_binary(ASTBinaryOperator::Add, &two_127, &two_127, false).unwrap();
    assert_eq!(sum, ConstValue::Int(BigInt::from(1) << 128usize));
    assert_eq!(fold_binary(ASTBinaryOperator::GreaterThan, &sum, &two_127, false), Ok(ConstValue::Bool(true)));
  }

  #[test]
  fn representability_by_width() {
    assert!(representable(&int(255), BasicKind::Uint8));
    assert!(!representable(&int(256), BasicKind::Uint8));
    assert!(!representable(&rat(1, 2), BasicKind::Int));
    assert!(representable(&rat(1, 2), BasicKind::Float64));
  }

  #[test]
  fn unary_folds() {
    assert_eq!(fold_unary(ASTUnaryOperator::Not, &ConstValue::Bool(true)), Ok(ConstValue::Bool(false)));
    assert_eq!(fold_unary(ASTUnaryOperator::Negate, &int(3)), Ok(int(-3)));
    assert_eq!(fold_unary(ASTUnaryOperator::BitNot, &int(0)), Ok(int(-1)));
    assert_eq!(fold_unary(ASTUnaryOperator::Not, &int(3)), Err(FoldError::Invalid));
  }
}
