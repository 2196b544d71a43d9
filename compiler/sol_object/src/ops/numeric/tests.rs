use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::wrapping_pow;
use crate::ops::Op;
use crate::{Object, State};

fn int_op(state: &mut State, op: Op, a: i64, b: i64) -> Option<i64> {
    state
        .binary(op, &Object::int(a), &Object::int(b))
        .ok()
        .and_then(|value| value.as_int())
}

#[test]
fn division_truncates_toward_zero() {
    let mut state = State::new();
    assert_eq!(int_op(&mut state, Op::Div, -7, 2), Some(-3));
    assert_eq!(int_op(&mut state, Op::Mod, -7, 2), Some(-1));
    assert_eq!(int_op(&mut state, Op::Div, i64::MIN, -1), Some(i64::MIN));
}

#[test]
fn division_by_zero_raises() {
    let mut state = State::new();
    assert!(state.binary(Op::Div, &Object::int(7), &Object::int(0)).is_err());
    assert_eq!(
        state.take_error().unwrap().0.as_string().unwrap(),
        "integer divide by zero"
    );
    assert!(state.binary(Op::Mod, &Object::int(7), &Object::int(0)).is_err());
    assert_eq!(
        state.take_error().unwrap().0.as_string().unwrap(),
        "integer modulus by zero"
    );
}

#[test]
fn right_operand_is_coerced() {
    let mut state = State::new();
    let sum = state
        .binary(Op::Add, &Object::int(2), &Object::string("40abc"))
        .unwrap();
    assert_eq!(sum.as_int(), Some(42));
    let sum = state
        .binary(Op::Add, &Object::int(2), &Object::float(1.9))
        .unwrap();
    assert_eq!(sum.as_int(), Some(3));
}

#[test]
fn negative_exponents() {
    assert_eq!(wrapping_pow(2, -1), 0);
    assert_eq!(wrapping_pow(1, -5), 1);
    assert_eq!(wrapping_pow(-1, -3), -1);
    assert_eq!(wrapping_pow(-1, -4), 1);
    assert_eq!(wrapping_pow(3, 4), 81);
    assert_eq!(wrapping_pow(5, 0), 1);
}

#[test]
fn shifts_mask_the_amount() {
    let mut state = State::new();
    assert_eq!(int_op(&mut state, Op::BLsh, 1, 65), Some(2));
    assert_eq!(int_op(&mut state, Op::BRsh, -8, 1), Some(-4));
}

#[test]
fn int_cmp_with_other_types_is_greater() {
    let mut state = State::new();
    assert_eq!(state.cmp(&Object::int(1), &Object::int(2)).unwrap(), -1);
    assert_eq!(state.cmp(&Object::int(2), &Object::int(2)).unwrap(), 0);
    assert_eq!(state.cmp(&Object::int(1), &Object::string("1")).unwrap(), 1);
}

#[test]
fn float_semantics() {
    let mut state = State::new();
    let quotient = state
        .binary(Op::Div, &Object::float(1.0), &Object::int(4))
        .unwrap();
    assert_eq!(quotient.as_float(), Some(0.25));
    assert!(state
        .binary(Op::Div, &Object::float(1.0), &Object::float(0.0))
        .is_err());
    assert_eq!(
        state.take_error().unwrap().0.as_string().unwrap(),
        "floating division by zero"
    );
    assert_eq!(state.to_string(&Object::float(1.5)).unwrap(), "1.500000");
    assert_eq!(state.to_int(&Object::float(-2.9)).unwrap(), -2);
    let nan = Object::float(f64::NAN);
    assert_eq!(state.cmp(&nan, &nan).unwrap(), 1);
}

#[test]
fn float_has_no_modulus() {
    let mut state = State::new();
    assert!(state
        .binary(Op::Mod, &Object::float(1.0), &Object::float(2.0))
        .is_err());
    assert_eq!(
        state.take_error().unwrap().0.as_string().unwrap(),
        "Undefined method (mod on float)"
    );
}

proptest! {
    #[test]
    fn int_arithmetic_matches_native(a in any::<i64>(), b in any::<i64>()) {
        let mut state = State::new();
        prop_assert_eq!(int_op(&mut state, Op::Add, a, b), Some(a.wrapping_add(b)));
        prop_assert_eq!(int_op(&mut state, Op::Sub, a, b), Some(a.wrapping_sub(b)));
        prop_assert_eq!(int_op(&mut state, Op::Mul, a, b), Some(a.wrapping_mul(b)));
        prop_assert_eq!(int_op(&mut state, Op::BXor, a, b), Some(a ^ b));
        if b != 0 {
            prop_assert_eq!(int_op(&mut state, Op::Div, a, b), Some(a.wrapping_div(b)));
            prop_assert_eq!(int_op(&mut state, Op::Mod, a, b), Some(a.wrapping_rem(b)));
        }
    }

    #[test]
    fn small_powers_match_native(base in -20_i64..20, exp in 0_u32..12) {
        prop_assert_eq!(wrapping_pow(base, i64::from(exp)), base.wrapping_pow(exp));
    }
}
