//! Integer and float handlers.
//!
//! Binary operations coerce the right operand to the left operand's type
//! through its conversion handler. Integer arithmetic wraps.

use std::cmp::Ordering;

use super::{arg, Handler, Op};
use crate::errors;
use crate::object::Object;
use crate::{SolResult, State};

pub(super) fn int_handler(op: Op) -> Option<Handler> {
    match op {
        Op::Add => Some(int_add),
        Op::Sub => Some(int_sub),
        Op::Mul => Some(int_mul),
        Op::Div => Some(int_div),
        Op::Mod => Some(int_mod),
        Op::Pow => Some(int_pow),
        Op::BAnd => Some(int_band),
        Op::BOr => Some(int_bor),
        Op::BXor => Some(int_bxor),
        Op::BLsh => Some(int_blsh),
        Op::BRsh => Some(int_brsh),
        Op::BNot => Some(int_bnot),
        Op::Cmp => Some(int_cmp),
        Op::ToInt => Some(identity),
        Op::ToFloat => Some(int_tofloat),
        Op::ToString => Some(int_tostring),
        Op::TBang
        | Op::Call
        | Op::Index
        | Op::SetIndex
        | Op::Len
        | Op::Iter
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

pub(super) fn float_handler(op: Op) -> Option<Handler> {
    match op {
        Op::Add => Some(float_add),
        Op::Sub => Some(float_sub),
        Op::Mul => Some(float_mul),
        Op::Div => Some(float_div),
        Op::Pow => Some(float_pow),
        Op::Cmp => Some(float_cmp),
        Op::ToInt => Some(float_toint),
        Op::ToFloat => Some(identity),
        Op::ToString => Some(float_tostring),
        Op::Mod
        | Op::TBang
        | Op::BAnd
        | Op::BOr
        | Op::BXor
        | Op::BLsh
        | Op::BRsh
        | Op::BNot
        | Op::Call
        | Op::Index
        | Op::SetIndex
        | Op::Len
        | Op::Iter
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

fn identity(state: &mut State, args: &[Object]) -> SolResult {
    Ok(arg(state, args, 0))
}

// Integers

/// Both operands as ints, the right one coerced.
fn int_operands(state: &mut State, args: &[Object]) -> SolResult<(i64, i64)> {
    let lhs = arg(state, args, 0);
    let rhs = arg(state, args, 1);
    let a = state.to_int(&lhs)?;
    let b = state.to_int(&rhs)?;
    Ok((a, b))
}

fn int_binary(state: &mut State, args: &[Object], f: fn(i64, i64) -> i64) -> SolResult {
    let (a, b) = int_operands(state, args)?;
    Ok(Object::int(f(a, b)))
}

fn int_add(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, i64::wrapping_add)
}

fn int_sub(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, i64::wrapping_sub)
}

fn int_mul(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, i64::wrapping_mul)
}

fn int_div(state: &mut State, args: &[Object]) -> SolResult {
    let (a, b) = int_operands(state, args)?;
    if b == 0 {
        return Err(state.raise(errors::integer_divide_by_zero()));
    }
    Ok(Object::int(a.wrapping_div(b)))
}

fn int_mod(state: &mut State, args: &[Object]) -> SolResult {
    let (a, b) = int_operands(state, args)?;
    if b == 0 {
        return Err(state.raise(errors::integer_modulus_by_zero()));
    }
    Ok(Object::int(a.wrapping_rem(b)))
}

fn int_pow(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, wrapping_pow)
}

/// `base ** exp` by repeated squaring, wrapping on overflow. Negative
/// exponents give the truncated reciprocal.
fn wrapping_pow(base: i64, exp: i64) -> i64 {
    if exp < 0 {
        return match base {
            1 => 1,
            -1 if exp % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        };
    }
    let mut result: i64 = 1;
    let mut base = base;
    let mut exp = exp.unsigned_abs();
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

fn int_band(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, |a, b| a & b)
}

fn int_bor(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, |a, b| a | b)
}

fn int_bxor(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, |a, b| a ^ b)
}

fn shift_amount(b: i64) -> u32 {
    u32::try_from(b & 63).unwrap_or(0)
}

fn int_blsh(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, |a, b| a.wrapping_shl(shift_amount(b)))
}

fn int_brsh(state: &mut State, args: &[Object]) -> SolResult {
    int_binary(state, args, |a, b| a.wrapping_shr(shift_amount(b)))
}

fn int_bnot(state: &mut State, args: &[Object]) -> SolResult {
    let value = state.to_int(&arg(state, args, 0))?;
    Ok(Object::int(!value))
}

fn int_cmp(state: &mut State, args: &[Object]) -> SolResult {
    let a = arg(state, args, 0).as_int();
    let b = arg(state, args, 1).as_int();
    let result = match (a, b) {
        (Some(a), Some(b)) => ordering(a.cmp(&b)),
        _ => 1,
    };
    Ok(Object::int(result))
}

#[expect(
    clippy::cast_precision_loss,
    reason = "int to float conversion rounds like C"
)]
fn int_tofloat(state: &mut State, args: &[Object]) -> SolResult {
    let value = arg(state, args, 0).as_int().unwrap_or(0);
    Ok(Object::float(value as f64))
}

fn int_tostring(state: &mut State, args: &[Object]) -> SolResult {
    let value = arg(state, args, 0).as_int().unwrap_or(0);
    Ok(Object::string(value.to_string()))
}

fn ordering(ordering: Ordering) -> i64 {
    match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

// Floats

fn float_operands(state: &mut State, args: &[Object]) -> SolResult<(f64, f64)> {
    let lhs = arg(state, args, 0);
    let rhs = arg(state, args, 1);
    let a = state.to_float(&lhs)?;
    let b = state.to_float(&rhs)?;
    Ok((a, b))
}

fn float_binary(state: &mut State, args: &[Object], f: fn(f64, f64) -> f64) -> SolResult {
    let (a, b) = float_operands(state, args)?;
    Ok(Object::float(f(a, b)))
}

fn float_add(state: &mut State, args: &[Object]) -> SolResult {
    float_binary(state, args, |a, b| a + b)
}

fn float_sub(state: &mut State, args: &[Object]) -> SolResult {
    float_binary(state, args, |a, b| a - b)
}

fn float_mul(state: &mut State, args: &[Object]) -> SolResult {
    float_binary(state, args, |a, b| a * b)
}

fn float_div(state: &mut State, args: &[Object]) -> SolResult {
    let (a, b) = float_operands(state, args)?;
    if b == 0.0 {
        return Err(state.raise(errors::float_divide_by_zero()));
    }
    Ok(Object::float(a / b))
}

fn float_pow(state: &mut State, args: &[Object]) -> SolResult {
    float_binary(state, args, f64::powf)
}

fn float_cmp(state: &mut State, args: &[Object]) -> SolResult {
    let a = arg(state, args, 0).as_float();
    let b = arg(state, args, 1).as_float();
    let result = match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).map_or(1, ordering),
        _ => 1,
    };
    Ok(Object::int(result))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int conversion truncates toward zero"
)]
fn float_toint(state: &mut State, args: &[Object]) -> SolResult {
    let value = arg(state, args, 0).as_float().unwrap_or(0.0);
    Ok(Object::int(value as i64))
}

fn float_tostring(state: &mut State, args: &[Object]) -> SolResult {
    let value = arg(state, args, 0).as_float().unwrap_or(0.0);
    Ok(Object::string(format!("{value:.6}")))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
