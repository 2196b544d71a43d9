//! String handlers and the `string` method table.
//!
//! Offsets and lengths are in bytes. A slice that splits a multi-byte
//! character is decoded lossily.

use super::{arg, clamp_range, method, new_buffer, opt_arg, repeat, split_tokens, Handler, Op};
use crate::iter;
use crate::map::map_of;
use crate::object::{ObjType, Object};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::Add => Some(add),
        Op::Mul => Some(mul),
        Op::Cmp => Some(cmp),
        Op::Len => Some(len),
        Op::Index => Some(index),
        Op::Iter => Some(iter),
        Op::ToInt => Some(toint),
        Op::ToFloat => Some(tofloat),
        Op::ToString => Some(tostring),
        Op::ToBuffer => Some(tobuffer),
        Op::Repr => Some(repr),
        Op::Sub
        | Op::Div
        | Op::Mod
        | Op::Pow
        | Op::TBang
        | Op::BAnd
        | Op::BOr
        | Op::BXor
        | Op::BLsh
        | Op::BRsh
        | Op::BNot
        | Op::Call
        | Op::SetIndex
        | Op::Init
        | Op::Free => None,
    }
}

/// The `string` method table.
pub(crate) fn string_methods() -> Object {
    map_of([
        ("sub", Object::cfunction("string.sub", sub)),
        ("split", Object::cfunction("string.split", split)),
        ("find", Object::cfunction("string.find", find)),
    ])
}

fn text(obj: &Object) -> String {
    obj.as_string().unwrap_or_default()
}

fn byte_string(bytes: &[u8]) -> Object {
    Object::string(String::from_utf8_lossy(bytes))
}

/// Integer prefix of `bytes`, like C `atoi`: leading whitespace, an
/// optional sign, then digits. 0 when there are none.
pub(crate) fn parse_int_prefix(bytes: &[u8]) -> i64 {
    let rest = trim_leading_space(bytes);
    let (negative, digits) = match rest.split_first() {
        Some((b'-', tail)) => (true, tail),
        Some((b'+', tail)) => (false, tail),
        _ => (false, rest),
    };
    let magnitude = digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0_i64, |acc, &digit| {
            acc.wrapping_mul(10).wrapping_add(i64::from(digit - b'0'))
        });
    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

/// Float prefix of `bytes`, like C `atof`. 0.0 when there is none.
pub(crate) fn parse_float_prefix(bytes: &[u8]) -> f64 {
    let rest = trim_leading_space(bytes);
    let mut end = 0;
    if matches!(rest.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_from = |start: usize| {
        start
            + rest
                .get(start..)
                .map_or(0, |tail| tail.iter().take_while(|b| b.is_ascii_digit()).count())
    };
    end = digits_from(end);
    if rest.get(end) == Some(&b'.') {
        end = digits_from(end + 1);
    }
    if matches!(rest.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(rest.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    std::str::from_utf8(&rest[..end])
        .ok()
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0.0)
}

fn trim_leading_space(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn add(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = text(&arg(state, args, 0));
    let rhs = state.to_string(&arg(state, args, 1))?;
    Ok(Object::string(lhs + &rhs))
}

fn mul(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = text(&arg(state, args, 0));
    let count = state.to_int(&arg(state, args, 1))?;
    let bytes = repeat(state, lhs.as_bytes(), count)?;
    Ok(Object::string(String::from_utf8_lossy(&bytes).into_owned()))
}

fn cmp(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = text(&arg(state, args, 0));
    let other = arg(state, args, 1);
    let rhs = match other.ty() {
        ObjType::Str => text(&other),
        ObjType::Buffer => state.to_string(&other)?,
        _ => return Ok(Object::int(1)),
    };
    Ok(Object::int(match lhs.as_bytes().cmp(rhs.as_bytes()) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }))
}

fn len(state: &mut State, args: &[Object]) -> SolResult {
    let len = text(&arg(state, args, 0)).len();
    Ok(Object::int(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let key = arg(state, args, 1);
    if key.ty() == ObjType::Str {
        return Ok(method(state, ObjType::Str, &key));
    }
    let value = text(&arg(state, args, 0));
    let offset = state.to_int(&key)?;
    let byte = usize::try_from(offset)
        .ok()
        .and_then(|offset| value.as_bytes().get(offset..=offset));
    Ok(byte_string(byte.unwrap_or_default()))
}

fn iter(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(iter::stepper(iter::Stepper::Str))
}

fn toint(state: &mut State, args: &[Object]) -> SolResult {
    let value = text(&arg(state, args, 0));
    Ok(Object::int(parse_int_prefix(value.as_bytes())))
}

fn tofloat(state: &mut State, args: &[Object]) -> SolResult {
    let value = text(&arg(state, args, 0));
    Ok(Object::float(parse_float_prefix(value.as_bytes())))
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    Ok(arg(state, args, 0))
}

fn tobuffer(state: &mut State, args: &[Object]) -> SolResult {
    let value = text(&arg(state, args, 0));
    new_buffer(state, value.as_bytes())
}

fn repr(state: &mut State, args: &[Object]) -> SolResult {
    let value = text(&arg(state, args, 0));
    Ok(Object::string(format!("\"{value}\"")))
}

// Methods

fn sub(state: &mut State, args: &[Object]) -> SolResult {
    let value = state.to_string(&arg(state, args, 0))?;
    let len = value.len();
    let low = match opt_arg(state, args, 1) {
        Some(low) => state.to_int(&low)?,
        None => 0,
    };
    let high = match opt_arg(state, args, 2) {
        Some(high) => state.to_int(&high)?,
        None => i64::try_from(len).unwrap_or(i64::MAX),
    };
    let (low, high) = clamp_range(low, high, len);
    if low >= high {
        return Ok(Object::string(""));
    }
    Ok(byte_string(&value.as_bytes()[low..high]))
}

fn split(state: &mut State, args: &[Object]) -> SolResult {
    let value = state.to_string(&arg(state, args, 0))?;
    let seps = state.to_string(&arg(state, args, 1))?;
    let parts = split_tokens(value.as_bytes(), seps.as_bytes());
    if parts.is_empty() {
        return Ok(state.none());
    }
    Ok(Object::list(parts.into_iter().map(byte_string).collect()))
}

fn find(state: &mut State, args: &[Object]) -> SolResult {
    let value = state.to_string(&arg(state, args, 0))?;
    let needle = state.to_string(&arg(state, args, 1))?;
    let offset = sol_rt::find_bytes(value.as_bytes(), needle.as_bytes())
        .and_then(|offset| i64::try_from(offset).ok())
        .unwrap_or(-1);
    Ok(Object::int(offset))
}
