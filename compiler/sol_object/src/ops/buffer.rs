//! Buffer handlers, the `buffer` method table and the `buffer` global map.
//!
//! Typed access goes through [`View`]: sized views bounds-check every
//! access, unsized views (only made by `fromaddress` and `ptr` reads)
//! trust the address.

use std::cmp::Ordering;

use sol_rt::{Format, Region, Scalar, View};

use super::{
    arg, clamp_range, method, new_buffer, opt_arg, parse_float_prefix, parse_int_prefix, repeat,
    split_tokens, Handler, Op,
};
use crate::buffer::Buffer;
use crate::errors;
use crate::iter;
use crate::map::map_of;
use crate::object::{ObjType, Object, Payload};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::Add => Some(add),
        Op::Mul => Some(mul),
        Op::Cmp => Some(cmp),
        Op::Index => Some(index),
        Op::Len => Some(len),
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

/// The `buffer` method table.
pub(crate) fn buffer_methods() -> Object {
    map_of([
        ("get", Object::cfunction("buffer.get", get)),
        ("set", Object::cfunction("buffer.set", set)),
        ("address", Object::cfunction("buffer.address", address)),
        ("size", Object::cfunction("buffer.size", size)),
        ("sub", Object::cfunction("buffer.sub", sub)),
        ("split", Object::cfunction("buffer.split", split)),
        ("find", Object::cfunction("buffer.find", find)),
    ])
}

/// The `buffer` global: constructors plus the `type` map of format codes.
pub(crate) fn buffer_constructors() -> Object {
    let formats = map_of(
        Format::ALL
            .iter()
            .map(|format| (format.name(), Object::int(format.code()))),
    );
    map_of([
        ("new", Object::cfunction("buffer.new", new)),
        ("fromstring", Object::cfunction("buffer.fromstring", fromstring)),
        ("fromobject", Object::cfunction("buffer.fromobject", fromobject)),
        ("fromaddress", Object::cfunction("buffer.fromaddress", fromaddress)),
        ("type", formats),
    ])
}

fn view_of(state: &mut State, obj: &Object) -> SolResult<View> {
    let view = match &*obj.borrow() {
        Payload::Buffer(buffer) => Some(buffer.view()),
        _ => None,
    };
    view.ok_or_else(|| state.raise(errors::type_mismatch(ObjType::Buffer, obj.ty())))
}

/// Copy of the bytes of a sized buffer; unsized is an error naming `action`.
fn sized_bytes(state: &mut State, obj: &Object, action: &'static str) -> SolResult<Vec<u8>> {
    let view = view_of(state, obj)?;
    match view.sized() {
        Some(region) => Ok(region.bytes().to_vec()),
        None => Err(state.raise(errors::unsized_buffer(action))),
    }
}

fn with_buffer<T>(obj: &Object, f: impl FnOnce(&Buffer) -> T) -> Option<T> {
    match &*obj.borrow() {
        Payload::Buffer(buffer) => Some(f(buffer)),
        _ => None,
    }
}

fn ordering(order: Ordering) -> i64 {
    match order {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "script integers carry raw addresses"
)]
fn to_address(value: i64) -> usize {
    value as usize
}

#[expect(clippy::cast_possible_wrap, reason = "addresses are shown as script integers")]
fn from_address(address: usize) -> i64 {
    address as i64
}

fn add(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = arg(state, args, 0);
    let mut joined = sized_bytes(state, &lhs, "Concatenate")?;
    let rhs = state.to_buffer(&arg(state, args, 1))?;
    joined.extend(sized_bytes(state, &rhs, "Concatenate")?);
    new_buffer(state, &joined)
}

fn mul(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = arg(state, args, 0);
    let bytes = sized_bytes(state, &lhs, "Repeat")?;
    let times = state.to_int(&arg(state, args, 1))?;
    let repeated = repeat(state, &bytes, times)?;
    new_buffer(state, &repeated)
}

fn cmp(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = arg(state, args, 0);
    let lhs = view_of(state, &lhs)?;
    let other = arg(state, args, 1);
    let other = match other.ty() {
        ObjType::Buffer => other,
        ObjType::Str => state.to_buffer(&other)?,
        _ => return Ok(Object::int(1)),
    };
    let rhs = view_of(state, &other)?;
    let order = match (lhs, rhs) {
        (View::Sized(a), View::Sized(b)) if a.len() != b.len() => 1,
        (View::Sized(a), View::Sized(b)) => ordering(a.bytes().cmp(b.bytes())),
        (View::Sized(a), View::Unsized(b)) => {
            ordering(a.bytes().cmp(b.assume_len(a.len()).bytes()))
        }
        (View::Unsized(a), View::Sized(b)) => {
            ordering(a.assume_len(b.len()).bytes().cmp(b.bytes()))
        }
        (View::Unsized(_), View::Unsized(_)) => 1,
    };
    Ok(Object::int(order))
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let key = arg(state, args, 1);
    if key.name_bytes().is_some() {
        return Ok(method(state, ObjType::Buffer, &key));
    }
    let view = view_of(state, &buffer)?;
    let at = state.to_int(&key)?;
    Ok(match view.offset(at) {
        Some(sub) => Object::buffer(Buffer::borrowed(sub).anchored(buffer)),
        None => state.none(),
    })
}

fn len(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let view = view_of(state, &buffer)?;
    Ok(Object::int(view.size()))
}

fn iter(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(iter::stepper(iter::Stepper::Buffer))
}

fn c_bytes(obj: &Object) -> Vec<u8> {
    with_buffer(obj, |buffer| buffer.c_bytes().map(<[u8]>::to_vec))
        .flatten()
        .unwrap_or_default()
}

fn toint(state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::int(parse_int_prefix(&c_bytes(&arg(state, args, 0)))))
}

fn tofloat(state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::float(parse_float_prefix(&c_bytes(&arg(state, args, 0)))))
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    let text = with_buffer(&arg(state, args, 0), Buffer::text).unwrap_or_default();
    Ok(Object::string(text))
}

fn tobuffer(state: &mut State, args: &[Object]) -> SolResult {
    Ok(arg(state, args, 0))
}

fn repr(state: &mut State, args: &[Object]) -> SolResult {
    let text = with_buffer(&arg(state, args, 0), Buffer::text).unwrap_or_default();
    Ok(Object::string(format!("'{text}'")))
}

// Methods

/// Format and offset arguments shared by `get` and `set`.
fn access(
    state: &mut State,
    args: &[Object],
    offset_at: usize,
) -> SolResult<(View, Option<Format>, i64)> {
    let buffer = arg(state, args, 0);
    let view = view_of(state, &buffer)?;
    let code = state.to_int(&arg(state, args, 1))?;
    let offset = match opt_arg(state, args, offset_at) {
        Some(offset) => state.to_int(&offset)?,
        None => 0,
    };
    Ok((view, Format::from_code(code), offset))
}

fn get(state: &mut State, args: &[Object]) -> SolResult {
    let (view, format, offset) = access(state, args, 2)?;
    let Some(scalar) = format.and_then(|format| view.get(format, offset)) else {
        return Ok(state.none());
    };
    Ok(match scalar {
        Scalar::Int(value) => Object::int(value),
        Scalar::Float(value) => Object::float(value),
        Scalar::Char(byte) => Object::string(String::from_utf8_lossy(&[byte])),
        Scalar::Bytes(bytes) => Object::string(String::from_utf8_lossy(&bytes)),
        Scalar::Address(address) => Object::buffer(Buffer::unsized_at(address)),
    })
}

fn set(state: &mut State, args: &[Object]) -> SolResult {
    let target = arg(state, args, 0);
    let (view, format, offset) = access(state, args, 3)?;
    let Some(format) = format else {
        return Ok(state.none());
    };
    let value = arg(state, args, 2);
    let scalar = match format {
        Format::Char => {
            let text = state.to_string(&value)?;
            Scalar::Char(text.bytes().next().unwrap_or(0))
        }
        Format::Float | Format::Double => Scalar::Float(state.to_float(&value)?),
        Format::CStr => Scalar::Bytes(state.to_string(&value)?.into_bytes()),
        Format::Ptr => match with_buffer(&value, Buffer::address) {
            Some(address) => Scalar::Address(address),
            None => Scalar::Address(to_address(state.to_int(&value)?)),
        },
        Format::UInt8
        | Format::UInt16
        | Format::UInt32
        | Format::UInt64
        | Format::Int8
        | Format::Int16
        | Format::Int32
        | Format::Int64
        | Format::Byte
        | Format::Int
        | Format::UInt
        | Format::Long
        | Format::ULong => Scalar::Int(state.to_int(&value)?),
    };
    let written = view.set(format, offset, &scalar);
    // A stored pointer to another buffer keeps that buffer alive.
    if written && format == Format::Ptr && value.ty() == ObjType::Buffer && !value.ptr_eq(&target) {
        if let Payload::Buffer(buffer) = &mut *target.borrow_mut() {
            buffer.anchor(value);
        }
    }
    Ok(state.none())
}

fn address(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let view = view_of(state, &buffer)?;
    Ok(Object::int(from_address(view.address())))
}

fn size(state: &mut State, args: &[Object]) -> SolResult {
    len(state, args)
}

fn sub(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let bytes = sized_bytes(state, &buffer, "Subrange")?;
    let low = match opt_arg(state, args, 1) {
        Some(low) => state.to_int(&low)?,
        None => 0,
    };
    let high = match opt_arg(state, args, 2) {
        Some(high) => state.to_int(&high)?,
        None => i64::try_from(bytes.len()).unwrap_or(i64::MAX),
    };
    let (low, high) = clamp_range(low, high, bytes.len());
    new_buffer(state, bytes.get(low..high).unwrap_or_default())
}

fn split(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let bytes = sized_bytes(state, &buffer, "split")?;
    let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
    let seps = state.to_string(&arg(state, args, 1))?;
    let parts = split_tokens(text, seps.as_bytes());
    if parts.is_empty() {
        return Ok(state.none());
    }
    Ok(Object::list(
        parts
            .into_iter()
            .map(|part| Object::string(String::from_utf8_lossy(part)))
            .collect(),
    ))
}

fn find(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let haystack = sized_bytes(state, &buffer, "find")?;
    let needle = state.to_buffer(&arg(state, args, 1))?;
    let needle = sized_bytes(state, &needle, "find")?;
    let offset = sol_rt::find_bytes(&haystack, &needle)
        .and_then(|offset| i64::try_from(offset).ok())
        .unwrap_or(-1);
    Ok(Object::int(offset))
}

// Constructors

fn new(state: &mut State, args: &[Object]) -> SolResult {
    let size = state.to_int(&arg(state, args, 0))?;
    let Ok(len) = usize::try_from(size) else {
        return Err(state.raise(errors::invalid_buffer_size(size)));
    };
    match Buffer::zeroed(len) {
        Some(buffer) => Ok(Object::buffer(buffer)),
        None => Err(state.raise(errors::allocation_failed(len))),
    }
}

fn fromstring(state: &mut State, args: &[Object]) -> SolResult {
    let mut bytes = state.to_string(&arg(state, args, 0))?.into_bytes();
    bytes.push(0);
    new_buffer(state, &bytes)
}

fn fromobject(state: &mut State, args: &[Object]) -> SolResult {
    let obj = arg(state, args, 0);
    let address = obj.id();
    Ok(Object::buffer(Buffer::with_resource_at(Box::new(obj), address)))
}

fn fromaddress(state: &mut State, args: &[Object]) -> SolResult {
    let address = to_address(state.to_int(&arg(state, args, 0))?);
    let size = state.to_int(&arg(state, args, 1))?;
    let buffer = match usize::try_from(size) {
        Ok(len) => Buffer::borrowed(View::Sized(Region::at_address(address, len))),
        Err(_) => Buffer::unsized_at(address),
    };
    Ok(Object::buffer(buffer))
}
