//! Operation table dispatch.
//!
//! Every type answers the same 26 protocol operations. [`handler`] resolves
//! `(type, op)` to a plain function: first through the type's own exhaustive
//! table, then through the defaults every type shares. A `None` answer is
//! the "not implemented" handler; [`State::dispatch`] turns it into the
//! `Undefined method` error.
//!
//! Handlers receive the argument list with the subject at `args[0]`. They
//! check payload types themselves, since scripts can hand any object to a
//! handler through `debug.getops`.

mod astnode;
mod buffer;
mod function;
mod library;
mod list;
mod map;
mod numeric;
mod singlet;
mod stream;
mod string;

use std::fmt;

use crate::errors::{self, SolResult};
use crate::object::{NativeFn, ObjType, Object};
use crate::State;

pub(crate) use self::buffer::{buffer_constructors, buffer_methods};
pub(crate) use self::library::ffi_open;
pub(crate) use self::list::list_methods;
pub(crate) use self::stream::{io_open, stream_methods};
pub(crate) use self::string::{parse_float_prefix, parse_int_prefix, string_methods};

/// A protocol operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// In-place identity swap.
    TBang,
    BAnd,
    BOr,
    BXor,
    BLsh,
    BRsh,
    BNot,
    Cmp,
    Call,
    Index,
    SetIndex,
    Len,
    Iter,
    ToInt,
    ToFloat,
    ToString,
    ToBuffer,
    Repr,
    Init,
    Free,
}

impl Op {
    pub const ALL: [Op; 26] = [
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Mod,
        Op::Pow,
        Op::TBang,
        Op::BAnd,
        Op::BOr,
        Op::BXor,
        Op::BLsh,
        Op::BRsh,
        Op::BNot,
        Op::Cmp,
        Op::Call,
        Op::Index,
        Op::SetIndex,
        Op::Len,
        Op::Iter,
        Op::ToInt,
        Op::ToFloat,
        Op::ToString,
        Op::ToBuffer,
        Op::Repr,
        Op::Init,
        Op::Free,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Pow => "pow",
            Op::TBang => "tbang",
            Op::BAnd => "band",
            Op::BOr => "bor",
            Op::BXor => "bxor",
            Op::BLsh => "blsh",
            Op::BRsh => "brsh",
            Op::BNot => "bnot",
            Op::Cmp => "cmp",
            Op::Call => "call",
            Op::Index => "index",
            Op::SetIndex => "setindex",
            Op::Len => "len",
            Op::Iter => "iter",
            Op::ToInt => "toint",
            Op::ToFloat => "tofloat",
            Op::ToString => "tostring",
            Op::ToBuffer => "tobuffer",
            Op::Repr => "repr",
            Op::Init => "init",
            Op::Free => "free",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type's implementation of one operation.
pub type Handler = NativeFn;

/// The handler for `op` on values of type `ty`.
pub fn handler(ty: ObjType, op: Op) -> Option<Handler> {
    let specific = match ty {
        ObjType::Singlet => singlet::handler(op),
        ObjType::Int => numeric::int_handler(op),
        ObjType::Float => numeric::float_handler(op),
        ObjType::Str => string::handler(op),
        ObjType::List => list::handler(op),
        ObjType::Map => map::handler(op),
        ObjType::MCell => map::mcell_handler(op),
        ObjType::Function => function::handler(op),
        ObjType::CFunction => function::cfunction_handler(op),
        ObjType::Stmt | ObjType::Expr => astnode::handler(op),
        ObjType::Buffer => buffer::handler(op),
        ObjType::DyLib => library::dylib_handler(op),
        ObjType::DySym => library::dysym_handler(op),
        ObjType::Stream => stream::handler(op),
    };
    specific.or_else(|| default_handler(op))
}

fn default_handler(op: Op) -> Option<Handler> {
    match op {
        Op::TBang => Some(default_tbang),
        Op::Cmp => Some(default_cmp),
        Op::ToString => Some(default_tostring),
        Op::ToBuffer => Some(default_tobuffer),
        Op::Repr => Some(default_repr),
        Op::Init | Op::Free => Some(no_op),
        Op::Add
        | Op::Sub
        | Op::Mul
        | Op::Div
        | Op::Mod
        | Op::Pow
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
        | Op::ToInt
        | Op::ToFloat => None,
    }
}

bitflags::bitflags! {
    /// Capabilities of a type, derived from its operation table.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        const CALLABLE = 1;
        const INDEXABLE = 1 << 1;
        const ITERABLE = 1 << 2;
        const SIZED = 1 << 3;
        /// Usable as an attribute name.
        const NAME = 1 << 4;
    }
}

impl TypeFlags {
    pub fn of(ty: ObjType) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        flags.set(TypeFlags::CALLABLE, handler(ty, Op::Call).is_some());
        flags.set(TypeFlags::INDEXABLE, handler(ty, Op::Index).is_some());
        flags.set(TypeFlags::ITERABLE, handler(ty, Op::Iter).is_some());
        flags.set(TypeFlags::SIZED, handler(ty, Op::Len).is_some());
        flags.set(TypeFlags::NAME, matches!(ty, ObjType::Str | ObjType::Buffer));
        flags
    }
}

// Shared helpers

/// Argument `index`, or `None` when the caller passed fewer.
pub(crate) fn arg(state: &State, args: &[Object], index: usize) -> Object {
    args.get(index).cloned().unwrap_or_else(|| state.none())
}

/// Argument `index` unless it is absent or `None`.
pub(crate) fn opt_arg(state: &State, args: &[Object], index: usize) -> Option<Object> {
    args.get(index).filter(|obj| !state.is_none(obj)).cloned()
}

/// An owned buffer object holding a copy of `bytes`.
pub(crate) fn new_buffer(state: &mut State, bytes: &[u8]) -> SolResult {
    match crate::buffer::Buffer::from_bytes(bytes) {
        Some(buffer) => Ok(Object::buffer(buffer)),
        None => Err(state.raise(errors::allocation_failed(bytes.len()))),
    }
}

/// `unit` repeated `times` times. Raises instead of aborting when the
/// result cannot be allocated.
pub(crate) fn repeat<T: Clone>(state: &mut State, unit: &[T], times: i64) -> SolResult<Vec<T>> {
    let times = usize::try_from(times).unwrap_or(0);
    if unit.is_empty() || times == 0 {
        return Ok(Vec::new());
    }
    let Some(total) = unit.len().checked_mul(times) else {
        return Err(state.raise(errors::allocation_failed(usize::MAX)));
    };
    let mut out = Vec::new();
    if out.try_reserve_exact(total).is_err() {
        let bytes = total.saturating_mul(std::mem::size_of::<T>());
        return Err(state.raise(errors::allocation_failed(bytes)));
    }
    for _ in 0..times {
        out.extend_from_slice(unit);
    }
    Ok(out)
}

/// Look `key` up in the method table of `ty`. `None` unless `key` is a name
/// naming a method.
pub(crate) fn method(state: &State, ty: ObjType, key: &Object) -> Object {
    let found = key.name_bytes().and_then(|name| {
        let methods = state.methods_for(ty)?;
        state.map_get_name(&methods, &String::from_utf8_lossy(&name))
    });
    found.unwrap_or_else(|| state.none())
}

/// Clamp a possibly negative `[low, high)` range to `0..len`, counting
/// negative bounds from the end.
pub(crate) fn clamp_range(low: i64, high: i64, len: usize) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let fix = |bound: i64| {
        let bound = if bound < 0 { bound + len_i } else { bound };
        usize::try_from(bound.clamp(0, len_i)).unwrap_or(0)
    };
    (fix(low), fix(high))
}

/// Split on any byte of `seps`, dropping empty parts (C `strtok`).
pub(crate) fn split_tokens<'a>(bytes: &'a [u8], seps: &[u8]) -> Vec<&'a [u8]> {
    bytes
        .split(|byte| seps.contains(byte))
        .filter(|part| !part.is_empty())
        .collect()
}

// Defaults

fn default_tbang(state: &mut State, args: &[Object]) -> SolResult {
    arg(state, args, 0).swap(&arg(state, args, 1));
    Ok(state.none())
}

fn default_cmp(state: &mut State, args: &[Object]) -> SolResult {
    let same = arg(state, args, 0).ptr_eq(&arg(state, args, 1));
    Ok(Object::int(i64::from(!same)))
}

fn default_tostring(state: &mut State, args: &[Object]) -> SolResult {
    let obj = arg(state, args, 0);
    Ok(Object::string(format!(
        "<{} object at {:#x}>",
        obj.ty().name(),
        obj.id()
    )))
}

fn default_repr(state: &mut State, args: &[Object]) -> SolResult {
    let obj = arg(state, args, 0);
    state.unary(Op::ToString, &obj)
}

fn default_tobuffer(state: &mut State, args: &[Object]) -> SolResult {
    let text = state.to_string(&arg(state, args, 0))?;
    new_buffer(state, text.as_bytes())
}

fn no_op(state: &mut State, _args: &[Object]) -> SolResult {
    Ok(state.none())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
