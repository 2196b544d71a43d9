//! Native library handles and the symbols resolved from them.
//!
//! Symbols are opaque: the runtime has no calling convention for them, so
//! every access on a `dysym` answers `None`.

use super::{arg, Handler, Op};
use crate::object::{Object, Payload};
use crate::{SolResult, State};

pub(super) fn dylib_handler(op: Op) -> Option<Handler> {
    match op {
        Op::Index => Some(dylib_index),
        Op::ToString => Some(dylib_tostring),
        Op::Add
        | Op::Sub
        | Op::Mul
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
        | Op::Cmp
        | Op::Call
        | Op::SetIndex
        | Op::Len
        | Op::Iter
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

pub(super) fn dysym_handler(op: Op) -> Option<Handler> {
    match op {
        Op::Call | Op::Index | Op::SetIndex => Some(dysym_access),
        Op::ToString => Some(dysym_tostring),
        Op::Add
        | Op::Sub
        | Op::Mul
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
        | Op::Cmp
        | Op::Len
        | Op::Iter
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

/// `ffi.open(path)`: a `dylib`, or `None` when no loader is attached or
/// the loader cannot open `path`.
pub(crate) fn ffi_open(state: &mut State, args: &[Object]) -> SolResult {
    let path = state.to_string(&arg(state, args, 0))?;
    let Some(loader) = state.loader() else {
        tracing::debug!(%path, "ffi.open without a library loader");
        return Ok(state.none());
    };
    match loader.open(&path) {
        Some(handle) => Ok(Object::new(Payload::DyLib { handle, path })),
        None => {
            tracing::debug!(%path, "library failed to open");
            Ok(state.none())
        }
    }
}

fn dylib_index(state: &mut State, args: &[Object]) -> SolResult {
    let library = arg(state, args, 0);
    let name = state.to_string(&arg(state, args, 1))?;
    let handle = match &*library.borrow() {
        Payload::DyLib { handle, .. } => Some(*handle),
        _ => None,
    };
    let address = handle
        .zip(state.loader())
        .and_then(|(handle, loader)| loader.symbol(handle, &name));
    Ok(match address {
        Some(address) => Object::new(Payload::DySym { address, name }),
        None => state.none(),
    })
}

fn dylib_tostring(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(Object::string("<DyLib>"))
}

fn dysym_access(state: &mut State, args: &[Object]) -> SolResult {
    if let Payload::DySym { name, address } = &*arg(state, args, 0).borrow() {
        tracing::warn!(symbol = %name, address, "native symbols cannot be called or indexed");
    }
    Ok(state.none())
}

fn dysym_tostring(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(Object::string("<DySym>"))
}
