//! The `debug` map: reference counts, scopes, the call stack and raw
//! access to operation handlers.

use crate::map::map_of;
use crate::object::{NativeFunction, NativeKind, Object, Payload};
use crate::ops::{arg, new_buffer, Op, TypeFlags};
use crate::{SolResult, State};

/// References held by the `debug` call itself: the caller's argument
/// list and the dispatcher's copy of it.
const CALL_REFS: i64 = 2;

pub(super) fn debug_functions() -> Object {
    map_of([
        ("getref", Object::cfunction("debug.getref", getref)),
        ("setref", Object::cfunction("debug.setref", setref)),
        ("closure", Object::cfunction("debug.closure", closure)),
        ("globals", Object::cfunction("debug.globals", globals)),
        ("locals", Object::cfunction("debug.locals", locals)),
        ("scopes", Object::cfunction("debug.scopes", scopes)),
        ("fnstack", Object::cfunction("debug.fnstack", fnstack)),
        ("getops", Object::cfunction("debug.getops", getops)),
    ])
}

fn refs(obj: &Object) -> i64 {
    i64::try_from(obj.ref_count()).unwrap_or(i64::MAX)
}

fn getref(state: &mut State, args: &[Object]) -> SolResult {
    let Some(obj) = args.first() else {
        return Ok(state.none());
    };
    Ok(Object::int(refs(obj) - CALL_REFS))
}

/// Move the count toward `n` by pinning or releasing references held by
/// the state. Only pinned references can be released.
fn setref(state: &mut State, args: &[Object]) -> SolResult {
    let Some(obj) = args.first() else {
        return Ok(state.none());
    };
    let wanted = state.to_int(&arg(state, args, 1))?.saturating_add(CALL_REFS);
    let current = refs(obj);
    let delta = usize::try_from(wanted.abs_diff(current)).unwrap_or(usize::MAX);
    if wanted > current {
        state.pin(obj, delta);
    } else {
        state.unpin(obj, delta);
    }
    Ok(state.none())
}

fn closure(state: &mut State, args: &[Object]) -> SolResult {
    let closure = match &*arg(state, args, 0).borrow() {
        Payload::Function(function) => Some(function.closure.clone()),
        _ => None,
    };
    Ok(closure.unwrap_or_else(|| state.none()))
}

fn globals(state: &mut State, _args: &[Object]) -> SolResult {
    Ok(state.globals())
}

fn locals(state: &mut State, _args: &[Object]) -> SolResult {
    Ok(state.locals())
}

fn scopes(state: &mut State, _args: &[Object]) -> SolResult {
    Ok(state.scopes())
}

fn fnstack(state: &mut State, _args: &[Object]) -> SolResult {
    Ok(state.fnstack())
}

/// The handler table of the argument's type: `name`, `flags` and one
/// callable per operation.
fn getops(state: &mut State, args: &[Object]) -> SolResult {
    let ty = arg(state, args, 0).ty();
    let ops = map_of(Op::ALL.iter().map(|&op| {
        let handler = Object::new(Payload::CFunction(NativeFunction {
            name: op.name().to_owned(),
            kind: NativeKind::Handler(ty, op),
        }));
        (op.name(), handler)
    }));
    let name = new_buffer(state, ty.name().as_bytes())?;
    state.map_set_name(&ops, "name", name);
    let flags = i64::from(TypeFlags::of(ty).bits());
    state.map_set_name(&ops, "flags", Object::int(flags));
    Ok(ops)
}
