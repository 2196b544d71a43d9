//! Global builtin functions.

use crate::errors;
use crate::object::{ObjType, Object};
use crate::ops::{arg, new_buffer, opt_arg, Op};
use crate::{SolResult, State};

// Conversions dispatch on the subject with the full argument list.

pub(super) fn toint(state: &mut State, args: &[Object]) -> SolResult {
    state.dispatch(Op::ToInt, args)
}

pub(super) fn tofloat(state: &mut State, args: &[Object]) -> SolResult {
    state.dispatch(Op::ToFloat, args)
}

pub(super) fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    state.dispatch(Op::ToString, args)
}

pub(super) fn tobuffer(state: &mut State, args: &[Object]) -> SolResult {
    state.dispatch(Op::ToBuffer, args)
}

/// The type name of the argument, as a buffer.
pub(super) fn type_of(state: &mut State, args: &[Object]) -> SolResult {
    let name = arg(state, args, 0).ty().name();
    new_buffer(state, name.as_bytes())
}

/// `try(f, args...)`: `[1, result]`, or `[0, error, traceback]` with the
/// error slot cleared.
#[tracing::instrument(level = "debug", skip_all)]
pub(super) fn try_call(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let rest = args.get(1..).unwrap_or_default();
    match state.call(&callee, rest) {
        Ok(result) => Ok(Object::list(vec![Object::int(1), result])),
        Err(_) => {
            let (err, traceback) = state
                .take_error()
                .unwrap_or_else(|| (state.none(), Object::list(Vec::new())));
            tracing::debug!("try caught an error");
            Ok(Object::list(vec![Object::int(0), err, traceback]))
        }
    }
}

/// `apply(f, list, extra...)` calls `f(extra..., list...)`.
pub(super) fn apply(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let Some(spread) = arg(state, args, 1).items() else {
        return Err(state.raise(errors::apply_non_list()));
    };
    let mut forwarded: Vec<Object> = args.get(2..).unwrap_or_default().to_vec();
    forwarded.extend(spread);
    state.call(&callee, &forwarded)
}

/// Raise the argument itself as the pending error.
pub(super) fn error(state: &mut State, args: &[Object]) -> SolResult {
    let err = arg(state, args, 0);
    Err(state.set_error(err))
}

/// Render every argument with `render`, each followed by a space, and
/// print the line. One seen set covers the whole call.
fn print_with(
    state: &mut State,
    args: &[Object],
    render: fn(&mut State, &Object) -> SolResult<String>,
) -> SolResult {
    let line = state.with_seen(|state| {
        let mut line = String::new();
        for obj in args {
            line.push_str(&render(state, obj)?);
            line.push(' ');
        }
        Ok(line)
    })?;
    state.print_handler().println(&line);
    Ok(state.none())
}

pub(super) fn print(state: &mut State, args: &[Object]) -> SolResult {
    print_with(state, args, State::to_string)
}

pub(super) fn prepr(state: &mut State, args: &[Object]) -> SolResult {
    print_with(state, args, State::repr)
}

pub(super) fn rawget(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    if map.ty() != ObjType::Map {
        return Err(state.raise(errors::rawget_non_map()));
    }
    let key = arg(state, args, 1);
    Ok(state.map_get(&map, &key)?.unwrap_or_else(|| state.none()))
}

pub(super) fn rawset(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    if map.ty() != ObjType::Map {
        return Err(state.raise(errors::rawset_non_map()));
    }
    let key = arg(state, args, 1);
    let value = arg(state, args, 2);
    state.map_set(&map, &key, value)?;
    Ok(state.none())
}

/// `range(n)`: the list `[0, n)`.
pub(super) fn range(state: &mut State, args: &[Object]) -> SolResult {
    let bound = state.to_int(&arg(state, args, 0))?;
    Ok(Object::list((0..bound.max(0)).map(Object::int).collect()))
}

/// `ord(s, i = 0)`: the byte at `i`, counting negative `i` from the end.
pub(super) fn ord(state: &mut State, args: &[Object]) -> SolResult {
    let text = state.to_string(&arg(state, args, 0))?;
    let at = match opt_arg(state, args, 1) {
        Some(at) => state.to_int(&at)?,
        None => 0,
    };
    let len = i64::try_from(text.len()).unwrap_or(i64::MAX);
    let at = if at < 0 { at + len } else { at };
    let byte = usize::try_from(at)
        .ok()
        .and_then(|at| text.as_bytes().get(at).copied());
    match byte {
        Some(byte) => Ok(Object::int(i64::from(byte))),
        None => Err(state.raise(errors::ord_out_of_bounds())),
    }
}

/// `chr(n)`: a one-byte buffer holding the low byte of `n`.
pub(super) fn chr(state: &mut State, args: &[Object]) -> SolResult {
    let code = state.to_int(&arg(state, args, 0))?;
    new_buffer(state, &code.to_le_bytes()[..1])
}
