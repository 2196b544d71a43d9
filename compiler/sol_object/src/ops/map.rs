//! Map and map-cell handlers, including the `__index`, `__setindex`,
//! `__call`, `__tostring` and `__repr` overrides.

use smallvec::SmallVec;

use super::{arg, handler as handler_for, Handler, Op};
use crate::errors;
use crate::iter;
use crate::map::map_len;
use crate::object::{Object, Payload};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::Add => Some(add),
        Op::Index => Some(index),
        Op::SetIndex => Some(setindex),
        Op::Call => Some(call),
        Op::Len => Some(len),
        Op::Iter => Some(iter),
        Op::ToString => Some(tostring),
        Op::Repr => Some(repr),
        Op::Sub
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
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Init
        | Op::Free => None,
    }
}

pub(super) fn mcell_handler(op: Op) -> Option<Handler> {
    match op {
        Op::ToString | Op::Repr => Some(mcell_render),
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
        | Op::Index
        | Op::SetIndex
        | Op::Len
        | Op::Iter
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Init
        | Op::Free => None,
    }
}

/// The override stored under `name`, if one is set.
fn meta(state: &State, map: &Object, name: &str) -> Option<Object> {
    state
        .map_get_name(map, name)
        .filter(|value| !state.is_none(value))
}

fn add(state: &mut State, args: &[Object]) -> SolResult {
    let other = arg(state, args, 1);
    let Some(extra) = other.cells() else {
        return Err(state.raise(errors::map_add_non_map()));
    };
    let own = arg(state, args, 0).cells().unwrap_or_default();
    let merged = Object::new(Payload::Map(
        own.iter()
            .filter_map(Object::cell_parts)
            .map(|(key, val)| Object::mcell(key, val))
            .collect(),
    ));
    for (key, val) in extra.iter().filter_map(Object::cell_parts) {
        state.map_set(&merged, &key, val)?;
    }
    Ok(merged)
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    let key = arg(state, args, 1);
    if let Some(value) = state.map_get(&map, &key)? {
        return Ok(value);
    }
    let Some(fallback) = meta(state, &map, "__index") else {
        return Ok(state.none());
    };
    if fallback.is_callable() {
        return state.call(&fallback, &[map, key]);
    }
    if handler_for(fallback.ty(), Op::Index).is_some() {
        return state.delegate(|state| state.index(&fallback, &key));
    }
    Ok(state.none())
}

fn setindex(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    let key = arg(state, args, 1);
    let value = arg(state, args, 2);
    match meta(state, &map, "__setindex") {
        Some(hook) if hook.is_callable() => {
            state.call(&hook, &[map, key, value])?;
        }
        Some(hook) if handler_for(hook.ty(), Op::SetIndex).is_some() => {
            state.delegate(|state| {
                state.set_index(&hook, &key, &value)?;
                Ok(state.none())
            })?;
        }
        _ => state.map_set(&map, &key, value)?,
    }
    Ok(state.none())
}

fn call(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    let Some(hook) = meta(state, &map, "__call") else {
        return Err(state.raise(errors::map_not_callable()));
    };
    let mut forwarded: SmallVec<[Object; 8]> = SmallVec::with_capacity(args.len());
    forwarded.push(map);
    forwarded.extend(args.iter().skip(1).cloned());
    state.call(&hook, &forwarded)
}

fn len(state: &mut State, args: &[Object]) -> SolResult {
    let len = map_len(&arg(state, args, 0));
    Ok(Object::int(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn iter(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(iter::stepper(iter::Stepper::Map))
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    match meta(state, &map, "__tostring") {
        Some(hook) if hook.is_callable() => state.call(&hook, &[map]),
        _ => repr(state, args),
    }
}

fn repr(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    if let Some(hook) = meta(state, &map, "__repr").filter(Object::is_callable) {
        return state.call(&hook, &[map]);
    }
    let text = state.guarded(&map, |state| {
        let parts = map
            .cells()
            .unwrap_or_default()
            .iter()
            .map(|cell| state.repr(cell))
            .collect::<SolResult<Vec<_>>>()?;
        Ok(format!("{{{}}}", parts.join(", ")))
    })?;
    Ok(Object::string(text))
}

fn mcell_render(state: &mut State, args: &[Object]) -> SolResult {
    let cell = arg(state, args, 0);
    let text = state.guarded(&cell, |state| {
        let Some((key, val)) = cell.cell_parts() else {
            return Ok("[] = ".to_owned());
        };
        let key = state.repr(&key)?;
        let val = state.repr(&val)?;
        Ok(format!("[{key}] = {val}"))
    })?;
    Ok(Object::string(text))
}
