//! List handlers and the `list` method table.

use super::{arg, method, repeat, Handler, Op};
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
        Op::SetIndex => Some(setindex),
        Op::Len => Some(len),
        Op::Iter => Some(iter),
        Op::ToString | Op::Repr => Some(render),
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
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Init
        | Op::Free => None,
    }
}

/// The `list` method table.
pub(crate) fn list_methods() -> Object {
    map_of([
        ("copy", Object::cfunction("list.copy", copy)),
        ("insert", Object::cfunction("list.insert", insert)),
        ("remove", Object::cfunction("list.remove", remove)),
        ("truncate", Object::cfunction("list.truncate", truncate)),
        ("map", Object::cfunction("list.map", map)),
        ("filter", Object::cfunction("list.filter", filter)),
        ("reduce", Object::cfunction("list.reduce", reduce)),
    ])
}

fn items(obj: &Object) -> Vec<Object> {
    obj.items().unwrap_or_default()
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Position `index` refers to in a list of `len`, counting negative
/// indices from the end.
fn position(index: i64, len: usize) -> Option<usize> {
    let index = if index < 0 { index + count(len) } else { index };
    usize::try_from(index).ok().filter(|&index| index < len)
}

fn add(state: &mut State, args: &[Object]) -> SolResult {
    let other = arg(state, args, 1);
    let Some(tail) = other.items() else {
        return Err(state.raise(errors::list_add_non_list()));
    };
    let mut joined = items(&arg(state, args, 0));
    joined.extend(tail);
    Ok(Object::list(joined))
}

fn mul(state: &mut State, args: &[Object]) -> SolResult {
    let elements = items(&arg(state, args, 0));
    let times = state.to_int(&arg(state, args, 1))?;
    Ok(Object::list(repeat(state, &elements, times)?))
}

fn cmp(state: &mut State, args: &[Object]) -> SolResult {
    let lhs = items(&arg(state, args, 0));
    let Some(rhs) = arg(state, args, 1).items() else {
        return Ok(Object::int(1));
    };
    if lhs.len() != rhs.len() {
        return Ok(Object::int(if lhs.len() < rhs.len() { -1 } else { 1 }));
    }
    for (a, b) in lhs.iter().zip(&rhs) {
        let order = state.cmp(a, b)?;
        if order != 0 {
            return Ok(Object::int(order));
        }
    }
    Ok(Object::int(0))
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let key = arg(state, args, 1);
    if key.name_bytes().is_some() {
        return Ok(method(state, ObjType::List, &key));
    }
    let at = state.to_int(&key)?;
    let elements = items(&list);
    Ok(position(at, elements.len())
        .and_then(|at| elements.get(at).cloned())
        .unwrap_or_else(|| state.none()))
}

fn setindex(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let at = state.to_int(&arg(state, args, 1))?;
    let value = arg(state, args, 2);
    let old = match &mut *list.borrow_mut() {
        Payload::List(elements) => position(at, elements.len())
            .map(|at| std::mem::replace(&mut elements[at], value)),
        _ => None,
    };
    drop(old);
    Ok(state.none())
}

fn len(state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::int(count(items(&arg(state, args, 0)).len())))
}

fn iter(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(iter::stepper(iter::Stepper::List))
}

fn render(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let text = state.guarded(&list, |state| {
        let parts = items(&list)
            .iter()
            .map(|item| state.repr(item))
            .collect::<SolResult<Vec<_>>>()?;
        Ok(format!("[{}]", parts.join(", ")))
    })?;
    Ok(Object::string(text))
}

// Methods

fn copy(state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::list(items(&arg(state, args, 0))))
}

fn insert(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let at = state.to_int(&arg(state, args, 1))?;
    let value = arg(state, args, 2);
    if let Payload::List(elements) = &mut *list.borrow_mut() {
        let len = count(elements.len());
        let at = if at < 0 { at + len } else { at }.clamp(0, len);
        elements.insert(usize::try_from(at).unwrap_or(0), value);
    }
    Ok(state.none())
}

fn remove(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let at = state.to_int(&arg(state, args, 1))?;
    let removed = match &mut *list.borrow_mut() {
        Payload::List(elements) => position(at, elements.len()).map(|at| elements.remove(at)),
        _ => None,
    };
    Ok(removed.unwrap_or_else(|| state.none()))
}

fn truncate(state: &mut State, args: &[Object]) -> SolResult {
    let mut elements = items(&arg(state, args, 0));
    let keep = state.to_int(&arg(state, args, 1))?;
    elements.truncate(usize::try_from(keep).unwrap_or(0));
    Ok(Object::list(elements))
}

fn map(state: &mut State, args: &[Object]) -> SolResult {
    let f = arg(state, args, 1);
    let mapped = items(&arg(state, args, 0))
        .iter()
        .map(|item| state.call(&f, std::slice::from_ref(item)))
        .collect::<SolResult<Vec<_>>>()?;
    Ok(Object::list(mapped))
}

fn filter(state: &mut State, args: &[Object]) -> SolResult {
    let f = arg(state, args, 1);
    let mut kept = Vec::new();
    for item in items(&arg(state, args, 0)) {
        let verdict = state.call(&f, std::slice::from_ref(&item))?;
        if state.to_int(&verdict)? != 0 {
            kept.push(item);
        }
    }
    Ok(Object::list(kept))
}

fn reduce(state: &mut State, args: &[Object]) -> SolResult {
    let f = arg(state, args, 1);
    let mut acc = arg(state, args, 2);
    for item in items(&arg(state, args, 0)) {
        acc = state.call(&f, &[acc, item])?;
    }
    Ok(acc)
}
