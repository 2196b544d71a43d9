//! The iteration protocol.
//!
//! A container's `iter` operation returns a stepping function. The caller
//! supplies a scratch map and calls `step(container, scratch)` until it
//! answers `None`. All position state lives in the scratch map:
//!
//! - strings and buffers keep an integer offset in `idx` and the bound in
//!   `sz`;
//! - lists and maps keep a [`SeqCursor`] boxed in a buffer under `idx`.
//!   The cursor only weakly refers to its container and restarts when it is
//!   handed a different one.

use sol_rt::{Region, View};

use crate::buffer::Buffer;
use crate::map::map_of;
use crate::object::{Object, Payload, WeakObject};
use crate::ops::arg;
use crate::{SolResult, State};

/// Which stepping function to hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stepper {
    Str,
    Buffer,
    List,
    Map,
}

pub(crate) fn stepper(kind: Stepper) -> Object {
    match kind {
        Stepper::Str => Object::cfunction("iter.str", step_str),
        Stepper::Buffer => Object::cfunction("iter.buffer", step_buffer),
        Stepper::List => Object::cfunction("iter.list", step_list),
        Stepper::Map => Object::cfunction("iter.map", step_map),
    }
}

/// The `iter` global map.
pub(crate) fn iter_functions() -> Object {
    map_of([
        ("str", stepper(Stepper::Str)),
        ("buffer", stepper(Stepper::Buffer)),
        ("list", stepper(Stepper::List)),
        ("map", stepper(Stepper::Map)),
    ])
}

/// Position in a list or map.
struct SeqCursor {
    pos: usize,
    container: WeakObject,
}

fn int_slot(state: &State, scratch: &Object, name: &str) -> Option<i64> {
    state
        .map_get_name(scratch, name)
        .and_then(|value| value.as_int())
}

/// Offset and bound for a string or buffer walk, initialized on first use.
fn offsets(state: &State, scratch: &Object, len: i64) -> (i64, i64) {
    let idx = int_slot(state, scratch, "idx").unwrap_or(0);
    let sz = int_slot(state, scratch, "sz").unwrap_or(len);
    (idx, sz)
}

fn advance(state: &State, scratch: &Object, idx: i64, sz: i64) {
    state.map_set_name(scratch, "idx", Object::int(idx + 1));
    state.map_set_name(scratch, "sz", Object::int(sz));
}

fn step_str(state: &mut State, args: &[Object]) -> SolResult {
    let text = arg(state, args, 0).as_string().unwrap_or_default();
    let scratch = arg(state, args, 1);
    let len = i64::try_from(text.len()).unwrap_or(i64::MAX);
    let (idx, sz) = offsets(state, &scratch, len);
    let byte = usize::try_from(idx)
        .ok()
        .filter(|_| idx < sz)
        .and_then(|at| text.as_bytes().get(at..=at));
    let Some(byte) = byte else {
        return Ok(state.none());
    };
    advance(state, &scratch, idx, sz);
    Ok(Object::string(String::from_utf8_lossy(byte)))
}

fn step_buffer(state: &mut State, args: &[Object]) -> SolResult {
    let buffer = arg(state, args, 0);
    let scratch = arg(state, args, 1);
    let view = match &*buffer.borrow() {
        Payload::Buffer(buffer) => Some(buffer.view()),
        _ => None,
    };
    let Some(View::Sized(region)) = view else {
        return Ok(state.none());
    };
    let len = i64::try_from(region.len()).unwrap_or(i64::MAX);
    let (idx, sz) = offsets(state, &scratch, len);
    let byte = region
        .offset(idx)
        .filter(|tail| idx < sz && !tail.is_empty());
    let Some(tail) = byte else {
        return Ok(state.none());
    };
    advance(state, &scratch, idx, sz);
    let one = Region::at_address(tail.address(), 1);
    Ok(Object::buffer(Buffer::borrowed(View::Sized(one)).anchored(buffer)))
}

/// The cursor for `container` stored in `scratch`, replacing a missing or
/// foreign one. Returns the position to read and advances it.
fn next_position(state: &State, container: &Object, scratch: &Object) -> usize {
    if let Some(cursor) = state.map_get_name(scratch, "idx") {
        if let Payload::Buffer(buffer) = &mut *cursor.borrow_mut() {
            if let Some(seq) = buffer.resource_mut::<SeqCursor>() {
                if seq.container.points_to(container) {
                    let pos = seq.pos;
                    seq.pos += 1;
                    return pos;
                }
            }
        }
    }
    let cursor = SeqCursor {
        pos: 1,
        container: container.downgrade(),
    };
    let boxed = Object::buffer(Buffer::with_resource(Box::new(cursor)));
    state.map_set_name(scratch, "idx", boxed);
    0
}

fn step_list(state: &mut State, args: &[Object]) -> SolResult {
    let list = arg(state, args, 0);
    let scratch = arg(state, args, 1);
    let pos = next_position(state, &list, &scratch);
    let item = match &*list.borrow() {
        Payload::List(items) => items.get(pos).cloned(),
        _ => None,
    };
    Ok(item.unwrap_or_else(|| state.none()))
}

/// Maps yield their keys.
fn step_map(state: &mut State, args: &[Object]) -> SolResult {
    let map = arg(state, args, 0);
    let scratch = arg(state, args, 1);
    let pos = next_position(state, &map, &scratch);
    let cell = match &*map.borrow() {
        Payload::Map(cells) => cells.get(pos).cloned(),
        _ => None,
    };
    let key = cell.and_then(|cell| cell.cell_parts()).map(|(key, _)| key);
    Ok(key.unwrap_or_else(|| state.none()))
}
