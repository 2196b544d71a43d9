//! Named sentinels such as `None`.

use super::{arg, new_buffer, Handler, Op};
use crate::object::{Object, Payload};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::ToString => Some(tostring),
        Op::ToBuffer => Some(tobuffer),
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
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

fn name(obj: &Object) -> &'static str {
    match &*obj.borrow() {
        Payload::Singlet(name) => *name,
        _ => "",
    }
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::string(name(&arg(state, args, 0))))
}

fn tobuffer(state: &mut State, args: &[Object]) -> SolResult {
    let name = name(&arg(state, args, 0));
    new_buffer(state, name.as_bytes())
}
