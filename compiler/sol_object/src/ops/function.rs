//! User functions and native functions.

use std::rc::Rc;

use super::{arg, Handler, Op};
use crate::ast::Stmt;
use crate::errors;
use crate::object::{NativeKind, ObjType, Object, Payload};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::Call => Some(call),
        Op::Index => Some(index),
        Op::SetIndex => Some(setindex),
        Op::ToString => Some(tostring),
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

pub(super) fn cfunction_handler(op: Op) -> Option<Handler> {
    match op {
        Op::Call => Some(cfunction_call),
        Op::ToString => Some(cfunction_tostring),
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
        | Op::Index
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

/// What a call needs from a function, copied out so no borrow is held
/// while the body runs.
struct CallFrame {
    params: Vec<String>,
    rest: Option<String>,
    body: Rc<Stmt>,
    closure: Object,
}

fn frame_of(callee: &Object) -> Option<CallFrame> {
    match &*callee.borrow() {
        Payload::Function(function) => Some(CallFrame {
            params: function.params.clone(),
            rest: function.rest.clone(),
            body: Rc::clone(&function.body),
            closure: function.closure.clone(),
        }),
        _ => None,
    }
}

fn mismatch(state: &mut State, expected: ObjType, found: &Object) -> crate::Raised {
    state.raise(errors::type_mismatch(expected, found.ty()))
}

/// Bind arguments to parameters in a fresh scope and run the body with the
/// closure scope beneath it.
#[tracing::instrument(level = "debug", skip_all)]
fn call(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let Some(frame) = frame_of(&callee) else {
        return Err(mismatch(state, ObjType::Function, &callee));
    };
    let Some(evaluator) = state.evaluator() else {
        return Err(state.raise(errors::no_evaluator()));
    };

    let locals = Object::map();
    let mut passed = args.iter().skip(1);
    for param in &frame.params {
        let value = passed.next().cloned().unwrap_or_else(|| state.none());
        state.map_set_name(&locals, param, value);
    }
    if let Some(rest) = &frame.rest {
        state.map_set_name(&locals, rest, Object::list(passed.cloned().collect()));
    }

    state.push_frame(&callee)?;
    state.push_scope(frame.closure);
    state.push_scope(locals);
    let result = sol_stack::with_stack_headroom(|| evaluator.exec(state, &frame.body));
    state.pop_scope();
    state.pop_scope();
    state.pop_frame(&callee)?;
    result
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let key = arg(state, args, 1);
    if callee.ty() != ObjType::Function {
        return Err(mismatch(state, ObjType::Function, &callee));
    }
    let none = state.none();
    let text = |value: Option<String>| value.map_or_else(|| none.clone(), Object::string);
    let udata = {
        let payload = callee.borrow();
        let Payload::Function(function) = &*payload else {
            return Ok(state.none());
        };
        let field = key.name_bytes().and_then(|name| match name.as_slice() {
            b"name" => Some(text(function.name.clone())),
            b"closure" => Some(function.closure.clone()),
            b"udata" => Some(function.udata.clone()),
            b"stmt" => Some(Object::stmt(Some((*function.body).clone()))),
            b"args" => Some(Object::list(
                function.params.iter().map(Object::string).collect(),
            )),
            b"rest" => Some(text(function.rest.clone())),
            b"annos" => Some(function.annos.clone()),
            _ => None,
        });
        if let Some(field) = field {
            return Ok(field);
        }
        function.udata.clone()
    };
    Ok(state.map_get(&udata, &key)?.unwrap_or(none))
}

fn setindex(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let key = arg(state, args, 1);
    let value = arg(state, args, 2);
    if callee.ty() != ObjType::Function {
        return Err(mismatch(state, ObjType::Function, &callee));
    }
    let name = key
        .name_bytes()
        .map(|name| String::from_utf8_lossy(&name).into_owned())
        .unwrap_or_default();
    let optional_text = |state: &mut State, value: &Object| -> SolResult<Option<String>> {
        if state.is_none(value) {
            Ok(None)
        } else {
            state.to_string(value).map(Some)
        }
    };
    match name.as_str() {
        "name" => {
            let text = optional_text(state, &value)?;
            with_function(&callee, |function| function.name = text);
        }
        "rest" => {
            let text = optional_text(state, &value)?;
            with_function(&callee, |function| function.rest = text);
        }
        "args" => {
            let mut params = Vec::new();
            for item in value.items().unwrap_or_default() {
                params.push(state.to_string(&item)?);
            }
            with_function(&callee, |function| function.params = params);
        }
        "stmt" => {
            let body = match &*value.borrow() {
                Payload::Stmt(Some(stmt)) => Some(Rc::new((**stmt).clone())),
                _ => None,
            };
            if let Some(body) = body {
                with_function(&callee, |function| function.body = body);
            }
        }
        "closure" | "udata" | "annos" if value.ty() == ObjType::Map => {
            with_function(&callee, |function| {
                let slot = match name.as_str() {
                    "closure" => &mut function.closure,
                    "udata" => &mut function.udata,
                    _ => &mut function.annos,
                };
                *slot = value.clone();
            });
        }
        "closure" | "udata" | "annos" => {}
        _ => {
            let udata = match &*callee.borrow() {
                Payload::Function(function) => function.udata.clone(),
                _ => return Ok(state.none()),
            };
            state.map_set(&udata, &key, value)?;
        }
    }
    Ok(state.none())
}

fn with_function(callee: &Object, f: impl FnOnce(&mut crate::object::Function)) {
    let mut payload = callee.borrow_mut();
    if let Payload::Function(function) = &mut *payload {
        f(function);
    }
}

fn tostring(state: &mut State, args: &[Object]) -> SolResult {
    let text = match &*arg(state, args, 0).borrow() {
        Payload::Function(function) => match &function.name {
            Some(name) => format!("<Function {name}>"),
            None => "<Function>".to_owned(),
        },
        _ => "<Function>".to_owned(),
    };
    Ok(Object::string(text))
}

/// Run a native function between a frame push and pop.
fn cfunction_call(state: &mut State, args: &[Object]) -> SolResult {
    let callee = arg(state, args, 0);
    let kind = match &*callee.borrow() {
        Payload::CFunction(native) => Some(native.kind),
        _ => None,
    };
    let Some(kind) = kind else {
        return Err(mismatch(state, ObjType::CFunction, &callee));
    };
    let rest = args.get(1..).unwrap_or_default();
    state.push_frame(&callee)?;
    let result = match kind {
        NativeKind::Builtin(body) => body(state, rest),
        NativeKind::Handler(ty, op) => match super::handler(ty, op) {
            Some(body) => body(state, rest),
            None => Err(state.raise(errors::not_implemented(op, ty))),
        },
    };
    state.pop_frame(&callee)?;
    result
}

fn cfunction_tostring(state: &mut State, args: &[Object]) -> SolResult {
    let text = match &*arg(state, args, 0).borrow() {
        Payload::CFunction(native) => format!("<CFunction {}>", native.name),
        _ => "<CFunction>".to_owned(),
    };
    Ok(Object::string(text))
}
