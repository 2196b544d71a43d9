use pretty_assertions::assert_eq;

use crate::map::map_of;
use crate::object::ObjType;
use crate::ops::TypeFlags;
use crate::print_handler::buffer_handler;
use crate::testing::take_message;
use crate::{Object, SolResult, State};

fn global(state: &State, name: &str) -> Object {
    state.map_get_name(&state.globals(), name).unwrap()
}

fn call_global(state: &mut State, name: &str, args: &[Object]) -> SolResult {
    let callee = global(state, name);
    state.call(&callee, args)
}

fn debug_fn(state: &State, name: &str) -> Object {
    let debug = global(state, "debug");
    state.map_get_name(&debug, name).unwrap()
}

fn ints(list: &Object) -> Vec<i64> {
    list.items()
        .unwrap()
        .iter()
        .map(|item| item.as_int().unwrap())
        .collect()
}

fn echo(_state: &mut State, args: &[Object]) -> SolResult {
    Ok(Object::list(args.to_vec()))
}

fn boom(state: &mut State, _args: &[Object]) -> SolResult {
    Err(state.set_error(Object::string("boom")))
}

#[test]
fn globals_hold_the_library() {
    let state = State::new();
    for name in [
        "toint", "tofloat", "tostring", "tobuffer", "type", "try", "apply", "error", "print",
        "prepr", "rawget", "rawset", "range", "ord", "chr",
    ] {
        assert!(global(&state, name).is_callable(), "{name}");
    }
    for name in ["debug", "iter", "buffer", "io", "ffi"] {
        assert_eq!(global(&state, name).ty(), ObjType::Map, "{name}");
    }
    assert!(global(&state, "None").ptr_eq(&state.none()));
    for ty in [ObjType::Str, ObjType::List, ObjType::Buffer, ObjType::Stream] {
        assert!(state.methods_for(ty).is_some(), "{ty}");
    }
}

#[test]
fn conversions_dispatch_on_the_subject() {
    let mut state = State::new();
    let int = call_global(&mut state, "toint", &[Object::string("42")]).unwrap();
    assert_eq!(int.as_int(), Some(42));
    let text = call_global(&mut state, "tostring", &[Object::int(5)]).unwrap();
    assert_eq!(state.to_string(&text).unwrap(), "5");
    let float = call_global(&mut state, "tofloat", &[Object::int(2)]).unwrap();
    assert_eq!(float.as_float(), Some(2.0));
}

#[test]
fn type_names_the_subject() {
    let mut state = State::new();
    let name = call_global(&mut state, "type", &[Object::int(1)]).unwrap();
    assert_eq!(name.ty(), ObjType::Buffer);
    assert_eq!(state.to_string(&name).unwrap(), "int");
    let name = call_global(&mut state, "type", &[Object::map()]).unwrap();
    assert!(name.is_name("map"));
}

#[test]
fn try_wraps_success() {
    let mut state = State::new();
    let f = Object::cfunction("echo", echo);
    let result = call_global(&mut state, "try", &[f, Object::int(1), Object::int(2)]).unwrap();
    let parts = result.items().unwrap();
    assert_eq!(parts[0].as_int(), Some(1));
    assert_eq!(ints(&parts[1]), [1, 2]);
}

#[test]
fn try_catches_and_clears_the_error() {
    let mut state = State::new();
    let f = Object::cfunction("boom", boom);
    let result = call_global(&mut state, "try", &[f.clone()]).unwrap();
    assert!(!state.has_error());

    let parts = result.items().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].as_int(), Some(0));
    assert_eq!(parts[1].as_string().as_deref(), Some("boom"));
    let traceback = parts[2].items().unwrap();
    assert!(traceback[0].ptr_eq(&f));
}

#[test]
fn apply_spreads_the_list_after_extra_arguments() {
    let mut state = State::new();
    let f = Object::cfunction("echo", echo);
    let spread = Object::list(vec![Object::int(1), Object::int(2)]);
    let result = call_global(&mut state, "apply", &[f.clone(), spread, Object::int(0)]).unwrap();
    assert_eq!(ints(&result), [0, 1, 2]);

    assert!(call_global(&mut state, "apply", &[f, Object::int(3)]).is_err());
    assert_eq!(take_message(&mut state).as_deref(), Some("apply with non-list"));
}

#[test]
fn error_raises_its_argument() {
    let mut state = State::new();
    let err = Object::map();
    assert!(call_global(&mut state, "error", &[err.clone()]).is_err());
    assert!(state.error().unwrap().ptr_eq(&err));
}

#[test]
fn print_separates_and_terminates_with_spaces() {
    let output = buffer_handler();
    let mut state = State::builder().print_handler(output.clone()).build();
    call_global(&mut state, "print", &[Object::string("a"), Object::int(1)]).unwrap();
    call_global(&mut state, "prepr", &[Object::string("a")]).unwrap();
    assert_eq!(output.get_output(), "a 1 \n\"a\" \n");
}

#[test]
fn print_survives_self_reference() {
    let output = buffer_handler();
    let mut state = State::builder().print_handler(output.clone()).build();
    let list = Object::list(Vec::new());
    if let crate::Payload::List(items) = &mut *list.borrow_mut() {
        items.push(list.clone());
    }
    call_global(&mut state, "print", &[list.clone()]).unwrap();
    assert_eq!(output.get_output(), format!("[... ({:#x})] \n", list.id()));
    assert!(!state.is_rendering());
    if let crate::Payload::List(items) = &mut *list.borrow_mut() {
        items.clear();
    };
}

fn ninety_nine(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(Object::int(99))
}

#[test]
fn rawget_and_rawset_bypass_overrides() {
    let mut state = State::new();
    let map = map_of([
        ("__index", Object::cfunction("fallback", ninety_nine)),
        ("__setindex", Object::cfunction("sink", ninety_nine)),
    ]);
    let key = Object::string("missing");

    let hooked = state.index(&map, &key).unwrap();
    assert_eq!(hooked.as_int(), Some(99));
    let raw = call_global(&mut state, "rawget", &[map.clone(), key.clone()]).unwrap();
    assert!(state.is_none(&raw));

    state.set_index(&map, &key, &Object::int(1)).unwrap();
    assert!(state.map_get_name(&map, "missing").is_none());
    call_global(&mut state, "rawset", &[map.clone(), key, Object::int(2)]).unwrap();
    assert_eq!(state.map_get_name(&map, "missing").unwrap().as_int(), Some(2));
}

#[test]
fn raw_access_rejects_non_maps() {
    let mut state = State::new();
    let list = Object::list(Vec::new());
    assert!(call_global(&mut state, "rawget", &[list.clone(), Object::int(0)]).is_err());
    assert_eq!(take_message(&mut state).as_deref(), Some("Rawget of non-map"));
    assert!(call_global(&mut state, "rawset", &[list, Object::int(0), Object::int(1)]).is_err());
    assert_eq!(take_message(&mut state).as_deref(), Some("Rawset of non-map"));
}

#[test]
fn range_counts_up_from_zero() {
    let mut state = State::new();
    let list = call_global(&mut state, "range", &[Object::int(3)]).unwrap();
    assert_eq!(ints(&list), [0, 1, 2]);
    let empty = call_global(&mut state, "range", &[Object::int(-2)]).unwrap();
    assert_eq!(ints(&empty), Vec::<i64>::new());
}

#[test]
fn ord_reads_bytes_from_either_end() {
    let mut state = State::new();
    let text = Object::string("abc");
    let first = call_global(&mut state, "ord", &[text.clone()]).unwrap();
    assert_eq!(first.as_int(), Some(97));
    let last = call_global(&mut state, "ord", &[text.clone(), Object::int(-1)]).unwrap();
    assert_eq!(last.as_int(), Some(99));

    assert!(call_global(&mut state, "ord", &[text, Object::int(3)]).is_err());
    assert_eq!(
        take_message(&mut state).as_deref(),
        Some("Compute ord of out-of-bounds index")
    );
}

#[test]
fn chr_keeps_the_low_byte() {
    let mut state = State::new();
    let one = call_global(&mut state, "chr", &[Object::int(65)]).unwrap();
    assert_eq!(state.len(&one).unwrap(), 1);
    assert_eq!(state.to_string(&one).unwrap(), "A");
    let wrapped = call_global(&mut state, "chr", &[Object::int(256 + 66)]).unwrap();
    assert_eq!(state.to_string(&wrapped).unwrap(), "B");
}

#[test]
fn getref_discounts_the_call() {
    let mut state = State::new();
    let getref = debug_fn(&state, "getref");
    let obj = Object::list(Vec::new());
    let count = state.call(&getref, &[obj.clone()]).unwrap();
    assert_eq!(count.as_int(), Some(1));

    let held = obj.clone();
    let count = state.call(&getref, &[obj.clone()]).unwrap();
    assert_eq!(count.as_int(), Some(2));
    drop(held);
}

#[test]
fn setref_pins_and_releases() {
    let mut state = State::new();
    let setref = debug_fn(&state, "setref");
    let obj = Object::list(Vec::new());

    state.call(&setref, &[obj.clone(), Object::int(4)]).unwrap();
    assert_eq!(obj.ref_count(), 4);
    state.call(&setref, &[obj.clone(), Object::int(2)]).unwrap();
    assert_eq!(obj.ref_count(), 2);
    state.call(&setref, &[obj.clone(), Object::int(0)]).unwrap();
    assert_eq!(obj.ref_count(), 1);
}

#[test]
fn getops_exposes_the_handler_table() {
    let mut state = State::new();
    let getops = debug_fn(&state, "getops");
    let ops = state.call(&getops, &[Object::int(0)]).unwrap();

    assert!(state.map_get_name(&ops, "name").unwrap().is_name("int"));
    let flags = state.map_get_name(&ops, "flags").unwrap().as_int().unwrap();
    assert_eq!(flags, i64::from(TypeFlags::of(ObjType::Int).bits()));
    assert_eq!(crate::map::map_len(&ops), crate::Op::ALL.len() + 2);

    let add = state.map_get_name(&ops, "add").unwrap();
    let sum = state.call(&add, &[Object::int(2), Object::int(3)]).unwrap();
    assert_eq!(sum.as_int(), Some(5));
}

#[test]
fn scope_introspection() {
    let mut state = State::new();
    let globals = state.call(&debug_fn(&state, "globals"), &[]).unwrap();
    assert!(globals.ptr_eq(&state.globals()));

    let inner = Object::map();
    state.push_scope(inner.clone());
    let locals = state.call(&debug_fn(&state, "locals"), &[]).unwrap();
    assert!(locals.ptr_eq(&inner));
    let scopes = state.call(&debug_fn(&state, "scopes"), &[]).unwrap().items().unwrap();
    assert_eq!(scopes.len(), 2);
    assert!(scopes[0].ptr_eq(&inner));
    assert!(scopes[1].ptr_eq(&state.globals()));
    state.pop_scope();
}

#[test]
fn fnstack_sees_the_running_call() {
    let mut state = State::new();
    let fnstack = debug_fn(&state, "fnstack");
    let frames = state.call(&fnstack, &[]).unwrap().items().unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].ptr_eq(&fnstack));
    assert_eq!(state.call_depth(), 0);
}

#[test]
fn closure_of_a_non_function_is_none() {
    let mut state = State::new();
    let closure = debug_fn(&state, "closure");
    let result = state.call(&closure, &[Object::int(1)]).unwrap();
    assert!(state.is_none(&result));

    let function = Object::function(crate::testing::returning(&[], "x"));
    let captured = state.call(&closure, &[function]).unwrap();
    assert_eq!(captured.ty(), ObjType::Map);
}
