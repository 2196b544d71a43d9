use pretty_assertions::assert_eq;

use super::*;

#[test]
fn every_type_has_the_shared_defaults() {
    for ty in ObjType::ALL {
        let shared = [
            Op::TBang,
            Op::Cmp,
            Op::ToString,
            Op::ToBuffer,
            Op::Repr,
            Op::Init,
            Op::Free,
        ];
        for op in shared {
            assert!(handler(ty, op).is_some(), "{op} on {}", ty.name());
        }
    }
}

#[test]
fn op_names_are_unique() {
    let mut names: Vec<_> = Op::ALL.iter().map(|op| op.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), Op::ALL.len());
}

#[test]
fn missing_operation_names_op_and_type() {
    let mut state = State::new();
    let result = state.binary(Op::Sub, &Object::string("a"), &Object::string("b"));
    assert!(result.is_err());
    let message = state.error().unwrap().as_string().unwrap();
    assert_eq!(message, "Undefined method (sub on string)");
}

#[test]
fn default_cmp_is_identity() {
    let mut state = State::new();
    let none = state.none();
    assert_eq!(state.cmp(&none, &none).unwrap(), 0);
    let f = Object::cfunction("f", no_op);
    let g = Object::cfunction("g", no_op);
    assert_eq!(state.cmp(&f, &f).unwrap(), 0);
    assert_eq!(state.cmp(&f, &g).unwrap(), 1);
}

#[test]
fn default_tbang_swaps_contents() {
    let mut state = State::new();
    let a = Object::int(1);
    let b = Object::string("two");
    state.binary(Op::TBang, &a, &b).unwrap();
    assert_eq!(a.as_string().unwrap(), "two");
    assert_eq!(b.as_int(), Some(1));
}

#[test]
fn default_tostring_names_type_and_address() {
    let mut state = State::new();
    let f = Object::cfunction("f", no_op);
    let text = default_tostring(&mut state, &[f.clone()]).unwrap();
    assert_eq!(
        text.as_string().unwrap(),
        format!("<cfunction object at {:#x}>", f.id())
    );
}

#[test]
fn type_flags_follow_the_tables() {
    assert_eq!(
        TypeFlags::of(ObjType::Str),
        TypeFlags::INDEXABLE | TypeFlags::ITERABLE | TypeFlags::SIZED | TypeFlags::NAME
    );
    assert_eq!(
        TypeFlags::of(ObjType::Map),
        TypeFlags::CALLABLE | TypeFlags::INDEXABLE | TypeFlags::ITERABLE | TypeFlags::SIZED
    );
    assert_eq!(TypeFlags::of(ObjType::CFunction), TypeFlags::CALLABLE);
    assert_eq!(TypeFlags::of(ObjType::Int), TypeFlags::empty());
}

#[test]
fn clamp_range_wraps_negative_bounds() {
    assert_eq!(clamp_range(-3, 100, 10), (7, 10));
    assert_eq!(clamp_range(-100, -1, 10), (0, 9));
    assert_eq!(clamp_range(4, 2, 10), (4, 2));
}

#[test]
fn split_tokens_drops_empty_parts() {
    let parts = split_tokens(b",,a,b;;c,", b",;");
    assert_eq!(parts, [&b"a"[..], b"b", b"c"]);
    assert!(split_tokens(b",,,", b",").is_empty());
}
