use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn type_names() {
    let names: Vec<_> = ObjType::ALL.iter().map(|ty| ty.name()).collect();
    assert_eq!(
        names,
        [
            "singlet", "int", "float", "string", "list", "map", "mcell", "function", "cfunction",
            "stmtnode", "exprnode", "buffer", "dylib", "dysym", "stream",
        ]
    );
    assert_eq!(ObjType::Str.to_string(), "string");
}

#[test]
fn payload_reports_its_type() {
    assert_eq!(Object::int(1).ty(), ObjType::Int);
    assert_eq!(Object::string("x").ty(), ObjType::Str);
    assert_eq!(Object::map().ty(), ObjType::Map);
    assert_eq!(Object::stmt(None).ty(), ObjType::Stmt);
    assert_eq!(Object::expr(None).ty(), ObjType::Expr);
    let cell = Object::mcell(Object::int(1), Object::int(2));
    assert_eq!(cell.ty(), ObjType::MCell);
}

#[test]
fn clones_share_one_count() {
    let obj = Object::list(Vec::new());
    assert_eq!(obj.ref_count(), 1);
    let other = obj.clone();
    assert_eq!(obj.ref_count(), 2);
    assert!(obj.ptr_eq(&other));
    assert_eq!(obj.id(), other.id());
    drop(other);
    assert_eq!(obj.ref_count(), 1);
}

#[test]
fn swap_keeps_identity_and_counts() {
    let left = Object::int(1);
    let right = Object::string("r");
    let held = right.clone();

    left.swap(&right);
    assert_eq!(left.as_string().unwrap(), "r");
    assert_eq!(held.as_int(), Some(1));
    assert_eq!(left.ref_count(), 1);
    assert_eq!(right.ref_count(), 2);

    left.swap(&left);
    assert_eq!(left.ty(), ObjType::Str);
}

#[test]
fn weak_references_do_not_keep_alive() {
    let obj = Object::map();
    let weak = obj.downgrade();
    assert!(weak.points_to(&obj));
    assert!(weak.upgrade().unwrap().ptr_eq(&obj));
    assert!(!weak.points_to(&Object::map()));
    drop(obj);
    assert!(weak.upgrade().is_none());
}

#[test]
fn snapshots_copy_out() {
    let list = Object::list(vec![Object::int(1)]);
    let items = list.items().unwrap();
    if let Payload::List(elements) = &mut *list.borrow_mut() {
        elements.clear();
    }
    assert_eq!(items.len(), 1);
    assert!(Object::int(1).items().is_none());

    let cell = Object::mcell(Object::string("k"), Object::int(2));
    let (key, val) = cell.cell_parts().unwrap();
    assert_eq!(key.as_string().unwrap(), "k");
    assert_eq!(val.as_int(), Some(2));
}

#[test]
fn names_are_strings_or_terminated_buffers() {
    let text = Object::string("name");
    assert!(text.is_name("name"));
    assert_eq!(text.name_bytes().unwrap(), b"name");

    let buffer = Object::buffer(Buffer::from_bytes(b"name\0junk").unwrap());
    assert!(buffer.is_name("name"));
    assert!(!buffer.is_name("name\0junk"));
    assert!(!Object::int(4).is_name("4"));
}

#[test]
fn callables() {
    fn body(state: &mut State, _args: &[Object]) -> SolResult {
        Ok(state.none())
    }
    assert!(Object::cfunction("f", body).is_callable());
    assert!(!Object::map().is_callable());
}

#[test]
fn debug_output() {
    assert_eq!(format!("{:?}", Object::int(3)), "Int(3)");
    assert_eq!(format!("{:?}", Object::string("a")), "Str(\"a\")");
    assert_eq!(format!("{:?}", Object::singlet("None")), "None");
    let list = Object::list(Vec::new());
    assert_eq!(format!("{list:?}"), format!("<list @ {:#x}>", list.id()));
    let guard = list.borrow_mut();
    assert_eq!(format!("{list:?}"), format!("<borrowed @ {:#x}>", list.id()));
    drop(guard);
}

proptest! {
    #[test]
    fn int_snapshot_round_trips(value in any::<i64>()) {
        prop_assert_eq!(Object::int(value).as_int(), Some(value));
        prop_assert!(Object::int(value).as_float().is_none());
    }
}
