use pretty_assertions::assert_eq;

use super::*;

#[test]
fn not_implemented_names_operation_and_type() {
    let err = not_implemented(Op::Add, ObjType::List);
    assert_eq!(
        err,
        RuntimeError::NotImplemented {
            op: Op::Add,
            type_name: "list"
        }
    );
    assert_eq!(err.to_string(), "Undefined method (add on list)");
}

#[test]
fn arithmetic_messages() {
    assert_eq!(integer_divide_by_zero().to_string(), "integer divide by zero");
    assert_eq!(integer_modulus_by_zero().to_string(), "integer modulus by zero");
    assert_eq!(float_divide_by_zero().to_string(), "floating division by zero");
}

#[test]
fn container_messages() {
    assert_eq!(list_add_non_list().to_string(), "Adding list to non-list");
    assert_eq!(map_add_non_map().to_string(), "Adding map to non-map");
    assert_eq!(map_not_callable().to_string(), "Call map without call method");
    assert_eq!(apply_non_list().to_string(), "apply with non-list");
    assert_eq!(rawget_non_map().to_string(), "Rawget of non-map");
    assert_eq!(rawset_non_map().to_string(), "Rawset of non-map");
}

#[test]
fn unsized_buffer_names_the_action() {
    assert_eq!(
        unsized_buffer("find").to_string(),
        "find with unsized buffer"
    );
}

#[test]
fn type_mismatch_uses_type_names() {
    assert_eq!(
        type_mismatch(ObjType::Int, ObjType::Str).to_string(),
        "Expected int, got string"
    );
}

#[test]
fn call_stack_messages() {
    assert_eq!(stack_imbalance().to_string(), "Function stack imbalance");
    assert_eq!(
        recursion_limit(64).to_string(),
        "maximum recursion depth of 64 exceeded"
    );
}

#[test]
fn stream_messages_hide_details() {
    assert_eq!(bad_file_mode(5).to_string(), "Bad file open mode");
    assert_eq!(file_open_failed().to_string(), "File open failed");
    assert_eq!(read_failed().to_string(), "IO read error");
}
