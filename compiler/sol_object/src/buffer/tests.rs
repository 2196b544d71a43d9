use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sol_rt::{Format, Scalar};

use super::*;

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn owned_buffer_views_its_block() {
    let buffer = Buffer::from_bytes(b"abc").unwrap();
    assert!(buffer.is_sized());
    assert_eq!(buffer.size(), 3);
    assert_eq!(buffer.bytes(), Some(&b"abc"[..]));
    assert!(matches!(buffer.ownership(), Ownership::Owned(_)));
}

#[test]
fn text_stops_at_nul() {
    let buffer = Buffer::from_bytes(b"ab\0cd").unwrap();
    assert_eq!(buffer.c_bytes(), Some(&b"ab"[..]));
    assert_eq!(buffer.text(), "ab");
}

#[test]
fn unsized_buffer_has_no_bytes() {
    let buffer = Buffer::unsized_at(0x1000);
    assert_eq!(buffer.size(), -1);
    assert_eq!(buffer.bytes(), None);
    assert_eq!(buffer.text(), "<UNSIZED_BUFFER>");
    assert_eq!(buffer.address(), 0x1000);
}

#[test]
fn resource_is_dropped_with_the_buffer() {
    let dropped = Rc::new(Cell::new(false));
    let buffer = Buffer::with_resource(Box::new(DropFlag(Rc::clone(&dropped))));
    assert!(buffer.resource::<DropFlag>().is_some());
    assert!(buffer.resource::<u32>().is_none());
    assert!(!dropped.get());
    drop(buffer);
    assert!(dropped.get());
}

#[test]
fn resource_view_cannot_be_accessed() {
    let buffer = Buffer::with_resource(Box::new(7_u64));
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.view().get(Format::UInt8, 0), None);
    assert!(!buffer.view().set(Format::UInt8, 0, &Scalar::Int(1)));
    assert_eq!(buffer.resource::<u64>(), Some(&7));
}

#[test]
fn anchors_keep_objects_alive() {
    let parent = Object::int(1);
    let buffer = Buffer::unsized_at(0).anchored(parent.clone());
    assert_eq!(parent.ref_count(), 2);
    assert_eq!(buffer.anchors().len(), 1);
    drop(buffer);
    assert_eq!(parent.ref_count(), 1);
}
