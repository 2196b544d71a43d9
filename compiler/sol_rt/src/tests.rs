//! Tests for `sol_rt` allocation, formats and views.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

// ── Allocation ──────────────────────────────────────────────────────────

#[test]
fn raw_alloc_zero_size_is_null() {
    assert!(raw_alloc(0, 8).is_null());
    // Freeing null is a no-op
    raw_free(std::ptr::null_mut(), 0, 8);
}

#[test]
fn raw_alloc_returns_zeroed_memory() {
    let ptr = raw_alloc(32, 8);
    assert!(!ptr.is_null());
    let region = Region::at_address(ptr as usize, 32);
    assert!(region.bytes().iter().all(|&b| b == 0));
    raw_free(ptr, 32, 8);
}

#[test]
fn block_copies_source_bytes() {
    let block = Block::from_bytes(b"sol").unwrap();
    assert_eq!(block.len(), 3);
    assert_eq!(block.region().bytes(), b"sol");
}

#[test]
fn empty_block_has_empty_view() {
    let block = Block::zeroed(0).unwrap();
    assert!(block.is_empty());
    assert_eq!(block.region().bytes(), b"");
    assert_eq!(block.region().get(Format::UInt8, 0), None);
}

#[test]
fn null_region_refuses_access() {
    let region = Region::at_address(0, 8);
    assert_eq!(region.get(Format::UInt8, 1), None);
    assert!(!region.set(Format::UInt8, 1, &Scalar::Int(1)));
}

// ── Formats ─────────────────────────────────────────────────────────────

#[test]
fn format_codes_are_stable_and_unique() {
    assert_eq!(Format::UInt8.code(), 1);
    assert_eq!(Format::Ptr.code(), 18);
    for format in Format::ALL {
        assert_eq!(Format::from_code(format.code()), Some(format));
    }
    assert_eq!(Format::from_code(0), None);
    assert_eq!(Format::from_code(19), None);
}

#[test]
fn cstr_has_no_fixed_width() {
    assert_eq!(Format::CStr.width(), None);
    assert_eq!(Format::UInt16.width(), Some(2));
    assert_eq!(Format::Ptr.width(), Some(std::mem::size_of::<usize>()));
}

// ── Sized regions ───────────────────────────────────────────────────────

#[test]
fn sized_access_uses_native_byte_order() {
    let block = Block::zeroed(8).unwrap();
    let region = block.region();
    assert!(region.set(Format::UInt32, 0, &Scalar::Int(0x0102_0304)));
    let expected = 0x0102_0304_u32.to_ne_bytes();
    assert_eq!(&region.bytes()[..4], &expected);
}

#[test]
fn unaligned_wide_access_round_trips() {
    let block = Block::zeroed(16).unwrap();
    let region = block.region();
    assert!(region.set(Format::Double, 3, &Scalar::Float(2.5)));
    assert_eq!(region.get(Format::Double, 3), Some(Scalar::Float(2.5)));
}

#[test]
fn signed_and_unsigned_views_of_the_same_byte_differ() {
    let block = Block::from_bytes(&[0xff]).unwrap();
    let region = block.region();
    assert_eq!(region.get(Format::UInt8, 0), Some(Scalar::Int(255)));
    assert_eq!(region.get(Format::Int8, 0), Some(Scalar::Int(-1)));
    assert_eq!(region.get(Format::Char, 0), Some(Scalar::Char(0xff)));
}

#[test]
fn offsets_at_or_past_the_end_are_rejected() {
    let block = Block::zeroed(4).unwrap();
    let region = block.region();
    assert_eq!(region.get(Format::UInt8, 4), None);
    assert_eq!(region.get(Format::UInt8, -1), None);
    assert!(!region.set(Format::UInt8, 4, &Scalar::Int(1)));
    assert!(!region.set(Format::UInt8, -1, &Scalar::Int(1)));
    assert_eq!(region.bytes(), &[0, 0, 0, 0]);
}

#[test]
fn wide_access_must_fit_entirely() {
    let block = Block::zeroed(4).unwrap();
    let region = block.region();
    assert_eq!(region.get(Format::UInt32, 1), None);
    assert!(!region.set(Format::UInt32, 1, &Scalar::Int(7)));
    assert_eq!(region.bytes(), &[0, 0, 0, 0]);
}

#[test]
fn cstr_get_stops_at_terminator_or_region_end() {
    let terminated = Block::from_bytes(b"ab\0cd").unwrap();
    assert_eq!(
        terminated.region().get(Format::CStr, 0),
        Some(Scalar::Bytes(b"ab".to_vec()))
    );
    assert_eq!(
        terminated.region().get(Format::CStr, 3),
        Some(Scalar::Bytes(b"cd".to_vec()))
    );
}

#[test]
fn cstr_set_requires_room_for_terminator() {
    let block = Block::zeroed(4).unwrap();
    let region = block.region();
    assert!(!region.set(Format::CStr, 0, &Scalar::Bytes(b"abcd".to_vec())));
    assert!(region.set(Format::CStr, 0, &Scalar::Bytes(b"abc".to_vec())));
    assert_eq!(region.bytes(), b"abc\0");
}

#[test]
fn mismatched_scalar_kind_writes_nothing() {
    let block = Block::zeroed(8).unwrap();
    let region = block.region();
    assert!(!region.set(Format::Double, 0, &Scalar::Int(1)));
    assert!(!region.set(Format::CStr, 0, &Scalar::Int(1)));
    assert_eq!(region.bytes(), &[0; 8]);
}

#[test]
fn sub_region_shares_memory() {
    let block = Block::from_bytes(b"hello").unwrap();
    let tail = block.region().offset(3).unwrap();
    assert_eq!(tail.bytes(), b"lo");
    assert!(tail.set(Format::Char, 0, &Scalar::Char(b'L')));
    assert_eq!(block.region().bytes(), b"helLo");
    assert_eq!(block.region().offset(6), None);
}

// ── Unbounded views ─────────────────────────────────────────────────────

#[test]
fn unbounded_view_skips_bound_checks() {
    let block = Block::from_bytes(b"xyz\0").unwrap();
    let view = View::Unsized(Unbounded::at_address(block.as_ptr() as usize));
    assert_eq!(view.size(), -1);
    assert_eq!(view.get(Format::CStr, 0), Some(Scalar::Bytes(b"xyz".to_vec())));
    assert!(view.set(Format::Char, 2, &Scalar::Char(b'Z')));
    assert_eq!(block.region().bytes(), b"xyZ\0");
}

#[test]
fn unbounded_view_can_assume_a_length() {
    let block = Block::from_bytes(b"abcdef").unwrap();
    let region = Unbounded::at_address(block.as_ptr() as usize).assume_len(3);
    assert_eq!(region.bytes(), b"abc");
    assert_eq!(region.get(Format::UInt8, 3), None);
}

#[test]
fn null_unbounded_view_reads_nothing() {
    let view = Unbounded::at_address(0);
    assert_eq!(view.get(Format::UInt8, 0), None);
    assert!(!view.set(Format::UInt8, 0, &Scalar::Int(1)));
}

#[test]
fn pointer_format_reads_back_an_address() {
    let target = Block::from_bytes(b"pointee\0").unwrap();
    let slot = Block::zeroed(std::mem::size_of::<usize>()).unwrap();
    let addr = target.as_ptr() as usize;
    assert!(slot.region().set(Format::Ptr, 0, &Scalar::Address(addr)));
    let Some(Scalar::Address(read)) = slot.region().get(Format::Ptr, 0) else {
        panic!("expected an address");
    };
    assert_eq!(
        Unbounded::at_address(read).get(Format::CStr, 0),
        Some(Scalar::Bytes(b"pointee".to_vec()))
    );
}

// ── Search ──────────────────────────────────────────────────────────────

#[test]
fn find_bytes_locates_first_match() {
    assert_eq!(find_bytes(b"abcabc", b"ca"), Some(2));
    assert_eq!(find_bytes(b"abc", b"zz"), None);
    assert_eq!(find_bytes(b"abc", b""), Some(0));
    assert_eq!(find_bytes(b"", b"a"), None);
}

proptest! {
    #[test]
    fn sized_get_never_reads_outside(len in 0usize..32, offset in -8i64..48) {
        let block = Block::zeroed(len).unwrap();
        let region = block.region();
        for format in Format::ALL {
            let inside = usize::try_from(offset).is_ok_and(|off| {
                off < len && format.width().map_or(true, |w| off + w <= len)
            });
            prop_assert_eq!(region.get(format, offset).is_some(), inside);
        }
    }

    #[test]
    fn int64_round_trips_at_any_fitting_offset(value: i64, offset in 0i64..8) {
        let block = Block::zeroed(16).unwrap();
        let region = block.region();
        prop_assert!(region.set(Format::Int64, offset, &Scalar::Int(value)));
        prop_assert_eq!(region.get(Format::Int64, offset), Some(Scalar::Int(value)));
    }
}
