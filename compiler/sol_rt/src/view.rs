//! Sized and unsized views over raw memory.

use crate::format::{read_fixed, write_fixed};
use crate::{Format, Scalar};

/// A bounds-checked view of `len` bytes starting at `ptr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    ptr: *mut u8,
    len: usize,
}

impl Region {
    pub(crate) fn new(ptr: *mut u8, len: usize) -> Self {
        Region { ptr, len }
    }

    /// View `len` bytes at a raw address supplied by the caller.
    pub fn at_address(addr: usize, len: usize) -> Self {
        Region {
            ptr: addr as *mut u8,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn address(&self) -> usize {
        self.ptr as usize
    }

    /// The viewed bytes.
    pub fn bytes(&self) -> &[u8] {
        if self.len == 0 || self.ptr.is_null() {
            return &[];
        }
        // SAFETY: the view covers len readable bytes (module contract)
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Index of `offset` if it lies inside the region.
    fn checked_offset(&self, offset: i64) -> Option<usize> {
        let offset = usize::try_from(offset).ok()?;
        (offset < self.len).then_some(offset)
    }

    /// Decode `format` at `offset`. `None` when the access leaves the region
    /// or the offset is negative.
    pub fn get(&self, format: Format, offset: i64) -> Option<Scalar> {
        let offset = self.checked_offset(offset)?;
        let tail = self.bytes().get(offset..)?;
        match format.width() {
            None => {
                let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
                Some(Scalar::Bytes(tail[..end].to_vec()))
            }
            Some(width) if width <= tail.len() => {
                // SAFETY: width bytes at tail start are inside the region
                unsafe { read_fixed(tail.as_ptr(), format) }
            }
            Some(_) => None,
        }
    }

    /// Encode `value` as `format` at `offset`. Returns `false` (and writes
    /// nothing) when the access would leave the region.
    pub fn set(&self, format: Format, offset: i64, value: &Scalar) -> bool {
        let Some(offset) = self.checked_offset(offset) else {
            return false;
        };
        if self.ptr.is_null() {
            return false;
        }
        let room = self.len - offset;
        // SAFETY: offset < len, so the pointer stays inside the region
        let at = unsafe { self.ptr.add(offset) };
        match (format.width(), value) {
            (None, Scalar::Bytes(bytes)) => {
                if bytes.len() + 1 > room {
                    return false;
                }
                // SAFETY: bytes.len() + 1 <= room bytes are writable at `at`
                unsafe { write_cstr(at, bytes) };
                true
            }
            (None, _) => false,
            (Some(width), _) if width <= room => {
                // SAFETY: width bytes at `at` are inside the region
                unsafe { write_fixed(at, format, value) }
            }
            (Some(_), _) => false,
        }
    }

    /// Sub-view starting `offset` bytes in. `None` outside `0..=len`.
    pub fn offset(&self, offset: i64) -> Option<Region> {
        let offset = usize::try_from(offset).ok()?;
        if offset > self.len {
            return None;
        }
        Some(Region {
            ptr: self.ptr.wrapping_add(offset),
            len: self.len - offset,
        })
    }
}

/// A view with no known length. Nothing is bounds-checked.
///
/// Only the object layer's explicit unsized constructors produce this type;
/// every access trusts the address completely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unbounded {
    ptr: *mut u8,
}

impl Unbounded {
    pub fn at_address(addr: usize) -> Self {
        Unbounded {
            ptr: addr as *mut u8,
        }
    }

    pub fn address(&self) -> usize {
        self.ptr as usize
    }

    fn at(&self, offset: i64) -> Option<*mut u8> {
        let ptr = self.ptr.wrapping_offset(isize::try_from(offset).ok()?);
        (!ptr.is_null()).then_some(ptr)
    }

    /// Decode `format` at `offset` without any bound check.
    pub fn get(&self, format: Format, offset: i64) -> Option<Scalar> {
        let at = self.at(offset)?;
        if format == Format::CStr {
            // SAFETY: unsized views are trusted up to the terminator
            let bytes = unsafe { std::ffi::CStr::from_ptr(at.cast_const().cast()) };
            return Some(Scalar::Bytes(bytes.to_bytes().to_vec()));
        }
        // SAFETY: unsized views are trusted for the format's width
        unsafe { read_fixed(at, format) }
    }

    /// Encode `value` as `format` at `offset` without any bound check.
    pub fn set(&self, format: Format, offset: i64, value: &Scalar) -> bool {
        let Some(at) = self.at(offset) else {
            return false;
        };
        match (format, value) {
            (Format::CStr, Scalar::Bytes(bytes)) => {
                // SAFETY: unsized views are trusted for bytes plus terminator
                unsafe { write_cstr(at, bytes) };
                true
            }
            (Format::CStr, _) => false,
            // SAFETY: unsized views are trusted for the format's width
            _ => unsafe { write_fixed(at, format, value) },
        }
    }

    pub fn offset(&self, offset: i64) -> Option<Unbounded> {
        Some(Unbounded {
            ptr: self.ptr.wrapping_offset(isize::try_from(offset).ok()?),
        })
    }

    /// Trust `len` bytes at the address and view them as a region.
    pub fn assume_len(&self, len: usize) -> Region {
        Region::new(self.ptr, len)
    }
}

/// # Safety
///
/// `bytes.len() + 1` bytes must be writable at `at`.
unsafe fn write_cstr(at: *mut u8, bytes: &[u8]) {
    std::ptr::copy(bytes.as_ptr(), at, bytes.len());
    at.add(bytes.len()).write(0);
}

/// Either kind of view, as stored by a buffer object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Sized(Region),
    Unsized(Unbounded),
}

impl View {
    pub fn address(&self) -> usize {
        match self {
            View::Sized(region) => region.address(),
            View::Unsized(unbounded) => unbounded.address(),
        }
    }

    /// Signed size: the length, or `-1` when unsized.
    pub fn size(&self) -> i64 {
        match self {
            View::Sized(region) => i64::try_from(region.len()).unwrap_or(i64::MAX),
            View::Unsized(_) => -1,
        }
    }

    pub fn sized(&self) -> Option<&Region> {
        match self {
            View::Sized(region) => Some(region),
            View::Unsized(_) => None,
        }
    }

    pub fn get(&self, format: Format, offset: i64) -> Option<Scalar> {
        match self {
            View::Sized(region) => region.get(format, offset),
            View::Unsized(unbounded) => unbounded.get(format, offset),
        }
    }

    pub fn set(&self, format: Format, offset: i64, value: &Scalar) -> bool {
        match self {
            View::Sized(region) => region.set(format, offset, value),
            View::Unsized(unbounded) => unbounded.set(format, offset, value),
        }
    }

    /// Sub-view `offset` bytes in, keeping the sizedness of `self`.
    pub fn offset(&self, offset: i64) -> Option<View> {
        match self {
            View::Sized(region) => region.offset(offset).map(View::Sized),
            View::Unsized(unbounded) => unbounded.offset(offset).map(View::Unsized),
        }
    }
}
