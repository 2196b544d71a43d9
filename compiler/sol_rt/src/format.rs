//! Wire formats for typed buffer access.

use std::ffi::{c_int, c_long, c_uint, c_ulong};
use std::mem::size_of;

/// A primitive layout a buffer can be read or written as.
///
/// Codes are stable and visible to scripts as `buffer.type.<name>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    /// A single character, surfaced as a one-byte string.
    Char,
    /// An unsigned byte, surfaced as an integer.
    Byte,
    /// Native C `int`.
    Int,
    /// Native C `unsigned int`.
    UInt,
    /// Native C `long`.
    Long,
    /// Native C `unsigned long`.
    ULong,
    Float,
    Double,
    /// NUL-terminated string.
    CStr,
    /// A native pointer.
    Ptr,
}

impl Format {
    pub const ALL: [Format; 18] = [
        Format::UInt8,
        Format::UInt16,
        Format::UInt32,
        Format::UInt64,
        Format::Int8,
        Format::Int16,
        Format::Int32,
        Format::Int64,
        Format::Char,
        Format::Byte,
        Format::Int,
        Format::UInt,
        Format::Long,
        Format::ULong,
        Format::Float,
        Format::Double,
        Format::CStr,
        Format::Ptr,
    ];

    /// Stable numeric code, starting at 1 (0 is "no format").
    pub fn code(self) -> i64 {
        match self {
            Format::UInt8 => 1,
            Format::UInt16 => 2,
            Format::UInt32 => 3,
            Format::UInt64 => 4,
            Format::Int8 => 5,
            Format::Int16 => 6,
            Format::Int32 => 7,
            Format::Int64 => 8,
            Format::Char => 9,
            Format::Byte => 10,
            Format::Int => 11,
            Format::UInt => 12,
            Format::Long => 13,
            Format::ULong => 14,
            Format::Float => 15,
            Format::Double => 16,
            Format::CStr => 17,
            Format::Ptr => 18,
        }
    }

    pub fn from_code(code: i64) -> Option<Format> {
        Format::ALL.into_iter().find(|format| format.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::UInt8 => "uint8",
            Format::UInt16 => "uint16",
            Format::UInt32 => "uint32",
            Format::UInt64 => "uint64",
            Format::Int8 => "int8",
            Format::Int16 => "int16",
            Format::Int32 => "int32",
            Format::Int64 => "int64",
            Format::Char => "char",
            Format::Byte => "byte",
            Format::Int => "int",
            Format::UInt => "uint",
            Format::Long => "long",
            Format::ULong => "ulong",
            Format::Float => "float",
            Format::Double => "double",
            Format::CStr => "cstr",
            Format::Ptr => "ptr",
        }
    }

    /// Byte width of the format. `None` for the variable-length `cstr`.
    pub fn width(self) -> Option<usize> {
        let width = match self {
            Format::UInt8 | Format::Int8 | Format::Char | Format::Byte => 1,
            Format::UInt16 | Format::Int16 => 2,
            Format::UInt32 | Format::Int32 | Format::Float => 4,
            Format::UInt64 | Format::Int64 | Format::Double => 8,
            Format::Int => size_of::<c_int>(),
            Format::UInt => size_of::<c_uint>(),
            Format::Long => size_of::<c_long>(),
            Format::ULong => size_of::<c_ulong>(),
            Format::Ptr => size_of::<usize>(),
            Format::CStr => return None,
        };
        Some(width)
    }
}

/// A decoded (or to-be-encoded) buffer value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Char(u8),
    /// String bytes, without the terminator.
    Bytes(Vec<u8>),
    Address(usize),
}

/// Decode one fixed-width value at `ptr`.
///
/// # Safety
///
/// `ptr..ptr + format.width()` must be readable. No alignment is required.
pub(crate) unsafe fn read_fixed(ptr: *const u8, format: Format) -> Option<Scalar> {
    let scalar = match format {
        Format::UInt8 | Format::Byte => Scalar::Int(i64::from(ptr.read())),
        Format::UInt16 => Scalar::Int(i64::from(ptr.cast::<u16>().read_unaligned())),
        Format::UInt32 => Scalar::Int(i64::from(ptr.cast::<u32>().read_unaligned())),
        Format::UInt64 => Scalar::Int(ptr.cast::<u64>().read_unaligned() as i64),
        Format::Int8 => Scalar::Int(i64::from(ptr.cast::<i8>().read())),
        Format::Int16 => Scalar::Int(i64::from(ptr.cast::<i16>().read_unaligned())),
        Format::Int32 => Scalar::Int(i64::from(ptr.cast::<i32>().read_unaligned())),
        Format::Int64 => Scalar::Int(ptr.cast::<i64>().read_unaligned()),
        Format::Char => Scalar::Char(ptr.read()),
        Format::Int => Scalar::Int(i64::from(ptr.cast::<c_int>().read_unaligned())),
        Format::UInt => Scalar::Int(i64::from(ptr.cast::<c_uint>().read_unaligned())),
        Format::Long => Scalar::Int(ptr.cast::<c_long>().read_unaligned() as i64),
        Format::ULong => Scalar::Int(ptr.cast::<c_ulong>().read_unaligned() as i64),
        Format::Float => Scalar::Float(f64::from(ptr.cast::<f32>().read_unaligned())),
        Format::Double => Scalar::Float(ptr.cast::<f64>().read_unaligned()),
        Format::Ptr => Scalar::Address(ptr.cast::<usize>().read_unaligned()),
        Format::CStr => return None,
    };
    Some(scalar)
}

/// Encode one fixed-width value at `ptr`. Returns `false` when the scalar
/// kind does not fit the format.
///
/// # Safety
///
/// `ptr..ptr + format.width()` must be writable. No alignment is required.
pub(crate) unsafe fn write_fixed(ptr: *mut u8, format: Format, value: &Scalar) -> bool {
    match (format, value) {
        (Format::UInt8 | Format::Byte, Scalar::Int(v)) => ptr.write(*v as u8),
        (Format::UInt16, Scalar::Int(v)) => ptr.cast::<u16>().write_unaligned(*v as u16),
        (Format::UInt32, Scalar::Int(v)) => ptr.cast::<u32>().write_unaligned(*v as u32),
        (Format::UInt64, Scalar::Int(v)) => ptr.cast::<u64>().write_unaligned(*v as u64),
        (Format::Int8, Scalar::Int(v)) => ptr.cast::<i8>().write(*v as i8),
        (Format::Int16, Scalar::Int(v)) => ptr.cast::<i16>().write_unaligned(*v as i16),
        (Format::Int32, Scalar::Int(v)) => ptr.cast::<i32>().write_unaligned(*v as i32),
        (Format::Int64, Scalar::Int(v)) => ptr.cast::<i64>().write_unaligned(*v),
        (Format::Int, Scalar::Int(v)) => ptr.cast::<c_int>().write_unaligned(*v as c_int),
        (Format::UInt, Scalar::Int(v)) => ptr.cast::<c_uint>().write_unaligned(*v as c_uint),
        (Format::Long, Scalar::Int(v)) => ptr.cast::<c_long>().write_unaligned(*v as c_long),
        (Format::ULong, Scalar::Int(v)) => ptr.cast::<c_ulong>().write_unaligned(*v as c_ulong),
        (Format::Char, Scalar::Char(c)) => ptr.write(*c),
        (Format::Float, Scalar::Float(v)) => ptr.cast::<f32>().write_unaligned(*v as f32),
        (Format::Double, Scalar::Float(v)) => ptr.cast::<f64>().write_unaligned(*v),
        (Format::Ptr, Scalar::Address(addr)) => ptr.cast::<usize>().write_unaligned(*addr),
        _ => return false,
    }
    true
}
