//! Sol raw memory primitives (`sol_rt`).
//!
//! Everything in the Sol runtime that touches raw memory lives here, so the
//! object layer can keep `unsafe_code = "deny"`.
//!
//! # Pieces
//!
//! - **Allocation**: [`raw_alloc`], [`raw_free`] and the owning [`Block`].
//! - **Formats**: [`Format`], the 18 wire formats a buffer can be read or
//!   written as, and [`Scalar`], the decoded value.
//! - **Views**: [`Region`] (bounds-checked, sized) and [`Unbounded`] (no
//!   bound check, explicit opt-in), unified as [`View`].
//!
//! # Safety
//!
//! Views carry raw addresses. Constructing a view is safe; the object layer
//! guarantees that every view it builds points into memory it keeps alive
//! (an owned [`Block`], an anchored parent buffer, or an embedded object).
//! Views built from user-supplied addresses ([`Region::at_address`],
//! [`Unbounded::at_address`]) are the deliberate escape hatch for native
//! interop: the script that builds them bears responsibility for validity.

#![warn(clippy::allow_attributes_without_reason)]
#![allow(
    clippy::not_unsafe_ptr_arg_deref,
    reason = "views receive addresses validated by the object layer"
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_ptr_alignment,
    reason = "wire formats reinterpret integers at fixed widths; casts are the point"
)]

mod alloc;
mod format;
mod view;

pub use alloc::{raw_alloc, raw_free, Block};
pub use format::{Format, Scalar};
pub use view::{Region, Unbounded, View};

/// First offset at which `needle` occurs in `haystack`.
///
/// An empty needle matches at offset 0.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
