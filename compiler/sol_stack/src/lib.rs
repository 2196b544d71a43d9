//! Stack growth guard for recursive runtime operations.
//!
//! Rendering, comparing, printing and calling nested Sol values recurse on
//! the native stack. A list nested a hundred thousand levels deep would
//! overflow a fixed thread stack, so every recursive entry point in the
//! runtime goes through [`with_stack_headroom`].
//!
//! # Platform Support
//!
//! - **Native targets**: grows the stack on demand through `stacker`.
//! - **WASM targets**: plain passthrough.
//!
//! # Sizes
//!
//! - **Headroom**: 128KB. Below this we switch to a fresh segment.
//! - **Segment**: 2MB per growth step.

/// Minimum remaining stack before a new segment is allocated.
const HEADROOM: usize = 128 * 1024;

/// Size of each additional stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f` with at least [`HEADROOM`] bytes of stack available.
///
/// ```text
/// fn repr_list(state: &mut State, list: &Object) -> SolResult<String> {
///     with_stack_headroom(|| {
///         // ... render each element, recursing into nested lists ...
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack_headroom<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(HEADROOM, SEGMENT, f)
}

/// WASM manages its own stack; call straight through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn with_stack_headroom<R>(f: impl FnOnce() -> R) -> R {
    f()
}
