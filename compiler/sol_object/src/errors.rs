//! Runtime error categories and the pending-error marker.
//!
//! Every Sol error is an arbitrary object sitting in the state's single
//! pending-error slot. Errors the runtime raises itself are described by
//! [`RuntimeError`]; its `Display` text is the string installed in the slot.
//!
//! Factory functions (e.g. `integer_divide_by_zero()`) are the public way to
//! build them, mirroring how handlers read: `Err(state.raise(errors::...))`.

use crate::object::{Object, ObjType};
use crate::ops::Op;

/// Result of a runtime operation.
///
/// `Err(Raised)` means the error object is already installed in the state's
/// pending-error slot; callers propagate it with `?`.
pub type SolResult<T = Object> = Result<T, Raised>;

/// Marker proving an error is pending in the state.
///
/// Only [`crate::State`] can construct one, so an `Err` always has an error
/// object behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Raised(pub(crate) ());

/// Errors raised by the runtime itself.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    // Dispatch
    #[error("Undefined method ({op} on {type_name})")]
    NotImplemented { op: Op, type_name: &'static str },
    #[error("Expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // Arithmetic
    #[error("integer divide by zero")]
    IntegerDivideByZero,
    #[error("integer modulus by zero")]
    IntegerModulusByZero,
    #[error("floating division by zero")]
    FloatDivideByZero,

    // Containers
    #[error("Adding list to non-list")]
    ListAddNonList,
    #[error("Adding map to non-map")]
    MapAddNonMap,
    #[error("Call map without call method")]
    MapNotCallable,
    #[error("apply with non-list")]
    ApplyNonList,
    #[error("Rawget of non-map")]
    RawGetNonMap,
    #[error("Rawset of non-map")]
    RawSetNonMap,
    #[error("Compute ord of out-of-bounds index")]
    OrdOutOfBounds,

    // AST nodes
    #[error("Access NULL AST node")]
    NullAstNode,
    #[error("No evaluator attached")]
    NoEvaluator,

    // Buffers
    #[error("{action} with unsized buffer")]
    UnsizedBuffer { action: &'static str },
    #[error("invalid buffer size {0}")]
    InvalidBufferSize(i64),
    #[error("allocation of {0} bytes failed")]
    AllocationFailed(usize),

    // Streams
    #[error("Bad file open mode")]
    BadFileMode { code: i64 },
    #[error("File open failed")]
    FileOpenFailed,
    #[error("IO read error")]
    ReadFailed,
    #[error("IO write error")]
    WriteFailed,
    #[error("Operation on closed stream")]
    StreamClosed,

    // Call stack
    #[error("Function stack imbalance")]
    StackImbalance,
    #[error("maximum recursion depth of {limit} exceeded")]
    RecursionLimit { limit: usize },
}

// Factory functions

#[cold]
pub fn not_implemented(op: Op, ty: ObjType) -> RuntimeError {
    RuntimeError::NotImplemented {
        op,
        type_name: ty.name(),
    }
}

#[cold]
pub fn type_mismatch(expected: ObjType, found: ObjType) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: expected.name(),
        found: found.name(),
    }
}

#[cold]
pub fn integer_divide_by_zero() -> RuntimeError {
    RuntimeError::IntegerDivideByZero
}

#[cold]
pub fn integer_modulus_by_zero() -> RuntimeError {
    RuntimeError::IntegerModulusByZero
}

#[cold]
pub fn float_divide_by_zero() -> RuntimeError {
    RuntimeError::FloatDivideByZero
}

#[cold]
pub fn list_add_non_list() -> RuntimeError {
    RuntimeError::ListAddNonList
}

#[cold]
pub fn map_add_non_map() -> RuntimeError {
    RuntimeError::MapAddNonMap
}

#[cold]
pub fn map_not_callable() -> RuntimeError {
    RuntimeError::MapNotCallable
}

#[cold]
pub fn apply_non_list() -> RuntimeError {
    RuntimeError::ApplyNonList
}

#[cold]
pub fn rawget_non_map() -> RuntimeError {
    RuntimeError::RawGetNonMap
}

#[cold]
pub fn rawset_non_map() -> RuntimeError {
    RuntimeError::RawSetNonMap
}

#[cold]
pub fn ord_out_of_bounds() -> RuntimeError {
    RuntimeError::OrdOutOfBounds
}

#[cold]
pub fn null_ast_node() -> RuntimeError {
    RuntimeError::NullAstNode
}

#[cold]
pub fn no_evaluator() -> RuntimeError {
    RuntimeError::NoEvaluator
}

#[cold]
pub fn unsized_buffer(action: &'static str) -> RuntimeError {
    RuntimeError::UnsizedBuffer { action }
}

#[cold]
pub fn invalid_buffer_size(size: i64) -> RuntimeError {
    RuntimeError::InvalidBufferSize(size)
}

#[cold]
pub fn allocation_failed(size: usize) -> RuntimeError {
    RuntimeError::AllocationFailed(size)
}

#[cold]
pub fn bad_file_mode(code: i64) -> RuntimeError {
    RuntimeError::BadFileMode { code }
}

#[cold]
pub fn file_open_failed() -> RuntimeError {
    RuntimeError::FileOpenFailed
}

#[cold]
pub fn read_failed() -> RuntimeError {
    RuntimeError::ReadFailed
}

#[cold]
pub fn write_failed() -> RuntimeError {
    RuntimeError::WriteFailed
}

#[cold]
pub fn stream_closed() -> RuntimeError {
    RuntimeError::StreamClosed
}

#[cold]
pub fn stack_imbalance() -> RuntimeError {
    RuntimeError::StackImbalance
}

#[cold]
pub fn recursion_limit(limit: usize) -> RuntimeError {
    RuntimeError::RecursionLimit { limit }
}

#[cfg(test)]
mod tests;
