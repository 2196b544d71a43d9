//! Sol Object - Object model and runtime library for the Sol interpreter.
//!
//! Every Sol value is a reference-counted [`Object`]. Behavior is looked up
//! per [`ObjType`] and [`Op`] in a fixed handler table, and everything a
//! running program shares lives in a [`State`].
//!
//! # Architecture
//!
//! - `object`: the handle, payloads and weak references
//! - `ops`: the per-type handler tables and method maps
//! - `map`: ordered maps with type-aware key comparison
//! - `buffer` / `stream`: raw memory views and file streams
//! - `iter`: stepping functions driven by a caller-held scratch map
//! - `repr`: cycle-safe rendering
//! - `builtins`: the global library installed into every state
//!
//! Parsing and evaluation live elsewhere; an [`Evaluator`] attached to the
//! state runs function bodies and AST nodes.

pub mod ast;
pub mod buffer;
mod builtins;
pub mod errors;
mod iter;
pub mod map;
pub mod object;
pub mod ops;
pub mod print_handler;
mod repr;
mod state;
pub mod stream;

#[cfg(test)]
mod testing;

use std::sync::Once;

pub use errors::{Raised, RuntimeError, SolResult};
pub use object::{Function, NativeFn, ObjType, Object, Payload, WeakObject};
pub use ops::{Op, TypeFlags};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use state::{Evaluator, LibraryLoader, State, StateBuilder, StateConfig};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Enable with `RUST_LOG=sol_object=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
