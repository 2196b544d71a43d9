//! The builtin library every state starts with.
//!
//! [`install`] fills the globals with the conversion and utility functions,
//! the library maps (`debug`, `iter`, `buffer`, `io`, `ffi`) and the
//! `None` sentinel, then registers the per-type method tables.

mod debug;
mod prelude;

use crate::iter::iter_functions;
use crate::map::map_of;
use crate::object::{NativeFn, ObjType, Object};
use crate::ops::{
    buffer_constructors, buffer_methods, ffi_open, io_open, list_methods, stream_methods,
    string_methods,
};
use crate::stream::{ModeFlags, Stream, StreamHandle};
use crate::State;

/// Register every builtin into `state`.
pub(crate) fn install(state: &mut State) {
    let globals = state.globals();
    let register = |name: &str, body: NativeFn| {
        state.map_set_name(&globals, name, Object::cfunction(name, body));
    };

    // Conversions
    register("toint", prelude::toint);
    register("tofloat", prelude::tofloat);
    register("tostring", prelude::tostring);
    register("tobuffer", prelude::tobuffer);
    register("type", prelude::type_of);

    // Errors and calls
    register("try", prelude::try_call);
    register("apply", prelude::apply);
    register("error", prelude::error);

    // Output
    register("print", prelude::print);
    register("prepr", prelude::prepr);

    // Utilities
    register("rawget", prelude::rawget);
    register("rawset", prelude::rawset);
    register("range", prelude::range);
    register("ord", prelude::ord);
    register("chr", prelude::chr);

    state.map_set_name(&globals, "None", state.none());

    // Library maps
    state.map_set_name(&globals, "debug", debug::debug_functions());
    state.map_set_name(&globals, "iter", iter_functions());
    state.map_set_name(&globals, "buffer", buffer_constructors());
    state.map_set_name(&globals, "io", io_functions());
    state.map_set_name(
        &globals,
        "ffi",
        map_of([("open", Object::cfunction("ffi.open", ffi_open))]),
    );

    // Method tables
    let tables = state.method_tables();
    for (ty, methods) in [
        (ObjType::Str, string_methods()),
        (ObjType::List, list_methods()),
        (ObjType::Buffer, buffer_methods()),
        (ObjType::Stream, stream_methods()),
    ] {
        state.map_set_name(&tables, ty.name(), methods);
    }
}

/// The `io` map: `open`, the mode bits, the seek origins and the standard
/// streams.
fn io_functions() -> Object {
    let standard = |handle| Object::stream(Stream::new(handle));
    map_of([
        ("open", Object::cfunction("io.open", io_open)),
        ("MODE_READ", Object::int(ModeFlags::READ.bits())),
        ("MODE_WRITE", Object::int(ModeFlags::WRITE.bits())),
        ("MODE_APPEND", Object::int(ModeFlags::APPEND.bits())),
        ("MODE_TRUNCATE", Object::int(ModeFlags::TRUNCATE.bits())),
        ("MODE_BINARY", Object::int(ModeFlags::BINARY.bits())),
        ("SEEK_SET", Object::int(0)),
        ("SEEK_CUR", Object::int(1)),
        ("SEEK_END", Object::int(2)),
        ("stdin", standard(StreamHandle::Stdin)),
        ("stdout", standard(StreamHandle::Stdout)),
        ("stderr", standard(StreamHandle::Stderr)),
    ])
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
