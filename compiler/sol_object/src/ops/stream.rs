//! Stream handlers, the `stream` method table and `io.open`.
//!
//! `stream << value` writes and `stream >> amount` reads. Reads take a
//! byte count, `"ALL"` or `"LINE"`, and return an owned buffer.

use std::path::Path;

use super::{arg, method, new_buffer, Handler, Op};
use crate::errors::{self, RuntimeError};
use crate::map::map_of;
use crate::object::{ObjType, Object, Payload};
use crate::stream::{ModeFlags, ReadAmount, Stream, StreamError};
use crate::{SolResult, State};

pub(super) fn handler(op: Op) -> Option<Handler> {
    match op {
        Op::BLsh => Some(write),
        Op::BRsh => Some(read),
        Op::Index => Some(index),
        Op::ToString => Some(tostring),
        Op::Add
        | Op::Sub
        | Op::Mul
        | Op::Div
        | Op::Mod
        | Op::Pow
        | Op::TBang
        | Op::BAnd
        | Op::BOr
        | Op::BXor
        | Op::BNot
        | Op::Cmp
        | Op::Call
        | Op::SetIndex
        | Op::Len
        | Op::Iter
        | Op::ToInt
        | Op::ToFloat
        | Op::ToBuffer
        | Op::Repr
        | Op::Init
        | Op::Free => None,
    }
}

/// The `stream` method table.
pub(crate) fn stream_methods() -> Object {
    map_of([
        ("write", Object::cfunction("stream.write", write)),
        ("read", Object::cfunction("stream.read", read)),
        ("seek", Object::cfunction("stream.seek", seek)),
        ("tell", Object::cfunction("stream.tell", tell)),
        ("flush", Object::cfunction("stream.flush", flush)),
        ("eof", Object::cfunction("stream.eof", eof)),
        ("close", Object::cfunction("stream.close", close)),
    ])
}

/// `io.open(path, mode)`.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn io_open(state: &mut State, args: &[Object]) -> SolResult {
    let path = state.to_string(&arg(state, args, 0))?;
    let mode = state.to_int(&arg(state, args, 1))?;
    if ModeFlags::open_options(mode).is_none() {
        return Err(state.raise(errors::bad_file_mode(mode)));
    }
    match Stream::open(Path::new(&path), mode) {
        Ok(stream) => Ok(Object::stream(stream)),
        Err(StreamError::BadMode(code)) => Err(state.raise(errors::bad_file_mode(code))),
        Err(err) => {
            tracing::debug!(%path, mode, error = %err, "open failed");
            Err(state.raise(errors::file_open_failed()))
        }
    }
}

/// Run `f` on the stream payload of `obj`.
fn with_stream<T>(
    state: &mut State,
    obj: &Object,
    f: impl FnOnce(&mut Stream) -> T,
) -> SolResult<T> {
    let result = match &mut *obj.borrow_mut() {
        Payload::Stream(stream) => Some(f(stream)),
        _ => None,
    };
    result.ok_or_else(|| state.raise(errors::type_mismatch(ObjType::Stream, obj.ty())))
}

/// Turn a stream failure into a Sol error, `io_error` covering plain
/// I/O failures.
fn raise_stream(
    state: &mut State,
    err: &StreamError,
    io_error: fn() -> RuntimeError,
) -> crate::Raised {
    tracing::debug!(error = %err, "stream operation failed");
    match err {
        StreamError::Closed => state.raise(errors::stream_closed()),
        StreamError::BadMode(code) => state.raise(errors::bad_file_mode(*code)),
        StreamError::Io(_) => state.raise(io_error()),
    }
}

fn write(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let value = arg(state, args, 1);
    let bytes = match &*value.borrow() {
        Payload::Buffer(buffer) => {
            Some(buffer.bytes().map(<[u8]>::to_vec).unwrap_or_default())
        }
        _ => None,
    };
    let bytes = match bytes {
        Some(bytes) => bytes,
        None => state.to_string(&value)?.into_bytes(),
    };
    match with_stream(state, &stream, |stream| stream.write(&bytes))? {
        Ok(written) => Ok(Object::int(i64::try_from(written).unwrap_or(i64::MAX))),
        Err(err) => Err(raise_stream(state, &err, errors::write_failed)),
    }
}

fn read(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let request = arg(state, args, 1);
    let amount = match request.name_bytes() {
        Some(name) if name == b"ALL" => ReadAmount::All,
        Some(name) if name == b"LINE" => ReadAmount::Line {
            chunk: state.config().line_chunk,
        },
        Some(_) => return Ok(state.none()),
        None => ReadAmount::Count(usize::try_from(state.to_int(&request)?).unwrap_or(0)),
    };
    match with_stream(state, &stream, |stream| stream.read(amount))? {
        Ok(bytes) => new_buffer(state, &bytes),
        Err(err) => Err(raise_stream(state, &err, errors::read_failed)),
    }
}

fn index(state: &mut State, args: &[Object]) -> SolResult {
    let key = arg(state, args, 1);
    Ok(method(state, ObjType::Stream, &key))
}

fn tostring(_state: &mut State, _args: &[Object]) -> SolResult {
    Ok(Object::string("<Stream>"))
}

// Methods

/// 0 on success, -1 on an I/O failure. A closed stream is an error.
fn status<T>(
    state: &mut State,
    result: Result<T, StreamError>,
    ok: impl FnOnce(T) -> i64,
) -> SolResult {
    match result {
        Ok(value) => Ok(Object::int(ok(value))),
        Err(StreamError::Closed) => Err(state.raise(errors::stream_closed())),
        Err(err) => {
            tracing::debug!(error = %err, "stream operation failed");
            Ok(Object::int(-1))
        }
    }
}

fn seek(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let offset = state.to_int(&arg(state, args, 1))?;
    let whence = state.to_int(&arg(state, args, 2))?;
    let result = with_stream(state, &stream, |stream| stream.seek(offset, whence))?;
    status(state, result, |_| 0)
}

fn tell(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let result = with_stream(state, &stream, Stream::tell)?;
    status(state, result, |offset| i64::try_from(offset).unwrap_or(-1))
}

fn flush(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let result = with_stream(state, &stream, Stream::flush)?;
    status(state, result, |()| 0)
}

fn eof(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    let at_end = with_stream(state, &stream, |stream| stream.is_eof())?;
    Ok(Object::int(i64::from(at_end)))
}

fn close(state: &mut State, args: &[Object]) -> SolResult {
    let stream = arg(state, args, 0);
    with_stream(state, &stream, Stream::close)?;
    Ok(state.none())
}
