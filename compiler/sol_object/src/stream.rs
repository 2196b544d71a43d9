//! Stream payloads: open files and the standard streams.
//!
//! This layer speaks `std::io` only. The stream handlers in `ops::stream`
//! turn [`StreamError`]s into Sol errors.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

bitflags::bitflags! {
    /// Bits of an `io.open` mode code, exposed as `io.MODE_*`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ModeFlags: i64 {
        const READ = 1;
        const WRITE = 2;
        const APPEND = 4;
        const TRUNCATE = 8;
        const BINARY = 16;
    }
}

impl ModeFlags {
    /// Open options for a mode code, following the C `fopen` modes
    /// `r w r+ a a+ w+` (binary variants open identically).
    ///
    /// `None` for any combination outside that table.
    pub fn open_options(code: i64) -> Option<OpenOptions> {
        let flags = ModeFlags::from_bits(code)?.difference(ModeFlags::BINARY);
        let (read, write, append, truncate) = (
            ModeFlags::READ,
            ModeFlags::WRITE,
            ModeFlags::APPEND,
            ModeFlags::TRUNCATE,
        );
        let mut options = OpenOptions::new();
        if flags == read {
            options.read(true);
        } else if flags == write || flags == write | truncate {
            options.write(true).create(true).truncate(true);
        } else if flags == read | write {
            options.read(true).write(true);
        } else if flags == write | append {
            options.append(true).create(true);
        } else if flags == read | write | append {
            options.read(true).append(true).create(true);
        } else if flags == read | write | truncate {
            options.read(true).write(true).create(true).truncate(true);
        } else {
            return None;
        }
        Some(options)
    }
}

/// How much a read consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadAmount {
    /// Everything up to end of stream.
    All,
    /// One line including its newline, at most `chunk - 1` bytes.
    Line { chunk: usize },
    /// Up to this many bytes.
    Count(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream is closed")]
    Closed,
    #[error("bad file open mode {0}")]
    BadMode(i64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub enum StreamHandle {
    File(File),
    Stdin,
    Stdout,
    Stderr,
    Closed,
}

pub struct Stream {
    handle: StreamHandle,
    eof: bool,
}

impl Stream {
    pub fn new(handle: StreamHandle) -> Stream {
        Stream { handle, eof: false }
    }

    /// Open `path` with an `io.MODE_*` code.
    pub fn open(path: &Path, mode: i64) -> Result<Stream, StreamError> {
        let options = ModeFlags::open_options(mode).ok_or(StreamError::BadMode(mode))?;
        let file = options.open(path)?;
        Ok(Stream::new(StreamHandle::File(file)))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.handle, StreamHandle::Closed)
    }

    /// Whether the last read came up short.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Release the underlying file. Later operations fail with
    /// [`StreamError::Closed`].
    pub fn close(&mut self) {
        self.handle = StreamHandle::Closed;
    }

    /// Write all of `bytes`, returning how many were written.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        match &mut self.handle {
            StreamHandle::File(file) => file.write_all(bytes)?,
            StreamHandle::Stdout => io::stdout().lock().write_all(bytes)?,
            StreamHandle::Stderr => io::stderr().lock().write_all(bytes)?,
            StreamHandle::Stdin => return Err(unsupported("write to stdin").into()),
            StreamHandle::Closed => return Err(StreamError::Closed),
        }
        Ok(bytes.len())
    }

    pub fn read(&mut self, amount: ReadAmount) -> Result<Vec<u8>, StreamError> {
        let (bytes, short) = match &mut self.handle {
            StreamHandle::File(file) => read_from(file, amount)?,
            StreamHandle::Stdin => read_from(&mut io::stdin().lock(), amount)?,
            StreamHandle::Stdout | StreamHandle::Stderr => {
                return Err(unsupported("read from an output stream").into())
            }
            StreamHandle::Closed => return Err(StreamError::Closed),
        };
        self.eof = short;
        Ok(bytes)
    }

    /// Reposition a file stream. `whence` is 0 (start), 1 (current) or 2
    /// (end). Returns the new offset.
    pub fn seek(&mut self, offset: i64, whence: i64) -> Result<u64, StreamError> {
        let target = match whence {
            0 => SeekFrom::Start(
                u64::try_from(offset).map_err(|_| unsupported("negative seek offset"))?,
            ),
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            _ => return Err(unsupported("unknown seek origin").into()),
        };
        let position = self.file()?.seek(target)?;
        self.eof = false;
        Ok(position)
    }

    pub fn tell(&mut self) -> Result<u64, StreamError> {
        Ok(self.file()?.stream_position()?)
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        match &mut self.handle {
            StreamHandle::File(file) => file.flush()?,
            StreamHandle::Stdout => io::stdout().flush()?,
            StreamHandle::Stderr => io::stderr().flush()?,
            StreamHandle::Stdin => {}
            StreamHandle::Closed => return Err(StreamError::Closed),
        }
        Ok(())
    }

    fn file(&mut self) -> Result<&mut File, StreamError> {
        match &mut self.handle {
            StreamHandle::File(file) => Ok(file),
            StreamHandle::Closed => Err(StreamError::Closed),
            _ => Err(unsupported("seek on a standard stream").into()),
        }
    }
}

fn unsupported(what: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, what)
}

/// Read `amount` from `reader`. The flag is set when the stream ended
/// before the request was satisfied.
fn read_from(reader: &mut impl Read, amount: ReadAmount) -> io::Result<(Vec<u8>, bool)> {
    let mut bytes = Vec::new();
    match amount {
        ReadAmount::All => {
            reader.read_to_end(&mut bytes)?;
            Ok((bytes, true))
        }
        ReadAmount::Count(count) => {
            let wanted = u64::try_from(count).unwrap_or(u64::MAX);
            reader.take(wanted).read_to_end(&mut bytes)?;
            let short = bytes.len() < count;
            Ok((bytes, short))
        }
        ReadAmount::Line { chunk } => {
            let limit = chunk.saturating_sub(1);
            let mut byte = [0_u8];
            while bytes.len() < limit {
                if reader.read(&mut byte)? == 0 {
                    return Ok((bytes, true));
                }
                bytes.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Ok((bytes, false))
        }
    }
}
