//! Buffer payloads: a raw memory view plus the means to keep it valid.
//!
//! A buffer never owns its memory through a raw pointer. The view is kept
//! valid by one of:
//! - an owned [`Block`] (freed when the buffer dies);
//! - a boxed resource (dropped when the buffer dies);
//! - anchors: handles to the objects whose memory the view points into.
//!
//! Borrowed views of foreign memory (`buffer.fromaddress`) have no keeper;
//! the script that made them vouches for the address.

use std::any::Any;

use sol_rt::{Block, Region, Unbounded, View};

use crate::Object;

/// Who releases a buffer's memory.
pub enum Ownership {
    /// Nothing is released.
    Borrowed,
    /// The block is freed with the buffer.
    Owned(Block),
    /// The resource is dropped with the buffer.
    Callback(Box<dyn Any>),
}

pub struct Buffer {
    view: View,
    ownership: Ownership,
    anchors: Vec<Object>,
}

impl Buffer {
    /// A buffer owning `block`.
    pub fn owned(block: Block) -> Buffer {
        Buffer {
            view: View::Sized(block.region()),
            ownership: Ownership::Owned(block),
            anchors: Vec::new(),
        }
    }

    /// An owned, zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Option<Buffer> {
        Block::zeroed(len).map(Buffer::owned)
    }

    /// An owned copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Buffer> {
        Block::from_bytes(bytes).map(Buffer::owned)
    }

    /// A view over memory this buffer does not own.
    pub fn borrowed(view: View) -> Buffer {
        Buffer {
            view,
            ownership: Ownership::Borrowed,
            anchors: Vec::new(),
        }
    }

    /// A buffer whose lifetime owns `resource`.
    ///
    /// The view is a zero-length region at the resource's address: scripts
    /// can see where it lives but cannot read or write through it.
    pub fn with_resource(resource: Box<dyn Any>) -> Buffer {
        let address = std::ptr::from_ref::<dyn Any>(resource.as_ref()).cast::<u8>() as usize;
        Buffer {
            view: View::Sized(Region::at_address(address, 0)),
            ownership: Ownership::Callback(resource),
            anchors: Vec::new(),
        }
    }

    /// Like [`Buffer::with_resource`], but reporting `address` as the view.
    pub fn with_resource_at(resource: Box<dyn Any>, address: usize) -> Buffer {
        Buffer {
            view: View::Sized(Region::at_address(address, 0)),
            ownership: Ownership::Callback(resource),
            anchors: Vec::new(),
        }
    }

    /// An unsized borrowed view at `address`.
    pub fn unsized_at(address: usize) -> Buffer {
        Buffer::borrowed(View::Unsized(Unbounded::at_address(address)))
    }

    /// Keep `obj` alive for as long as this buffer lives.
    pub fn anchor(&mut self, obj: Object) {
        self.anchors.push(obj);
    }

    #[must_use]
    pub fn anchored(mut self, obj: Object) -> Buffer {
        self.anchor(obj);
        self
    }

    pub fn anchors(&self) -> &[Object] {
        &self.anchors
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Signed size: the length, or `-1` when unsized.
    pub fn size(&self) -> i64 {
        self.view.size()
    }

    pub fn address(&self) -> usize {
        self.view.address()
    }

    pub fn is_sized(&self) -> bool {
        self.view.sized().is_some()
    }

    /// All bytes of a sized buffer.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.view.sized().map(Region::bytes)
    }

    /// Bytes of a sized buffer up to the first NUL.
    pub fn c_bytes(&self) -> Option<&[u8]> {
        let bytes = self.bytes()?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(&bytes[..end])
    }

    /// Text form: the bytes up to the first NUL, or `<UNSIZED_BUFFER>`.
    pub fn text(&self) -> String {
        match self.c_bytes() {
            Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            None => "<UNSIZED_BUFFER>".to_owned(),
        }
    }

    /// The boxed resource, if it is a `T`.
    pub fn resource<T: Any>(&self) -> Option<&T> {
        match &self.ownership {
            Ownership::Callback(resource) => resource.downcast_ref(),
            _ => None,
        }
    }

    pub fn resource_mut<T: Any>(&mut self) -> Option<&mut T> {
        match &mut self.ownership {
            Ownership::Callback(resource) => resource.downcast_mut(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
