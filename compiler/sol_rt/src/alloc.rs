//! Raw allocation and the owning [`Block`].

use std::alloc::Layout;
use std::ptr::NonNull;

/// Alignment used for every runtime allocation.
///
/// Buffers are read at arbitrary formats, so they get the widest scalar
/// alignment even though all accesses are unaligned-safe.
const BLOCK_ALIGN: usize = 16;

/// Allocate `size` zeroed bytes with the given alignment.
///
/// Returns null for a zero size or an invalid layout.
pub fn raw_alloc(size: usize, align: usize) -> *mut u8 {
    if size == 0 {
        return std::ptr::null_mut();
    }

    let align = align.max(8);
    let Ok(layout) = Layout::from_size_align(size, align) else {
        return std::ptr::null_mut();
    };

    // SAFETY: Layout is valid (size > 0, alignment is a power of two)
    unsafe { std::alloc::alloc_zeroed(layout) }
}

/// Free memory previously returned by [`raw_alloc`].
///
/// Null pointers and zero sizes are ignored.
pub fn raw_free(ptr: *mut u8, size: usize, align: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }

    let align = align.max(8);
    let Ok(layout) = Layout::from_size_align(size, align) else {
        return;
    };

    // SAFETY: ptr came from raw_alloc with this same size and alignment
    unsafe { std::alloc::dealloc(ptr, layout) }
}

/// An exclusively owned, zero-initialized allocation.
///
/// This is the storage behind owned buffers. The memory is released when
/// the block is dropped, exactly once.
pub struct Block {
    ptr: NonNull<u8>,
    len: usize,
}

impl Block {
    /// Allocate `len` zeroed bytes. `None` when the allocator refuses.
    pub fn zeroed(len: usize) -> Option<Block> {
        if len == 0 {
            return Some(Block {
                ptr: NonNull::dangling(),
                len: 0,
            });
        }
        let ptr = NonNull::new(raw_alloc(len, BLOCK_ALIGN))?;
        Some(Block { ptr, len })
    }

    /// Allocate a block holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Block> {
        let block = Block::zeroed(bytes.len())?;
        if !bytes.is_empty() {
            // SAFETY: block owns exactly bytes.len() fresh bytes; the source
            // is a live slice that cannot overlap a new allocation
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), block.ptr.as_ptr(), bytes.len());
            }
        }
        Some(block)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Base address of the allocation.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Sized view over the whole block.
    pub fn region(&self) -> crate::Region {
        crate::Region::new(self.ptr.as_ptr(), self.len)
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        raw_free(self.ptr.as_ptr(), self.len, BLOCK_ALIGN);
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
