use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use super::split::CHUNK_BYTES;

/// Heap buffer whose first byte sits on a [`CHUNK_BYTES`] boundary.
///
/// Scratch space for the streaming path. Move-only: there is no `Clone`, and
/// the allocation is released exactly once, in `Drop`.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

// SAFETY: AlignedBuffer uniquely owns its allocation, like Box<[u8]>.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `len` zeroed bytes aligned to [`CHUNK_BYTES`].
    ///
    /// Aborts the process if the allocator fails: streaming has no fallback
    /// without its scratch buffer.
    pub fn allocate(len: usize) -> AlignedBuffer {
        // Zero-sized layouts are not allowed; round up to one chunk.
        let size = len.max(1).next_multiple_of(CHUNK_BYTES);
        let layout = match Layout::from_size_align(size, CHUNK_BYTES) {
            Ok(layout) => layout,
            Err(_) => {
                eprintln!("AlignedBuffer::allocate: invalid size {}", len);
                std::process::abort();
            }
        };

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        AlignedBuffer { ptr, len, layout }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `layout.size() >= len` initialized bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self gives exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `allocate` with exactly this layout, and Drop
        // runs once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
