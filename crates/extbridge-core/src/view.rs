//! Offset-addressed views over host arrays.
//!
//! Native code addresses array contents the way it addresses raw memory: a
//! base pointer plus a byte offset. [`ArrayView`] reproduces that over a
//! host array by translating byte offsets into element indices at a fixed
//! stride of one pointer-width slot per element.
//!
//! A view is non-owning and only valid within the native call it was
//! created for: the host may resize or rewrite the backing array between
//! calls, and the view adds no synchronization of its own.

use crate::heap::HostHeap;
use crate::ids::ArrayId;
use crate::value::Value;

/// Byte width of one element slot.
pub const SLOT_STRIDE: usize = 8;

/// A temporary, non-owning, offset-addressed view over a host array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayView {
    array: ArrayId,
}

impl ArrayView {
    /// Create a view over the given array.
    pub fn new(array: ArrayId) -> Self {
        Self { array }
    }

    /// The backing array.
    pub fn array(&self) -> ArrayId {
        self.array
    }

    /// Element count of the backing array (not byte length).
    pub fn len(&self, heap: &HostHeap) -> usize {
        heap.array_len(self.array)
    }

    /// Whether the backing array is empty.
    pub fn is_empty(&self, heap: &HostHeap) -> bool {
        self.len(heap) == 0
    }

    /// Read the element at a byte offset.
    ///
    /// The array's own indexing policy applies past the end (reads yield
    /// nil); this layer adds no bounds checking.
    pub fn get(&self, heap: &HostHeap, offset: usize) -> Value {
        heap.array_get(self.array, Self::index_for(offset))
    }

    /// Write the element at a byte offset.
    ///
    /// Writing past the end extends the array with nils, per the array's
    /// own policy.
    pub fn set(&self, heap: &mut HostHeap, offset: usize, value: Value) {
        heap.array_set(self.array, Self::index_for(offset), value);
    }

    /// Translate a byte offset into an element index.
    ///
    /// Integer division by [`SLOT_STRIDE`]: an offset that is not a
    /// multiple of the stride addresses the element containing it. Callers
    /// advancing by anything other than whole slots will misaddress.
    fn index_for(offset: usize) -> usize {
        offset / SLOT_STRIDE
    }
}
