//! # Device Buffers
//!
//! The narrow capability a synchronized buffer wraps, plus a host-resident
//! implementation.
//!
//! A device buffer is a fixed-capacity array of [`Vertex`] elements. Reads
//! are assumed safe from any thread; mutation is only safe from the thread
//! that owns the render context.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{BufferError, BufferResult};
use crate::layout::{AttributeLayout, Vertex};

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Opaque identifier of a device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u32);

impl BufferHandle {
    /// Allocates a fresh, process-unique handle.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Fixed-capacity, indexable store of fixed-size elements.
///
/// Implemented by backend buffers (GL buffer objects, mapped staging memory)
/// and by [`HostBuffer`].
pub trait DeviceBuffer {
    /// Element type.
    type Element: Vertex;

    /// Opaque identifier of this buffer.
    fn handle(&self) -> BufferHandle;

    /// Fixed element capacity.
    fn capacity(&self) -> usize;

    /// Per-element attribute layout.
    fn layout(&self) -> &AttributeLayout;

    /// Reads the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfRange`] if `index >= capacity()`.
    fn get(&self, index: usize) -> BufferResult<Self::Element>;

    /// Writes the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfRange`] if `index >= capacity()`.
    fn set(&mut self, index: usize, value: Self::Element) -> BufferResult<()>;

    /// Copies `count` elements from `read_index` to `write_index`.
    ///
    /// Overlapping ranges behave like `memmove`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::CopyOutOfRange`] if either range leaves the buffer.
    fn copy(&mut self, read_index: usize, write_index: usize, count: usize) -> BufferResult<()>;
}

impl<B: DeviceBuffer + ?Sized> DeviceBuffer for &mut B {
    type Element = B::Element;

    #[inline]
    fn handle(&self) -> BufferHandle {
        (**self).handle()
    }

    #[inline]
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    #[inline]
    fn layout(&self) -> &AttributeLayout {
        (**self).layout()
    }

    #[inline]
    fn get(&self, index: usize) -> BufferResult<Self::Element> {
        (**self).get(index)
    }

    #[inline]
    fn set(&mut self, index: usize, value: Self::Element) -> BufferResult<()> {
        (**self).set(index, value)
    }

    #[inline]
    fn copy(&mut self, read_index: usize, write_index: usize, count: usize) -> BufferResult<()> {
        (**self).copy(read_index, write_index, count)
    }
}

/// Checks a range copy against `capacity`.
///
/// # Errors
///
/// Returns [`BufferError::CopyOutOfRange`] if either range leaves the buffer
/// or the end index overflows.
pub fn check_copy_range(
    read_index: usize,
    write_index: usize,
    count: usize,
    capacity: usize,
) -> BufferResult<()> {
    let fits = |start: usize| start.checked_add(count).is_some_and(|end| end <= capacity);
    if fits(read_index) && fits(write_index) {
        Ok(())
    } else {
        Err(BufferError::CopyOutOfRange {
            read_index,
            write_index,
            count,
            capacity,
        })
    }
}

/// Host-resident device buffer.
///
/// All slots are pre-allocated and zero-initialised at creation. Useful as a
/// staging buffer before upload and as the reference backend in tests.
///
/// # Example
///
/// ```rust,ignore
/// let mut buffer: HostBuffer<[f32; 3]> = HostBuffer::new(1024);
/// buffer.set(0, [1.0, 2.0, 3.0])?;
/// queue.write_buffer(&gpu_buffer, 0, buffer.as_bytes());
/// ```
pub struct HostBuffer<T: Vertex> {
    /// The dense element array.
    data: Box<[T]>,
    /// Layout shared by every element.
    layout: AttributeLayout,
    handle: BufferHandle,
}

impl<T: Vertex> HostBuffer<T> {
    /// Creates a zeroed buffer with the element type's own layout.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            data: vec![T::zeroed(); capacity].into_boxed_slice(),
            layout: T::layout(),
            handle: BufferHandle::next(),
        }
    }

    /// Creates a zeroed buffer with an explicit layout.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidLayout`] if the layout stride differs
    /// from the element size.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    pub fn with_layout(capacity: usize, layout: AttributeLayout) -> BufferResult<Self> {
        let element_size = std::mem::size_of::<T>();
        if layout.stride() != element_size {
            return Err(BufferError::InvalidLayout(format!(
                "stride {} does not match element size {}",
                layout.stride(),
                element_size
            )));
        }

        let mut buffer = Self::new(capacity);
        buffer.layout = layout;
        Ok(buffer)
    }

    /// Creates a buffer initialised from `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn from_slice(values: &[T]) -> Self {
        let mut buffer = Self::new(values.len());
        buffer.data.copy_from_slice(values);
        buffer
    }

    /// Returns a slice of all elements.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the raw bytes of all elements, ready for upload.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl<T: Vertex> DeviceBuffer for HostBuffer<T> {
    type Element = T;

    #[inline]
    fn handle(&self) -> BufferHandle {
        self.handle
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn layout(&self) -> &AttributeLayout {
        &self.layout
    }

    #[inline]
    fn get(&self, index: usize) -> BufferResult<T> {
        self.data
            .get(index)
            .copied()
            .ok_or(BufferError::IndexOutOfRange {
                index,
                capacity: self.data.len(),
            })
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) -> BufferResult<()> {
        let capacity = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(BufferError::IndexOutOfRange { index, capacity })?;
        *slot = value;
        Ok(())
    }

    fn copy(&mut self, read_index: usize, write_index: usize, count: usize) -> BufferResult<()> {
        check_copy_range(read_index, write_index, count, self.data.len())?;
        self.data
            .copy_within(read_index..read_index + count, write_index);
        Ok(())
    }
}

impl<T: Vertex> std::fmt::Debug for HostBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBuffer")
            .field("handle", &self.handle)
            .field("capacity", &self.data.len())
            .field("stride", &self.layout.stride())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AttributeKind, VertexAttribute};

    #[test]
    fn test_host_buffer_creation() {
        let buffer: HostBuffer<i32> = HostBuffer::new(8);
        assert_eq!(buffer.capacity(), 8);
        assert!(buffer.as_slice().iter().all(|&v| v == 0));
        assert_eq!(buffer.as_bytes().len(), 32);
    }

    #[test]
    fn test_host_buffer_get_set() {
        let mut buffer: HostBuffer<u32> = HostBuffer::new(4);
        buffer.set(2, 42).unwrap();
        assert_eq!(buffer.get(2).unwrap(), 42);
        assert_eq!(
            buffer.get(4),
            Err(BufferError::IndexOutOfRange {
                index: 4,
                capacity: 4
            })
        );
        assert!(buffer.set(10, 1).is_err());
    }

    #[test]
    fn test_host_buffer_overlapping_copy() {
        let mut buffer = HostBuffer::from_slice(&[1_i32, 2, 3, 4, 5]);
        buffer.copy(0, 1, 4).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 1, 2, 3, 4]);

        buffer.copy(1, 0, 4).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4, 4]);
    }

    #[test]
    fn test_copy_range_checks() {
        assert!(check_copy_range(0, 2, 2, 4).is_ok());
        assert!(check_copy_range(0, 0, 0, 4).is_ok());
        assert!(check_copy_range(3, 0, 2, 4).is_err());
        assert!(check_copy_range(0, 3, 2, 4).is_err());
        assert!(check_copy_range(usize::MAX, 0, 2, 4).is_err());
    }

    #[test]
    fn test_handles_are_unique() {
        let a: HostBuffer<f32> = HostBuffer::new(1);
        let b: HostBuffer<f32> = HostBuffer::new(1);
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn test_with_layout_checks_stride() {
        let layout = AttributeLayout::new(
            8,
            vec![VertexAttribute {
                location: 0,
                components: 2,
                kind: AttributeKind::F32,
                offset: 0,
            }],
        )
        .unwrap();

        assert!(HostBuffer::<[f32; 2]>::with_layout(4, layout.clone()).is_ok());
        assert!(HostBuffer::<[f32; 3]>::with_layout(4, layout).is_err());
    }

    #[test]
    fn test_borrowed_buffer_is_a_device_buffer() {
        fn fill<B: DeviceBuffer<Element = i32>>(mut buffer: B) {
            for i in 0..buffer.capacity() {
                buffer.set(i, 7).unwrap();
            }
        }

        let mut buffer: HostBuffer<i32> = HostBuffer::new(3);
        fill(&mut buffer);
        assert_eq!(buffer.as_slice(), &[7, 7, 7]);
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        let _buffer: HostBuffer<i32> = HostBuffer::new(0);
    }
}
