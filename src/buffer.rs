//! Shared pixel buffers and flat byte access.
//!
//! A [`Buffer`] is the externally supplied memory that views borrow. It is
//! always handled through a [`SharedBuffer`] (`Rc<Buffer>`): every view and
//! accessor that needs the bytes holds one clone, and the memory is freed
//! exactly once, when the last clone is dropped. [`Rc::strong_count`] on the
//! handle tells how many holders are outstanding.
//!
//! [`Data`] and [`DataMut`] expose the whole buffer as a byte sequence.
//! They hold the original buffer, never the view they were obtained from,
//! so a view can be dropped while its accessors live on.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use bytemuck::Pod;

use crate::error::{Error, Result};

/// Reference-counted handle to a [`Buffer`].
pub type SharedBuffer = Rc<Buffer>;

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Byte storage shared between views and accessors.
///
/// A buffer is either read-only or writable. Only writable buffers can back
/// a [`MutableImageView`](crate::MutableImageView); immutable views accept
/// both.
pub struct Buffer {
    bytes: RefCell<Vec<u8>>,
    writable: bool,
}

impl Buffer {
    /// Read-only buffer over `bytes`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> SharedBuffer {
        Rc::new(Self {
            bytes: RefCell::new(bytes.into()),
            writable: false,
        })
    }

    /// Writable buffer over `bytes`.
    pub fn new_mut(bytes: impl Into<Vec<u8>>) -> SharedBuffer {
        Rc::new(Self {
            bytes: RefCell::new(bytes.into()),
            writable: true,
        })
    }

    /// Writable, zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> SharedBuffer {
        Self::new_mut(vec![0u8; len])
    }

    /// Read-only buffer holding the native-endian bytes of `values`.
    ///
    /// ```
    /// use pixstore::Buffer;
    ///
    /// let buffer = Buffer::from_pod(&[1.0f32, 2.0]);
    /// assert_eq!(buffer.len(), 8);
    /// ```
    pub fn from_pod<T: Pod>(values: &[T]) -> SharedBuffer {
        Self::new(bytemuck::cast_slice::<T, u8>(values).to_vec())
    }

    /// Writable buffer holding the native-endian bytes of `values`.
    pub fn from_pod_mut<T: Pod>(values: &[T]) -> SharedBuffer {
        Self::new_mut(bytemuck::cast_slice::<T, u8>(values).to_vec())
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    /// Whether the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer may back a mutable view.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Borrow the bytes.
    ///
    /// Writes through views and accessors fail with
    /// [`Error::BufferBorrowed`] while the returned guard is alive.
    pub fn bytes(&self) -> Ref<'_, [u8]> {
        Ref::map(self.bytes.borrow(), Vec::as_slice)
    }

    /// Copy of the bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /// Consume the buffer and return its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_inner()
    }

    /// Copy of the bytes reinterpreted as `T` values. Trailing bytes that
    /// do not fill a whole `T` are dropped.
    pub fn to_pod_vec<T: Pod>(&self) -> Vec<T> {
        let bytes = self.bytes.borrow();
        let whole = bytes.len() - bytes.len() % size_of::<T>().max(1);
        bytemuck::pod_collect_to_vec(&bytes[..whole])
    }

    /// Run `f` over the mutable bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyBuffer`] if the buffer is not writable and
    /// [`Error::BufferBorrowed`] if its bytes are borrowed elsewhere.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        if !self.writable {
            return Err(Error::ReadOnlyBuffer);
        }
        let mut bytes = self
            .bytes
            .try_borrow_mut()
            .map_err(|_| Error::BufferBorrowed)?;
        Ok(f(bytes.as_mut_slice()))
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buffer({} bytes, {})",
            self.len(),
            if self.writable { "writable" } else { "read-only" }
        )
    }
}

// ---------------------------------------------------------------------------
// Data (flat, read-only)
// ---------------------------------------------------------------------------

/// Flat byte view over the buffer behind an image or view.
///
/// Holds a reference to the original buffer, or nothing for an empty
/// image or view.
#[derive(Clone)]
pub struct Data {
    owner: Option<SharedBuffer>,
}

impl Data {
    pub(crate) fn new(owner: Option<SharedBuffer>) -> Self {
        Self { owner }
    }

    /// The buffer kept alive by this accessor.
    #[inline]
    pub fn owner(&self) -> Option<&SharedBuffer> {
        self.owner.as_ref()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.owner.as_ref().map_or(0, |buffer| buffer.len())
    }

    /// Whether there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<u8> {
        let buffer = self.owner.as_ref()?;
        buffer.bytes().get(index).copied()
    }

    /// Copy of all bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.owner.as_ref().map_or_else(Vec::new, |buffer| buffer.to_vec())
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data({} bytes)", self.len())
    }
}

// ---------------------------------------------------------------------------
// DataMut (flat, writable)
// ---------------------------------------------------------------------------

/// Writable flat byte view. Writes land in the shared buffer.
#[derive(Clone)]
pub struct DataMut {
    inner: Data,
}

impl DataMut {
    pub(crate) fn new(owner: Option<SharedBuffer>) -> Self {
        Self {
            inner: Data::new(owner),
        }
    }

    /// Overwrite the byte at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] past the end of the buffer.
    pub fn set(&self, index: usize, value: u8) -> Result<()> {
        self.copy_from_slice(index, &[value])
    }

    /// Overwrite `src.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the range runs past the end of
    /// the buffer.
    pub fn copy_from_slice(&self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset.saturating_add(src.len());
        let out_of_bounds = Error::OutOfBounds {
            axis: 0,
            index: end.saturating_sub(1),
            size: self.inner.len(),
        };
        let Some(buffer) = self.inner.owner.as_ref() else {
            return Err(out_of_bounds);
        };
        buffer.write(|bytes| match bytes.get_mut(offset..end) {
            Some(dst) => {
                dst.copy_from_slice(src);
                Ok(())
            }
            None => Err(out_of_bounds),
        })?
    }
}

impl Deref for DataMut {
    type Target = Data;

    fn deref(&self) -> &Data {
        &self.inner
    }
}

impl fmt::Debug for DataMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataMut({} bytes)", self.len())
    }
}
