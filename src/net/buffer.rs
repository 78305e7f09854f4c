/*!
 * Network Buffers
 * Buffer provider interface consumed by the queues
 */

use bytes::Bytes;
use std::fmt;

/// Byte-bearing unit handed between stack layers
///
/// Ownership moves into a queue on enqueue and back out on dequeue. Dropping
/// a buffer frees it.
pub trait NetBuffer: Send + Sized {
    /// Length in bytes, used for queue capacity accounting
    fn size(&self) -> usize;

    /// Independent copy for peeking; `None` when the copy cannot be allocated
    fn try_clone(&self) -> Option<Self>;
}

/// Immutable buffer backed by `bytes::Bytes`
///
/// Clones share storage; since the contents can never be mutated in place a
/// clone is observably an independent copy.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteBuffer {
    data: Bytes,
}

impl ByteBuffer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Buffer of `len` copies of `byte`
    pub fn filled(byte: u8, len: usize) -> Self {
        Self::new(vec![byte; len])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl NetBuffer for ByteBuffer {
    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for ByteBuffer {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("size", &self.data.len())
            .finish()
    }
}
