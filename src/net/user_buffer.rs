/*!
 * User Buffer
 * Sequential copy-out into a caller-supplied byte region
 *
 * Used when a call returns a variable number of records (e.g. interface or
 * route listings) into one buffer. The first failure latches: every later
 * operation is a no-op that reports the same error, so callers can push a
 * whole batch and check `status()` once.
 */

use crate::core::errors::StackError;
use crate::core::types::StackResult;

pub struct UserBuffer<'a> {
    buffer: &'a mut [u8],
    consumed: usize,
    status: StackResult<()>,
}

impl<'a> UserBuffer<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            consumed: 0,
            status: Ok(()),
        }
    }

    /// Copy `source` in, returning the region it now occupies
    pub fn push(&mut self, source: &[u8]) -> Option<&mut [u8]> {
        self.reserve(source.len()).ok()?;
        let start = self.consumed;
        let end = start + source.len();
        self.buffer[start..end].copy_from_slice(source);
        self.consumed = end;
        Some(&mut self.buffer[start..end])
    }

    /// Zero-fill the next `length` bytes
    pub fn pad(&mut self, length: usize) -> StackResult<()> {
        self.reserve(length)?;
        let start = self.consumed;
        self.buffer[start..start + length].fill(0);
        self.consumed += length;
        Ok(())
    }

    /// Zero-fill up to the next multiple of `alignment`
    pub fn pad_to_next(&mut self, alignment: usize) -> StackResult<()> {
        if alignment == 0 {
            return Err(StackError::InvalidOperation(
                "pad alignment must be non-zero".into(),
            ));
        }
        let aligned = self.consumed.div_ceil(alignment) * alignment;
        self.pad(aligned - self.consumed)
    }

    fn reserve(&mut self, length: usize) -> StackResult<()> {
        self.status.clone()?;
        let available = self.available();
        if available < length {
            let err = StackError::NoBufferSpace {
                requested: length,
                available,
            };
            self.status = Err(err.clone());
            return Err(err);
        }
        Ok(())
    }

    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    pub fn available(&self) -> usize {
        self.buffer.len() - self.consumed
    }

    /// First error hit, if any
    pub fn status(&self) -> StackResult<()> {
        self.status.clone()
    }
}
