use crate::errors::*;
use error_chain::bail;

mod pool;

pub use pool::BufferPool;

/// A byte range `[offset, offset + count)` inside an array borrowed from a `BufferManager`.
///
/// Whoever holds a `PooledBuffer` owns the whole array until it is handed back with
/// `BufferManager::return_buffer(buffer.into_array())`.
#[derive(Debug)]
pub struct PooledBuffer {
    array: Vec<u8>,
    offset: usize,
    count: usize,
}

impl PooledBuffer {
    /// # Panics
    ///
    /// Panics if the range does not fit inside `array`.
    pub fn new(array: Vec<u8>, offset: usize, count: usize) -> PooledBuffer {
        assert!(
            offset
                .checked_add(count)
                .map_or(false, |end| end <= array.len()),
            "range {}+{} does not fit in a buffer of {} bytes",
            offset,
            count,
            array.len()
        );
        PooledBuffer {
            array,
            offset,
            count,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The whole backing array, including any bytes before `offset`.
    pub fn array(&self) -> &[u8] {
        &self.array
    }

    pub fn array_mut(&mut self) -> &mut [u8] {
        &mut self.array
    }

    /// The `count` bytes starting at `offset`.
    pub fn payload(&self) -> &[u8] {
        &self.array[self.offset..self.offset + self.count]
    }

    pub fn into_array(self) -> Vec<u8> {
        self.array
    }
}

/// Pooled allocator of byte arrays supplied by the host.
pub trait BufferManager: Send + Sync {
    /// Returns an array of at least `min_size` bytes. Its contents are indeterminate.
    fn take(&self, min_size: usize) -> Result<Vec<u8>>;

    /// Hands an array back to the pool. The array may have come from `take()` or from the host.
    fn return_buffer(&self, array: Vec<u8>);
}

/// Takes an array from `buffer_manager`, handing it straight back if it is shorter than asked.
pub(crate) fn take_at_least(buffer_manager: &dyn BufferManager, size: usize) -> Result<Vec<u8>> {
    let array = buffer_manager.take(size)?;
    if array.len() < size {
        buffer_manager.return_buffer(array);
        bail!(ErrorKind::Allocation(size));
    }
    Ok(array)
}
