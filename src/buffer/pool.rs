use crate::buffer::BufferManager;
use crate::errors::*;
use error_chain::bail;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Smallest array the pool hands out
const MIN_BUFFER_SIZE: usize = 128;

#[derive(Default)]
struct PoolState {
    free: HashMap<usize, Vec<Vec<u8>>>,
    retained: usize,
}

/// Thread-safe `BufferManager` that keeps returned arrays in power-of-two size classes.
///
/// At most `max_pool_size` bytes are retained; a pool size of zero retains nothing and every
/// `take()` allocates. Requests larger than `max_buffer_size` fail with an allocation error.
pub struct BufferPool {
    max_pool_size: usize,
    max_buffer_size: usize,
    state: Mutex<PoolState>,
}

impl BufferPool {
    pub fn new(max_pool_size: usize, max_buffer_size: usize) -> BufferPool {
        BufferPool {
            max_pool_size,
            max_buffer_size,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Total bytes currently held for reuse.
    pub fn retained_bytes(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retained
    }

    fn size_class(min_size: usize) -> usize {
        min_size.max(MIN_BUFFER_SIZE).next_power_of_two()
    }
}

impl BufferManager for BufferPool {
    fn take(&self, min_size: usize) -> Result<Vec<u8>> {
        if min_size > self.max_buffer_size {
            bail!(ErrorKind::Allocation(min_size));
        }
        let class = BufferPool::size_class(min_size);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let reused = state.free.get_mut(&class).and_then(Vec::pop);
        match reused {
            Some(array) => {
                state.retained -= class;
                trace!(size = class, "reusing pooled buffer");
                Ok(array)
            }
            None => {
                trace!(size = class, "allocating buffer");
                Ok(vec![0; class])
            }
        }
    }

    fn return_buffer(&self, array: Vec<u8>) {
        let class = array.len();
        // Arrays that did not come from this pool are left to the allocator.
        if class < MIN_BUFFER_SIZE || !class.is_power_of_two() {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.retained + class > self.max_pool_size {
            trace!(size = class, "pool full, dropping buffer");
            return;
        }
        state.retained += class;
        trace!(size = class, retained = state.retained, "returning buffer to pool");
        state.free.entry(class).or_insert_with(Vec::new).push(array);
    }
}
