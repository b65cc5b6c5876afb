use crate::buffer::{take_at_least, BufferManager, PooledBuffer};
use crate::compression::{compress, Algorithm, Decompressor};
use crate::errors::*;
use std::io::prelude::*;

/// Size of the scratch block borrowed from the pool while inflating
pub const DECOMPRESS_BLOCK_SIZE: usize = 1024;

/// Compresses the payload of `buffer` into a new pooled buffer whose payload starts at
/// `message_offset`. Bytes before `message_offset` are left for the transport's framing.
///
/// `buffer` goes back to `buffer_manager` whether or not compression succeeds.
pub fn compress_buffer(
    buffer: PooledBuffer,
    buffer_manager: &dyn BufferManager,
    message_offset: usize,
    algorithm: Algorithm,
) -> Result<PooledBuffer> {
    let compressed = compress_into_pool(buffer.payload(), buffer_manager, message_offset, algorithm);
    buffer_manager.return_buffer(buffer.into_array());
    compressed
}

/// Decompresses the payload of `buffer` into a new pooled buffer. The bytes before
/// `buffer.offset()` are copied over unchanged and the payload keeps the same offset.
///
/// `buffer` goes back to `buffer_manager` whether or not decompression succeeds.
pub fn decompress_buffer(
    buffer: PooledBuffer,
    buffer_manager: &dyn BufferManager,
    algorithm: Algorithm,
) -> Result<PooledBuffer> {
    let decompressed = decompress_into_pool(&buffer, buffer_manager, algorithm);
    buffer_manager.return_buffer(buffer.into_array());
    decompressed
}

fn compress_into_pool(
    payload: &[u8],
    buffer_manager: &dyn BufferManager,
    message_offset: usize,
    algorithm: Algorithm,
) -> Result<PooledBuffer> {
    let compressed = compress(payload, algorithm)?;

    let total_len = message_offset
        .checked_add(compressed.len())
        .ok_or(ErrorKind::Allocation(usize::MAX))?;
    let mut array = take_at_least(buffer_manager, total_len)?;
    array[message_offset..total_len].copy_from_slice(&compressed);

    Ok(PooledBuffer::new(array, message_offset, compressed.len()))
}

fn decompress_into_pool(
    buffer: &PooledBuffer,
    buffer_manager: &dyn BufferManager,
    algorithm: Algorithm,
) -> Result<PooledBuffer> {
    let mut decompressed = Vec::new();
    let mut block = take_at_least(buffer_manager, DECOMPRESS_BLOCK_SIZE)?;
    let inflated = {
        let mut decompressor = Decompressor::new(buffer.payload(), algorithm);
        inflate_blocks(
            &mut decompressor,
            &mut block[..DECOMPRESS_BLOCK_SIZE],
            &mut decompressed,
        )
    };
    buffer_manager.return_buffer(block);
    inflated.chain_err(|| ErrorKind::Decompression)?;

    let offset = buffer.offset();
    let total_len = offset + decompressed.len();
    let mut array = take_at_least(buffer_manager, total_len)?;
    array[..offset].copy_from_slice(&buffer.array()[..offset]);
    array[offset..total_len].copy_from_slice(&decompressed);

    Ok(PooledBuffer::new(array, offset, decompressed.len()))
}

fn inflate_blocks<R: Read>(
    decompressor: &mut R,
    block: &mut [u8],
    sink: &mut Vec<u8>,
) -> std::io::Result<()> {
    loop {
        match decompressor.read(block) {
            Ok(0) => return Ok(()),
            Ok(n) => sink.extend_from_slice(&block[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
