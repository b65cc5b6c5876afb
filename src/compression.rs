use crate::errors::*;
use std::io::prelude::*;

mod algorithm;
mod buffered;
mod compressor;

pub use algorithm::{Algorithm, DEFLATE_CONTENT_TYPE, GZIP_CONTENT_TYPE};
pub use buffered::{compress_buffer, decompress_buffer, DECOMPRESS_BLOCK_SIZE};
pub use compressor::{Compressor, Decompressor};

/// Compresses `buf` into a new, fully finalized stream.
pub fn compress(buf: &[u8], algorithm: Algorithm) -> Result<Vec<u8>> {
    let mut compressor = Compressor::new(Vec::new(), algorithm);
    compressor
        .write_all(buf)
        .chain_err(|| ErrorKind::Compression)?;
    compressor.finish().chain_err(|| ErrorKind::Compression)
}

/// Decompresses a complete stream produced by `compress()` with the same algorithm.
pub fn decompress(buf: &[u8], algorithm: Algorithm) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    Decompressor::new(buf, algorithm)
        .read_to_end(&mut decompressed)
        .chain_err(|| ErrorKind::Decompression)?;
    Ok(decompressed)
}
