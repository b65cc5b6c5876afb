use crate::buffer::{BufferManager, PooledBuffer};
use crate::compression::{compress_buffer, decompress_buffer, Algorithm, Compressor, Decompressor};
use crate::encoder::MessageEncoder;
use crate::errors::*;
use crate::message::{Message, MessageVersion};
use std::io::prelude::*;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Encoder that compresses whatever an inner encoder produces, and decompresses before handing
/// bytes to it.
///
/// The algorithm and inner encoder are fixed at construction, so one instance can serve
/// concurrent calls as long as the inner encoder can.
pub struct CompressionEncoder {
    inner: Arc<dyn MessageEncoder>,
    algorithm: Algorithm,
    // Handed out as the `encoder` property of messages this encoder reads.
    this: Weak<CompressionEncoder>,
}

impl CompressionEncoder {
    pub fn new(inner: Arc<dyn MessageEncoder>, algorithm: Algorithm) -> Arc<CompressionEncoder> {
        Arc::new_cyclic(|this| CompressionEncoder {
            inner,
            algorithm,
            this: this.clone(),
        })
    }

    pub fn inner(&self) -> &Arc<dyn MessageEncoder> {
        &self.inner
    }

    fn stamp(&self, message: &mut Message) {
        message.properties_mut().encoder = self
            .this
            .upgrade()
            .map(|this| this as Arc<dyn MessageEncoder>);
    }
}

impl MessageEncoder for CompressionEncoder {
    fn content_type(&self) -> &str {
        self.algorithm.content_type()
    }

    fn media_type(&self) -> &str {
        self.content_type()
    }

    fn message_version(&self) -> MessageVersion {
        self.inner.message_version()
    }

    fn read_message(
        &self,
        buffer: PooledBuffer,
        buffer_manager: &dyn BufferManager,
        _content_type: &str,
    ) -> Result<Message> {
        let compressed_len = buffer.count();
        let decompressed = decompress_buffer(buffer, buffer_manager, self.algorithm)?;
        debug!(
            compressed_len,
            decompressed_len = decompressed.count(),
            algorithm = %self.algorithm,
            "decompressed message"
        );

        let mut message =
            self.inner
                .read_message(decompressed, buffer_manager, self.inner.content_type())?;
        self.stamp(&mut message);
        Ok(message)
    }

    fn write_message(
        &self,
        message: Message,
        max_message_size: usize,
        buffer_manager: &dyn BufferManager,
        message_offset: usize,
    ) -> Result<PooledBuffer> {
        // Only the outer compressed buffer needs room for transport framing.
        let buffer = self
            .inner
            .write_message(message, max_message_size, buffer_manager, 0)?;
        debug!(original_len = buffer.count(), "encoded message");

        let compressed = compress_buffer(buffer, buffer_manager, message_offset, self.algorithm)?;
        debug!(
            compressed_len = compressed.count(),
            algorithm = %self.algorithm,
            "compressed message"
        );
        Ok(compressed)
    }

    fn read_message_from_stream(
        &self,
        stream: Box<dyn Read + Send>,
        max_size_of_headers: usize,
        _content_type: &str,
    ) -> Result<Message> {
        // The decompressor owns the transport stream, so closing the message closes both.
        let decompressor = Decompressor::new(stream, self.algorithm);
        self.inner.read_message_from_stream(
            Box::new(decompressor),
            max_size_of_headers,
            self.inner.content_type(),
        )
    }

    fn write_message_to_stream(&self, message: Message, stream: &mut dyn Write) -> Result<()> {
        {
            // Dropping the compressor on an error path still writes the trailer.
            let mut compressor = Compressor::new(&mut *stream, self.algorithm);
            self.inner.write_message_to_stream(message, &mut compressor)?;
            compressor.finish().chain_err(|| ErrorKind::Compression)?;
        }

        // Flushing the compressor does not guarantee the transport itself is flushed.
        stream.flush()?;
        Ok(())
    }
}
