use crate::buffer::{take_at_least, BufferManager, PooledBuffer};
use crate::errors::*;
use crate::message::{Message, MessageVersion};
use error_chain::bail;
use bytes::Bytes;
use std::io::prelude::*;
use std::sync::Arc;

mod binary;
mod compressing;
mod factory;
mod text;

pub use binary::{BinaryMessageEncoder, BinaryMessageEncoderFactory};
pub use compressing::CompressionEncoder;
pub use factory::CompressionEncoderFactory;
pub use text::{TextMessageEncoder, TextMessageEncoderFactory};

/// Default bound on the size of message headers read from a stream
pub const DEFAULT_MAX_SIZE_OF_HEADERS: usize = 64 * 1024;

/// Converts between messages and wire bytes, either through pooled buffers or streams.
///
/// Implementations hold no per-call state and may be shared between threads.
pub trait MessageEncoder: Send + Sync {
    fn content_type(&self) -> &str;

    fn media_type(&self) -> &str;

    fn message_version(&self) -> MessageVersion;

    /// Whether a transport content type names this encoder's media type. Parameters such as
    /// `charset` are ignored.
    fn is_content_type_supported(&self, content_type: &str) -> bool {
        let media_type = media_type_of(content_type);
        media_type.eq_ignore_ascii_case(self.media_type())
            || media_type.eq_ignore_ascii_case(media_type_of(self.content_type()))
    }

    /// Decodes a message from `buffer`, which the encoder takes ownership of and eventually
    /// returns to `buffer_manager`.
    fn read_message(
        &self,
        buffer: PooledBuffer,
        buffer_manager: &dyn BufferManager,
        content_type: &str,
    ) -> Result<Message>;

    /// Encodes `message` into a buffer taken from `buffer_manager`, leaving `message_offset`
    /// bytes in front of the payload. The caller owns the returned buffer.
    fn write_message(
        &self,
        message: Message,
        max_message_size: usize,
        buffer_manager: &dyn BufferManager,
        message_offset: usize,
    ) -> Result<PooledBuffer>;

    /// Decodes a message from a transport stream. The message takes ownership of the stream and
    /// closes it when the message is closed.
    fn read_message_from_stream(
        &self,
        stream: Box<dyn Read + Send>,
        max_size_of_headers: usize,
        content_type: &str,
    ) -> Result<Message>;

    fn write_message_to_stream(&self, message: Message, stream: &mut dyn Write) -> Result<()>;
}

/// Produces the encoders a channel uses.
pub trait MessageEncoderFactory: Send + Sync {
    /// Encoder shared by sessionless channels
    fn encoder(&self) -> Arc<dyn MessageEncoder>;

    fn message_version(&self) -> MessageVersion {
        self.encoder().message_version()
    }

    /// A new encoder for one session. Encoders from separate calls never share state.
    fn create_session_encoder(&self) -> Arc<dyn MessageEncoder>;
}

fn media_type_of(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// Copies an encoded message into a pooled buffer after `message_offset` reserved bytes.
fn write_to_pool(
    encoded: &[u8],
    max_message_size: usize,
    buffer_manager: &dyn BufferManager,
    message_offset: usize,
) -> Result<PooledBuffer> {
    if encoded.len() > max_message_size {
        bail!(ErrorKind::InnerEncoder(format!(
            "message of {} bytes exceeds the maximum message size of {} bytes",
            encoded.len(),
            max_message_size
        )));
    }
    let total_len = message_offset
        .checked_add(encoded.len())
        .ok_or(ErrorKind::Allocation(usize::MAX))?;
    let mut array = take_at_least(buffer_manager, total_len)?;
    array[message_offset..total_len].copy_from_slice(encoded);
    Ok(PooledBuffer::new(array, message_offset, encoded.len()))
}

/// Copies the payload out of `buffer` and hands the array back to the pool.
fn read_from_pool(buffer: PooledBuffer, buffer_manager: &dyn BufferManager) -> Bytes {
    let payload = Bytes::copy_from_slice(buffer.payload());
    buffer_manager.return_buffer(buffer.into_array());
    payload
}
