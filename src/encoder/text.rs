use crate::buffer::{BufferManager, PooledBuffer};
use crate::encoder::{read_from_pool, write_to_pool, MessageEncoder, MessageEncoderFactory};
use crate::errors::*;
use crate::message::{Message, MessageBody, MessageVersion};
use error_chain::bail;
use std::io::prelude::*;
use std::sync::Arc;

/// Encodes messages as their UTF-8 envelope text, unchanged.
#[derive(Debug)]
pub struct TextMessageEncoder {
    version: MessageVersion,
}

impl TextMessageEncoder {
    pub fn new(version: MessageVersion) -> TextMessageEncoder {
        TextMessageEncoder { version }
    }
}

impl MessageEncoder for TextMessageEncoder {
    fn content_type(&self) -> &str {
        match self.version {
            MessageVersion::Soap11 => "text/xml; charset=utf-8",
            MessageVersion::Soap12WSAddressing10 => "application/soap+xml; charset=utf-8",
            MessageVersion::None => "application/xml; charset=utf-8",
        }
    }

    fn media_type(&self) -> &str {
        match self.version {
            MessageVersion::Soap11 => "text/xml",
            MessageVersion::Soap12WSAddressing10 => "application/soap+xml",
            MessageVersion::None => "application/xml",
        }
    }

    fn message_version(&self) -> MessageVersion {
        self.version
    }

    fn read_message(
        &self,
        buffer: PooledBuffer,
        buffer_manager: &dyn BufferManager,
        _content_type: &str,
    ) -> Result<Message> {
        let body = read_from_pool(buffer, buffer_manager);
        if let Err(e) = std::str::from_utf8(&body) {
            bail!(ErrorKind::InnerEncoder(format!(
                "message text is not valid UTF-8: {}",
                e
            )));
        }
        Ok(Message::new(self.version, body))
    }

    fn write_message(
        &self,
        message: Message,
        max_message_size: usize,
        buffer_manager: &dyn BufferManager,
        message_offset: usize,
    ) -> Result<PooledBuffer> {
        let body = message.into_body().into_bytes()?;
        write_to_pool(&body, max_message_size, buffer_manager, message_offset)
    }

    fn read_message_from_stream(
        &self,
        stream: Box<dyn Read + Send>,
        _max_size_of_headers: usize,
        _content_type: &str,
    ) -> Result<Message> {
        Ok(Message::from_stream(self.version, stream))
    }

    fn write_message_to_stream(&self, message: Message, stream: &mut dyn Write) -> Result<()> {
        match message.into_body() {
            MessageBody::Buffered(body) => stream.write_all(&body)?,
            MessageBody::Streamed(mut reader) => {
                std::io::copy(&mut reader, stream)?;
            }
        }
        stream.flush()?;
        Ok(())
    }
}

pub struct TextMessageEncoderFactory {
    encoder: Arc<TextMessageEncoder>,
}

impl TextMessageEncoderFactory {
    pub fn new(version: MessageVersion) -> TextMessageEncoderFactory {
        TextMessageEncoderFactory {
            encoder: Arc::new(TextMessageEncoder::new(version)),
        }
    }
}

impl MessageEncoderFactory for TextMessageEncoderFactory {
    fn encoder(&self) -> Arc<dyn MessageEncoder> {
        self.encoder.clone()
    }

    fn message_version(&self) -> MessageVersion {
        self.encoder.message_version()
    }

    fn create_session_encoder(&self) -> Arc<dyn MessageEncoder> {
        Arc::new(TextMessageEncoder::new(self.encoder.message_version()))
    }
}
