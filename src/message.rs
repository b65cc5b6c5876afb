use crate::encoder::MessageEncoder;
use crate::errors::*;
use bytes::Bytes;
use std::fmt;
use std::io::prelude::*;
use std::sync::Arc;

/// SOAP envelope and addressing version carried by a message
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum MessageVersion {
    /// Plain XML, no SOAP envelope
    None,
    Soap11,
    Soap12WSAddressing10,
}

impl Default for MessageVersion {
    fn default() -> Self {
        MessageVersion::Soap12WSAddressing10
    }
}

pub enum MessageBody {
    /// Fully materialized body bytes
    Buffered(Bytes),
    /// Body still to be read from the transport. Dropping the reader closes the transport.
    Streamed(Box<dyn Read + Send>),
}

impl MessageBody {
    /// Reads a streamed body to the end, closing its reader.
    pub fn into_bytes(self) -> std::io::Result<Bytes> {
        match self {
            MessageBody::Buffered(bytes) => Ok(bytes),
            MessageBody::Streamed(mut reader) => {
                let mut body = Vec::new();
                reader.read_to_end(&mut body)?;
                Ok(Bytes::from(body))
            }
        }
    }
}

impl fmt::Debug for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageBody::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            MessageBody::Streamed(_) => f.write_str("Streamed"),
        }
    }
}

#[derive(Default, Clone)]
pub struct MessageProperties {
    /// Encoder that produced this message. Later operations on the message go through it.
    pub encoder: Option<Arc<dyn MessageEncoder>>,
}

impl fmt::Debug for MessageProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageProperties")
            .field("encoder", &self.encoder.as_ref().map(|e| e.content_type().to_string()))
            .finish()
    }
}

/// A logical request or response as seen by the encoders
#[derive(Debug)]
pub struct Message {
    version: MessageVersion,
    action: Option<String>,
    body: MessageBody,
    properties: MessageProperties,
}

impl Message {
    pub fn new(version: MessageVersion, body: impl Into<Bytes>) -> Message {
        Message {
            version,
            action: None,
            body: MessageBody::Buffered(body.into()),
            properties: MessageProperties::default(),
        }
    }

    pub fn from_stream(version: MessageVersion, reader: Box<dyn Read + Send>) -> Message {
        Message {
            version,
            action: None,
            body: MessageBody::Streamed(reader),
            properties: MessageProperties::default(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Message {
        self.action = Some(action.into());
        self
    }

    pub fn version(&self) -> MessageVersion {
        self.version
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn properties(&self) -> &MessageProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut MessageProperties {
        &mut self.properties
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self.body, MessageBody::Streamed(_))
    }

    /// Returns the body bytes. A streamed body is read to the end once, which also closes the
    /// stream it came from.
    pub fn read_body(&mut self) -> Result<Bytes> {
        let body = match &mut self.body {
            MessageBody::Buffered(bytes) => return Ok(bytes.clone()),
            MessageBody::Streamed(reader) => {
                let mut body = Vec::new();
                reader.read_to_end(&mut body)?;
                Bytes::from(body)
            }
        };
        self.body = MessageBody::Buffered(body.clone());
        Ok(body)
    }

    pub fn into_body(self) -> MessageBody {
        self.body
    }

    /// Releases the message and anything its body still holds open.
    pub fn close(self) {}
}
