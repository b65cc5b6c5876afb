use crate::buffer::{BufferManager, PooledBuffer};
use crate::encoder::{read_from_pool, write_to_pool, MessageEncoder, MessageEncoderFactory};
use crate::errors::*;
use crate::message::{Message, MessageVersion};
use error_chain::bail;
use bytes::Bytes;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use std::io::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const BINARY_CONTENT_TYPE: &str = "application/soap+msbin1";
const BINARY_SESSION_CONTENT_TYPE: &str = "application/soap+msbinsession1";

#[repr(u8)]
#[derive(FromPrimitive, ToPrimitive, PartialEq, Debug, Copy, Clone)]
/// First byte of every binary frame
enum RecordType {
    Envelope = 0x01,
    SessionEnvelope = 0x02,
}

#[derive(Debug, Default)]
struct SessionState {
    written: AtomicU64,
    received: AtomicU64,
}

/// Length-prefixed binary framing of the action and body.
///
/// Frame layout: record type, session sequence number (`u64`, session frames only), action
/// length (`u32`), action, body length (`u32`), body. All integers are big-endian.
#[derive(Debug)]
pub struct BinaryMessageEncoder {
    session: Option<SessionState>,
}

impl BinaryMessageEncoder {
    pub fn new() -> BinaryMessageEncoder {
        BinaryMessageEncoder { session: None }
    }

    /// An encoder for one session. Frames carry a sequence number checked on read.
    pub fn session() -> BinaryMessageEncoder {
        BinaryMessageEncoder {
            session: Some(SessionState::default()),
        }
    }

    fn record_type(&self) -> RecordType {
        match self.session {
            Some(_) => RecordType::SessionEnvelope,
            None => RecordType::Envelope,
        }
    }

    fn encode_frame(&self, action: Option<&str>, body: &[u8]) -> Result<Vec<u8>> {
        let action = action.unwrap_or("").as_bytes();
        let action_len = frame_len(action.len())?;
        let body_len = frame_len(body.len())?;

        let mut frame = Vec::with_capacity(1 + 8 + 4 + action.len() + 4 + body.len());
        frame.push(self.record_type().to_u8().unwrap_or_default());
        if let Some(session) = &self.session {
            let sequence = session.written.fetch_add(1, Ordering::SeqCst);
            frame.extend_from_slice(&sequence.to_be_bytes());
        }
        frame.extend_from_slice(&action_len.to_be_bytes());
        frame.extend_from_slice(action);
        frame.extend_from_slice(&body_len.to_be_bytes());
        frame.extend_from_slice(body);
        Ok(frame)
    }

    /// Reads everything up to the body, returning the action and the body length.
    fn read_header<R: Read>(
        &self,
        reader: &mut R,
        max_size_of_headers: usize,
    ) -> Result<(Option<String>, usize)> {
        let record = RecordType::from_u8(read_u8(reader)?);
        if record != Some(self.record_type()) {
            bail!(ErrorKind::InnerEncoder(format!(
                "unexpected binary record {:?}, expected {:?}",
                record,
                self.record_type()
            )));
        }

        if let Some(session) = &self.session {
            let mut sequence = [0u8; 8];
            read_frame_bytes(reader, &mut sequence)?;
            let sequence = u64::from_be_bytes(sequence);
            let expected = session.received.fetch_add(1, Ordering::SeqCst);
            if sequence != expected {
                bail!(ErrorKind::InnerEncoder(format!(
                    "session message {} arrived out of order, expected {}",
                    sequence, expected
                )));
            }
        }

        let action_len = read_u32(reader)? as usize;
        if action_len > max_size_of_headers {
            bail!(ErrorKind::InnerEncoder(format!(
                "action of {} bytes exceeds the maximum header size of {} bytes",
                action_len, max_size_of_headers
            )));
        }
        // The length comes off the wire, so the action grows only as its bytes arrive.
        let mut action = Vec::new();
        reader
            .by_ref()
            .take(action_len as u64)
            .read_to_end(&mut action)
            .chain_err(|| ErrorKind::InnerEncoder("truncated binary message frame".to_string()))?;
        if action.len() != action_len {
            bail!(ErrorKind::InnerEncoder(
                "truncated binary message frame".to_string()
            ));
        }
        let action = match action_len {
            0 => None,
            _ => Some(String::from_utf8(action).map_err(|_| {
                Error::from(ErrorKind::InnerEncoder("action is not valid UTF-8".to_string()))
            })?),
        };

        let body_len = read_u32(reader)? as usize;
        Ok((action, body_len))
    }

    fn attach_action(action: Option<String>, message: Message) -> Message {
        match action {
            Some(action) => message.with_action(action),
            None => message,
        }
    }
}

impl Default for BinaryMessageEncoder {
    fn default() -> Self {
        BinaryMessageEncoder::new()
    }
}

fn frame_len(len: usize) -> Result<u32> {
    if len > u32::MAX as usize {
        bail!(ErrorKind::InnerEncoder(format!(
            "{} bytes do not fit in a binary frame",
            len
        )));
    }
    Ok(len as u32)
}

fn read_frame_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader
        .read_exact(buf)
        .chain_err(|| ErrorKind::InnerEncoder("truncated binary message frame".to_string()))
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_frame_bytes(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_frame_bytes(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

impl MessageEncoder for BinaryMessageEncoder {
    fn content_type(&self) -> &str {
        match self.session {
            Some(_) => BINARY_SESSION_CONTENT_TYPE,
            None => BINARY_CONTENT_TYPE,
        }
    }

    fn media_type(&self) -> &str {
        self.content_type()
    }

    fn message_version(&self) -> MessageVersion {
        MessageVersion::Soap12WSAddressing10
    }

    fn read_message(
        &self,
        buffer: PooledBuffer,
        buffer_manager: &dyn BufferManager,
        _content_type: &str,
    ) -> Result<Message> {
        let frame: Bytes = read_from_pool(buffer, buffer_manager);
        let mut reader = &frame[..];
        let (action, body_len) = self.read_header(&mut reader, usize::MAX)?;
        let body_start = frame.len() - reader.len();
        if body_len > reader.len() {
            bail!(ErrorKind::InnerEncoder(
                "truncated binary message frame".to_string()
            ));
        }

        let body = frame.slice(body_start..body_start + body_len);
        let message = Message::new(self.message_version(), body);
        Ok(BinaryMessageEncoder::attach_action(action, message))
    }

    fn write_message(
        &self,
        message: Message,
        max_message_size: usize,
        buffer_manager: &dyn BufferManager,
        message_offset: usize,
    ) -> Result<PooledBuffer> {
        let action = message.action().map(str::to_string);
        let body = message.into_body().into_bytes()?;
        let frame = self.encode_frame(action.as_deref(), &body)?;
        write_to_pool(&frame, max_message_size, buffer_manager, message_offset)
    }

    fn read_message_from_stream(
        &self,
        mut stream: Box<dyn Read + Send>,
        max_size_of_headers: usize,
        _content_type: &str,
    ) -> Result<Message> {
        let (action, body_len) = self.read_header(&mut stream, max_size_of_headers)?;
        let body = Box::new(stream.take(body_len as u64));
        let message = Message::from_stream(self.message_version(), body);
        Ok(BinaryMessageEncoder::attach_action(action, message))
    }

    fn write_message_to_stream(&self, message: Message, stream: &mut dyn Write) -> Result<()> {
        let action = message.action().map(str::to_string);
        let body = message.into_body().into_bytes()?;
        let frame = self.encode_frame(action.as_deref(), &body)?;
        stream.write_all(&frame)?;
        stream.flush()?;
        Ok(())
    }
}

pub struct BinaryMessageEncoderFactory {
    encoder: Arc<BinaryMessageEncoder>,
}

impl BinaryMessageEncoderFactory {
    pub fn new() -> BinaryMessageEncoderFactory {
        BinaryMessageEncoderFactory {
            encoder: Arc::new(BinaryMessageEncoder::new()),
        }
    }
}

impl Default for BinaryMessageEncoderFactory {
    fn default() -> Self {
        BinaryMessageEncoderFactory::new()
    }
}

impl MessageEncoderFactory for BinaryMessageEncoderFactory {
    fn encoder(&self) -> Arc<dyn MessageEncoder> {
        self.encoder.clone()
    }

    fn create_session_encoder(&self) -> Arc<dyn MessageEncoder> {
        Arc::new(BinaryMessageEncoder::session())
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::testing::TrackingBufferManager;
    use crate::encoder::{BinaryMessageEncoder, MessageEncoder};
    use crate::errors::ErrorKind;
    use crate::message::{Message, MessageVersion};
    use std::io::Cursor;

    fn message(body: &'static str) -> Message {
        Message::new(MessageVersion::Soap12WSAddressing10, body).with_action("urn:echo")
    }

    #[test]
    fn frame_layout() {
        let encoder = BinaryMessageEncoder::new();
        let mut wire = Vec::new();
        encoder
            .write_message_to_stream(message("<b/>"), &mut wire)
            .unwrap();

        let mut expected = vec![0x01, 0, 0, 0, 8];
        expected.extend_from_slice(b"urn:echo");
        expected.extend_from_slice(&[0, 0, 0, 4]);
        expected.extend_from_slice(b"<b/>");
        assert_eq!(wire, expected);
    }

    #[test]
    fn buffered_round_trip_keeps_action() {
        let manager = TrackingBufferManager::new();
        let encoder = BinaryMessageEncoder::new();

        let buffer = encoder
            .write_message(message("<body/>"), 1024, &manager, 4)
            .unwrap();
        let mut read = encoder
            .read_message(buffer, &manager, encoder.content_type())
            .unwrap();

        assert_eq!(read.action(), Some("urn:echo"));
        assert_eq!(&read.read_body().unwrap()[..], b"<body/>");
        assert!(manager.outstanding().is_empty());
    }

    #[test]
    fn stream_round_trip_reads_body_lazily() {
        let encoder = BinaryMessageEncoder::new();
        let mut wire = Vec::new();
        encoder
            .write_message_to_stream(message("<lazy/>"), &mut wire)
            .unwrap();
        wire.extend_from_slice(b"trailing bytes of the next message");

        let mut read = encoder
            .read_message_from_stream(Box::new(Cursor::new(wire)), 1024, "")
            .unwrap();
        assert!(read.is_streamed());
        assert_eq!(read.action(), Some("urn:echo"));
        assert_eq!(&read.read_body().unwrap()[..], b"<lazy/>");
    }

    #[test]
    fn oversized_action_is_rejected() {
        let encoder = BinaryMessageEncoder::new();
        let mut wire = Vec::new();
        encoder
            .write_message_to_stream(message("<b/>"), &mut wire)
            .unwrap();

        let err = encoder
            .read_message_from_stream(Box::new(Cursor::new(wire)), 4, "")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let manager = TrackingBufferManager::new();
        let encoder = BinaryMessageEncoder::new();
        let buffer = encoder
            .write_message(message("<body/>"), 1024, &manager, 0)
            .unwrap();
        let truncated = manager.pooled(0, &buffer.payload()[..buffer.count() - 2], 0);
        encoder.read_message(buffer, &manager, "").unwrap().close();

        let err = encoder.read_message(truncated, &manager, "").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));
        assert!(manager.outstanding().is_empty());
    }

    #[test]
    fn action_length_beyond_frame_is_rejected() {
        let manager = TrackingBufferManager::new();
        let encoder = BinaryMessageEncoder::new();
        let frame = [0x01, 0xff, 0xff, 0xff, 0xf0, b'a'];

        let err = encoder
            .read_message(manager.pooled(0, &frame, 0), &manager, "")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));
        assert!(manager.outstanding().is_empty());

        let err = encoder
            .read_message_from_stream(Box::new(Cursor::new(frame.to_vec())), usize::MAX, "")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));
    }

    #[test]
    fn session_frames_are_sequenced() {
        let writer = BinaryMessageEncoder::session();
        let reader = BinaryMessageEncoder::session();
        assert_eq!(writer.content_type(), "application/soap+msbinsession1");

        let mut first = Vec::new();
        let mut second = Vec::new();
        writer.write_message_to_stream(message("1"), &mut first).unwrap();
        writer.write_message_to_stream(message("2"), &mut second).unwrap();

        // Delivering the second frame first breaks the session's ordering.
        let err = reader
            .read_message_from_stream(Box::new(Cursor::new(second)), 1024, "")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));

        let fresh_reader = BinaryMessageEncoder::session();
        let mut read = fresh_reader
            .read_message_from_stream(Box::new(Cursor::new(first)), 1024, "")
            .unwrap();
        assert_eq!(&read.read_body().unwrap()[..], b"1");
    }

    #[test]
    fn sessionless_encoder_rejects_session_frames() {
        let mut wire = Vec::new();
        BinaryMessageEncoder::session()
            .write_message_to_stream(message("<b/>"), &mut wire)
            .unwrap();

        let err = BinaryMessageEncoder::new()
            .read_message_from_stream(Box::new(Cursor::new(wire)), 1024, "")
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InnerEncoder(_)));
    }
}
