use crate::compression::Algorithm;
use crate::encoder::{CompressionEncoder, MessageEncoder, MessageEncoderFactory};
use crate::message::MessageVersion;
use std::sync::Arc;

/// Wraps every encoder an inner factory produces in a `CompressionEncoder`.
pub struct CompressionEncoderFactory {
    inner_factory: Arc<dyn MessageEncoderFactory>,
    encoder: Arc<CompressionEncoder>,
    algorithm: Algorithm,
}

impl CompressionEncoderFactory {
    pub fn new(
        inner_factory: Arc<dyn MessageEncoderFactory>,
        algorithm: Algorithm,
    ) -> CompressionEncoderFactory {
        let encoder = CompressionEncoder::new(inner_factory.encoder(), algorithm);
        CompressionEncoderFactory {
            inner_factory,
            encoder,
            algorithm,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The shared sessionless encoder
    pub fn compression_encoder(&self) -> &Arc<CompressionEncoder> {
        &self.encoder
    }

    /// Builds a compression encoder over a fresh inner session encoder.
    pub fn create_compression_session_encoder(&self) -> Arc<CompressionEncoder> {
        CompressionEncoder::new(self.inner_factory.create_session_encoder(), self.algorithm)
    }
}

impl MessageEncoderFactory for CompressionEncoderFactory {
    fn encoder(&self) -> Arc<dyn MessageEncoder> {
        self.encoder.clone()
    }

    fn message_version(&self) -> MessageVersion {
        self.encoder.message_version()
    }

    fn create_session_encoder(&self) -> Arc<dyn MessageEncoder> {
        self.create_compression_session_encoder()
    }
}
