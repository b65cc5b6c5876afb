use crate::compression::Algorithm;
use crate::encoder::{
    BinaryMessageEncoderFactory, CompressionEncoderFactory, MessageEncoderFactory,
    TextMessageEncoderFactory,
};
use crate::errors::*;
use crate::message::MessageVersion;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod config;
mod policy;

pub use config::EncodingConfig;
pub use policy::{
    PolicyAssertion, GZIP_ENCODING_NAME, GZIP_ENCODING_NAMESPACE, GZIP_ENCODING_PREFIX,
};

/// Inner encoding wrapped by the compression encoder
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum InnerEncoding {
    Text,
    Binary,
}

impl InnerEncoding {
    pub fn create_factory(&self, version: MessageVersion) -> Result<Arc<dyn MessageEncoderFactory>> {
        match self {
            InnerEncoding::Text => Ok(Arc::new(TextMessageEncoderFactory::new(version))),
            InnerEncoding::Binary => {
                if version != MessageVersion::Soap12WSAddressing10 {
                    return Err(ErrorKind::Configuration(format!(
                        "binary message encoding does not support message version {:?}",
                        version
                    ))
                    .into());
                }
                Ok(Arc::new(BinaryMessageEncoderFactory::new()))
            }
        }
    }
}

impl Default for InnerEncoding {
    fn default() -> Self {
        InnerEncoding::Text
    }
}

impl fmt::Display for InnerEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InnerEncoding::Text => f.write_str("textMessageEncoding"),
            InnerEncoding::Binary => f.write_str("binaryMessageEncoding"),
        }
    }
}

impl FromStr for InnerEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<InnerEncoding> {
        match s {
            "textMessageEncoding" | "text" => Ok(InnerEncoding::Text),
            "binaryMessageEncoding" | "binary" => Ok(InnerEncoding::Binary),
            _ => Err(ErrorKind::Configuration(format!("unknown inner message encoding \"{}\"", s)).into()),
        }
    }
}

/// Settings from which compression encoder factories are built.
#[derive(Debug, Clone)]
pub struct CompressionBindingElement {
    inner: Option<InnerEncoding>,
    algorithm: Algorithm,
    message_version: MessageVersion,
}

impl CompressionBindingElement {
    pub fn new(inner: Option<InnerEncoding>, algorithm: Algorithm) -> CompressionBindingElement {
        CompressionBindingElement {
            inner,
            algorithm,
            message_version: MessageVersion::default(),
        }
    }

    pub fn inner_encoding(&self) -> Option<InnerEncoding> {
        self.inner
    }

    pub fn set_inner_encoding(&mut self, inner: Option<InnerEncoding>) {
        self.inner = inner;
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    /// Message version handed to the inner encoding
    pub fn message_version(&self) -> MessageVersion {
        self.message_version
    }

    pub fn set_message_version(&mut self, version: MessageVersion) {
        self.message_version = version;
    }

    pub fn create_message_encoder_factory(&self) -> Result<CompressionEncoderFactory> {
        let inner = self.inner.ok_or_else(|| {
            Error::from(ErrorKind::Configuration(
                "a compression encoder needs an inner message encoding".to_string(),
            ))
        })?;
        let inner_factory = inner.create_factory(self.message_version)?;
        Ok(CompressionEncoderFactory::new(inner_factory, self.algorithm))
    }

    /// Adds this binding's policy assertion. The gzip assertion is advertised for either
    /// algorithm, matching what existing peers expect.
    pub fn export_policy(&self, assertions: &mut Vec<PolicyAssertion>) {
        assertions.push(PolicyAssertion::gzip_encoding());
    }
}

impl Default for CompressionBindingElement {
    fn default() -> Self {
        CompressionBindingElement::new(Some(InnerEncoding::Text), Algorithm::GZip)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{CompressionBindingElement, InnerEncoding, PolicyAssertion};
    use crate::compression::Algorithm;
    use crate::encoder::{MessageEncoder, MessageEncoderFactory};
    use crate::errors::ErrorKind;
    use crate::message::MessageVersion;

    #[test]
    fn defaults_to_text_and_gzip() {
        let element = CompressionBindingElement::default();
        assert_eq!(element.inner_encoding(), Some(InnerEncoding::Text));
        assert_eq!(element.algorithm(), Algorithm::GZip);

        let factory = element.create_message_encoder_factory().unwrap();
        let encoder = factory.compression_encoder();
        assert_eq!(encoder.content_type(), "application/x-gzip");
        assert_eq!(encoder.inner().content_type(), "application/soap+xml; charset=utf-8");
    }

    #[test]
    fn missing_inner_encoding_is_rejected() {
        let element = CompressionBindingElement::new(None, Algorithm::RawDeflate);
        let err = element.create_message_encoder_factory().err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
    }

    #[test]
    fn message_version_reaches_inner_encoder() {
        let mut element = CompressionBindingElement::default();
        element.set_message_version(MessageVersion::Soap11);
        let factory = element.create_message_encoder_factory().unwrap();
        assert_eq!(factory.message_version(), MessageVersion::Soap11);
    }

    #[test]
    fn binary_requires_soap12() {
        let mut element = CompressionBindingElement::new(Some(InnerEncoding::Binary), Algorithm::GZip);
        let factory = element.create_message_encoder_factory().unwrap();
        assert_eq!(
            factory.compression_encoder().inner().content_type(),
            "application/soap+msbin1"
        );

        element.set_message_version(MessageVersion::Soap11);
        let err = element.create_message_encoder_factory().err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
    }

    #[test]
    fn inner_encoding_names() {
        assert_eq!("textMessageEncoding".parse::<InnerEncoding>().unwrap(), InnerEncoding::Text);
        assert_eq!("binaryMessageEncoding".parse::<InnerEncoding>().unwrap(), InnerEncoding::Binary);
        assert_eq!(InnerEncoding::Binary.to_string(), "binaryMessageEncoding");
        assert!("mtomMessageEncoding".parse::<InnerEncoding>().is_err());
    }

    #[test]
    fn same_policy_for_both_algorithms() {
        for algorithm in [Algorithm::GZip, Algorithm::RawDeflate].iter() {
            let element = CompressionBindingElement::new(Some(InnerEncoding::Text), *algorithm);
            let mut assertions = Vec::new();
            element.export_policy(&mut assertions);
            assert_eq!(assertions, vec![PolicyAssertion::gzip_encoding()]);
        }
    }
}
