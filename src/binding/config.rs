use crate::binding::{CompressionBindingElement, InnerEncoding};
use crate::compression::Algorithm;
use crate::errors::*;
use serde_derive::Deserialize;
use std::fs;
use std::path::Path;

/// The configurable settings of a compression binding.
///
/// ```json
/// { "innerMessageEncoding": "binaryMessageEncoding", "compressionAlgorithm": "RawDeflate" }
/// ```
///
/// Keys that are absent keep their defaults: `textMessageEncoding` and `GZip`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncodingConfig {
    inner_message_encoding: Option<String>,
    compression_algorithm: Option<Algorithm>,
}

impl EncodingConfig {
    pub fn from_json(json: &str) -> Result<EncodingConfig> {
        serde_json::from_str(json)
            .map_err(Error::from)
            .chain_err(|| ErrorKind::Configuration("invalid encoding configuration".to_string()))
    }

    pub fn load(path: &Path) -> Result<EncodingConfig> {
        let json = fs::read_to_string(path)
            .chain_err(|| format!("error reading config file \"{}\"", path.display()))?;
        EncodingConfig::from_json(&json)
            .chain_err(|| format!("error parsing config file \"{}\"", path.display()))
    }

    pub fn inner_message_encoding(&self) -> Result<InnerEncoding> {
        match &self.inner_message_encoding {
            Some(name) => name.parse(),
            None => Ok(InnerEncoding::default()),
        }
    }

    pub fn compression_algorithm(&self) -> Algorithm {
        self.compression_algorithm.unwrap_or_default()
    }

    /// Overrides only the settings that were explicitly configured.
    pub fn apply_to(&self, element: &mut CompressionBindingElement) -> Result<()> {
        if self.inner_message_encoding.is_some() {
            element.set_inner_encoding(Some(self.inner_message_encoding()?));
        }
        if let Some(algorithm) = self.compression_algorithm {
            element.set_algorithm(algorithm);
        }
        Ok(())
    }

    pub fn create_binding_element(&self) -> Result<CompressionBindingElement> {
        let mut element = CompressionBindingElement::default();
        self.apply_to(&mut element)?;
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::{CompressionBindingElement, EncodingConfig, InnerEncoding};
    use crate::compression::Algorithm;
    use crate::errors::ErrorKind;
    use error_chain::ChainedError;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EncodingConfig::from_json("{}").unwrap();
        assert_eq!(config.inner_message_encoding().unwrap(), InnerEncoding::Text);
        assert_eq!(config.compression_algorithm(), Algorithm::GZip);

        let element = config.create_binding_element().unwrap();
        assert_eq!(element.inner_encoding(), Some(InnerEncoding::Text));
        assert_eq!(element.algorithm(), Algorithm::GZip);
    }

    #[test]
    fn explicit_settings() {
        let config = EncodingConfig::from_json(
            r#"{ "innerMessageEncoding": "binaryMessageEncoding", "compressionAlgorithm": "RawDeflate" }"#,
        )
        .unwrap();
        let element = config.create_binding_element().unwrap();
        assert_eq!(element.inner_encoding(), Some(InnerEncoding::Binary));
        assert_eq!(element.algorithm(), Algorithm::RawDeflate);
    }

    #[test]
    fn apply_keeps_unset_values() {
        let mut element = CompressionBindingElement::new(Some(InnerEncoding::Binary), Algorithm::GZip);
        let config = EncodingConfig::from_json(r#"{ "compressionAlgorithm": "Deflate" }"#).unwrap();
        config.apply_to(&mut element).unwrap();

        assert_eq!(element.inner_encoding(), Some(InnerEncoding::Binary));
        assert_eq!(element.algorithm(), Algorithm::RawDeflate);
    }

    #[test]
    fn unknown_values_are_configuration_errors() {
        let config = EncodingConfig::from_json(r#"{ "innerMessageEncoding": "mtomMessageEncoding" }"#).unwrap();
        let err = config.create_binding_element().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));

        let err = EncodingConfig::from_json(r#"{ "compressionAlgorithm": "Brotli" }"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
        assert!(err.display_chain().to_string().contains("Brotli"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EncodingConfig::from_json(r#"{ "compressionLevel": 9 }"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
        assert!(err.display_chain().to_string().contains("compressionLevel"));
    }
}
