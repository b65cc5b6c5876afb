use crate::errors::*;
use num_derive::{FromPrimitive, ToPrimitive};
use serde_derive::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const GZIP_CONTENT_TYPE: &str = "application/x-gzip";
pub const DEFLATE_CONTENT_TYPE: &str = "application/x-deflate";

#[repr(u8)]
#[derive(FromPrimitive, ToPrimitive, Deserialize, PartialEq, Eq, Hash, Debug, Copy, Clone)]
/// Compression applied to serialized message bytes
pub enum Algorithm {
    /// RFC 1952 framing (header, DEFLATE body, CRC32, ISIZE)
    #[serde(alias = "gzip", alias = "GZIP")]
    GZip = 1,
    /// RFC 1951 DEFLATE bit-stream with no wrapper
    #[serde(alias = "rawdeflate", alias = "Deflate", alias = "deflate")]
    RawDeflate = 2,
}

impl Algorithm {
    /// Content type advertised by an encoder using this algorithm. Also used as the media type.
    pub fn content_type(&self) -> &'static str {
        match self {
            Algorithm::GZip => GZIP_CONTENT_TYPE,
            Algorithm::RawDeflate => DEFLATE_CONTENT_TYPE,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::GZip
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::GZip => f.write_str("GZip"),
            Algorithm::RawDeflate => f.write_str("RawDeflate"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Algorithm> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" => Ok(Algorithm::GZip),
            "rawdeflate" | "deflate" => Ok(Algorithm::RawDeflate),
            _ => Err(ErrorKind::Configuration(format!("unknown compression algorithm \"{}\"", s)).into()),
        }
    }
}
