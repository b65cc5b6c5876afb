use crate::compression::Algorithm;
use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use std::io::prelude::*;

/// Compressing filter over a writer.
///
/// Trailing bits (and the CRC32/ISIZE trailer for gzip) are only written by `finish()`. Dropping
/// the compressor without finishing also finalizes the stream but discards any error.
pub enum Compressor<W: Write> {
    GZip(GzEncoder<W>),
    RawDeflate(DeflateEncoder<W>),
}

impl<W: Write> Compressor<W> {
    pub fn new(writer: W, algorithm: Algorithm) -> Compressor<W> {
        match algorithm {
            Algorithm::GZip => Compressor::GZip(GzEncoder::new(writer, Compression::default())),
            Algorithm::RawDeflate => {
                Compressor::RawDeflate(DeflateEncoder::new(writer, Compression::default()))
            }
        }
    }

    /// Flushes all remaining compressed output and returns the underlying writer.
    pub fn finish(self) -> std::io::Result<W> {
        match self {
            Compressor::GZip(encoder) => encoder.finish(),
            Compressor::RawDeflate(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Compressor::GZip(encoder) => encoder.write(buf),
            Compressor::RawDeflate(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Compressor::GZip(encoder) => encoder.flush(),
            Compressor::RawDeflate(encoder) => encoder.flush(),
        }
    }
}

/// Decompressing filter over a reader. Owns the reader, so dropping the decompressor closes it.
pub enum Decompressor<R: Read> {
    GZip(GzDecoder<R>),
    RawDeflate(DeflateDecoder<R>),
}

impl<R: Read> Decompressor<R> {
    pub fn new(reader: R, algorithm: Algorithm) -> Decompressor<R> {
        match algorithm {
            Algorithm::GZip => Decompressor::GZip(GzDecoder::new(reader)),
            Algorithm::RawDeflate => Decompressor::RawDeflate(DeflateDecoder::new(reader)),
        }
    }
}

impl<R: Read> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Decompressor::GZip(decoder) => decoder.read(buf),
            Decompressor::RawDeflate(decoder) => decoder.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compression::compressor::{Compressor, Decompressor};
    use crate::compression::Algorithm;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use std::io::prelude::*;
    use std::io::BufWriter;

    const MESSAGE: &[u8] = b"<s:Envelope><s:Body>Hello world! This is quite compressed....</s:Body></s:Envelope>";

    #[test]
    fn compress_once_gzip() {
        let mut reference_enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
        reference_enc.write_all(MESSAGE).unwrap();
        let expected_result = reference_enc.finish().unwrap();

        let mut compressor = Compressor::new(Vec::new(), Algorithm::GZip);
        compressor.write_all(MESSAGE).unwrap();
        let result = compressor.finish().unwrap();

        assert!(result.len() > 0);
        assert_eq!(result, expected_result);
    }

    #[test]
    fn compress_multiple_payloads_deflate() {
        let messages = [
            "Hello world!".as_bytes(),
            " This is quite compressed....".as_bytes(),
        ];

        let mut reference_enc = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        for message in messages.iter() {
            reference_enc.write_all(message).unwrap();
        }
        let expected_result = reference_enc.finish().unwrap();

        let mut compressor = Compressor::new(Vec::new(), Algorithm::RawDeflate);
        for message in messages.iter() {
            compressor.write_all(message).unwrap();
        }
        let result = compressor.finish().unwrap();

        assert_eq!(result, expected_result);
    }

    #[test]
    fn gzip_output_is_framed() {
        let mut compressor = Compressor::new(Vec::new(), Algorithm::GZip);
        compressor.write_all(MESSAGE).unwrap();
        let result = compressor.finish().unwrap();

        assert_eq!(&result[..2], &[0x1f, 0x8b]);
        let isize_trailer = &result[result.len() - 4..];
        assert_eq!(isize_trailer, &(MESSAGE.len() as u32).to_le_bytes());
    }

    #[test]
    fn decompress_both_algorithms() {
        for algorithm in [Algorithm::GZip, Algorithm::RawDeflate].iter() {
            let mut compressor = Compressor::new(Vec::new(), *algorithm);
            compressor.write_all(MESSAGE).unwrap();
            let compressed = compressor.finish().unwrap();

            let mut decompressor = Decompressor::new(&compressed[..], *algorithm);
            let mut result = Vec::new();
            decompressor.read_to_end(&mut result).unwrap();

            assert_eq!(result, MESSAGE);
        }
    }

    #[test]
    fn can_wrap_compressor_write() {
        let compressor = Compressor::new(Vec::new(), Algorithm::RawDeflate);
        let mut writer = BufWriter::new(compressor);

        writer.write_all(MESSAGE).unwrap();
        let compressor = writer.into_inner().ok().unwrap();
        let compressed = compressor.finish().unwrap();

        let mut result = Vec::new();
        Decompressor::new(&compressed[..], Algorithm::RawDeflate)
            .read_to_end(&mut result)
            .unwrap();
        assert_eq!(result, MESSAGE);
    }

    #[test]
    fn dropping_compressor_finishes_stream() {
        let mut sink = Vec::new();
        {
            let mut compressor = Compressor::new(&mut sink, Algorithm::GZip);
            compressor.write_all(MESSAGE).unwrap();
        }

        let mut result = Vec::new();
        Decompressor::new(&sink[..], Algorithm::GZip)
            .read_to_end(&mut result)
            .unwrap();
        assert_eq!(result, MESSAGE);
    }
}
