//! Image encoding for embedding pictures inside project documents.
//!
//! Images are stored as base64 data URIs. Documents in the store are capped,
//! so every encoded string is checked with [`is_base64_too_large`] before it
//! is accepted.

mod jpeg;

use std::{future::Future, path::Path};

use anyhow::Context;
use base64::{Engine, prelude::BASE64_STANDARD};

pub use jpeg::JpegDataUriEncoder;

/// Largest estimated decoded size accepted for one encoded image.
pub const MAX_ENCODED_IMAGE_BYTES: u64 = 1_000_000;

/// Turns an image file into a self-describing encoded string.
pub trait ImageEncoder {
    fn encode(&self, source: &Path) -> impl Future<Output = anyhow::Result<String>>;
}

/// Decoded byte size estimated from the encoded text length: `ceil(len * 3 / 4)`.
pub fn estimated_decoded_size(encoded: &str) -> u64 {
    (encoded.len() as u64 * 3).div_ceil(4)
}

pub fn is_base64_too_large(encoded: &str) -> bool {
    estimated_decoded_size(encoded) > MAX_ENCODED_IMAGE_BYTES
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Raw bytes recovered from a stored data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

pub fn decode_data_uri(uri: &str) -> anyhow::Result<DecodedImage> {
    let rest = uri.strip_prefix("data:").context("Not a data URI")?;
    let (header, payload) = rest.split_once(',').context("Data URI has no payload")?;
    let mime = header
        .strip_suffix(";base64")
        .context("Only base64 data URIs are supported")?;
    let bytes = BASE64_STANDARD
        .decode(payload.trim())
        .context("Invalid base64 payload")?;
    Ok(DecodedImage {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_threshold_boundary() {
        // ceil(1_333_333 * 3 / 4) == 1_000_000
        let at_limit = "A".repeat(1_333_333);
        assert_eq!(estimated_decoded_size(&at_limit), 1_000_000);
        assert!(!is_base64_too_large(&at_limit));

        // ceil(1_333_334 * 3 / 4) == 1_000_001
        let over_limit = "A".repeat(1_333_334);
        assert_eq!(estimated_decoded_size(&over_limit), 1_000_001);
        assert!(is_base64_too_large(&over_limit));
    }

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimated_decoded_size(""), 0);
        assert_eq!(estimated_decoded_size("A"), 1);
        assert_eq!(estimated_decoded_size("AAAA"), 3);
        assert_eq!(estimated_decoded_size("AAAAA"), 4);
    }

    #[test]
    fn data_uri_round_trip() {
        let uri = encode_data_uri("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(uri.starts_with("data:image/png;base64,"));
        let decoded = decode_data_uri(&uri).unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, [0x89, b'P', b'N', b'G']);
        assert_eq!(decoded.extension(), "png");
    }

    #[test]
    fn rejects_non_base64_uris() {
        assert!(decode_data_uri("blob:http://localhost/123").is_err());
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:image/jpeg;base64,@@@").is_err());
    }
}
