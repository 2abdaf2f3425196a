//! Base64 utilities for signature records
//!
//! Signatures are always carried in the standard RFC 4648 alphabet with
//! padding. Any other alphabet makes verification fail.
//!
//! ## Examples
//! ```
//! use signet_crypto::base64;
//!
//! let encoded = base64::encode(b"Hello, World!");
//! assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
//! assert_eq!(base64::decode(&encoded).unwrap(), b"Hello, World!");
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::Result;

/// Encode bytes to standard base64 string with padding
///
/// Uses the standard RFC 4648 alphabet: `A-Z`, `a-z`, `0-9`, `+`, `/`
pub fn encode<T: AsRef<[u8]>>(data: T) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64 string to bytes
///
/// ASCII whitespace (line breaks from stored records) is ignored; any other
/// character outside the standard alphabet is an error.
pub fn decode<T: AsRef<[u8]>>(encoded: T) -> Result<Vec<u8>> {
    let compact: Vec<u8> = encoded
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_encode_decode() {
        let data = b"Hello, World!";

        let encoded = encode(data);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_standard_alphabet_used() {
        // 0xfb 0xff encodes to characters from the `+/` end of the alphabet
        assert_eq!(encode([0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        let decoded = decode("SGVsbG8s\nIFdvcmxk\r\nIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_url_safe_alphabet_rejected() {
        assert!(decode("-_8=").is_err());
    }

    #[test]
    fn test_missing_padding_rejected() {
        assert!(decode("SGVsbG8sIFdvcmxkIQ").is_err());
    }
}
