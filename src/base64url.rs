//! Base64url codec used for all token segments.
//!
//! Encoding always produces the URL-safe alphabet without padding. Decoding restores
//! the padding from the input length before handing the data to the padded decoder:
//!
//! | `len % 4` | Padding added |
//! |-----------|---------------|
//! | 0 | none |
//! | 2 | `==` |
//! | 3 | `=` |
//! | 1 | input is rejected |

use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};

use core::fmt;
use std::string::FromUtf8Error;

use crate::InvalidEncoding;

/// Encodes `source` using the URL-safe base64 alphabet with all padding stripped.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::base64url;
/// assert_eq!(base64url::encode("Ma"), "TWE");
/// assert_eq!(base64url::encode([0xfb, 0xff]), "-_8");
/// ```
pub fn encode(source: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(source.as_ref())
}

/// Appends the base64url encoding of `source` to `buffer`.
pub(crate) fn encode_buf(source: impl AsRef<[u8]>, buffer: &mut String) {
    buffer.push_str(&encode(source));
}

/// Decodes base64url-encoded `input` into raw bytes.
///
/// # Errors
///
/// Returns an error if `input` has length `1 (mod 4)` or contains chars outside the URL-safe
/// base64 alphabet once padding is restored.
pub fn decode(input: &str) -> Result<Vec<u8>, InvalidEncoding> {
    let padding = match input.len() % 4 {
        0 => "",
        2 => "==",
        3 => "=",
        _ => return Err(InvalidEncoding::new(base64ct::Error::InvalidLength)),
    };

    if padding.is_empty() {
        Base64Url::decode_vec(input).map_err(InvalidEncoding::new)
    } else {
        let mut padded = String::with_capacity(input.len() + padding.len());
        padded.push_str(input);
        padded.push_str(padding);
        Base64Url::decode_vec(&padded).map_err(InvalidEncoding::new)
    }
}

/// Decodes base64url-encoded `input` and interprets the resulting bytes as UTF-8 text.
///
/// # Errors
///
/// Returns an error if `input` is not valid base64url, or if the decoded bytes
/// are not valid UTF-8.
pub fn decode_text(input: &str) -> Result<String, DecodeTextError> {
    let bytes = decode(input).map_err(DecodeTextError::Encoding)?;
    String::from_utf8(bytes).map_err(DecodeTextError::Utf8)
}

/// Errors that can occur in [`decode_text()`].
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeTextError {
    /// Input is not valid base64url.
    Encoding(InvalidEncoding),
    /// Decoded bytes are not valid UTF-8.
    Utf8(FromUtf8Error),
}

impl fmt::Display for DecodeTextError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding(e) => fmt::Display::fmt(e, formatter),
            Self::Utf8(e) => write!(formatter, "decoded bytes are not UTF-8: {e}"),
        }
    }
}

impl std::error::Error for DecodeTextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::Utf8(e) => Some(e),
        }
    }
}
