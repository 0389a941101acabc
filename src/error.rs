//! Error handling.

use core::fmt;

/// Input is not valid base64url text.
///
/// Produced by [`base64url::decode()`](crate::base64url::decode()) both for chars outside
/// the URL-safe alphabet and for inputs whose length is `1 (mod 4)`, from which no padding
/// can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidEncoding(base64ct::Error);

impl InvalidEncoding {
    pub(crate) fn new(inner: base64ct::Error) -> Self {
        Self(inner)
    }

    /// Returns the underlying decoding error.
    pub fn kind(&self) -> base64ct::Error {
        self.0
    }
}

impl fmt::Display for InvalidEncoding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "invalid base64url encoding: {}", self.0)
    }
}

impl std::error::Error for InvalidEncoding {}

/// Reason why a header or payload segment could not be decoded.
#[derive(Debug)]
#[non_exhaustive]
pub enum SegmentError {
    /// Segment is not valid base64url.
    Encoding(InvalidEncoding),
    /// Decoded segment is not a JSON object of the expected shape.
    Json(serde_json::Error),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding(e) => fmt::Display::fmt(e, formatter),
            Self::Json(e) => write!(formatter, "invalid JSON: {e}"),
        }
    }
}

impl std::error::Error for SegmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

/// Errors that may occur during token parsing.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Token has invalid structure.
    ///
    /// Valid tokens must consist of 3 non-empty parts (header, payload, and signature)
    /// separated by periods.
    MalformedStructure,
    /// Token header cannot be decoded.
    InvalidHeader(SegmentError),
    /// Token payload cannot be decoded.
    InvalidPayload(SegmentError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedStructure => formatter.write_str("Invalid token structure"),
            Self::InvalidHeader(e) => write!(formatter, "Malformed token header: {e}"),
            Self::InvalidPayload(e) => write!(formatter, "Malformed token payload: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedStructure => None,
            Self::InvalidHeader(e) | Self::InvalidPayload(e) => Some(e),
        }
    }
}

/// Errors that can occur during token regeneration.
#[derive(Debug)]
#[non_exhaustive]
pub enum RegenerationError {
    /// Edited payload text is not a valid JSON payload. No signing is performed
    /// in this case.
    InvalidPayloadJson(serde_json::Error),
    /// Token header cannot be serialized.
    Header(serde_json::Error),
    /// Token payload cannot be serialized.
    Payload(serde_json::Error),
}

impl fmt::Display for RegenerationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayloadJson(e) => write!(formatter, "Edited payload is not valid: {e}"),
            Self::Header(e) => write!(formatter, "Cannot serialize header: {e}"),
            Self::Payload(e) => write!(formatter, "Cannot serialize payload: {e}"),
        }
    }
}

impl std::error::Error for RegenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPayloadJson(e) | Self::Header(e) | Self::Payload(e) => Some(e),
        }
    }
}
