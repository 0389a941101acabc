//! `ParsedToken` and closely related types.

use serde::{
    de::{DeserializeOwned, Error as DeError},
    Deserialize, Deserializer, Serialize,
};
use serde_json::{Map, Value};

use core::{fmt, str::FromStr};

use crate::{
    alg::{self, Algorithm, AlgorithmId, Secret, VerificationResult},
    base64url, InvalidEncoding, ParseError, Payload, RegenerationError, SegmentError,
};

/// JWT header.
///
/// See [RFC 7515](https://tools.ietf.org/html/rfc7515#section-4.1) for the description
/// of the fields. Fields other than `alg`, `typ` and `kid` are retained
/// in the [`extensions`](Self::extensions) map.
///
/// ```
/// # use jwt_inspector::{Algorithm, Header};
/// let header = Header::new(Algorithm::Hs256).with_key_id("my-key-id");
/// assert_eq!(
///     serde_json::to_string(&header)?,
///     r#"{"alg":"HS256","typ":"JWT","kid":"my-key-id"}"#
/// );
/// # Ok::<_, serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Header {
    /// Algorithm securing the token. This field is renamed to `alg` for serialization.
    #[serde(rename = "alg")]
    pub algorithm: AlgorithmId,

    /// Application-specific [token type]. This field is renamed to `typ` for serialization.
    /// Expected to be `"JWT"`, but this is not enforced. A non-string `typ` is retained
    /// in [`extensions`](Self::extensions).
    ///
    /// [token type]: https://tools.ietf.org/html/rfc7519#section-5.1
    #[serde(rename = "typ", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Identifier of the key that has signed the token. This field is renamed to [`kid`]
    /// for serialization. A non-string `kid` is retained in [`extensions`](Self::extensions).
    ///
    /// [`kid`]: https://www.rfc-editor.org/rfc/rfc7515.html#section-4.1.4
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// Other header fields. Should not contain `alg`, and should not contain `typ` or `kid`
    /// if the corresponding typed field is set; otherwise, the serialized header
    /// will contain duplicate keys.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Header {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let algorithm = match fields.remove("alg") {
            Some(Value::String(alg)) => AlgorithmId::from(alg),
            Some(_) => return Err(DeError::custom("`alg` field is not a string")),
            None => return Err(DeError::missing_field("alg")),
        };

        let mut header = Self {
            algorithm,
            token_type: None,
            key_id: None,
            extensions: Map::new(),
        };
        for (name, value) in fields {
            header.insert_field(name, value);
        }
        Ok(header)
    }
}

impl Header {
    /// Creates a header with the specified algorithm and `typ` set to `"JWT"`.
    pub fn new(algorithm: impl Into<AlgorithmId>) -> Self {
        Self {
            algorithm: algorithm.into(),
            token_type: Some("JWT".to_owned()),
            key_id: None,
            extensions: Map::new(),
        }
    }

    /// Sets the `algorithm` field for this header.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<AlgorithmId>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Sets the `token_type` field for this header.
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self.extensions.remove("typ");
        self
    }

    /// Sets the `key_id` field for this header.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self.extensions.remove("kid");
        self
    }

    /// Adds a header field. String values for `alg`, `typ` and `kid` are assigned
    /// to the corresponding typed fields. A non-string `alg` is discarded, since the algorithm
    /// must always be a string.
    ///
    /// # Examples
    ///
    /// ```
    /// # use jwt_inspector::{Algorithm, Header};
    /// let header = Header::new(Algorithm::Hs256)
    ///     .with_extension("kid", "my-key-id")
    ///     .with_extension("cty", "JWT");
    /// assert_eq!(header.key_id.as_deref(), Some("my-key-id"));
    /// assert_eq!(header.extensions.len(), 1);
    /// ```
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_field(name.into(), value.into());
        self
    }

    fn insert_field(&mut self, name: String, value: Value) {
        let value = match (name.as_str(), value) {
            ("alg", Value::String(alg)) => {
                self.algorithm = AlgorithmId::from(alg);
                return;
            }
            ("alg", _) => {
                log::warn!("ignoring non-string `alg` header field");
                return;
            }
            ("typ", Value::String(token_type)) => {
                self.token_type = Some(token_type);
                self.extensions.remove("typ");
                return;
            }
            ("kid", Value::String(key_id)) => {
                self.key_id = Some(key_id);
                self.extensions.remove("kid");
                return;
            }
            ("typ", value) => {
                self.token_type = None;
                value
            }
            ("kid", value) => {
                self.key_id = None;
                value
            }
            (_, value) => value,
        };
        self.extensions.insert(name, value);
    }
}

/// Token decoded from its compact serialization.
///
/// The header and payload are decoded; the signature is retained as raw base64url text.
/// The encoded segments are kept exactly as they were supplied, so that
/// [`Self::signing_input()`] reproduces the signed bytes verbatim.
///
/// A `ParsedToken` is immutable. To edit a token, supply a new payload to
/// [`Self::regenerate()`], which creates a new token.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::{ParsedToken, Secret, VerificationResult};
/// # fn main() -> anyhow::Result<()> {
/// let token = ParsedToken::decode(
///     "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
///      eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.\
///      SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c",
/// )?;
/// assert_eq!(token.header().algorithm.as_str(), "HS256");
/// assert_eq!(token.payload().subject.as_deref(), Some("1234567890"));
/// assert_eq!(token.payload().extensions["name"], "John Doe");
/// assert_eq!(token.verify(&Secret::from("your-256-bit-secret")), VerificationResult::Valid);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    compact: String,
    header_len: usize,
    payload_end: usize,
    header: Header,
    payload: Payload,
}

impl ParsedToken {
    /// Decodes a token from its compact serialization.
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not consist of exactly three non-empty
    /// dot-separated segments, or if the header or payload cannot be decoded.
    pub fn decode(token: &str) -> Result<Self, ParseError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            log::debug!("token does not consist of 3 segments");
            return Err(ParseError::MalformedStructure);
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            log::debug!("token has empty segments");
            return Err(ParseError::MalformedStructure);
        }

        let decoded_header = decode_segment::<Header>(header).map_err(|err| {
            log::debug!("cannot decode token header: {err}");
            ParseError::InvalidHeader(err)
        })?;
        let decoded_payload = decode_segment::<Payload>(payload).map_err(|err| {
            log::debug!("cannot decode token payload: {err}");
            ParseError::InvalidPayload(err)
        })?;

        Ok(Self {
            compact: token.to_owned(),
            header_len: header.len(),
            payload_end: header.len() + 1 + payload.len(),
            header: decoded_header,
            payload: decoded_payload,
        })
    }

    pub(crate) fn from_parts(
        compact: String,
        header_len: usize,
        payload_end: usize,
        header: Header,
        payload: Payload,
    ) -> Self {
        Self {
            compact,
            header_len,
            payload_end,
            header,
            payload,
        }
    }

    /// Gets the token header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Gets the algorithm named in the token header.
    pub fn algorithm(&self) -> &AlgorithmId {
        &self.header.algorithm
    }

    /// Gets the token payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the base64url-encoded header exactly as it appears in the token.
    pub fn encoded_header(&self) -> &str {
        &self.compact[..self.header_len]
    }

    /// Returns the base64url-encoded payload exactly as it appears in the token.
    pub fn encoded_payload(&self) -> &str {
        &self.compact[(self.header_len + 1)..self.payload_end]
    }

    /// Returns the raw (base64url-encoded) signature segment of the token.
    pub fn signature(&self) -> &str {
        &self.compact[(self.payload_end + 1)..]
    }

    /// Returns the signing input, `<encoded header>.<encoded payload>`.
    pub fn signing_input(&self) -> &str {
        &self.compact[..self.payload_end]
    }

    /// Returns the compact serialization of this token.
    pub fn as_str(&self) -> &str {
        &self.compact
    }

    /// Decodes the signature segment. The returned bytes are **not** guaranteed to form
    /// a valid signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature segment is not valid base64url.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, InvalidEncoding> {
        base64url::decode(self.signature())
    }

    /// Verifies the token signature against `secret`. See [`verify()`](crate::verify())
    /// for details.
    pub fn verify(&self, secret: &Secret<'_>) -> VerificationResult {
        alg::verify(self, secret)
    }

    /// Creates a new token from the header of this token and the provided `payload`,
    /// signed with `secret` using `algorithm`. See [`regenerate()`](crate::regenerate())
    /// for details.
    ///
    /// # Errors
    ///
    /// Returns an error if the header or payload cannot be serialized.
    pub fn regenerate(
        &self,
        payload: &Payload,
        secret: &Secret<'_>,
        algorithm: Algorithm,
    ) -> Result<Self, RegenerationError> {
        crate::regenerate(&self.header, payload, secret, algorithm)
    }

    /// Same as [`Self::regenerate()`], but with the payload provided as (edited) JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if `payload_text` is not a valid JSON payload.
    pub fn regenerate_from_text(
        &self,
        payload_text: &str,
        secret: &Secret<'_>,
        algorithm: Algorithm,
    ) -> Result<Self, RegenerationError> {
        crate::regenerate_from_text(&self.header, payload_text, secret, algorithm)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, SegmentError> {
    let bytes = base64url::decode(segment).map_err(SegmentError::Encoding)?;
    serde_json::from_slice(&bytes).map_err(SegmentError::Json)
}

impl fmt::Display for ParsedToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.compact)
    }
}

impl TryFrom<&str> for ParsedToken {
    type Error = ParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::decode(s)
    }
}

impl FromStr for ParsedToken {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use serde_json::json;

    const HS256_TOKEN: &str = "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9.\
                               eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFt\
                               cGxlLmNvbS9pc19yb290Ijp0cnVlfQ.\
                               dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    #[test]
    fn reference_token_is_decoded() {
        let token = ParsedToken::decode(HS256_TOKEN).unwrap();
        assert_eq!(token.algorithm(), &AlgorithmId::Supported(Algorithm::Hs256));
        assert_eq!(token.header().token_type.as_deref(), Some("JWT"));
        assert_eq!(token.payload().issuer.as_deref(), Some("joe"));
        assert_eq!(
            token.payload().expiration.unwrap().timestamp(),
            1_300_819_380
        );
        assert_eq!(
            token.payload().extensions["http://example.com/is_root"],
            Value::Bool(true)
        );

        let mut segments = HS256_TOKEN.split('.');
        assert_eq!(token.encoded_header(), segments.next().unwrap());
        assert_eq!(token.encoded_payload(), segments.next().unwrap());
        assert_eq!(token.signature(), segments.next().unwrap());
        assert_eq!(
            token.signing_input(),
            &HS256_TOKEN[..HS256_TOKEN.rfind('.').unwrap()]
        );
        assert_eq!(token.to_string(), HS256_TOKEN);
        assert_eq!(token.signature_bytes().unwrap().len(), 32);
    }

    #[test]
    fn invalid_token_structure() {
        for mangled_str in ["a.b", "a.b.c.d", "abc", "", "..", "a..c", ".b.c", "a.b."] {
            assert_matches!(
                ParsedToken::decode(mangled_str).unwrap_err(),
                ParseError::MalformedStructure,
                "{mangled_str}"
            );
        }

        let mangled_str = HS256_TOKEN.replace('.', "");
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::MalformedStructure
        );

        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.push_str(".c2lnbmF0dXJl");
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::MalformedStructure
        );
    }

    #[test]
    fn base64_error_during_parsing() {
        let header_end = HS256_TOKEN.find('.').unwrap();

        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.replace_range(..1, "+");
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::InvalidHeader(SegmentError::Encoding(_))
        );

        // Header of length `1 (mod 4)`.
        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.insert(header_end, 'A');
        assert_eq!((header_end + 1) % 4, 1);
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::InvalidHeader(SegmentError::Encoding(_))
        );

        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.insert(header_end + 1, '!');
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::InvalidPayload(SegmentError::Encoding(_))
        );
    }

    #[test]
    fn signature_is_not_decoded_during_parsing() {
        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.push_str("!*");
        let token = ParsedToken::decode(&mangled_str).unwrap();
        assert!(token.signature().ends_with("!*"));
        assert!(token.signature_bytes().is_err());
    }

    #[test]
    fn malformed_header() {
        let mangled_headers = [
            // Missing closing brace
            r#"{"alg":"HS256""#,
            // Missing necessary `alg` field
            "{}",
            r#"{"typ":"JWT"}"#,
            // `alg` field is not a string
            r#"{"alg":5}"#,
            r#"{"alg":[1,"foo"]}"#,
            r#"{"alg":false}"#,
            // Not an object
            r#"["HS256"]"#,
            // Not JSON at all
            "HS256",
        ];

        for mangled_header in &mangled_headers {
            let mangled_header = base64url::encode(mangled_header);
            let mut mangled_str = HS256_TOKEN.to_owned();
            mangled_str.replace_range(..mangled_str.find('.').unwrap(), &mangled_header);
            assert_matches!(
                ParsedToken::decode(&mangled_str).unwrap_err(),
                ParseError::InvalidHeader(SegmentError::Json(_)),
                "Failing header: {}",
                mangled_header
            );
        }
    }

    #[test]
    fn header_with_unknown_algorithm_and_extensions() {
        let header = r#"{"alg":"EdDSA","typ":"at+jwt","kid":"key","crit":["exp"],"x5t":"abc"}"#;
        let header: Header = serde_json::from_str(header).unwrap();
        assert_eq!(header.algorithm, AlgorithmId::Unsupported("EdDSA".to_owned()));
        assert_eq!(header.token_type.as_deref(), Some("at+jwt"));
        assert_eq!(header.key_id.as_deref(), Some("key"));
        assert_eq!(header.extensions.len(), 2);

        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "alg": "EdDSA",
                "typ": "at+jwt",
                "kid": "key",
                "crit": ["exp"],
                "x5t": "abc",
            })
        );
    }

    #[test]
    fn header_fields_of_unexpected_types() {
        let header = r#"{"alg":"HS256","typ":1,"kid":null}"#;
        let header: Header = serde_json::from_str(header).unwrap();
        assert_eq!(header.token_type, None);
        assert_eq!(header.key_id, None);
        assert_eq!(header.extensions["typ"], 1);
        assert_eq!(
            serde_json::to_string(&header).unwrap(),
            r#"{"alg":"HS256","kid":null,"typ":1}"#
        );

        // The last duplicate field wins.
        let header: Header = serde_json::from_str(r#"{"alg":"HS256","alg":"none"}"#).unwrap();
        assert_eq!(header.algorithm, AlgorithmId::Unsupported("none".to_owned()));
    }

    #[test]
    fn registered_header_fields_set_via_extensions() {
        let header = Header::new(Algorithm::Hs256)
            .with_extension("alg", "HS512")
            .with_extension("alg", 5)
            .with_extension("kid", "key")
            .with_extension("typ", json!(["JWT"]));
        assert_eq!(header.algorithm, AlgorithmId::Supported(Algorithm::Hs512));
        assert_eq!(header.key_id.as_deref(), Some("key"));
        assert_eq!(header.token_type, None);

        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, r#"{"alg":"HS512","kid":"key","typ":["JWT"]}"#);
        let restored: Header = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, header);

        let header = header.with_token_type("JWT");
        assert!(header.extensions.is_empty());
        assert_eq!(
            serde_json::to_string(&header).unwrap(),
            r#"{"alg":"HS512","typ":"JWT","kid":"key"}"#
        );
    }

    #[test]
    fn header_without_type_is_accepted() {
        let header: Header = serde_json::from_str(r#"{"alg":"HS384"}"#).unwrap();
        assert_eq!(header.token_type, None);
        assert_eq!(serde_json::to_string(&header).unwrap(), r#"{"alg":"HS384"}"#);
    }

    #[test]
    fn malformed_json_payload() {
        let malformed_claims = [
            // Missing closing brace
            r#"{"exp":1500000000"#,
            // Not an object
            r#"["exp",1500000000]"#,
            "1500000000",
            // Trailing chars
            r#"{"exp":1500000000}}"#,
        ];

        let claims_start = HS256_TOKEN.find('.').unwrap() + 1;
        let claims_end = HS256_TOKEN.rfind('.').unwrap();

        for claims in &malformed_claims {
            let encoded_claims = base64url::encode(claims);
            let mut mangled_str = HS256_TOKEN.to_owned();
            mangled_str.replace_range(claims_start..claims_end, &encoded_claims);
            assert_matches!(
                ParsedToken::decode(&mangled_str).unwrap_err(),
                ParseError::InvalidPayload(SegmentError::Json(_)),
                "Failing claims: {}",
                claims
            );
        }
    }

    #[test]
    fn payload_with_unexpected_claim_types() {
        let claims_start = HS256_TOKEN.find('.').unwrap() + 1;
        let claims_end = HS256_TOKEN.rfind('.').unwrap();
        let claims = [
            r#"{"sub":42}"#,
            r#"{"jti":7}"#,
            r#"{"exp":1516239022.5}"#,
            r#"{"iss":null,"exp":null}"#,
        ];

        for claims in claims {
            let mut mangled_str = HS256_TOKEN.to_owned();
            mangled_str.replace_range(claims_start..claims_end, &base64url::encode(claims));
            let token = ParsedToken::decode(&mangled_str).unwrap();
            assert_eq!(token.payload().expiration, None, "{claims}");
            assert_eq!(token.encoded_payload(), base64url::encode(claims));

            let secret = Secret::from("secret");
            let regenerated = token
                .regenerate(token.payload(), &secret, Algorithm::Hs256)
                .unwrap();
            let payload_text = base64url::decode_text(regenerated.encoded_payload()).unwrap();
            assert_eq!(
                serde_json::from_str::<Value>(&payload_text).unwrap(),
                serde_json::from_str::<Value>(claims).unwrap(),
                "{claims}"
            );
            assert!(regenerated.verify(&secret).is_valid());
        }
    }

    #[test]
    fn payload_with_invalid_utf8() {
        let claims_start = HS256_TOKEN.find('.').unwrap() + 1;
        let claims_end = HS256_TOKEN.rfind('.').unwrap();
        let encoded_claims = base64url::encode(b"{\"sub\":\"\xff\xfe\"}");
        let mut mangled_str = HS256_TOKEN.to_owned();
        mangled_str.replace_range(claims_start..claims_end, &encoded_claims);
        assert_matches!(
            ParsedToken::decode(&mangled_str).unwrap_err(),
            ParseError::InvalidPayload(SegmentError::Json(_))
        );
    }

    #[test]
    fn multibyte_payload() {
        let payload = base64url::encode(r#"{"name":"Jöhn Dœ 🦀"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.c2ln");
        let token: ParsedToken = token.parse().unwrap();
        assert_eq!(token.payload().extensions["name"], "Jöhn Dœ 🦀");
    }
}
