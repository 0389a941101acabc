//! Re-signing of edited tokens.

use crate::{
    alg::{Algorithm, Secret},
    base64url, Header, ParsedToken, Payload, RegenerationError,
};

/// Creates a new token from `original_header` and `payload`, signed with `secret`.
///
/// The `alg` field of the header is overwritten with `algorithm`; all other header fields
/// are preserved. The header and payload are serialized to JSON with a deterministic field
/// order (see [`Payload`]), so identical inputs always yield the same token.
///
/// # Errors
///
/// Returns an error if the header or payload cannot be serialized.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::{regenerate, Algorithm, Header, Payload, Secret, VerificationResult};
/// # fn main() -> anyhow::Result<()> {
/// let secret = Secret::from("super_secret_key_donut_steel");
/// let payload = Payload::new().with_subject("alice").with_extension("admin", true);
/// let token = regenerate(&Header::new(Algorithm::Hs256), &payload, &secret, Algorithm::Hs512)?;
/// assert_eq!(token.header().algorithm.as_str(), "HS512");
/// assert_eq!(token.verify(&secret), VerificationResult::Valid);
/// # Ok(())
/// # }
/// ```
pub fn regenerate(
    original_header: &Header,
    payload: &Payload,
    secret: &Secret<'_>,
    algorithm: Algorithm,
) -> Result<ParsedToken, RegenerationError> {
    let header = original_header.clone().with_algorithm(algorithm);
    let serialized_header = serde_json::to_string(&header).map_err(RegenerationError::Header)?;
    let mut buffer = String::new();
    base64url::encode_buf(&serialized_header, &mut buffer);
    let header_len = buffer.len();

    let serialized_payload = serde_json::to_string(payload).map_err(RegenerationError::Payload)?;
    buffer.push('.');
    base64url::encode_buf(&serialized_payload, &mut buffer);
    let payload_end = buffer.len();

    let signature = algorithm.sign(secret, buffer.as_bytes());
    buffer.push('.');
    base64url::encode_buf(signature.as_bytes(), &mut buffer);
    log::debug!("regenerated token signed with {algorithm}");

    Ok(ParsedToken::from_parts(
        buffer,
        header_len,
        payload_end,
        header,
        payload.clone(),
    ))
}

/// Same as [`regenerate()`], but with the payload supplied as (edited) JSON text.
///
/// # Errors
///
/// Returns [`RegenerationError::InvalidPayloadJson`] if `payload_text` is not a valid
/// JSON payload; nothing is signed in this case.
pub fn regenerate_from_text(
    original_header: &Header,
    payload_text: &str,
    secret: &Secret<'_>,
    algorithm: Algorithm,
) -> Result<ParsedToken, RegenerationError> {
    let payload: Payload = serde_json::from_str(payload_text).map_err(|err| {
        log::debug!("edited payload is not valid: {err}");
        RegenerationError::InvalidPayloadJson(err)
    })?;
    regenerate(original_header, &payload, secret, algorithm)
}
