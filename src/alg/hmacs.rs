//! HMAC computation and verification of token signatures.

use hmac::{digest::KeyInit, Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use smallvec::SmallVec;
use subtle::ConstantTimeEq;

use super::{Algorithm, Secret, Signature, SIGNATURE_SIZE};
use crate::{AlgorithmId, ParsedToken};

/// Outcome of checking a token signature against a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use = "verification outcome should be checked"]
pub enum VerificationResult {
    /// Signature matches the one computed with the secret.
    Valid,
    /// Signature does not match.
    Invalid,
    /// Token header names an algorithm not supported by the crate. The original `alg`
    /// value is retained. No cryptographic computations are performed in this case.
    Unsupported(String),
}

impl VerificationResult {
    /// Checks whether the signature was found valid.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

fn compute_mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> SmallVec<[u8; SIGNATURE_SIZE]> {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMACs work with any key size");
    mac.update(message);
    SmallVec::from_slice(mac.finalize().into_bytes().as_slice())
}

impl Algorithm {
    /// Computes the HMAC of `message` keyed with `secret`.
    pub fn sign(self, secret: &Secret<'_>, message: &[u8]) -> Signature {
        let bytes = match self {
            Self::Hs256 => compute_mac::<Hmac<Sha256>>(secret, message),
            Self::Hs384 => compute_mac::<Hmac<Sha384>>(secret, message),
            Self::Hs512 => compute_mac::<Hmac<Sha512>>(secret, message),
        };
        Signature {
            algorithm: self,
            bytes,
        }
    }
}

/// Signs the `signing_input` (i.e., `<encoded header>.<encoded payload>`) with the specified
/// algorithm. The returned signature holds raw digest bytes; use
/// [`Signature::to_base64url()`] to get its representation within a token.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::{sign, Algorithm, Secret};
/// let signature = sign("header.payload", &Secret::from("secret"), Algorithm::Hs384);
/// assert_eq!(signature.as_bytes().len(), 48);
/// ```
pub fn sign(signing_input: &str, secret: &Secret<'_>, algorithm: Algorithm) -> Signature {
    algorithm.sign(secret, signing_input.as_bytes())
}

/// Verifies the signature of a parsed token against the `secret`.
///
/// The signing input is the header and payload segments exactly as they appear
/// in the original token, so the decoded JSON is never re-serialized for verification.
/// The computed signature is compared to the raw signature segment in constant time.
pub fn verify(token: &ParsedToken, secret: &Secret<'_>) -> VerificationResult {
    let algorithm = match token.algorithm() {
        AlgorithmId::Supported(alg) => *alg,
        AlgorithmId::Unsupported(name) => {
            log::warn!("cannot verify token signed with unsupported algorithm `{name}`");
            return VerificationResult::Unsupported(name.clone());
        }
    };

    let expected = sign(token.signing_input(), secret, algorithm).to_base64url();
    let is_valid = bool::from(expected.as_bytes().ct_eq(token.signature().as_bytes()));
    log::debug!("{algorithm} signature verification finished; valid: {is_valid}");
    if is_valid {
        VerificationResult::Valid
    } else {
        VerificationResult::Invalid
    }
}
