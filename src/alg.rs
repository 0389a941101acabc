//! JWT signature algorithms, together with the secrets and signatures they work with.

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use zeroize::Zeroize;

use std::{borrow::Cow, fmt, ops};

use crate::base64url;

mod hmacs;

pub use self::hmacs::{sign, verify, VerificationResult};

/// Maximum signature size in bytes (the output size of SHA-512).
const SIGNATURE_SIZE: usize = 64;

/// HMAC-based signature algorithm supported by the crate.
///
/// See [RFC 7518] for the algorithm specification.
///
/// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// HMAC with SHA-256.
    Hs256,
    /// HMAC with SHA-384.
    Hs384,
    /// HMAC with SHA-512.
    Hs512,
}

impl Algorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::Hs256, Self::Hs384, Self::Hs512];

    /// Returns the name of this algorithm, as mentioned in the `alg` field of the JWT header.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }

    /// Looks up an algorithm by its `alg` name. The comparison is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name() == name)
    }

    /// Byte length of signatures produced by this algorithm.
    pub fn output_size(self) -> usize {
        match self {
            Self::Hs256 => 32,
            Self::Hs384 => 48,
            Self::Hs512 => 64,
        }
    }

    /// Block size of the underlying hash function in bytes.
    pub fn block_size(self) -> usize {
        match self {
            Self::Hs256 => 64,
            Self::Hs384 | Self::Hs512 => 128,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Value of the `alg` field in a token header.
///
/// Unknown algorithm names are not a parsing error; they are retained verbatim in
/// the [`Unsupported`](Self::Unsupported) variant.
///
/// # Examples
///
/// ```
/// # use jwt_inspector::{Algorithm, AlgorithmId};
/// let alg = AlgorithmId::from("HS384".to_owned());
/// assert_eq!(alg.supported(), Some(Algorithm::Hs384));
/// let alg = AlgorithmId::from("RS256".to_owned());
/// assert_eq!(alg, AlgorithmId::Unsupported("RS256".to_owned()));
/// assert_eq!(alg.as_str(), "RS256");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlgorithmId {
    /// One of `HS256`, `HS384` or `HS512`.
    Supported(Algorithm),
    /// Any other algorithm name.
    Unsupported(String),
}

impl AlgorithmId {
    /// Returns the algorithm name as it appears in the header.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Supported(alg) => alg.name(),
            Self::Unsupported(name) => name,
        }
    }

    /// Returns the supported algorithm, if any.
    pub fn supported(&self) -> Option<Algorithm> {
        match self {
            Self::Supported(alg) => Some(*alg),
            Self::Unsupported(_) => None,
        }
    }
}

impl From<Algorithm> for AlgorithmId {
    fn from(alg: Algorithm) -> Self {
        Self::Supported(alg)
    }
}

impl From<String> for AlgorithmId {
    fn from(name: String) -> Self {
        Algorithm::from_name(&name).map_or(Self::Unsupported(name), Self::Supported)
    }
}

impl From<AlgorithmId> for String {
    fn from(id: AlgorithmId) -> Self {
        match id {
            AlgorithmId::Supported(alg) => alg.name().to_owned(),
            AlgorithmId::Unsupported(name) => name,
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// HMAC secret supplied by the caller.
///
/// The secret is used as-is: a string secret contributes its UTF-8 bytes, without any decoding
/// or key derivation. Any length is accepted, including the empty secret.
///
/// If owned, bytes are zeroized on drop. Comparisons on `Secret`s are constant-time.
#[derive(Clone)]
pub struct Secret<'a>(Cow<'a, [u8]>);

impl<'a> Secret<'a> {
    /// Creates a secret from a borrowed slice.
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        Self(Cow::Borrowed(bytes))
    }

    /// Creates a secret from an owned `Vec`.
    pub fn owned(bytes: Vec<u8>) -> Self {
        Self(Cow::Owned(bytes))
    }

    /// Checks whether this secret is at least as long as the digest of `algorithm`,
    /// the minimum recommended by [RFC 7518]. Weak secrets are still usable for signing
    /// and verification.
    ///
    /// [RFC 7518]: https://www.rfc-editor.org/rfc/rfc7518.html#section-3.2
    pub fn is_strong_for(&self, algorithm: Algorithm) -> bool {
        self.0.len() >= algorithm.output_size()
    }
}

impl Secret<'static> {
    /// Generates a random secret with the block size of `algorithm` using
    /// a cryptographically secure RNG.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, algorithm: Algorithm) -> Self {
        let mut bytes = vec![0; algorithm.block_size()];
        rng.fill_bytes(&mut bytes);
        Self::owned(bytes)
    }
}

impl<'a> From<&'a str> for Secret<'a> {
    fn from(secret: &'a str) -> Self {
        Self::borrowed(secret.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Secret<'a> {
    fn from(secret: &'a [u8]) -> Self {
        Self::borrowed(secret)
    }
}

impl From<String> for Secret<'static> {
    fn from(secret: String) -> Self {
        Self::owned(secret.into_bytes())
    }
}

impl fmt::Debug for Secret<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Secret")
            .field("len", &self.0.len())
            .finish()
    }
}

impl Drop for Secret<'_> {
    fn drop(&mut self) {
        // if bytes are borrowed, we don't need to perform any special cleaning.
        if let Cow::Owned(bytes) = &mut self.0 {
            Zeroize::zeroize(bytes);
        }
    }
}

impl ops::Deref for Secret<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Secret<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl PartialEq for Secret<'_> {
    fn eq(&self, other: &Self) -> bool {
        subtle::ConstantTimeEq::ct_eq(self.as_ref(), other.as_ref()).into()
    }
}

impl Eq for Secret<'_> {}

/// Raw HMAC digest produced by one of the [`Algorithm`]s.
#[derive(Clone)]
pub struct Signature {
    algorithm: Algorithm,
    bytes: SmallVec<[u8; SIGNATURE_SIZE]>,
}

impl Signature {
    /// Returns the algorithm that has produced this signature.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encodes the digest in the form it takes in a compact token.
    pub fn to_base64url(&self) -> String {
        base64url::encode(&self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Signature")
            .field(&self.algorithm)
            .field(&"_")
            .finish()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && bool::from(subtle::ConstantTimeEq::ct_eq(
                self.as_bytes(),
                other.as_bytes(),
            ))
    }
}

impl Eq for Signature {}
