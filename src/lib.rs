//! Decoding, inspection, verification and re-signing of [JSON web tokens (JWTs)][JWT]
//! secured with HMAC-based algorithms.
//!
//! # Design choices
//!
//! - A token is decoded into an immutable [`ParsedToken`]. The header and payload segments
//!   are decoded into [`Header`] and [`Payload`], while the original encoded segments are
//!   retained verbatim. Verification signs exactly these original segments, so that JSON
//!   formatting of the token never affects the result.
//! - The [`Payload`] exposes registered claims (`iss`, `sub`, `aud`, `exp`, `nbf`, `iat`,
//!   `jti`) as typed fields and keeps all other claims in an extension map.
//! - The `alg` header field is represented by [`AlgorithmId`]. Algorithms other than
//!   `HS256`, `HS384` and `HS512` are not a decoding error; verifying such a token yields
//!   [`VerificationResult::Unsupported`] without performing any cryptographic operations.
//! - Signatures are compared in constant time.
//! - Editing a token means creating a new one: [`regenerate()`] combines a header
//!   with a new payload and signs the result.
//!
//! ## Supported algorithms
//!
//! | Algorithm(s) | Description |
//! |--------------|-------------|
//! | `HS256`, `HS384`, `HS512` | Uses pure Rust [`hmac`] and [`sha2`] crates |
//!
//! # Crate features
//!
//! - `clock` (on by default) enables getting the current time using `Utc::now()` from
//!   [`chrono`]. Without it, [`TimeOptions::default()`] is not available; it is still
//!   possible to create `TimeOptions` with an explicitly specified clock function.
//!
//! # Logging
//!
//! The crate emits diagnostics via the [`log`] facade. Secrets, signatures and claims
//! are never logged.
//!
//! [JWT]: https://jwt.io/
//! [`hmac`]: https://docs.rs/hmac/
//! [`sha2`]: https://docs.rs/sha2/
//! [`chrono`]: https://docs.rs/chrono/
//! [`log`]: https://docs.rs/log/
//!
//! # Examples
//!
//! Inspecting a token:
//!
//! ```
//! use chrono::{DateTime, Duration};
//! use jwt_inspector::{prelude::*, VerificationResult};
//!
//! # fn main() -> anyhow::Result<()> {
//! let token_string = // token from an external source
//! #   "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
//! #    eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.\
//! #    SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";
//! let token = ParsedToken::decode(token_string)?;
//! assert_eq!(token.algorithm().supported(), Some(Algorithm::Hs256));
//!
//! // Check the signature.
//! let secret = Secret::from("your-256-bit-secret");
//! assert_eq!(token.verify(&secret), VerificationResult::Valid);
//!
//! // Derive facts about time-related claims.
//! let now = DateTime::from_timestamp(1_516_239_100, 0).unwrap();
//! let inspection = token.payload().inspect(&TimeOptions::new(Duration::zero(), || now));
//! assert!(!inspection.expired);
//! assert_eq!(inspection.issued_at.as_deref(), Some("2018-01-18 01:30:22 UTC"));
//! # Ok(())
//! # }
//! ```
//!
//! Editing and re-signing a token:
//!
//! ```
//! # use jwt_inspector::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! # let token = ParsedToken::decode(
//! #     "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
//! #      eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.\
//! #      SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c",
//! # )?;
//! let secret = Secret::from("super_secret_key_donut_steel");
//! let edited = r#"{"sub":"1234567890","name":"Jane Doe","admin":true}"#;
//! let new_token = token.regenerate_from_text(edited, &secret, Algorithm::Hs384)?;
//! println!("token: {new_token}");
//! assert!(new_token.verify(&secret).is_valid());
//! assert_eq!(new_token.payload().extensions["name"], "Jane Doe");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/jwt-inspector/0.1.0")]
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod alg;
pub mod base64url;
mod claims;
mod error;
mod regenerate;
mod token;

/// Prelude to neatly import all necessary stuff from the crate.
pub mod prelude {
    pub use crate::{Algorithm, Header, ParsedToken, Payload, Secret, TimeOptions};
}

pub use crate::{
    alg::{sign, verify, Algorithm, AlgorithmId, Secret, Signature, VerificationResult},
    claims::{format_timestamp, Audience, Inspection, Payload, TimeOptions},
    error::{InvalidEncoding, ParseError, RegenerationError, SegmentError},
    regenerate::{regenerate, regenerate_from_text},
    token::{Header, ParsedToken},
};
