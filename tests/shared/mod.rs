//! Functionality shared by integration tests.

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jwt_inspector::{base64url, prelude::*, regenerate, VerificationResult};
use rand::{seq::index::sample as sample_indexes, thread_rng};
use serde_json::json;

pub fn create_payload() -> Payload {
    let now = Utc.with_ymd_and_hms(2020, 9, 1, 10, 0, 0).single().unwrap();
    Payload::new()
        .with_subject("1234567890")
        .with_issued_at(now)
        .with_expiration(now + Duration::days(7))
        .with_extension("name", "John Doe")
        .with_extension("roles", json!(["admin", "janitor"]))
}

pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap()
}

/// Replaces the char at `index` with another char from the base64url alphabet.
pub fn mangle_char(token: &str, index: usize) -> String {
    let replacement = if &token[index..=index] == "A" { "B" } else { "A" };
    let mut mangled = token.to_owned();
    mangled.replace_range(index..=index, replacement);
    mangled
}

pub fn test_algorithm(algorithm: Algorithm, secret: &Secret<'_>) {
    // Maximum number of signature bits mangled.
    const MAX_MANGLED_BITS: usize = 128;

    let payload = create_payload();

    // Successful case.
    let token = regenerate(&Header::new(algorithm), &payload, secret, algorithm).unwrap();
    let token_string = token.to_string();
    let token = ParsedToken::decode(&token_string).unwrap();
    assert_eq!(*token.payload(), payload);
    assert_eq!(token.verify(secret), VerificationResult::Valid);

    // Mutate signature bits.
    let signature_start = token_string.rfind('.').unwrap() + 1;
    let signature = token.signature_bytes().unwrap();
    assert_eq!(signature.len(), algorithm.output_size());
    let signature_bits = signature.len() * 8;

    let mangled_bits: Box<dyn Iterator<Item = usize>> = if signature_bits <= MAX_MANGLED_BITS {
        Box::new(0..signature_bits)
    } else {
        let indexes = sample_indexes(&mut thread_rng(), signature_bits, MAX_MANGLED_BITS);
        Box::new(indexes.into_iter())
    };

    for i in mangled_bits {
        let mut mangled_signature = signature.clone();
        mangled_signature[i / 8] ^= 1 << (i % 8) as u8;
        let mangled_signature = base64url::encode(&mangled_signature);

        let mut mangled_str = token_string.clone();
        mangled_str.replace_range(signature_start.., &mangled_signature);
        let token = ParsedToken::decode(&mangled_str).unwrap();
        assert_eq!(token.verify(secret), VerificationResult::Invalid);
    }

    // Mutate header.
    let mangled_header = format!(r#"{{"alg":"{}","typ":"JWT","kid":"k"}}"#, algorithm.name());
    let mangled_header = base64url::encode(mangled_header);
    let header_end = token_string.find('.').unwrap();
    assert_ne!(mangled_header, &token_string[..header_end]);
    let mut mangled_str = token_string.clone();
    mangled_str.replace_range(..header_end, &mangled_header);
    let token = ParsedToken::decode(&mangled_str).unwrap();
    assert_matches!(token.verify(secret), VerificationResult::Invalid);

    // Mutate claims.
    let mut mangled_payload = payload;
    let issued_at = mangled_payload.issued_at.as_mut().unwrap();
    *issued_at += Duration::seconds(1);
    let claims_string = base64url::encode(serde_json::to_vec(&mangled_payload).unwrap());
    assert_ne!(
        claims_string,
        token_string[(header_end + 1)..(signature_start - 1)]
    );
    let mut mangled_str = token_string.clone();
    mangled_str.replace_range((header_end + 1)..(signature_start - 1), &claims_string);
    let token = ParsedToken::decode(&mangled_str).unwrap();
    assert_matches!(token.verify(secret), VerificationResult::Invalid);
}
