//! Benchmarks for decoding, verification and regeneration logic.

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

use jwt_inspector::{regenerate, Algorithm, Header, ParsedToken, Payload, Secret, TimeOptions};

// Fairly small list of claims.
fn payload() -> Payload {
    let now = Utc::now();
    Payload::new()
        .with_subject("1b2a9a8e-0e58-4a3e-9f36-b2ff6e7e6d8e")
        .with_issued_at(now)
        .with_expiration(now + Duration::minutes(10))
        .with_extension("scope", "content_management")
        .with_extension("name", "John Doe")
        .with_extension("email", "john.doe@example.com")
        .with_extension("roles", json!(["content_manager"]))
}

fn encoding_benches(criterion: &mut Criterion) {
    let secret = Secret::from("super_secret_key_donut_steel");
    let header = Header::new(Algorithm::Hs256).with_key_id("my-key");
    let payload = payload();

    for alg in Algorithm::ALL {
        criterion.bench_function(&format!("regenerate/{alg}"), |bencher| {
            bencher.iter(|| regenerate(&header, &payload, &secret, alg).unwrap());
        });
    }
}

fn decoding_benches(criterion: &mut Criterion) {
    let secret = Secret::from("super_secret_key_donut_steel");
    let header = Header::new(Algorithm::Hs256).with_key_id("my-key");
    let token = regenerate(&header, &payload(), &secret, Algorithm::Hs256)
        .unwrap()
        .to_string();
    let time_options = TimeOptions::default();

    criterion.bench_function("decoding", |bencher| {
        bencher.iter(|| ParsedToken::decode(&token).unwrap());
    });
    criterion.bench_function("decoding/full", |bencher| {
        bencher.iter(|| {
            let token = ParsedToken::decode(&token).unwrap();
            assert!(token.verify(&secret).is_valid());
            token.payload().inspect(&time_options)
        });
    });
}

criterion_group!(benches, encoding_benches, decoding_benches);
criterion_main!(benches);
