//! # Guest Channel Benchmarks
//!
//! Hot paths on every guest request:
//!
//! | Path | Runs on |
//! |------|---------|
//! | Key derivation | Every salted token check |
//! | Token verification | Every authenticated request |
//! | ETag computation | Every instance GET and PATCH |

use chrono::{Duration as ChronoDuration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gc_01_bearer_auth::{BearerAuthApi, BearerAuthenticator, TokenCodec, TokenScope};
use gc_02_device_ownership::compute_etag;
use shared_crypto::{derive_key, generate_salt, KeyUsage, MAX_DERIVED_KEY_LEN};
use shared_types::{DeviceConfig, Devices, Identity, IdentityType, InMemoryIdentityCache};
use std::time::Duration;

const CLUSTER: &str = "cluster-bench";

fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-crypto-kdf");
    let salt = generate_salt();

    for length in [16, MAX_DERIVED_KEY_LEN] {
        group.bench_with_input(BenchmarkId::new("derive_key", length), &length, |b, &len| {
            b.iter(|| derive_key(black_box(b"svc-1-secret"), &salt, KeyUsage::Signature, len))
        });
    }
    group.finish();
}

fn bench_token_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-01-bearer-auth");
    group.measurement_time(Duration::from_secs(5));

    let identity = Identity::new("svc-1", IdentityType::DevLxdBearer, b"svc-1-secret".to_vec());
    let cache = InMemoryIdentityCache::new();
    cache.insert(identity.clone());
    let authenticator = BearerAuthenticator::new(CLUSTER, TokenScope::DevLxd);

    let salt = generate_salt();
    let plain = TokenCodec::issue(
        &identity.secret,
        None,
        "svc-1",
        CLUSTER,
        TokenScope::DevLxd,
        Utc::now() + ChronoDuration::hours(1),
    )
    .expect("token issues");
    let salted = TokenCodec::issue(
        &identity.secret,
        Some(salt.as_slice()),
        "svc-1",
        CLUSTER,
        TokenScope::DevLxd,
        Utc::now() + ChronoDuration::hours(1),
    )
    .expect("token issues");

    let header = format!("Bearer {plain}");
    group.bench_function("is_candidate", |b| {
        b.iter(|| authenticator.is_candidate(black_box(&header)))
    });

    for (label, token) in [("plain", &plain), ("salted", &salted)] {
        group.bench_function(BenchmarkId::new("authenticate", label), |b| {
            b.iter(|| {
                authenticator.authenticate(
                    black_box(token),
                    "svc-1",
                    &cache,
                    IdentityType::DevLxdBearer,
                )
            })
        });
    }
    group.finish();
}

fn volumes(count: usize) -> Devices {
    (0..count)
        .map(|i| {
            let device: DeviceConfig = [
                ("type", "disk".to_string()),
                ("pool", "default".to_string()),
                ("source", format!("vol-{i}")),
                ("path", format!("/mnt/{i}")),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            (format!("vol-{i}"), device)
        })
        .collect()
}

fn bench_etag(c: &mut Criterion) {
    let mut group = c.benchmark_group("gc-02-etag");

    for count in [1, 16, 128] {
        let devices = volumes(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("compute_etag", count), &devices, |b, d| {
            b.iter(|| compute_etag("vm1", black_box(d)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_token_verification,
    bench_etag
);
criterion_main!(benches);
