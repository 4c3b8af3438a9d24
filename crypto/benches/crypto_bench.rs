use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fairchain_crypto::HashChainGenerator;
use fairchain_types::Seed;

fn sha256_bench(c: &mut Criterion) {
    let data = [0xABu8; 32];

    c.bench_function("sha256_32B", |b| {
        b.iter(|| fairchain_crypto::sha256(black_box(&data)))
    });
}

fn hmac_bench(c: &mut Criterion) {
    let key = [0x42u8; 96];
    let msg = [0x17u8; 32];

    c.bench_function("hmac_sha256_96B_key", |b| {
        b.iter(|| fairchain_crypto::hmac_sha256(black_box(&key), black_box(&msg)))
    });
}

fn chain_bench(c: &mut Criterion) {
    let root = Seed::new([7u8; 32]);

    c.bench_function("hash_chain_10k", |b| {
        b.iter(|| HashChainGenerator.from_root(black_box(&root), 10_000))
    });
}

fn bls_sign_bench(c: &mut Criterion) {
    let kp = fairchain_crypto::keypair_from_ikm(&[3u8; 32]).unwrap();
    let msg = [42u8; 32];

    c.bench_function("bls_sign_32B", |b| {
        b.iter(|| fairchain_crypto::sign_message(black_box(&msg), &kp.secret))
    });
}

criterion_group!(benches, sha256_bench, hmac_bench, chain_bench, bls_sign_bench);
criterion_main!(benches);
