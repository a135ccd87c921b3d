use criterion::{criterion_group, criterion_main, Criterion};
use lifesync::models::log::parse_log_entries;
use lifesync::services::abi::{self, Token};
use std::hint::black_box;

/// A user's log history as the contract would return it.
fn sample_logs(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i % 50 == 49 {
                // The occasional corrupted line
                format!("{{\"userId\":\"bench-user\",\"message\":\"Visited /page{i}\"")
            } else {
                format!(
                    "{{\"userId\":\"bench-user\",\"message\":\"Visited /page{i}\",\"timestamp\":{}}}",
                    1_700_000_000 + (i * 7919) % 100_000
                )
            }
        })
        .collect()
}

fn benchmark_log_decoding(c: &mut Criterion) {
    let logs = sample_logs(2_000);
    let encoded = abi::encode(&[Token::StringArray(logs.clone())]);

    let mut group = c.benchmark_group("log_decoding");

    group.bench_function("abi_decode_string_array", |b| {
        b.iter(|| abi::decode_string_array(black_box(&encoded)))
    });

    group.bench_function("parse_and_sort_entries", |b| {
        b.iter(|| parse_log_entries(black_box(&logs)))
    });

    group.bench_function("decode_then_parse", |b| {
        b.iter(|| {
            let raw = abi::decode_string_array(black_box(&encoded)).unwrap_or_default();
            parse_log_entries(&raw)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_log_decoding);
criterion_main!(benches);
