//! Path and pattern benchmarks
//!
//! Normalization and matching run on every request, so they sit on the hot
//! path of the driver's worker threads.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dokankit::{WildcardPattern, normalize};
use std::hint::black_box;

const PATHS: &[(&str, &str)] = &[
    ("short", "\\a.txt"),
    ("nested", "\\Users\\me\\Documents\\Projects\\dokankit\\src\\lib.rs"),
    ("dots", "\\a\\.\\b\\..\\c\\.\\d\\..\\..\\e\\f.txt"),
    ("drive", "C:\\Windows\\System32\\..\\Temp\\x.tmp"),
];

const PATTERNS: &[(&str, &str)] = &[
    ("match_all", "*"),
    ("extension", "*.txt"),
    ("question", "????????.txt"),
    ("multi_star", "*a*b*c*.log"),
];

fn names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 4 {
            0 => format!("file{i:05}.txt"),
            1 => format!("a{i}b{i}c{i}.log"),
            2 => format!("IMG_{i:04}.JPG"),
            _ => format!("notes-{i}.TXT"),
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for (label, raw) in PATHS {
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), raw, |b, raw| {
            b.iter(|| normalize(black_box(raw)))
        });
    }
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let candidates = names(1000);
    let mut group = c.benchmark_group("wildcard");
    group.throughput(Throughput::Elements(candidates.len() as u64));
    for (label, raw) in PATTERNS {
        let pattern = WildcardPattern::parse(raw).unwrap();
        for case_sensitive in [true, false] {
            let id = format!("{label}/{}", if case_sensitive { "cs" } else { "ci" });
            group.bench_function(BenchmarkId::from_parameter(id), |b| {
                b.iter(|| {
                    candidates
                        .iter()
                        .filter(|name| pattern.matches(black_box(name), case_sensitive))
                        .count()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_matching);
criterion_main!(benches);
