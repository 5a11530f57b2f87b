//! Benchmarks for catch pipelines.
//!
//! Compares catchable pipelines against plain iterator chains doing the same
//! work: same elements, same failures, same recovery.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use catchable::{result, wrap, Error, StringError};
use std::io;

const N: i32 = 1_000;

// ============================================================
// Test helpers
// ============================================================

#[inline(never)]
fn fails_every(n: i32, x: i32) -> std::result::Result<i32, io::Error> {
    if x % n == 0 {
        Err(io::Error::new(io::ErrorKind::Other, "fail"))
    } else {
        Ok(x * 2)
    }
}

// ============================================================
// 1. Success path: no element fails
// ============================================================

fn bench_success_catchable(c: &mut Criterion) {
    let seq = wrap(0..N)
        .map(|x| result::Ok(x * 2))
        .filter(|x| result::Ok(x % 3 != 0))
        .catch(|_: &io::Error| {});
    c.bench_function("success_catchable", |b| {
        b.iter(|| black_box(seq.to_vec()))
    });
}

fn bench_success_rust(c: &mut Criterion) {
    c.bench_function("success_rust", |b| {
        b.iter(|| {
            let v: Vec<i32> = (0..N).map(|x| x * 2).filter(|x| x % 3 != 0).collect();
            black_box(v)
        })
    });
}

// ============================================================
// 2. Drop: every tenth element fails and is skipped
// ============================================================

fn bench_drop_catchable(c: &mut Criterion) {
    let seq = wrap(0..N)
        .map(|x| fails_every(10, x))
        .catch(|_: &io::Error| {});
    c.bench_function("drop_catchable", |b| {
        b.iter(|| black_box(seq.to_vec()))
    });
}

fn bench_drop_rust(c: &mut Criterion) {
    c.bench_function("drop_rust", |b| {
        b.iter(|| {
            let v: Vec<i32> = (0..N).filter_map(|x| fails_every(10, x).ok()).collect();
            black_box(v)
        })
    });
}

// ============================================================
// 3. Substitute: every tenth element is replaced
// ============================================================

fn bench_substitute_catchable(c: &mut Criterion) {
    let seq = wrap(0..N)
        .map(|x| fails_every(10, x))
        .catch_replace_with(|_: &io::Error| {}, || -1);
    c.bench_function("substitute_catchable", |b| {
        b.iter(|| black_box(seq.to_vec()))
    });
}

fn bench_substitute_rust(c: &mut Criterion) {
    c.bench_function("substitute_rust", |b| {
        b.iter(|| {
            let v: Vec<i32> = (0..N).map(|x| fails_every(10, x).unwrap_or(-1)).collect();
            black_box(v)
        })
    });
}

// ============================================================
// 4. Typed miss: the first catch stage never matches
// ============================================================

fn bench_typed_miss_catchable(c: &mut Criterion) {
    let seq = wrap(0..N)
        .map(|x| fails_every(10, x))
        .catch(|_: &StringError| {})
        .catch(|_: &Error| {});
    c.bench_function("typed_miss_catchable", |b| {
        b.iter(|| black_box(seq.to_vec()))
    });
}

// ============================================================
// 5. Flattening
// ============================================================

fn bench_flat_map_catchable(c: &mut Criterion) {
    let seq = wrap(0..N / 10)
        .flat_map(|x| result::Ok(x..x + 10))
        .map(|x| fails_every(7, x))
        .catch(|_: &io::Error| {});
    c.bench_function("flat_map_catchable", |b| {
        b.iter(|| black_box(seq.to_vec()))
    });
}

fn bench_flat_map_rust(c: &mut Criterion) {
    c.bench_function("flat_map_rust", |b| {
        b.iter(|| {
            let v: Vec<i32> = (0..N / 10)
                .flat_map(|x| x..x + 10)
                .filter_map(|x| fails_every(7, x).ok())
                .collect();
            black_box(v)
        })
    });
}

criterion_group!(
    success_path,
    bench_success_catchable,
    bench_success_rust,
);

criterion_group!(
    recover,
    bench_drop_catchable,
    bench_drop_rust,
    bench_substitute_catchable,
    bench_substitute_rust,
    bench_typed_miss_catchable,
);

criterion_group!(
    flatten,
    bench_flat_map_catchable,
    bench_flat_map_rust,
);

criterion_main!(success_path, recover, flatten);
