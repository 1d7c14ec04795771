//! Criterion benchmarks for key canonicalization and layout lookups.
//!
//! Both run on every keystroke (canonicalize) or every pasted character
//! (find_key_code), so they should stay in the sub-microsecond range.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::keymap::layouts::{find_key_code, KeyboardLayout};
use relay_core::keymap::{canonicalize, is_modifier_code};

/// Representative `(code, key)` pairs, including the quirky ones.
const RAW_KEYS: &[(&str, &str)] = &[
    ("KeyA", "a"),
    ("Enter", "Enter"),
    ("ShiftLeft", "Shift"),
    ("OSLeft", "OS"),
    ("OSRight", "OS"),
    ("", "Alt"),
    ("ArrowUp", "ArrowUp"),
    ("Lang1", "HangulMode"),
];

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");
    for &(code, key) in RAW_KEYS {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{code}/{key}")),
            &(code, key),
            |b, &(code, key)| b.iter(|| canonicalize(black_box(code), black_box(key))),
        );
    }
    group.finish();
}

fn bench_is_modifier_code(c: &mut Criterion) {
    let codes: Vec<_> = RAW_KEYS.iter().map(|&(code, key)| canonicalize(code, key)).collect();
    c.bench_function("is_modifier_code/all", |b| {
        b.iter(|| codes.iter().filter(|code| is_modifier_code(black_box(code))).count())
    });
}

fn bench_find_key_code(c: &mut Criterion) {
    let text = "Hello, World! user@example.com #42 ~/path\\to|file";
    let mut group = c.benchmark_group("find_key_code");
    for layout in [KeyboardLayout::EnUs, KeyboardLayout::EnGb] {
        group.bench_with_input(
            BenchmarkId::from_parameter(layout.locale_tag()),
            &layout,
            |b, layout| {
                b.iter(|| {
                    text.chars()
                        .filter_map(|ch| find_key_code(black_box(ch), layout.locale_tag()))
                        .count()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_canonicalize,
    bench_is_modifier_code,
    bench_find_key_code
);
criterion_main!(benches);
