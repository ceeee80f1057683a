use ade_validate::core::metrics::MetricSummary;
use ade_validate::core::{failures, normalize};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn synthetic_log() -> String {
    let mut log = String::from("# Validation Summary Log\n\n**Tier:** full\n\n## Backend Tests\n\n```text\n");
    for i in 0..5_000 {
        log.push_str(&format!(
            "\u{1b}[32mtests/test_mod_{}.py::test_case_{} PASSED\u{1b}[0m [{:>3}%]\n",
            i % 50,
            i,
            i % 100
        ));
    }
    log.push_str("FAILED tests/test_api.py::test_create - AssertionError: 500 != 201\n");
    log.push_str("TOTAL                 9000   1800    80%\n");
    log.push_str("=== 1 failed, 4999 passed in 120.00s ===\n```\n\nTIMING_METRIC: Backend=121s\n\n");
    log.push_str("## E2E Tests\n\n```text\n  40 passed (95.1s)\n```\n\nTIMING_METRIC: E2E=97s\n");
    log
}

fn extractors(c: &mut Criterion) {
    let log = synthetic_log();
    let clean = normalize::strip(&log);

    c.bench_function("normalize_strip_large_log", |b| {
        b.iter(|| normalize::strip(black_box(&log)))
    });
    c.bench_function("metric_summary_from_log_text", |b| {
        b.iter(|| MetricSummary::from_log_text(black_box(&clean)))
    });
    c.bench_function("failure_analysis", |b| {
        b.iter(|| failures::analyze(black_box(&clean)))
    });
}

criterion_group!(benches, extractors);
criterion_main!(benches);
