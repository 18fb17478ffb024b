use chatstat_core::frequency::FrequencyTable;
use chatstat_core::tokenizer::{StopWords, tokenize};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{Lcg, generated_record};

fn benchmark_tokenize(c: &mut Criterion) {
    let mut rng = Lcg::new(3);
    let short = generated_record(&mut rng, 0, 1, 20);
    let long = generated_record(&mut rng, 1, 1, 5_000);
    let stop_words = StopWords::english();

    let mut group = c.benchmark_group("tokenize");

    group.bench_function("short_session", |b| {
        b.iter(|| tokenize(black_box(&short), stop_words).count());
    });

    group.bench_function("long_session", |b| {
        b.iter(|| tokenize(black_box(&long), stop_words).count());
    });

    group.bench_function("long_session_counted", |b| {
        b.iter(|| {
            let mut table = FrequencyTable::new();
            for word in tokenize(black_box(&long), stop_words) {
                table.increment(&word);
            }
            table.top_k(20)
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_tokenize);
criterion_main!(benches);
