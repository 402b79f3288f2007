//! Benchmarks for per-utterance analysis cost.
//!
//! The analyzer runs on every chat turn before any I/O, so it should stay
//! well under a millisecond for typical widget messages.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use codex_nlu::Analyzer;

const UTTERANCES: &[&str] = &[
    "Hi",
    "What technologies do you use?",
    "I need a website urgently, budget $20,000",
    "We want a React dashboard with PostgreSQL within 3 months",
    "I'm the founder of Acme Corp, can we schedule a call? jane@acme.io",
    "Honestly that sounds too expensive, we might look at other agencies",
];

/// Generate a long message (~120 words) mixing every entity kind.
fn generate_long_message(index: usize) -> String {
    format!(
        "Hello there, my name is Sarah and I work at Globex. We are planning a \
         new online store built with Next.js and Stripe, and we also need SEO \
         and branding support for the launch. Our budget is around $45,000 and \
         we would like to go live by end of the quarter, ideally within 10 \
         weeks. I'm the owner so I make the decisions. Could you send a \
         proposal and maybe book a consultation next week? You can reach me \
         at sarah@globex.example or +1 555 010 {:04}. Reference {}.",
        index % 10_000,
        index
    )
}

fn bench_short_utterances(c: &mut Criterion) {
    let analyzer = Analyzer::new();
    c.bench_function("analyze_short_utterances", |b| {
        b.iter(|| {
            for text in UTTERANCES {
                black_box(analyzer.analyze(black_box(text)));
            }
        })
    });
}

fn bench_long_message(c: &mut Criterion) {
    let analyzer = Analyzer::new();
    let messages: Vec<String> = (0..32).map(generate_long_message).collect();
    let mut i = 0;
    c.bench_function("analyze_long_message", |b| {
        b.iter(|| {
            i = (i + 1) % messages.len();
            black_box(analyzer.analyze(black_box(&messages[i])))
        })
    });
}

fn bench_rank_intents(c: &mut Criterion) {
    let analyzer = Analyzer::new();
    c.bench_function("rank_intents", |b| {
        b.iter(|| black_box(analyzer.rank_intents(black_box(UTTERANCES[4]))))
    });
}

criterion_group!(
    benches,
    bench_short_utterances,
    bench_long_message,
    bench_rank_intents
);
criterion_main!(benches);
