use bettor_edge::{AmericanOdds, BettorRecord, Evaluator, RecordKey, SourceInput};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_pipeline(c: &mut Criterion) {
    let evaluator = Evaluator::default();
    let record = BettorRecord::new(RecordKey::new("alice", "spread"), 8.5, 120, 2.0);
    let original = AmericanOdds::new(-110.0).unwrap();
    let new = AmericanOdds::new(-105.0).unwrap();

    c.bench_function("evaluate_with_bet_size", |b| {
        b.iter(|| {
            evaluator
                .evaluate_with_bet_size(black_box(&record), original, new, black_box(3.0))
                .unwrap()
        })
    });

    let inputs = vec![
        SourceInput::new(record.clone(), original),
        SourceInput::new(
            BettorRecord::new(RecordKey::new("bob", "spread"), 4.0, 60, 1.0),
            AmericanOdds::new(120.0).unwrap(),
        )
        .with_bet_size(1.5),
    ];
    c.bench_function("evaluate_sources", |b| {
        b.iter(|| evaluator.evaluate_sources(black_box(&inputs), new).unwrap())
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
